//! 可求值绑定
//!
//! 六种已解析绑定（常量、字面量包装、函数调用、构造实例、异步值、异步函数调用）
//! 用一个封闭的枚举表示，同步与异步两条取值路径通过模式匹配分派。
//!
//! 缓存策略：
//! - 同步路径的记忆化/单例单元是 `Mutex<Option<Value>>`，计算期间持锁，
//!   `Option` 即“已计算”标志，生产者返回 `()` 也不会被重复调用
//! - 异步路径的首次计算在独立的 tokio 任务里运行，槽位保存该任务的 `Shared` 句柄，
//!   并发的首次取值只会触发一次计算，等待者超时或被丢弃也不会中断它
//!
//! 超时只约束调用方的等待：被等待的 Future 交给后台任务继续运行。

use super::registry::BindingKind;
use super::stats::StatsRecorder;
use super::value::{Args, Value};
use crate::errors::{BoxError, ContainerError, Result};
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinError;

/// 同步生产者（函数或构造器）
pub type SyncProducer = Arc<dyn Fn(&Args) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// 异步生产者
pub type AsyncProducer =
    Arc<dyn Fn(Args) -> BoxFuture<'static, std::result::Result<Value, BoxError>> + Send + Sync>;

/// 可被多次等待的异步值
pub type SharedValue = Shared<BoxFuture<'static, Result<Value>>>;

/// 把返回具体类型的闭包包装为同步生产者
pub fn sync_producer<T, F>(producer: F) -> SyncProducer
where
    T: std::any::Any + Send + Sync,
    F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
{
    Arc::new(move |args: &Args| producer(args).map(Value::new))
}

/// 把返回 Future 的闭包包装为异步生产者
pub fn async_producer<T, F, Fut>(producer: F) -> AsyncProducer
where
    T: std::any::Any + Send + Sync,
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
{
    Arc::new(move |args: Args| producer(args).map(|result| result.map(Value::new)).boxed())
}

/// 把一个不会失败的 Future 包装为可共享的异步值
pub fn shared_value<T, Fut>(pending: Fut) -> SharedValue
where
    T: std::any::Any + Send + Sync,
    Fut: Future<Output = T> + Send + 'static,
{
    pending.map(|value| Ok(Value::new(value))).boxed().shared()
}

/// 把一个可能失败的 Future 包装为可共享的异步值
pub fn shared_try_value<T, Fut>(name: &str, pending: Fut) -> SharedValue
where
    T: std::any::Any + Send + Sync,
    Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
{
    let name = name.to_string();
    pending
        .map(move |result| {
            result
                .map(Value::new)
                .map_err(|e| ContainerError::producer_failed(&name, e))
        })
        .boxed()
        .shared()
}

/// 记忆化/单例缓存单元
///
/// 同一个绑定在一个容器里只会走同步或异步其中一条路径。
struct CacheCell {
    value: Mutex<Option<Value>>,
    /// 进行中的异步首次计算
    pending: Mutex<Option<SharedValue>>,
}

impl CacheCell {
    fn new() -> Self {
        Self {
            value: Mutex::new(None),
            pending: Mutex::new(None),
        }
    }

    fn is_populated(&self) -> bool {
        self.value.lock().is_some()
    }
}

enum ResolvedKind {
    Constant(Value),
    Boxed(Value),
    Function {
        producer: SyncProducer,
        memo: Option<CacheCell>,
    },
    Constructed {
        constructor: SyncProducer,
        singleton: Option<CacheCell>,
    },
    AsyncValue {
        value: SharedValue,
        timeout: Option<Duration>,
    },
    AsyncFunction {
        producer: AsyncProducer,
        memo: Option<CacheCell>,
        timeout: Option<Duration>,
    },
}

/// 已解析、可求值的绑定
pub struct ResolvedBinding {
    name: String,
    kind: ResolvedKind,
    dependencies: Vec<Arc<ResolvedBinding>>,
    stats: Arc<StatsRecorder>,
}

impl ResolvedBinding {
    pub(crate) fn constant(name: &str, value: Value, stats: Arc<StatsRecorder>) -> Self {
        Self::with_kind(name, ResolvedKind::Constant(value), Vec::new(), stats)
    }

    pub(crate) fn boxed(name: &str, value: Value, stats: Arc<StatsRecorder>) -> Self {
        Self::with_kind(name, ResolvedKind::Boxed(value), Vec::new(), stats)
    }

    pub(crate) fn function(
        name: &str,
        producer: SyncProducer,
        memoize: bool,
        dependencies: Vec<Arc<ResolvedBinding>>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        let memo = memoize.then(CacheCell::new);
        Self::with_kind(
            name,
            ResolvedKind::Function { producer, memo },
            dependencies,
            stats,
        )
    }

    pub(crate) fn constructed(
        name: &str,
        constructor: SyncProducer,
        singleton: bool,
        dependencies: Vec<Arc<ResolvedBinding>>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        let singleton = singleton.then(CacheCell::new);
        Self::with_kind(
            name,
            ResolvedKind::Constructed {
                constructor,
                singleton,
            },
            dependencies,
            stats,
        )
    }

    pub(crate) fn async_value(
        name: &str,
        value: SharedValue,
        timeout: Option<Duration>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        Self::with_kind(
            name,
            ResolvedKind::AsyncValue { value, timeout },
            Vec::new(),
            stats,
        )
    }

    pub(crate) fn async_function(
        name: &str,
        producer: AsyncProducer,
        memoize: bool,
        timeout: Option<Duration>,
        dependencies: Vec<Arc<ResolvedBinding>>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        let memo = memoize.then(CacheCell::new);
        Self::with_kind(
            name,
            ResolvedKind::AsyncFunction {
                producer,
                memo,
                timeout,
            },
            dependencies,
            stats,
        )
    }

    fn with_kind(
        name: &str,
        kind: ResolvedKind,
        dependencies: Vec<Arc<ResolvedBinding>>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            dependencies,
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BindingKind {
        match &self.kind {
            ResolvedKind::Constant(_) => BindingKind::Constant,
            ResolvedKind::Boxed(_) => BindingKind::Boxed,
            ResolvedKind::Function { .. } => BindingKind::Function,
            ResolvedKind::Constructed { .. } => BindingKind::Constructible,
            ResolvedKind::AsyncValue { .. } => BindingKind::AsyncConstant,
            ResolvedKind::AsyncFunction { .. } => BindingKind::AsyncFunction,
        }
    }

    pub fn dependencies(&self) -> &[Arc<ResolvedBinding>] {
        &self.dependencies
    }

    /// 记忆化/单例值是否已经计算过
    pub fn is_cached(&self) -> bool {
        self.cache_cell().is_some_and(CacheCell::is_populated)
    }

    fn cache_cell(&self) -> Option<&CacheCell> {
        match &self.kind {
            ResolvedKind::Function { memo: Some(cell), .. }
            | ResolvedKind::Constructed {
                singleton: Some(cell),
                ..
            }
            | ResolvedKind::AsyncFunction { memo: Some(cell), .. } => Some(cell),
            _ => None,
        }
    }

    /// 同步取值
    pub fn get(&self) -> Result<Value> {
        match &self.kind {
            ResolvedKind::Constant(value) | ResolvedKind::Boxed(value) => Ok(value.clone()),
            ResolvedKind::Function { producer, memo } => match memo {
                Some(cell) => self.cached(cell, || self.call(producer)),
                None => self.call(producer),
            },
            ResolvedKind::Constructed {
                constructor,
                singleton,
            } => match singleton {
                Some(cell) => self.cached(cell, || self.call(constructor)),
                None => self.call(constructor),
            },
            ResolvedKind::AsyncValue { .. } | ResolvedKind::AsyncFunction { .. } => {
                Err(ContainerError::UnsupportedMode(self.name.clone()))
            }
        }
    }

    /// 异步取值，返回的 Future 不借用绑定本身
    ///
    /// 必须在 tokio 运行时里等待：缓存的首次计算和受超时约束的等待都会派生任务。
    pub fn get_async(self: &Arc<Self>) -> BoxFuture<'static, Result<Value>> {
        let this = Arc::clone(self);
        async move { this.retrieve_async().await }.boxed()
    }

    async fn retrieve_async(self: Arc<Self>) -> Result<Value> {
        let pending = match self.cache_cell() {
            Some(cell) => self.cached_async(cell),
            None => Arc::clone(&self).produce_async().boxed(),
        };
        match &self.kind {
            ResolvedKind::AsyncFunction {
                memo: Some(_),
                timeout: Some(limit),
                ..
            } => with_timeout(&self.name, Some(*limit), pending).await,
            _ => pending.await,
        }
    }

    /// 不经过缓存单元计算一次值
    async fn produce_async(self: Arc<Self>) -> Result<Value> {
        match &self.kind {
            ResolvedKind::Constant(value) | ResolvedKind::Boxed(value) => Ok(value.clone()),
            ResolvedKind::Function { producer, .. } => self.call_after_gather(producer).await,
            ResolvedKind::Constructed { constructor, .. } => {
                self.call_after_gather(constructor).await
            }
            ResolvedKind::AsyncValue { value, timeout } => {
                with_timeout(&self.name, *timeout, value.clone()).await
            }
            ResolvedKind::AsyncFunction {
                producer,
                memo,
                timeout,
            } => {
                // 记忆化时由调用方约束等待，生产者本身运行到结束
                let producer_timeout = if memo.is_some() { None } else { *timeout };
                self.call_async(producer, *timeout, producer_timeout).await
            }
        }
    }

    fn call(&self, producer: &SyncProducer) -> Result<Value> {
        let values = self
            .dependencies
            .iter()
            .map(|dependency| dependency.get())
            .collect::<Result<Vec<_>>>()?;
        self.invoke(producer, values)
    }

    async fn call_after_gather(&self, producer: &SyncProducer) -> Result<Value> {
        let values = self.gather(None).await?;
        self.invoke(producer, values)
    }

    async fn call_async(
        &self,
        producer: &AsyncProducer,
        dependency_timeout: Option<Duration>,
        producer_timeout: Option<Duration>,
    ) -> Result<Value> {
        let values = self.gather(dependency_timeout).await?;
        self.stats.record_invocation();
        let pending = producer(Args::new(&self.name, values));
        let name = self.name.clone();
        let produced = pending.map(move |result| {
            result.map_err(|e| ContainerError::producer_failed(&name, e))
        });
        with_timeout(&self.name, producer_timeout, produced).await
    }

    fn invoke(&self, producer: &SyncProducer, values: Vec<Value>) -> Result<Value> {
        self.stats.record_invocation();
        producer(&Args::new(&self.name, values))
            .map_err(|e| ContainerError::producer_failed(&self.name, e))
    }

    /// 并发获取全部依赖值
    ///
    /// 所有依赖的 Future 一起被轮询，总耗时取决于最慢的依赖。
    /// 配置了超时时，每个依赖单独受该超时约束。
    async fn gather(&self, timeout: Option<Duration>) -> Result<Vec<Value>> {
        let pending = self.dependencies.iter().map(|dependency| {
            let name = dependency.name.clone();
            let retrieval = dependency.get_async();
            async move { with_timeout(&name, timeout, retrieval).await }
        });
        future::try_join_all(pending).await
    }

    fn cached<F>(&self, cell: &CacheCell, compute: F) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
    {
        let mut slot = cell.value.lock();
        if let Some(value) = slot.as_ref() {
            self.stats.record_hit();
            return Ok(value.clone());
        }

        self.stats.record_miss();
        let value = compute()?;
        *slot = Some(value.clone());
        Ok(value)
    }

    /// 取缓存值或加入进行中的首次计算
    ///
    /// 只有发起计算的那次取值记为未命中，其余（包括等待同一次计算的并发取值）都记为命中。
    fn cached_async(self: &Arc<Self>, cell: &CacheCell) -> BoxFuture<'static, Result<Value>> {
        if let Some(value) = cell.value.lock().clone() {
            self.stats.record_hit();
            return future::ready(Ok(value)).boxed();
        }

        let mut slot = cell.pending.lock();
        let pending = match slot.as_ref() {
            Some(pending) => {
                self.stats.record_hit();
                pending.clone()
            }
            None => {
                self.stats.record_miss();
                let pending = self.populate_detached();
                *slot = Some(pending.clone());
                pending
            }
        };
        pending.boxed()
    }

    /// 在后台任务里完成首次计算
    ///
    /// 成功的结果写入缓存单元；失败时清空槽位，下一次取值重新计算。
    fn populate_detached(self: &Arc<Self>) -> SharedValue {
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = Arc::clone(&this).produce_async().await;
            if let Some(cell) = this.cache_cell() {
                match &result {
                    Ok(value) => *cell.value.lock() = Some(value.clone()),
                    Err(_) => *cell.pending.lock() = None,
                }
            }
            result
        });

        // 槽位持有这个句柄，这里只能弱引用绑定
        let owner: Weak<Self> = Arc::downgrade(self);
        let name = self.name.clone();
        task.map(move |joined| {
            joined.unwrap_or_else(|e| {
                let binding = owner.upgrade();
                if let Some(cell) = binding.as_deref().and_then(ResolvedBinding::cache_cell) {
                    *cell.pending.lock() = None;
                }
                Err(task_failed(&name, e))
            })
        })
        .boxed()
        .shared()
    }
}

/// 等待一个取值，超时只结束等待
///
/// 设置了超时时 Future 在独立任务里运行，调用方放弃等待后计算仍会继续。
async fn with_timeout<F>(name: &str, timeout: Option<Duration>, pending: F) -> Result<Value>
where
    F: Future<Output = Result<Value>> + Send + 'static,
{
    let Some(limit) = timeout else {
        return pending.await;
    };

    let task = tokio::spawn(pending);
    match tokio::time::timeout(limit, task).await {
        Ok(joined) => joined.unwrap_or_else(|e| Err(task_failed(name, e))),
        Err(_) => {
            tracing::warn!(name = %name, timeout_ms = limit.as_millis() as u64, "Async binding timed out");
            Err(ContainerError::Timeout {
                name: name.to_string(),
                timeout: limit,
            })
        }
    }
}

fn task_failed(name: &str, error: JoinError) -> ContainerError {
    ContainerError::producer_failed(name, Box::new(error))
}

impl fmt::Debug for ResolvedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependencies: Vec<&str> = self.dependencies.iter().map(|d| d.name()).collect();
        f.debug_struct("ResolvedBinding")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("dependencies", &dependencies)
            .field("cached", &self.is_cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stats() -> Arc<StatsRecorder> {
        Arc::new(StatsRecorder::default())
    }

    fn counting_unit(counter: Arc<AtomicUsize>) -> SyncProducer {
        sync_producer(move |_args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_memoized_unit_value_is_computed_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let binding =
            ResolvedBinding::function("a", counting_unit(counter.clone()), true, Vec::new(), stats());

        assert!(!binding.is_cached());
        for _ in 0..3 {
            assert!(binding.get().unwrap().is_unit());
        }
        assert!(binding.is_cached());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plain_function_runs_every_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let binding =
            ResolvedBinding::function("a", counting_unit(counter.clone()), false, Vec::new(), stats());

        for _ in 0..3 {
            binding.get().unwrap();
        }
        assert!(!binding.is_cached());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_function_receives_dependency_values() {
        let recorder = stats();
        let a = Arc::new(ResolvedBinding::constant("a", Value::new(true), recorder.clone()));
        let literal = Arc::new(ResolvedBinding::boxed("@boxed:0", Value::new(1234_i32), recorder.clone()));
        let producer = sync_producer(|args: &Args| {
            Ok(format!("{}-{}-F2", args.get::<bool>(0)?, args.get::<i32>(1)?))
        });
        let binding = ResolvedBinding::function("c", producer, false, vec![a, literal], recorder);

        let value = binding.get().unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "true-1234-F2");
    }

    #[test]
    fn test_failed_producer_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let producer = sync_producer(move |_args| -> std::result::Result<i32, BoxError> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("first call fails".into())
            } else {
                Ok(7)
            }
        });
        let binding = ResolvedBinding::function("flaky", producer, true, Vec::new(), stats());

        let err = binding.get().unwrap_err();
        assert!(matches!(err, ContainerError::ProducerFailed { ref name, .. } if name == "flaky"));
        assert_eq!(*binding.get().unwrap().downcast::<i32>().unwrap(), 7);
        assert_eq!(*binding.get().unwrap().downcast::<i32>().unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_async_kinds_reject_sync_retrieval() {
        let value = shared_value(async { 1_i32 });
        let binding = ResolvedBinding::async_value("a", value, None, stats());

        let err = binding.get().unwrap_err();
        assert!(matches!(err, ContainerError::UnsupportedMode(ref n) if n == "a"));
    }

    #[tokio::test]
    async fn test_async_value_can_be_awaited_repeatedly() {
        let value = shared_value(async { "abc".to_string() });
        let binding = Arc::new(ResolvedBinding::async_value("a", value, None, stats()));

        for _ in 0..2 {
            let value = binding.get_async().await.unwrap();
            assert_eq!(value.downcast_ref::<String>().unwrap(), "abc");
        }
    }

    #[tokio::test]
    async fn test_async_value_timeout() {
        let value = shared_value(future::pending::<String>());
        let binding = Arc::new(ResolvedBinding::async_value(
            "a",
            value,
            Some(Duration::from_millis(10)),
            stats(),
        ));

        let err = binding.get_async().await.unwrap_err();
        assert!(matches!(err, ContainerError::Timeout { ref name, .. } if name == "a"));
    }

    #[tokio::test]
    async fn test_async_function_timeout_bounds_each_dependency() {
        let recorder = stats();
        let slow = Arc::new(ResolvedBinding::async_value(
            "slow",
            shared_value(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                1_i32
            }),
            None,
            recorder.clone(),
        ));
        let producer = async_producer(|args: Args| async move { Ok::<_, BoxError>(*args.get::<i32>(0)? + 1) });
        let binding = Arc::new(ResolvedBinding::async_function(
            "b",
            producer,
            false,
            Some(Duration::from_millis(20)),
            vec![slow],
            recorder,
        ));

        let err = binding.get_async().await.unwrap_err();
        assert!(matches!(err, ContainerError::Timeout { ref name, .. } if name == "slow"));
    }

    #[tokio::test]
    async fn test_async_memoize_is_single_flight() {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let producer = async_producer(move |_args: Args| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, BoxError>(42_u64)
            }
        });
        let binding = Arc::new(ResolvedBinding::async_function(
            "answer",
            producer,
            true,
            None,
            Vec::new(),
            stats(),
        ));

        let retrievals = (0..10).map(|_| binding.get_async());
        let values = future::try_join_all(retrievals).await.unwrap();

        assert!(values.iter().all(|v| v.ptr_eq(&values[0])));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_count_as_hits() {
        let recorder = stats();
        let producer = async_producer(|_args: Args| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, BoxError>(1_u8)
        });
        let binding = Arc::new(ResolvedBinding::async_function(
            "a",
            producer,
            true,
            None,
            Vec::new(),
            recorder.clone(),
        ));

        let retrievals = (0..10).map(|_| binding.get_async());
        future::try_join_all(retrievals).await.unwrap();

        let snapshot = recorder.snapshot(1);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 9);
        assert_eq!(snapshot.producer_invocations, 1);

        binding.get_async().await.unwrap();
        assert_eq!(recorder.snapshot(1).cache_hits, 10);
    }

    #[tokio::test]
    async fn test_failed_async_population_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let producer = async_producer(move |_args: Args| {
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if first {
                    Err::<i32, BoxError>("warming up".into())
                } else {
                    Ok(7)
                }
            }
        });
        let binding = Arc::new(ResolvedBinding::async_function(
            "flaky",
            producer,
            true,
            None,
            Vec::new(),
            stats(),
        ));

        let err = binding.get_async().await.unwrap_err();
        assert!(matches!(err, ContainerError::ProducerFailed { ref name, .. } if name == "flaky"));
        assert!(!binding.is_cached());

        assert_eq!(*binding.get_async().await.unwrap().downcast::<i32>().unwrap(), 7);
        assert_eq!(*binding.get_async().await.unwrap().downcast::<i32>().unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_memoized_producer_finishes_after_caller_timeout() {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let producer = async_producer(move |_args: Args| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(40)).await;
                Ok::<_, BoxError>("ready")
            }
        });
        let binding = Arc::new(ResolvedBinding::async_function(
            "a",
            producer,
            true,
            Some(Duration::from_millis(10)),
            Vec::new(),
            stats(),
        ));

        let err = binding.get_async().await.unwrap_err();
        assert!(matches!(err, ContainerError::Timeout { ref name, .. } if name == "a"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(binding.is_cached());
        let value = binding.get_async().await.unwrap();
        assert_eq!(*value.downcast::<&str>().unwrap(), "ready");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sync_function_in_async_tree_gathers_dependencies() {
        let recorder = stats();
        let a = Arc::new(ResolvedBinding::async_value(
            "a",
            shared_value(async { 2_i32 }),
            None,
            recorder.clone(),
        ));
        let producer = sync_producer(|args: &Args| Ok(*args.get::<i32>(0)? * 10));
        let binding = Arc::new(ResolvedBinding::function("b", producer, false, vec![a], recorder));

        let value = binding.get_async().await.unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 20);
    }
}
