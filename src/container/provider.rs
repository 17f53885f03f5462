//! 构建完成的依赖提供者
//!
//! 每个已注册名称都有一个惰性访问入口：取值时先经过绑定自身的求值与缓存，
//! 再依次经过该名称的中间件链。Provider 本身不缓存任何值。

use super::binding::ResolvedBinding;
use super::middleware::MiddlewareChain;
use super::registry::{BindingKind, ResolvedRegistry};
use super::stats::ContainerStats;
use super::value::Value;
use crate::config::ContainerMode;
use crate::errors::{ContainerError, Result};
use futures_util::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 依赖提供者，克隆开销很小，可以在任务间共享
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    registry: ResolvedRegistry,
    middleware: MiddlewareChain,
    mode: ContainerMode,
    trace_retrievals: bool,
}

impl Provider {
    pub(crate) fn new(
        registry: ResolvedRegistry,
        middleware: MiddlewareChain,
        mode: ContainerMode,
        trace_retrievals: bool,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                middleware,
                mode,
                trace_retrievals,
            }),
        }
    }

    pub fn mode(&self) -> ContainerMode {
        self.inner.mode
    }

    /// 同步取值（仅同步模式）
    pub fn get(&self, name: &str) -> Result<Value> {
        if self.inner.mode != ContainerMode::Sync {
            return Err(ContainerError::wrong_mode(&format!("get '{}'", name), "sync"));
        }

        let binding = self.inner.lookup(name)?;
        let result = binding
            .get()
            .and_then(|value| self.inner.apply_middleware(name, value));
        self.inner.finish_retrieval(name, result)
    }

    /// 异步取值（仅异步模式）
    ///
    /// 返回的 Future 不借用 Provider，可以直接 `tokio::spawn`。
    pub fn get_async(&self, name: &str) -> BoxFuture<'static, Result<Value>> {
        let inner = Arc::clone(&self.inner);
        let name = name.to_string();

        async move {
            if inner.mode != ContainerMode::Async {
                return Err(ContainerError::wrong_mode(
                    &format!("get_async '{}'", name),
                    "async",
                ));
            }

            let binding = inner.lookup(&name)?;
            let result = match binding.get_async().await {
                Ok(value) => inner.apply_middleware(&name, value),
                Err(e) => Err(e),
            };
            inner.finish_retrieval(&name, result)
        }
        .boxed()
    }

    /// 同步取值并转换为具体类型
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)?.expect_type::<T>(name)
    }

    /// 异步取值并转换为具体类型
    pub async fn get_as_async<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get_async(name).await?.expect_type::<T>(name)
    }

    /// 所有已注册名称，按注册顺序
    pub fn names(&self) -> &[String] {
        &self.inner.registry.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.registry.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.registry.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.bindings.is_empty()
    }

    /// 调试用：已解析的依赖名称（包括字面量包装的合成名称）
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<String>> {
        self.inner.registry.bindings.get(name).map(|binding| {
            binding
                .dependencies()
                .iter()
                .map(|dependency| dependency.name().to_string())
                .collect()
        })
    }

    pub fn kind_of(&self, name: &str) -> Option<BindingKind> {
        self.inner.registry.bindings.get(name).map(|b| b.kind())
    }

    /// 记忆化/单例绑定是否已经计算过
    pub fn is_cached(&self, name: &str) -> bool {
        self.inner
            .registry
            .bindings
            .get(name)
            .is_some_and(|binding| binding.is_cached())
    }

    /// 获取统计信息快照
    pub fn stats(&self) -> ContainerStats {
        self.inner
            .registry
            .stats
            .snapshot(self.inner.registry.bindings.len())
    }
}

impl ProviderInner {
    fn lookup(&self, name: &str) -> Result<Arc<ResolvedBinding>> {
        self.registry
            .bindings
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::MissingBinding(vec![name.to_string()]))
    }

    fn apply_middleware(&self, name: &str, value: Value) -> Result<Value> {
        let count = self.middleware.len_for(name);
        if count == 0 {
            return Ok(value);
        }
        self.registry.stats.record_middleware(count);
        self.middleware.apply(name, value)
    }

    fn finish_retrieval(&self, name: &str, result: Result<Value>) -> Result<Value> {
        self.registry.stats.record_retrieval(name);
        match &result {
            Ok(value) => {
                if self.trace_retrievals {
                    tracing::trace!(name = %name, value_type = value.type_name(), "Value retrieved");
                }
            }
            Err(e) => {
                self.registry.stats.record_failure();
                tracing::debug!(name = %name, error = %e, "Retrieval failed");
            }
        }
        result
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("mode", &self.inner.mode)
            .field("names", &self.inner.registry.order)
            .field("middleware", &self.inner.middleware)
            .finish()
    }
}
