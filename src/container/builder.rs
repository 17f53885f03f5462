//! 容器构建器
//!
//! 注册阶段只记录绑定，`build` 时才校验请求列表、解析依赖并生成 [`Provider`]。
//!
//! ```ignore
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .bind_value("a", 1_i32)?
//!     .bind_function("b", |args| Ok(*args.get::<i32>(0)? + 1), deps(["a"]), Default::default())?;
//! let provider = builder.build(["a", "b"])?;
//! assert_eq!(*provider.get_as::<i32>("b")?, 2);
//! ```

use super::binding::{async_producer, shared_try_value, shared_value, sync_producer};
use super::middleware::{MiddlewareChain, Transform};
use super::provider::Provider;
use super::registry::{BindingOptions, BindingRecord, DependencyFn, Producer, Registry};
use super::resolver;
use super::value::{Args, Value};
use crate::config::{ContainerConfig, ContainerMode};
use crate::errors::{BoxError, ContainerError, Result};
use crate::logging::OperationTimer;
use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// 依赖注入容器构建器
pub struct ContainerBuilder {
    registry: Registry,
    middleware: MiddlewareChain,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// 同步模式构建器
    pub fn new() -> Self {
        Self::with_mode(ContainerMode::Sync)
    }

    /// 异步模式构建器
    pub fn new_async() -> Self {
        Self::with_mode(ContainerMode::Async)
    }

    pub fn with_mode(mode: ContainerMode) -> Self {
        Self::from_config(&ContainerConfig {
            mode,
            ..ContainerConfig::default()
        })
    }

    pub fn from_config(config: &ContainerConfig) -> Self {
        Self {
            registry: Registry::new(config.mode),
            middleware: MiddlewareChain::new(),
            config: config.clone(),
        }
    }

    pub fn mode(&self) -> ContainerMode {
        self.registry.mode()
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// 绑定常量
    pub fn bind_value<T>(&mut self, name: &str, value: T) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
    {
        self.register(BindingRecord::new(name, Producer::Constant(Value::new(value))))
    }

    /// 绑定函数，`options.memoize` 控制是否只计算一次
    pub fn bind_function<T, F>(
        &mut self,
        name: &str,
        function: F,
        dependencies: DependencyFn,
        options: BindingOptions,
    ) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
        F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(
            BindingRecord::new(name, Producer::Function(sync_producer(function)))
                .with_dependencies(dependencies)
                .with_options(options),
        )
    }

    /// 绑定可构造类型，`options.singleton` 控制是否只构造一次
    pub fn bind_constructor<T, F>(
        &mut self,
        name: &str,
        constructor: F,
        dependencies: DependencyFn,
        options: BindingOptions,
    ) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
        F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(
            BindingRecord::new(name, Producer::Constructible(sync_producer(constructor)))
                .with_dependencies(dependencies)
                .with_options(options),
        )
    }

    /// 绑定异步值（仅异步模式）
    pub fn bind_async_value<T, Fut>(
        &mut self,
        name: &str,
        value: Fut,
        timeout: Option<Duration>,
    ) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.ensure_async("bind_async_value", name)?;
        let options = BindingOptions {
            timeout,
            ..BindingOptions::default()
        };
        self.register(
            BindingRecord::new(name, Producer::AsyncConstant(shared_value(value))).with_options(options),
        )
    }

    /// 绑定可能失败的异步值（仅异步模式）
    pub fn bind_async_value_with<T, Fut>(
        &mut self,
        name: &str,
        value: Fut,
        timeout: Option<Duration>,
    ) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        self.ensure_async("bind_async_value_with", name)?;
        let options = BindingOptions {
            timeout,
            ..BindingOptions::default()
        };
        self.register(
            BindingRecord::new(name, Producer::AsyncConstant(shared_try_value(name, value)))
                .with_options(options),
        )
    }

    /// 绑定异步函数（仅异步模式）
    ///
    /// 依赖并发获取；设置了超时时，每个依赖以及函数本身都单独受超时约束。
    /// 超时只结束调用方的等待，记忆化的首次计算仍会在后台完成并写入缓存。
    pub fn bind_async_function<T, F, Fut>(
        &mut self,
        name: &str,
        function: F,
        dependencies: DependencyFn,
        options: BindingOptions,
    ) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        self.ensure_async("bind_async_function", name)?;
        self.register(
            BindingRecord::new(name, Producer::AsyncFunction(async_producer(function)))
                .with_dependencies(dependencies)
                .with_options(options),
        )
    }

    /// 注册一条原始绑定记录
    pub fn register(&mut self, mut record: BindingRecord) -> Result<&mut Self> {
        if record.kind().is_async_only() && record.options.timeout.is_none() {
            record.options.timeout = self.config.default_timeout();
        }
        self.registry.register(record)?;
        Ok(self)
    }

    /// 挂载请求中间件，目标名称可以稍后再绑定
    pub fn on_request<F>(&mut self, name: &str, transform: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.attach(
            name,
            Arc::new(move |value: Value| -> Result<Value> { Ok(transform(value)) }),
        )
    }

    /// 类型化的请求中间件，值类型不符时取值失败并返回 `TypeMismatch`
    pub fn map<T, F>(&mut self, name: &str, transform: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        let target = name.to_string();
        self.attach(
            name,
            Arc::new(move |value: Value| -> Result<Value> {
                let current = value.expect_type::<T>(&target)?;
                Ok(Value::new(transform(&current)))
            }),
        )
    }

    /// 挂载一个可能失败的中间件
    pub fn attach(&mut self, name: &str, transform: Transform) -> &mut Self {
        self.middleware.attach(name, transform);
        self
    }

    /// 校验请求名称、解析全部绑定并生成 Provider
    ///
    /// 校验全部在解析之前完成，失败时不会留下部分解析的状态。
    pub fn build<I, S>(mut self, names: I) -> Result<Provider>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let timer = OperationTimer::new("container.build")
            .with_metadata("mode", self.mode())
            .with_metadata("bindings", self.registry.len());

        let requested: Vec<String> = names.into_iter().map(Into::into).collect();
        self.validate(&requested)?;

        resolver::resolve_all(&mut self.registry)?;

        let mode = self.mode();
        let resolved = self
            .registry
            .into_resolved()
            .map_err(ContainerError::MissingBinding)?;
        let count = resolved.bindings.len();
        let provider = Provider::new(resolved, self.middleware, mode, self.config.trace_retrievals);

        let elapsed = timer.finish();
        tracing::info!(
            mode = %mode,
            bindings = count,
            requested = requested.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Container built"
        );
        Ok(provider)
    }

    fn validate(&self, requested: &[String]) -> Result<()> {
        if requested.is_empty() {
            return Err(ContainerError::MissingArguments);
        }

        let mut seen = HashSet::new();
        for name in requested {
            if !seen.insert(name.as_str()) {
                return Err(ContainerError::DuplicateArgument(name.clone()));
            }
        }

        let missing: Vec<String> = requested
            .iter()
            .filter(|name| !self.registry.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ContainerError::MissingBinding(missing));
        }

        if let Some(target) = self
            .middleware
            .targets()
            .find(|target| !self.registry.contains(target))
        {
            return Err(ContainerError::UnknownMiddlewareTarget(target.to_string()));
        }

        Ok(())
    }

    fn ensure_async(&self, operation: &str, name: &str) -> Result<()> {
        if self.mode() != ContainerMode::Async {
            return Err(ContainerError::wrong_mode(
                &format!("{} '{}'", operation, name),
                "async",
            ));
        }
        Ok(())
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::registry::{deps, memoize, none};

    #[test]
    fn test_build_validation_order() {
        let mut builder = ContainerBuilder::new();
        builder.bind_value("a", 1_i32).unwrap();
        let err = builder.build(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.to_string(), "arguments must be provided when calling build");

        let mut builder = ContainerBuilder::new();
        builder.bind_value("a", 1_i32).unwrap();
        let err = builder.build(["a", "x", "a"]).unwrap_err();
        assert_eq!(err.to_string(), "a argument already provided");

        let mut builder = ContainerBuilder::new();
        builder.bind_value("a", 1_i32).unwrap();
        builder.on_request("ghost", |v| v);
        let err = builder.build(["y", "a", "x"]).unwrap_err();
        assert_eq!(err.to_string(), "y, x bindings are not defined");

        let mut builder = ContainerBuilder::new();
        builder.bind_value("a", 1_i32).unwrap();
        builder.on_request("ghost", |v| v);
        let err = builder.build(["a"]).unwrap_err();
        assert_eq!(err.to_string(), "ghost mapper is unknown");
    }

    #[test]
    fn test_validation_runs_before_resolution() {
        let mut builder = ContainerBuilder::new();
        builder
            .bind_function("a", |_| Ok(()), deps(["a"]), BindingOptions::default())
            .unwrap();
        let err = builder.build(["missing"]).unwrap_err();
        assert!(matches!(err, ContainerError::MissingBinding(_)));
    }

    #[test]
    fn test_async_bindings_need_async_mode() {
        let mut builder = ContainerBuilder::new();
        let err = builder
            .bind_async_value("a", async { 1_i32 }, None)
            .err()
            .unwrap();
        assert!(matches!(err, ContainerError::WrongMode { expected: "async", .. }));

        let err = builder
            .bind_async_function(
                "b",
                |_args| async { Ok::<_, BoxError>(1_i32) },
                none(),
                memoize(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, ContainerError::WrongMode { .. }));
        assert!(!builder.is_bound("a"));
        assert!(!builder.is_bound("b"));
    }

    #[test]
    fn test_default_timeout_from_config() {
        let config = ContainerConfig {
            mode: ContainerMode::Async,
            default_timeout_ms: Some(15),
            trace_retrievals: true,
        };
        let mut builder = ContainerBuilder::from_config(&config);
        builder
            .bind_async_value("never", std::future::pending::<i32>(), None)
            .unwrap();
        let provider = builder.build(["never"]).unwrap();

        let err = tokio_test::block_on(async {
            tokio::time::timeout(Duration::from_secs(1), provider.get_async("never"))
                .await
                .unwrap()
        })
        .unwrap_err();
        assert!(matches!(err, ContainerError::Timeout { timeout, .. } if timeout == Duration::from_millis(15)));
    }
}
