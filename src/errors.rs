//! 容器错误类型
//!
//! 注册、构建和取值阶段的所有失败都归入 `ContainerError`，没有内部重试。

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 生产者（函数、构造器、异步计算）返回的错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, ContainerError>;

/// 依赖注入容器错误
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    #[error("{0} already bound")]
    DuplicateName(String),

    #[error("invalid binding name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Cyclic dependency {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    #[error("{}", missing_bindings_message(.0))]
    MissingBinding(Vec<String>),

    #[error("arguments must be provided when calling build")]
    MissingArguments,

    #[error("{0} argument already provided")]
    DuplicateArgument(String),

    #[error("{0} mapper is unknown")]
    UnknownMiddlewareTarget(String),

    #[error("{binding} depends on '{dependency}', which is not bound")]
    UnboundDependency { binding: String, dependency: String },

    #[error("binding '{0}' cannot be retrieved in this mode")]
    UnsupportedMode(String),

    #[error("'{operation}' requires {expected} mode")]
    WrongMode {
        operation: String,
        expected: &'static str,
    },

    #[error("'{name}' timed out after {} ms", .timeout.as_millis())]
    Timeout { name: String, timeout: Duration },

    #[error("type mismatch for '{name}': expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("'{name}' has no argument at position {index}")]
    MissingArgument { name: String, index: usize },

    #[error("failed to produce '{name}': {reason}")]
    ProducerFailed {
        name: String,
        reason: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ContainerError {
    /// 包装生产者返回的错误
    ///
    /// 生产者内部通过 `?` 抛出的 `ContainerError` 原样返回，不再包一层。
    pub fn producer_failed(name: &str, error: BoxError) -> Self {
        match error.downcast::<ContainerError>() {
            Ok(inner) => *inner,
            Err(other) => ContainerError::ProducerFailed {
                name: name.to_string(),
                reason: other.to_string(),
                source: Some(Arc::from(other)),
            },
        }
    }

    pub fn wrong_mode(operation: &str, expected: &'static str) -> Self {
        ContainerError::WrongMode {
            operation: operation.to_string(),
            expected,
        }
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, ContainerError::Timeout { .. })
    }
}

fn missing_bindings_message(names: &[String]) -> String {
    match names {
        [single] => format!("{} binding is not defined", single),
        _ => format!("{} bindings are not defined", names.join(", ")),
    }
}
