//! 惰性依赖注入容器
//!
//! 先注册具名绑定（常量、函数、可构造类型、异步值、异步函数），再调用
//! `build` 得到 [`Provider`]。每个名称的值在访问时才计算，记忆化和单例
//! 的缓存在绑定内部，请求中间件在每次访问时执行。

pub mod config;
pub mod container;
pub mod errors;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ContainerConfig, ContainerMode};
pub use container::{
    deps, deps_with, memoize, none, singleton, Args, BindingKind, BindingOptions, BindingRecord,
    ContainerBuilder, ContainerStats, Dependency, Provider, Value,
};
pub use errors::{BoxError, ContainerError, Result};
