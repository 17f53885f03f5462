//! Container module
//!
//! 注册表 → 解析器 → 可求值绑定 → 中间件 → Provider

pub mod binding;
pub mod builder;
pub mod middleware;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod stats;
pub mod value;

// Re-export primary types
pub use binding::{
    async_producer, shared_try_value, shared_value, sync_producer, AsyncProducer, ResolvedBinding,
    SharedValue, SyncProducer,
};
pub use builder::ContainerBuilder;
pub use middleware::{MiddlewareChain, Transform};
pub use provider::Provider;
pub use registry::{
    deps, deps_with, memoize, none, singleton, BindingKind, BindingOptions, BindingRecord,
    Dependency, DependencyFn, KnownNames, Producer, Registry, BOXED_PREFIX,
};
pub use stats::{ContainerStats, StatsRecorder};
pub use value::{Args, Value};
