//! 绑定注册表
//!
//! 以名称为键的存储区，每个条目处于 `Partial`（尚未解析依赖）或
//! `Resolved`（可求值）状态。解析器在构建阶段把所有 `Partial` 原地替换为
//! `Resolved`，之后注册表只读，只有缓存单元会被惰性填充。

use super::binding::{AsyncProducer, ResolvedBinding, SharedValue, SyncProducer};
#[cfg(test)]
use super::binding::{async_producer, sync_producer};
use super::stats::StatsRecorder;
use super::value::Value;
use crate::config::ContainerMode;
use crate::errors::{ContainerError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// 字面量包装绑定的保留前缀，用户名称不能以此开头
pub const BOXED_PREFIX: &str = "@boxed:";

/// 依赖提取函数：给定已绑定名称集合，返回有序的依赖列表
pub type DependencyFn = Arc<dyn Fn(&KnownNames<'_>) -> Vec<Dependency> + Send + Sync>;

/// 依赖列表中的一项
#[derive(Debug, Clone)]
pub enum Dependency {
    /// 引用另一个绑定
    Binding(String),
    /// 原始字面量，解析时被包装为匿名绑定
    Literal(Value),
}

impl Dependency {
    pub fn binding(name: impl Into<String>) -> Self {
        Dependency::Binding(name.into())
    }

    pub fn literal<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Dependency::Literal(Value::new(value))
    }
}

impl From<&str> for Dependency {
    fn from(name: &str) -> Self {
        Dependency::Binding(name.to_string())
    }
}

impl From<String> for Dependency {
    fn from(name: String) -> Self {
        Dependency::Binding(name)
    }
}

impl From<Value> for Dependency {
    fn from(value: Value) -> Self {
        Dependency::Literal(value)
    }
}

/// 传给依赖提取函数的已绑定名称视图
pub struct KnownNames<'a> {
    entries: &'a HashMap<String, Entry>,
}

impl<'a> KnownNames<'a> {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 引用一个绑定；未绑定的名称会在解析时报 `UnboundDependency`
    pub fn get(&self, name: &str) -> Dependency {
        Dependency::Binding(name.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 依赖名称列表
pub fn deps<I, S>(names: I) -> DependencyFn
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    Arc::new(move |_known: &KnownNames<'_>| {
        names.iter().cloned().map(Dependency::Binding).collect()
    })
}

/// 无依赖
pub fn none() -> DependencyFn {
    Arc::new(|_known: &KnownNames<'_>| Vec::new())
}

/// 自定义依赖提取函数，可以混合绑定引用和字面量
pub fn deps_with<F>(extractor: F) -> DependencyFn
where
    F: Fn(&KnownNames<'_>) -> Vec<Dependency> + Send + Sync + 'static,
{
    Arc::new(extractor)
}

/// 绑定种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Constant,
    AsyncConstant,
    Function,
    AsyncFunction,
    Constructible,
    Boxed,
}

impl BindingKind {
    /// 只能异步取值的种类
    pub fn is_async_only(self) -> bool {
        matches!(self, BindingKind::AsyncConstant | BindingKind::AsyncFunction)
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BindingKind::Constant => "constant",
            BindingKind::AsyncConstant => "async constant",
            BindingKind::Function => "function",
            BindingKind::AsyncFunction => "async function",
            BindingKind::Constructible => "constructible",
            BindingKind::Boxed => "boxed literal",
        };
        f.write_str(label)
    }
}

/// 绑定选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingOptions {
    pub memoize: bool,
    pub singleton: bool,
    pub timeout: Option<Duration>,
}

impl BindingOptions {
    pub fn memoize(mut self) -> Self {
        self.memoize = true;
        self
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 记忆化函数选项
pub fn memoize() -> BindingOptions {
    BindingOptions::default().memoize()
}

/// 单例构造选项
pub fn singleton() -> BindingOptions {
    BindingOptions::default().singleton()
}

/// 原始生产者
#[derive(Clone)]
pub enum Producer {
    Constant(Value),
    AsyncConstant(SharedValue),
    Function(SyncProducer),
    AsyncFunction(AsyncProducer),
    Constructible(SyncProducer),
}

impl Producer {
    pub fn kind(&self) -> BindingKind {
        match self {
            Producer::Constant(_) => BindingKind::Constant,
            Producer::AsyncConstant(_) => BindingKind::AsyncConstant,
            Producer::Function(_) => BindingKind::Function,
            Producer::AsyncFunction(_) => BindingKind::AsyncFunction,
            Producer::Constructible(_) => BindingKind::Constructible,
        }
    }
}

/// 注册记录：引擎的输入
#[derive(Clone)]
pub struct BindingRecord {
    pub name: String,
    pub producer: Producer,
    pub dependencies: DependencyFn,
    pub options: BindingOptions,
}

impl BindingRecord {
    pub fn new(name: impl Into<String>, producer: Producer) -> Self {
        Self {
            name: name.into(),
            producer,
            dependencies: none(),
            options: BindingOptions::default(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: DependencyFn) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_options(mut self, options: BindingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn kind(&self) -> BindingKind {
        self.producer.kind()
    }
}

impl fmt::Debug for BindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRecord")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("options", &self.options)
            .finish()
    }
}

/// 尚未解析依赖的绑定
#[derive(Clone)]
pub struct PartialBinding {
    pub(crate) name: String,
    pub(crate) producer: Producer,
    pub(crate) dependencies: DependencyFn,
    pub(crate) options: BindingOptions,
}

/// 注册表条目
#[derive(Clone)]
pub enum Entry {
    Partial(PartialBinding),
    Resolved(Arc<ResolvedBinding>),
}

impl Entry {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Entry::Resolved(_))
    }

    pub fn kind(&self) -> BindingKind {
        match self {
            Entry::Partial(partial) => partial.producer.kind(),
            Entry::Resolved(resolved) => resolved.kind(),
        }
    }
}

/// 绑定注册表
pub struct Registry {
    mode: ContainerMode,
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    boxed_counter: usize,
    stats: Arc<StatsRecorder>,
}

impl Registry {
    pub fn new(mode: ContainerMode) -> Self {
        Self {
            mode,
            entries: HashMap::new(),
            order: Vec::new(),
            boxed_counter: 0,
            stats: Arc::new(StatsRecorder::default()),
        }
    }

    pub fn mode(&self) -> ContainerMode {
        self.mode
    }

    /// 注册绑定
    ///
    /// 常量与异步常量没有依赖，直接以已解析状态入表；其他种类以 `Partial`
    /// 入表，等待构建阶段解析。
    pub fn register(&mut self, record: BindingRecord) -> Result<()> {
        validate_name(&record.name)?;

        if self.entries.contains_key(&record.name) {
            return Err(ContainerError::DuplicateName(record.name));
        }

        if record.kind().is_async_only() && self.mode != ContainerMode::Async {
            return Err(ContainerError::wrong_mode(
                &format!("bind {} '{}'", record.kind(), record.name),
                "async",
            ));
        }

        tracing::debug!(name = %record.name, kind = %record.kind(), "Binding registered");

        let BindingRecord {
            name,
            producer,
            dependencies,
            options,
        } = record;

        let entry = match producer {
            Producer::Constant(value) => Entry::Resolved(Arc::new(ResolvedBinding::constant(
                &name,
                value,
                self.stats.clone(),
            ))),
            Producer::AsyncConstant(value) => Entry::Resolved(Arc::new(
                ResolvedBinding::async_value(&name, value, options.timeout, self.stats.clone()),
            )),
            producer => Entry::Partial(PartialBinding {
                name: name.clone(),
                producer,
                dependencies,
                options,
            }),
        };

        self.order.push(name.clone());
        self.entries.insert(name, entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 按注册顺序返回所有名称
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn known_names(&self) -> KnownNames<'_> {
        KnownNames {
            entries: &self.entries,
        }
    }

    /// 仍处于 `Partial` 状态的名称，按注册顺序
    pub fn partial_names(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| matches!(self.entries.get(*name), Some(Entry::Partial(_))))
            .cloned()
            .collect()
    }

    pub(crate) fn replace(&mut self, binding: Arc<ResolvedBinding>) {
        self.entries
            .insert(binding.name().to_string(), Entry::Resolved(binding));
    }

    /// 为字面量分配合成名称，计数器只属于当前注册表
    pub(crate) fn next_boxed_name(&mut self) -> String {
        let name = format!("{}{}", BOXED_PREFIX, self.boxed_counter);
        self.boxed_counter += 1;
        name
    }

    pub(crate) fn stats(&self) -> &Arc<StatsRecorder> {
        &self.stats
    }

    /// 解析完成后取出全部已解析绑定
    ///
    /// 仍有 `Partial` 条目说明解析没有完成，返回这些名称。
    pub(crate) fn into_resolved(
        self,
    ) -> std::result::Result<ResolvedRegistry, Vec<String>> {
        let pending = self.partial_names();
        if !pending.is_empty() {
            return Err(pending);
        }

        let bindings = self
            .entries
            .into_iter()
            .filter_map(|(name, entry)| match entry {
                Entry::Resolved(binding) => Some((name, binding)),
                Entry::Partial(_) => None,
            })
            .collect();

        Ok(ResolvedRegistry {
            bindings,
            order: self.order,
            stats: self.stats,
        })
    }
}

/// 全部解析完成的注册表，由 Provider 持有
pub(crate) struct ResolvedRegistry {
    pub(crate) bindings: HashMap<String, Arc<ResolvedBinding>>,
    pub(crate) order: Vec<String>,
    pub(crate) stats: Arc<StatsRecorder>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ContainerError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    if name.starts_with(BOXED_PREFIX) {
        return Err(ContainerError::InvalidName {
            name: name.to_string(),
            reason: format!("the '{}' prefix is reserved", BOXED_PREFIX),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_record(name: &str, dependencies: DependencyFn) -> BindingRecord {
        let producer = sync_producer(|_args| Ok(1_i32));
        BindingRecord::new(name, Producer::Function(producer)).with_dependencies(dependencies)
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = Registry::new(ContainerMode::Sync);
        registry
            .register(BindingRecord::new("b", Producer::Constant(Value::new(1))))
            .unwrap();
        registry.register(function_record("a", none())).unwrap();

        assert_eq!(registry.names(), ["b".to_string(), "a".to_string()]);
        assert!(registry.get("b").unwrap().is_resolved());
        assert!(!registry.get("a").unwrap().is_resolved());
        assert_eq!(registry.partial_names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_duplicate_name_across_kinds() {
        let mut registry = Registry::new(ContainerMode::Sync);
        registry
            .register(BindingRecord::new("a", Producer::Constant(Value::new(1))))
            .unwrap();

        let err = registry.register(function_record("a", none())).unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateName(ref n) if n == "a"));
        assert_eq!(err.to_string(), "a already bound");
    }

    #[test]
    fn test_reserved_and_empty_names() {
        let mut registry = Registry::new(ContainerMode::Sync);

        let reserved = format!("{}0", BOXED_PREFIX);
        let err = registry
            .register(BindingRecord::new(reserved, Producer::Constant(Value::new(1))))
            .unwrap_err();
        assert!(matches!(err, ContainerError::InvalidName { .. }));

        let err = registry
            .register(BindingRecord::new("", Producer::Constant(Value::new(1))))
            .unwrap_err();
        assert!(matches!(err, ContainerError::InvalidName { .. }));
    }

    #[test]
    fn test_async_kind_rejected_in_sync_mode() {
        let mut registry = Registry::new(ContainerMode::Sync);
        let producer = async_producer(|_args| async { Ok::<_, crate::errors::BoxError>(1_i32) });
        let err = registry
            .register(BindingRecord::new("a", Producer::AsyncFunction(producer)))
            .unwrap_err();
        assert!(matches!(err, ContainerError::WrongMode { expected: "async", .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_boxed_names_are_scoped_to_registry() {
        let mut first = Registry::new(ContainerMode::Sync);
        let mut second = Registry::new(ContainerMode::Sync);

        assert_eq!(first.next_boxed_name(), "@boxed:0");
        assert_eq!(first.next_boxed_name(), "@boxed:1");
        assert_eq!(second.next_boxed_name(), "@boxed:0");
    }

    #[test]
    fn test_dependency_helpers() {
        let registry = Registry::new(ContainerMode::Sync);
        let known = registry.known_names();

        let listed = deps(["a", "b"])(&known);
        assert!(matches!(&listed[..], [Dependency::Binding(a), Dependency::Binding(b)] if a == "a" && b == "b"));

        assert!(none()(&known).is_empty());

        let mixed = deps_with(|d| vec![d.get("a"), Dependency::literal(555_i32)])(&known);
        assert!(matches!(&mixed[1], Dependency::Literal(v) if v.is::<i32>()));
    }
}
