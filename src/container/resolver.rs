//! 依赖解析器
//!
//! 构建阶段执行一次：按注册顺序遍历所有 `Partial` 绑定，深度优先解析依赖，
//! 把每个 `Partial` 原地替换为 `Resolved`。解析链 `chain` 记录当前路径，
//! 某个名称再次出现在链上即为循环依赖。

use super::binding::ResolvedBinding;
use super::registry::{Dependency, Entry, PartialBinding, Producer, Registry};
use crate::errors::{ContainerError, Result};
use std::sync::Arc;

/// 解析注册表中全部 `Partial` 绑定
pub fn resolve_all(registry: &mut Registry) -> Result<()> {
    for name in registry.partial_names() {
        // 前面的解析可能已经顺带解析了它
        if let Some(Entry::Partial(partial)) = registry.get(&name).cloned() {
            resolve(registry, partial, &mut Vec::new())?;
        }
    }
    Ok(())
}

fn resolve(
    registry: &mut Registry,
    partial: PartialBinding,
    chain: &mut Vec<String>,
) -> Result<Arc<ResolvedBinding>> {
    if chain.iter().any(|n| n == &partial.name) {
        let mut path = chain.clone();
        path.push(partial.name.clone());
        tracing::debug!(path = %path.join(" -> "), "Cyclic dependency detected");
        return Err(ContainerError::CyclicDependency(path));
    }

    let declared = (partial.dependencies)(&registry.known_names());

    chain.push(partial.name.clone());
    let mut dependencies = Vec::with_capacity(declared.len());
    for dependency in declared {
        let resolved = match dependency {
            Dependency::Literal(value) => {
                let boxed_name = registry.next_boxed_name();
                Arc::new(ResolvedBinding::boxed(
                    &boxed_name,
                    value,
                    registry.stats().clone(),
                ))
            }
            Dependency::Binding(name) => match registry.get(&name).cloned() {
                Some(Entry::Resolved(binding)) => binding,
                Some(Entry::Partial(inner)) => resolve(registry, inner, chain)?,
                None => {
                    return Err(ContainerError::UnboundDependency {
                        binding: partial.name.clone(),
                        dependency: name,
                    })
                }
            },
        };
        dependencies.push(resolved);
    }
    chain.pop();

    let resolved = Arc::new(finalize(registry, partial, dependencies));
    registry.replace(resolved.clone());
    tracing::debug!(name = %resolved.name(), kind = %resolved.kind(), "Binding resolved");
    Ok(resolved)
}

fn finalize(
    registry: &Registry,
    partial: PartialBinding,
    dependencies: Vec<Arc<ResolvedBinding>>,
) -> ResolvedBinding {
    let stats = registry.stats().clone();
    let PartialBinding {
        name,
        producer,
        options,
        ..
    } = partial;

    match producer {
        Producer::Constant(value) => ResolvedBinding::constant(&name, value, stats),
        Producer::AsyncConstant(value) => {
            ResolvedBinding::async_value(&name, value, options.timeout, stats)
        }
        Producer::Function(producer) => {
            ResolvedBinding::function(&name, producer, options.memoize, dependencies, stats)
        }
        Producer::Constructible(constructor) => ResolvedBinding::constructed(
            &name,
            constructor,
            options.singleton,
            dependencies,
            stats,
        ),
        Producer::AsyncFunction(producer) => ResolvedBinding::async_function(
            &name,
            producer,
            options.memoize,
            options.timeout,
            dependencies,
            stats,
        ),
    }
}
