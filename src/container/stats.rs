//! 容器统计

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// 运行期统计记录器，所有绑定共享同一个实例
#[derive(Debug, Default)]
pub struct StatsRecorder {
    retrievals: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    invocations: AtomicU64,
    middleware_applications: AtomicU64,
    failures: AtomicU64,
    per_name: DashMap<String, u64>,
}

impl StatsRecorder {
    pub(crate) fn record_retrieval(&self, name: &str) {
        self.retrievals.fetch_add(1, Ordering::Relaxed);
        *self.per_name.entry(name.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_middleware(&self, count: usize) {
        self.middleware_applications
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// 当前统计快照
    pub fn snapshot(&self, registered_bindings: usize) -> ContainerStats {
        let mut retrievals_by_name: Vec<(String, u64)> = self
            .per_name
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        retrievals_by_name.sort_by(|a, b| a.0.cmp(&b.0));

        ContainerStats {
            total_retrievals: self.retrievals.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            producer_invocations: self.invocations.load(Ordering::Relaxed),
            middleware_applications: self.middleware_applications.load(Ordering::Relaxed),
            failed_retrievals: self.failures.load(Ordering::Relaxed),
            registered_bindings,
            retrievals_by_name,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerStats {
    /// 通过 Provider 的取值次数
    pub total_retrievals: u64,
    /// 记忆化/单例缓存命中次数
    pub cache_hits: u64,
    /// 记忆化/单例缓存未命中次数
    pub cache_misses: u64,
    /// 生产者（函数、构造器、异步函数）实际调用次数
    pub producer_invocations: u64,
    /// 中间件变换执行次数
    pub middleware_applications: u64,
    /// 失败的取值次数
    pub failed_retrievals: u64,
    /// 已注册绑定数量
    pub registered_bindings: usize,
    /// 每个名称的取值次数，按名称排序
    pub retrievals_by_name: Vec<(String, u64)>,
}

impl ContainerStats {
    /// 获取缓存命中率（百分比）
    pub fn cache_hit_rate(&self) -> f64 {
        self.hit_rate() * 100.0
    }

    /// 获取缓存命中率（小数形式）
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn total(&self) -> u64 {
        self.total_retrievals
    }

    /// 某个名称的取值次数
    pub fn retrievals_of(&self, name: &str) -> u64 {
        self.retrievals_by_name
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// 获取容器性能摘要
    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} retrievals, {:.1}% cache hit rate, {} producer calls, {} registered bindings",
            self.total_retrievals,
            self.cache_hit_rate(),
            self.producer_invocations,
            self.registered_bindings
        )
    }
}
