//! 请求中间件链
//!
//! 每个名称对应一个有序的变换列表，每次取值（包括命中缓存的取值）都会按
//! 挂载顺序依次执行。

use super::value::Value;
use crate::errors::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// 请求变换函数
pub type Transform = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// 按名称组织的中间件链
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    transforms: HashMap<String, Vec<Transform>>,
    order: Vec<String>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个变换；目标名称此时不必已经绑定
    pub fn attach(&mut self, name: &str, transform: Transform) {
        if !self.transforms.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.transforms
            .entry(name.to_string())
            .or_default()
            .push(transform);
    }

    /// 挂载了中间件的名称，按首次挂载顺序
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len_for(&self, name: &str) -> usize {
        self.transforms.get(name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// 依次执行 `name` 的全部变换
    pub fn apply(&self, name: &str, value: Value) -> Result<Value> {
        match self.transforms.get(name) {
            Some(chain) => chain
                .iter()
                .try_fold(value, |current, transform| transform(current)),
            None => Ok(value),
        }
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(&str, usize)> = self
            .order
            .iter()
            .map(|name| (name.as_str(), self.len_for(name)))
            .collect();
        f.debug_struct("MiddlewareChain")
            .field("transforms", &counts)
            .finish()
    }
}
