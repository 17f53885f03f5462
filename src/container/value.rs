//! 类型擦除的值与生产者参数

use crate::errors::{ContainerError, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 容器中流转的值
///
/// 内部是 `Arc<dyn Any + Send + Sync>`，克隆只增加引用计数。
/// 单例与记忆化的缓存保存的就是这个句柄，因此可以用 [`Value::ptr_eq`]
/// 判断两次取值是否为同一个实例。
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// 空值（`()`），对应“没有返回值”的生产者
    pub fn unit() -> Self {
        Self::new(())
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_ref().type_id() == TypeId::of::<T>()
    }

    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// 转换为具体类型的共享句柄
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// 与 [`Value::downcast`] 相同，失败时返回带绑定名的 `TypeMismatch`
    pub fn expect_type<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_name)
    }
}

/// 传给生产者的已解析依赖值，顺序与声明顺序一致
#[derive(Debug, Clone)]
pub struct Args {
    binding: String,
    values: Vec<Value>,
}

impl Args {
    pub(crate) fn new(binding: &str, values: Vec<Value>) -> Self {
        Self {
            binding: binding.to_string(),
            values,
        }
    }

    /// 按位置取出指定类型的参数
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.value(index)?;
        value.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            name: format!("{}[{}]", self.binding, index),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn value(&self, index: usize) -> Result<&Value> {
        self.values
            .get(index)
            .ok_or_else(|| ContainerError::MissingArgument {
                name: self.binding.clone(),
                index,
            })
    }

    /// 当前正在生产的绑定名
    pub fn binding(&self) -> &str {
        &self.binding
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_and_identity() {
        let value = Value::new(42_i32);
        assert!(value.is::<i32>());
        assert_eq!(*value.downcast::<i32>().unwrap(), 42);
        assert!(value.downcast::<String>().is_none());

        let same = value.clone();
        assert!(value.ptr_eq(&same));
        assert!(!value.ptr_eq(&Value::new(42_i32)));
    }

    #[test]
    fn test_unit_value() {
        let value = Value::unit();
        assert!(value.is_unit());
        assert_eq!(value.type_name(), "()");
    }

    #[test]
    fn test_args_access() {
        let args = Args::new("c", vec![Value::new(true), Value::new(1234_u32)]);
        assert_eq!(args.len(), 2);
        assert!(*args.get::<bool>(0).unwrap());
        assert_eq!(*args.get::<u32>(1).unwrap(), 1234);

        let err = args.get::<String>(0).unwrap_err();
        assert!(matches!(err, ContainerError::TypeMismatch { ref name, .. } if name == "c[0]"));

        let err = args.get::<u32>(5).unwrap_err();
        assert!(matches!(err, ContainerError::MissingArgument { index: 5, .. }));
    }
}
