//! 组件实例
//!
//! 内核内部以类型擦除的共享指针传递实例，身份由指针地址决定。

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// 实例身份（共享指针的地址）
pub type InstanceId = usize;

/// 类型擦除的组件实例
///
/// 具体类型通过 [`ComponentInstance::new`] 存放，用 [`ComponentInstance::downcast`] 取回；
/// 以 trait 对象提供的服务通过 [`ComponentInstance::from_service`] 存放，
/// 用 [`ComponentInstance::service`] 取回。
#[derive(Clone)]
pub struct ComponentInstance {
    inner: Arc<dyn Any + Send + Sync>,
}

impl ComponentInstance {
    /// 包装一个具体值
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// 包装一个已经共享的具体值
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self { inner: value }
    }

    /// 包装一个以 trait 对象暴露的服务，例如 `Arc<dyn MailService>`
    pub fn from_service<S: ?Sized + Send + Sync + 'static>(service: Arc<S>) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    /// 取回具体类型
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// 取回以 trait 对象存放的服务
    pub fn service<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.inner.downcast_ref::<Arc<S>>().cloned()
    }

    /// 是否存放了指定的具体类型
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// 实例身份
    pub fn id(&self) -> InstanceId {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }

    /// 是否为同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// 不持有所有权的弱引用
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// 当前强引用计数
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentInstance({:#x})", self.id())
    }
}

/// 组件实例的弱引用，用于追踪而不延长实例寿命
#[derive(Clone)]
pub struct WeakInstance {
    inner: Weak<dyn Any + Send + Sync>,
}

impl WeakInstance {
    /// 尝试取回强引用
    pub fn upgrade(&self) -> Option<ComponentInstance> {
        self.inner.upgrade().map(|inner| ComponentInstance { inner })
    }

    /// 实例是否仍存活，不会产生临时强引用
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// 是否指向给定实例
    pub fn points_to(&self, instance: &ComponentInstance) -> bool {
        self.upgrade().is_some_and(|alive| alive.ptr_eq(instance))
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakInstance")
    }
}
