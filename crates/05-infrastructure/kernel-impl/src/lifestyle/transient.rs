use super::destroy_quietly;
use crate::tracking::InstanceTracker;
use kernel_abstractions::{CreationContext, InstanceFactory, LifestyleManager};
use microkernel_common::{ComponentInstance, KernelResult};
use std::sync::Arc;
use tracing::debug;

/// 瞬时生命周期：每次解析都构造新实例，不做任何缓存
///
/// 有销毁钩子时记住发出的实例（弱引用），释放只对这些实例执行钩子。
pub struct TransientLifestyleManager {
    factory: Arc<dyn InstanceFactory>,
    issued: InstanceTracker<()>,
}

impl TransientLifestyleManager {
    /// 创建管理器
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            factory,
            issued: InstanceTracker::new(),
        }
    }
}

impl LifestyleManager for TransientLifestyleManager {
    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance> {
        let instance = self.factory.create(context)?;
        if self.requires_release() {
            self.issued.insert(&instance, ());
        }
        Ok(instance)
    }

    fn release(&self, instance: &ComponentInstance) -> bool {
        if self.issued.take(instance).is_none() {
            debug!("实例不是组件 {} 发出的, 忽略释放", self.factory.model().key());
            return false;
        }
        destroy_quietly(self.factory.as_ref(), instance);
        true
    }

    fn dispose(&self) {
        self.issued.clear();
    }

    fn requires_release(&self) -> bool {
        self.factory.model().has_teardown()
    }
}
