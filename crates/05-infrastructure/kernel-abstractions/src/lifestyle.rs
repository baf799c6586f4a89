//! 生命周期管理器抽象接口

use crate::activator::InstanceFactory;
use crate::context::CreationContext;
use microkernel_common::{ComponentInstance, KernelResult};
use std::sync::Arc;

/// 生命周期管理器 trait
///
/// 每个处理器在整个生命周期内恰好拥有一个管理器，管理器决定实例的缓存与复用策略。
pub trait LifestyleManager: Send + Sync {
    /// 获取实例，必要时通过实例工厂构造
    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance>;

    /// 释放实例；实例不归本管理器所有时返回 false
    fn release(&self, instance: &ComponentInstance) -> bool;

    /// 销毁管理器，释放仍持有的实例
    fn dispose(&self);

    /// 调用方释放实例时是否需要内核转交给本管理器
    fn requires_release(&self) -> bool {
        true
    }
}

/// 自定义生命周期管理器工厂，处理器创建时调用一次
pub type CustomLifestyleFactory =
    Arc<dyn Fn(Arc<dyn InstanceFactory>) -> Box<dyn LifestyleManager> + Send + Sync>;
