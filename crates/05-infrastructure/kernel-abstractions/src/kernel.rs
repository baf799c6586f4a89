//! 内核抽象接口
//!
//! 贡献者、子解析器和代理工厂通过这个 trait 访问内核，而不依赖具体实现。

use crate::configuration::ConfigurationStore;
use crate::context::CreationContext;
use crate::handler::Handler;
use crate::lifestyle::CustomLifestyleFactory;
use microkernel_common::{ComponentInstance, KernelConfig, KernelResult, TypeInfo};
use std::sync::Arc;

/// 内核 trait
///
/// 所有查找都是先本地、后父内核。
pub trait Kernel: Send + Sync {
    /// 内核设置
    fn settings(&self) -> &KernelConfig;

    /// 是否存在指定键的组件
    fn has_component(&self, key: &str) -> bool;

    /// 是否存在提供指定服务的组件
    fn has_service(&self, service: &TypeInfo) -> bool;

    /// 按键获取处理器
    fn handler(&self, key: &str) -> Option<Arc<dyn Handler>>;

    /// 按服务获取处理器：优先返回第一个处于 Valid 状态的处理器
    fn handler_for_service(&self, service: &TypeInfo) -> Option<Arc<dyn Handler>>;

    /// 提供指定服务的全部处理器，本地在前、父内核在后
    fn handlers_for_service(&self, service: &TypeInfo) -> Vec<Arc<dyn Handler>>;

    /// 在给定上下文中按键解析
    fn resolve_key_in(&self, key: &str, context: &CreationContext) -> KernelResult<ComponentInstance>;

    /// 在给定上下文中按服务解析
    fn resolve_service_in(
        &self,
        service: &TypeInfo,
        context: &CreationContext,
    ) -> KernelResult<ComponentInstance>;

    /// 在给定上下文中解析服务的全部 Valid 实现
    fn resolve_all_in(
        &self,
        service: &TypeInfo,
        context: &CreationContext,
    ) -> KernelResult<Vec<ComponentInstance>>;

    /// 配置存储
    fn configuration_store(&self) -> Arc<dyn ConfigurationStore>;

    /// 按名称查找自定义生命周期工厂
    fn custom_lifestyle(&self, name: &str) -> Option<CustomLifestyleFactory>;
}
