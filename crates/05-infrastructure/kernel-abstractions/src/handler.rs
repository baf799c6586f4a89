//! 组件处理器抽象接口

use crate::context::CreationContext;
use crate::model::ComponentModel;
use chrono::{DateTime, Utc};
use microkernel_common::{ComponentInstance, HandlerState, KernelResult, Lifestyle, TypeInfo};
use std::sync::Arc;

/// 组件处理器 trait
///
/// 处理器独占一个组件模型和一个生命周期管理器，是解析的基本单元。
pub trait Handler: Send + Sync {
    /// 组件键
    fn key(&self) -> &str {
        self.model().key()
    }

    /// 服务类型
    fn service(&self) -> &TypeInfo {
        self.model().service()
    }

    /// 组件模型
    fn model(&self) -> &Arc<ComponentModel>;

    /// 当前状态
    fn state(&self) -> HandlerState;

    /// 尚未满足的服务依赖
    fn pending_dependencies(&self) -> Vec<TypeInfo>;

    /// 解析实例
    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance>;

    /// 释放实例；实例不归本处理器所有时返回 false
    fn release(&self, instance: &ComponentInstance) -> bool;

    /// 内核是否需要追踪本处理器产出的实例以便转交释放
    fn requires_release_tracking(&self) -> bool;

    /// 销毁处理器及其生命周期管理器
    fn dispose(&self);

    /// 状态快照
    fn info(&self) -> HandlerInfo;
}

/// 处理器状态快照
#[derive(Debug, Clone)]
pub struct HandlerInfo {
    /// 组件键
    pub key: String,
    /// 服务类型
    pub service: TypeInfo,
    /// 实现类型
    pub implementation: TypeInfo,
    /// 生命周期
    pub lifestyle: Lifestyle,
    /// 当前状态
    pub state: HandlerState,
    /// 尚未满足的服务依赖
    pub pending: Vec<TypeInfo>,
    /// 注册时间
    pub registered_at: DateTime<Utc>,
}
