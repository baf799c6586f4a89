//! 内核事件
//!
//! 内核在注册、注销、状态变化、实例创建与销毁时同步通知全部当前订阅者。

use crate::handler::Handler;
use crate::model::ComponentModel;
use microkernel_common::{ComponentInstance, HandlerState};
use std::fmt;
use std::sync::Arc;

/// 内核事件
#[derive(Clone)]
pub enum KernelEvent {
    /// 模型构建管道完成
    ComponentModelCreated { model: Arc<ComponentModel> },
    /// 组件已注册
    ComponentRegistered { key: String, handler: Arc<dyn Handler> },
    /// 组件已注销
    ComponentUnregistered { key: String, handler: Arc<dyn Handler> },
    /// 处理器状态变化
    HandlerStateChanged {
        key: String,
        previous: HandlerState,
        current: HandlerState,
    },
    /// 新实例已创建
    ComponentCreated { key: String, instance: ComponentInstance },
    /// 实例已销毁
    ComponentDestroyed { key: String, instance: ComponentInstance },
    /// 本内核被挂到父内核下
    AddedAsChildKernel,
    /// 本内核与父内核断开
    RemovedAsChildKernel,
}

impl KernelEvent {
    /// 事件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::ComponentModelCreated { .. } => "ComponentModelCreated",
            Self::ComponentRegistered { .. } => "ComponentRegistered",
            Self::ComponentUnregistered { .. } => "ComponentUnregistered",
            Self::HandlerStateChanged { .. } => "HandlerStateChanged",
            Self::ComponentCreated { .. } => "ComponentCreated",
            Self::ComponentDestroyed { .. } => "ComponentDestroyed",
            Self::AddedAsChildKernel => "AddedAsChildKernel",
            Self::RemovedAsChildKernel => "RemovedAsChildKernel",
        }
    }
}

impl fmt::Debug for KernelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComponentModelCreated { model } => write!(f, "ComponentModelCreated({})", model.key()),
            Self::ComponentRegistered { key, .. } => write!(f, "ComponentRegistered({key})"),
            Self::ComponentUnregistered { key, .. } => write!(f, "ComponentUnregistered({key})"),
            Self::HandlerStateChanged { key, previous, current } => {
                write!(f, "HandlerStateChanged({key}: {previous} -> {current})")
            }
            Self::ComponentCreated { key, instance } => write!(f, "ComponentCreated({key}, {instance:?})"),
            Self::ComponentDestroyed { key, instance } => write!(f, "ComponentDestroyed({key}, {instance:?})"),
            Self::AddedAsChildKernel => f.write_str("AddedAsChildKernel"),
            Self::RemovedAsChildKernel => f.write_str("RemovedAsChildKernel"),
        }
    }
}

/// 事件监听器
pub type EventListener = Arc<dyn Fn(&KernelEvent) + Send + Sync>;

/// 订阅ID
pub type SubscriptionId = u64;

/// 订阅句柄
///
/// 句柄被丢弃时自动取消订阅；调用 [`SubscriptionHandle::detach`] 可让订阅与内核同寿。
pub struct SubscriptionHandle {
    id: SubscriptionId,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionHandle {
    /// 创建订阅句柄
    pub fn new(id: SubscriptionId, cancel: Box<dyn FnOnce() + Send + Sync>) -> Self {
        Self {
            id,
            cancel: Some(cancel),
        }
    }

    /// 订阅ID
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// 立即取消订阅
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// 放弃句柄但保留订阅
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
