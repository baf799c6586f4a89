//! 默认组件处理器

use crate::kernel::KernelShared;
use chrono::{DateTime, Utc};
use kernel_abstractions::{
    ComponentModel, CreationContext, Handler, HandlerInfo, Kernel, KernelEvent, LifestyleManager,
    SubscriptionId,
};
use microkernel_common::{ComponentInstance, HandlerState, KernelError, KernelResult, TypeInfo};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

struct HandlerData {
    state: HandlerState,
    pending: Vec<TypeInfo>,
    subscription: Option<SubscriptionId>,
}

/// 默认组件处理器
///
/// 状态机：
///
/// - 注册时所有必需服务依赖都已存在 → `Valid`
/// - 否则 → `WaitingDependency`，订阅内核的注册事件，直到待满足集合清空后转为 `Valid` 并取消订阅
/// - 处理器被销毁或移除 → `Invalid`（终态）
///
/// 只检查直接依赖是否有提供者，更深层的失败在解析时暴露。
pub struct DefaultHandler {
    model: Arc<ComponentModel>,
    lifestyle: Box<dyn LifestyleManager>,
    kernel: Weak<KernelShared>,
    data: Mutex<HandlerData>,
    disposed: AtomicBool,
    registered_at: DateTime<Utc>,
}

impl DefaultHandler {
    pub(crate) fn new(
        model: Arc<ComponentModel>,
        lifestyle: Box<dyn LifestyleManager>,
        kernel: Weak<KernelShared>,
    ) -> Self {
        Self {
            model,
            lifestyle,
            kernel,
            data: Mutex::new(HandlerData {
                state: HandlerState::WaitingDependency,
                pending: Vec::new(),
                subscription: None,
            }),
            disposed: AtomicBool::new(false),
            registered_at: Utc::now(),
        }
    }

    /// 计算待满足依赖并确定初始状态
    ///
    /// 先订阅再检查：检查期间持有状态锁，并发注册的事件会在检查完成后才被处理，
    /// 不会遗漏。
    pub(crate) fn init(self: &Arc<Self>, kernel: &KernelShared) {
        let mut data = self.data.lock();

        let weak = Arc::downgrade(self);
        let subscription = kernel.events.subscribe(Arc::new(move |event| {
            if let (Some(handler), KernelEvent::ComponentRegistered { handler: registered, .. }) =
                (weak.upgrade(), event)
            {
                handler.dependency_registered(registered.service());
            }
        }));

        let mut pending: Vec<TypeInfo> = Vec::new();
        for dependency in self.model.required_services() {
            let target = dependency.target();
            if !kernel.has_service(target) && !pending.contains(target) {
                pending.push(target.clone());
            }
        }

        if pending.is_empty() {
            data.state = HandlerState::Valid;
            drop(data);
            kernel.events.unsubscribe(subscription);
            debug!(component = self.key(), "处理器就绪");
        } else {
            debug!(
                component = self.key(),
                pending = ?pending.iter().map(TypeInfo::short_name).collect::<Vec<_>>(),
                "处理器等待依赖"
            );
            data.state = HandlerState::WaitingDependency;
            data.pending = pending;
            data.subscription = Some(subscription);
        }
    }

    /// 重新检查待满足依赖，父内核变化后调用
    pub(crate) fn refresh(&self, kernel: &KernelShared) {
        let subscription = {
            let mut data = self.data.lock();
            if data.state != HandlerState::WaitingDependency {
                return;
            }
            data.pending.retain(|service| !kernel.has_service(service));
            if !data.pending.is_empty() {
                return;
            }
            data.state = HandlerState::Valid;
            data.subscription.take()
        };
        self.became_valid(subscription);
    }

    fn dependency_registered(&self, service: &TypeInfo) {
        let subscription = {
            let mut data = self.data.lock();
            if data.state != HandlerState::WaitingDependency {
                return;
            }
            let before = data.pending.len();
            data.pending.retain(|pending| pending != service);
            if data.pending.len() == before {
                return;
            }
            if !data.pending.is_empty() {
                trace!(component = self.key(), remaining = data.pending.len(), "依赖部分满足");
                return;
            }
            data.state = HandlerState::Valid;
            data.subscription.take()
        };
        self.became_valid(subscription);
    }

    fn became_valid(&self, subscription: Option<SubscriptionId>) {
        info!(component = self.key(), "依赖已满足, 处理器就绪");
        if let Some(kernel) = self.kernel.upgrade() {
            if let Some(id) = subscription {
                kernel.events.unsubscribe(id);
            }
            kernel.events.publish(&KernelEvent::HandlerStateChanged {
                key: self.key().to_string(),
                previous: HandlerState::WaitingDependency,
                current: HandlerState::Valid,
            });
        }
    }
}

impl Handler for DefaultHandler {
    fn model(&self) -> &Arc<ComponentModel> {
        &self.model
    }

    fn state(&self) -> HandlerState {
        self.data.lock().state
    }

    fn pending_dependencies(&self) -> Vec<TypeInfo> {
        self.data.lock().pending.clone()
    }

    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance> {
        {
            let data = self.data.lock();
            match data.state {
                HandlerState::Valid => {}
                HandlerState::WaitingDependency => {
                    return Err(KernelError::DependenciesUnsatisfied {
                        key: self.key().to_string(),
                        pending: data
                            .pending
                            .iter()
                            .map(|service| service.full_name().to_string())
                            .collect(),
                    })
                }
                HandlerState::Invalid => {
                    return Err(KernelError::HandlerInvalid {
                        key: self.key().to_string(),
                    })
                }
            }
        }

        let kernel = self.kernel.upgrade().ok_or(KernelError::KernelDisposed)?;
        let context = context.enter(self.key(), kernel.settings().max_resolution_depth)?;
        trace!(component = self.key(), depth = context.depth(), "解析组件");
        self.lifestyle.resolve(&context)
    }

    fn release(&self, instance: &ComponentInstance) -> bool {
        self.lifestyle.release(instance)
    }

    fn requires_release_tracking(&self) -> bool {
        self.lifestyle.requires_release()
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let (previous, subscription) = {
            let mut data = self.data.lock();
            let previous = data.state;
            data.state = HandlerState::Invalid;
            data.pending.clear();
            (previous, data.subscription.take())
        };

        if let Some(kernel) = self.kernel.upgrade() {
            if let Some(id) = subscription {
                kernel.events.unsubscribe(id);
            }
            kernel.events.publish(&KernelEvent::HandlerStateChanged {
                key: self.key().to_string(),
                previous,
                current: HandlerState::Invalid,
            });
        }

        self.lifestyle.dispose();
        debug!(component = self.key(), "处理器已销毁");
    }

    fn info(&self) -> HandlerInfo {
        let data = self.data.lock();
        HandlerInfo {
            key: self.key().to_string(),
            service: self.service().clone(),
            implementation: self.model.implementation().clone(),
            lifestyle: self.model.lifestyle().clone(),
            state: data.state,
            pending: data.pending.clone(),
            registered_at: self.registered_at,
        }
    }
}

impl std::fmt::Debug for DefaultHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultHandler")
            .field("key", &self.key())
            .field("state", &self.state())
            .finish()
    }
}
