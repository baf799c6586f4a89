//! 扩展设施

use crate::kernel::DefaultKernel;
use kernel_abstractions::{KernelEvent, SubscriptionHandle};
use microkernel_common::{ConfigNode, HandlerState, KernelResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// 扩展设施 trait
///
/// 设施在添加时初始化，内核销毁时按添加的逆序终止。
pub trait Facility: Send + Sync {
    /// 初始化，`configuration` 来自配置存储中同键的设施配置
    fn init(&self, kernel: &DefaultKernel, configuration: Option<ConfigNode>) -> KernelResult<()>;

    /// 终止
    fn terminate(&self);
}

/// 自动启动设施
///
/// 标记为 startable 的组件在其处理器转为 Valid 后立即被解析一次。
/// 启动失败只记录日志，之后收到该组件的事件时会再次尝试。
#[derive(Default)]
pub struct StartableFacility {
    subscription: Mutex<Option<SubscriptionHandle>>,
    started: Arc<Mutex<Vec<String>>>,
}

impl StartableFacility {
    /// 创建设施
    pub fn new() -> Self {
        Self::default()
    }

    /// 已启动的组件键，按启动顺序
    pub fn started_components(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    fn try_start(kernel: &DefaultKernel, key: &str, started: &Mutex<Vec<String>>) {
        let Some(handler) = kernel.local_handler(key) else {
            return;
        };
        if !handler.model().is_startable() || handler.state() != HandlerState::Valid {
            return;
        }

        {
            let mut started = started.lock();
            if started.iter().any(|existing| existing == key) {
                return;
            }
            started.push(key.to_string());
        }

        match kernel.resolve(key) {
            Ok(_) => info!("组件已自动启动: {}", key),
            Err(e) => {
                warn!("组件 {} 自动启动失败: {}", key, e);
                started.lock().retain(|existing| existing != key);
            }
        }
    }
}

impl Facility for StartableFacility {
    fn init(&self, kernel: &DefaultKernel, _configuration: Option<ConfigNode>) -> KernelResult<()> {
        let weak = kernel.downgrade();
        let started = self.started.clone();
        let handle = kernel.subscribe(move |event| {
            let key = match event {
                KernelEvent::ComponentRegistered { key, .. } => key,
                KernelEvent::HandlerStateChanged {
                    key,
                    current: HandlerState::Valid,
                    ..
                } => key,
                _ => return,
            };
            if let Some(kernel) = weak.upgrade() {
                Self::try_start(&kernel, key, &started);
            }
        });
        *self.subscription.lock() = Some(handle);

        for handler in kernel.handlers() {
            Self::try_start(kernel, handler.key(), &self.started);
        }
        Ok(())
    }

    fn terminate(&self) {
        if let Some(handle) = self.subscription.lock().take() {
            handle.unsubscribe();
        }
    }
}
