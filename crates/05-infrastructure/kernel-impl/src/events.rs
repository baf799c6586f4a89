//! 事件总线
//!
//! 订阅者列表在分发前拍快照，分发期间不持有任何锁：监听器可以在回调中注册组件、
//! 订阅或取消订阅而不会死锁。

use kernel_abstractions::{EventListener, KernelEvent, SubscriptionId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// 同步事件总线
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(SubscriptionId, EventListener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// 创建事件总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器
    pub fn subscribe(&self, listener: EventListener) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.listeners.lock().push((id, listener));
        id
    }

    /// 移除监听器，返回是否存在
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// 向当前全部订阅者同步分发事件
    ///
    /// 监听器内部再次发布的事件按深度优先投递：嵌套事件先送达全部订阅者，
    /// 外层事件再继续送往快照中剩余的监听器。
    pub fn publish(&self, event: &KernelEvent) {
        let snapshot: Vec<EventListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        trace!(event = event.name(), listeners = snapshot.len(), "分发内核事件");
        for listener in snapshot {
            listener(event);
        }
    }

    /// 订阅者数量
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// 是否没有订阅者
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}
