//! 已发出实例的追踪表
//!
//! 只保存弱引用：调用方丢弃实例而不释放时，记录在下一次清理中被移除。
//! 清理在表长度达到阈值时随插入执行，阈值随存活记录数翻倍，插入的均摊开销保持常数。

use dashmap::DashMap;
use microkernel_common::{ComponentInstance, InstanceId, WeakInstance};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

const MIN_PRUNE_THRESHOLD: usize = 64;

pub(crate) struct InstanceTracker<V> {
    entries: DashMap<InstanceId, (WeakInstance, V)>,
    prune_at: AtomicUsize,
}

impl<V> InstanceTracker<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
            prune_at: AtomicUsize::new(MIN_PRUNE_THRESHOLD),
        }
    }

    /// 记录实例；同一地址上已失效的旧记录被覆盖
    pub(crate) fn insert(&self, instance: &ComponentInstance, value: V) {
        if self.entries.len() >= self.prune_at.load(Ordering::Relaxed) {
            self.prune();
        }
        self.entries.insert(instance.id(), (instance.downgrade(), value));
    }

    /// 移除实例已被丢弃的记录，返回移除数量
    pub(crate) fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (weak, _)| weak.is_alive());
        let alive = self.entries.len();
        self.prune_at
            .store((alive * 2).max(MIN_PRUNE_THRESHOLD), Ordering::Relaxed);
        let removed = before.saturating_sub(alive);
        trace!(removed, alive, "清理失效的实例追踪记录");
        removed
    }

    /// 取出实例的记录；记录不存在或已指向别的实例时返回 `None`
    pub(crate) fn take(&self, instance: &ComponentInstance) -> Option<V> {
        let (_, (weak, value)) = self.entries.remove(&instance.id())?;
        weak.points_to(instance).then_some(value)
    }

    pub(crate) fn retain(&self, mut keep: impl FnMut(&V) -> bool) {
        self.entries.retain(|_, (_, value)| keep(value));
    }

    pub(crate) fn clear(&self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
