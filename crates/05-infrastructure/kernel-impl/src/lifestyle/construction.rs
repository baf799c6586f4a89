//! 单例构造的跨线程等待图
//!
//! 记录每个正在构造的单例由哪个线程负责，以及每个线程正在等待哪个单例。
//! 线程开始等待前沿着 "负责线程 -> 它等待的单例 -> 该单例的负责线程" 前进，
//! 回到自己说明两条解析链互相等待。登记表跨内核共享，父子内核之间的等待也能被发现。

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

/// 单例槽位标识，每个单例管理器一个
pub(crate) type SlotId = u64;

static NEXT_SLOT: AtomicU64 = AtomicU64::new(1);

static WAIT_GRAPH: Lazy<Mutex<WaitGraph>> = Lazy::new(|| Mutex::new(WaitGraph::default()));

#[derive(Default)]
struct WaitGraph {
    /// 槽位 -> (负责构造的线程, 组件键)
    owners: HashMap<SlotId, (ThreadId, String)>,
    /// 线程 -> 正在等待的槽位
    waiting: HashMap<ThreadId, SlotId>,
}

pub(crate) fn next_slot() -> SlotId {
    NEXT_SLOT.fetch_add(1, Ordering::Relaxed)
}

/// 当前线程开始构造 `slot`
pub(crate) fn begin(slot: SlotId, key: &str) {
    WAIT_GRAPH
        .lock()
        .owners
        .insert(slot, (thread::current().id(), key.to_string()));
}

/// `slot` 的构造结束（成功或失败）
pub(crate) fn finish(slot: SlotId) {
    WAIT_GRAPH.lock().owners.remove(&slot);
}

/// 登记当前线程等待 `slot`
///
/// 等待会闭合成环时不登记，返回沿环经过的组件键（不含 `slot` 自身，以当前线程负责的组件结尾）。
pub(crate) fn wait_for(slot: SlotId) -> Result<(), Vec<String>> {
    let me = thread::current().id();
    let mut graph = WAIT_GRAPH.lock();

    let mut hops = Vec::new();
    let mut current = slot;
    while hops.len() <= graph.waiting.len() {
        let Some((owner, _)) = graph.owners.get(&current) else {
            break;
        };
        if *owner == me {
            return Err(hops);
        }
        let Some(next) = graph.waiting.get(owner) else {
            break;
        };
        current = *next;
        if let Some((_, key)) = graph.owners.get(&current) {
            hops.push(key.clone());
        }
    }

    graph.waiting.insert(me, slot);
    Ok(())
}

/// 当前线程结束等待
pub(crate) fn stop_waiting() {
    WAIT_GRAPH.lock().waiting.remove(&thread::current().id());
}
