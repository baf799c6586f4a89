use super::construction::{self, SlotId};
use super::destroy_quietly;
use kernel_abstractions::{CreationContext, InstanceFactory, LifestyleManager};
use microkernel_common::{ComponentInstance, KernelError, KernelResult};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

/// 单例生命周期
///
/// 首次解析由一个线程构造，其余并发的首次解析等待并拿到同一个实例。
/// 等待前检查跨线程的等待图：两个线程从不同入口解析一对循环依赖的单例时，
/// 闭合等待环的一方得到 [`KernelError::CircularDependency`]，不会互相阻塞。
/// 构造失败不会写入缓存，下一次解析重新尝试。
pub struct SingletonLifestyleManager {
    factory: Arc<dyn InstanceFactory>,
    instance: OnceCell<ComponentInstance>,
    slot: SlotId,
    /// 正在构造的线程
    creator: Mutex<Option<ThreadId>>,
    created: Condvar,
    disposed: AtomicBool,
}

impl SingletonLifestyleManager {
    /// 创建管理器
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            factory,
            instance: OnceCell::new(),
            slot: construction::next_slot(),
            creator: Mutex::new(None),
            created: Condvar::new(),
            disposed: AtomicBool::new(false),
        }
    }

    fn circular(&self, context: &CreationContext, hops: Vec<String>) -> KernelError {
        let own_key = self.factory.model().key();
        let mut path = context.path();
        if hops.is_empty() {
            path.push(own_key.to_string());
        } else {
            path.extend(hops);
        }
        let key = path.last().map_or_else(|| own_key.to_string(), Clone::clone);
        warn!("单例构造互相等待: {}", path.join(" -> "));
        KernelError::CircularDependency { key, path }
    }
}

/// 构造结束时清除负责线程并唤醒等待者，构造失败或 panic 时同样执行
struct CreationGuard<'a> {
    manager: &'a SingletonLifestyleManager,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut creator = self.manager.creator.lock();
        *creator = None;
        construction::finish(self.manager.slot);
        self.manager.created.notify_all();
    }
}

impl LifestyleManager for SingletonLifestyleManager {
    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance> {
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }

        let me = thread::current().id();
        let mut creator = self.creator.lock();
        loop {
            if let Some(instance) = self.instance.get() {
                return Ok(instance.clone());
            }
            match *creator {
                None => break,
                // 构造过程中用新的解析上下文回到了自己
                Some(owner) if owner == me => return Err(self.circular(context, Vec::new())),
                Some(_) => {
                    construction::wait_for(self.slot)
                        .map_err(|hops| self.circular(context, hops))?;
                    self.created.wait(&mut creator);
                    construction::stop_waiting();
                }
            }
        }
        *creator = Some(me);
        construction::begin(self.slot, self.factory.model().key());
        drop(creator);

        let _guard = CreationGuard { manager: self };
        let instance = self.factory.create(context)?;
        if self.instance.set(instance.clone()).is_err() {
            debug!("单例 {} 已被缓存", self.factory.model().key());
        }
        Ok(instance)
    }

    fn release(&self, instance: &ComponentInstance) -> bool {
        self.instance
            .get()
            .is_some_and(|cached| cached.ptr_eq(instance))
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(instance) = self.instance.get() {
            debug!("释放单例: {}", self.factory.model().key());
            destroy_quietly(self.factory.as_ref(), instance);
        }
    }

    fn requires_release(&self) -> bool {
        false
    }
}
