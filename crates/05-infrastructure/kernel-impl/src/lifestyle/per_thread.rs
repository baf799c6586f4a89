use super::destroy_quietly;
use dashmap::DashMap;
use kernel_abstractions::{CreationContext, InstanceFactory, LifestyleManager};
use microkernel_common::{ComponentInstance, KernelResult};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// 线程生命周期：每个调用线程一个实例
///
/// 线程退出时不会自动清理它的实例，实例保留到处理器销毁。
pub struct PerThreadLifestyleManager {
    factory: Arc<dyn InstanceFactory>,
    instances: DashMap<ThreadId, ComponentInstance>,
}

impl PerThreadLifestyleManager {
    /// 创建管理器
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            factory,
            instances: DashMap::new(),
        }
    }

    /// 当前持有实例的线程数
    pub fn thread_count(&self) -> usize {
        self.instances.len()
    }
}

impl LifestyleManager for PerThreadLifestyleManager {
    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance> {
        let thread = thread::current().id();
        if let Some(existing) = self.instances.get(&thread) {
            return Ok(existing.clone());
        }

        // 构造期间不持有分片锁，构造可能递归解析其他线程组件
        let created = self.factory.create(context)?;
        Ok(self.instances.entry(thread).or_insert(created).clone())
    }

    fn release(&self, instance: &ComponentInstance) -> bool {
        self.instances
            .iter()
            .any(|entry| entry.value().ptr_eq(instance))
    }

    fn dispose(&self) {
        let threads: Vec<ThreadId> = self.instances.iter().map(|entry| *entry.key()).collect();
        for thread in threads {
            if let Some((_, instance)) = self.instances.remove(&thread) {
                destroy_quietly(self.factory.as_ref(), &instance);
            }
        }
    }

    fn requires_release(&self) -> bool {
        false
    }
}
