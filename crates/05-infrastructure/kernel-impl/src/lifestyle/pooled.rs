use super::destroy_quietly;
use kernel_abstractions::{CreationContext, InstanceFactory, LifestyleManager};
use microkernel_common::{ComponentInstance, InstanceId, KernelError, KernelResult};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Default)]
struct PoolState {
    available: Vec<ComponentInstance>,
    in_use: HashMap<InstanceId, ComponentInstance>,
    /// 已创建或正在创建的实例数，不超过上限
    created: usize,
    warmed: bool,
    disposed: bool,
}

/// 池化生命周期
///
/// 首次解析时预热 `initial_size` 个实例。池中无空闲实例且已达到 `max_size` 时，
/// 调用方最多阻塞 `wait_timeout` 等待归还，超时返回 [`KernelError::PoolExhausted`]。
/// 构造实例时不持有池锁。
pub struct PooledLifestyleManager {
    factory: Arc<dyn InstanceFactory>,
    initial_size: usize,
    max_size: usize,
    wait_timeout: Duration,
    state: Mutex<PoolState>,
    returned: Condvar,
}

impl PooledLifestyleManager {
    /// 创建管理器
    pub fn new(
        factory: Arc<dyn InstanceFactory>,
        initial_size: usize,
        max_size: usize,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            factory,
            initial_size: initial_size.min(max_size),
            max_size,
            wait_timeout,
            state: Mutex::new(PoolState::default()),
            returned: Condvar::new(),
        }
    }

    /// 空闲实例数
    pub fn available(&self) -> usize {
        self.state.lock().available.len()
    }

    /// 借出实例数
    pub fn in_use(&self) -> usize {
        self.state.lock().in_use.len()
    }

    fn key(&self) -> &str {
        self.factory.model().key()
    }

    fn warm_up(
        &self,
        state: &mut MutexGuard<'_, PoolState>,
        context: &CreationContext,
    ) -> KernelResult<()> {
        state.warmed = true;
        while state.created < self.initial_size {
            state.created += 1;
            match MutexGuard::unlocked(state, || self.factory.create(context)) {
                Ok(instance) => state.available.push(instance),
                Err(e) => {
                    state.created -= 1;
                    self.returned.notify_one();
                    return Err(e);
                }
            }
        }
        debug!("对象池 {} 预热完成: {} 个实例", self.key(), state.available.len());
        Ok(())
    }

    fn checkout(state: &mut PoolState, instance: ComponentInstance) -> ComponentInstance {
        state.in_use.insert(instance.id(), instance.clone());
        instance
    }
}

impl LifestyleManager for PooledLifestyleManager {
    fn resolve(&self, context: &CreationContext) -> KernelResult<ComponentInstance> {
        let started = Instant::now();
        let deadline = started + self.wait_timeout;
        let mut state = self.state.lock();

        if !state.warmed {
            self.warm_up(&mut state, context)?;
        }

        loop {
            if state.disposed {
                return Err(KernelError::HandlerInvalid {
                    key: self.key().to_string(),
                });
            }

            if let Some(instance) = state.available.pop() {
                return Ok(Self::checkout(&mut state, instance));
            }

            if state.created < self.max_size {
                state.created += 1;
                return match MutexGuard::unlocked(&mut state, || self.factory.create(context)) {
                    Ok(instance) => Ok(Self::checkout(&mut state, instance)),
                    Err(e) => {
                        state.created -= 1;
                        self.returned.notify_one();
                        Err(e)
                    }
                };
            }

            if self.returned.wait_until(&mut state, deadline).timed_out()
                && state.available.is_empty()
                && state.created >= self.max_size
            {
                let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!("对象池 {} 已耗尽, 等待 {}ms 后放弃", self.key(), waited_ms);
                return Err(KernelError::PoolExhausted {
                    key: self.key().to_string(),
                    max_size: self.max_size,
                    waited_ms,
                });
            }
        }
    }

    fn release(&self, instance: &ComponentInstance) -> bool {
        let mut state = self.state.lock();
        let Some(returned) = state.in_use.remove(&instance.id()) else {
            return false;
        };
        state.available.push(returned);
        drop(state);
        self.returned.notify_one();
        true
    }

    fn dispose(&self) {
        let instances: Vec<ComponentInstance> = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            let mut all: Vec<ComponentInstance> = state.available.drain(..).collect();
            all.extend(state.in_use.drain().map(|(_, instance)| instance));
            all
        };
        self.returned.notify_all();

        debug!("销毁对象池 {}: {} 个实例", self.key(), instances.len());
        for instance in &instances {
            destroy_quietly(self.factory.as_ref(), instance);
        }
    }
}
