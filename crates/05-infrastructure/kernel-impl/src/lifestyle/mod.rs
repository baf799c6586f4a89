//! 生命周期管理器
//!
//! | 生命周期 | 缓存策略 | 释放 |
//! |---|---|---|
//! | Transient | 不缓存 | 执行销毁钩子 |
//! | Singleton | 处理器内唯一 | 无操作，随处理器销毁 |
//! | PerThread | 每线程一个 | 无操作，随处理器销毁 |
//! | Pooled | 有上限的实例池 | 归还到池中 |
//! | Custom | 由工厂决定 | 由工厂决定 |

mod construction;
mod per_thread;
mod pooled;
mod singleton;
mod transient;

pub use per_thread::PerThreadLifestyleManager;
pub use pooled::PooledLifestyleManager;
pub use singleton::SingletonLifestyleManager;
pub use transient::TransientLifestyleManager;

use kernel_abstractions::{InstanceFactory, Kernel, LifestyleManager};
use microkernel_common::{ComponentInstance, KernelError, KernelResult, Lifestyle};
use std::sync::Arc;
use tracing::warn;

/// 为处理器创建生命周期管理器，每个处理器只调用一次
pub fn create_lifestyle_manager(
    kernel: &dyn Kernel,
    factory: Arc<dyn InstanceFactory>,
) -> KernelResult<Box<dyn LifestyleManager>> {
    let manager: Box<dyn LifestyleManager> = match factory.model().lifestyle().clone() {
        Lifestyle::Transient => Box::new(TransientLifestyleManager::new(factory)),
        Lifestyle::Singleton => Box::new(SingletonLifestyleManager::new(factory)),
        Lifestyle::PerThread => Box::new(PerThreadLifestyleManager::new(factory)),
        Lifestyle::Pooled {
            initial_size,
            max_size,
        } => {
            let settings = kernel.settings();
            Box::new(PooledLifestyleManager::new(
                factory,
                initial_size.unwrap_or(settings.default_pool_initial_size),
                max_size.unwrap_or(settings.default_pool_max_size),
                settings.pool_wait_timeout(),
            ))
        }
        Lifestyle::Custom(name) => {
            let custom = kernel.custom_lifestyle(&name).ok_or_else(|| {
                KernelError::configuration(format!("未注册的自定义生命周期: {name}"))
            })?;
            custom(factory)
        }
    };
    Ok(manager)
}

/// 销毁实例，失败只记录日志
fn destroy_quietly(factory: &dyn InstanceFactory, instance: &ComponentInstance) {
    if let Err(e) = factory.destroy(instance) {
        warn!("销毁组件 {} 的实例失败: {}", factory.model().key(), e);
    }
}
