//! 默认激活器与实例工厂

use crate::kernel::KernelShared;
use kernel_abstractions::{
    ComponentActivator, ComponentModel, CreationContext, DependencyResolver, InstanceFactory,
    KernelEvent, ResolvedDependencies,
};
use microkernel_common::{BoxError, ComponentInstance, KernelError, KernelResult};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// 默认激活器：调用模型选中的构造候选
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComponentActivator;

impl ComponentActivator for DefaultComponentActivator {
    fn construct(
        &self,
        model: &ComponentModel,
        dependencies: &ResolvedDependencies,
    ) -> Result<ComponentInstance, BoxError> {
        let candidate = model
            .selected_constructor()
            .ok_or_else(|| format!("组件 {} 没有选中的构造候选", model.key()))?;
        candidate.construct(dependencies)
    }
}

/// 默认实例工厂
///
/// 依次解析模型声明的依赖，调用激活器构造，按需交给代理工厂包装，最后执行创建钩子。
pub struct DefaultInstanceFactory {
    model: Arc<ComponentModel>,
    activator: Arc<dyn ComponentActivator>,
    kernel: Weak<KernelShared>,
}

impl DefaultInstanceFactory {
    pub(crate) fn new(model: Arc<ComponentModel>, kernel: Weak<KernelShared>) -> Self {
        let activator = model
            .custom_activator()
            .cloned()
            .unwrap_or_else(|| Arc::new(DefaultComponentActivator) as Arc<dyn ComponentActivator>);
        Self {
            model,
            activator,
            kernel,
        }
    }

    fn kernel(&self) -> KernelResult<Arc<KernelShared>> {
        self.kernel.upgrade().ok_or(KernelError::KernelDisposed)
    }

    fn resolve_dependencies(
        &self,
        kernel: &KernelShared,
        context: &CreationContext,
    ) -> KernelResult<ResolvedDependencies> {
        let mut resolved = ResolvedDependencies::new(self.model.key());
        for dependency in self.model.dependencies() {
            let value = kernel
                .resolver
                .resolve(kernel, context, &self.model, dependency)?;
            resolved.push(dependency.dependency_key(), value);
        }
        Ok(resolved)
    }
}

impl InstanceFactory for DefaultInstanceFactory {
    fn model(&self) -> &Arc<ComponentModel> {
        &self.model
    }

    fn create(&self, context: &CreationContext) -> KernelResult<ComponentInstance> {
        let kernel = self.kernel()?;
        let key = self.model.key();
        let dependencies = self.resolve_dependencies(&kernel, context)?;

        let mut instance = self
            .activator
            .construct(&self.model, &dependencies)
            .map_err(|e| KernelError::handler(key, "构造实例失败", e))?;

        if !self.model.interceptors().is_empty() {
            match kernel.proxy_factory() {
                Some(proxy) => {
                    instance = proxy
                        .create(&*kernel, &self.model, instance, self.model.interceptors())
                        .map_err(|e| KernelError::handler(key, "创建代理失败", e))?;
                }
                None => warn!("组件 {} 声明了拦截器, 但内核没有代理工厂", key),
            }
        }

        for hook in self.model.on_create() {
            hook(&instance).map_err(|e| KernelError::handler(key, "创建钩子执行失败", e))?;
        }

        debug!(component = key, instance = instance.id(), "实例已创建");
        kernel.events.publish(&KernelEvent::ComponentCreated {
            key: key.to_string(),
            instance: instance.clone(),
        });
        Ok(instance)
    }

    fn destroy(&self, instance: &ComponentInstance) -> KernelResult<()> {
        let key = self.model.key();
        let mut first_error: Option<KernelError> = None;

        for hook in self.model.on_destroy() {
            if let Err(e) = hook(instance) {
                warn!("组件 {} 的销毁钩子执行失败: {}", key, e);
                first_error.get_or_insert(KernelError::handler(key, "销毁钩子执行失败", e));
            }
        }
        if let Err(e) = self.activator.destroy(&self.model, instance) {
            warn!("组件 {} 的激活器销毁失败: {}", key, e);
            first_error.get_or_insert(KernelError::handler(key, "激活器销毁失败", e));
        }

        debug!(component = key, instance = instance.id(), "实例已销毁");
        if let Some(kernel) = self.kernel.upgrade() {
            kernel.events.publish(&KernelEvent::ComponentDestroyed {
                key: key.to_string(),
                instance: instance.clone(),
            });
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for DefaultInstanceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultInstanceFactory")
            .field("component", &self.model.key())
            .field("custom_activator", &self.model.custom_activator().is_some())
            .finish()
    }
}
