//! 默认依赖解析器

use crate::sub_resolvers::{CollectionResolver, ParameterResolver};
use kernel_abstractions::{
    ComponentModel, CreationContext, DependencyKind, DependencyModel, DependencyResolver, Kernel,
    SubDependencyResolver,
};
use microkernel_common::{ComponentInstance, KernelError, KernelResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// 默认依赖解析器
///
/// 解析顺序：
///
/// 1. 调用方通过 [`Arguments`](kernel_abstractions::Arguments) 显式提供的值
/// 2. 子解析器链，按注册顺序，第一个 `can_resolve` 为 true 的胜出
/// 3. 通过内核按服务（或指定的组件键）查找
/// 4. 可选依赖的默认值
///
/// 内置子解析器 [`ParameterResolver`] 与 [`CollectionResolver`] 排在链首。
pub struct DefaultDependencyResolver {
    sub_resolvers: RwLock<Vec<Arc<dyn SubDependencyResolver>>>,
}

impl DefaultDependencyResolver {
    /// 创建带内置子解析器的解析器
    pub fn new() -> Self {
        let sub_resolvers: Vec<Arc<dyn SubDependencyResolver>> =
            vec![Arc::new(ParameterResolver), Arc::new(CollectionResolver)];
        Self {
            sub_resolvers: RwLock::new(sub_resolvers),
        }
    }

    /// 子解析器名称，按询问顺序
    pub fn sub_resolver_names(&self) -> Vec<String> {
        self.sub_resolvers
            .read()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    fn matching_sub_resolver(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> Option<Arc<dyn SubDependencyResolver>> {
        let snapshot = self.sub_resolvers.read().clone();
        snapshot
            .into_iter()
            .find(|resolver| resolver.can_resolve(kernel, context, model, dependency))
    }

    fn kernel_can_provide(kernel: &dyn Kernel, dependency: &DependencyModel) -> bool {
        if dependency.kind() != DependencyKind::Service || dependency.is_collection() {
            return false;
        }
        match dependency.component_key() {
            Some(key) => kernel.has_component(key),
            None => kernel.has_service(dependency.target()),
        }
    }

    fn resolve_from_kernel(
        kernel: &dyn Kernel,
        context: &CreationContext,
        dependency: &DependencyModel,
    ) -> KernelResult<ComponentInstance> {
        match dependency.component_key() {
            Some(key) => kernel.resolve_key_in(key, context),
            None => kernel.resolve_service_in(dependency.target(), context),
        }
    }
}

impl Default for DefaultDependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver for DefaultDependencyResolver {
    fn add_sub_resolver(&self, resolver: Arc<dyn SubDependencyResolver>) {
        debug!("添加子解析器: {}", resolver.name());
        self.sub_resolvers.write().push(resolver);
    }

    fn can_resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> bool {
        context.argument(dependency.dependency_key()).is_some()
            || self
                .matching_sub_resolver(kernel, context, model, dependency)
                .is_some()
            || Self::kernel_can_provide(kernel, dependency)
            || dependency.is_optional()
    }

    fn resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> KernelResult<Option<ComponentInstance>> {
        let dependency_key = dependency.dependency_key();

        if let Some(argument) = context.argument(dependency_key) {
            trace!(component = model.key(), dependency = dependency_key, "使用调用方参数");
            return Ok(Some(argument.clone()));
        }

        if let Some(resolver) = self.matching_sub_resolver(kernel, context, model, dependency) {
            trace!(
                component = model.key(),
                dependency = dependency_key,
                resolver = resolver.name(),
                "使用子解析器"
            );
            return resolver
                .resolve(kernel, context, model, dependency)
                .map(Some);
        }

        if Self::kernel_can_provide(kernel, dependency) {
            match Self::resolve_from_kernel(kernel, context, dependency) {
                Ok(instance) => return Ok(Some(instance)),
                Err(e @ KernelError::CircularDependency { .. }) => return Err(e),
                Err(e) if !dependency.is_optional() => return Err(e),
                Err(e) => {
                    debug!(
                        "组件 {} 的可选依赖 {} 解析失败, 使用默认值: {}",
                        model.key(),
                        dependency_key,
                        e
                    );
                }
            }
        }

        if dependency.is_optional() {
            return Ok(dependency.default_value().cloned());
        }

        Err(match dependency.kind() {
            DependencyKind::Service => KernelError::not_found(format!(
                "{} (组件 {} 的依赖 {})",
                dependency.component_key().unwrap_or(dependency.target().full_name()),
                model.key(),
                dependency_key
            )),
            DependencyKind::Value => KernelError::DependenciesUnsatisfied {
                key: model.key().to_string(),
                pending: vec![dependency_key.to_string()],
            },
        })
    }
}

impl std::fmt::Debug for DefaultDependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultDependencyResolver")
            .field("sub_resolvers", &self.sub_resolver_names())
            .finish()
    }
}
