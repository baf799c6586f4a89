//! 内置子解析器

use kernel_abstractions::{
    ComponentModel, CreationContext, DependencyKind, DependencyModel, Kernel,
    SubDependencyResolver,
};
use microkernel_common::{ComponentInstance, HandlerState, KernelError, KernelResult};
use serde_json::Value;

/// 参数解析器
///
/// 值依赖从组件参数（注册时或配置中的 `parameters`）取值并通过 serde 转换；
/// 服务依赖的参数写成 `${componentKey}` 时，改为解析指定键的组件。
pub struct ParameterResolver;

impl ParameterResolver {
    fn service_override(value: &Value) -> Option<&str> {
        value
            .as_str()
            .and_then(|s| s.strip_prefix("${"))
            .and_then(|s| s.strip_suffix('}'))
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl SubDependencyResolver for ParameterResolver {
    fn name(&self) -> &str {
        "parameter"
    }

    fn can_resolve(
        &self,
        _kernel: &dyn Kernel,
        _context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> bool {
        let Some(value) = model.parameter(dependency.dependency_key()) else {
            return false;
        };
        match dependency.kind() {
            DependencyKind::Value => true,
            DependencyKind::Service => Self::service_override(value).is_some(),
        }
    }

    fn resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> KernelResult<ComponentInstance> {
        let dependency_key = dependency.dependency_key();
        let value = model.parameter(dependency_key).ok_or_else(|| {
            KernelError::configuration(format!("组件 {} 缺少参数 {}", model.key(), dependency_key))
        })?;

        match dependency.kind() {
            DependencyKind::Value => dependency.convert(value).map_err(|e| {
                KernelError::configuration(format!(
                    "组件 {} 的参数 {} 无法转换为 {}: {}",
                    model.key(),
                    dependency_key,
                    dependency.target(),
                    e
                ))
            }),
            DependencyKind::Service => {
                let key = Self::service_override(value).ok_or_else(|| {
                    KernelError::configuration(format!(
                        "组件 {} 的服务参数 {} 不是组件引用",
                        model.key(),
                        dependency_key
                    ))
                })?;
                kernel.resolve_key_in(key, context)
            }
        }
    }
}

/// 集合解析器：把集合依赖解析为元素服务的全部 Valid 实现（不含组件自身）
///
/// 结果以 `Vec<ComponentInstance>` 注入，构造函数通过
/// [`ResolvedDependencies::collection`](kernel_abstractions::ResolvedDependencies::collection) 读取。
pub struct CollectionResolver;

impl SubDependencyResolver for CollectionResolver {
    fn name(&self) -> &str {
        "collection"
    }

    fn can_resolve(
        &self,
        _kernel: &dyn Kernel,
        _context: &CreationContext,
        _model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> bool {
        dependency.is_collection()
    }

    fn resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> KernelResult<ComponentInstance> {
        let mut items = Vec::new();
        for handler in kernel.handlers_for_service(dependency.target()) {
            if handler.key() == model.key() || handler.state() != HandlerState::Valid {
                continue;
            }
            items.push(kernel.resolve_key_in(handler.key(), context)?);
        }
        Ok(ComponentInstance::new(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_override_syntax() {
        assert_eq!(ParameterResolver::service_override(&json!("${mail.backup}")), Some("mail.backup"));
        assert_eq!(ParameterResolver::service_override(&json!("${ }")), None);
        assert_eq!(ParameterResolver::service_override(&json!("mail")), None);
        assert_eq!(ParameterResolver::service_override(&json!(25)), None);
    }
}
