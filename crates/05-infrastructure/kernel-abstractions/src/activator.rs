//! 组件激活器抽象接口
//!
//! 激活器是执行实际构造的外部协作者：内核负责解析依赖，激活器只拿到
//! 组件模型和解析好的依赖值。

use crate::context::CreationContext;
use crate::kernel::Kernel;
use crate::model::{ComponentModel, InterceptorReference};
use microkernel_common::{BoxError, ComponentInstance, KernelResult};
use std::any::Any;
use std::sync::Arc;

/// 组件激活器 trait
pub trait ComponentActivator: Send + Sync {
    /// 使用解析好的依赖构造实例
    fn construct(
        &self,
        model: &ComponentModel,
        dependencies: &ResolvedDependencies,
    ) -> Result<ComponentInstance, BoxError>;

    /// 销毁实例前的清理
    fn destroy(&self, _model: &ComponentModel, _instance: &ComponentInstance) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 代理工厂 trait
///
/// 当组件模型带有拦截器引用时，实例在构造后交给代理工厂包装；
/// 包装机制本身不属于内核。
pub trait ProxyFactory: Send + Sync {
    /// 用拦截器包装目标实例
    fn create(
        &self,
        kernel: &dyn Kernel,
        model: &ComponentModel,
        target: ComponentInstance,
        interceptors: &[InterceptorReference],
    ) -> Result<ComponentInstance, BoxError>;
}

/// 实例工厂 trait
///
/// 生命周期管理器需要新实例时调用：逐个解析依赖、调用激活器、应用代理和创建钩子。
pub trait InstanceFactory: Send + Sync {
    /// 对应的组件模型
    fn model(&self) -> &Arc<ComponentModel>;

    /// 创建新实例
    fn create(&self, context: &CreationContext) -> KernelResult<ComponentInstance>;

    /// 执行销毁钩子并通知激活器
    fn destroy(&self, instance: &ComponentInstance) -> KernelResult<()>;
}

/// 解析好的依赖值，按声明顺序保存
#[derive(Debug, Clone, Default)]
pub struct ResolvedDependencies {
    component_key: String,
    entries: Vec<(String, Option<ComponentInstance>)>,
}

impl ResolvedDependencies {
    /// 创建空的依赖集合
    pub fn new(component_key: impl Into<String>) -> Self {
        Self {
            component_key: component_key.into(),
            entries: Vec::new(),
        }
    }

    /// 追加一个依赖值，`None` 表示可选依赖未被满足
    pub fn push(&mut self, dependency_key: impl Into<String>, value: Option<ComponentInstance>) {
        self.entries.push((dependency_key.into(), value));
    }

    /// 追加一个依赖值（链式）
    pub fn with(mut self, dependency_key: impl Into<String>, value: ComponentInstance) -> Self {
        self.push(dependency_key, Some(value));
        self
    }

    /// 所属组件键
    pub fn component_key(&self) -> &str {
        &self.component_key
    }

    /// 获取依赖实例
    pub fn get(&self, dependency_key: &str) -> Option<&ComponentInstance> {
        self.entries
            .iter()
            .find(|(key, _)| key == dependency_key)
            .and_then(|(_, value)| value.as_ref())
    }

    /// 获取必需的依赖实例
    pub fn instance(&self, dependency_key: &str) -> Result<ComponentInstance, BoxError> {
        self.get(dependency_key).cloned().ok_or_else(|| {
            format!("组件 {} 缺少依赖: {}", self.component_key, dependency_key).into()
        })
    }

    /// 获取以 trait 对象提供的服务
    pub fn service<S: ?Sized + Send + Sync + 'static>(
        &self,
        dependency_key: &str,
    ) -> Result<Arc<S>, BoxError> {
        self.instance(dependency_key)?
            .service::<S>()
            .ok_or_else(|| self.type_mismatch(dependency_key, std::any::type_name::<S>()))
    }

    /// 获取可选的服务
    pub fn optional_service<S: ?Sized + Send + Sync + 'static>(&self, dependency_key: &str) -> Option<Arc<S>> {
        self.get(dependency_key).and_then(ComponentInstance::service::<S>)
    }

    /// 获取具体类型的组件
    pub fn component<T: Any + Send + Sync>(&self, dependency_key: &str) -> Result<Arc<T>, BoxError> {
        self.instance(dependency_key)?
            .downcast::<T>()
            .ok_or_else(|| self.type_mismatch(dependency_key, std::any::type_name::<T>()))
    }

    /// 获取值依赖的副本
    pub fn value<T: Any + Send + Sync + Clone>(&self, dependency_key: &str) -> Result<T, BoxError> {
        self.component::<T>(dependency_key).map(|value| (*value).clone())
    }

    /// 获取集合依赖中的全部服务
    pub fn collection<S: ?Sized + Send + Sync + 'static>(
        &self,
        dependency_key: &str,
    ) -> Result<Vec<Arc<S>>, BoxError> {
        let items = self.component::<Vec<ComponentInstance>>(dependency_key)?;
        items
            .iter()
            .map(|item| {
                item.service::<S>()
                    .ok_or_else(|| self.type_mismatch(dependency_key, std::any::type_name::<S>()))
            })
            .collect()
    }

    /// 依赖数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按声明顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ComponentInstance>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    fn type_mismatch(&self, dependency_key: &str, expected: &str) -> BoxError {
        format!(
            "组件 {} 的依赖 {} 类型不匹配, 期望 {}",
            self.component_key, dependency_key, expected
        )
        .into()
    }
}
