//! 组件模型
//!
//! [`ComponentModelDraft`] 是模型构建管道中可变的草稿，贡献者依次读取或追加内容；
//! 管道完成后草稿被冻结为不可变的 [`ComponentModel`]，此后不再变化。

use crate::activator::{ComponentActivator, ResolvedDependencies};
use microkernel_common::{
    BoxError, ComponentInstance, ConfigNode, KernelError, KernelResult, Lifestyle, TypeInfo,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 依赖种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// 由其他组件提供的服务
    Service,
    /// 普通值（参数、配置项）
    Value,
}

/// 将配置值转换为依赖实例的函数
pub type ValueConverter =
    Arc<dyn Fn(&Value) -> Result<ComponentInstance, BoxError> + Send + Sync>;

/// 依赖模型
#[derive(Clone)]
pub struct DependencyModel {
    dependency_key: String,
    target: TypeInfo,
    kind: DependencyKind,
    optional: bool,
    collection: bool,
    component_key: Option<String>,
    default_value: Option<ComponentInstance>,
    converter: Option<ValueConverter>,
}

impl DependencyModel {
    /// 服务依赖
    pub fn service(dependency_key: impl Into<String>, target: TypeInfo) -> Self {
        Self {
            dependency_key: dependency_key.into(),
            target,
            kind: DependencyKind::Service,
            optional: false,
            collection: false,
            component_key: None,
            default_value: None,
            converter: None,
        }
    }

    /// 集合依赖：解析为 `element` 服务的全部已注册实现
    pub fn service_collection(dependency_key: impl Into<String>, element: TypeInfo) -> Self {
        Self {
            collection: true,
            ..Self::service(dependency_key, element)
        }
    }

    /// 值依赖，配置中的值通过 serde 转换为 `T`
    pub fn value<T>(dependency_key: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let converter: ValueConverter = Arc::new(|value: &Value| {
            let typed: T = serde_json::from_value(value.clone())?;
            Ok(ComponentInstance::new(typed))
        });
        Self {
            dependency_key: dependency_key.into(),
            target: TypeInfo::of::<T>(),
            kind: DependencyKind::Value,
            optional: false,
            collection: false,
            component_key: None,
            default_value: None,
            converter: Some(converter),
        }
    }

    /// 标记为可选
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// 设置默认值；默认值只对可选依赖生效，因此同时标记为可选
    pub fn with_default<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.default_value = Some(ComponentInstance::new(value));
        self.optional = true;
        self
    }

    /// 指定提供该服务的组件键
    pub fn with_component_key(mut self, key: impl Into<String>) -> Self {
        self.component_key = Some(key.into());
        self
    }

    /// 依赖键（构造参数名）
    pub fn dependency_key(&self) -> &str {
        &self.dependency_key
    }

    /// 目标类型
    pub fn target(&self) -> &TypeInfo {
        &self.target
    }

    /// 依赖种类
    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    /// 是否可选
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// 是否为集合依赖
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// 指定的组件键
    pub fn component_key(&self) -> Option<&str> {
        self.component_key.as_deref()
    }

    /// 默认值
    pub fn default_value(&self) -> Option<&ComponentInstance> {
        self.default_value.as_ref()
    }

    /// 是否为注册期就必须可满足的服务依赖
    pub fn is_required_service(&self) -> bool {
        self.kind == DependencyKind::Service && !self.optional && !self.collection
    }

    /// 将配置值转换为依赖实例
    pub fn convert(&self, value: &Value) -> Result<ComponentInstance, BoxError> {
        match &self.converter {
            Some(converter) => converter(value),
            None => Ok(ComponentInstance::new(value.clone())),
        }
    }
}

impl fmt::Debug for DependencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyModel")
            .field("dependency_key", &self.dependency_key)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("optional", &self.optional)
            .field("collection", &self.collection)
            .field("component_key", &self.component_key)
            .field("has_default", &self.default_value.is_some())
            .finish()
    }
}

/// 构造函数
pub type ConstructorFn =
    Arc<dyn Fn(&ResolvedDependencies) -> Result<ComponentInstance, BoxError> + Send + Sync>;

/// 构造候选：有序的依赖列表加上构造函数
#[derive(Clone)]
pub struct ConstructorCandidate {
    dependencies: Vec<DependencyModel>,
    constructor: ConstructorFn,
}

impl ConstructorCandidate {
    /// 创建构造候选
    pub fn new<F>(dependencies: Vec<DependencyModel>, constructor: F) -> Self
    where
        F: Fn(&ResolvedDependencies) -> Result<ComponentInstance, BoxError> + Send + Sync + 'static,
    {
        Self {
            dependencies,
            constructor: Arc::new(constructor),
        }
    }

    /// 依赖列表
    pub fn dependencies(&self) -> &[DependencyModel] {
        &self.dependencies
    }

    /// 必需服务依赖数量
    pub fn required_service_count(&self) -> usize {
        self.dependencies
            .iter()
            .filter(|d| d.is_required_service())
            .count()
    }

    /// 调用构造函数
    pub fn construct(&self, dependencies: &ResolvedDependencies) -> Result<ComponentInstance, BoxError> {
        (self.constructor)(dependencies)
    }
}

impl fmt::Debug for ConstructorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorCandidate")
            .field("dependencies", &self.dependencies)
            .field("constructor", &"<function>")
            .finish()
    }
}

/// 生命周期钩子：创建后（commission）或销毁前（decommission）执行
pub type LifecycleHook = Arc<dyn Fn(&ComponentInstance) -> Result<(), BoxError> + Send + Sync>;

/// 拦截器引用，内核只原样传递给代理工厂
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterceptorReference(String);

impl InterceptorReference {
    /// 引用指定键的拦截器组件
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 拦截器组件键
    pub fn key(&self) -> &str {
        &self.0
    }
}

/// 组件模型草稿
///
/// 仅在模型构建管道内部可变。
#[derive(Clone)]
pub struct ComponentModelDraft {
    /// 组件键
    pub key: String,
    /// 服务类型
    pub service: TypeInfo,
    /// 实现类型
    pub implementation: TypeInfo,
    /// 生命周期，`None` 表示尚未确定
    pub lifestyle: Option<Lifestyle>,
    /// 构造候选
    pub constructors: Vec<ConstructorCandidate>,
    /// 选中的构造候选下标
    pub selected_constructor: Option<usize>,
    /// 选中构造候选的依赖
    pub dependencies: Vec<DependencyModel>,
    /// 拦截器引用
    pub interceptors: Vec<InterceptorReference>,
    /// 扩展属性
    pub extended_properties: HashMap<String, Value>,
    /// 来自配置存储的组件配置
    pub configuration: Option<ConfigNode>,
    /// 参数（依赖键 → 值）
    pub parameters: HashMap<String, Value>,
    /// 自定义激活器
    pub custom_activator: Option<Arc<dyn ComponentActivator>>,
    /// 创建钩子
    pub on_create: Vec<LifecycleHook>,
    /// 销毁钩子
    pub on_destroy: Vec<LifecycleHook>,
    /// 是否在依赖满足后自动启动
    pub startable: bool,
}

impl ComponentModelDraft {
    /// 创建草稿
    pub fn new(key: impl Into<String>, service: TypeInfo, implementation: TypeInfo) -> Self {
        Self {
            key: key.into(),
            service,
            implementation,
            lifestyle: None,
            constructors: Vec::new(),
            selected_constructor: None,
            dependencies: Vec::new(),
            interceptors: Vec::new(),
            extended_properties: HashMap::new(),
            configuration: None,
            parameters: HashMap::new(),
            custom_activator: None,
            on_create: Vec::new(),
            on_destroy: Vec::new(),
            startable: false,
        }
    }

    /// 冻结为不可变模型
    pub fn freeze(self) -> KernelResult<ComponentModel> {
        let lifestyle = self.lifestyle.ok_or_else(|| {
            KernelError::registration(&self.key, "模型构建完成后仍未确定生命周期")
        })?;

        if self.custom_activator.is_none() {
            match self.selected_constructor {
                Some(index) if index < self.constructors.len() => {}
                _ => {
                    return Err(KernelError::registration(
                        &self.key,
                        "没有可用的构造候选，也没有自定义激活器",
                    ))
                }
            }
        }

        Ok(ComponentModel {
            key: self.key,
            service: self.service,
            implementation: self.implementation,
            lifestyle,
            constructors: self.constructors,
            selected_constructor: self.selected_constructor,
            dependencies: self.dependencies,
            interceptors: self.interceptors,
            extended_properties: self.extended_properties,
            configuration: self.configuration,
            parameters: self.parameters,
            custom_activator: self.custom_activator,
            on_create: self.on_create,
            on_destroy: self.on_destroy,
            startable: self.startable,
        })
    }
}

impl fmt::Debug for ComponentModelDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentModelDraft")
            .field("key", &self.key)
            .field("service", &self.service)
            .field("implementation", &self.implementation)
            .field("lifestyle", &self.lifestyle)
            .field("constructors", &self.constructors.len())
            .field("selected_constructor", &self.selected_constructor)
            .finish_non_exhaustive()
    }
}

/// 组件模型
///
/// 注册时创建一次，之后不可变。
pub struct ComponentModel {
    key: String,
    service: TypeInfo,
    implementation: TypeInfo,
    lifestyle: Lifestyle,
    constructors: Vec<ConstructorCandidate>,
    selected_constructor: Option<usize>,
    dependencies: Vec<DependencyModel>,
    interceptors: Vec<InterceptorReference>,
    extended_properties: HashMap<String, Value>,
    configuration: Option<ConfigNode>,
    parameters: HashMap<String, Value>,
    custom_activator: Option<Arc<dyn ComponentActivator>>,
    on_create: Vec<LifecycleHook>,
    on_destroy: Vec<LifecycleHook>,
    startable: bool,
}

impl ComponentModel {
    /// 组件键
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 服务类型
    pub fn service(&self) -> &TypeInfo {
        &self.service
    }

    /// 实现类型
    pub fn implementation(&self) -> &TypeInfo {
        &self.implementation
    }

    /// 生命周期
    pub fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }

    /// 全部构造候选
    pub fn constructors(&self) -> &[ConstructorCandidate] {
        &self.constructors
    }

    /// 选中的构造候选
    pub fn selected_constructor(&self) -> Option<&ConstructorCandidate> {
        self.selected_constructor.and_then(|i| self.constructors.get(i))
    }

    /// 选中构造候选的依赖
    pub fn dependencies(&self) -> &[DependencyModel] {
        &self.dependencies
    }

    /// 拦截器引用
    pub fn interceptors(&self) -> &[InterceptorReference] {
        &self.interceptors
    }

    /// 扩展属性
    pub fn extended_properties(&self) -> &HashMap<String, Value> {
        &self.extended_properties
    }

    /// 获取扩展属性
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.extended_properties.get(name)
    }

    /// 组件配置
    pub fn configuration(&self) -> Option<&ConfigNode> {
        self.configuration.as_ref()
    }

    /// 获取参数
    pub fn parameter(&self, dependency_key: &str) -> Option<&Value> {
        self.parameters.get(dependency_key)
    }

    /// 自定义激活器
    pub fn custom_activator(&self) -> Option<&Arc<dyn ComponentActivator>> {
        self.custom_activator.as_ref()
    }

    /// 创建钩子
    pub fn on_create(&self) -> &[LifecycleHook] {
        &self.on_create
    }

    /// 销毁钩子
    pub fn on_destroy(&self) -> &[LifecycleHook] {
        &self.on_destroy
    }

    /// 实例是否有需要在释放时执行的清理逻辑
    pub fn has_teardown(&self) -> bool {
        !self.on_destroy.is_empty() || self.custom_activator.is_some()
    }

    /// 是否在依赖满足后自动启动
    pub fn is_startable(&self) -> bool {
        self.startable
    }

    /// 注册期必须可满足的服务依赖
    pub fn required_services(&self) -> impl Iterator<Item = &DependencyModel> {
        self.dependencies.iter().filter(|d| d.is_required_service())
    }
}

impl fmt::Debug for ComponentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentModel")
            .field("key", &self.key)
            .field("service", &self.service)
            .field("implementation", &self.implementation)
            .field("lifestyle", &self.lifestyle)
            .field("dependencies", &self.dependencies)
            .field("interceptors", &self.interceptors)
            .field("startable", &self.startable)
            .finish_non_exhaustive()
    }
}
