//! 组件注册描述
//!
//! ```ignore
//! kernel.register_component(
//!     ComponentRegistration::for_service(TypeInfo::contract::<dyn MailService>())
//!         .implemented_by(TypeInfo::of::<SmtpMailService>())
//!         .named("mail")
//!         .lifestyle(Lifestyle::Singleton)
//!         .constructor(vec![], |_| Ok(ComponentInstance::from_service::<dyn MailService>(Arc::new(SmtpMailService::default())))),
//! )?;
//! ```

use crate::activator::{ComponentActivator, ResolvedDependencies};
use crate::model::{
    ComponentModelDraft, ConstructorCandidate, DependencyModel, InterceptorReference, LifecycleHook,
};
use microkernel_common::{BoxError, ComponentInstance, Lifestyle, TypeInfo};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 组件注册描述（链式构建）
#[derive(Clone)]
pub struct ComponentRegistration {
    service: TypeInfo,
    implementation: Option<TypeInfo>,
    key: Option<String>,
    lifestyle: Option<Lifestyle>,
    constructors: Vec<ConstructorCandidate>,
    activator: Option<Arc<dyn ComponentActivator>>,
    on_create: Vec<LifecycleHook>,
    on_destroy: Vec<LifecycleHook>,
    interceptors: Vec<InterceptorReference>,
    properties: HashMap<String, Value>,
    parameters: HashMap<String, Value>,
    startable: bool,
}

impl ComponentRegistration {
    /// 为服务开始一次注册
    pub fn for_service(service: TypeInfo) -> Self {
        Self {
            service,
            implementation: None,
            key: None,
            lifestyle: None,
            constructors: Vec::new(),
            activator: None,
            on_create: Vec::new(),
            on_destroy: Vec::new(),
            interceptors: Vec::new(),
            properties: HashMap::new(),
            parameters: HashMap::new(),
            startable: false,
        }
    }

    /// 服务和实现是同一个具体类型
    pub fn component<T: 'static>() -> Self {
        let info = TypeInfo::of::<T>();
        Self::for_service(info.clone()).implemented_by(info)
    }

    /// 设置实现类型，未设置时与服务类型相同
    pub fn implemented_by(mut self, implementation: TypeInfo) -> Self {
        self.implementation = Some(implementation);
        self
    }

    /// 设置组件键，未设置时使用实现类型全名
    pub fn named(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// 设置生命周期，未设置时由配置或内核默认值决定
    pub fn lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = Some(lifestyle);
        self
    }

    /// 追加构造候选
    pub fn constructor<F>(mut self, dependencies: Vec<DependencyModel>, constructor: F) -> Self
    where
        F: Fn(&ResolvedDependencies) -> Result<ComponentInstance, BoxError> + Send + Sync + 'static,
    {
        self.constructors
            .push(ConstructorCandidate::new(dependencies, constructor));
        self
    }

    /// 使用自定义激活器
    pub fn activator(mut self, activator: Arc<dyn ComponentActivator>) -> Self {
        self.activator = Some(activator);
        self
    }

    /// 实例创建后执行
    pub fn on_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ComponentInstance) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_create.push(Arc::new(hook));
        self
    }

    /// 实例销毁前执行
    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ComponentInstance) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_destroy.push(Arc::new(hook));
        self
    }

    /// 追加拦截器引用
    pub fn interceptor(mut self, key: impl Into<String>) -> Self {
        self.interceptors.push(InterceptorReference::new(key));
        self
    }

    /// 设置扩展属性
    pub fn property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// 设置参数（依赖键 → 值）
    pub fn parameter(mut self, dependency_key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(dependency_key.into(), value);
        self
    }

    /// 依赖满足后自动解析
    pub fn startable(mut self) -> Self {
        self.startable = true;
        self
    }

    /// 最终使用的组件键
    pub fn key(&self) -> String {
        self.key.clone().unwrap_or_else(|| {
            self.implementation
                .as_ref()
                .unwrap_or(&self.service)
                .full_name()
                .to_string()
        })
    }

    /// 转换为模型草稿，交给模型构建管道
    pub fn into_draft(self) -> ComponentModelDraft {
        let key = self.key();
        let implementation = self.implementation.unwrap_or_else(|| self.service.clone());
        let mut draft = ComponentModelDraft::new(key, self.service, implementation);
        draft.lifestyle = self.lifestyle;
        draft.constructors = self.constructors;
        draft.custom_activator = self.activator;
        draft.on_create = self.on_create;
        draft.on_destroy = self.on_destroy;
        draft.interceptors = self.interceptors;
        draft.extended_properties = self.properties;
        draft.parameters = self.parameters;
        draft.startable = self.startable;
        draft
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("key", &self.key())
            .field("service", &self.service)
            .field("implementation", &self.implementation)
            .field("lifestyle", &self.lifestyle)
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}
