//! 默认内核

use crate::activator::DefaultInstanceFactory;
use crate::configuration::DefaultConfigurationStore;
use crate::events::EventBus;
use crate::facility::Facility;
use crate::handler::DefaultHandler;
use crate::lifestyle::create_lifestyle_manager;
use crate::model_builder::DefaultComponentModelBuilder;
use crate::resolver::DefaultDependencyResolver;
use crate::tracking::InstanceTracker;
use dashmap::DashMap;
use kernel_abstractions::{
    Arguments, ComponentRegistration, ConfigurationStore, CreationContext, CustomLifestyleFactory,
    DependencyResolver, Handler, HandlerInfo, InstanceFactory, Kernel, KernelEvent,
    LifestyleManager, ModelContributor, ProxyFactory, SubDependencyResolver, SubscriptionHandle,
};
use microkernel_common::{
    ComponentInstance, HandlerState, KernelConfig, KernelError, KernelResult, TypeInfo,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Default)]
struct Registry {
    handlers: HashMap<String, Arc<DefaultHandler>>,
    /// 注册顺序
    order: Vec<String>,
    by_service: HashMap<TypeInfo, Vec<Arc<DefaultHandler>>>,
}

impl Registry {
    fn insert(&mut self, handler: Arc<DefaultHandler>) {
        let key = handler.key().to_string();
        self.by_service
            .entry(handler.service().clone())
            .or_default()
            .push(handler.clone());
        self.order.push(key.clone());
        self.handlers.insert(key, handler);
    }

    fn remove(&mut self, key: &str) -> Option<Arc<DefaultHandler>> {
        let handler = self.handlers.remove(key)?;
        self.order.retain(|existing| existing != key);
        if let Some(providers) = self.by_service.get_mut(handler.service()) {
            providers.retain(|provider| !Arc::ptr_eq(provider, &handler));
            if providers.is_empty() {
                self.by_service.remove(handler.service());
            }
        }
        Some(handler)
    }

    fn in_order(&self) -> Vec<Arc<DefaultHandler>> {
        self.order
            .iter()
            .filter_map(|key| self.handlers.get(key).cloned())
            .collect()
    }
}

struct ParentLink {
    kernel: Weak<KernelShared>,
    /// 把父内核的注册事件转发给本内核，丢弃时自动取消
    _forwarding: SubscriptionHandle,
}

pub(crate) struct KernelShared {
    id: Uuid,
    settings: KernelConfig,
    registry: RwLock<Registry>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) resolver: DefaultDependencyResolver,
    builder: DefaultComponentModelBuilder,
    store: RwLock<Arc<dyn ConfigurationStore>>,
    custom_lifestyles: DashMap<String, CustomLifestyleFactory>,
    proxy_factory: RwLock<Option<Arc<dyn ProxyFactory>>>,
    /// 需要释放的实例 -> 产出它的处理器
    tracked: InstanceTracker<Weak<dyn Handler>>,
    parent: RwLock<Option<ParentLink>>,
    facilities: Mutex<Vec<(String, Arc<dyn Facility>)>>,
    disposed: AtomicBool,
}

impl KernelShared {
    fn new(settings: KernelConfig) -> Self {
        let store: Arc<dyn ConfigurationStore> = Arc::new(DefaultConfigurationStore::new());
        Self {
            id: Uuid::new_v4(),
            settings,
            registry: RwLock::new(Registry::default()),
            events: Arc::new(EventBus::new()),
            resolver: DefaultDependencyResolver::new(),
            builder: DefaultComponentModelBuilder::new(),
            store: RwLock::new(store),
            custom_lifestyles: DashMap::new(),
            proxy_factory: RwLock::new(None),
            tracked: InstanceTracker::new(),
            parent: RwLock::new(None),
            facilities: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn proxy_factory(&self) -> Option<Arc<dyn ProxyFactory>> {
        self.proxy_factory.read().clone()
    }

    fn parent(&self) -> Option<Arc<KernelShared>> {
        self.parent
            .read()
            .as_ref()
            .and_then(|link| link.kernel.upgrade())
    }

    /// 从 `start` 沿父链向上是否会回到本内核；父链本身成环时同样返回 true
    fn is_ancestor_of(&self, start: &Arc<KernelShared>) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(start.clone());
        while let Some(kernel) = current {
            if std::ptr::eq(kernel.as_ref(), self) || !visited.insert(kernel.id) {
                return true;
            }
            current = kernel.parent();
        }
        false
    }

    fn ensure_active(&self) -> KernelResult<()> {
        if self.disposed.load(Ordering::Acquire) {
            Err(KernelError::KernelDisposed)
        } else {
            Ok(())
        }
    }

    fn local_handler(&self, key: &str) -> Option<Arc<DefaultHandler>> {
        self.registry.read().handlers.get(key).cloned()
    }

    fn local_providers(&self, service: &TypeInfo) -> Vec<Arc<DefaultHandler>> {
        self.registry
            .read()
            .by_service
            .get(service)
            .cloned()
            .unwrap_or_default()
    }

    fn resolve_with(
        &self,
        handler: Arc<dyn Handler>,
        context: &CreationContext,
    ) -> KernelResult<ComponentInstance> {
        self.ensure_active()?;
        let instance = handler.resolve(context)?;
        if handler.requires_release_tracking() {
            self.tracked.insert(&instance, Arc::downgrade(&handler));
        }
        Ok(instance)
    }

    fn release(&self, instance: &ComponentInstance) -> bool {
        let Some(owner) = self.tracked.take(instance) else {
            if let Some(parent) = self.parent() {
                return parent.release(instance);
            }
            debug!(kernel = %self.id, instance = instance.id(), "释放未追踪的实例, 忽略");
            return false;
        };

        match owner.upgrade() {
            Some(handler) => {
                let owned = handler.release(instance);
                if !owned {
                    debug!("组件 {} 不拥有该实例, 忽略释放", handler.key());
                }
                owned
            }
            None => false,
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let handlers = {
            let mut registry = self.registry.write();
            let handlers = registry.in_order();
            *registry = Registry::default();
            handlers
        };

        // 逆注册顺序：后注册的组件可能依赖先注册的组件
        for handler in handlers.iter().rev() {
            handler.dispose();
        }

        let facilities = std::mem::take(&mut *self.facilities.lock());
        for (key, facility) in facilities.iter().rev() {
            debug!("终止扩展设施: {}", key);
            facility.terminate();
        }

        self.tracked.clear();
        self.parent.write().take();
        info!(kernel = %self.id, handlers = handlers.len(), "内核已销毁");
    }
}

impl Kernel for KernelShared {
    fn settings(&self) -> &KernelConfig {
        &self.settings
    }

    fn has_component(&self, key: &str) -> bool {
        self.registry.read().handlers.contains_key(key)
            || self.parent().is_some_and(|parent| parent.has_component(key))
    }

    fn has_service(&self, service: &TypeInfo) -> bool {
        self.registry.read().by_service.contains_key(service)
            || self.parent().is_some_and(|parent| parent.has_service(service))
    }

    fn handler(&self, key: &str) -> Option<Arc<dyn Handler>> {
        match self.local_handler(key) {
            Some(handler) => Some(handler as Arc<dyn Handler>),
            None => self.parent().and_then(|parent| parent.handler(key)),
        }
    }

    fn handler_for_service(&self, service: &TypeInfo) -> Option<Arc<dyn Handler>> {
        let local = self.local_providers(service);
        if let Some(valid) = local.iter().find(|h| h.state() == HandlerState::Valid) {
            return Some(valid.clone() as Arc<dyn Handler>);
        }

        let inherited = self
            .parent()
            .and_then(|parent| parent.handler_for_service(service));
        if let Some(handler) = inherited.as_ref() {
            if handler.state() == HandlerState::Valid {
                return inherited;
            }
        }

        match local.into_iter().next() {
            Some(handler) => Some(handler as Arc<dyn Handler>),
            None => inherited,
        }
    }

    fn handlers_for_service(&self, service: &TypeInfo) -> Vec<Arc<dyn Handler>> {
        let mut handlers: Vec<Arc<dyn Handler>> = self
            .local_providers(service)
            .into_iter()
            .map(|h| h as Arc<dyn Handler>)
            .collect();
        if let Some(parent) = self.parent() {
            handlers.extend(parent.handlers_for_service(service));
        }
        handlers
    }

    fn resolve_key_in(&self, key: &str, context: &CreationContext) -> KernelResult<ComponentInstance> {
        let handler = self
            .handler(key)
            .ok_or_else(|| KernelError::not_found(key))?;
        self.resolve_with(handler, context)
    }

    fn resolve_service_in(
        &self,
        service: &TypeInfo,
        context: &CreationContext,
    ) -> KernelResult<ComponentInstance> {
        let handler = self
            .handler_for_service(service)
            .ok_or_else(|| KernelError::not_found(service.full_name()))?;
        self.resolve_with(handler, context)
    }

    fn resolve_all_in(
        &self,
        service: &TypeInfo,
        context: &CreationContext,
    ) -> KernelResult<Vec<ComponentInstance>> {
        self.handlers_for_service(service)
            .into_iter()
            .filter(|handler| handler.state() == HandlerState::Valid)
            .map(|handler| self.resolve_with(handler, context))
            .collect()
    }

    fn configuration_store(&self) -> Arc<dyn ConfigurationStore> {
        self.store.read().clone()
    }

    fn custom_lifestyle(&self, name: &str) -> Option<CustomLifestyleFactory> {
        match self.custom_lifestyles.get(name) {
            Some(entry) => Some(entry.value().clone()),
            None => self.parent().and_then(|parent| parent.custom_lifestyle(name)),
        }
    }
}

impl Drop for KernelShared {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// 默认内核
///
/// 克隆得到的是同一个内核的另一个句柄。内核由嵌入方显式创建、显式销毁，
/// 最后一个句柄被丢弃时也会执行销毁。
///
/// # 示例
///
/// ```ignore
/// let kernel = DefaultKernel::new();
/// kernel.register_component(
///     ComponentRegistration::for_service(TypeInfo::contract::<dyn MailService>())
///         .implemented_by(TypeInfo::of::<SmtpMailService>())
///         .named("mail")
///         .constructor(vec![], |_| Ok(ComponentInstance::from_service::<dyn MailService>(Arc::new(SmtpMailService)))),
/// )?;
/// let mail = kernel.resolve("mail")?.service::<dyn MailService>();
/// ```
#[derive(Clone)]
pub struct DefaultKernel {
    shared: Arc<KernelShared>,
}

/// 不持有内核的弱句柄
#[derive(Clone)]
pub struct WeakKernel {
    shared: Weak<KernelShared>,
}

impl WeakKernel {
    /// 内核仍存活时返回强句柄
    pub fn upgrade(&self) -> Option<DefaultKernel> {
        self.shared.upgrade().map(|shared| DefaultKernel { shared })
    }
}

impl DefaultKernel {
    /// 使用默认设置创建内核
    pub fn new() -> Self {
        Self::with_settings(KernelConfig::default())
    }

    /// 使用指定设置创建内核
    pub fn with_settings(settings: KernelConfig) -> Self {
        let shared = Arc::new(KernelShared::new(settings));
        info!(kernel = %shared.id, "内核已创建");
        Self { shared }
    }

    /// 从配置文件创建内核：`kernel` 节为内核设置，`components`/`facilities` 节进入配置存储
    pub fn from_file<P: AsRef<Path>>(path: P) -> KernelResult<Self> {
        let path = path.as_ref();
        let settings = KernelConfig::load(path)
            .map_err(|e| KernelError::configuration(format!("加载内核设置失败: {e}")))?;
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| KernelError::configuration(format!("读取配置文件失败: {e}")))?;
        let store = DefaultConfigurationStore::from_config(&config)
            .map_err(|e| KernelError::configuration(format!("加载组件配置失败: {e}")))?;

        let kernel = Self::with_settings(settings);
        kernel.set_configuration_store(Arc::new(store));
        Ok(kernel)
    }

    /// 内核ID
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// 弱句柄
    pub fn downgrade(&self) -> WeakKernel {
        WeakKernel {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// 内核设置
    pub fn settings(&self) -> &KernelConfig {
        &self.shared.settings
    }

    // ---- 注册 ----

    /// 注册组件
    ///
    /// 重复的键返回 [`KernelError::ComponentRegistration`]；模型构建失败时内核状态不变。
    pub fn register_component(&self, registration: ComponentRegistration) -> KernelResult<()> {
        let shared = &self.shared;
        shared.ensure_active()?;

        let draft = registration.into_draft();
        if shared.registry.read().handlers.contains_key(&draft.key) {
            return Err(KernelError::registration(&draft.key, "组件键已存在"));
        }

        let model = Arc::new(shared.builder.build(&**shared, draft)?);
        shared.events.publish(&KernelEvent::ComponentModelCreated {
            model: model.clone(),
        });

        let factory: Arc<dyn InstanceFactory> = Arc::new(DefaultInstanceFactory::new(
            model.clone(),
            Arc::downgrade(shared),
        ));
        let lifestyle = create_lifestyle_manager(&**shared, factory)?;
        let handler = Arc::new(DefaultHandler::new(
            model.clone(),
            lifestyle,
            Arc::downgrade(shared),
        ));
        handler.init(shared);

        {
            let mut registry = shared.registry.write();
            if registry.handlers.contains_key(model.key()) {
                drop(registry);
                handler.dispose();
                return Err(KernelError::registration(model.key(), "组件键已存在"));
            }
            registry.insert(handler.clone());
        }

        info!(
            kernel = %shared.id,
            component = model.key(),
            service = %model.service(),
            lifestyle = %model.lifestyle(),
            state = %handler.state(),
            "组件已注册"
        );
        shared.events.publish(&KernelEvent::ComponentRegistered {
            key: model.key().to_string(),
            handler,
        });
        Ok(())
    }

    /// 移除组件
    ///
    /// 其他本地组件的必需依赖只能由它提供时拒绝移除。
    pub fn remove_component(&self, key: &str) -> KernelResult<()> {
        let shared = &self.shared;
        shared.ensure_active()?;

        let handler = {
            let mut registry = shared.registry.write();
            let handler = registry
                .handlers
                .get(key)
                .cloned()
                .ok_or_else(|| KernelError::not_found(key))?;
            let service = handler.service();

            let sole_provider = registry
                .by_service
                .get(service)
                .map_or(true, |providers| providers.len() <= 1)
                && !shared.parent().is_some_and(|parent| parent.has_service(service));
            if sole_provider {
                let dependents: Vec<String> = registry
                    .handlers
                    .values()
                    .filter(|other| other.key() != key)
                    .filter(|other| other.model().required_services().any(|d| d.target() == service))
                    .map(|other| other.key().to_string())
                    .collect();
                if !dependents.is_empty() {
                    return Err(KernelError::registration(
                        key,
                        format!("仍被以下组件依赖: {}", dependents.join(", ")),
                    ));
                }
            }

            registry.remove(key);
            handler
        };

        let as_handler: Arc<dyn Handler> = handler.clone();
        let weak = Arc::downgrade(&as_handler);
        shared.tracked.retain(|owner| !Weak::ptr_eq(owner, &weak));

        handler.dispose();
        info!(kernel = %shared.id, component = key, "组件已移除");
        shared.events.publish(&KernelEvent::ComponentUnregistered {
            key: key.to_string(),
            handler: as_handler,
        });
        Ok(())
    }

    /// 是否存在指定键的组件（本地或父内核）
    pub fn has_component(&self, key: &str) -> bool {
        self.shared.has_component(key)
    }

    /// 是否存在提供指定服务的组件（本地或父内核）
    pub fn has_service(&self, service: &TypeInfo) -> bool {
        self.shared.has_service(service)
    }

    // ---- 解析 ----

    /// 按键解析
    pub fn resolve(&self, key: &str) -> KernelResult<ComponentInstance> {
        self.shared.resolve_key_in(key, &CreationContext::new())
    }

    /// 按服务解析
    pub fn resolve_service(&self, service: &TypeInfo) -> KernelResult<ComponentInstance> {
        self.shared
            .resolve_service_in(service, &CreationContext::new())
    }

    /// 按键解析，`arguments` 只作用于该组件自身的依赖
    pub fn resolve_with_arguments(
        &self,
        key: &str,
        arguments: Arguments,
    ) -> KernelResult<ComponentInstance> {
        self.shared
            .resolve_key_in(key, &CreationContext::with_arguments(arguments))
    }

    /// 解析服务的全部 Valid 实现，本地在前、父内核在后
    pub fn resolve_all(&self, service: &TypeInfo) -> KernelResult<Vec<ComponentInstance>> {
        self.shared.resolve_all_in(service, &CreationContext::new())
    }

    /// 释放实例
    ///
    /// 实例交还给产出它的处理器；不是本内核（或父内核）追踪的实例时静默忽略，返回 false。
    pub fn release(&self, instance: &ComponentInstance) -> bool {
        self.shared.release(instance)
    }

    // ---- 事件与扩展 ----

    /// 订阅内核事件，句柄丢弃时取消订阅
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionHandle
    where
        F: Fn(&KernelEvent) + Send + Sync + 'static,
    {
        let id = self.shared.events.subscribe(Arc::new(listener));
        let bus = Arc::downgrade(&self.shared.events);
        SubscriptionHandle::new(
            id,
            Box::new(move || {
                if let Some(bus) = bus.upgrade() {
                    bus.unsubscribe(id);
                }
            }),
        )
    }

    /// 追加子解析器
    pub fn add_sub_resolver(&self, resolver: Arc<dyn SubDependencyResolver>) {
        self.shared.resolver.add_sub_resolver(resolver);
    }

    /// 追加模型贡献者，在内置贡献者之后执行
    pub fn add_contributor(&self, contributor: Arc<dyn ModelContributor>) {
        self.shared.builder.add_contributor(contributor);
    }

    /// 按名称注册自定义生命周期
    pub fn register_custom_lifestyle<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(Arc<dyn InstanceFactory>) -> Box<dyn LifestyleManager> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("注册自定义生命周期: {}", name);
        self.shared.custom_lifestyles.insert(name, Arc::new(factory));
    }

    /// 设置代理工厂
    pub fn set_proxy_factory(&self, factory: Arc<dyn ProxyFactory>) {
        *self.shared.proxy_factory.write() = Some(factory);
    }

    /// 替换配置存储，只影响之后注册的组件
    pub fn set_configuration_store(&self, store: Arc<dyn ConfigurationStore>) {
        *self.shared.store.write() = store;
    }

    /// 添加扩展设施，使用配置存储中同键的设施配置初始化
    pub fn add_facility(&self, key: impl Into<String>, facility: Arc<dyn Facility>) -> KernelResult<()> {
        self.shared.ensure_active()?;
        let key = key.into();
        let configuration = self.shared.configuration_store().facility_configuration(&key);
        facility.init(self, configuration)?;
        info!(kernel = %self.shared.id, facility = %key, "扩展设施已添加");
        self.shared.facilities.lock().push((key, facility));
        Ok(())
    }

    // ---- 父子内核 ----

    /// 挂到父内核下
    ///
    /// 内核不能成为自己的祖先；已有父内核时需要先 [`DefaultKernel::clear_parent`]。
    pub fn set_parent(&self, parent: &DefaultKernel) -> KernelResult<()> {
        self.shared.ensure_active()?;

        let cycle_error = || KernelError::InvalidParent {
            message: format!("内核 {} 不能成为自己的祖先", self.shared.id),
        };
        if self.shared.is_ancestor_of(&parent.shared) {
            return Err(cycle_error());
        }

        {
            let mut slot = self.shared.parent.write();
            if slot.is_some() {
                return Err(KernelError::InvalidParent {
                    message: format!("内核 {} 已经有父内核", self.shared.id),
                });
            }

            let child_bus = Arc::downgrade(&self.shared.events);
            let id = parent.shared.events.subscribe(Arc::new(move |event| {
                if let KernelEvent::ComponentRegistered { .. } = event {
                    if let Some(bus) = child_bus.upgrade() {
                        bus.publish(event);
                    }
                }
            }));
            let parent_bus = Arc::downgrade(&parent.shared.events);
            let forwarding = SubscriptionHandle::new(
                id,
                Box::new(move || {
                    if let Some(bus) = parent_bus.upgrade() {
                        bus.unsubscribe(id);
                    }
                }),
            );
            *slot = Some(ParentLink {
                kernel: Arc::downgrade(&parent.shared),
                _forwarding: forwarding,
            });
        }

        // 并发的 set_parent 可能都通过了前面的检查，装上之后再走一遍父链
        if self.shared.is_ancestor_of(&parent.shared) {
            let removed = {
                let mut slot = self.shared.parent.write();
                let ours = slot
                    .as_ref()
                    .is_some_and(|link| link.kernel.as_ptr() == Arc::as_ptr(&parent.shared));
                if ours {
                    slot.take()
                } else {
                    None
                }
            };
            drop(removed);
            warn!(kernel = %self.shared.id, parent = %parent.shared.id, "并发挂载形成父链环, 已撤销");
            return Err(cycle_error());
        }

        info!(kernel = %self.shared.id, parent = %parent.shared.id, "已挂到父内核");
        self.shared.events.publish(&KernelEvent::AddedAsChildKernel);

        // 父内核已有的服务不会再触发注册事件，等待中的处理器需要重新检查
        let handlers = self.shared.registry.read().in_order();
        for handler in handlers {
            handler.refresh(&self.shared);
        }
        Ok(())
    }

    /// 与父内核断开，返回之前是否有父内核
    ///
    /// 已经转为 Valid 的处理器保持 Valid，缺失的依赖在解析时报告。
    pub fn clear_parent(&self) -> bool {
        let removed = self.shared.parent.write().take();
        if removed.is_none() {
            return false;
        }
        info!(kernel = %self.shared.id, "已与父内核断开");
        self.shared.events.publish(&KernelEvent::RemovedAsChildKernel);
        true
    }

    /// 父内核
    pub fn parent(&self) -> Option<DefaultKernel> {
        self.shared.parent().map(|shared| DefaultKernel { shared })
    }

    // ---- 内省 ----

    /// 按键获取处理器（本地或父内核）
    pub fn handler(&self, key: &str) -> Option<Arc<dyn Handler>> {
        self.shared.handler(key)
    }

    /// 按键获取本地处理器
    pub fn local_handler(&self, key: &str) -> Option<Arc<dyn Handler>> {
        self.shared
            .local_handler(key)
            .map(|handler| handler as Arc<dyn Handler>)
    }

    /// 提供指定服务的全部处理器（本地在前）
    pub fn handlers_for(&self, service: &TypeInfo) -> Vec<Arc<dyn Handler>> {
        self.shared.handlers_for_service(service)
    }

    /// 本地处理器，按注册顺序
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.shared
            .registry
            .read()
            .in_order()
            .into_iter()
            .map(|handler| handler as Arc<dyn Handler>)
            .collect()
    }

    /// 本地处理器状态快照
    pub fn handler_info(&self, key: &str) -> Option<HandlerInfo> {
        self.shared.local_handler(key).map(|handler| handler.info())
    }

    /// 仍在等待释放的已追踪实例数量
    ///
    /// 调用方直接丢弃、未释放的实例会在后续解析时被清理。
    pub fn tracked_count(&self) -> usize {
        self.shared.tracked.len()
    }

    /// 本地组件数量
    pub fn component_count(&self) -> usize {
        self.shared.registry.read().handlers.len()
    }

    /// 子解析器名称
    pub fn sub_resolver_names(&self) -> Vec<String> {
        self.shared.resolver.sub_resolver_names()
    }

    /// 模型贡献者名称
    pub fn contributor_names(&self) -> Vec<String> {
        self.shared.builder.contributor_names()
    }

    // ---- 销毁 ----

    /// 销毁内核：逆注册顺序销毁本地处理器，再逆序终止扩展设施；不影响父内核
    pub fn dispose(&self) {
        self.shared.dispose();
    }

    /// 是否已销毁
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }
}

impl Default for DefaultKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for DefaultKernel {
    fn settings(&self) -> &KernelConfig {
        self.shared.settings()
    }

    fn has_component(&self, key: &str) -> bool {
        self.shared.has_component(key)
    }

    fn has_service(&self, service: &TypeInfo) -> bool {
        self.shared.has_service(service)
    }

    fn handler(&self, key: &str) -> Option<Arc<dyn Handler>> {
        self.shared.handler(key)
    }

    fn handler_for_service(&self, service: &TypeInfo) -> Option<Arc<dyn Handler>> {
        self.shared.handler_for_service(service)
    }

    fn handlers_for_service(&self, service: &TypeInfo) -> Vec<Arc<dyn Handler>> {
        self.shared.handlers_for_service(service)
    }

    fn resolve_key_in(&self, key: &str, context: &CreationContext) -> KernelResult<ComponentInstance> {
        self.shared.resolve_key_in(key, context)
    }

    fn resolve_service_in(
        &self,
        service: &TypeInfo,
        context: &CreationContext,
    ) -> KernelResult<ComponentInstance> {
        self.shared.resolve_service_in(service, context)
    }

    fn resolve_all_in(
        &self,
        service: &TypeInfo,
        context: &CreationContext,
    ) -> KernelResult<Vec<ComponentInstance>> {
        self.shared.resolve_all_in(service, context)
    }

    fn configuration_store(&self) -> Arc<dyn ConfigurationStore> {
        self.shared.configuration_store()
    }

    fn custom_lifestyle(&self, name: &str) -> Option<CustomLifestyleFactory> {
        self.shared.custom_lifestyle(name)
    }
}

impl std::fmt::Debug for DefaultKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultKernel")
            .field("id", &self.shared.id)
            .field("components", &self.component_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for DefaultKernel {
    fn drop(&mut self) {
        if Arc::strong_count(&self.shared) == 1 && !self.is_disposed() {
            warn!(kernel = %self.shared.id, "内核未显式销毁, 随最后一个句柄释放");
        }
    }
}
