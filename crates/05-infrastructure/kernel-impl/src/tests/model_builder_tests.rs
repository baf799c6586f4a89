//! 模型构建管道测试

use super::*;
use crate::configuration::DefaultConfigurationStore;
use crate::kernel::DefaultKernel;
use kernel_abstractions::{
    ComponentActivator, ComponentModel, ComponentModelDraft, DependencyModel,
    InterceptorReference, Kernel, KernelEvent, ModelContributor, ResolvedDependencies,
};
use microkernel_common::{BoxError, KernelConfig, KernelError, KernelResult, LifestyleKind};
use parking_lot::Mutex;
use serde_json::json;

trait SpamService: Send + Sync {}
struct SpamFilter;
impl SpamService for SpamFilter {}

fn spam_contract() -> TypeInfo {
    TypeInfo::contract::<dyn SpamService>()
}

fn spam_instance() -> ComponentInstance {
    ComponentInstance::from_service::<dyn SpamService>(Arc::new(SpamFilter))
}

/// 测试构造候选选择：必需服务依赖最少者胜出，相同时取先声明的
#[test]
fn test_constructor_selection_prefers_fewest_required_services() {
    let kernel = DefaultKernel::new();
    kernel
        .register_component(
            ComponentRegistration::for_service(spam_contract())
                .implemented_by(TypeInfo::of::<SpamFilter>())
                .named("spam")
                .constructor(
                    vec![DependencyModel::service("mail", mail_contract())],
                    |_| Ok(spam_instance()),
                )
                .constructor(
                    vec![
                        DependencyModel::service("mail", mail_contract()).optional(),
                        DependencyModel::value::<u16>("port").with_default(25_u16),
                    ],
                    |_| Ok(spam_instance()),
                )
                .constructor(Vec::new(), |_| Ok(spam_instance())),
        )
        .unwrap();

    let handler = kernel.handler("spam").unwrap();
    let model = handler.model();
    assert_eq!(model.dependencies().len(), 2);
    assert_eq!(model.dependencies()[0].dependency_key(), "mail");
    assert!(model.dependencies()[0].is_optional());
    assert_eq!(handler.state(), microkernel_common::HandlerState::Valid);
}

/// 测试抽象实现类型需要自定义激活器
#[test]
fn test_abstract_implementation_requires_custom_activator() {
    struct MailActivator;
    impl ComponentActivator for MailActivator {
        fn construct(
            &self,
            _model: &ComponentModel,
            _dependencies: &ResolvedDependencies,
        ) -> Result<ComponentInstance, BoxError> {
            Ok(mail_instance("activated"))
        }
    }

    let kernel = DefaultKernel::new();
    let rejected = kernel.register_component(
        ComponentRegistration::for_service(mail_contract())
            .named("abstract")
            .constructor(Vec::new(), |_| Ok(mail_instance("never"))),
    );
    assert!(matches!(rejected, Err(KernelError::ComponentRegistration { .. })));
    assert!(!kernel.has_component("abstract"));

    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .named("activated")
                .activator(Arc::new(MailActivator)),
        )
        .unwrap();
    let mail = kernel.resolve("activated").unwrap();
    assert_eq!(mail.service::<dyn MailService>().unwrap().host(), "activated");
}

/// 测试没有构造候选也没有激活器时注册失败
#[test]
fn test_missing_constructor_rejected() {
    let kernel = DefaultKernel::new();
    let result = kernel.register_component(
        ComponentRegistration::for_service(mail_contract())
            .implemented_by(TypeInfo::of::<SmtpMailService>())
            .named("mail"),
    );
    assert!(matches!(result, Err(KernelError::ComponentRegistration { .. })));
}

/// 测试外部配置提供生命周期、参数、拦截器和启动标记
#[test]
fn test_configuration_contributor_applies_component_configuration() {
    let store = DefaultConfigurationStore::new();
    store.add_component_configuration(
        "mail",
        json!({
            "lifestyle": "pooled",
            "initialPoolSize": "1",
            "maxPoolSize": 3,
            "interceptors": ["audit", "retry"],
            "startable": "true",
            "parameters": { "host": "smtp.example.org" }
        }),
    );

    let kernel = DefaultKernel::new();
    kernel.set_configuration_store(Arc::new(store));
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .interceptor("audit")
                .constructor(vec![DependencyModel::value::<String>("host")], |deps| {
                    let host: String = deps.value("host")?;
                    Ok(mail_instance(&host))
                }),
        )
        .unwrap();

    let handler = kernel.handler("mail").unwrap();
    let model = handler.model();
    assert_eq!(model.lifestyle(), &Lifestyle::pooled_with(1, 3));
    assert_eq!(
        model.interceptors(),
        &[InterceptorReference::new("audit"), InterceptorReference::new("retry")]
    );
    assert!(model.is_startable());
    assert!(model.configuration().is_some());

    let mail = kernel.resolve("mail").unwrap();
    assert_eq!(mail.service::<dyn MailService>().unwrap().host(), "smtp.example.org");
}

/// 测试显式指定的生命周期优先于配置
#[test]
fn test_explicit_lifestyle_wins_over_configuration() {
    let store = DefaultConfigurationStore::new();
    store.add_component_configuration("mail", json!({ "lifestyle": "transient" }));
    let kernel = DefaultKernel::new();
    kernel.set_configuration_store(Arc::new(store));

    let created = Arc::new(AtomicUsize::new(0));
    kernel
        .register_component(counted_mail("mail", Lifestyle::Singleton, &created))
        .unwrap();
    assert_eq!(kernel.handler("mail").unwrap().model().lifestyle(), &Lifestyle::Singleton);
}

/// 测试未知的生命周期名称是配置错误
#[test]
fn test_unknown_lifestyle_name_in_configuration() {
    let store = DefaultConfigurationStore::new();
    store.add_component_configuration("mail", json!({ "lifestyle": "weekly" }));
    let kernel = DefaultKernel::new();
    kernel.set_configuration_store(Arc::new(store));

    let result = kernel.register_component(
        ComponentRegistration::for_service(mail_contract())
            .implemented_by(TypeInfo::of::<SmtpMailService>())
            .named("mail")
            .constructor(Vec::new(), |_| Ok(mail_instance("smtp"))),
    );
    assert!(matches!(result, Err(KernelError::Configuration { .. })));
}

/// 测试未声明生命周期时使用内核默认值
#[test]
fn test_default_lifestyle_from_settings() {
    let kernel = DefaultKernel::with_settings(
        KernelConfig::default().with_default_lifestyle(LifestyleKind::Transient),
    );
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .constructor(Vec::new(), |_| Ok(mail_instance("smtp"))),
        )
        .unwrap();

    assert_eq!(kernel.handler("mail").unwrap().model().lifestyle(), &Lifestyle::Transient);
    let first = kernel.resolve("mail").unwrap();
    let second = kernel.resolve("mail").unwrap();
    assert!(!first.ptr_eq(&second));
}

/// 测试池大小无效时注册失败且不产生任何状态
#[test]
fn test_invalid_pool_sizes_rejected() {
    let kernel = DefaultKernel::new();
    let models = Arc::new(AtomicUsize::new(0));
    let counter = models.clone();
    let _subscription = kernel.subscribe(move |event| {
        if let KernelEvent::ComponentModelCreated { .. } = event {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let created = Arc::new(AtomicUsize::new(0));
    let too_small = kernel.register_component(counted_mail("a", Lifestyle::pooled_with(4, 2), &created));
    let zero = kernel.register_component(counted_mail("b", Lifestyle::pooled_with(0, 0), &created));

    assert!(matches!(too_small, Err(KernelError::ComponentRegistration { .. })));
    assert!(matches!(zero, Err(KernelError::ComponentRegistration { .. })));
    assert_eq!(kernel.component_count(), 0);
    assert_eq!(count(&models), 0);
}

/// 追加属性并记录看到的生命周期
struct OwnerContributor {
    seen: Mutex<Vec<Option<Lifestyle>>>,
}

impl ModelContributor for OwnerContributor {
    fn name(&self) -> &str {
        "owner"
    }

    fn process(&self, _kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()> {
        self.seen.lock().push(draft.lifestyle.clone());
        if draft.key == "forbidden" {
            return Err(KernelError::registration(&draft.key, "名称被保留"));
        }
        draft
            .extended_properties
            .insert("owner".to_string(), json!("mail-team"));
        Ok(())
    }
}

/// 测试追加的贡献者在内置贡献者之后执行，失败时中止注册
#[test]
fn test_custom_contributor_runs_last_and_can_abort() {
    let kernel = DefaultKernel::new();
    let contributor = Arc::new(OwnerContributor {
        seen: Mutex::new(Vec::new()),
    });
    kernel.add_contributor(contributor.clone());
    assert_eq!(
        kernel.contributor_names(),
        vec!["configuration", "lifestyle", "constructor", "implementation", "interceptor", "owner"]
    );

    let created = Arc::new(AtomicUsize::new(0));
    kernel
        .register_component(counted_mail("mail", Lifestyle::Transient, &created))
        .unwrap();
    assert_eq!(
        kernel.handler("mail").unwrap().model().property("owner"),
        Some(&json!("mail-team"))
    );

    let result = kernel.register_component(counted_mail("forbidden", Lifestyle::Transient, &created));
    assert!(matches!(result, Err(KernelError::ComponentRegistration { .. })));
    assert!(!kernel.has_component("forbidden"));
    assert_eq!(
        *contributor.seen.lock(),
        vec![Some(Lifestyle::Transient), Some(Lifestyle::Transient)]
    );
}
