//! 依赖解析测试

use super::*;
use crate::kernel::DefaultKernel;
use kernel_abstractions::{
    Arguments, ComponentModel, CreationContext, DependencyModel, InterceptorReference, Kernel,
    ProxyFactory, SubDependencyResolver,
};
use microkernel_common::{BoxError, KernelError, KernelResult};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use std::error::Error as _;

trait Newsletter: Send + Sync {
    fn mail_host(&self) -> &str;
    fn port(&self) -> u16;
}

struct WeeklyNewsletter {
    mail: Arc<dyn MailService>,
    port: u16,
}

impl Newsletter for WeeklyNewsletter {
    fn mail_host(&self) -> &str {
        self.mail.host()
    }

    fn port(&self) -> u16 {
        self.port
    }
}

fn newsletter(dependencies: Vec<DependencyModel>) -> ComponentRegistration {
    ComponentRegistration::for_service(TypeInfo::contract::<dyn Newsletter>())
        .implemented_by(TypeInfo::of::<WeeklyNewsletter>())
        .named("newsletter")
        .lifestyle(Lifestyle::Transient)
        .constructor(dependencies, |deps| {
            let mail = deps.service::<dyn MailService>("mail")?;
            let port = deps
                .get("port")
                .and_then(|p| p.downcast::<u16>())
                .map_or(25, |p| *p);
            Ok(ComponentInstance::from_service::<dyn Newsletter>(Arc::new(WeeklyNewsletter {
                mail,
                port,
            })))
        })
}

fn resolve_newsletter(kernel: &DefaultKernel) -> Arc<dyn Newsletter> {
    kernel
        .resolve("newsletter")
        .unwrap()
        .service::<dyn Newsletter>()
        .unwrap()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct SmtpSettings {
    host: String,
    port: u16,
}

/// 测试值依赖通过 serde 从参数转换
#[test]
fn test_value_parameters_are_converted() {
    let kernel = DefaultKernel::new();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .parameter("settings", json!({ "host": "smtp.local", "port": 2525 }))
                .constructor(vec![DependencyModel::value::<SmtpSettings>("settings")], |deps| {
                    let settings: SmtpSettings = deps.value("settings")?;
                    assert_eq!(settings.port, 2525);
                    Ok(mail_instance(&settings.host))
                }),
        )
        .unwrap();

    let mail = kernel.resolve("mail").unwrap();
    assert_eq!(mail.service::<dyn MailService>().unwrap().host(), "smtp.local");
}

/// 测试参数类型不匹配是配置错误
#[test]
fn test_bad_parameter_is_configuration_error() {
    let kernel = DefaultKernel::new();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .parameter("port", json!("not-a-port"))
                .constructor(vec![DependencyModel::value::<u16>("port")], |_| Ok(mail_instance("x"))),
        )
        .unwrap();

    assert!(matches!(kernel.resolve("mail"), Err(KernelError::Configuration { .. })));
}

/// 测试 `${key}` 参数指定服务的提供者
#[test]
fn test_service_override_selects_component() {
    let kernel = DefaultKernel::new();
    let created = Arc::new(AtomicUsize::new(0));
    kernel.register_component(counted_mail("primary", Lifestyle::Singleton, &created)).unwrap();
    kernel.register_component(counted_mail("backup", Lifestyle::Singleton, &created)).unwrap();

    kernel
        .register_component(
            newsletter(vec![DependencyModel::service("mail", mail_contract())])
                .parameter("mail", json!("${backup}")),
        )
        .unwrap();
    assert_eq!(resolve_newsletter(&kernel).mail_host(), "backup");
}

/// 测试没有覆盖时使用第一个注册的提供者，或依赖指定的组件键
#[test]
fn test_plain_service_lookup_and_component_key() {
    let kernel = DefaultKernel::new();
    let created = Arc::new(AtomicUsize::new(0));
    kernel.register_component(counted_mail("primary", Lifestyle::Singleton, &created)).unwrap();
    kernel.register_component(counted_mail("backup", Lifestyle::Singleton, &created)).unwrap();

    kernel
        .register_component(newsletter(vec![DependencyModel::service("mail", mail_contract())]))
        .unwrap();
    assert_eq!(resolve_newsletter(&kernel).mail_host(), "primary");

    kernel.remove_component("newsletter").unwrap();
    kernel
        .register_component(newsletter(vec![
            DependencyModel::service("mail", mail_contract()).with_component_key("backup"),
        ]))
        .unwrap();
    assert_eq!(resolve_newsletter(&kernel).mail_host(), "backup");
}

/// 测试调用方参数只作用于根组件
#[test]
fn test_arguments_override_root_dependencies_only() {
    let kernel = DefaultKernel::new();
    let created = Arc::new(AtomicUsize::new(0));
    kernel.register_component(counted_mail("mail", Lifestyle::Singleton, &created)).unwrap();
    kernel
        .register_component(newsletter(vec![
            DependencyModel::service("mail", mail_contract()),
            DependencyModel::value::<u16>("port").optional(),
        ]))
        .unwrap();

    let arguments = Arguments::new()
        .with("mail", mail_instance("argument"))
        .with("port", ComponentInstance::new(587_u16));
    let resolved = kernel
        .resolve_with_arguments("newsletter", arguments)
        .unwrap()
        .service::<dyn Newsletter>()
        .unwrap();
    assert_eq!(resolved.mail_host(), "argument");
    assert_eq!(resolved.port(), 587);
    assert_eq!(count(&created), 0);

    let plain = resolve_newsletter(&kernel);
    assert_eq!(plain.mail_host(), "mail");
    assert_eq!(plain.port(), 25);
}

/// 测试可选依赖：缺失时使用默认值，没有默认值时为空
#[test]
fn test_optional_dependencies_fall_back() {
    let kernel = DefaultKernel::new();
    let created = Arc::new(AtomicUsize::new(0));
    kernel.register_component(counted_mail("mail", Lifestyle::Singleton, &created)).unwrap();
    kernel
        .register_component(newsletter(vec![
            DependencyModel::service("mail", mail_contract()),
            DependencyModel::value::<u16>("port").with_default(465_u16),
            DependencyModel::service("archive", TypeInfo::named_contract("Archive")).optional(),
        ]))
        .unwrap();

    assert_eq!(resolve_newsletter(&kernel).port(), 465);
}

/// 测试缺失的必需值依赖
#[test]
fn test_missing_mandatory_value() {
    let kernel = DefaultKernel::new();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .constructor(vec![DependencyModel::value::<String>("host")], |_| Ok(mail_instance("x"))),
        )
        .unwrap();

    match kernel.resolve("mail") {
        Err(KernelError::DependenciesUnsatisfied { key, pending }) => {
            assert_eq!(key, "mail");
            assert_eq!(pending, vec!["host".to_string()]);
        }
        other => panic!("期望依赖未满足, 实际: {other:?}"),
    }
}

/// 测试集合依赖解析为全部 Valid 实现，不含组件自身
#[test]
fn test_collection_dependency() {
    let kernel = DefaultKernel::new();
    let created = Arc::new(AtomicUsize::new(0));
    kernel.register_component(counted_mail("primary", Lifestyle::Singleton, &created)).unwrap();
    kernel.register_component(counted_mail("backup", Lifestyle::Singleton, &created)).unwrap();

    let hosts = Arc::new(Mutex::new(Vec::new()));
    let seen = hosts.clone();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("broadcast")
                .constructor(
                    vec![DependencyModel::service_collection("all", mail_contract())],
                    move |deps| {
                        let all = deps.collection::<dyn MailService>("all")?;
                        *seen.lock() = all.iter().map(|m| m.host().to_string()).collect();
                        Ok(mail_instance("broadcast"))
                    },
                ),
        )
        .unwrap();

    kernel.resolve("broadcast").unwrap();
    assert_eq!(*hosts.lock(), vec!["primary".to_string(), "backup".to_string()]);
    assert_eq!(kernel.resolve_all(&mail_contract()).unwrap().len(), 3);
}

/// 固定端口的子解析器
struct FixedPortResolver;

impl SubDependencyResolver for FixedPortResolver {
    fn name(&self) -> &str {
        "fixed-port"
    }

    fn can_resolve(
        &self,
        _kernel: &dyn Kernel,
        _context: &CreationContext,
        _model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> bool {
        dependency.dependency_key() == "port"
    }

    fn resolve(
        &self,
        _kernel: &dyn Kernel,
        _context: &CreationContext,
        _model: &ComponentModel,
        _dependency: &DependencyModel,
    ) -> KernelResult<ComponentInstance> {
        Ok(ComponentInstance::new(2525_u16))
    }
}

/// 测试子解析器按注册顺序，第一个匹配者胜出
#[test]
fn test_sub_resolver_first_match_wins() {
    let kernel = DefaultKernel::new();
    kernel.add_sub_resolver(Arc::new(FixedPortResolver));
    assert_eq!(kernel.sub_resolver_names(), vec!["parameter", "collection", "fixed-port"]);

    let created = Arc::new(AtomicUsize::new(0));
    kernel.register_component(counted_mail("mail", Lifestyle::Singleton, &created)).unwrap();
    kernel
        .register_component(newsletter(vec![
            DependencyModel::service("mail", mail_contract()),
            DependencyModel::value::<u16>("port").with_default(25_u16),
        ]))
        .unwrap();
    assert_eq!(resolve_newsletter(&kernel).port(), 2525);

    // 参数解析器排在前面，参数存在时自定义子解析器不再被询问
    kernel.remove_component("newsletter").unwrap();
    kernel
        .register_component(
            newsletter(vec![
                DependencyModel::service("mail", mail_contract()),
                DependencyModel::value::<u16>("port"),
            ])
            .parameter("port", json!(993)),
        )
        .unwrap();
    assert_eq!(resolve_newsletter(&kernel).port(), 993);
}

/// 测试激活器失败被包装为 Handler 错误并保留原因
#[test]
fn test_activator_failure_is_wrapped() {
    let kernel = DefaultKernel::new();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .constructor(Vec::new(), |_| Err("连接被拒绝".into())),
        )
        .unwrap();

    let error = kernel.resolve("mail").unwrap_err();
    assert!(error.is_component_failure());
    assert_eq!(error.source().map(|e| e.to_string()), Some("连接被拒绝".to_string()));
}

/// 记录拦截器并包装实例的代理工厂
struct RecordingProxyFactory {
    seen: Mutex<Vec<Vec<String>>>,
}

impl ProxyFactory for RecordingProxyFactory {
    fn create(
        &self,
        _kernel: &dyn Kernel,
        _model: &ComponentModel,
        target: ComponentInstance,
        interceptors: &[InterceptorReference],
    ) -> Result<ComponentInstance, BoxError> {
        self.seen
            .lock()
            .push(interceptors.iter().map(|i| i.key().to_string()).collect());
        let inner = target.service::<dyn MailService>().ok_or("不是邮件服务")?;
        Ok(mail_instance(&format!("proxy({})", inner.host())))
    }
}

/// 测试拦截器引用原样交给代理工厂，创建钩子看到的是包装后的实例
#[test]
fn test_proxy_factory_receives_interceptors() {
    let kernel = DefaultKernel::new();
    let proxy = Arc::new(RecordingProxyFactory {
        seen: Mutex::new(Vec::new()),
    });
    kernel.set_proxy_factory(proxy.clone());

    let hooked = Arc::new(Mutex::new(String::new()));
    let hook_seen = hooked.clone();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpMailService>())
                .named("mail")
                .interceptor("audit")
                .interceptor("retry")
                .on_create(move |instance| {
                    let mail = instance.service::<dyn MailService>().ok_or("不是邮件服务")?;
                    *hook_seen.lock() = mail.host().to_string();
                    Ok(())
                })
                .constructor(Vec::new(), |_| Ok(mail_instance("smtp"))),
        )
        .unwrap();

    let mail = kernel.resolve("mail").unwrap();
    assert_eq!(mail.service::<dyn MailService>().unwrap().host(), "proxy(smtp)");
    assert_eq!(*proxy.seen.lock(), vec![vec!["audit".to_string(), "retry".to_string()]]);
    assert_eq!(*hooked.lock(), "proxy(smtp)");
}
