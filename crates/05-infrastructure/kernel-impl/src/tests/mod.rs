//! 内核实现的单元测试

mod model_builder_tests;
mod resolver_tests;

use kernel_abstractions::ComponentRegistration;
use microkernel_common::{init_tracing, ComponentInstance, Lifestyle, LoggingConfig, TypeInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// 每个测试二进制只初始化一次日志
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = init_tracing(&LoggingConfig::development());
    });
}

pub trait MailService: Send + Sync {
    fn host(&self) -> &str;
}

pub struct SmtpMailService {
    pub host: String,
}

impl MailService for SmtpMailService {
    fn host(&self) -> &str {
        &self.host
    }
}

pub fn mail_contract() -> TypeInfo {
    TypeInfo::contract::<dyn MailService>()
}

pub fn mail_instance(host: &str) -> ComponentInstance {
    ComponentInstance::from_service::<dyn MailService>(Arc::new(SmtpMailService {
        host: host.to_string(),
    }))
}

/// 每次构造都递增 `created` 的邮件组件
pub fn counted_mail(key: &str, lifestyle: Lifestyle, created: &Arc<AtomicUsize>) -> ComponentRegistration {
    let created = created.clone();
    let host = key.to_string();
    ComponentRegistration::for_service(mail_contract())
        .implemented_by(TypeInfo::of::<SmtpMailService>())
        .named(key)
        .lifestyle(lifestyle)
        .constructor(Vec::new(), move |_| {
            created.fetch_add(1, Ordering::SeqCst);
            Ok(mail_instance(&host))
        })
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
