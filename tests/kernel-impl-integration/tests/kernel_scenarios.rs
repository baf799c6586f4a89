//! 组件内核的端到端场景测试
use kernel_abstractions::{
    ComponentModel, ComponentRegistration, CreationContext, DependencyModel, Kernel, KernelEvent,
    SubDependencyResolver,
};
use kernel_impl::DefaultKernel;
use microkernel_common::{
    init_tracing, ComponentInstance, HandlerState, KernelConfig, KernelError, KernelResult,
    Lifestyle, LoggingConfig, TypeInfo,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier, Once};
use std::thread;
use std::time::Duration;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = init_tracing(&LoggingConfig::default());
    });
}

trait MailSender: Send + Sync {
    fn server(&self) -> &str;
}

struct SmtpSender {
    server: String,
}

impl MailSender for SmtpSender {
    fn server(&self) -> &str {
        &self.server
    }
}

trait SpamService: Send + Sync {
    fn sender(&self) -> &Arc<dyn MailSender>;
}

struct DefaultSpamService {
    sender: Arc<dyn MailSender>,
}

impl SpamService for DefaultSpamService {
    fn sender(&self) -> &Arc<dyn MailSender> {
        &self.sender
    }
}

fn mail_contract() -> TypeInfo {
    TypeInfo::contract::<dyn MailSender>()
}

fn spam_contract() -> TypeInfo {
    TypeInfo::contract::<dyn SpamService>()
}

fn mail(key: &str, lifestyle: Lifestyle, created: &Arc<AtomicUsize>) -> ComponentRegistration {
    let created = created.clone();
    let server = key.to_string();
    ComponentRegistration::for_service(mail_contract())
        .implemented_by(TypeInfo::of::<SmtpSender>())
        .named(key)
        .lifestyle(lifestyle)
        .constructor(Vec::new(), move |_| {
            created.fetch_add(1, Ordering::SeqCst);
            Ok(ComponentInstance::from_service::<dyn MailSender>(Arc::new(
                SmtpSender {
                    server: server.clone(),
                },
            )))
        })
}

fn spam(lifestyle: Lifestyle) -> ComponentRegistration {
    ComponentRegistration::for_service(spam_contract())
        .implemented_by(TypeInfo::of::<DefaultSpamService>())
        .named("spam")
        .lifestyle(lifestyle)
        .constructor(
            vec![DependencyModel::service("sender", mail_contract())],
            |deps| {
                let sender = deps.service::<dyn MailSender>("sender")?;
                Ok(ComponentInstance::from_service::<dyn SpamService>(Arc::new(
                    DefaultSpamService { sender },
                )))
            },
        )
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

/// 测试依赖晚到时处理器只转为 Valid 一次
#[test]
fn test_deferred_readiness_fires_once() {
    init_logging();
    let kernel = DefaultKernel::new();
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let log = transitions.clone();
    let _subscription = kernel.subscribe(move |event| {
        if let KernelEvent::HandlerStateChanged {
            key,
            previous,
            current,
        } = event
        {
            log.lock().push((key.clone(), *previous, *current));
        }
    });

    kernel.register_component(spam(Lifestyle::Singleton)).unwrap();
    let info = kernel.handler_info("spam").unwrap();
    assert_eq!(info.state, HandlerState::WaitingDependency);
    assert_eq!(info.pending, vec![mail_contract()]);
    assert!(matches!(
        kernel.resolve("spam"),
        Err(KernelError::DependenciesUnsatisfied { .. })
    ));

    let created = counter();
    kernel
        .register_component(mail("mail.primary", Lifestyle::Singleton, &created))
        .unwrap();
    kernel
        .register_component(mail("mail.backup", Lifestyle::Singleton, &created))
        .unwrap();

    assert_eq!(
        *transitions.lock(),
        vec![(
            "spam".to_string(),
            HandlerState::WaitingDependency,
            HandlerState::Valid
        )]
    );
    let spam = kernel
        .resolve("spam")
        .unwrap()
        .service::<dyn SpamService>()
        .unwrap();
    assert_eq!(spam.sender().server(), "mail.primary");
}

/// 测试单例与瞬态的实例身份
#[test]
fn test_singleton_and_transient_identity() {
    let kernel = DefaultKernel::new();
    let singleton_created = counter();
    let transient_created = counter();
    kernel
        .register_component(mail("singleton", Lifestyle::Singleton, &singleton_created))
        .unwrap();
    kernel
        .register_component(mail("transient", Lifestyle::Transient, &transient_created))
        .unwrap();

    let a = kernel.resolve("singleton").unwrap();
    let b = kernel.resolve("singleton").unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(singleton_created.load(Ordering::SeqCst), 1);

    let c = kernel.resolve("transient").unwrap();
    let d = kernel.resolve("transient").unwrap();
    assert!(!c.ptr_eq(&d));
    assert_eq!(transient_created.load(Ordering::SeqCst), 2);
}

fn cyclic(key: &str, service: &str, depends_on: &str) -> ComponentRegistration {
    ComponentRegistration::for_service(TypeInfo::named_contract(service))
        .implemented_by(TypeInfo::named(format!("{service}Impl")))
        .named(key)
        .lifestyle(Lifestyle::Transient)
        .constructor(
            vec![DependencyModel::service(
                "next",
                TypeInfo::named_contract(depends_on),
            )],
            |_| Ok(ComponentInstance::new(())),
        )
}

/// 测试循环依赖在任意注册与解析顺序下都能被发现
#[test]
fn test_cycle_detected_in_any_order() {
    for order in [["a", "b"], ["b", "a"]] {
        let kernel = DefaultKernel::new();
        for key in order {
            let registration = if key == "a" {
                cyclic("a", "A", "B")
            } else {
                cyclic("b", "B", "A")
            };
            kernel.register_component(registration).unwrap();
        }

        assert_eq!(kernel.handler("a").unwrap().state(), HandlerState::Valid);
        assert_eq!(kernel.handler("b").unwrap().state(), HandlerState::Valid);

        for root in ["a", "b"] {
            match kernel.resolve(root) {
                Err(KernelError::CircularDependency { key, path }) => {
                    assert_eq!(key, root);
                    assert_eq!(path.first().map(String::as_str), Some(root));
                    assert_eq!(path.last().map(String::as_str), Some(root));
                    assert_eq!(path.len(), 3);
                }
                other => panic!("期望循环依赖错误, 实际: {other:?}"),
            }
        }
    }
}

/// 只拖慢依赖解析、从不接手依赖的子解析器
struct SlowLookup {
    delay: Duration,
}

impl SubDependencyResolver for SlowLookup {
    fn name(&self) -> &str {
        "slow-lookup"
    }

    fn can_resolve(
        &self,
        _kernel: &dyn Kernel,
        _context: &CreationContext,
        _model: &ComponentModel,
        _dependency: &DependencyModel,
    ) -> bool {
        thread::sleep(self.delay);
        false
    }

    fn resolve(
        &self,
        _kernel: &dyn Kernel,
        _context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> KernelResult<ComponentInstance> {
        Err(KernelError::not_found(format!(
            "{}.{}",
            model.key(),
            dependency.dependency_key()
        )))
    }
}

/// 测试两个线程分别从两端解析循环依赖的单例时都得到循环依赖错误
#[test]
fn test_concurrent_cyclic_singletons_report_cycle() {
    init_logging();
    let kernel = DefaultKernel::new();
    kernel.add_sub_resolver(Arc::new(SlowLookup {
        delay: Duration::from_millis(50),
    }));
    kernel
        .register_component(cyclic("a", "A", "B").lifestyle(Lifestyle::Singleton))
        .unwrap();
    kernel
        .register_component(cyclic("b", "B", "A").lifestyle(Lifestyle::Singleton))
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let (tx, rx) = mpsc::channel();
    for root in ["a", "b"] {
        let kernel = kernel.clone();
        let barrier = barrier.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            barrier.wait();
            let _ = tx.send((root, kernel.resolve(root)));
        });
    }
    drop(tx);

    for _ in 0..2 {
        let (root, result) = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("两个线程互相等待, 没有在超时前返回");
        match result {
            Err(KernelError::CircularDependency { path, .. }) => {
                assert_eq!(path.first().map(String::as_str), Some(root));
                assert!(path.len() >= 3, "环路径过短: {path:?}");
            }
            other => panic!("期望循环依赖错误, 实际: {other:?}"),
        }
    }

    // 失败的构造没有被缓存，单线程解析仍按解析栈报告循环
    assert!(matches!(
        kernel.resolve("a"),
        Err(KernelError::CircularDependency { .. })
    ));
}

fn pooled_kernel(timeout_ms: u64) -> DefaultKernel {
    DefaultKernel::with_settings(
        KernelConfig::default().with_pool_wait_timeout(Duration::from_millis(timeout_ms)),
    )
}

/// 测试容量为 2 的对象池：第三次请求超时
#[test]
fn test_pool_exhaustion_times_out() {
    let kernel = pooled_kernel(100);
    let created = counter();
    kernel
        .register_component(mail("pooled", Lifestyle::pooled_with(0, 2), &created))
        .unwrap();

    let first = kernel.resolve("pooled").unwrap();
    let second = kernel.resolve("pooled").unwrap();
    assert!(!first.ptr_eq(&second));

    match kernel.resolve("pooled") {
        Err(KernelError::PoolExhausted {
            key,
            max_size,
            waited_ms,
        }) => {
            assert_eq!(key, "pooled");
            assert_eq!(max_size, 2);
            assert!(waited_ms >= 100);
        }
        other => panic!("期望对象池耗尽, 实际: {other:?}"),
    }

    assert!(kernel.release(&first));
    assert!(kernel.resolve("pooled").unwrap().ptr_eq(&first));
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

/// 测试归还实例唤醒等待中的请求
#[test]
fn test_pool_release_unblocks_waiter() {
    let kernel = pooled_kernel(5_000);
    let created = counter();
    kernel
        .register_component(mail("pooled", Lifestyle::pooled_with(0, 2), &created))
        .unwrap();

    let first = kernel.resolve("pooled").unwrap();
    let _second = kernel.resolve("pooled").unwrap();

    let waiter = {
        let kernel = kernel.clone();
        thread::spawn(move || kernel.resolve("pooled"))
    };
    thread::sleep(Duration::from_millis(50));
    assert!(kernel.release(&first));

    let handed_over = waiter.join().unwrap().unwrap();
    assert!(handed_over.ptr_eq(&first));
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

/// 测试子内核委托父内核以及祖先环检查
#[test]
fn test_parent_delegation() {
    let parent = DefaultKernel::new();
    let created = counter();
    parent
        .register_component(mail("mail", Lifestyle::Singleton, &created))
        .unwrap();

    let child = DefaultKernel::new();
    child.set_parent(&parent).unwrap();
    child.register_component(spam(Lifestyle::Transient)).unwrap();

    let from_child = child
        .resolve("spam")
        .unwrap()
        .service::<dyn SpamService>()
        .unwrap();
    let from_parent = parent
        .resolve("mail")
        .unwrap()
        .service::<dyn MailSender>()
        .unwrap();
    assert!(Arc::ptr_eq(from_child.sender(), &from_parent));
    assert!(matches!(
        parent.resolve("spam"),
        Err(KernelError::ComponentNotFound { .. })
    ));

    assert!(matches!(
        parent.set_parent(&child),
        Err(KernelError::InvalidParent { .. })
    ));
    assert!(matches!(
        parent.set_parent(&parent),
        Err(KernelError::InvalidParent { .. })
    ));
}

/// 测试子内核中等待的处理器在父内核注册服务后就绪
#[test]
fn test_child_waiting_handler_becomes_valid() {
    let parent = DefaultKernel::new();
    let child = DefaultKernel::new();
    child.set_parent(&parent).unwrap();
    child.register_component(spam(Lifestyle::Singleton)).unwrap();
    assert_eq!(
        child.handler("spam").unwrap().state(),
        HandlerState::WaitingDependency
    );

    let created = counter();
    parent
        .register_component(mail("mail", Lifestyle::Singleton, &created))
        .unwrap();
    assert_eq!(child.handler("spam").unwrap().state(), HandlerState::Valid);
    assert!(child.resolve("spam").is_ok());
}

/// 测试邮件场景：共享单例，销毁时只执行一次销毁钩子
#[test]
fn test_mail_spam_scenario() {
    init_logging();
    let kernel = DefaultKernel::new();
    let created = counter();
    let destroyed = counter();
    let destroyed_hook = destroyed.clone();
    kernel
        .register_component(
            mail("mail", Lifestyle::Singleton, &created).on_destroy(move |_| {
                destroyed_hook.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();
    kernel.register_component(spam(Lifestyle::Transient)).unwrap();

    let first = kernel
        .resolve("spam")
        .unwrap()
        .service::<dyn SpamService>()
        .unwrap();
    let second = kernel
        .resolve_service(&spam_contract())
        .unwrap()
        .service::<dyn SpamService>()
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(first.sender(), second.sender()));
    assert_eq!(created.load(Ordering::SeqCst), 1);

    kernel.dispose();
    kernel.dispose();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert!(matches!(
        kernel.register_component(spam(Lifestyle::Transient)),
        Err(KernelError::KernelDisposed)
    ));
}

/// 测试并发解析单例只构造一次
#[test]
fn test_concurrent_singleton_resolution() {
    let kernel = DefaultKernel::new();
    let created = counter();
    let slow = created.clone();
    kernel
        .register_component(
            ComponentRegistration::for_service(mail_contract())
                .implemented_by(TypeInfo::of::<SmtpSender>())
                .named("slow")
                .lifestyle(Lifestyle::Singleton)
                .constructor(Vec::new(), move |_| {
                    slow.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    Ok(ComponentInstance::from_service::<dyn MailSender>(Arc::new(
                        SmtpSender {
                            server: "slow".to_string(),
                        },
                    )))
                }),
        )
        .unwrap();

    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let kernel = kernel.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                kernel.resolve("slow").unwrap()
            })
        })
        .collect();

    let instances: Vec<ComponentInstance> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| i.ptr_eq(&instances[0])));
}

/// 测试每线程生命周期
#[test]
fn test_per_thread_instances() {
    let kernel = DefaultKernel::new();
    let created = counter();
    kernel
        .register_component(mail("per-thread", Lifestyle::PerThread, &created))
        .unwrap();

    let main_first = kernel.resolve("per-thread").unwrap();
    let main_second = kernel.resolve("per-thread").unwrap();
    assert!(main_first.ptr_eq(&main_second));

    let other = {
        let kernel = kernel.clone();
        thread::spawn(move || {
            let a = kernel.resolve("per-thread").unwrap();
            let b = kernel.resolve("per-thread").unwrap();
            assert!(a.ptr_eq(&b));
            a
        })
        .join()
        .unwrap()
    };
    assert!(!other.ptr_eq(&main_first));
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

/// 测试销毁顺序与释放无操作
#[test]
fn test_disposal_order_and_release_no_op() {
    let kernel = DefaultKernel::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for key in ["db", "cache", "api"] {
        let order = order.clone();
        let name = key.to_string();
        kernel
            .register_component(mail(key, Lifestyle::Singleton, &counter()).on_destroy(
                move |_| {
                    order.lock().push(name.clone());
                    Ok(())
                },
            ))
            .unwrap();
        kernel.resolve(key).unwrap();
    }

    let api = kernel.resolve("api").unwrap();
    assert!(!kernel.release(&api));
    assert!(!kernel.release(&ComponentInstance::new("foreign")));
    assert!(order.lock().is_empty());

    kernel.dispose();
    assert_eq!(*order.lock(), vec!["api", "cache", "db"]);
}
