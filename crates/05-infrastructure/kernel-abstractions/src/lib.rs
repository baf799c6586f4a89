//! # Kernel Abstractions
//!
//! 组件内核的抽象层：组件模型、解析上下文，以及内核各协作者之间的 trait 接缝。
//!
//! ## 核心接口
//!
//! - [`Kernel`] - 内核查找与解析接口
//! - [`Handler`] - 单个组件的就绪状态机
//! - [`LifestyleManager`] - 实例缓存与复用策略
//! - [`DependencyResolver`] / [`SubDependencyResolver`] - 依赖解析链
//! - [`ModelContributor`] - 模型构建管道的一步
//! - [`ComponentActivator`] / [`ProxyFactory`] - 外部构造与包装协作者
//! - [`ConfigurationStore`] - 只读配置来源

pub mod activator;
pub mod configuration;
pub mod context;
pub mod contributor;
pub mod events;
pub mod handler;
pub mod kernel;
pub mod lifestyle;
pub mod model;
pub mod registration;
pub mod resolver;

pub use activator::*;
pub use configuration::*;
pub use context::*;
pub use contributor::*;
pub use events::*;
pub use handler::*;
pub use kernel::*;
pub use lifestyle::*;
pub use model::*;
pub use registration::*;
pub use resolver::*;
