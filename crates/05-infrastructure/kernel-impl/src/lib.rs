//! # Kernel Implementation
//!
//! 组件内核的具体实现：注册表、处理器状态机、生命周期管理器、模型构建管道与依赖解析链。
//!
//! ## 主要类型
//!
//! - [`DefaultKernel`] - 内核入口：注册、解析、释放、事件、父子内核
//! - [`DefaultHandler`] - 单个组件的就绪状态机
//! - [`lifestyle`] - Transient / Singleton / PerThread / Pooled 生命周期管理器
//! - [`DefaultComponentModelBuilder`] - 模型构建管道与内置贡献者
//! - [`DefaultDependencyResolver`] - 依赖解析链与内置子解析器
//! - [`DefaultConfigurationStore`] - 内存配置存储
//! - [`Facility`] / [`StartableFacility`] - 扩展设施

pub mod activator;
pub mod configuration;
pub mod contributors;
pub mod events;
pub mod facility;
pub mod handler;
pub mod kernel;
pub mod lifestyle;
pub mod model_builder;
pub mod resolver;
pub mod sub_resolvers;
mod tracking;

pub use activator::{DefaultComponentActivator, DefaultInstanceFactory};
pub use configuration::DefaultConfigurationStore;
pub use events::EventBus;
pub use facility::{Facility, StartableFacility};
pub use handler::DefaultHandler;
pub use kernel::{DefaultKernel, WeakKernel};
pub use model_builder::DefaultComponentModelBuilder;
pub use resolver::DefaultDependencyResolver;
pub use sub_resolvers::{CollectionResolver, ParameterResolver};

#[cfg(test)]
mod tests;
