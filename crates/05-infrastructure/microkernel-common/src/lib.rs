//! # MicroKernel Common
//!
//! 组件内核各 crate 共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 服务与实现的类型身份
//! - [`ComponentInstance`] - 类型擦除的组件实例
//! - [`Lifestyle`] / [`HandlerState`] - 生命周期与处理器状态
//! - [`KernelError`] - 内核错误分类
//! - [`ConfigNode`] / [`KernelConfig`] - 配置树与内核设置
//!
//! ## 设计原则
//!
//! - 不依赖运行时反射，类型只作为可比较的身份
//! - 没有进程级全局状态，内核由应用显式创建和销毁

pub mod component;
pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use logging::*;
pub use metadata::*;
