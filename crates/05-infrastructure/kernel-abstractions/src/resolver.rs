//! 依赖解析器抽象接口
//!
//! 依赖解析器持有一条有序的子解析器链。第一个 `can_resolve` 返回 true 的子解析器胜出，
//! 其余候选不再被询问。

use crate::context::CreationContext;
use crate::kernel::Kernel;
use crate::model::{ComponentModel, DependencyModel};
use microkernel_common::{ComponentInstance, KernelResult};
use std::sync::Arc;

/// 子解析器 trait
pub trait SubDependencyResolver: Send + Sync {
    /// 子解析器名称
    fn name(&self) -> &str;

    /// 是否能解析该依赖
    fn can_resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> bool;

    /// 解析依赖
    fn resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> KernelResult<ComponentInstance>;
}

/// 依赖解析器 trait
pub trait DependencyResolver: Send + Sync {
    /// 追加子解析器，按注册顺序参与解析
    fn add_sub_resolver(&self, resolver: Arc<dyn SubDependencyResolver>);

    /// 是否能满足该依赖
    fn can_resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> bool;

    /// 解析依赖
    ///
    /// `Ok(None)` 表示可选依赖没有被满足且没有默认值；必需依赖无法满足时返回错误。
    fn resolve(
        &self,
        kernel: &dyn Kernel,
        context: &CreationContext,
        model: &ComponentModel,
        dependency: &DependencyModel,
    ) -> KernelResult<Option<ComponentInstance>>;
}
