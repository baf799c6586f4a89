//! 模型贡献者抽象接口

use crate::kernel::Kernel;
use crate::model::ComponentModelDraft;
use microkernel_common::KernelResult;

/// 模型贡献者 trait
///
/// 构建管道中的一步：检查组件模型草稿，可以读取或追加内容。
/// 返回错误会中止整个构建，不会向内核发布任何部分模型。
pub trait ModelContributor: Send + Sync {
    /// 贡献者名称
    fn name(&self) -> &str;

    /// 处理草稿
    fn process(&self, kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()>;
}
