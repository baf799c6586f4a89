//! 组件模型构建管道

use crate::contributors::{
    ConfigurationContributor, ConstructorContributor, ImplementationContributor,
    InterceptorContributor, LifestyleContributor,
};
use kernel_abstractions::{ComponentModel, ComponentModelDraft, Kernel, ModelContributor};
use microkernel_common::KernelResult;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// 默认模型构建器
///
/// 内置贡献者的顺序固定：
///
/// 1. [`ConfigurationContributor`] 附加配置节点、参数、启动标记，配置中的生命周期只在未显式指定时生效
/// 2. [`LifestyleContributor`] 补齐默认生命周期并校验池大小与自定义生命周期名称（依赖第 1 步）
/// 3. [`ConstructorContributor`] 选出构造候选并写入依赖列表
/// 4. [`ImplementationContributor`] 校验实现类型（依赖第 3 步的激活方式）
/// 5. [`InterceptorContributor`] 合并配置与属性中的拦截器引用
///
/// 通过 [`DefaultComponentModelBuilder::add_contributor`] 追加的贡献者排在内置贡献者之后，
/// 看到的是已经完成上述处理的草稿。
pub struct DefaultComponentModelBuilder {
    contributors: RwLock<Vec<Arc<dyn ModelContributor>>>,
}

impl DefaultComponentModelBuilder {
    /// 创建带内置贡献者的构建器
    pub fn new() -> Self {
        let contributors: Vec<Arc<dyn ModelContributor>> = vec![
            Arc::new(ConfigurationContributor),
            Arc::new(LifestyleContributor),
            Arc::new(ConstructorContributor),
            Arc::new(ImplementationContributor),
            Arc::new(InterceptorContributor),
        ];
        Self {
            contributors: RwLock::new(contributors),
        }
    }

    /// 追加贡献者
    pub fn add_contributor(&self, contributor: Arc<dyn ModelContributor>) {
        debug!("添加模型贡献者: {}", contributor.name());
        self.contributors.write().push(contributor);
    }

    /// 当前贡献者名称，按执行顺序
    pub fn contributor_names(&self) -> Vec<String> {
        self.contributors
            .read()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// 运行管道并冻结模型；任一贡献者失败时不产生模型
    pub fn build(
        &self,
        kernel: &dyn Kernel,
        mut draft: ComponentModelDraft,
    ) -> KernelResult<ComponentModel> {
        let contributors = self.contributors.read().clone();
        for contributor in &contributors {
            contributor.process(kernel, &mut draft)?;
        }
        let model = draft.freeze()?;
        debug!(
            component = model.key(),
            lifestyle = %model.lifestyle(),
            dependencies = model.dependencies().len(),
            "组件模型构建完成"
        );
        Ok(model)
    }
}

impl Default for DefaultComponentModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefaultComponentModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultComponentModelBuilder")
            .field("contributors", &self.contributor_names())
            .finish()
    }
}
