//! 内置模型贡献者

use kernel_abstractions::{ComponentModelDraft, InterceptorReference, Kernel, ModelContributor};
use microkernel_common::{ConfigNode, KernelError, KernelResult, Lifestyle, LifestyleKind};
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

/// 组件配置中的键
pub mod keys {
    /// 生命周期名称
    pub const LIFESTYLE: &str = "lifestyle";
    /// 自定义生命周期名称
    pub const CUSTOM_LIFESTYLE: &str = "customLifestyle";
    /// 池预热数量
    pub const INITIAL_POOL_SIZE: &str = "initialPoolSize";
    /// 池上限
    pub const MAX_POOL_SIZE: &str = "maxPoolSize";
    /// 拦截器键列表
    pub const INTERCEPTORS: &str = "interceptors";
    /// 是否自动启动
    pub const STARTABLE: &str = "startable";
    /// 参数表
    pub const PARAMETERS: &str = "parameters";
}

/// 从配置存储读取组件配置
pub struct ConfigurationContributor;

impl ConfigurationContributor {
    fn lifestyle_from(node: &ConfigNode, key: &str) -> KernelResult<Option<Lifestyle>> {
        let Some(name) = node.get_str(keys::LIFESTYLE) else {
            return Ok(None);
        };

        let lifestyle = match LifestyleKind::from_str(name)? {
            LifestyleKind::Custom => {
                let custom = node.get_str(keys::CUSTOM_LIFESTYLE).ok_or_else(|| {
                    KernelError::configuration(format!(
                        "组件 {key} 配置为 custom 生命周期, 但缺少 {}",
                        keys::CUSTOM_LIFESTYLE
                    ))
                })?;
                Lifestyle::custom(custom)
            }
            LifestyleKind::Pooled => Lifestyle::Pooled {
                initial_size: node.get_usize(keys::INITIAL_POOL_SIZE),
                max_size: node.get_usize(keys::MAX_POOL_SIZE),
            },
            other => other.to_lifestyle().unwrap_or(Lifestyle::Singleton),
        };
        Ok(Some(lifestyle))
    }
}

impl ModelContributor for ConfigurationContributor {
    fn name(&self) -> &str {
        "configuration"
    }

    fn process(&self, kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()> {
        let Some(node) = kernel.configuration_store().component_configuration(&draft.key) else {
            return Ok(());
        };
        debug!("组件 {} 使用外部配置", draft.key);

        if draft.lifestyle.is_none() {
            draft.lifestyle = Self::lifestyle_from(&node, &draft.key)?;
        }

        if let Some(Value::Object(parameters)) = node.get(keys::PARAMETERS) {
            for (name, value) in parameters {
                draft
                    .parameters
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        if node.get_bool(keys::STARTABLE) == Some(true) {
            draft.startable = true;
        }

        draft.configuration = Some(node);
        Ok(())
    }
}

/// 补齐默认生命周期并校验
pub struct LifestyleContributor;

impl ModelContributor for LifestyleContributor {
    fn name(&self) -> &str {
        "lifestyle"
    }

    fn process(&self, kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()> {
        let settings = kernel.settings();
        let lifestyle = draft.lifestyle.take().unwrap_or_else(|| {
            settings
                .default_lifestyle
                .to_lifestyle()
                .unwrap_or(Lifestyle::Singleton)
        });

        let lifestyle = match lifestyle {
            Lifestyle::Pooled {
                initial_size,
                max_size,
            } => {
                let initial = initial_size.unwrap_or(settings.default_pool_initial_size);
                let max = max_size.unwrap_or(settings.default_pool_max_size);
                if max == 0 {
                    return Err(KernelError::registration(&draft.key, "池上限必须大于 0"));
                }
                if initial > max {
                    return Err(KernelError::registration(
                        &draft.key,
                        format!("池预热数量 {initial} 超过上限 {max}"),
                    ));
                }
                Lifestyle::pooled_with(initial, max)
            }
            Lifestyle::Custom(name) => {
                if kernel.custom_lifestyle(&name).is_none() {
                    return Err(KernelError::configuration(format!(
                        "组件 {} 引用了未注册的自定义生命周期: {}",
                        draft.key, name
                    )));
                }
                Lifestyle::Custom(name)
            }
            other => other,
        };

        draft.lifestyle = Some(lifestyle);
        Ok(())
    }
}

/// 选择构造候选：必需服务依赖最少者胜出，相同时取先声明的
pub struct ConstructorContributor;

impl ModelContributor for ConstructorContributor {
    fn name(&self) -> &str {
        "constructor"
    }

    fn process(&self, _kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()> {
        let selected = draft
            .constructors
            .iter()
            .enumerate()
            .min_by_key(|(_, candidate)| candidate.required_service_count())
            .map(|(index, _)| index);

        match selected {
            Some(index) => {
                draft.selected_constructor = Some(index);
                draft.dependencies = draft.constructors[index].dependencies().to_vec();
            }
            None if draft.custom_activator.is_some() => {
                draft.selected_constructor = None;
                draft.dependencies.clear();
            }
            None => {
                return Err(KernelError::registration(
                    &draft.key,
                    "没有声明构造候选, 也没有自定义激活器",
                ))
            }
        }
        Ok(())
    }
}

/// 非自定义激活的组件，实现类型必须是具体类型
pub struct ImplementationContributor;

impl ModelContributor for ImplementationContributor {
    fn name(&self) -> &str {
        "implementation"
    }

    fn process(&self, _kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()> {
        if draft.custom_activator.is_none() && !draft.implementation.is_concrete() {
            return Err(KernelError::registration(
                &draft.key,
                format!("实现类型 {} 不是具体类型", draft.implementation.full_name()),
            ));
        }
        Ok(())
    }
}

/// 合并配置与扩展属性中的拦截器引用，保持顺序并去重
pub struct InterceptorContributor;

impl InterceptorContributor {
    fn references(value: Option<&Value>) -> impl Iterator<Item = InterceptorReference> + '_ {
        value
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(InterceptorReference::new)
    }
}

impl ModelContributor for InterceptorContributor {
    fn name(&self) -> &str {
        "interceptor"
    }

    fn process(&self, _kernel: &dyn Kernel, draft: &mut ComponentModelDraft) -> KernelResult<()> {
        let from_config: Vec<InterceptorReference> = Self::references(
            draft
                .configuration
                .as_ref()
                .and_then(|node| node.get(keys::INTERCEPTORS)),
        )
        .collect();
        let from_properties: Vec<InterceptorReference> =
            Self::references(draft.extended_properties.get(keys::INTERCEPTORS)).collect();

        for reference in from_config.into_iter().chain(from_properties) {
            if !draft.interceptors.contains(&reference) {
                draft.interceptors.push(reference);
            }
        }
        Ok(())
    }
}
