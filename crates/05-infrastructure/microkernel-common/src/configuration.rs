//! 配置相关的基础定义
//!
//! [`ConfigNode`] 是配置存储返回的只读配置树；[`KernelConfig`] 是内核自身的设置。

use crate::errors::{ConfigError, ConfigResult};
use crate::lifecycle::LifestyleKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "MICROKERNEL";

/// 只读配置节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    value: Value,
}

impl ConfigNode {
    /// 从 JSON 值创建配置节点
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// 原始值
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// 按点分路径获取子值，例如 `parameters.host`
    ///
    /// 键名先精确匹配，再忽略大小写匹配（部分配置源会把键名转成小写）。
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.value, |current, segment| {
                let object = current.as_object()?;
                object.get(segment).or_else(|| {
                    object
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                        .map(|(_, value)| value)
                })
            })
    }

    /// 获取子节点
    pub fn child(&self, path: &str) -> Option<ConfigNode> {
        self.get(path).cloned().map(ConfigNode::new)
    }

    /// 获取字符串值
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// 获取布尔值，兼容 "true"/"false" 字符串
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        match self.get(path)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 获取非负整数值，兼容数字字符串
    pub fn get_usize(&self, path: &str) -> Option<usize> {
        match self.get(path)? {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 绑定到具体类型
    pub fn bind<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        serde_json::from_value(self.value.clone()).map_err(ConfigError::from)
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// 内核设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// 组件未声明生命周期时采用的默认值
    pub default_lifestyle: LifestyleKind,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 对象池已满时等待归还的最长时间（毫秒）
    pub pool_wait_timeout_ms: u64,
    /// 池化组件默认预热数量
    pub default_pool_initial_size: usize,
    /// 池化组件默认上限
    pub default_pool_max_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            default_lifestyle: LifestyleKind::Singleton,
            max_resolution_depth: 100,
            pool_wait_timeout_ms: 5000,
            default_pool_initial_size: 5,
            default_pool_max_size: 15,
        }
    }
}

impl KernelConfig {
    /// 从配置文件和 `MICROKERNEL_` 前缀的环境变量加载 `kernel` 配置节
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));
        Self::from_sources(builder)
    }

    /// 从已准备好的配置源构建
    pub fn from_sources(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ConfigResult<Self> {
        let settings = builder.build()?;
        match settings.get::<KernelConfig>("kernel") {
            Ok(config) => config.validated(),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// 对象池等待时间
    pub fn pool_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_wait_timeout_ms)
    }

    /// 设置默认生命周期
    pub fn with_default_lifestyle(mut self, lifestyle: LifestyleKind) -> Self {
        self.default_lifestyle = lifestyle;
        self
    }

    /// 设置对象池等待时间
    pub fn with_pool_wait_timeout(mut self, timeout: Duration) -> Self {
        self.pool_wait_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    fn validated(self) -> ConfigResult<Self> {
        if self.default_lifestyle == LifestyleKind::Custom {
            return Err(ConfigError::TypeConversionError {
                message: "默认生命周期不能是 custom".to_string(),
            });
        }
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::TypeConversionError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        if self.default_pool_max_size == 0
            || self.default_pool_initial_size > self.default_pool_max_size
        {
            return Err(ConfigError::TypeConversionError {
                message: format!(
                    "默认池大小无效: initial={}, max={}",
                    self.default_pool_initial_size, self.default_pool_max_size
                ),
            });
        }
        Ok(self)
    }
}
