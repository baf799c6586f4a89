//! 组件生命周期（Lifestyle）与处理器状态

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::KernelError;

/// 组件生命周期类型
///
/// 决定同一组件的实例如何被缓存与复用。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lifestyle {
    /// 瞬时模式 - 每次解析都创建新实例
    Transient,
    /// 单例模式 - 处理器生命周期内只创建一个实例
    Singleton,
    /// 线程模式 - 每个调用线程一个实例
    PerThread,
    /// 池化模式 - 有上限的可复用实例集合，`None` 表示采用内核默认值
    Pooled {
        initial_size: Option<usize>,
        max_size: Option<usize>,
    },
    /// 自定义模式 - 按名称引用在内核中注册的生命周期管理器工厂
    Custom(String),
}

impl Lifestyle {
    /// 使用默认池大小的池化模式
    pub fn pooled() -> Self {
        Self::Pooled {
            initial_size: None,
            max_size: None,
        }
    }

    /// 指定池大小的池化模式
    pub fn pooled_with(initial_size: usize, max_size: usize) -> Self {
        Self::Pooled {
            initial_size: Some(initial_size),
            max_size: Some(max_size),
        }
    }

    /// 自定义模式
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// 对应的生命周期种类
    pub fn kind(&self) -> LifestyleKind {
        match self {
            Self::Transient => LifestyleKind::Transient,
            Self::Singleton => LifestyleKind::Singleton,
            Self::PerThread => LifestyleKind::PerThread,
            Self::Pooled { .. } => LifestyleKind::Pooled,
            Self::Custom(_) => LifestyleKind::Custom,
        }
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "custom({name})"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// 生命周期种类（不带参数），用于配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifestyleKind {
    Transient,
    Singleton,
    #[serde(alias = "per_thread", alias = "thread")]
    PerThread,
    Pooled,
    Custom,
}

impl Default for LifestyleKind {
    fn default() -> Self {
        Self::Singleton
    }
}

impl LifestyleKind {
    /// 转换为不带参数的生命周期；自定义模式需要名称，因此不能直接转换
    pub fn to_lifestyle(self) -> Option<Lifestyle> {
        match self {
            Self::Transient => Some(Lifestyle::Transient),
            Self::Singleton => Some(Lifestyle::Singleton),
            Self::PerThread => Some(Lifestyle::PerThread),
            Self::Pooled => Some(Lifestyle::pooled()),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for LifestyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transient => "transient",
            Self::Singleton => "singleton",
            Self::PerThread => "perthread",
            Self::Pooled => "pooled",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for LifestyleKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transient" => Ok(Self::Transient),
            "singleton" => Ok(Self::Singleton),
            "perthread" | "per_thread" | "thread" => Ok(Self::PerThread),
            "pooled" | "pool" => Ok(Self::Pooled),
            "custom" => Ok(Self::Custom),
            other => Err(KernelError::configuration(format!("未知的生命周期: {other}"))),
        }
    }
}

/// 处理器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerState {
    /// 可以立即解析
    Valid,
    /// 等待一个或多个服务依赖被注册
    WaitingDependency,
    /// 终止状态，只能通过显式失败或销毁进入
    Invalid,
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "Valid",
            Self::WaitingDependency => "WaitingDependency",
            Self::Invalid => "Invalid",
        };
        f.write_str(name)
    }
}
