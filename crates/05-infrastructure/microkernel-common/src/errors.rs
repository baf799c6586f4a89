//! 错误类型定义

use thiserror::Error;

/// 装箱的底层错误，用于承载组件自身代码（工厂、钩子、激活器）抛出的失败
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },

    #[error("日志系统初始化失败: {message}")]
    LoggingInitFailed { message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        match source {
            config::ConfigError::NotFound(key) => Self::KeyNotFound { key },
            other => Self::ParseError {
                source: Box::new(other),
            },
        }
    }
}

/// 内核错误类型
///
/// 前五个变体与容器的异常分类一一对应，其余变体细化了解析期的失败原因。
/// 所有错误都同步返回给 `register_component` / `resolve` 的调用方，内核不做自动重试。
#[derive(Error, Debug)]
pub enum KernelError {
    /// 重复的键，或模型构建阶段某个贡献者拒绝了组件描述
    #[error("组件注册失败: {key}, 原因: {message}")]
    ComponentRegistration { key: String, message: String },

    /// 本内核及其父内核链上都找不到目标组件
    #[error("组件未找到: {target}")]
    ComponentNotFound { target: String },

    /// 组件自身的键再次出现在解析栈上
    #[error("检测到循环依赖: {key}, 解析路径: {}", path.join(" -> "))]
    CircularDependency { key: String, path: Vec<String> },

    /// 激活器（组件自身代码）在构造或销毁阶段失败
    #[error("组件处理失败: {key}, 原因: {message}")]
    Handler {
        key: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// 生命周期或自定义类型的装配无效
    #[error("组件配置无效: {message}")]
    Configuration { message: String },

    /// 处理器仍处于 WaitingDependency 状态
    #[error("组件 {key} 的依赖尚未满足: {}", pending.join(", "))]
    DependenciesUnsatisfied { key: String, pending: Vec<String> },

    /// 对象池已满且在限定时间内没有实例归还
    #[error("对象池已耗尽: {key}, 上限 {max_size}, 等待 {waited_ms}ms")]
    PoolExhausted {
        key: String,
        max_size: usize,
        waited_ms: u64,
    },

    /// 解析深度超过 `KernelConfig::max_resolution_depth`
    #[error("解析深度超过上限 {max_depth}: {}", path.join(" -> "))]
    ResolutionDepthExceeded { max_depth: usize, path: Vec<String> },

    /// 父内核关系会形成环
    #[error("无效的父内核: {message}")]
    InvalidParent { message: String },

    /// 处理器已进入终止状态 Invalid
    #[error("组件处理器已失效: {key}")]
    HandlerInvalid { key: String },

    /// 内核已被销毁
    #[error("内核已销毁")]
    KernelDisposed,
}

impl KernelError {
    /// 创建注册错误
    pub fn registration(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ComponentRegistration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// 创建组件未找到错误
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::ComponentNotFound {
            target: target.into(),
        }
    }

    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// 包装组件自身代码抛出的错误
    pub fn handler(key: impl Into<String>, message: impl Into<String>, source: BoxError) -> Self {
        Self::Handler {
            key: key.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// 是否为组件自身代码的失败（而非容器机制本身）
    pub fn is_component_failure(&self) -> bool {
        matches!(self, Self::Handler { source: Some(_), .. })
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type KernelResult<T> = Result<T, KernelError>;
