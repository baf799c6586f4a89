//! 配置存储抽象接口

use microkernel_common::ConfigNode;

/// 配置存储 trait
///
/// 只读的键 → 配置树查找，内核把它当作已解析配置的外部来源。
pub trait ConfigurationStore: Send + Sync {
    /// 获取组件配置
    fn component_configuration(&self, key: &str) -> Option<ConfigNode>;

    /// 获取扩展设施配置
    fn facility_configuration(&self, key: &str) -> Option<ConfigNode>;
}
