//! 默认配置存储

use kernel_abstractions::ConfigurationStore;
use microkernel_common::{ConfigNode, ConfigResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// 内存中的配置存储
///
/// 可以逐项添加，也可以从 `config::Config` 的 `components.<key>` 与 `facilities.<key>` 节加载。
#[derive(Debug, Default)]
pub struct DefaultConfigurationStore {
    components: RwLock<HashMap<String, ConfigNode>>,
    facilities: RwLock<HashMap<String, ConfigNode>>,
}

impl DefaultConfigurationStore {
    /// 创建空的配置存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已构建的配置加载
    pub fn from_config(config: &config::Config) -> ConfigResult<Self> {
        let store = Self::new();
        for (key, value) in read_section(config, "components")? {
            store.add_component_configuration(key, value);
        }
        for (key, value) in read_section(config, "facilities")? {
            store.add_facility_configuration(key, value);
        }
        Ok(store)
    }

    /// 添加组件配置
    pub fn add_component_configuration(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!("添加组件配置: {}", key);
        self.components.write().insert(key, ConfigNode::new(value));
    }

    /// 添加扩展设施配置
    pub fn add_facility_configuration(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!("添加扩展设施配置: {}", key);
        self.facilities.write().insert(key, ConfigNode::new(value));
    }

    /// 组件配置数量
    pub fn component_count(&self) -> usize {
        self.components.read().len()
    }
}

impl ConfigurationStore for DefaultConfigurationStore {
    fn component_configuration(&self, key: &str) -> Option<ConfigNode> {
        self.components.read().get(key).cloned()
    }

    fn facility_configuration(&self, key: &str) -> Option<ConfigNode> {
        self.facilities.read().get(key).cloned()
    }
}

fn read_section(config: &config::Config, section: &str) -> ConfigResult<HashMap<String, Value>> {
    match config.get::<HashMap<String, Value>>(section) {
        Ok(entries) => Ok(entries),
        Err(config::ConfigError::NotFound(_)) => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}
