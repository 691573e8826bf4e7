//! 固定内容配置源

use crate::layered::ConfigSource;
use async_trait::async_trait;
use std::collections::HashMap;

/// 固定内容的内存配置源，内容在构造后不再变化
///
/// 用于测试和程序内置默认值
pub struct StaticSource {
    /// 配置源名称
    name: String,
    /// 扁平键值表
    data: HashMap<String, String>,
}

impl StaticSource {
    /// 创建固定内容配置源
    ///
    /// # 参数
    /// * `name` - 配置源名称
    /// * `data` - 扁平键值表
    pub fn new(name: impl Into<String>, data: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[async_trait]
impl ConfigSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    async fn snapshot(&self) -> HashMap<String, String> {
        self.data.clone()
    }
}
