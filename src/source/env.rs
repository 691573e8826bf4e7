//! 环境变量配置源
//!
//! 采集带指定前缀的环境变量，`__`分隔符映射为扁平键的冒号

use crate::layered::ConfigSource;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// 环境变量配置源
///
/// 内容在构造时一次性采集，如`APP__Email__Host=smtp.example.com`
/// （前缀为`APP`时）映射为`Email:Host`
pub struct EnvSource {
    /// 配置源名称
    name: String,
    /// 采集到的扁平键值表
    data: HashMap<String, String>,
}

impl EnvSource {
    /// 采集以`{prefix}__`开头的环境变量
    ///
    /// # 参数
    /// * `prefix` - 变量名前缀（不含分隔符）
    pub fn with_prefix(prefix: &str) -> Self {
        let marker = format!("{prefix}__");
        let mut data = HashMap::new();

        for (key, value) in std::env::vars() {
            if let Some(rest) = key.strip_prefix(&marker) {
                if rest.is_empty() {
                    continue;
                }
                let flat_key = rest.replace("__", ":");
                data.insert(flat_key, value);
            }
        }

        debug!("环境变量配置源采集完成，前缀{}，共{}条", prefix, data.len());

        Self {
            name: format!("env:{prefix}"),
            data,
        }
    }
}

#[async_trait]
impl ConfigSource for EnvSource {
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
