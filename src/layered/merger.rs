//! 分层配置合并器
//!
//! 按注册顺序合并多个配置源为一个逻辑视图，后注册的源覆盖先注册的源

use crate::error::{ConfigStoreError, Result};
use crate::flat::{unflatten, SettingsObject};
use crate::layered::ConfigSource;
use crate::provider::{DynamicProvider, SettingsChangeEvent};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// 分层配置
///
/// 解析按注册顺序逆向扫描，命中的第一个源生效，即后注册的源优先；
/// 合并总是针对各源的当前内容，源重载后下一次读取即可见
pub struct LayeredConfig {
    /// 配置源列表，按注册顺序
    sources: Vec<Arc<dyn ConfigSource>>,
    /// 动态提供器（写入口），同时也注册为配置源
    provider: Option<Arc<DynamicProvider>>,
}

impl LayeredConfig {
    /// 创建空的分层配置
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            provider: None,
        }
    }

    /// 注册一个配置源，后注册的源优先级更高
    ///
    /// # 参数
    /// * `source` - 配置源
    pub fn add_source(&mut self, source: Arc<dyn ConfigSource>) {
        debug!("注册配置源: {}", source.name());
        self.sources.push(source);
    }

    /// 注册动态提供器，既作为配置源也作为对账写入口
    ///
    /// # 参数
    /// * `provider` - 动态提供器
    pub fn add_provider(&mut self, provider: Arc<DynamicProvider>) {
        debug!("注册动态提供器");
        self.sources.push(provider.clone());
        self.provider = Some(provider);
    }

    /// 已注册的配置源数量
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 解析扁平键，返回最后一个定义该键的源的值
    ///
    /// # 参数
    /// * `key` - 扁平键
    pub async fn resolve(&self, key: &str) -> Option<String> {
        for source in self.sources.iter().rev() {
            if let Some(value) = source.get(key).await {
                return Some(value);
            }
        }
        None
    }

    /// 所有源按注册顺序合并后的完整视图
    pub async fn merged_snapshot(&self) -> HashMap<String, String> {
        let mut merged = HashMap::new();
        for source in &self.sources {
            merged.extend(source.snapshot().await);
        }
        merged
    }

    /// 读取指定节并还原为设置对象
    ///
    /// 收集合并视图中`节名:`前缀下的全部键，去掉前缀后还原；
    /// 节不存在时返回全默认值对象
    ///
    /// # 参数
    /// * `section` - 节名
    pub async fn get_section<T: SettingsObject>(&self, section: &str) -> Result<T> {
        let prefix = format!("{section}:");
        let merged = self.merged_snapshot().await;

        let sub: BTreeMap<String, String> = merged
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_string(), value))
            })
            .collect();

        unflatten(&sub)
    }

    /// 以类型自身的节名读取设置对象
    pub async fn get<T: SettingsObject>(&self) -> Result<T> {
        self.get_section(T::section_name()).await
    }

    /// 将设置对象对账写入动态提供器的指定节
    ///
    /// # 参数
    /// * `section` - 节名
    /// * `value` - 设置对象
    pub async fn reconcile_section<T: SettingsObject>(
        &self,
        section: &str,
        value: &T,
    ) -> Result<()> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            ConfigStoreError::InvalidArgument("未注册动态提供器，无法写入".to_string())
        })?;
        provider.reconcile_section(section, value).await
    }

    /// 以类型自身的节名对账写入
    pub async fn reconcile<T: SettingsObject>(&self, value: &T) -> Result<()> {
        self.reconcile_section(T::section_name(), value).await
    }

    /// 订阅动态提供器的变更通知
    pub fn subscribe(&self) -> Option<broadcast::Receiver<SettingsChangeEvent>> {
        self.provider.as_ref().map(|p| p.subscribe())
    }

    /// 调试视图：按键排序列出合并结果及每个键的生效来源
    pub async fn debug_view(&self) -> String {
        let merged = self.merged_snapshot().await;
        let mut keys: Vec<&String> = merged.keys().collect();
        keys.sort();

        let mut view = String::new();
        for key in keys {
            let mut origin = "";
            for source in self.sources.iter().rev() {
                if source.get(key).await.is_some() {
                    origin = source.name();
                    break;
                }
            }
            let _ = writeln!(view, "{} = {} ({})", key, merged[key], origin);
        }
        view
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::new()
    }
}
