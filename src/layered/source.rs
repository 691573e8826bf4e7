//! 配置源trait定义

use async_trait::async_trait;
use std::collections::HashMap;

/// 配置源trait，向合并器提供扁平键值数据
///
/// 一个配置源就是一张`节:字段路径 → 文本值`的扁平表，
/// 查询总是针对源的当前内容（支持热重载的源在重载后即生效）
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// 配置源名称，用于日志与调试视图
    fn name(&self) -> &str;

    /// 查询单个扁平键的当前值
    ///
    /// # 参数
    /// * `key` - 扁平键
    ///
    /// # 返回
    /// * `Option<String>` - 值，未定义该键时为None
    async fn get(&self, key: &str) -> Option<String>;

    /// 当前内容的完整快照
    async fn snapshot(&self) -> HashMap<String, String>;
}
