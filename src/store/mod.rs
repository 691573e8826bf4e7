//! 设置存储模块
//!
//! 定义设置行的持久化存储接口与SQLite、内存两种实现

pub mod memory;
pub mod row;
pub mod sqlite;

// 重新导出主要类型
pub use memory::MemorySettingsStore;
pub use row::{NewSetting, SectionChanges, SettingRow};
pub use sqlite::SqliteSettingsStore;

use crate::error::Result;
use async_trait::async_trait;

/// 设置存储trait，定义行级CRUD接口
///
/// 实现者必须保证`apply_changes`的原子性：一组变更要么全部生效，
/// 要么全部不生效，失败时存储内容保持不变
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// 确保后端存储已创建并完成初始化
    async fn ensure_initialized(&self) -> Result<()>;

    /// 加载所有设置行
    async fn load_all(&self) -> Result<Vec<SettingRow>>;

    /// 加载指定节的所有设置行
    ///
    /// # 参数
    /// * `section` - 节名
    async fn load_section(&self, section: &str) -> Result<Vec<SettingRow>>;

    /// 以单个事务提交一组插入/更新/删除
    ///
    /// # 参数
    /// * `changes` - 对单个节的变更集
    async fn apply_changes(&self, changes: &SectionChanges) -> Result<()>;
}
