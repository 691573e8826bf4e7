//! SQLite设置存储实现
//!
//! 基于sqlx的SQLite后端，表结构在首次初始化时自动创建，
//! 所有写入在单个事务中提交

use crate::error::Result;
use crate::store::row::{SectionChanges, SettingRow};
use crate::store::SettingsStore;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

/// SQLite设置存储
pub struct SqliteSettingsStore {
    /// 连接池
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// 打开指定路径的设置数据库，文件不存在时自动创建
    ///
    /// # 参数
    /// * `path` - 数据库文件路径
    ///
    /// # 返回
    /// * `Result<Self>` - 存储实例
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        debug!("设置数据库已打开: {}", path.as_ref().display());
        Ok(Self { pool })
    }

    /// 打开进程内临时数据库（仅用于测试）
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);

        // 内存库按连接隔离，必须限制为单连接
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// 从现有连接池创建
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// 将查询结果行转换为设置行
fn read_row(row: &SqliteRow) -> SettingRow {
    SettingRow {
        id: row.get("id"),
        section: row.get("section"),
        name: row.get("name"),
        value: row.get("value"),
        encrypted: row.get("encrypted"),
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn ensure_initialized(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                id integer PRIMARY KEY AUTOINCREMENT,
                section text NOT NULL,
                name text NOT NULL,
                value text NOT NULL,
                encrypted integer NOT NULL DEFAULT 0,
                UNIQUE(section, name)
            )",
        )
        .execute(&self.pool)
        .await?;

        debug!("设置表初始化完成");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SettingRow>> {
        let rows = sqlx::query("SELECT id, section, name, value, encrypted FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(read_row).collect())
    }

    async fn load_section(&self, section: &str) -> Result<Vec<SettingRow>> {
        let rows = sqlx::query(
            "SELECT id, section, name, value, encrypted FROM settings WHERE section = ?",
        )
        .bind(section)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(read_row).collect())
    }

    async fn apply_changes(&self, changes: &SectionChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // 单事务提交，任何语句失败时整个事务回滚
        let mut tx = self.pool.begin().await?;

        for insert in &changes.inserts {
            sqlx::query(
                "INSERT INTO settings (section, name, value, encrypted) VALUES (?, ?, ?, ?)",
            )
            .bind(&changes.section)
            .bind(&insert.name)
            .bind(&insert.value)
            .bind(insert.encrypted)
            .execute(&mut *tx)
            .await?;
        }

        for (id, value) in &changes.updates {
            sqlx::query("UPDATE settings SET value = ? WHERE id = ?")
                .bind(value)
                .bind(*id)
                .execute(&mut *tx)
                .await?;
        }

        for id in &changes.deletes {
            sqlx::query("DELETE FROM settings WHERE id = ?")
                .bind(*id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            "节 {} 变更已提交: 新增{} 更新{} 删除{}",
            changes.section,
            changes.inserts.len(),
            changes.updates.len(),
            changes.deletes.len()
        );
        Ok(())
    }
}
