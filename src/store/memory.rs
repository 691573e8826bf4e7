//! 内存设置存储实现
//!
//! 进程内的参考实现，完整模拟`apply_changes`的事务语义，
//! 主要用于测试和无持久化需求的小型场景

use crate::error::{ConfigStoreError, Result};
use crate::store::row::{SectionChanges, SettingRow};
use crate::store::SettingsStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

/// 内存设置存储
pub struct MemorySettingsStore {
    /// 设置行，锁内变更保证原子性
    rows: Mutex<Vec<SettingRow>>,
    /// 下一个行ID
    next_id: AtomicI64,
    /// 测试辅助：置位后下一次提交失败且不产生任何变更
    fail_next_commit: AtomicBool,
}

impl MemorySettingsStore {
    /// 创建空的内存存储
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// 测试辅助：使下一次`apply_changes`提交失败
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// 当前行数
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn ensure_initialized(&self) -> Result<()> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SettingRow>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn load_section(&self, section: &str) -> Result<Vec<SettingRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.section == section)
            .cloned()
            .collect())
    }

    async fn apply_changes(&self, changes: &SectionChanges) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(ConfigStoreError::StorageUnavailable(
                "模拟存储故障".to_string(),
            ));
        }

        let mut rows = self.rows.lock().unwrap();

        // 先校验全部变更，再统一变更，保证全有或全无
        for (id, _) in &changes.updates {
            if !rows.iter().any(|row| row.id == *id) {
                return Err(ConfigStoreError::StorageUnavailable(format!(
                    "更新的行不存在: {id}"
                )));
            }
        }
        for id in &changes.deletes {
            if !rows.iter().any(|row| row.id == *id) {
                return Err(ConfigStoreError::StorageUnavailable(format!(
                    "删除的行不存在: {id}"
                )));
            }
        }
        for insert in &changes.inserts {
            let duplicate = rows
                .iter()
                .any(|row| row.section == changes.section && row.name == insert.name);
            if duplicate {
                return Err(ConfigStoreError::StorageUnavailable(format!(
                    "行已存在: {}:{}",
                    changes.section, insert.name
                )));
            }
        }

        for (id, value) in &changes.updates {
            if let Some(row) = rows.iter_mut().find(|row| row.id == *id) {
                row.value = value.clone();
            }
        }

        rows.retain(|row| !changes.deletes.contains(&row.id));

        for insert in &changes.inserts {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            rows.push(SettingRow {
                id,
                section: changes.section.clone(),
                name: insert.name.clone(),
                value: insert.value.clone(),
                encrypted: insert.encrypted,
            });
        }

        Ok(())
    }
}
