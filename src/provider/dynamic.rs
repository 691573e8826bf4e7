//! 动态配置提供器
//!
//! 将设置存储的全部行加载为内存扁平表（`section:name → value`），
//! 支持按节的差量对账写回与变更通知

use crate::error::{ConfigStoreError, Result};
use crate::flat::{flatten, SettingsObject};
use crate::layered::ConfigSource;
use crate::store::{NewSetting, SectionChanges, SettingsStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

/// 配置变更通知
#[derive(Debug, Clone)]
pub struct SettingsChangeEvent {
    /// 配置版本号，每次成功重载递增
    pub version: u64,
    /// 变更时间
    pub timestamp: Instant,
}

/// 动态配置提供器
pub struct DynamicProvider {
    /// 设置存储
    store: Arc<dyn SettingsStore>,
    /// 内存扁平表
    data: Arc<RwLock<HashMap<String, String>>>,
    /// 配置版本号
    version: Arc<RwLock<u64>>,
    /// 变更通知发送器
    update_sender: broadcast::Sender<SettingsChangeEvent>,
    /// 对账写入互斥锁
    write_lock: Mutex<()>,
}

impl DynamicProvider {
    /// 创建新的动态配置提供器
    ///
    /// 创建后需调用`load(false)`完成首次加载
    ///
    /// # 参数
    /// * `store` - 设置存储
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        let (update_sender, _) = broadcast::channel(32);

        Self {
            store,
            data: Arc::new(RwLock::new(HashMap::new())),
            version: Arc::new(RwLock::new(0)),
            update_sender,
            write_lock: Mutex::new(()),
        }
    }

    /// 订阅配置变更通知
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsChangeEvent> {
        self.update_sender.subscribe()
    }

    /// 从存储加载全部设置行并整体重建内存扁平表
    ///
    /// 设置存储预期规模很小（应用设置而非通用数据库），
    /// 因此每次全量重建而非增量修补
    ///
    /// # 参数
    /// * `is_reload` - 首次加载传false，会先初始化存储；
    ///   重载传true，重建后递增版本号并发送变更通知
    pub async fn load(&self, is_reload: bool) -> Result<()> {
        if !is_reload {
            self.store.ensure_initialized().await?;
        }

        let rows = self.store.load_all().await?;

        // 先完整构建新表再整体替换，并发读取方只会看到旧表或新表
        let mut new_data = HashMap::with_capacity(rows.len());
        for row in &rows {
            new_data.insert(row.flat_key(), row.value.clone());
        }

        {
            let mut data = self.data.write().await;
            *data = new_data;
        }

        debug!("设置加载完成，共{}条", rows.len());

        if is_reload {
            let new_version = {
                let mut version = self.version.write().await;
                *version += 1;
                *version
            };

            let notification = SettingsChangeEvent {
                version: new_version,
                timestamp: Instant::now(),
            };

            // 没有订阅者时发送失败属正常情况
            let _ = self.update_sender.send(notification);

            info!("设置重载完成，版本: {}", new_version);
        }

        Ok(())
    }

    /// 查询扁平键对应的当前值，只读内存表，不访问存储
    pub async fn lookup(&self, key: &str) -> Option<String> {
        self.data.read().await.get(key).cloned()
    }

    /// 当前配置版本号
    pub async fn version(&self) -> u64 {
        *self.version.read().await
    }

    /// 将设置对象对账写入指定节
    ///
    /// 扁平化后与该节现有行做差量：键匹配的行原地更新（值相同则跳过），
    /// 多出的键插入新行，不再出现的行删除（对应字段回到了默认值）。
    /// 全部变更在一个事务中提交，失败时存储与内存表均保持原状；
    /// 成功后整体重载并发送变更通知。
    ///
    /// # 参数
    /// * `section` - 节名
    /// * `value` - 设置对象
    pub async fn reconcile_section<T: SettingsObject>(
        &self,
        section: &str,
        value: &T,
    ) -> Result<()> {
        if section.is_empty() {
            return Err(ConfigStoreError::InvalidArgument(
                "节名不能为空".to_string(),
            ));
        }
        if section.contains(':') {
            return Err(ConfigStoreError::InvalidArgument(format!(
                "节名不能包含冒号: {section}"
            )));
        }

        let desired = flatten(value);

        // 同一节的对账必须串行，并发差量会相互覆盖
        let _guard = self.write_lock.lock().await;

        let current = self.store.load_section(section).await?;

        let mut changes = SectionChanges::new(section);
        let mut kept: HashSet<i64> = HashSet::new();

        for (name, value) in &desired {
            match current.iter().find(|row| row.name == *name) {
                Some(row) => {
                    kept.insert(row.id);
                    if row.value != *value {
                        changes.updates.push((row.id, value.clone()));
                    }
                }
                None => changes.inserts.push(NewSetting {
                    name: name.clone(),
                    value: value.clone(),
                    encrypted: false,
                }),
            }
        }

        // 未保留的行对应已回到默认值的字段
        for row in &current {
            if !kept.contains(&row.id) {
                changes.deletes.push(row.id);
            }
        }

        debug!(
            "节 {} 对账: 新增{} 更新{} 删除{}",
            section,
            changes.inserts.len(),
            changes.updates.len(),
            changes.deletes.len()
        );

        self.store.apply_changes(&changes).await?;

        self.load(true).await?;

        info!("节 {} 设置已写入", section);
        Ok(())
    }

    /// 以类型自身的节名对账写入
    ///
    /// # 参数
    /// * `value` - 设置对象
    pub async fn reconcile<T: SettingsObject>(&self, value: &T) -> Result<()> {
        self.reconcile_section(T::section_name(), value).await
    }
}

#[async_trait]
impl ConfigSource for DynamicProvider {
    fn name(&self) -> &str {
        "dynamic-settings"
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).await
    }

    async fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{EmailAuthenticationSettings, EmailSettings};
    use crate::store::MemorySettingsStore;

    fn sample_settings() -> EmailSettings {
        EmailSettings {
            host: "example.com".to_string(),
            port: 25,
            authentication: EmailAuthenticationSettings {
                user_name: "user@example.com".to_string(),
                password: "password".to_string(),
                some_unused_valued: String::new(),
            },
        }
    }

    async fn new_provider() -> (Arc<MemorySettingsStore>, DynamicProvider) {
        let store = Arc::new(MemorySettingsStore::new());
        let provider = DynamicProvider::new(store.clone());
        provider.load(false).await.unwrap();
        (store, provider)
    }

    #[tokio::test]
    async fn test_reconcile_writes_expected_rows() {
        let (store, provider) = new_provider().await;

        provider
            .reconcile_section("Email", &sample_settings())
            .await
            .unwrap();

        let rows = store.load_section("Email").await.unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(
            provider.lookup("Email:Host").await.as_deref(),
            Some("example.com")
        );
        assert_eq!(provider.lookup("Email:Port").await.as_deref(), Some("25"));
        assert_eq!(
            provider
                .lookup("Email:Authentication:UserName")
                .await
                .as_deref(),
            Some("user@example.com")
        );
        assert_eq!(
            provider
                .lookup("Email:Authentication:Password")
                .await
                .as_deref(),
            Some("password")
        );
        // 空字符串字段没有对应行
        assert!(provider
            .lookup("Email:Authentication:SomeUnusedValued")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_reconcile_deletes_defaulted_fields() {
        let (store, provider) = new_provider().await;

        let mut settings = EmailSettings {
            host: "a".to_string(),
            port: 25,
            ..Default::default()
        };
        provider.reconcile_section("Smtp", &settings).await.unwrap();
        assert_eq!(store.load_section("Smtp").await.unwrap().len(), 2);

        // Port回到默认值后，对应行被删除
        settings.port = 0;
        provider.reconcile_section("Smtp", &settings).await.unwrap();

        let rows = store.load_section("Smtp").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Host");
        assert!(provider.lookup("Smtp:Port").await.is_none());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (store, provider) = new_provider().await;
        let settings = sample_settings();

        provider.reconcile_section("Email", &settings).await.unwrap();
        let first = store.load_section("Email").await.unwrap();

        provider.reconcile_section("Email", &settings).await.unwrap();
        let second = store.load_section("Email").await.unwrap();

        // 第二次对账不产生重复行，行ID也保持不变
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reconcile_updates_changed_values_in_place() {
        let (store, provider) = new_provider().await;

        let mut settings = sample_settings();
        provider.reconcile_section("Email", &settings).await.unwrap();
        let before = store.load_section("Email").await.unwrap();
        let host_id = before.iter().find(|r| r.name == "Host").unwrap().id;

        settings.host = "smtp.example.com".to_string();
        provider.reconcile_section("Email", &settings).await.unwrap();

        let after = store.load_section("Email").await.unwrap();
        let host = after.iter().find(|r| r.name == "Host").unwrap();
        assert_eq!(host.id, host_id);
        assert_eq!(host.value, "smtp.example.com");
    }

    #[tokio::test]
    async fn test_reconcile_rejects_invalid_section() {
        let (_store, provider) = new_provider().await;

        let result = provider.reconcile_section("", &sample_settings()).await;
        assert!(matches!(result, Err(ConfigStoreError::InvalidArgument(_))));

        let result = provider
            .reconcile_section("Email:Nested", &sample_settings())
            .await;
        assert!(matches!(result, Err(ConfigStoreError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_memory_view() {
        let (store, provider) = new_provider().await;

        provider
            .reconcile_section("Email", &sample_settings())
            .await
            .unwrap();

        store.fail_next_commit();
        let mut changed = sample_settings();
        changed.host = "new-host.example.com".to_string();
        let result = provider.reconcile_section("Email", &changed).await;

        assert!(matches!(
            result,
            Err(ConfigStoreError::StorageUnavailable(_))
        ));
        // 内存表保持对账前的视图
        assert_eq!(
            provider.lookup("Email:Host").await.as_deref(),
            Some("example.com")
        );
    }

    #[tokio::test]
    async fn test_reload_sends_notification() {
        let (_store, provider) = new_provider().await;
        let mut receiver = provider.subscribe();

        provider
            .reconcile_section("Email", &sample_settings())
            .await
            .unwrap();

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.version, 1);
        assert_eq!(provider.version().await, 1);

        // 恰好一条通知
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_first_load_does_not_notify() {
        let store = Arc::new(MemorySettingsStore::new());
        let provider = DynamicProvider::new(store);
        let mut receiver = provider.subscribe();

        provider.load(false).await.unwrap();

        assert!(receiver.try_recv().is_err());
        assert_eq!(provider.version().await, 0);
    }

    #[tokio::test]
    async fn test_reconcile_by_type_name() {
        let (store, provider) = new_provider().await;

        provider.reconcile(&sample_settings()).await.unwrap();

        // EmailSettings的节名为Email
        assert!(!store.load_section("Email").await.unwrap().is_empty());
    }
}
