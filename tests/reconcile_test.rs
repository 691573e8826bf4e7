//! 对账与分层合并的端到端测试
//!
//! 以SQLite存储驱动动态提供器，覆盖默认值不落盘、差量对账、
//! 分层覆盖和变更通知的完整链路

use config_store::settings::{EmailAuthenticationSettings, EmailSettings};
use config_store::{
    DynamicProvider, LayeredConfig, MemorySettingsStore, SettingsStore, SqliteSettingsStore,
};
use config_store::source::StaticSource;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

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

async fn sqlite_provider(dir: &TempDir) -> (Arc<SqliteSettingsStore>, Arc<DynamicProvider>) {
    let store = Arc::new(
        SqliteSettingsStore::open(dir.path().join("settings.db3"))
            .await
            .unwrap(),
    );
    let provider = Arc::new(DynamicProvider::new(store.clone()));
    provider.load(false).await.unwrap();
    (store, provider)
}

#[tokio::test]
async fn test_email_scenario_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (store, provider) = sqlite_provider(&dir).await;

    provider
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();

    // 持久化的行恰好是四个非默认字段
    let rows = store.load_section("Email").await.unwrap();
    let mut names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "Authentication:Password",
            "Authentication:UserName",
            "Host",
            "Port"
        ]
    );

    assert_eq!(
        provider.lookup("Email:Host").await.as_deref(),
        Some("example.com")
    );
    assert_eq!(provider.lookup("Email:Port").await.as_deref(), Some("25"));

    // 读回的设置对象与写入的相等
    let mut config = LayeredConfig::new();
    config.add_provider(provider.clone());
    let restored: EmailSettings = config.get_section("Email").await.unwrap();
    assert_eq!(restored, sample_settings());
}

#[tokio::test]
async fn test_reconcile_minimality_deletes_defaulted_rows() {
    let dir = TempDir::new().unwrap();
    let (store, provider) = sqlite_provider(&dir).await;

    let mut settings = EmailSettings {
        host: "a".to_string(),
        port: 25,
        ..Default::default()
    };
    provider.reconcile_section("S", &settings).await.unwrap();
    assert_eq!(store.load_section("S").await.unwrap().len(), 2);

    // Port回到默认值，其行必须被删除
    settings.port = 0;
    provider.reconcile_section("S", &settings).await.unwrap();

    let rows = store.load_section("S").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Host");
    assert_eq!(rows[0].value, "a");
}

#[tokio::test]
async fn test_reconcile_idempotence() {
    let dir = TempDir::new().unwrap();
    let (store, provider) = sqlite_provider(&dir).await;

    provider
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();
    let first = store.load_section("Email").await.unwrap();

    provider
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();
    let second = store.load_section("Email").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_update_single_field_round_trip() {
    let dir = TempDir::new().unwrap();
    let (_store, provider) = sqlite_provider(&dir).await;

    let mut config = LayeredConfig::new();
    config.add_provider(provider.clone());

    config
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();

    // 读出、修改单个字段、写回，再读出
    let mut settings: EmailSettings = config.get_section("Email").await.unwrap();
    settings.authentication.some_unused_valued = "Unused".to_string();
    config.reconcile_section("Email", &settings).await.unwrap();

    let restored: EmailSettings = config.get_section("Email").await.unwrap();
    assert_eq!(restored.authentication.some_unused_valued, "Unused");
    assert_eq!(restored.host, "example.com");
    assert_eq!(
        provider
            .lookup("Email:Authentication:SomeUnusedValued")
            .await
            .as_deref(),
        Some("Unused")
    );
}

#[tokio::test]
async fn test_layered_override_with_dynamic_store() {
    let dir = TempDir::new().unwrap();
    let (_store, provider) = sqlite_provider(&dir).await;

    let mut base = HashMap::new();
    base.insert("Email:Host".to_string(), "file.example.com".to_string());
    base.insert("Email:Port".to_string(), "465".to_string());

    let mut config = LayeredConfig::new();
    config.add_source(Arc::new(StaticSource::new("base-file", base)));
    config.add_provider(provider.clone());

    // 动态库为空时，静态层生效
    assert_eq!(
        config.resolve("Email:Host").await.as_deref(),
        Some("file.example.com")
    );

    // 对账写入后，动态库（后注册）覆盖静态层
    config
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();
    assert_eq!(
        config.resolve("Email:Host").await.as_deref(),
        Some("example.com")
    );

    // 合并读出的节对象同样取动态库的值
    let merged: EmailSettings = config.get_section("Email").await.unwrap();
    assert_eq!(merged.host, "example.com");
    assert_eq!(merged.port, 25);
}

#[tokio::test]
async fn test_change_notification_on_reconcile() {
    let dir = TempDir::new().unwrap();
    let (_store, provider) = sqlite_provider(&dir).await;

    let mut config = LayeredConfig::new();
    config.add_provider(provider.clone());
    let mut receiver = config.subscribe().unwrap();

    config
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();

    let event = receiver.try_recv().unwrap();
    assert_eq!(event.version, 1);

    // 第二次对账再收到一条
    config
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();
    let event = receiver.try_recv().unwrap();
    assert_eq!(event.version, 2);
}

#[tokio::test]
async fn test_failed_commit_preserves_merged_view() {
    let store = Arc::new(MemorySettingsStore::new());
    let provider = Arc::new(DynamicProvider::new(store.clone()));
    provider.load(false).await.unwrap();

    let mut config = LayeredConfig::new();
    config.add_provider(provider.clone());

    config
        .reconcile_section("Email", &sample_settings())
        .await
        .unwrap();

    // 提交失败时调用方保留对账前的合并视图
    store.fail_next_commit();
    let mut changed = sample_settings();
    changed.host = "other.example.com".to_string();
    let result = config.reconcile_section("Email", &changed).await;

    assert!(result.is_err());
    assert_eq!(
        config.resolve("Email:Host").await.as_deref(),
        Some("example.com")
    );
}

#[tokio::test]
async fn test_sections_are_independent() {
    let dir = TempDir::new().unwrap();
    let (store, provider) = sqlite_provider(&dir).await;

    provider
        .reconcile_section("Primary", &sample_settings())
        .await
        .unwrap();
    provider
        .reconcile_section("Backup", &sample_settings())
        .await
        .unwrap();

    // 清空一个节不影响另一个节
    provider
        .reconcile_section("Primary", &EmailSettings::default())
        .await
        .unwrap();

    assert!(store.load_section("Primary").await.unwrap().is_empty());
    assert_eq!(store.load_section("Backup").await.unwrap().len(), 4);
}
