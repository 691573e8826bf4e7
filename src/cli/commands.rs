//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::error::Result;
use crate::layered::LayeredConfig;
use crate::provider::DynamicProvider;
use crate::settings::{DatabaseSettings, EmailAuthenticationSettings, EmailSettings};
use crate::source::{EnvSource, FileSource};
use crate::store::SqliteSettingsStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 环境变量配置源与环境名变量使用的前缀
const ENV_PREFIX: &str = "CONFIG_STORE";

/// 默认设置数据库文件名
const DEFAULT_DATABASE: &str = "settings.db3";

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 获取默认基础配置文件路径
pub fn get_default_config_path() -> PathBuf {
    // 先检测当前目录是否存在config.toml，不存在则使用用户配置目录
    if std::path::Path::new("config.toml").exists() {
        PathBuf::from("config.toml")
    } else {
        dirs::config_dir()
            .map(|config_dir| config_dir.join("config-store").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

/// 构建完整的分层配置
///
/// 配置源顺序（后注册者优先）：基础文件 → 环境特定文件 → 站点文件 →
/// 环境变量 → 动态设置库。站点文件不存在时先以默认内容创建，
/// 再从静态层解析设置数据库路径并接入动态提供器
pub async fn build_layered_config(args: &Args) -> Result<(LayeredConfig, Arc<DynamicProvider>)> {
    let mut config = LayeredConfig::new();

    // 基础配置文件
    let base_path = args.config.clone().unwrap_or_else(get_default_config_path);
    let base = FileSource::load(&base_path, true).await?;
    config.add_source(Arc::new(base));

    // 环境特定配置文件（config.{environment}.toml）
    let environment = std::env::var(format!("{ENV_PREFIX}_ENVIRONMENT"))
        .unwrap_or_else(|_| "development".to_string());
    let env_file_path = sibling_path(&base_path, &format!("config.{environment}.toml"));
    let env_file = FileSource::load(&env_file_path, true).await?;
    config.add_source(Arc::new(env_file));

    // 站点特定配置文件，不存在时创建默认内容
    let site_path = args
        .site_config
        .clone()
        .unwrap_or_else(|| sibling_path(&base_path, "config.site.toml"));
    if !site_path.exists() {
        create_site_file(&site_path).await?;
    }
    let site = FileSource::load(&site_path, true).await?;
    config.add_source(Arc::new(site));

    // 环境变量
    config.add_source(Arc::new(EnvSource::with_prefix(ENV_PREFIX)));

    // 从静态层解析设置数据库路径，命令行参数优先
    let database_settings: DatabaseSettings = config.get().await?;
    let database_path = args.database.clone().unwrap_or_else(|| {
        if database_settings.settings_connection_string.is_empty() {
            PathBuf::from(DEFAULT_DATABASE)
        } else {
            PathBuf::from(database_settings.settings_connection_string)
        }
    });

    // 动态设置库
    let store = SqliteSettingsStore::open(&database_path).await?;
    let provider = Arc::new(DynamicProvider::new(Arc::new(store)));
    provider.load(false).await?;
    config.add_provider(provider.clone());

    info!("分层配置构建完成，共{}个配置源", config.source_count());
    Ok((config, provider))
}

/// 与指定文件同目录的路径
fn sibling_path(base: &std::path::Path, file_name: &str) -> PathBuf {
    base.parent()
        .map(|dir| dir.join(file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// 创建默认内容的站点配置文件
async fn create_site_file(path: &std::path::Path) -> Result<()> {
    println!("站点配置文件不存在，创建: {}", path.display());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let content = format!(
        "[Database]\nSettingsConnectionString = \"{DEFAULT_DATABASE}\"\n"
    );
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// 显示合并配置视图命令
pub struct ShowCommand;

#[async_trait]
impl Command for ShowCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Show { format } = &args.command {
            let (config, _provider) = build_layered_config(args).await?;

            match format {
                OutputFormat::Json => {
                    // BTreeMap保证输出按键排序
                    let merged: BTreeMap<String, String> =
                        config.merged_snapshot().await.into_iter().collect();
                    println!("{}", serde_json::to_string_pretty(&merged)?);
                }
                OutputFormat::Text => {
                    print!("{}", config.debug_view().await);
                }
            }
        }
        Ok(())
    }
}

/// 查询单个扁平键命令
pub struct GetCommand;

#[async_trait]
impl Command for GetCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Get { key } = &args.command {
            let (config, _provider) = build_layered_config(args).await?;

            match config.resolve(key).await {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("未找到键: {key}");
                    std::process::exit(1);
                }
            }
        }
        Ok(())
    }
}

/// 演示命令
///
/// 按固定顺序执行：写入完整设置 → 读取 → 修改单个字段写回 → 再读取，
/// 每步之后打印合并配置视图
pub struct DemoCommand;

#[async_trait]
impl Command for DemoCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let (config, _provider) = build_layered_config(args).await?;

        let steps: [(&str, DemoStep); 4] = [
            ("CreateSettings", DemoStep::Create),
            ("ReadSettings", DemoStep::Read),
            ("UpdateSettings", DemoStep::Update),
            ("ReadSettings", DemoStep::Read),
        ];

        for (name, step) in steps {
            println!("{name}");
            step.run(&config).await?;
            println!("{}", config.debug_view().await);
        }

        Ok(())
    }
}

/// 演示步骤
enum DemoStep {
    Create,
    Read,
    Update,
}

impl DemoStep {
    async fn run(&self, config: &LayeredConfig) -> Result<()> {
        match self {
            DemoStep::Create => {
                let settings = EmailSettings {
                    host: "example.com".to_string(),
                    port: 25,
                    authentication: EmailAuthenticationSettings {
                        user_name: "user@example.com".to_string(),
                        password: "password".to_string(),
                        some_unused_valued: String::new(),
                    },
                };
                config.reconcile_section("Email", &settings).await
            }
            DemoStep::Read => {
                let settings: EmailSettings = config.get_section("Email").await?;
                println!("{settings:?}");
                Ok(())
            }
            DemoStep::Update => {
                let mut settings: EmailSettings = config.get_section("Email").await?;
                settings.authentication.some_unused_valued = "Unused".to_string();
                config.reconcile_section("Email", &settings).await
            }
        }
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}
