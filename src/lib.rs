//! Config Store - 分层持久化应用配置存储
//!
//! 这是一个用Rust编写的分层应用配置存储库，支持：
//! - 多配置源按序合并，后注册的源优先
//! - 设置对象与扁平键值表的双向转换（默认值不落盘）
//! - SQLite持久化动态设置，按节差量对账写回
//! - 配置变更通知与文件热重载
//! - 结构化日志记录

pub mod cli;
pub mod error;
pub mod flat;
pub mod layered;
pub mod logging;
pub mod provider;
pub mod settings;
pub mod source;
pub mod store;

// 重新导出主要类型
pub use error::{ConfigStoreError, Result};
pub use flat::{flatten, unflatten, ScalarField, SettingsObject};
pub use layered::{ConfigSource, LayeredConfig};
pub use provider::{DynamicProvider, SettingsChangeEvent};
pub use store::{MemorySettingsStore, SettingsStore, SqliteSettingsStore};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
