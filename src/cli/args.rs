//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Config Store - 分层持久化应用配置存储
#[derive(Parser, Debug, Clone)]
#[command(
    name = "config-store",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 基础配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "基础配置文件路径",
        env = "CONFIG_STORE_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 站点特定配置文件路径
    #[arg(
        long,
        value_name = "FILE",
        help = "站点特定配置文件路径",
        env = "CONFIG_STORE_SITE_CONFIG"
    )]
    pub site_config: Option<PathBuf>,

    /// 设置数据库路径，优先于配置文件中的 Database:SettingsConnectionString
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "设置数据库路径",
        env = "CONFIG_STORE_DATABASE"
    )]
    pub database: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "CONFIG_STORE_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 显示合并后的配置视图
    Show {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },

    /// 查询单个扁平键的合并结果
    Get {
        /// 扁平键，如 Email:Host
        #[arg(value_name = "KEY", help = "扁平键（如 Email:Host）")]
        key: String,
    },

    /// 运行演示步骤序列（写入→读取→更新→读取）
    Demo,

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_get_command() {
        let args = Args::try_parse_from(["config-store", "get", "Email:Host"]).unwrap();
        match args.command {
            Commands::Get { key } => assert_eq!(key, "Email:Host"),
            _ => panic!("expected get command"),
        }
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(LogLevel::Info.to_string(), "info");
    }
}
