//! 命令行接口模块
//!
//! 提供命令行参数解析和命令处理逻辑

pub mod args;
pub mod commands;

// 重新导出主要类型
pub use args::{Args, Commands, LogLevel, OutputFormat};
pub use commands::{Command, DemoCommand, GetCommand, ShowCommand, VersionCommand};
