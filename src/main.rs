//! Config Store 主程序入口
//!
//! 分层持久化应用配置存储

use anyhow::{Context, Result};
use clap::Parser;
use config_store::cli::args::{Args, Commands};
use config_store::cli::commands::{Command, DemoCommand, GetCommand, ShowCommand, VersionCommand};
use config_store::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        console: true,
        json_format: false,
        ..Default::default()
    };

    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Config Store v{} 启动", config_store::VERSION);

    // 执行命令
    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    let command: Box<dyn Command> = match &args.command {
        Commands::Show { .. } => Box::new(ShowCommand),
        Commands::Get { .. } => Box::new(GetCommand),
        Commands::Demo => Box::new(DemoCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    };

    command.execute(args).await?;
    Ok(())
}
