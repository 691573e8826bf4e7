//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能

use log::LevelFilter;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 初始化结果
    init_result: Option<std::result::Result<(), String>>,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径（可选）
    pub file_path: Option<PathBuf>,
    /// 是否输出到控制台
    pub console: bool,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            console: true,
            json_format: false,
            module_levels: HashMap::new(),
        }
    }
}

/// 日志系统管理器
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    ///
    /// # 特性
    /// - 线程安全的单次初始化
    /// - 支持测试环境重新初始化
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        Self::setup_logging_with_options(config, false)
    }

    /// 初始化日志系统（带选项）
    ///
    /// # 参数
    /// * `config` - 日志配置
    /// * `force_reinit` - 是否强制重新初始化（主要用于测试）
    pub fn setup_logging_with_options(
        config: LogConfig,
        force_reinit: bool,
    ) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));

        {
            let state = state_mutex.lock().unwrap();
            if state.initialized && !force_reinit {
                match &state.init_result {
                    Some(Ok(())) | None => {
                        return Ok(Self {
                            config: config.clone(),
                        });
                    }
                    Some(Err(e)) => {
                        return Err(anyhow::anyhow!("日志系统之前初始化失败: {}", e));
                    }
                }
            }
        }

        let init_result = Self::perform_initialization(&config);

        {
            let mut state = state_mutex.lock().unwrap();
            state.initialized = true;
            state.current_config = Some(config.clone());
            state.init_result = Some(init_result.as_ref().map(|_| ()).map_err(|e| e.to_string()));
        }

        init_result?;
        Ok(Self { config })
    }

    /// 当前实例使用的日志配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 执行实际的日志系统初始化
    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        // log crate 到 tracing 的桥接
        Self::init_log_tracer()?;

        // tracing subscriber
        Self::init_tracing_subscriber(config)?;

        Ok(())
    }

    /// 初始化 LogTracer
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        // 创建环境过滤器
        let mut env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        // 添加模块级别过滤
        for (module, level) in &config.module_levels {
            let directive = format!("{}={}", module, Self::level_to_string(*level))
                .parse()
                .unwrap_or_else(|_| format!("{module}=info").parse().unwrap());
            env_filter = env_filter.add_directive(directive);
        }

        // 创建格式化层
        let fmt_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            fmt::layer()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(true)
                .boxed()
        };

        // 直接尝试初始化，失败时判断是否已经初始化过
        let result = if config.console {
            registry().with(env_filter).with(fmt_layer).try_init()
        } else if let Some(file_path) = &config.file_path {
            let file = std::fs::File::create(file_path)
                .map_err(|e| anyhow::anyhow!("创建日志文件失败: {}", e))?;
            let file_layer = fmt::layer().with_writer(file).with_ansi(false);

            registry().with(env_filter).with(file_layer).try_init()
        } else {
            registry().with(env_filter).with(fmt_layer).try_init()
        };

        match result {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成");
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains(
                    "attempted to set a logger after the logging system was already initialized",
                ) || error_msg.contains("a global default trace dispatcher has already been set")
                {
                    // 已经初始化过了，属预期情况
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::Directive;
        match level {
            LevelFilter::Off => "off".parse().unwrap(),
            LevelFilter::Error => Directive::from(tracing::Level::ERROR),
            LevelFilter::Warn => Directive::from(tracing::Level::WARN),
            LevelFilter::Info => Directive::from(tracing::Level::INFO),
            LevelFilter::Debug => Directive::from(tracing::Level::DEBUG),
            LevelFilter::Trace => Directive::from(tracing::Level::TRACE),
        }
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        if let Some(state_mutex) = GLOBAL_LOGGING_STATE.get() {
            let state = state_mutex.lock().unwrap();
            state.initialized
        } else {
            false
        }
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        if let Some(state_mutex) = GLOBAL_LOGGING_STATE.get() {
            let state = state_mutex.lock().unwrap();
            state.current_config.clone()
        } else {
            None
        }
    }

    /// 重置日志系统状态（主要用于测试）
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state_mutex) = GLOBAL_LOGGING_STATE.get() {
            let mut state = state_mutex.lock().unwrap();
            state.initialized = false;
            state.init_result = None;
            state.current_config = None;
        }
    }
}
