//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Config Store 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum ConfigStoreError {
    /// 参数无效（空节名、非法节名等）
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 后端存储不可用或事务提交失败
    #[error("存储不可用: {0}")]
    StorageUnavailable(String),

    /// 扁平键无法映射到目标设置类型的字段
    #[error("字段解析失败: {key}: {reason}")]
    SchemaMismatch { key: String, reason: String },

    /// 配置源相关错误
    #[error("配置源错误: {0}")]
    Source(#[from] SourceError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置源错误类型
#[derive(Error, Debug)]
pub enum SourceError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 文件监控错误
    #[error("文件监控失败: {0}")]
    WatchError(String),
}

impl From<sqlx::Error> for ConfigStoreError {
    fn from(err: sqlx::Error) -> Self {
        ConfigStoreError::StorageUnavailable(err.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ConfigStoreError>;
