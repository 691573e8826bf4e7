//! 分层配置模块
//!
//! 提供配置源trait和按序合并多个配置源的合并器

pub mod merger;
pub mod source;

// 重新导出主要类型
pub use merger::LayeredConfig;
pub use source::ConfigSource;
