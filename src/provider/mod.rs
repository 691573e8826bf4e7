//! 动态配置提供器模块
//!
//! 提供由设置存储支撑的动态配置源和差量对账写回

pub mod dynamic;

// 重新导出主要类型
pub use dynamic::{DynamicProvider, SettingsChangeEvent};
