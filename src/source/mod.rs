//! 静态配置源模块
//!
//! 提供TOML文件、环境变量和固定内容三种配置源实现，
//! 以及文件源的热重载监控

pub mod env;
pub mod file;
pub mod fixed;
pub mod watcher;

// 重新导出主要类型
pub use env::EnvSource;
pub use file::FileSource;
pub use fixed::StaticSource;
pub use watcher::{SourceChangeEvent, SourceWatcher};
