//! 设置扁平化模块
//!
//! 提供设置对象与冒号分隔扁平键值表之间的双向转换

pub mod object;
pub mod scalar;

// 重新导出主要类型
pub use object::{flatten, unflatten, SettingsObject};
pub use scalar::ScalarField;
