//! 标量设置字段定义
//!
//! 定义标量字段的文本表示、解析和默认值判定

use crate::error::{ConfigStoreError, Result};

/// 标量设置字段trait，定义扁平化所需的文本表示接口
///
/// 每种标量类型有明确的默认值：字符串为空串，整数为0，布尔为false，
/// `Option`为`None`。等于默认值的字段在扁平化时不输出。
pub trait ScalarField: Sized {
    /// 判断当前值是否为该类型的默认值
    fn is_default(&self) -> bool;

    /// 转换为文本表示
    fn to_text(&self) -> String;

    /// 从文本解析
    ///
    /// # 参数
    /// * `key` - 所属扁平键，用于错误报告
    /// * `text` - 文本值
    ///
    /// # 返回
    /// * `Result<Self>` - 解析结果，失败时返回`SchemaMismatch`
    fn parse_text(key: &str, text: &str) -> Result<Self>;
}

impl ScalarField for String {
    fn is_default(&self) -> bool {
        self.is_empty()
    }

    fn to_text(&self) -> String {
        self.clone()
    }

    fn parse_text(_key: &str, text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

impl ScalarField for bool {
    fn is_default(&self) -> bool {
        !*self
    }

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn parse_text(key: &str, text: &str) -> Result<Self> {
        text.parse::<bool>()
            .map_err(|e| ConfigStoreError::SchemaMismatch {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

/// 为整数类型批量实现ScalarField
macro_rules! impl_scalar_for_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl ScalarField for $t {
                fn is_default(&self) -> bool {
                    *self == 0
                }

                fn to_text(&self) -> String {
                    self.to_string()
                }

                fn parse_text(key: &str, text: &str) -> Result<Self> {
                    text.parse::<$t>()
                        .map_err(|e| ConfigStoreError::SchemaMismatch {
                            key: key.to_string(),
                            reason: e.to_string(),
                        })
                }
            }
        )*
    };
}

impl_scalar_for_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

/// 为浮点类型批量实现ScalarField
///
/// 注意浮点值的文本往返不保证精确，仅字符串/整数/布尔有往返保证
macro_rules! impl_scalar_for_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl ScalarField for $t {
                fn is_default(&self) -> bool {
                    *self == 0.0
                }

                fn to_text(&self) -> String {
                    self.to_string()
                }

                fn parse_text(key: &str, text: &str) -> Result<Self> {
                    text.parse::<$t>()
                        .map_err(|e| ConfigStoreError::SchemaMismatch {
                            key: key.to_string(),
                            reason: e.to_string(),
                        })
                }
            }
        )*
    };
}

impl_scalar_for_float!(f32, f64);

impl<T: ScalarField> ScalarField for Option<T> {
    fn is_default(&self) -> bool {
        self.is_none()
    }

    fn to_text(&self) -> String {
        match self {
            Some(value) => value.to_text(),
            None => String::new(),
        }
    }

    fn parse_text(key: &str, text: &str) -> Result<Self> {
        T::parse_text(key, text).map(Some)
    }
}
