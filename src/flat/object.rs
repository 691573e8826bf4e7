//! 设置对象的扁平化与还原
//!
//! 将结构化设置对象转换为冒号分隔路径的扁平键值表，等于类型默认值的
//! 字段不输出（默认值不落盘）；还原时缺失的字段保持默认值

use crate::error::Result;
use std::collections::BTreeMap;

/// 设置对象trait，支持与扁平键值表的双向转换
///
/// 通常通过[`settings_object!`](crate::settings_object)宏为具体类型生成实现，
/// 宏的字段清单即该类型的显式结构描述
pub trait SettingsObject: Default + PartialEq + Sized {
    /// 节名，未显式指定时为类型自身的名字
    fn section_name() -> &'static str;

    /// 将非默认字段写入扁平表
    ///
    /// # 参数
    /// * `prefix` - 键前缀，顶层调用传空串，递归时为`父字段名:`
    /// * `out` - 输出扁平表
    fn flatten_into(&self, prefix: &str, out: &mut BTreeMap<String, String>);

    /// 从扁平表还原对象
    ///
    /// 缺失的标量字段保持类型默认值；无法映射到任何字段的键被静默忽略
    /// （已持久化的数据可能比当前结构更旧或更新）；值解析失败返回
    /// `SchemaMismatch`
    ///
    /// # 参数
    /// * `flat` - 扁平表
    /// * `prefix` - 键前缀，顶层调用传空串
    fn unflatten_from(flat: &BTreeMap<String, String>, prefix: &str) -> Result<Self>;
}

/// 将设置对象扁平化为键值表
///
/// 只输出偏离类型默认值的字段，任意嵌套深度的复合字段展开为
/// `字段名:子字段名`形式的键
pub fn flatten<T: SettingsObject>(value: &T) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    value.flatten_into("", &mut out);
    out
}

/// 从扁平键值表还原设置对象
pub fn unflatten<T: SettingsObject>(flat: &BTreeMap<String, String>) -> Result<T> {
    T::unflatten_from(flat, "")
}

/// 为设置类型生成[`SettingsObject`]实现
///
/// 字段清单是该类型的显式结构描述：每行给出字段类别（`scalar`、
/// `composite`或`composite_opt`）、字段名和对应的扁平键名。
///
/// # 示例
/// ```ignore
/// #[derive(Debug, Clone, Default, PartialEq)]
/// pub struct EmailSettings {
///     pub host: String,
///     pub port: u16,
///     pub authentication: EmailAuthenticationSettings,
/// }
///
/// settings_object! {
///     EmailSettings ("Email") {
///         scalar host => "Host",
///         scalar port => "Port",
///         composite authentication => "Authentication",
///     }
/// }
/// ```
#[macro_export]
macro_rules! settings_object {
    // 显式节名
    (
        $name:ident ($section:literal) {
            $( $kind:ident $field:ident => $key:literal ),* $(,)?
        }
    ) => {
        $crate::settings_object!(@impl $name, $section, { $( $kind $field => $key ),* });
    };

    // 节名默认为类型名
    (
        $name:ident {
            $( $kind:ident $field:ident => $key:literal ),* $(,)?
        }
    ) => {
        $crate::settings_object!(@impl $name, stringify!($name), { $( $kind $field => $key ),* });
    };

    (@impl $name:ident, $section:expr, { $( $kind:ident $field:ident => $key:literal ),* }) => {
        impl $crate::flat::SettingsObject for $name {
            fn section_name() -> &'static str {
                $section
            }

            fn flatten_into(
                &self,
                prefix: &str,
                out: &mut std::collections::BTreeMap<String, String>,
            ) {
                $( $crate::settings_object!(@flatten $kind, self, prefix, out, $field, $key); )*
            }

            fn unflatten_from(
                flat: &std::collections::BTreeMap<String, String>,
                prefix: &str,
            ) -> $crate::error::Result<Self> {
                let mut value = Self::default();
                $( $crate::settings_object!(@unflatten $kind, value, flat, prefix, $field, $key); )*
                Ok(value)
            }
        }
    };

    (@flatten scalar, $self:ident, $prefix:ident, $out:ident, $field:ident, $key:literal) => {
        if !$crate::flat::ScalarField::is_default(&$self.$field) {
            $out.insert(
                format!("{}{}", $prefix, $key),
                $crate::flat::ScalarField::to_text(&$self.$field),
            );
        }
    };

    (@flatten composite, $self:ident, $prefix:ident, $out:ident, $field:ident, $key:literal) => {{
        let child_prefix = format!("{}{}:", $prefix, $key);
        $crate::flat::SettingsObject::flatten_into(&$self.$field, &child_prefix, $out);
    }};

    (@flatten composite_opt, $self:ident, $prefix:ident, $out:ident, $field:ident, $key:literal) => {
        if let Some(child) = &$self.$field {
            let child_prefix = format!("{}{}:", $prefix, $key);
            $crate::flat::SettingsObject::flatten_into(child, &child_prefix, $out);
        }
    };

    (@unflatten scalar, $value:ident, $flat:ident, $prefix:ident, $field:ident, $key:literal) => {{
        let key = format!("{}{}", $prefix, $key);
        if let Some(text) = $flat.get(&key) {
            $value.$field = $crate::flat::ScalarField::parse_text(&key, text)?;
        }
    }};

    (@unflatten composite, $value:ident, $flat:ident, $prefix:ident, $field:ident, $key:literal) => {{
        let child_prefix = format!("{}{}:", $prefix, $key);
        $value.$field = $crate::flat::SettingsObject::unflatten_from($flat, &child_prefix)?;
    }};

    (@unflatten composite_opt, $value:ident, $flat:ident, $prefix:ident, $field:ident, $key:literal) => {{
        let child_prefix = format!("{}{}:", $prefix, $key);
        if $flat.keys().any(|k| k.starts_with(child_prefix.as_str())) {
            $value.$field =
                Some($crate::flat::SettingsObject::unflatten_from($flat, &child_prefix)?);
        }
    }};
}
