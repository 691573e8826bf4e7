//! 内置设置类型定义
//!
//! 定义演示驱动和测试使用的典型设置节类型

use crate::settings_object;

/// 邮件认证设置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailAuthenticationSettings {
    /// 用户名
    pub user_name: String,
    /// 密码
    pub password: String,
    /// 未使用的预留字段
    pub some_unused_valued: String,
}

settings_object! {
    EmailAuthenticationSettings {
        scalar user_name => "UserName",
        scalar password => "Password",
        scalar some_unused_valued => "SomeUnusedValued",
    }
}

/// 邮件设置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailSettings {
    /// SMTP主机
    pub host: String,
    /// SMTP端口
    pub port: u16,
    /// 认证设置
    pub authentication: EmailAuthenticationSettings,
}

settings_object! {
    EmailSettings ("Email") {
        scalar host => "Host",
        scalar port => "Port",
        composite authentication => "Authentication",
    }
}

/// 设置数据库配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseSettings {
    /// 设置数据库连接串（SQLite文件路径）
    pub settings_connection_string: String,
}

settings_object! {
    DatabaseSettings ("Database") {
        scalar settings_connection_string => "SettingsConnectionString",
    }
}
