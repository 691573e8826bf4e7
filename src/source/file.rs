//! TOML文件配置源
//!
//! 将TOML配置文件解析为扁平键值表：嵌套表展开为冒号分隔的键路径，
//! 标量按文本表示存储。支持`${VAR}`环境变量替换和重载

use crate::error::{Result, SourceError};
use crate::layered::ConfigSource;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// TOML文件配置源
#[derive(Debug)]
pub struct FileSource {
    /// 配置文件路径
    path: PathBuf,
    /// 配置源名称
    name: String,
    /// 文件不存在时是否按空内容处理
    optional: bool,
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
    /// 当前扁平表
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl FileSource {
    /// 加载TOML配置文件
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    /// * `optional` - 为true时文件不存在按空内容处理，否则报错
    ///
    /// # 返回
    /// * `Result<Self>` - 配置源实例
    pub async fn load<P: AsRef<Path>>(path: P, optional: bool) -> Result<Self> {
        Self::load_with_options(path, optional, true).await
    }

    /// 加载TOML配置文件（带选项）
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    /// * `optional` - 为true时文件不存在按空内容处理
    /// * `enable_env_substitution` - 是否启用`${VAR}`环境变量替换
    pub async fn load_with_options<P: AsRef<Path>>(
        path: P,
        optional: bool,
        enable_env_substitution: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let source = Self {
            path,
            name,
            optional,
            enable_env_substitution,
            data: Arc::new(RwLock::new(HashMap::new())),
        };

        source.reload().await?;
        Ok(source)
    }

    /// 配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 重新读取并解析配置文件，整体替换当前扁平表
    pub async fn reload(&self) -> Result<()> {
        let new_data = self.parse_file().await?;

        {
            let mut data = self.data.write().await;
            *data = new_data;
        }

        debug!("配置文件已加载: {}", self.path.display());
        Ok(())
    }

    /// 读取并解析文件为扁平表
    async fn parse_file(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            if self.optional {
                info!("可选配置文件不存在，跳过: {}", self.path.display());
                return Ok(HashMap::new());
            }
            return Err(SourceError::FileNotFound {
                path: self.path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::ParseError(format!("读取文件失败: {e}")))?;

        let processed = self.substitute_env_vars(&content)?;

        let value: toml::Value = toml::from_str(&processed)
            .map_err(|e| SourceError::ParseError(format!("TOML解析失败: {e}")))?;

        let mut flat = HashMap::new();
        flatten_toml("", &value, &mut flat)?;
        Ok(flat)
    }

    /// 替换字符串中`${VAR}`格式的环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| SourceError::ParseError(format!("正则表达式错误: {e}")))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(SourceError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }
}

/// 递归展开TOML值为扁平键值表
fn flatten_toml(
    prefix: &str,
    value: &toml::Value,
    out: &mut HashMap<String, String>,
) -> Result<()> {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let child_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}:{key}")
                };
                flatten_toml(&child_key, child, out)?;
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Integer(i) => {
            out.insert(prefix.to_string(), i.to_string());
        }
        toml::Value::Float(f) => {
            out.insert(prefix.to_string(), f.to_string());
        }
        toml::Value::Boolean(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        toml::Value::Datetime(dt) => {
            out.insert(prefix.to_string(), dt.to_string());
        }
        toml::Value::Array(_) => {
            return Err(SourceError::ParseError(format!(
                "扁平配置模型不支持数组: {prefix}"
            ))
            .into());
        }
    }
    Ok(())
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.data.read().await.get(key).cloned()
    }

    async fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TEST_CONFIG_TOML: &str = r#"
[Email]
Host = "example.com"
Port = 25

[Email.Authentication]
UserName = "user@example.com"

[Database]
SettingsConnectionString = "settings.db3"
"#;

    fn write_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_nested_tables_flatten_to_colon_keys() {
        let file = write_temp_config(TEST_CONFIG_TOML);
        let source = FileSource::load(file.path(), false).await.unwrap();

        assert_eq!(
            source.get("Email:Host").await.as_deref(),
            Some("example.com")
        );
        assert_eq!(source.get("Email:Port").await.as_deref(), Some("25"));
        assert_eq!(
            source.get("Email:Authentication:UserName").await.as_deref(),
            Some("user@example.com")
        );
        assert_eq!(
            source.get("Database:SettingsConnectionString").await.as_deref(),
            Some("settings.db3")
        );
    }

    #[tokio::test]
    async fn test_missing_required_file_fails() {
        let result = FileSource::load("/nonexistent/config.toml", false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_optional_file_is_empty() {
        let source = FileSource::load("/nonexistent/config.toml", true)
            .await
            .unwrap();
        assert!(source.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let file = write_temp_config("[Email]\nHost = \"old.example.com\"\n");
        let source = FileSource::load(file.path(), false).await.unwrap();
        assert_eq!(
            source.get("Email:Host").await.as_deref(),
            Some("old.example.com")
        );

        std::fs::write(file.path(), "[Email]\nHost = \"new.example.com\"\n").unwrap();
        source.reload().await.unwrap();

        assert_eq!(
            source.get("Email:Host").await.as_deref(),
            Some("new.example.com")
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution() {
        std::env::set_var("CONFIG_STORE_TEST_HOST", "env.example.com");

        let file = write_temp_config("[Email]\nHost = \"${CONFIG_STORE_TEST_HOST}\"\n");
        let source = FileSource::load(file.path(), false).await.unwrap();

        assert_eq!(
            source.get("Email:Host").await.as_deref(),
            Some("env.example.com")
        );

        std::env::remove_var("CONFIG_STORE_TEST_HOST");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution_missing_var() {
        let file = write_temp_config("[Email]\nHost = \"${CONFIG_STORE_MISSING_VAR}\"\n");
        let result = FileSource::load(file.path(), false).await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("CONFIG_STORE_MISSING_VAR"));
    }

    #[tokio::test]
    async fn test_array_is_rejected() {
        let file = write_temp_config("[Email]\nHosts = [\"a\", \"b\"]\n");
        let result = FileSource::load(file.path(), false).await;
        assert!(result.is_err());
    }
}
