//! 容器配置
//!
//! 加载顺序：TOML 文件（可选字段）→ `default_*` 默认值 → 环境变量覆盖。

use crate::errors::{ContainerError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_MODE: &str = "LAZYBIND_MODE";
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "LAZYBIND_DEFAULT_TIMEOUT_MS";
pub const ENV_TRACE_RETRIEVALS: &str = "LAZYBIND_TRACE_RETRIEVALS";

/// 容器执行模式
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerMode {
    #[default]
    Sync,
    Async,
}

impl ContainerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerMode::Sync => "sync",
            ContainerMode::Async => "async",
        }
    }
}

impl fmt::Display for ContainerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerMode {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(ContainerMode::Sync),
            "async" => Ok(ContainerMode::Async),
            other => Err(ContainerError::Config(format!(
                "unknown container mode '{}', expected 'sync' or 'async'",
                other
            ))),
        }
    }
}

/// 容器配置
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// 执行模式
    #[serde(default = "default_mode")]
    pub mode: ContainerMode,

    /// 未单独设置超时的异步绑定使用的默认超时（毫秒），`None` 表示不限时
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: Option<u64>,

    /// 每次取值时输出 trace 日志
    #[serde(default = "default_trace_retrievals")]
    pub trace_retrievals: bool,
}

/// 从文件加载的部分配置
#[derive(Deserialize, Debug, Default)]
pub struct PartialContainerConfig {
    pub mode: Option<ContainerMode>,
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
    #[serde(default)]
    pub trace_retrievals: Option<bool>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            default_timeout_ms: default_timeout_ms(),
            trace_retrievals: default_trace_retrievals(),
        }
    }
}

impl ContainerConfig {
    /// 用默认值补全部分配置
    pub fn from_partial(partial: Option<PartialContainerConfig>) -> Self {
        let partial = partial.unwrap_or_default();

        Self {
            mode: partial.mode.unwrap_or_else(default_mode),
            default_timeout_ms: partial.default_timeout_ms.or_else(default_timeout_ms),
            trace_retrievals: partial
                .trace_retrievals
                .unwrap_or_else(default_trace_retrievals),
        }
    }

    /// 部分配置 + 环境变量
    pub fn from_partial_and_env(
        partial: Option<PartialContainerConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut config = Self::from_partial(partial);
        config.apply_env(env_map)?;
        Ok(config)
    }

    /// 解析 TOML 文本，再应用当前进程的环境变量
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let partial: PartialContainerConfig = toml::from_str(content)
            .map_err(|e| ContainerError::Config(format!("failed to parse config: {}", e)))?;
        Self::from_partial_and_env(Some(partial), &collect_env_vars())
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), mode = %config.mode, "Container config loaded");
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Result<Self> {
        Self::from_partial_and_env(None, &collect_env_vars())
    }

    pub fn apply_env(&mut self, env_map: &HashMap<String, String>) -> Result<()> {
        if let Some(mode) = env_map.get(ENV_MODE) {
            self.mode = mode.parse()?;
        }

        if let Some(timeout) = env_map.get(ENV_DEFAULT_TIMEOUT_MS) {
            let timeout = timeout.trim();
            self.default_timeout_ms = if timeout.is_empty() || timeout == "0" {
                None
            } else {
                Some(timeout.parse().map_err(|_| {
                    ContainerError::Config(format!(
                        "{} must be a number of milliseconds, got '{}'",
                        ENV_DEFAULT_TIMEOUT_MS, timeout
                    ))
                })?)
            };
        }

        if let Some(flag) = env_map.get(ENV_TRACE_RETRIEVALS) {
            self.trace_retrievals = parse_flag(flag).ok_or_else(|| {
                ContainerError::Config(format!(
                    "{} must be true or false, got '{}'",
                    ENV_TRACE_RETRIEVALS, flag
                ))
            })?;
        }

        Ok(())
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}

/// 收集与容器相关的环境变量
pub fn collect_env_vars() -> HashMap<String, String> {
    [ENV_MODE, ENV_DEFAULT_TIMEOUT_MS, ENV_TRACE_RETRIEVALS]
        .into_iter()
        .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
        .collect()
}

fn parse_flag(flag: &str) -> Option<bool> {
    match flag.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// Default functions
fn default_mode() -> ContainerMode {
    ContainerMode::Sync
}

fn default_timeout_ms() -> Option<u64> {
    None
}

fn default_trace_retrievals() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_container_config() {
        let config = ContainerConfig::default();
        assert_eq!(config.mode, ContainerMode::Sync);
        assert_eq!(config.default_timeout_ms, None);
        assert!(!config.trace_retrievals);
        assert_eq!(config, ContainerConfig::from_partial(None));
    }

    #[test]
    fn test_from_partial_config() {
        let partial = PartialContainerConfig {
            mode: Some(ContainerMode::Async),
            default_timeout_ms: Some(250),
            trace_retrievals: None,
        };

        let config = ContainerConfig::from_partial(Some(partial));
        assert_eq!(config.mode, ContainerMode::Async);
        assert_eq!(config.default_timeout(), Some(Duration::from_millis(250)));
        assert!(!config.trace_retrievals);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let partial: PartialContainerConfig = toml::from_str("mode = \"async\"\ndefault_timeout_ms = 100").unwrap();
        let config = ContainerConfig::from_partial_and_env(
            Some(partial),
            &env(&[(ENV_MODE, "SYNC"), (ENV_DEFAULT_TIMEOUT_MS, "0"), (ENV_TRACE_RETRIEVALS, "yes")]),
        )
        .unwrap();

        assert_eq!(config.mode, ContainerMode::Sync);
        assert_eq!(config.default_timeout_ms, None);
        assert!(config.trace_retrievals);
    }

    #[test]
    fn test_invalid_env_values() {
        let err = ContainerConfig::from_partial_and_env(None, &env(&[(ENV_MODE, "parallel")])).unwrap_err();
        assert!(matches!(err, ContainerError::Config(_)));

        let err = ContainerConfig::from_partial_and_env(None, &env(&[(ENV_DEFAULT_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DEFAULT_TIMEOUT_MS));

        let err = ContainerConfig::from_partial_and_env(None, &env(&[(ENV_TRACE_RETRIEVALS, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ContainerError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_mode() {
        let err = toml::from_str::<PartialContainerConfig>("mode = \"parallel\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mode = \"async\"").unwrap();
        writeln!(file, "trace_retrievals = true").unwrap();

        let config = ContainerConfig::load(file.path()).unwrap();
        // 进程环境里可能设置了覆盖值，只在未设置时校验文件内容
        if std::env::var(ENV_MODE).is_err() {
            assert_eq!(config.mode, ContainerMode::Async);
        }
        if std::env::var(ENV_TRACE_RETRIEVALS).is_err() {
            assert!(config.trace_retrievals);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContainerConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ContainerError::Config(ref msg) if msg.contains("missing.toml")));
    }
}
