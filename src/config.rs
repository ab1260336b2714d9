use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::query::SEARCH_ENDPOINT;

const DEFAULT_ENV_PREFIX: &str = "HNEWS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    SEARCH_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    format!("hnews/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    crate::hackernews::REQUEST_TIMEOUT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            accent: default_accent(),
        }
    }
}

fn default_title() -> String {
    "Hacker News".to_string()
}

fn default_accent() -> String {
    "yellow".to_string()
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

/// Loads the config file (when present) and layers `HNEWS_*` environment
/// variables on top. A missing file is not an error.
pub fn load(options: LoadOptions) -> Result<Config> {
    let path = options.config_file.clone().or_else(default_config_path);

    let mut cfg = match path {
        Some(ref path) if path.exists() => read_config_file(path)?,
        _ => Config::default(),
    };

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            apply_env_value(cfg, &normalized, value);
        }
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "api.endpoint" => cfg.api.endpoint = value,
        "api.user_agent" => cfg.api.user_agent = value,
        "api.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.api.timeout = duration;
            }
        }
        "ui.title" => cfg.ui.title = value,
        "ui.accent" => cfg.ui.accent = value,
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hnews").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn isolated() -> LoadOptions {
        // A prefix no test sets keeps ambient env vars out.
        LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/hnews-config.yaml")),
            env_prefix: Some("HNEWS_TEST_UNSET".to_string()),
        }
    }

    #[test]
    fn load_defaults_without_file() {
        let cfg = load(isolated()).unwrap();
        assert_eq!(cfg.api.endpoint, SEARCH_ENDPOINT);
        assert_eq!(cfg.api.timeout, Duration::from_secs(10));
        assert_eq!(cfg.ui.title, "Hacker News");
        assert_eq!(cfg.ui.accent, "yellow");
    }

    #[test]
    fn load_reads_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "api:\n  endpoint: http://127.0.0.1:8080/search\n  timeout: 2s\nui:\n  accent: cyan\n",
        )
        .unwrap();

        let cfg = load(LoadOptions {
            config_file: Some(path),
            env_prefix: Some("HNEWS_TEST_UNSET".to_string()),
        })
        .unwrap();

        assert_eq!(cfg.api.endpoint, "http://127.0.0.1:8080/search");
        assert_eq!(cfg.api.timeout, Duration::from_secs(2));
        assert_eq!(cfg.ui.accent, "cyan");
        // Keys the file omits keep their defaults.
        assert_eq!(cfg.ui.title, "Hacker News");
    }

    #[test]
    fn env_overrides_file_values() {
        env::set_var("HNEWS_ENVTEST_UI__TITLE", "News");
        env::set_var("HNEWS_ENVTEST_API__TIMEOUT", "30s");

        let cfg = load(LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/hnews-config.yaml")),
            env_prefix: Some("HNEWS_ENVTEST".to_string()),
        })
        .unwrap();

        assert_eq!(cfg.ui.title, "News");
        assert_eq!(cfg.api.timeout, Duration::from_secs(30));

        env::remove_var("HNEWS_ENVTEST_UI__TITLE");
        env::remove_var("HNEWS_ENVTEST_API__TIMEOUT");
    }

    #[test]
    fn unknown_env_keys_are_ignored() {
        env::set_var("HNEWS_IGNORETEST_API__RETRIES", "5");
        let cfg = load(LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/hnews-config.yaml")),
            env_prefix: Some("HNEWS_IGNORETEST".to_string()),
        })
        .unwrap();
        assert_eq!(cfg, Config::default());
        env::remove_var("HNEWS_IGNORETEST_API__RETRIES");
    }
}
