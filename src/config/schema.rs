use anyhow::{Context, Result};
use directories::UserDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::client::DEFAULT_BASE_URL;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CONFIG_DIR_ENV: &str = "LLM_NPC_CONFIG_DIR";

// ── Top-level config ────────────────────────────────────────────

/// Client configuration, stored as TOML in the config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Path to config.toml, computed at load time.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Backend root URL, without a trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            base_url: default_base_url(),
            http: HttpConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

// ── HTTP ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HttpConfig {
    /// Whole-request timeout. NPC actions run model inference, so this is long.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Proxy URL for all backend traffic (http, https, socks5, socks5h).
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            proxy: None,
        }
    }
}

// ── Session ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    /// Session id used by the CLI when none is given. Unset means a random id.
    #[serde(default)]
    pub default_session_id: Option<String>,
}

// ── Loading ─────────────────────────────────────────────────────

fn default_config_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".llm-npc"))
}

/// `LLM_NPC_CONFIG_DIR` if set and non-empty, else `~/.llm-npc`.
pub fn resolve_config_dir() -> Result<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => default_config_dir(),
    }
}

impl Config {
    pub async fn load_or_init() -> Result<Self> {
        let dir = resolve_config_dir()?;
        Self::load_from(&dir).await
    }

    /// Load `<dir>/config.toml`, writing defaults there first if it is missing.
    /// Environment overrides are applied and the result validated.
    pub async fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let initialized = !config_path.exists();
        let mut config = if initialized {
            let config = Config {
                config_path: config_path.clone(),
                ..Config::default()
            };
            config.save().await?;
            config
        } else {
            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path.clone();
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        tracing::info!(
            path = %config.config_path.display(),
            base_url = %config.base_url,
            initialized,
            "Config loaded"
        );
        Ok(config)
    }

    /// Reject values that would only fail later, on the first request.
    pub fn validate(&self) -> Result<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        validate_url("base_url", base_url, &["http", "https"])?;

        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than 0");
        }
        if self.http.connect_timeout_secs == 0 {
            anyhow::bail!("http.connect_timeout_secs must be greater than 0");
        }
        if let Some(proxy) = self.http.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_url("http.proxy", proxy, &["http", "https", "socks5", "socks5h"])?;
        }

        Ok(())
    }

    /// Apply `LLM_NPC_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LLM_NPC_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }

        if let Some(raw) = lookup("LLM_NPC_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.http.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "Ignoring non-numeric LLM_NPC_TIMEOUT_SECS"),
            }
        }

        if let Some(proxy) = lookup("LLM_NPC_PROXY") {
            self.http.proxy = Some(proxy).filter(|p| !p.trim().is_empty());
        }
    }

    /// Write the config atomically: temp file, fsync, rename.
    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;

        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or(CONFIG_FILE_NAME);
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .await
            .context("Failed to fsync temporary config file")?;
        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, &self.config_path).await {
            let _ = fs::remove_file(&temp_path).await;
            anyhow::bail!("Failed to replace config file: {e}");
        }

        Ok(())
    }

    /// JSON schema of the config file.
    pub fn json_schema() -> Result<serde_json::Value> {
        serde_json::to_value(schemars::schema_for!(Config))
            .context("Failed to serialize JSON Schema")
    }
}

fn validate_url(field: &str, url: &str, schemes: &[&str]) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .with_context(|| format!("Invalid {field}: '{url}' is not a valid URL"))?;

    if !schemes.contains(&parsed.scheme()) {
        anyhow::bail!(
            "Invalid {field} URL scheme '{}'. Allowed: {}",
            parsed.scheme(),
            schemes.join(", ")
        );
    }

    if parsed.host_str().is_none() {
        anyhow::bail!("Invalid {field}: host is required");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.http.timeout_secs, 120);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
base_url = "https://npc.example.com"

[http]
timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://npc.example.com");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.session.default_session_id.is_none());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.base_url = "  ".into();
        assert!(config.validate().is_err());

        config.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.base_url = "ftp://npc.example.com".into();
        assert!(config.validate().is_err());

        config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.http.proxy = Some("gopher://proxy".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_apply_from_lookup() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("LLM_NPC_BASE_URL", "http://game-host:9000"),
            ("LLM_NPC_TIMEOUT_SECS", "45"),
            ("LLM_NPC_PROXY", "socks5://127.0.0.1:1080"),
        ]));
        assert_eq!(config.base_url, "http://game-host:9000");
        assert_eq!(config.http.timeout_secs, 45);
        assert_eq!(config.http.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn bad_timeout_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[("LLM_NPC_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.http.timeout_secs, 120);
    }

    #[test]
    fn empty_proxy_override_clears_proxy() {
        let mut config = Config::default();
        config.http.proxy = Some("http://proxy:3128".into());
        config.apply_overrides_from(env(&[("LLM_NPC_PROXY", "")]));
        assert!(config.http.proxy.is_none());
    }

    #[tokio::test]
    async fn load_from_initializes_missing_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested");
        let config = Config::load_from(&dir).await.unwrap();
        assert_eq!(config.config_path, dir.join(CONFIG_FILE_NAME));
        assert!(config.config_path.exists());

        let written = fs::read_to_string(&config.config_path).await.unwrap();
        assert!(written.contains("base_url"));
        assert!(written.contains("timeout_secs = 120"));
    }

    #[tokio::test]
    async fn save_then_load_keeps_values() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config {
            config_path: tmp.path().join(CONFIG_FILE_NAME),
            ..Config::default()
        };
        config.session.default_session_id = Some("tavern".into());
        config.http.connect_timeout_secs = 3;
        config.save().await.unwrap();

        let contents = fs::read_to_string(&config.config_path).await.unwrap();
        let loaded: Config = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.session.default_session_id.as_deref(), Some("tavern"));
        assert_eq!(loaded.http.connect_timeout_secs, 3);
    }

    #[tokio::test]
    async fn load_from_rejects_unparseable_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "base_url = [")
            .await
            .unwrap();
        let err = Config::load_from(tmp.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn schema_describes_sections() {
        let schema = Config::json_schema().unwrap();
        let properties = &schema["properties"];
        assert!(properties.get("base_url").is_some());
        assert!(properties.get("http").is_some());
        assert!(properties.get("config_path").is_none());
    }
}
