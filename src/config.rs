use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ThoughtsConfig {
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub enrichment: EnrichmentConfig,
    pub views: ViewsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

/// How the session picks its persistence backend.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModePreference {
    /// Demo when running embedded, remote otherwise.
    Auto,
    Remote,
    Demo,
}

impl std::str::FromStr for ModePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "remote" => Ok(Self::Remote),
            "demo" => Ok(Self::Demo),
            _ => Err(format!("unknown session mode: {s}")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: ModePreference,
    /// Signed-in identity for remote mode. `None` means signed out.
    pub user_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Remote document store (per-user collections).
    pub db_path: String,
    /// Directory holding the demo-mode slots.
    pub local_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub provider: String,
    pub model: String,
    pub api_base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewsConfig {
    /// How many top tags are eligible as the daily theme.
    pub theme_candidates: usize,
    pub tag_cloud_limit: usize,
    pub recent_search_limit: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ModePreference::Auto,
            user_id: None,
            display_name: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_thoughtweave_dir();
        Self {
            db_path: dir.join("thoughts.db").to_string_lossy().into_owned(),
            local_dir: dir.join("demo").to_string_lossy().into_owned(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            api_base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            theme_candidates: 5,
            tag_cloud_limit: 50,
            recent_search_limit: 5,
        }
    }
}

/// Returns `~/.thoughtweave/`, or `./.thoughtweave` when no home directory is known.
pub fn default_thoughtweave_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".thoughtweave")
}

/// Returns the default config file path: `~/.thoughtweave/config.toml`
pub fn default_config_path() -> PathBuf {
    default_thoughtweave_dir().join("config.toml")
}

impl ThoughtsConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ThoughtsConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("THOUGHTWEAVE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("THOUGHTWEAVE_USER") {
            self.session.user_id = Some(val);
        }
        if let Ok(val) = std::env::var("THOUGHTWEAVE_LOG_LEVEL") {
            self.logging.log_level = val;
        }
        if let Ok(val) = std::env::var("THOUGHTWEAVE_MODE") {
            self.session.mode = val.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            self.enrichment.api_key = val;
        }
        Ok(())
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_local_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.local_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
