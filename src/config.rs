use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{LensError, LensResult};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted auth/database service (Supabase-compatible REST API).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Public anon key sent as `apikey`. Falls back to env var LENSBOARD_SUPABASE_ANON_KEY.
    #[serde(default)]
    pub anon_key: Option<String>,
}

/// Dashboard defaults. The detection port, path and timeout are fixed
/// constants in `upload::client` and deliberately not configurable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Pre-filled endpoint host shown in the host input.
    #[serde(default)]
    pub default_host: Option<String>,
    /// Width in layout points available to the image preview.
    #[serde(default = "default_container_width")]
    pub container_width: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            default_host: None,
            container_width: default_container_width(),
        }
    }
}

fn default_container_width() -> f64 {
    340.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Parse a TOML document and apply environment overrides.
    pub fn from_toml_str(content: &str) -> LensResult<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LENSBOARD_SUPABASE_URL") {
            if !url.trim().is_empty() {
                self.backend.url = url;
            }
        }
        if let Ok(key) = std::env::var("LENSBOARD_SUPABASE_ANON_KEY") {
            if !key.trim().is_empty() {
                self.backend.anon_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> LensResult<()> {
        if self.backend.url.trim().is_empty() {
            return Err(LensError::Config("backend.url is empty".into()));
        }
        if self.backend.anon_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(LensError::Config(
                "backend.anon_key missing (set it in config.toml or LENSBOARD_SUPABASE_ANON_KEY)"
                    .into(),
            ));
        }
        if !(self.detection.container_width > 0.0) {
            return Err(LensError::Config(
                "detection.container_width must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path() -> LensResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("lensboard").join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Ok(candidate);
        }
    }

    Err(LensError::Config(
        "config.toml not found next to executable, in working directory or user config dir"
            .into(),
    ))
}

/// Locate and load `config.toml`, then apply `.env` / environment overrides.
pub fn load_config() -> LensResult<AppConfig> {
    let _ = dotenvy::dotenv();
    let path = resolve_config_path()?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> LensResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = AppConfig::from_toml_str(&content)?;
    tracing::info!(path = %path.display(), backend = %config.backend.url, "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig, path: &Path) -> LensResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
