//! Store configuration and factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examforge_core::notice::{CONFIRMATION_MS, SUMMARY_MS};
use examforge_core::traits::QuestionStore;

use crate::http::{HttpStore, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::memory::MemoryStore;

/// Which store backs the session.
///
/// Note: Custom Debug impl masks the token to keep it out of logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Http {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default)]
        token: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Http {
                base_url,
                token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("token", &token.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Http {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_confirmation_ms() -> u64 {
    CONFIRMATION_MS
}
fn default_summary_ms() -> u64 {
    SUMMARY_MS
}

/// Top-level examforge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamforgeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// How long the import confirmation stays visible.
    #[serde(default = "default_confirmation_ms")]
    pub confirmation_ms: u64,
    /// How long the bulk import summary stays visible.
    #[serde(default = "default_summary_ms")]
    pub summary_ms: u64,
}

impl Default for ExamforgeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            confirmation_ms: default_confirmation_ms(),
            summary_ms: default_summary_ms(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Http {
            base_url,
            token,
            timeout_secs,
        } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            token: token
                .as_deref()
                .map(resolve_env_vars)
                .filter(|t| !t.is_empty()),
            timeout_secs: *timeout_secs,
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// Environment variable overrides: `EXAMFORGE_TOKEN`, `EXAMFORGE_BASE_URL`
/// (both apply to the HTTP store only).
pub fn load_config() -> Result<ExamforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamforgeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examforge.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamforgeConfig::default(),
    };

    if let StoreConfig::Http {
        base_url, token, ..
    } = &mut config.store
    {
        if let Ok(url) = std::env::var("EXAMFORGE_BASE_URL") {
            *base_url = url;
        }
        if let Ok(key) = std::env::var("EXAMFORGE_TOKEN") {
            *token = Some(key);
        }
    }

    config.store = resolve_store_config(&config.store);
    tracing::debug!(path = ?config_path, store = ?config.store, "configuration loaded");
    Ok(config)
}

/// Parses a configuration document.
pub fn parse_config(content: &str) -> Result<ExamforgeConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examforge"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn QuestionStore>> {
    match config {
        StoreConfig::Http {
            base_url,
            token,
            timeout_secs,
        } => {
            let store = HttpStore::new(base_url, token.clone(), *timeout_secs)
                .context("failed to create HTTP store")?;
            Ok(Box::new(store))
        }
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

/// Starter configuration written by `examforge init`.
pub const SAMPLE_CONFIG: &str = r#"# examforge configuration

confirmation_ms = 3000
summary_ms = 5000

[store]
type = "http"
base_url = "http://localhost:8080/api"
token = "${EXAMFORGE_TOKEN}"
timeout_secs = 30
"#;
