//! File and environment configuration for the client.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::LLMError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Client settings, every field optional so sources can be layered.
///
/// ```toml
/// api_key = "sk-..."
/// base_url = "https://api.openai.com/v1/"
/// timeout_seconds = 30
/// poll_interval_ms = 500
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ClientConfig {
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl ClientConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, LLMError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LLMError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LLMError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// `~/.llm-relay/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".llm-relay").join("config.toml"))
    }

    /// Reads the default config file, or an empty config when it does not exist.
    pub fn load_default() -> Result<Self, LLMError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Reads `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.is_empty())
                .map(SecretString::new),
            base_url: std::env::var(BASE_URL_ENV).ok().filter(|url| !url.is_empty()),
            ..Self::default()
        }
    }

    /// Layers `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ClientConfig) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            base_url: other.base_url.or(self.base_url),
            timeout_seconds: other.timeout_seconds.or(self.timeout_seconds),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
        }
    }
}
