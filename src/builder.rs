//! Fluent construction of an [`OpenAI`] client from keys, config files and
//! injected collaborators.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};

use crate::auth::{StaticToken, TokenProvider};
use crate::client::OpenAI;
use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_MS};
use crate::error::LLMError;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::transport::Transport;

/// Builder for configuring and instantiating an [`OpenAI`] client.
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
    file_system: Option<Arc<dyn FileSystem>>,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key used as a static bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Sets the timeout for non-streaming requests.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.config.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets how often `create_and_run_poll` checks the run status.
    pub fn poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.config.poll_interval_ms = Some(poll_interval_ms);
        self
    }

    /// Layers a loaded configuration over the settings made so far.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = std::mem::take(&mut self.config).merge(config);
        self
    }

    /// Sources bearer tokens from `provider` instead of the API key.
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Replaces the file system used to read uploads.
    pub fn file_system(mut self, file_system: impl FileSystem + 'static) -> Self {
        self.file_system = Some(Arc::new(file_system));
        self
    }

    /// Reuses an existing HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<OpenAI, LLMError> {
        let ClientBuilder {
            config,
            token_provider,
            file_system,
            http_client,
        } = self;

        let base_url = normalize_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let token = match (token_provider, config.api_key) {
            (Some(provider), _) => provider,
            (None, Some(key)) if !key.expose_secret().is_empty() => {
                Arc::new(StaticToken::from(key)) as Arc<dyn TokenProvider>
            }
            _ => return Err(LLMError::AuthError("Missing API key".to_string())),
        };
        log::debug!("Building client for {base_url}");

        let transport = Transport::new(
            http_client.unwrap_or_default(),
            base_url,
            token,
            config.timeout_seconds,
        );
        let poll_interval =
            Duration::from_millis(config.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS));

        Ok(OpenAI::from_parts(
            Arc::new(transport),
            file_system.unwrap_or_else(|| Arc::new(TokioFileSystem)),
            poll_interval,
        ))
    }
}

/// Parses the base URL and makes sure relative joins keep its last segment.
fn normalize_base_url(raw: &str) -> Result<Url, LLMError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|e| LLMError::Config(format!("invalid base URL {raw:?}: {e}")))
}
