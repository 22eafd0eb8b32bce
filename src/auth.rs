//! Bearer-token sources.
//!
//! The client asks its [`TokenProvider`] for a token before every request, so
//! a provider backed by an external session sees every call and decides on its
//! own refresh policy.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::error::LLMError;

/// Supplies the bearer token sent as `Authorization: Bearer <token>`.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<SecretString, LLMError>;
}

/// A fixed API key.
#[derive(Debug)]
pub struct StaticToken {
    token: SecretString,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }
}

impl From<SecretString> for StaticToken {
    fn from(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<SecretString, LLMError> {
        Ok(SecretString::new(self.token.expose_secret().clone()))
    }
}

/// Reuses a token from another provider until `ttl` has elapsed.
pub struct CachedToken<P> {
    inner: P,
    ttl: Duration,
    cached: Mutex<Option<(SecretString, Instant)>>,
}

impl<P: TokenProvider> CachedToken<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Drops the cached token so the next call goes to the inner provider.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for CachedToken<P> {
    async fn bearer_token(&self) -> Result<SecretString, LLMError> {
        let mut cached = self.cached.lock().await;
        if let Some((token, fetched_at)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(SecretString::new(token.expose_secret().clone()));
            }
        }
        log::debug!("Refreshing cached bearer token");
        let token = self.inner.bearer_token().await?;
        let copy = SecretString::new(token.expose_secret().clone());
        *cached = Some((token, Instant::now()));
        Ok(copy)
    }
}
