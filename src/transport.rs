//! Authenticated request/response plumbing shared by every resource.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Url};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};

use crate::auth::TokenProvider;
use crate::error::LLMError;

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_HEADER_VALUE: &str = "assistants=v2";

/// API surface a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Stable,
    /// Assistants and threads, which require the beta opt-in header.
    Beta,
}

/// Builds, sends and decodes single HTTP calls against the configured base URL.
pub struct Transport {
    client: reqwest::Client,
    base_url: Url,
    token: Arc<dyn TokenProvider>,
    timeout_seconds: Option<u64>,
}

impl Transport {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: Url,
        token: Arc<dyn TokenProvider>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        Self {
            client,
            base_url,
            token,
            timeout_seconds,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Resolves `path` (no leading slash) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, LLMError> {
        self.base_url
            .join(path)
            .map_err(|e| LLMError::HttpError(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        api: Api,
    ) -> Result<T, LLMError> {
        let request = self.authorized(Method::GET, self.url(path)?, api).await?;
        let response = self.apply_timeout(request).send().await?;
        parse_json(response, &format!("GET {path}")).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B, api: Api) -> Result<T, LLMError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let context = format!("POST {path}");
        log_request_payload(&context, body);
        let request = self
            .authorized(Method::POST, self.url(path)?, api)
            .await?
            .json(body);
        let response = self.apply_timeout(request).send().await?;
        parse_json(response, &context).await
    }

    pub async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        api: Api,
    ) -> Result<T, LLMError> {
        let request = self.authorized(Method::DELETE, self.url(path)?, api).await?;
        let response = self.apply_timeout(request).send().await?;
        parse_json(response, &format!("DELETE {path}")).await
    }

    /// Fetches a raw body, for endpoints that do not return JSON.
    pub async fn get_bytes(&self, path: &str, api: Api) -> Result<Bytes, LLMError> {
        let context = format!("GET {path}");
        let request = self.authorized(Method::GET, self.url(path)?, api).await?;
        let response = self.apply_timeout(request).send().await?;
        let response = ensure_success_response(response, &context).await?;
        Ok(response.bytes().await?)
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, LLMError> {
        let request = self
            .authorized(Method::POST, self.url(path)?, Api::Stable)
            .await?
            .multipart(form);
        let response = self.apply_timeout(request).send().await?;
        parse_json(response, &format!("POST {path} (multipart)")).await
    }

    /// Opens a long-lived event-stream POST. No timeout is applied since it
    /// would bound the whole body, not just the connect.
    pub async fn open_stream<B>(
        &self,
        url: Url,
        body: &B,
        api: Api,
    ) -> Result<reqwest::Response, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let context = format!("stream {}", url.path());
        log_request_payload(&context, body);
        let response = self
            .authorized(Method::POST, url, api)
            .await?
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await?;
        ensure_success_response(response, &context).await
    }

    async fn authorized(
        &self,
        method: Method,
        url: Url,
        api: Api,
    ) -> Result<RequestBuilder, LLMError> {
        let token = self.token.bearer_token().await?;
        let request = self
            .client
            .request(method, url)
            .bearer_auth(token.expose_secret());
        Ok(match api {
            Api::Stable => request,
            Api::Beta => request.header(BETA_HEADER, BETA_HEADER_VALUE),
        })
    }

    fn apply_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.timeout_seconds {
            Some(timeout) => request.timeout(Duration::from_secs(timeout)),
            None => request,
        }
    }
}

/// Checks that an identifier can be spliced into a URL path as one segment.
///
/// Dot segments are refused in every spelling URL resolution honours
/// (`..`, `%2e%2E`, `.%2e`, ...).
pub(crate) fn path_segment(id: &str) -> Result<&str, LLMError> {
    let decoded_dots = id.to_ascii_lowercase().replace("%2e", ".");
    if id.is_empty()
        || id.contains(['/', '?', '#', '\\'])
        || decoded_dots == "."
        || decoded_dots == ".."
    {
        return Err(LLMError::InvalidRequest(format!(
            "invalid resource identifier: {id:?}"
        )));
    }
    Ok(id)
}

fn log_request_payload<T: Serialize + ?Sized>(label: &str, body: &T) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }
    if let Ok(json) = serde_json::to_string(body) {
        log::trace!("{label}: {json}");
    }
}

async fn ensure_success_response(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, LLMError> {
    log::debug!("{context} HTTP status: {}", response.status());
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await?;
    Err(LLMError::ResponseFormatError {
        message: format!("{context} returned error status: {status}"),
        raw_response: error_text,
    })
}

async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, LLMError> {
    let response = ensure_success_response(response, context).await?;
    let resp_text = response.text().await?;
    serde_json::from_str(&resp_text).map_err(|e| LLMError::ResponseFormatError {
        message: format!("Failed to decode {context} response: {e}"),
        raw_response: resp_text,
    })
}
