//! The resource-shaped entry point.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::builder::ClientBuilder;
use crate::error::LLMError;
use crate::fs::FileSystem;
use crate::relay::StreamRelay;
use crate::resources::{Beta, Chat, Files, Models, Moderations};
use crate::transport::Transport;

/// Client for an OpenAI-compatible API.
///
/// ```no_run
/// # async fn demo() -> Result<(), llm_relay::LLMError> {
/// use llm_relay::{ChatCompletionRequest, ChatMessage, OpenAI, StreamCallbacks};
///
/// let client = OpenAI::new("sk-...", "https://api.openai.com/v1")?;
/// let request = ChatCompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hello!")]);
/// let handle = client.chat().completions().stream(
///     &request,
///     |chunk| print!("{}", chunk.content().unwrap_or_default()),
///     StreamCallbacks::new().on_error(|err| eprintln!("{err}")),
/// );
/// handle.wait().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenAI {
    transport: Arc<Transport>,
    relay: StreamRelay,
    file_system: Arc<dyn FileSystem>,
    poll_interval: Duration,
}

impl OpenAI {
    /// Client with a static API key against `base_url`.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, LLMError> {
        Self::builder().api_key(api_key).base_url(base_url).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        transport: Arc<Transport>,
        file_system: Arc<dyn FileSystem>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            relay: StreamRelay::new(transport.clone()),
            transport,
            file_system,
            poll_interval,
        }
    }

    pub fn chat(&self) -> Chat<'_> {
        Chat::new(self)
    }

    pub fn files(&self) -> Files<'_> {
        Files::new(self)
    }

    pub fn models(&self) -> Models<'_> {
        Models::new(self)
    }

    pub fn moderations(&self) -> Moderations<'_> {
        Moderations::new(self)
    }

    pub fn beta(&self) -> Beta<'_> {
        Beta::new(self)
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn relay(&self) -> &StreamRelay {
        &self.relay
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.file_system.as_ref()
    }
}

impl fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAI")
            .field("base_url", &self.base_url().as_str())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
