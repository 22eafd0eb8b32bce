use serde::Serialize;

use crate::client::OpenAI;
use crate::error::LLMError;
use crate::relay::{EventStream, StreamCallbacks, StreamHandle};
use crate::transport::Api;
use crate::types::{ChatCompletion, ChatCompletionChunk};

const COMPLETIONS_PATH: &str = "chat/completions";

/// `chat` namespace.
pub struct Chat<'c> {
    client: &'c OpenAI,
}

impl<'c> Chat<'c> {
    pub(crate) fn new(client: &'c OpenAI) -> Self {
        Self { client }
    }

    pub fn completions(&self) -> Completions<'c> {
        Completions {
            client: self.client,
        }
    }
}

/// `chat.completions` namespace.
pub struct Completions<'c> {
    client: &'c OpenAI,
}

impl Completions<'_> {
    /// Creates a completion and waits for the whole response.
    pub async fn create<B>(&self, request: &B) -> Result<ChatCompletion, LLMError>
    where
        B: Serialize + ?Sized,
    {
        self.client
            .transport()
            .post_json(COMPLETIONS_PATH, request, Api::Stable)
            .await
    }

    /// Streams a completion, calling `on_data` once per chunk. `stream` is
    /// always sent as `true`.
    pub fn stream<B, F>(&self, request: &B, on_data: F, callbacks: StreamCallbacks) -> StreamHandle
    where
        B: Serialize + ?Sized,
        F: FnMut(ChatCompletionChunk) + Send + 'static,
    {
        self.client
            .relay()
            .stream(COMPLETIONS_PATH, request, Api::Stable, on_data, callbacks)
    }

    /// Streams a completion as a pull-based event stream.
    pub async fn events<B>(&self, request: &B) -> Result<EventStream<ChatCompletionChunk>, LLMError>
    where
        B: Serialize + ?Sized,
    {
        self.client
            .relay()
            .events(COMPLETIONS_PATH, request, Api::Stable)
            .await
    }
}
