use crate::client::OpenAI;
use crate::error::LLMError;
use crate::transport::Api;
use crate::types::{ListPage, Model};

/// `models` namespace.
pub struct Models<'c> {
    client: &'c OpenAI,
}

impl<'c> Models<'c> {
    pub(crate) fn new(client: &'c OpenAI) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<ListPage<Model>, LLMError> {
        self.client.transport().get_json("models", Api::Stable).await
    }
}
