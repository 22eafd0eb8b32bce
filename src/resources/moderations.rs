use serde::Serialize;

use crate::client::OpenAI;
use crate::error::LLMError;
use crate::transport::Api;
use crate::types::Moderation;

/// `moderations` namespace.
pub struct Moderations<'c> {
    client: &'c OpenAI,
}

impl<'c> Moderations<'c> {
    pub(crate) fn new(client: &'c OpenAI) -> Self {
        Self { client }
    }

    /// Classifies `request`, usually a [`ModerationRequest`](crate::types::ModerationRequest).
    pub async fn create<B>(&self, request: &B) -> Result<Moderation, LLMError>
    where
        B: Serialize + ?Sized,
    {
        self.client
            .transport()
            .post_json("moderations", request, Api::Stable)
            .await
    }
}
