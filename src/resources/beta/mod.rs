mod threads;

pub use threads::{Messages, Runs, Threads};

use crate::client::OpenAI;
use crate::error::LLMError;
use crate::transport::Api;
use crate::types::{Assistant, ListPage};

/// `beta` namespace: assistants and threads.
pub struct Beta<'c> {
    client: &'c OpenAI,
}

impl<'c> Beta<'c> {
    pub(crate) fn new(client: &'c OpenAI) -> Self {
        Self { client }
    }

    pub fn assistants(&self) -> Assistants<'c> {
        Assistants {
            client: self.client,
        }
    }

    pub fn threads(&self) -> Threads<'c> {
        Threads::new(self.client)
    }
}

/// `beta.assistants` namespace.
pub struct Assistants<'c> {
    client: &'c OpenAI,
}

impl Assistants<'_> {
    pub async fn list(&self) -> Result<ListPage<Assistant>, LLMError> {
        self.client.transport().get_json("assistants", Api::Beta).await
    }
}
