use serde::Serialize;

use crate::client::OpenAI;
use crate::error::LLMError;
use crate::relay::{EventStream, StreamCallbacks, StreamHandle};
use crate::transport::{path_segment, Api};
use crate::types::{Deleted, ListPage, Run, RunStreamObject, Thread, ThreadMessage};

/// `beta.threads` namespace.
pub struct Threads<'c> {
    client: &'c OpenAI,
}

impl<'c> Threads<'c> {
    pub(crate) fn new(client: &'c OpenAI) -> Self {
        Self { client }
    }

    pub fn messages(&self) -> Messages<'c> {
        Messages {
            client: self.client,
        }
    }

    pub fn runs(&self) -> Runs<'c> {
        Runs {
            client: self.client,
        }
    }

    /// Creates a thread; pass `&serde_json::json!({})` for an empty one.
    pub async fn create<B>(&self, request: &B) -> Result<Thread, LLMError>
    where
        B: Serialize + ?Sized,
    {
        self.client
            .transport()
            .post_json("threads", request, Api::Beta)
            .await
    }

    pub async fn retrieve(&self, thread_id: &str) -> Result<Thread, LLMError> {
        let path = format!("threads/{}", path_segment(thread_id)?);
        self.client.transport().get_json(&path, Api::Beta).await
    }

    pub async fn update<B>(&self, thread_id: &str, request: &B) -> Result<Thread, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("threads/{}", path_segment(thread_id)?);
        self.client
            .transport()
            .post_json(&path, request, Api::Beta)
            .await
    }

    pub async fn delete(&self, thread_id: &str) -> Result<Deleted, LLMError> {
        let path = format!("threads/{}", path_segment(thread_id)?);
        self.client.transport().delete_json(&path, Api::Beta).await
    }

    /// Creates a thread and a run in one call, then polls the run every
    /// [`OpenAI::poll_interval`] until it leaves `queued`/`in_progress`/`cancelling`.
    pub async fn create_and_run_poll<B>(&self, request: &B) -> Result<Run, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let mut run: Run = self
            .client
            .transport()
            .post_json("threads/runs", request, Api::Beta)
            .await?;
        let thread_id = run
            .thread_id
            .clone()
            .ok_or_else(|| LLMError::ResponseFormatError {
                message: format!("run {} has no thread_id", run.id),
                raw_response: serde_json::to_string(&run).unwrap_or_default(),
            })?;

        while !run.is_settled() {
            log::debug!(
                "Run {} is {}, polling again",
                run.id,
                run.status.as_deref().unwrap_or("unknown")
            );
            tokio::time::sleep(self.client.poll_interval()).await;
            run = self.runs().retrieve(&thread_id, &run.id).await?;
        }
        Ok(run)
    }
}

/// `beta.threads.messages` namespace.
pub struct Messages<'c> {
    client: &'c OpenAI,
}

impl Messages<'_> {
    pub async fn create<B>(&self, thread_id: &str, request: &B) -> Result<ThreadMessage, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("threads/{}/messages", path_segment(thread_id)?);
        self.client
            .transport()
            .post_json(&path, request, Api::Beta)
            .await
    }

    pub async fn list(&self, thread_id: &str) -> Result<ListPage<ThreadMessage>, LLMError> {
        let path = format!("threads/{}/messages", path_segment(thread_id)?);
        self.client.transport().get_json(&path, Api::Beta).await
    }

    pub async fn retrieve(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> Result<ThreadMessage, LLMError> {
        let path = message_path(thread_id, message_id)?;
        self.client.transport().get_json(&path, Api::Beta).await
    }

    pub async fn update<B>(
        &self,
        thread_id: &str,
        message_id: &str,
        request: &B,
    ) -> Result<ThreadMessage, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let path = message_path(thread_id, message_id)?;
        self.client
            .transport()
            .post_json(&path, request, Api::Beta)
            .await
    }

    pub async fn delete(&self, thread_id: &str, message_id: &str) -> Result<Deleted, LLMError> {
        let path = message_path(thread_id, message_id)?;
        self.client.transport().delete_json(&path, Api::Beta).await
    }
}

fn message_path(thread_id: &str, message_id: &str) -> Result<String, LLMError> {
    Ok(format!(
        "threads/{}/messages/{}",
        path_segment(thread_id)?,
        path_segment(message_id)?
    ))
}

/// `beta.threads.runs` namespace.
pub struct Runs<'c> {
    client: &'c OpenAI,
}

impl Runs<'_> {
    /// Starts a run on `thread_id` and streams its events to `on_data`.
    pub fn stream<B, F>(
        &self,
        thread_id: &str,
        request: &B,
        on_data: F,
        callbacks: StreamCallbacks,
    ) -> StreamHandle
    where
        B: Serialize + ?Sized,
        F: FnMut(RunStreamObject) + Send + 'static,
    {
        let relay = self.client.relay();
        match path_segment(thread_id) {
            Ok(thread_id) => relay.stream(
                &format!("threads/{thread_id}/runs"),
                request,
                Api::Beta,
                on_data,
                callbacks,
            ),
            Err(err) => relay.rejected::<RunStreamObject>(err, callbacks),
        }
    }

    /// Starts a run and returns its events as a pull-based stream.
    pub async fn events<B>(
        &self,
        thread_id: &str,
        request: &B,
    ) -> Result<EventStream<RunStreamObject>, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("threads/{}/runs", path_segment(thread_id)?);
        self.client.relay().events(&path, request, Api::Beta).await
    }

    pub async fn create<B>(&self, thread_id: &str, request: &B) -> Result<Run, LLMError>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("threads/{}/runs", path_segment(thread_id)?);
        self.client
            .transport()
            .post_json(&path, request, Api::Beta)
            .await
    }

    pub async fn retrieve(&self, thread_id: &str, run_id: &str) -> Result<Run, LLMError> {
        let path = format!(
            "threads/{}/runs/{}",
            path_segment(thread_id)?,
            path_segment(run_id)?
        );
        self.client.transport().get_json(&path, Api::Beta).await
    }
}
