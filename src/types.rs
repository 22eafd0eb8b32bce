//! Request and response records.
//!
//! Only the fields this crate or its callers commonly inspect are declared.
//! Everything else round-trips untouched through the `extra` map, so new
//! server-side fields never break decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields that are passed through without interpretation.
pub type Extra = Map<String, Value>;

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Value::String(content.into()),
            extra: Extra::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Parameters for `chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_completion_tokens: None,
            stream: None,
            extra: Extra::new(),
        }
    }
}

/// A complete (non-streamed) chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ChatCompletion {
    /// Content of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatCompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One streamed chat completion frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ChatCompletionChunk {
    /// Incremental content of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Metadata for an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `{ "object": "list", "data": [...] }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Confirmation returned by delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ModerationRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: Value::String(input.into()),
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moderation {
    pub id: String,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

const RUN_PENDING_STATUSES: [&str; 3] = ["queued", "in_progress", "cancelling"];

impl Run {
    /// `true` once the run no longer needs polling. A run without a status
    /// has nothing to wait for.
    pub fn is_settled(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => !RUN_PENDING_STATUSES.contains(&status),
            None => true,
        }
    }
}

/// One frame of a run stream.
///
/// Run streams interleave runs, steps and message deltas; `object` tells them
/// apart (`thread.run`, `thread.run.step`, `thread.message.delta`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStreamObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_chunk_keeps_unknown_fields() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": "Hi"}, "logprobs": null}]
        }))
        .unwrap();

        assert_eq!(chunk.content(), Some("Hi"));
        assert_eq!(chunk.extra["object"], json!("chat.completion.chunk"));
        assert!(chunk.choices[0].extra.contains_key("logprobs"));
    }

    #[test]
    fn test_chunk_without_delta_has_no_content() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({"choices": [{}]})).unwrap();
        assert_eq!(chunk.content(), None);
    }

    #[test]
    fn test_request_flattens_extra_parameters() {
        let mut request =
            ChatCompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hello!")]);
        request.extra.insert("user".to_string(), json!("u-1"));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hello!"}],
                "user": "u-1"
            })
        );
    }

    #[test]
    fn test_run_settled_statuses() {
        let run = |status: Option<&str>| Run {
            id: "run_1".to_string(),
            thread_id: None,
            status: status.map(str::to_string),
            extra: Extra::new(),
        };

        assert!(!run(Some("queued")).is_settled());
        assert!(!run(Some("in_progress")).is_settled());
        assert!(!run(Some("cancelling")).is_settled());
        assert!(run(Some("completed")).is_settled());
        assert!(run(Some("requires_action")).is_settled());
        assert!(run(None).is_settled());
    }
}
