//! Client for OpenAI-compatible HTTP APIs with callback-driven streaming.
//!
//! Non-streaming calls resolve to typed records. Streaming calls
//! (`chat.completions.stream`, `beta.threads.runs.stream`) parse the
//! server-sent-event response incrementally and hand every decoded frame to a
//! data callback, followed by exactly one of `on_done` or `on_error`.
//! File uploads read a local path and post it as `multipart/form-data`.

pub mod auth;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod fs;
pub mod relay;
pub mod resources;
pub mod sse;
pub mod transport;
pub mod types;

pub use auth::{CachedToken, StaticToken, TokenProvider};
pub use builder::ClientBuilder;
pub use client::OpenAI;
pub use config::ClientConfig;
pub use error::LLMError;
pub use fs::{FileSystem, TokioFileSystem};
pub use relay::{
    EventStream, StreamCallbacks, StreamCloser, StreamEvent, StreamHandle, StreamOutcome,
    StreamRelay,
};
pub use transport::{Api, Transport};
pub use types::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, FileObject,
    ListPage, ModerationRequest, Run, RunStreamObject,
};
