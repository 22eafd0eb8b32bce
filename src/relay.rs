//! Streaming calls delivered through callbacks.
//!
//! A session moves through `open -> data* -> (done | error)`. The terminal
//! callbacks are `FnOnce` and are taken out of their slot before being run, so
//! at most one of them can fire and nothing is delivered after it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::LLMError;
use crate::sse::{frame_stream, FrameKind, FrameStream, SseFrame};
use crate::transport::{Api, Transport};

/// Event produced by a streaming session.
#[derive(Debug)]
pub enum StreamEvent<T> {
    /// The server accepted the request and the body is being read.
    Open,
    /// One decoded frame.
    Data(T),
    /// The server signalled the end of the stream.
    Done,
}

/// Pull-based view of a session. Ends right after the first `Done` or `Err`.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<StreamEvent<T>, LLMError>> + Send>>;

pub type ErrorCallback = Box<dyn FnOnce(LLMError) + Send>;
pub type OpenCallback = Box<dyn FnOnce() + Send>;
pub type DoneCallback = Box<dyn FnOnce() + Send>;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Done,
    /// The error message that was handed to `on_error`.
    Failed(String),
    /// Closed by the caller before a terminal event arrived.
    Closed,
}

/// Caller-side switch that ends a session early.
#[derive(Debug, Clone, Default)]
pub struct StreamCloser {
    token: CancellationToken,
}

impl StreamCloser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Optional callbacks of a streaming call. Unset slots are no-ops.
#[derive(Default)]
pub struct StreamCallbacks {
    on_error: Option<ErrorCallback>,
    on_open: Option<OpenCallback>,
    on_done: Option<DoneCallback>,
    closer: Option<StreamCloser>,
}

impl StreamCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(mut self, callback: impl FnOnce(LLMError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_open(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_open = Some(Box::new(callback));
        self
    }

    pub fn on_done(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(callback));
        self
    }

    /// Uses `closer` for the session, so callbacks holding a clone can end it.
    pub fn closer(mut self, closer: StreamCloser) -> Self {
        self.closer = Some(closer);
        self
    }

    fn open(&mut self) {
        if let Some(callback) = self.on_open.take() {
            callback();
        }
    }

    fn done(mut self) -> StreamOutcome {
        log::debug!("Stream finished");
        if let Some(callback) = self.on_done.take() {
            callback();
        }
        StreamOutcome::Done
    }

    fn fail(mut self, err: LLMError) -> StreamOutcome {
        let message = err.to_string();
        log::debug!("Stream failed: {message}");
        if let Some(callback) = self.on_error.take() {
            callback(err);
        }
        StreamOutcome::Failed(message)
    }
}

/// Handle to a running session.
///
/// Dropping it leaves the session running; call [`StreamHandle::close`] to
/// end it.
pub struct StreamHandle {
    closer: StreamCloser,
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    pub fn close(&self) {
        self.closer.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_closed() || self.task.is_finished()
    }

    pub fn closer(&self) -> StreamCloser {
        self.closer.clone()
    }

    /// Waits for the session to end.
    pub async fn wait(self) -> StreamOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => StreamOutcome::Failed(format!("stream task failed: {err}")),
        }
    }
}

/// Opens streaming calls and relays their frames.
#[derive(Clone)]
pub struct StreamRelay {
    transport: Arc<Transport>,
}

impl StreamRelay {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Opens `path` and returns its events as a stream.
    pub async fn events<T, B>(
        &self,
        path: &str,
        payload: &B,
        api: Api,
    ) -> Result<EventStream<T>, LLMError>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
    {
        let url = self.transport.url(path)?;
        let body = stream_body(payload)?;
        open_events(self.transport.clone(), url, body, api).await
    }

    /// Opens `path` on a background task and feeds every decoded frame to
    /// `on_data`, in arrival order. Must be called inside a tokio runtime.
    ///
    /// All failures, including an unserializable payload, go to `on_error`.
    pub fn stream<T, B, F>(
        &self,
        path: &str,
        payload: &B,
        api: Api,
        on_data: F,
        callbacks: StreamCallbacks,
    ) -> StreamHandle
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
        F: FnMut(T) + Send + 'static,
    {
        let url = self.transport.url(path);
        let body = stream_body(payload);
        let transport = self.transport.clone();
        let opening = async move { open_events(transport, url?, body?, api).await };
        spawn_session(opening, on_data, callbacks)
    }

    /// A session that fails right away, for calls rejected before any I/O.
    pub(crate) fn rejected<T>(&self, err: LLMError, callbacks: StreamCallbacks) -> StreamHandle
    where
        T: Send + 'static,
    {
        spawn_session(async move { Err(err) }, |_: T| {}, callbacks)
    }
}

/// Serializes `payload` and forces `stream: true`.
pub fn stream_body<B: Serialize + ?Sized>(payload: &B) -> Result<Value, LLMError> {
    match serde_json::to_value(payload)? {
        Value::Object(mut map) => {
            map.insert("stream".to_string(), Value::Bool(true));
            Ok(Value::Object(map))
        }
        other => Err(LLMError::InvalidRequest(format!(
            "stream payload must be a JSON object, got {other}"
        ))),
    }
}

async fn open_events<T>(
    transport: Arc<Transport>,
    url: Url,
    body: Value,
    api: Api,
) -> Result<EventStream<T>, LLMError>
where
    T: DeserializeOwned + Send + 'static,
{
    let response = transport.open_stream(url, &body, api).await?;
    let opened = stream::once(async { Ok(StreamEvent::Open) });
    Ok(Box::pin(opened.chain(decode_events(frame_stream(response)))))
}

/// Turns frames into events, stopping after the first terminal one. A body
/// that ends without a sentinel counts as `Done`.
pub(crate) fn decode_events<T>(frames: FrameStream) -> EventStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let events = frames
        .map(Some)
        .chain(stream::once(async { None }))
        .filter_map(|frame| futures::future::ready(classify_frame::<T>(frame)))
        .scan(false, |finished, event| {
            if *finished {
                return futures::future::ready(None);
            }
            *finished = !matches!(event, Ok(StreamEvent::Data(_)));
            futures::future::ready(Some(event))
        });
    Box::pin(events)
}

fn classify_frame<T: DeserializeOwned>(
    frame: Option<Result<SseFrame, LLMError>>,
) -> Option<Result<StreamEvent<T>, LLMError>> {
    let frame = match frame {
        None => return Some(Ok(StreamEvent::Done)),
        Some(Err(err)) => return Some(Err(err)),
        Some(Ok(frame)) => frame,
    };
    match frame.kind() {
        FrameKind::Ignored => None,
        FrameKind::Done => Some(Ok(StreamEvent::Done)),
        FrameKind::Error(payload) => Some(Err(LLMError::StreamError {
            payload: payload.to_string(),
        })),
        FrameKind::Payload(payload) => Some(decode_payload(payload).map(StreamEvent::Data)),
    }
}

/// Decodes one frame payload, keeping the raw text in the error.
pub fn decode_payload<T: DeserializeOwned>(payload: &str) -> Result<T, LLMError> {
    serde_json::from_str(payload).map_err(|e| LLMError::StreamParse {
        raw: payload.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn spawn_session<T, O, F>(
    opening: O,
    on_data: F,
    mut callbacks: StreamCallbacks,
) -> StreamHandle
where
    T: Send + 'static,
    O: Future<Output = Result<EventStream<T>, LLMError>> + Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    let closer = callbacks.closer.take().unwrap_or_default();
    let task = tokio::spawn(drive(opening, on_data, callbacks, closer.token.clone()));
    StreamHandle { closer, task }
}

async fn drive<T, O, F>(
    opening: O,
    mut on_data: F,
    mut callbacks: StreamCallbacks,
    cancel: CancellationToken,
) -> StreamOutcome
where
    O: Future<Output = Result<EventStream<T>, LLMError>>,
    F: FnMut(T),
{
    let mut events = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StreamOutcome::Closed,
        opened = opening => match opened {
            Ok(events) => events,
            Err(err) => return callbacks.fail(err),
        },
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("Stream closed by caller");
                return StreamOutcome::Closed;
            }
            next = events.next() => next,
        };
        match next {
            Some(Ok(StreamEvent::Open)) => callbacks.open(),
            Some(Ok(StreamEvent::Data(data))) => on_data(data),
            Some(Ok(StreamEvent::Done)) | None => return callbacks.done(),
            Some(Err(err)) => return callbacks.fail(err),
        }
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
