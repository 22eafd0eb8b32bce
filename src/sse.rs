//! Incremental server-sent-event de-framing.
//!
//! Bytes arrive in arbitrary chunks; frames are cut on blank lines and parsed
//! into their `event`, `id` and `data` fields. Multi-byte characters split
//! across chunks are held back until complete.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use crate::error::LLMError;

const SSE_DELIMITER: &str = "\n\n";

/// Data value some servers send instead of closing the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Event name servers use to report a failure mid-stream.
pub const ERROR_EVENT: &str = "error";

/// Stream of decoded frames, ending when the underlying body ends.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<SseFrame, LLMError>> + Send>>;

/// One server-sent-event frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    /// Joined `data:` lines, `None` when the frame had no data field.
    pub data: Option<String>,
}

/// How the relay should treat a frame.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameKind<'a> {
    /// A payload to decode.
    Payload(&'a str),
    /// Empty data or the `[DONE]` sentinel.
    Done,
    /// An `event: error` frame; carries its data verbatim.
    Error(&'a str),
    /// No data field at all: comments, keep-alives, `retry:` hints.
    Ignored,
}

impl SseFrame {
    /// Parses the text of a single frame (without needing the trailing blank line).
    pub fn parse(raw: &str) -> Self {
        let mut frame = SseFrame::default();
        for line in raw.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "data" => match frame.data.as_mut() {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => frame.data = Some(value.to_string()),
                },
                "event" => frame.event = Some(value.to_string()),
                "id" => frame.id = Some(value.to_string()),
                _ => {}
            }
        }
        frame
    }

    pub fn kind(&self) -> FrameKind<'_> {
        let data = self.data.as_deref().map(str::trim);
        if self.event.as_deref() == Some(ERROR_EVENT) {
            if let Some(payload) = data {
                return FrameKind::Error(payload);
            }
        }
        match data {
            None => FrameKind::Ignored,
            Some("") | Some(DONE_SENTINEL) => FrameKind::Done,
            Some(payload) => FrameKind::Payload(payload),
        }
    }
}

/// Splits a streaming response body into frames.
pub fn frame_stream(response: reqwest::Response) -> FrameStream {
    let stream = response
        .bytes_stream()
        .map(Some)
        .chain(stream::once(async { None }))
        .scan(SseBuffer::default(), |buffer, chunk| {
            let frames = match chunk {
                Some(Ok(bytes)) => {
                    buffer.push_bytes(&bytes);
                    buffer.drain_frames()
                }
                Some(Err(err)) => vec![Err(LLMError::HttpError(err.to_string()))],
                None => buffer.finish(),
            };
            futures::future::ready(Some(frames))
        })
        .flat_map(stream::iter);

    Box::pin(stream)
}

#[derive(Default)]
struct SseBuffer {
    buffer: String,
    utf8_buffer: Vec<u8>,
}

impl SseBuffer {
    fn push_bytes(&mut self, bytes: &[u8]) {
        self.utf8_buffer.extend_from_slice(bytes);
        match std::str::from_utf8(&self.utf8_buffer) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.utf8_buffer.clear();
            }
            Err(err) => self.consume_valid_prefix(err.valid_up_to()),
        }
        self.normalize_line_endings();
    }

    /// Rewrites `\r\n` and lone `\r` to `\n`. A trailing `\r` is kept until
    /// the next chunk shows whether a `\n` follows it.
    fn normalize_line_endings(&mut self) {
        if !self.buffer.contains('\r') {
            return;
        }
        let pending_cr = self.buffer.ends_with('\r');
        let settled = if pending_cr {
            &self.buffer[..self.buffer.len() - 1]
        } else {
            &self.buffer[..]
        };
        let mut normalized = settled.replace("\r\n", "\n").replace('\r', "\n");
        if pending_cr {
            normalized.push('\r');
        }
        self.buffer = normalized;
    }

    fn consume_valid_prefix(&mut self, valid_up_to: usize) {
        if valid_up_to == 0 {
            return;
        }

        let valid = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to]);
        self.buffer.push_str(&valid);
        self.utf8_buffer.drain(..valid_up_to);
    }

    fn drain_frames(&mut self) -> Vec<Result<SseFrame, LLMError>> {
        let mut frames = Vec::new();
        while let Some(raw) = self.next_event() {
            frames.push(Ok(SseFrame::parse(&raw)));
        }
        frames
    }

    fn next_event(&mut self) -> Option<String> {
        let pos = self.buffer.find(SSE_DELIMITER)?;
        let end = pos + SSE_DELIMITER.len();
        let event = self.buffer[..end].to_string();
        self.buffer.drain(..end);
        Some(event)
    }

    /// Flushes an unterminated last frame once the body has ended.
    fn finish(&mut self) -> Vec<Result<SseFrame, LLMError>> {
        if !self.utf8_buffer.is_empty() {
            let rest = String::from_utf8_lossy(&self.utf8_buffer).into_owned();
            self.buffer.push_str(&rest);
            self.utf8_buffer.clear();
        }
        self.normalize_line_endings();
        if self.buffer.ends_with('\r') {
            self.buffer.pop();
            self.buffer.push('\n');
        }
        let mut frames = self.drain_frames();
        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() {
            frames.push(Ok(SseFrame::parse(&rest)));
        }
        frames
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
