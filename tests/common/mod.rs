#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use llm_relay::{ChatCompletionChunk, OpenAI, StreamCallbacks};

pub const API_KEY: &str = "test-api-key";

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn client(server: &mockito::Server) -> OpenAI {
    OpenAI::builder()
        .api_key(API_KEY)
        .base_url(server.url())
        .poll_interval_ms(10)
        .build()
        .unwrap()
}

pub fn recording_callbacks(log: &Log) -> StreamCallbacks {
    let on_open = log.clone();
    let on_done = log.clone();
    let on_error = log.clone();
    StreamCallbacks::new()
        .on_open(move || on_open.lock().unwrap().push("open".to_string()))
        .on_done(move || on_done.lock().unwrap().push("done".to_string()))
        .on_error(move |err| on_error.lock().unwrap().push(format!("error: {err}")))
}

pub fn recording_chunks(log: &Log) -> impl FnMut(ChatCompletionChunk) + Send + 'static {
    let log = log.clone();
    move |chunk: ChatCompletionChunk| {
        let content = chunk.content().unwrap_or_default().to_string();
        log.lock().unwrap().push(format!("data: {content}"));
    }
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}
