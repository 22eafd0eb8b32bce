mod common;

use std::sync::{Arc, Mutex};

use llm_relay::{ModerationRequest, RunStreamObject, StreamOutcome};
use mockito::Matcher;
use serde_json::json;

use common::{client, entries, recording_callbacks, Log};

const BETA: &str = "assistants=v2";

#[tokio::test]
async fn test_models_list() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/models")
        .with_status(200)
        .with_body(r#"{"object":"list","data":[{"id":"gpt-4o-mini","owned_by":"system"}]}"#)
        .create_async()
        .await;

    let models = client(&server).models().list().await.unwrap();
    assert_eq!(models.data[0].id, "gpt-4o-mini");
    assert_eq!(models.data[0].owned_by.as_deref(), Some("system"));
}

#[tokio::test]
async fn test_moderations_create() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/moderations")
        .match_body(Matcher::Json(json!({"input": "test"})))
        .with_status(200)
        .with_body(r#"{"id":"modr-1","model":"omni-moderation-latest","results":[{"flagged":false}]}"#)
        .create_async()
        .await;

    let moderation = client(&server)
        .moderations()
        .create(&ModerationRequest::new("test"))
        .await
        .unwrap();

    assert_eq!(moderation.id, "modr-1");
    assert_eq!(moderation.results.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_assistants_list_sends_beta_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/assistants")
        .match_header("openai-beta", BETA)
        .with_status(200)
        .with_body(r#"{"object":"list","data":[{"id":"asst_1","name":"Helper"}]}"#)
        .create_async()
        .await;

    let assistants = client(&server).beta().assistants().list().await.unwrap();
    assert_eq!(assistants.data[0].name.as_deref(), Some("Helper"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_thread_lifecycle() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/threads")
        .match_header("openai-beta", BETA)
        .with_status(200)
        .with_body(r#"{"id":"thread_1","object":"thread"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/threads/thread_1")
        .match_header("openai-beta", BETA)
        .with_status(200)
        .with_body(r#"{"id":"thread_1","object":"thread"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/threads/thread_1")
        .match_body(Matcher::PartialJson(json!({"metadata": {"topic": "demo"}})))
        .with_status(200)
        .with_body(r#"{"id":"thread_1","metadata":{"topic":"demo"}}"#)
        .create_async()
        .await;
    server
        .mock("DELETE", "/threads/thread_1")
        .with_status(200)
        .with_body(r#"{"id":"thread_1","object":"thread.deleted","deleted":true}"#)
        .create_async()
        .await;

    let client = client(&server);
    let threads = client.beta().threads();

    let thread = threads.create(&json!({})).await.unwrap();
    assert_eq!(thread.id, "thread_1");
    assert_eq!(threads.retrieve("thread_1").await.unwrap().id, "thread_1");

    let updated = threads
        .update("thread_1", &json!({"metadata": {"topic": "demo"}}))
        .await
        .unwrap();
    assert_eq!(updated.extra["metadata"]["topic"], "demo");

    assert!(threads.delete("thread_1").await.unwrap().deleted);
}

#[tokio::test]
async fn test_thread_messages() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/threads/thread_1/messages")
        .match_body(Matcher::Json(json!({"role": "user", "content": "Hello!"})))
        .with_status(200)
        .with_body(r#"{"id":"msg_1","role":"user"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/threads/thread_1/messages")
        .with_status(200)
        .with_body(r#"{"object":"list","data":[{"id":"msg_1","role":"user"}]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/threads/thread_1/messages/msg_1")
        .with_status(200)
        .with_body(r#"{"id":"msg_1","role":"user"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/threads/thread_1/messages/msg_1")
        .with_status(200)
        .with_body(r#"{"id":"msg_1","metadata":{"seen":"yes"}}"#)
        .create_async()
        .await;
    server
        .mock("DELETE", "/threads/thread_1/messages/msg_1")
        .with_status(200)
        .with_body(r#"{"id":"msg_1","deleted":true}"#)
        .create_async()
        .await;

    let client = client(&server);
    let messages = client.beta().threads().messages();

    let created = messages
        .create("thread_1", &json!({"role": "user", "content": "Hello!"}))
        .await
        .unwrap();
    assert_eq!(created.role.as_deref(), Some("user"));
    assert_eq!(messages.list("thread_1").await.unwrap().data.len(), 1);
    assert_eq!(messages.retrieve("thread_1", "msg_1").await.unwrap().id, "msg_1");
    let updated = messages
        .update("thread_1", "msg_1", &json!({"metadata": {"seen": "yes"}}))
        .await
        .unwrap();
    assert_eq!(updated.extra["metadata"]["seen"], "yes");
    assert!(messages.delete("thread_1", "msg_1").await.unwrap().deleted);
}

#[tokio::test]
async fn test_create_and_run_poll_waits_for_settled_run() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/threads/runs")
        .match_header("openai-beta", BETA)
        .match_body(Matcher::PartialJson(json!({"assistant_id": "asst_1"})))
        .with_status(200)
        .with_body(r#"{"id":"run_1","thread_id":"thread_1","status":"queued"}"#)
        .create_async()
        .await;
    let poll = server
        .mock("GET", "/threads/thread_1/runs/run_1")
        .match_header("openai-beta", BETA)
        .with_status(200)
        .with_body(r#"{"id":"run_1","thread_id":"thread_1","status":"completed"}"#)
        .expect(1)
        .create_async()
        .await;

    let run = client(&server)
        .beta()
        .threads()
        .create_and_run_poll(&json!({"assistant_id": "asst_1"}))
        .await
        .unwrap();

    assert_eq!(run.status.as_deref(), Some("completed"));
    create.assert_async().await;
    poll.assert_async().await;
}

#[tokio::test]
async fn test_runs_stream_delivers_run_objects() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "event: thread.run.created\n",
        "data: {\"id\":\"run_1\",\"object\":\"thread.run\",\"status\":\"queued\"}\n\n",
        "event: thread.message.delta\n",
        "data: {\"id\":\"msg_1\",\"object\":\"thread.message.delta\",\"delta\":{}}\n\n",
        "event: done\n",
        "data: [DONE]\n\n",
    );
    let mock = server
        .mock("POST", "/threads/thread_1/runs")
        .match_header("openai-beta", BETA)
        .match_body(Matcher::PartialJson(json!({"assistant_id": "asst_1", "stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = client(&server);
    let log: Log = Arc::default();
    let objects: Arc<Mutex<Vec<RunStreamObject>>> = Arc::default();
    let sink = objects.clone();
    let handle = client.beta().threads().runs().stream(
        "thread_1",
        &json!({"assistant_id": "asst_1"}),
        move |object| sink.lock().unwrap().push(object),
        recording_callbacks(&log),
    );

    assert_eq!(handle.wait().await, StreamOutcome::Done);
    assert_eq!(entries(&log), vec!["open", "done"]);
    let objects = objects.lock().unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].object.as_deref(), Some("thread.run"));
    assert_eq!(objects[0].status.as_deref(), Some("queued"));
    assert_eq!(objects[1].object.as_deref(), Some("thread.message.delta"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_runs_stream_invalid_thread_id_goes_to_on_error() {
    let server = mockito::Server::new_async().await;
    let client = client(&server);
    let log: Log = Arc::default();

    let handle = client.beta().threads().runs().stream(
        "thread/1",
        &json!({"assistant_id": "asst_1"}),
        |_| {},
        recording_callbacks(&log),
    );

    assert!(matches!(handle.wait().await, StreamOutcome::Failed(_)));
    let log = entries(&log);
    assert_eq!(log.len(), 1);
    assert!(log[0].starts_with("error: Invalid request"));
}

#[tokio::test]
async fn test_runs_stream_error_event_goes_to_on_error() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "event: thread.run.created\n",
        "data: {\"id\":\"run_1\",\"object\":\"thread.run\",\"status\":\"queued\"}\n\n",
        "event: error\n",
        "data: {\"error\":{\"message\":\"server_error\"}}\n\n",
        "event: done\n",
        "data: [DONE]\n\n",
    );
    let _mock = server
        .mock("POST", "/threads/thread_1/runs")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = client(&server);
    let log: Log = Arc::default();
    let objects: Arc<Mutex<Vec<RunStreamObject>>> = Arc::default();
    let sink = objects.clone();
    let handle = client.beta().threads().runs().stream(
        "thread_1",
        &json!({"assistant_id": "asst_1"}),
        move |object| sink.lock().unwrap().push(object),
        recording_callbacks(&log),
    );

    let outcome = handle.wait().await;
    assert!(matches!(outcome, StreamOutcome::Failed(ref msg) if msg.contains("server_error")));
    let log = entries(&log);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], "open");
    assert!(log[1].starts_with("error: Stream error event"));
    let objects = objects.lock().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].id.as_deref(), Some("run_1"));
}
