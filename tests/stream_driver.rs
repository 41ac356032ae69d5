//! Integration tests for the streaming driver, session and conversation API using wiremock.

use std::time::Duration;

use agentmind::client::{ChatRequest, ClientConfig, LlmConfig, StreamClient, StreamObserver};
use agentmind::error::{REQUEST_ERROR, STREAM_ERROR};
use agentmind::session::{ChatSession, StreamStatus};
use agentmind::{ChatError, StreamFailure, StreamingMessage};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_PATH: &str = "/api/chat/stream-v2";

#[derive(Default)]
struct Recorder {
    updates: Vec<StreamingMessage>,
    completed: Vec<StreamingMessage>,
    failures: Vec<StreamFailure>,
}

impl StreamObserver for Recorder {
    fn on_update(&mut self, message: &StreamingMessage) {
        self.updates.push(message.clone());
    }

    fn on_complete(&mut self, message: &StreamingMessage) {
        self.completed.push(message.clone());
    }

    fn on_error(&mut self, failure: &StreamFailure) {
        self.failures.push(failure.clone());
    }
}

fn client(server: &MockServer) -> StreamClient {
    StreamClient::new(ClientConfig::default().base_url(server.uri())).unwrap()
}

fn sse(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("{line}\n\n")).collect()
}

fn full_answer() -> String {
    sse(&[
        r#"data: {"type":"conversation_id","data":{"conversation_id":42}}"#,
        r#"data: {"type":"thinking","data":{"thinking":"Looking it up. "}}"#,
        r#"data: {"type":"tool_call","data":{"tool_name":"web_search","tool_input":{"query":"rust sse"}},"timestamp":"2024-05-01T10:00:00.000Z"}"#,
        r#"data: {"type":"tool_result","data":{"tool_name":"web_search","tool_output":"3 results"}}"#,
        r#"data: {"type":"content","data":{"content":"Server-Sent "}}"#,
        r#"data: {"type":"text","content":"Events."}"#,
        r#"data: {"type":"done","data":{"conversation_id":42}}"#,
    ])
}

async fn mount_stream(server: &MockServer, status: u16, body: String) {
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn stream_chat_posts_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "message": "hello",
            "conversation_id": 7,
            "llm_config": {"provider": "dashscope", "model": "qwen-max"},
            "plan_mode": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["data: [DONE]"]), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new(" hello ")
        .with_conversation(7)
        .with_llm_config(LlmConfig::new("dashscope", "qwen-max"))
        .with_plan_mode(true);

    let message = client(&server).stream_chat(&request, &mut Recorder::default()).await.unwrap();
    assert!(message.is_complete);
}

#[tokio::test]
async fn stream_chat_accumulates_full_answer() {
    let server = MockServer::start().await;
    mount_stream(&server, 200, full_answer()).await;

    let mut recorder = Recorder::default();
    let message = client(&server)
        .stream_chat(&ChatRequest::new("what is sse?"), &mut recorder)
        .await
        .unwrap();

    assert_eq!(message.conversation_id, Some(42));
    assert_eq!(message.thinking, "Looking it up. ");
    assert_eq!(message.content, "Server-Sent Events.");
    assert!(message.is_complete);

    assert_eq!(message.tool_steps.len(), 1);
    let step = &message.tool_steps[0];
    assert_eq!(step.tool, "web_search");
    assert_eq!(step.input, r#"{"query":"rust sse"}"#);
    assert_eq!(step.output, "3 results");
    assert_eq!(step.timestamp.as_deref(), Some("2024-05-01T10:00:00.000Z"));

    assert_eq!(recorder.updates.len(), 7);
    assert_eq!(recorder.completed, vec![message]);
    assert!(recorder.failures.is_empty());
}

#[tokio::test]
async fn stream_chat_accepts_legacy_protocol() {
    let server = MockServer::start().await;
    let body = [
        r#"{"type":"conversation_id","conversation_id":5}"#,
        r#": keep-alive"#,
        r#"event: message"#,
        r#"data:{"type":"thinking","content":"Hmm"}"#,
        r#"data: {"type":"tool","tool_info":{"tool":"knowledge_retrieval","input":"faq","output":"2 docs"}}"#,
        r#"data: {"type":"text","content":"Answer"}"#,
        "data: [DONE]",
        "",
    ]
    .join("\r\n");
    mount_stream(&server, 200, body).await;

    let message = client(&server)
        .stream_chat(&ChatRequest::new("legacy"), &mut Recorder::default())
        .await
        .unwrap();

    assert_eq!(message.conversation_id, Some(5));
    assert_eq!(message.thinking, "Hmm");
    assert_eq!(message.content, "Answer");
    assert_eq!(message.tool_steps[0].tool, "knowledge_retrieval");
    assert_eq!(message.tool_steps[0].output, "2 docs");
    assert!(message.is_complete);
}

#[tokio::test]
async fn stream_chat_http_error_reports_failure_without_completion() {
    let server = MockServer::start().await;
    mount_stream(&server, 500, "upstream exploded".to_string()).await;

    let mut recorder = Recorder::default();
    let err = client(&server)
        .stream_chat(&ChatRequest::new("hi"), &mut recorder)
        .await
        .unwrap_err();

    match &err {
        ChatError::Http { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Http, got: {other:?}"),
    }
    assert!(recorder.updates.is_empty());
    assert!(recorder.completed.is_empty());
    assert_eq!(recorder.failures.len(), 1);
    assert_eq!(recorder.failures[0].code, REQUEST_ERROR);
}

#[tokio::test]
async fn stream_chat_error_event_fails_request() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        200,
        sse(&[
            r#"data: {"type":"content","content":"partial"}"#,
            r#"data: {"type":"error","data":{"message":"model overloaded","code":"LLM_ERROR"}}"#,
            r#"data: {"type":"content","content":"never applied"}"#,
        ]),
    )
    .await;

    let mut recorder = Recorder::default();
    let err = client(&server)
        .stream_chat(&ChatRequest::new("hi"), &mut recorder)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Server(_)), "expected Server, got: {err:?}");
    assert_eq!(recorder.failures.len(), 1);
    assert_eq!(recorder.failures[0].message, "model overloaded");
    assert_eq!(recorder.failures[0].code, "LLM_ERROR");
    assert!(recorder.completed.is_empty());
    assert_eq!(recorder.updates.last().map(|m| m.content.as_str()), Some("partial"));
}

#[tokio::test]
async fn stream_chat_ignores_malformed_lines() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        200,
        sse(&[
            r#"data: {"type":"content","content":"a"}"#,
            r#"data: {"type":"content","content":"#,
            "data: not json at all",
            r#"data: {"type":"content","content":"b"}"#,
            "data: [DONE]",
        ]),
    )
    .await;

    let message = client(&server)
        .stream_chat(&ChatRequest::new("hi"), &mut Recorder::default())
        .await
        .unwrap();
    assert_eq!(message.content, "ab");
}

#[tokio::test]
async fn session_publishes_completed_state() {
    let server = MockServer::start().await;
    mount_stream(&server, 200, full_answer()).await;

    let session = ChatSession::new(client(&server));
    let mut updates = session.subscribe();

    let message = session.send(&ChatRequest::new("what is sse?")).await.unwrap();
    assert!(updates.has_changed().unwrap());

    let state = updates.borrow_and_update().clone();
    assert_eq!(state.status, StreamStatus::Completed);
    assert_eq!(state.streaming_message, Some(message));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn session_error_event_sets_error_state() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        200,
        sse(&[
            r#"data: {"type":"content","content":"partial"}"#,
            r#"data: {"type":"error","message":"conversation not found"}"#,
        ]),
    )
    .await;

    let session = ChatSession::new(client(&server));
    session.send(&ChatRequest::new("hi")).await.unwrap_err();

    let state = session.state();
    assert_eq!(state.status, StreamStatus::Error);
    assert!(state.streaming_message.is_none());
    let failure = state.error.unwrap();
    assert_eq!(failure.message, "conversation not found");
    assert_eq!(failure.code, STREAM_ERROR);
}

#[tokio::test]
async fn session_stream_without_done_completes_partially() {
    let server = MockServer::start().await;
    mount_stream(&server, 200, sse(&[r#"data: {"type":"content","content":"cut off"}"#])).await;

    let session = ChatSession::new(client(&server));
    let message = session.send(&ChatRequest::new("hi")).await.unwrap();
    assert!(!message.is_complete);

    let state = session.state();
    assert_eq!(state.status, StreamStatus::Completed);
    assert_eq!(state.streaming_message.map(|m| m.content), Some("cut off".to_string()));
}

#[tokio::test]
async fn session_rejects_concurrent_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(full_answer(), "text/event-stream")
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = ChatSession::new(client(&server));
    let request = ChatRequest::new("first");

    let first = session.send(&request);
    tokio::pin!(first);
    assert!(futures_util::poll!(&mut first).is_pending());
    assert_eq!(session.state().status, StreamStatus::Streaming);

    let err = session.send(&ChatRequest::new("second")).await.unwrap_err();
    assert!(matches!(err, ChatError::SendInProgress));

    let message = first.await.unwrap();
    assert_eq!(message.content, "Server-Sent Events.");
}

#[tokio::test]
async fn session_cancel_detaches_in_flight_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(full_answer(), "text/event-stream")
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let session = ChatSession::new(client(&server));
    let request = ChatRequest::new("first");

    let first = session.send(&request);
    tokio::pin!(first);
    assert!(futures_util::poll!(&mut first).is_pending());

    session.cancel();
    assert_eq!(session.state().status, StreamStatus::Idle);

    // The detached send still runs to the end, but nothing it produces is published.
    first.await.unwrap();
    let state = session.state();
    assert_eq!(state.status, StreamStatus::Idle);
    assert!(state.streaming_message.is_none());
}

#[tokio::test]
async fn conversations_list_uses_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/conversations"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "title": "Trip", "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-02T10:00:00", "message_count": 4}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let conversations = client(&server).conversations().list(20, 10).await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Trip");
    assert_eq!(conversations[0].message_count, Some(4));
}

#[tokio::test]
async fn conversations_get_decodes_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/conversations/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 3,
            "title": "Search",
            "created_at": "2024-05-01T10:00:00",
            "updated_at": "2024-05-01T10:05:00",
            "messages": [
                {"id": 10, "conversation_id": 3, "role": "user", "content": "find it", "created_at": "2024-05-01T10:00:00"},
                {"id": 11, "conversation_id": 3, "role": "assistant", "content": "found",
                 "thinking": "searching",
                 "intermediate_steps": [{"tool": "web_search", "input": "it", "output": "1 hit"}],
                 "created_at": "2024-05-01T10:00:05"}
            ]
        })))
        .mount(&server)
        .await;

    let detail = client(&server).conversations().get(3).await.unwrap();
    assert_eq!(detail.conversation.id, 3);
    assert_eq!(detail.messages.len(), 2);
    assert_eq!(detail.messages[1].thinking.as_deref(), Some("searching"));
    assert_eq!(detail.messages[1].intermediate_steps[0].output, "1 hit");
}

#[tokio::test]
async fn conversations_create_posts_title() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/conversations"))
        .and(body_json(serde_json::json!({"title": "Weekend plans"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 8, "title": "Weekend plans", "created_at": "2024-05-03T09:00:00", "updated_at": "2024-05-03T09:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = client(&server).conversations().create("Weekend plans").await.unwrap();
    assert_eq!(conversation.id, 8);
    assert_eq!(conversation.title, "Weekend plans");
    assert!(conversation.message_count.is_none());
}

#[tokio::test]
async fn conversations_rename_patches_title() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/chat/conversations/8"))
        .and(body_json(serde_json::json!({"title": "Lisbon trip"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 8, "title": "Lisbon trip", "created_at": "2024-05-03T09:00:00", "updated_at": "2024-05-03T09:30:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = client(&server).conversations().rename(8, "Lisbon trip").await.unwrap();
    assert_eq!(conversation.title, "Lisbon trip");
    assert_eq!(conversation.updated_at, "2024-05-03T09:30:00");
}

#[tokio::test]
async fn conversations_delete_maps_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/chat/conversations/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client(&server).conversations().delete(99).await.unwrap_err();
    assert!(
        matches!(&err, ChatError::Http { status, .. } if status.as_u16() == 404),
        "expected Http 404, got: {err:?}"
    );
}
