//! End-to-end stream tests through the HTTP router.
//!
//! Exercises the full path: JSON request in, SSE frames out, with stub
//! backends standing in for real agent pipelines.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
use bridge_core::{ChatMessage, MessageId, Role, RunRequest, ToolCallId};
use bridge_server::error::{BackendError, BackendResult};
use bridge_server::integrations::axum::BridgeRouter;
use bridge_server::{Backend, RunEmitter};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

/// Backend that narrates a scripted happy-path run.
struct GreetingBackend;

#[async_trait]
impl Backend for GreetingBackend {
    async fn process_message(
        &self,
        _user_input: &str,
        _history: &[ChatMessage],
        emitter: &mut RunEmitter,
    ) -> BackendResult<String> {
        let id = MessageId::new("msg-greeting");
        emitter.start_message(&id, Role::Assistant);
        emitter.append_chunk(&id, "Hi");
        emitter.end_message(&id);
        Ok("Hi".to_string())
    }

    fn name(&self) -> &'static str {
        "greeting"
    }
}

/// Backend that fails mid-run with a tool call still open.
struct AbandonsToolBackend;

#[async_trait]
impl Backend for AbandonsToolBackend {
    async fn process_message(
        &self,
        _user_input: &str,
        _history: &[ChatMessage],
        emitter: &mut RunEmitter,
    ) -> BackendResult<String> {
        emitter.start_tool(
            "web_search",
            &ToolCallId::new("tool-abandoned"),
            Some(json!({"query": "doomed"})),
        );
        Err(BackendError::custom("upstream exploded"))
    }

    fn name(&self) -> &'static str {
        "abandons-tool"
    }
}

struct PanickingBackend;

#[async_trait]
impl Backend for PanickingBackend {
    async fn process_message(
        &self,
        _user_input: &str,
        _history: &[ChatMessage],
        _emitter: &mut RunEmitter,
    ) -> BackendResult<String> {
        panic!("deliberate test panic");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

async fn post_chat(backend: Arc<dyn Backend>, request: &RunRequest) -> (StatusCode, Vec<String>) {
    let router = BridgeRouter::new(backend).into_router();
    let body = serde_json::to_string(request).unwrap();
    let response = router
        .oneshot(
            Request::post("/api/chat")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let frames = text
        .split("\n\n")
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    (status, frames)
}

/// Data frames parsed as JSON; comment frames dropped.
fn events(frames: &[String]) -> Vec<Value> {
    frames
        .iter()
        .filter_map(|frame| {
            let payload = frame.strip_prefix("data: ")?;
            Some(serde_json::from_str(payload).expect("data frame must be valid JSON"))
        })
        .collect()
}

fn event_types(events: &[Value]) -> Vec<String> {
    events
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect()
}

fn user_request(content: &str) -> RunRequest {
    RunRequest {
        messages: vec![ChatMessage::user(content)],
        thread_id: None,
    }
}

#[tokio::test]
async fn happy_path_stream_shape() {
    let (status, frames) = post_chat(Arc::new(GreetingBackend), &user_request("Hello")).await;
    assert_eq!(status, StatusCode::OK);

    let events = events(&frames);
    assert_eq!(
        event_types(&events),
        vec![
            "RUN_STARTED",
            "TEXT_MESSAGE_START",
            "TEXT_MESSAGE_CONTENT",
            "TEXT_MESSAGE_END",
            "RUN_FINISHED",
            "DONE",
        ]
    );

    assert_eq!(events[1]["messageId"], "msg-greeting");
    assert_eq!(events[1]["role"], "assistant");
    assert_eq!(events[2]["delta"], "Hi");
    // Run and thread ids stay consistent across lifecycle events.
    assert_eq!(events[0]["runId"], events[4]["runId"]);
    assert_eq!(events[0]["threadId"], events[4]["threadId"]);
}

#[tokio::test]
async fn backend_failure_closes_open_tool_call_before_error() {
    let (status, frames) = post_chat(Arc::new(AbandonsToolBackend), &user_request("search")).await;
    assert_eq!(status, StatusCode::OK);

    let events = events(&frames);
    assert_eq!(
        event_types(&events),
        vec![
            "RUN_STARTED",
            "TOOL_CALL_START",
            "TOOL_CALL_ARGS",
            "TOOL_CALL_END",
            "RUN_ERROR",
            "DONE",
        ]
    );

    // The synthetic close targets the abandoned call.
    assert_eq!(events[3]["toolCallId"], "tool-abandoned");
    assert_eq!(events[4]["message"], "upstream exploded");
    assert!(!event_types(&events).contains(&"RUN_FINISHED".to_string()));
}

#[tokio::test]
async fn empty_message_list_yields_error_without_run_started() {
    let empty = RunRequest {
        messages: vec![],
        thread_id: None,
    };
    let (status, frames) = post_chat(Arc::new(GreetingBackend), &empty).await;

    // Validation failures are protocol events, not HTTP errors.
    assert_eq!(status, StatusCode::OK);
    let events = events(&frames);
    assert_eq!(event_types(&events), vec!["RUN_ERROR", "DONE"]);
    assert_eq!(events[0]["message"], "No user message provided");
}

#[tokio::test]
async fn assistant_only_history_is_rejected_the_same_way() {
    let request = RunRequest {
        messages: vec![
            ChatMessage::system("be nice"),
            ChatMessage::assistant("hello"),
        ],
        thread_id: None,
    };
    let (_, frames) = post_chat(Arc::new(GreetingBackend), &request).await;
    let events = events(&frames);
    assert_eq!(event_types(&events), vec!["RUN_ERROR", "DONE"]);
}

#[tokio::test]
async fn backend_panic_is_reported_as_run_error() {
    let (status, frames) = post_chat(Arc::new(PanickingBackend), &user_request("boom")).await;
    assert_eq!(status, StatusCode::OK);

    let events = events(&frames);
    assert_eq!(event_types(&events), vec!["RUN_STARTED", "RUN_ERROR", "DONE"]);
    assert_eq!(events[1]["message"], "backend panicked");
}

#[tokio::test]
async fn every_run_ends_with_exactly_one_terminal_and_the_sentinel() {
    for backend in [
        Arc::new(GreetingBackend) as Arc<dyn Backend>,
        Arc::new(AbandonsToolBackend),
        Arc::new(PanickingBackend),
    ] {
        let (_, frames) = post_chat(backend, &user_request("go")).await;
        let events = events(&frames);
        let types = event_types(&events);

        let terminals = types
            .iter()
            .filter(|t| *t == "RUN_FINISHED" || *t == "RUN_ERROR")
            .count();
        assert_eq!(terminals, 1, "stream: {types:?}");
        assert_eq!(types.last().unwrap(), "DONE");

        // No content after the terminal event.
        let terminal_pos = types
            .iter()
            .position(|t| t == "RUN_FINISHED" || t == "RUN_ERROR")
            .unwrap();
        assert_eq!(terminal_pos, types.len() - 2);
    }
}

#[tokio::test]
async fn form_data_reaches_the_backend_annotated() {
    /// Echoes its input so the test can see what the backend received.
    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn process_message(
            &self,
            user_input: &str,
            _history: &[ChatMessage],
            emitter: &mut RunEmitter,
        ) -> BackendResult<String> {
            let id = MessageId::random();
            emitter.start_message(&id, Role::Assistant);
            emitter.append_chunk(&id, user_input);
            emitter.end_message(&id);
            Ok(user_input.to_string())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    let request = user_request(
        r#"Submit this [FORM_DATA]{"email":"ada@example.com"}[/FORM_DATA] please"#,
    );
    let (_, frames) = post_chat(Arc::new(EchoBackend), &request).await;
    let events = events(&frames);

    let delta = events
        .iter()
        .find(|e| e["type"] == "TEXT_MESSAGE_CONTENT")
        .unwrap()["delta"]
        .as_str()
        .unwrap();
    assert!(!delta.contains("[FORM_DATA]"));
    assert!(delta.contains("Form data"));
    assert!(delta.contains("ada@example.com"));
}
