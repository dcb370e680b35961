//! End-to-end tests for the Stepwise agent runtime.
//!
//! These drive the full pipeline (agent loop, both tool-call dialects,
//! the real built-in tools in a temporary workspace, and the gateway)
//! with a scripted provider standing in for the model.

use std::sync::{Arc, Mutex};

use stepwise_agent::Agent;
use stepwise_config::AppConfig;
use stepwise_core::{
    AgentConfig, AgentState, EventKind, Message, Provider, ProviderError, ProviderRequest,
    ProviderResponse, RecordingSink, Role, ToolCall, Usage,
};
use stepwise_tools::{Workspace, default_registry};

// ── Scripted Provider ────────────────────────────────────────────────────

/// Returns scripted replies in sequence and keeps every request it saw.
struct ScriptedProvider {
    replies: Mutex<Vec<Message>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        assert!(!replies.is_empty(), "ScriptedProvider exhausted");
        Ok(ProviderResponse {
            message: replies.remove(0),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "e2e-model".into(),
        })
    }
}

fn native(thought: &str, calls: Vec<ToolCall>) -> Message {
    Message::assistant_with_calls(thought, calls)
}

fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args.to_string())
}

fn terminate(reason: &str) -> Message {
    native(
        "Done.",
        vec![call("call_end", "terminate", serde_json::json!({ "reason": reason }))],
    )
}

fn config(max_steps: u32) -> AgentConfig {
    AgentConfig {
        name: "E2E".into(),
        max_steps,
        retry_backoff_ms: 0,
        ..AgentConfig::default()
    }
}

fn agent_in(workspace: &std::path::Path, provider: Arc<ScriptedProvider>, max_steps: u32) -> Agent {
    let tools = Arc::new(default_registry(Workspace::new(workspace)));
    Agent::new(provider, "e2e-model", tools, config(max_steps))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_native_write_then_read_then_terminate() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        native(
            "Writing the note first.",
            vec![call(
                "call_w",
                "write_file",
                serde_json::json!({ "path": "notes/todo.txt", "content": "buy milk" }),
            )],
        ),
        native(
            "Now reading it back.",
            vec![call("call_r", "read_file", serde_json::json!({ "path": "notes/todo.txt" }))],
        ),
        terminate("note saved and verified"),
    ]));
    let agent = agent_in(dir.path(), provider.clone(), 10);
    let sink = RecordingSink::new();

    let summary = agent.run("save a note", &sink).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes/todo.txt")).unwrap(),
        "buy milk"
    );
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Step 1: Tool [write_file] result: Successfully wrote 8 bytes"));
    assert_eq!(lines[1], "Step 2: Tool [read_file] result: buy milk");
    assert_eq!(lines[2], "Step 3: Task complete: note saved and verified");
    assert_eq!(agent.state(), AgentState::Idle);

    // The third request saw both tool results as native tool messages.
    let third = &provider.requests()[2];
    let tool_results: Vec<&Message> = third
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect();
    assert_eq!(tool_results.len(), 2);
    assert_eq!(tool_results[1].tool_call_id.as_deref(), Some("call_r"));
    assert_eq!(tool_results[1].content, "buy milk");

    let events = sink.events();
    assert_eq!(events.last().unwrap().kind, EventKind::Answer);
    assert_eq!(events.last().unwrap().content, "note saved and verified");
}

#[tokio::test]
async fn e2e_fallback_json_with_alias_reads_real_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("readme.md"), "# Hello").unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        Message::assistant(
            "I should read the readme.\n```json\n{\"name\": \"read_file\", \"arguments\": {\"file_path\": \"readme.md\"}}\n```",
        ),
        Message::assistant(
            r#"{"name": "terminate", "arguments": {"reason": "the readme says hello"}}"#,
        ),
    ]));
    let agent = agent_in(dir.path(), provider.clone(), 5);
    let sink = RecordingSink::new();

    let summary = agent.run("what does the readme say?", &sink).await.unwrap();

    assert!(summary.contains("Step 1: Tool [read_file] result: # Hello"));
    assert!(summary.ends_with("Step 2: Task complete: the readme says hello"));

    // Fallback results come back as a single execution report.
    let second = &provider.requests()[1];
    let report = second
        .messages
        .iter()
        .find(|m| m.role == Role::User && m.content.starts_with("[System execution report]"))
        .expect("execution report in transcript");
    assert!(report.content.contains("Tool [read_file] result: # Hello"));
}

#[tokio::test]
async fn e2e_workspace_escape_is_reported_and_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        native(
            "",
            vec![call("call_r", "read_file", serde_json::json!({ "path": "../../etc/passwd" }))],
        ),
        terminate("could not read outside the workspace"),
    ]));
    let agent = agent_in(dir.path(), provider, 5);
    let sink = RecordingSink::new();

    let summary = agent.run("read passwd", &sink).await.unwrap();

    assert!(summary.contains("Step 1: Tool [read_file] result: Error: Permission denied"));
    assert!(summary.contains("outside the workspace"));
    assert!(summary.ends_with("Task complete: could not read outside the workspace"));
}

#[tokio::test]
async fn e2e_termination_suppresses_later_calls_in_batch() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![native(
        "Finish, then write.",
        vec![
            call("call_end", "terminate", serde_json::json!({ "reason": "early exit" })),
            call(
                "call_w",
                "write_file",
                serde_json::json!({ "path": "late.txt", "content": "should not exist" }),
            ),
        ],
    )]));
    let agent = agent_in(dir.path(), provider, 5);
    let sink = RecordingSink::new();

    let summary = agent.run("exit early", &sink).await.unwrap();

    assert_eq!(summary, "Step 1: Task complete: early exit");
    assert!(!dir.path().join("late.txt").exists());
    let actions = sink
        .kinds()
        .into_iter()
        .filter(|k| *k == EventKind::Action)
        .count();
    assert_eq!(actions, 1);
}

#[tokio::test]
async fn e2e_step_budget_forces_termination() {
    let dir = tempfile::tempdir().unwrap();
    let listing = || {
        native(
            "Let me look again.",
            vec![call("call_ls", "list_directory", serde_json::json!({}))],
        )
    };
    let provider = Arc::new(ScriptedProvider::new(vec![listing(), listing()]));
    let agent = agent_in(dir.path(), provider, 2);
    let sink = RecordingSink::new();

    let summary = agent.run("keep looking", &sink).await.unwrap();

    assert_eq!(
        summary,
        "Step 1: Tool [list_directory] result: (empty directory)\n\
         Step 2: Tool [list_directory] result: (empty directory)\n\
         Forced termination: step budget of 2 exhausted"
    );
    assert_eq!(sink.kinds().last(), Some(&EventKind::Error));
    assert_eq!(agent.state(), AgentState::Idle);
}

#[tokio::test]
async fn e2e_gateway_run_uses_real_tools() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        native(
            "",
            vec![call("call_ls", "list_directory", serde_json::json!({ "path": "." }))],
        ),
        terminate("listed the workspace"),
    ]));

    let mut app_config = AppConfig::default();
    app_config.agent = config(5);
    let tools = Arc::new(default_registry(Workspace::new(dir.path())));
    let state = stepwise_gateway::GatewayState::new(app_config, provider, tools);
    let app = stepwise_gateway::build_router(Arc::new(state));

    let req = Request::builder()
        .method("POST")
        .uri("/api/agent/run")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"task": "what is here?"}"#))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json["summary"],
        "Step 1: Tool [list_directory] result: a.txt\nsub/\nStep 2: Task complete: listed the workspace"
    );

    let events = json["events"].as_array().unwrap();
    let action = events.iter().find(|e| e["type"] == "action").unwrap();
    assert_eq!(action["meta"], "list_directory");
}
