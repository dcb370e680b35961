//! Agent endpoints: one fresh agent per request.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use stepwise_core::{AgentEvent, ChannelSink, EventSink, RecordingSink};

use crate::SharedState;

#[derive(Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct RunRequest {
    pub task: String,
}

#[derive(Serialize)]
pub struct RunResponse {
    pub summary: String,
    pub events: Vec<AgentEvent>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn timeout_message(budget: Duration) -> String {
    format!("Run timed out after {}s", budget.as_secs())
}

/// `GET /api/agent/chat?prompt=...`: run a task, streaming its events as SSE.
///
/// Each event is named after its type and carries the JSON event as data.
/// The stream ends when the run does.
pub async fn chat_handler(
    State(state): State<SharedState>,
    Query(query): Query<ChatQuery>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let prompt = query.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "prompt must not be empty"));
    }
    info!(prompt_len = prompt.len(), "agent/chat SSE request");

    let agent = state.new_agent();
    let budget = state.config.gateway.run_timeout();
    let (sink, rx) = ChannelSink::new();

    // The sink moves into the task; dropping it closes the stream.
    tokio::spawn(async move {
        match tokio::time::timeout(budget, agent.run(&prompt, &sink)).await {
            Ok(Ok(summary)) => debug!(summary_len = summary.len(), "Streamed run finished"),
            Ok(Err(e)) => {
                warn!(error = %e, "Streamed run rejected");
                if sink.accept(AgentEvent::error(e.to_string())).is_err() {
                    debug!("Client went away before the error was delivered");
                }
            }
            Err(_) => {
                warn!(budget_secs = budget.as_secs(), "Streamed run timed out");
                if sink.accept(AgentEvent::error(timeout_message(budget))).is_err() {
                    debug!("Client went away before the timeout was delivered");
                }
            }
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event.event_type()).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// `POST /api/agent/run`: run a task to completion and return the summary
/// together with every event it produced.
pub async fn run_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let task = payload.task.trim();
    if task.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "task must not be empty"));
    }
    info!(task_len = task.len(), "agent/run request");

    let agent = state.new_agent();
    let budget = state.config.gateway.run_timeout();
    let sink = RecordingSink::new();

    match tokio::time::timeout(budget, agent.run(task, &sink)).await {
        Ok(Ok(summary)) => Ok(Json(RunResponse {
            summary,
            events: sink.into_events(),
        })),
        Ok(Err(e)) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
        Err(_) => {
            warn!(budget_secs = budget.as_secs(), "Run timed out");
            Err(api_error(StatusCode::GATEWAY_TIMEOUT, timeout_message(budget)))
        }
    }
}
