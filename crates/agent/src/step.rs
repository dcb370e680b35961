//! The reason/act step engine.
//!
//! One step is one `think` followed, when the model asked for it, by one
//! `act`. Tool calls in a batch run strictly in order so that a
//! termination call suppresses everything after it.

use std::any::Any;
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use stepwise_core::tool::is_termination_output;
use stepwise_core::{
    AgentEvent, AgentState, Completion, Error, EventSink, Message, ProviderRequest,
    TerminationSignal, ToolCall, ToolError,
};
use tracing::{debug, info, warn};

use crate::agent::{Agent, Session, emit};
use crate::fallback::{looks_like_tool_call, parse_tool_calls};

const NO_ACTION: &str = "Thinking complete - no action needed";
const NO_TOOL_EXECUTED: &str = "No tool executed";
const EXECUTION_REPORT_HEADER: &str = "[System execution report]";

/// How tool results are fed back to the model for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feedback {
    /// One tool-result message per call id.
    Native,
    /// A single user message carrying every result.
    Report,
}

impl Agent {
    pub(crate) async fn step(
        &self,
        session: &mut Session,
        sink: &dyn EventSink,
    ) -> Result<String, Error> {
        if !self.think(session, sink).await? {
            return Ok(NO_ACTION.into());
        }
        self.act(session, sink).await
    }

    /// Ask the model for its next move. Returns whether action is required.
    pub(crate) async fn think(
        &self,
        session: &mut Session,
        sink: &dyn EventSink,
    ) -> Result<bool, Error> {
        if let Some(prompt) = self.config.next_step_prompt.as_deref()
            && !prompt.trim().is_empty()
        {
            session.transcript.push(Message::user(prompt));
        }

        let system_prompt = Some(self.config.system_prompt.clone()).filter(|p| !p.trim().is_empty());
        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt,
            messages: session.transcript.messages().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };

        let completed = AssertUnwindSafe(self.provider.complete(request))
            .catch_unwind()
            .await
            .map_err(|panic| {
                Error::Internal(format!(
                    "Provider '{}' panicked: {}",
                    self.provider.name(),
                    panic_message(panic.as_ref())
                ))
            })?;

        let response = match completed {
            Ok(response) => response,
            Err(e) => {
                if let Some(signal) = e.termination() {
                    self.finish(sink, signal.reason());
                    return Err(e.into());
                }
                warn!(
                    provider = self.provider.name(),
                    step = session.current_step,
                    error = %e,
                    "Completion failed, backing off"
                );
                emit(sink, AgentEvent::error(format!("Reasoning failed: {e}")));
                tokio::time::sleep(self.config.retry_backoff()).await;
                return Ok(false);
            }
        };

        let completion = response.completion();
        let text = completion.text().trim();
        if !text.is_empty() {
            emit(sink, AgentEvent::thinking(text));
        }

        let act = match &completion {
            Completion::NativeCalls { calls, .. } => {
                debug!(calls = calls.len(), "Model requested tools natively");
                true
            }
            Completion::FreeText(text) => looks_like_tool_call(text),
        };

        if act {
            session.pending = Some(completion);
        } else {
            session.transcript.push(Message::assistant(completion.text()));
        }
        Ok(act)
    }

    /// Dispatch the tool calls of the pending completion.
    pub(crate) async fn act(
        &self,
        session: &mut Session,
        sink: &dyn EventSink,
    ) -> Result<String, Error> {
        let Some(completion) = session.pending.take() else {
            return Ok(NO_TOOL_EXECUTED.into());
        };
        let (text, calls, feedback) = match completion {
            Completion::NativeCalls { text, calls } => (text, calls, Feedback::Native),
            Completion::FreeText(text) => match parse_tool_calls(&text) {
                Some(calls) => (text, calls, Feedback::Report),
                None => return Ok(NO_TOOL_EXECUTED.into()),
            },
        };

        let mut outputs = Vec::with_capacity(calls.len());
        for call in &calls {
            outputs.push(self.dispatch(call, sink).await?);
        }

        let report = calls
            .iter()
            .zip(&outputs)
            .map(|(call, output)| format!("Tool [{}] result: {output}", call.name))
            .collect::<Vec<_>>()
            .join("\n");

        match feedback {
            Feedback::Report => {
                session.transcript.push(Message::assistant(text));
                session
                    .transcript
                    .push(Message::user(format!("{EXECUTION_REPORT_HEADER}\n{report}")));
            }
            Feedback::Native => {
                let results: Vec<_> = calls
                    .iter()
                    .zip(outputs)
                    .map(|(call, output)| Message::tool_result(call.id.clone(), output))
                    .collect();
                session.transcript.push(Message::assistant_with_calls(text, calls));
                session.transcript.extend(results);
            }
        }

        Ok(report)
    }

    /// Run a single call. Only a termination signal is returned as `Err`;
    /// every other outcome becomes the call's result string.
    async fn dispatch(&self, call: &ToolCall, sink: &dyn EventSink) -> Result<String, Error> {
        emit(sink, AgentEvent::action(&call.name, &call.arguments));

        let Some(tool) = self.tools.resolve(&call.name) else {
            let message = format!(
                "Error: Tool '{}' not found. Available tools: {}",
                call.name,
                self.tools.names().join(", ")
            );
            warn!(tool = %call.name, "Model requested an unknown tool");
            emit(sink, AgentEvent::error(message.clone()));
            return Ok(message);
        };

        if tool.name() != call.name {
            debug!(requested = %call.name, resolved = tool.name(), "Resolved tool by partial name");
        }

        let outcome = match parse_arguments(&call.arguments) {
            Ok(arguments) => AssertUnwindSafe(tool.execute(arguments))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(ToolError::ExecutionFailed {
                        tool_name: tool.name().to_string(),
                        reason: format!("panicked: {}", panic_message(panic.as_ref())),
                    })
                }),
            Err(e) => Err(e),
        };

        let output = match outcome {
            Ok(result) => result.output,
            Err(e) => {
                if let Some(signal) = e.termination() {
                    self.finish(sink, signal.reason());
                    return Err(e.into());
                }
                warn!(tool = tool.name(), error = %e, "Tool execution failed");
                emit(sink, AgentEvent::error(format!("Tool '{}' failed: {e}", tool.name())));
                format!("Error: {e}")
            }
        };

        emit(sink, AgentEvent::result(preview(&output, self.config.result_preview_chars)));

        if tool.name() == self.config.termination_tool || is_termination_output(&output) {
            let reason = extract_reason(&call.arguments);
            self.finish(sink, &reason);
            return Err(Error::Terminated(TerminationSignal::new(reason)));
        }

        Ok(output)
    }

    /// Mark the task complete and announce the answer.
    pub(crate) fn finish(&self, sink: &dyn EventSink, reason: &str) {
        info!(agent = %self.config.name, reason, "Task complete");
        self.set_state(AgentState::Finished);
        emit(sink, AgentEvent::answer(reason));
    }
}

fn parse_arguments(raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Display view of a tool result, bounded to `limit` characters.
fn preview(output: &str, limit: usize) -> Cow<'_, str> {
    match output.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &output[..cut])),
        None => Cow::Borrowed(output),
    }
}

/// The `reason` field of a termination call, or its raw arguments.
fn extract_reason(arguments: &str) -> String {
    serde_json::from_str::<serde_json::Value>(arguments)
        .ok()
        .and_then(|v| v.get("reason").and_then(|r| r.as_str()).map(str::to_owned))
        .unwrap_or_else(|| arguments.to_owned())
}
