//! Agent configuration and lifecycle state types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a single agent instance.
///
/// `Idle → Running → {Finished | Error} → Idle`. An agent only accepts a new
/// run while `Idle`, and always returns to `Idle` once the run is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Running,
    Finished,
    Error,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentState::Idle => "idle",
            AgentState::Running => "running",
            AgentState::Finished => "finished",
            AgentState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Configuration for the agent's behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name, used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// Persona / system directive sent with every completion
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Continuation directive appended to the transcript before each think
    #[serde(default = "default_next_step_prompt")]
    pub next_step_prompt: Option<String>,

    /// Step budget per run (liveness bound)
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Pause after a failed completion call before the loop continues
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Size of the tool result preview carried by `result` events
    #[serde(default = "default_result_preview_chars")]
    pub result_preview_chars: usize,

    /// Name of the tool that ends the task
    #[serde(default = "default_termination_tool")]
    pub termination_tool: String,
}

fn default_name() -> String {
    "Stepwise".into()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_next_step_prompt() -> Option<String> {
    Some(DEFAULT_NEXT_STEP_PROMPT.into())
}
fn default_max_steps() -> u32 {
    15
}
fn default_retry_backoff_ms() -> u64 {
    1000
}
fn default_result_preview_chars() -> usize {
    500
}
fn default_termination_tool() -> String {
    "terminate".into()
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Stepwise, an autonomous assistant that solves tasks step by step.

Tool protocol:
1. Work towards the user's goal and stop as soon as you have enough information.
2. Use the provided tools to inspect and change the workspace.
3. When the task is complete you MUST call the `terminate` tool with a short `reason`.
4. If native function calling is unavailable, reply with a single JSON block:
```json
{ "name": "terminate", "arguments": { "reason": "found the answer" } }
```
5. Use exactly the keys "name" and "arguments", and only the documented parameter names
   (for example `read_file` takes `path`, not `file_path`)."#;

const DEFAULT_NEXT_STEP_PROMPT: &str = "Based on the current state, what is your next action? \
If you need a tool, follow the tool protocol exactly.";

impl AgentConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            system_prompt: default_system_prompt(),
            next_step_prompt: default_next_step_prompt(),
            max_steps: default_max_steps(),
            retry_backoff_ms: default_retry_backoff_ms(),
            result_preview_chars: default_result_preview_chars(),
            termination_tool: default_termination_tool(),
        }
    }
}
