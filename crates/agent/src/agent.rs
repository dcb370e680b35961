//! The agent state machine.
//!
//! An [`Agent`] owns its lifecycle state, its transcript and its step
//! counter. It is single-flight: `run` is rejected with [`Error::Busy`]
//! unless the agent is `Idle`, and the agent is always `Idle` again once
//! `run` returns, however the run ended.

use std::sync::{Arc, Mutex, MutexGuard};

use stepwise_core::tool::TERMINATE_NOW;
use stepwise_core::{
    AgentConfig, AgentEvent, AgentState, Completion, Error, EventSink, Message, Provider,
    ToolRegistry, Transcript,
};
use tracing::{debug, info, warn};

/// Run-scoped data, exclusively owned by the executing `run`.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) transcript: Transcript,
    pub(crate) current_step: u32,
    /// The completion that asked for action, waiting for `act`.
    pub(crate) pending: Option<Completion>,
}

/// A reason-then-act agent.
///
/// Build one per task. The same instance can run many tasks one after
/// another, but never two at once.
pub struct Agent {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) model: String,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) config: AgentConfig,
    state: Mutex<AgentState>,
    session: tokio::sync::Mutex<Session>,
}

/// Resets the agent to `Idle` when dropped, including when the run future
/// is cancelled mid-flight.
struct IdleGuard<'a>(&'a Mutex<AgentState>);

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        *lock_state(self.0) = AgentState::Idle;
    }
}

fn lock_state(state: &Mutex<AgentState>) -> MutexGuard<'_, AgentState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            config,
            state: Mutex::new(AgentState::Idle),
            session: tokio::sync::Mutex::new(Session::default()),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per completion.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Override the configured step budget.
    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.config.max_steps = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> AgentState {
        *lock_state(&self.state)
    }

    pub(crate) fn set_state(&self, state: AgentState) {
        *lock_state(&self.state) = state;
    }

    /// Snapshot of the last run's transcript. Waits for an active run to finish.
    pub async fn transcript(&self) -> Transcript {
        self.session.lock().await.transcript.clone()
    }

    /// Steps taken by the last run. Waits for an active run to finish.
    pub async fn current_step(&self) -> u32 {
        self.session.lock().await.current_step
    }

    /// Run a task to completion and return a human-readable trace.
    ///
    /// The only error is [`Error::Busy`]. Termination, step-budget
    /// exhaustion and failures are all reported in the returned summary
    /// (and as events), never raised.
    pub async fn run(&self, task: &str, sink: &dyn EventSink) -> Result<String, Error> {
        {
            let mut state = lock_state(&self.state);
            if *state != AgentState::Idle {
                return Err(Error::Busy { state: *state });
            }
            *state = AgentState::Running;
        }
        let _idle = IdleGuard(&self.state);

        let mut session = self.session.lock().await;
        session.current_step = 0;
        session.pending = None;
        session.transcript.clear();
        session.transcript.push(Message::user(task));

        let max_steps = self.config.max_steps;
        info!(agent = %self.config.name, max_steps, "Agent run started");
        emit(sink, AgentEvent::thinking(format!("Task started: {task}")));

        let mut results = Vec::new();
        while session.current_step < max_steps && self.state() != AgentState::Finished {
            session.current_step += 1;
            let step = session.current_step;
            debug!(agent = %self.config.name, step, max_steps, "Entering step");
            emit(sink, AgentEvent::thinking(format!("Entering step {step}/{max_steps}")));

            match self.step(&mut session, sink).await {
                Ok(result) => {
                    let done = result.contains(TERMINATE_NOW);
                    results.push(format!("Step {step}: {result}"));
                    if done {
                        info!(step, "Completion sentinel found in step result");
                        self.set_state(AgentState::Finished);
                        break;
                    }
                }
                Err(e) => {
                    if let Some(signal) = e.termination() {
                        info!(step, reason = signal.reason(), "Task terminated");
                        self.set_state(AgentState::Finished);
                        results.push(format!("Step {step}: Task complete: {}", signal.reason()));
                    } else {
                        warn!(step, error = %e, "Agent run failed");
                        self.set_state(AgentState::Error);
                        emit(sink, AgentEvent::error(format!("Execution failed: {e}")));
                        results.push(format!("Step {step}: Execution failed: {e}"));
                    }
                    break;
                }
            }
        }

        if self.state() == AgentState::Running {
            warn!(agent = %self.config.name, max_steps, "Step budget exhausted, forcing termination");
            self.set_state(AgentState::Finished);
            let notice = format!("Forced termination: step budget of {max_steps} exhausted");
            emit(sink, AgentEvent::error(notice.clone()));
            results.push(notice);
        }

        info!(
            agent = %self.config.name,
            steps = session.current_step,
            state = %self.state(),
            "Agent run finished"
        );
        Ok(results.join("\n"))
    }
}

/// Deliver an event, logging (and otherwise ignoring) sink failures.
pub(crate) fn emit(sink: &dyn EventSink, event: AgentEvent) {
    if let Err(e) = sink.accept(event) {
        warn!(error = %e, "Event sink rejected event");
    }
}
