//! The reason-then-act loop: the heart of Stepwise.
//!
//! An [`Agent`] drives a language model through a **Think → Act** cycle:
//!
//! 1. **Seed** the transcript with the task
//! 2. **Think**: send persona, transcript and tool declarations to the provider
//! 3. **Act**: if the reply asks for tools (natively, or as JSON embedded in
//!    its text), dispatch them in order and fold the results back in
//! 4. **Repeat** until a termination signal or the step budget runs out
//!
//! Every phase transition is reported to the caller's
//! [`EventSink`](stepwise_core::EventSink).

mod agent;
pub mod fallback;
mod step;

#[cfg(test)]
mod test_helpers;

pub use agent::Agent;
pub use fallback::{looks_like_tool_call, parse_tool_calls};
