//! The conversation loop, the core of loopclaw.
//!
//! 1. **Seed** a transcript with the user's prompt
//! 2. **Send** the transcript and the tool definitions to the provider
//! 3. **If tool calls**: execute them in order, append each result, go to 2
//! 4. **If text only**: that text is the final answer
//!
//! The loop ends on a text-only turn, or fails once the turn limit is hit.

pub mod loop_runner;

pub use loop_runner::{AgentLoop, DEFAULT_MAX_TURNS, FinalAnswer};
