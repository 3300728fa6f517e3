//! The agent conversation loop implementation.

use std::sync::Arc;
use std::time::Instant;

use loopclaw_core::error::Error;
use loopclaw_core::message::{Message, Transcript};
use loopclaw_core::provider::{Provider, ProviderRequest, Usage};
use loopclaw_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

/// Turn limit applied when none is configured.
pub const DEFAULT_MAX_TURNS: u32 = 50;

/// The outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAnswer {
    /// Text of the last assistant turn (empty if the model sent none)
    pub text: String,

    /// Provider round trips taken, including the final one
    pub turns: u32,

    /// Token usage summed over all turns that reported it
    pub usage: Usage,
}

/// Drives a transcript against a provider, dispatching tool requests
/// until the model answers without any.
pub struct AgentLoop {
    /// The chat-completion provider
    provider: Arc<dyn Provider>,

    /// The model to request
    model: String,

    /// Tools advertised to the model
    tools: Arc<ToolRegistry>,

    /// Maximum provider round trips per run
    max_turns: u32,

    /// Sampling temperature, provider default when unset
    temperature: Option<f32>,

    /// Max tokens per response, provider default when unset
    max_tokens: Option<u32>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            tools,
            max_turns: DEFAULT_MAX_TURNS,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the maximum number of provider round trips.
    ///
    /// A limit of zero is raised to one.
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max.max(1);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens per response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Run a fresh transcript seeded with `prompt`.
    pub async fn run(&self, prompt: &str) -> Result<FinalAnswer, Error> {
        let mut transcript = Transcript::with_prompt(prompt);
        self.process(&mut transcript).await
    }

    /// Drive `transcript` until the model returns a plain answer.
    ///
    /// Every tool request of a turn gets exactly one tool-result message,
    /// appended in request order before the next provider call. Tool
    /// failures become result text; only provider failures, an empty
    /// candidate list, or the turn limit end the run with an error.
    pub async fn process(&self, transcript: &mut Transcript) -> Result<FinalAnswer, Error> {
        info!(
            transcript_id = %transcript.id,
            messages = transcript.len(),
            model = %self.model,
            "Processing transcript"
        );

        let tool_definitions = self.tools.definitions();
        let mut usage = Usage::default();
        let mut turns = 0;

        loop {
            if turns >= self.max_turns {
                warn!(
                    transcript_id = %transcript.id,
                    max_turns = self.max_turns,
                    "Turn limit reached while the model still requests tools"
                );
                return Err(Error::MaxTurnsExceeded {
                    max_turns: self.max_turns,
                });
            }
            turns += 1;

            debug_assert!(
                transcript.unanswered_tool_calls().is_empty(),
                "tool requests left unanswered before provider call"
            );
            debug!(transcript_id = %transcript.id, turn = turns, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: transcript.messages().to_vec(),
                tools: tool_definitions.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let response = self.provider.complete(request).await?;

            if let Some(u) = response.usage {
                usage.prompt_tokens += u.prompt_tokens;
                usage.completion_tokens += u.completion_tokens;
                usage.total_tokens += u.total_tokens;
            }

            let Some(reply) = response.message else {
                warn!(transcript_id = %transcript.id, turn = turns, "Provider returned no choices");
                return Err(Error::NoResponse);
            };

            if !reply.has_tool_calls() {
                let text = reply.content.clone().unwrap_or_default();
                transcript.push(reply.into_message());
                info!(
                    transcript_id = %transcript.id,
                    turns,
                    total_tokens = usage.total_tokens,
                    "Final answer received"
                );
                return Ok(FinalAnswer { text, turns, usage });
            }

            debug!(tool_count = reply.tool_calls.len(), "Executing tool calls");

            let tool_calls = reply.tool_calls.clone();
            transcript.push(reply.into_message());

            // One result per request, in request order.
            for call in &tool_calls {
                let start = Instant::now();
                let result = self.tools.dispatch(call).await;

                debug!(
                    tool = %call.name,
                    call_id = %call.id,
                    success = result.success,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool finished"
                );

                transcript.push(Message::tool_result(&call.id, result.output));
            }
        }
    }
}
