//! `loopclaw -p <prompt>`: single-prompt agent run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use loopclaw_agent::{AgentLoop, FinalAnswer};
use loopclaw_config::AppConfig;
use loopclaw_providers::OpenAiCompatProvider;
use loopclaw_tools::{ShellPolicy, default_registry};

/// Line written to stderr once the run has finished.
pub const DIAGNOSTIC_LINE: &str = "Logs from your program will appear here!";

/// Command-line inputs for one run.
#[derive(Debug, Clone)]
pub struct AgentArgs {
    pub prompt: String,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
}

pub async fn run(args: AgentArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;

    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
    }
    config.validate().context("Invalid command-line override")?;

    tracing::debug!(?config, "Configuration resolved");

    let answer = execute(&config, &args.prompt).await?;

    eprintln!("{DIAGNOSTIC_LINE}");
    println!("{}", answer.text);
    Ok(())
}

/// Build the agent from `config` and run `prompt` to completion.
pub async fn execute(config: &AppConfig, prompt: &str) -> anyhow::Result<FinalAnswer> {
    let agent = build_agent(config).context("Failed to start agent")?;
    agent.run(prompt).await.context("Agent run failed")
}

/// Assemble provider, tools, and loop. Fails before any network traffic
/// when the credential is missing.
pub fn build_agent(config: &AppConfig) -> loopclaw_core::Result<AgentLoop> {
    let api_key = config.require_api_key()?;

    let provider = OpenAiCompatProvider::new(
        "openrouter",
        &config.base_url,
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let tools = default_registry(ShellPolicy {
        allowed_commands: config.allowed_commands.clone(),
        timeout: Duration::from_secs(config.command_timeout_secs),
    });

    let mut agent = AgentLoop::new(Arc::new(provider), &config.model, Arc::new(tools))
        .with_max_turns(config.max_turns);

    if let Some(temperature) = config.temperature {
        agent = agent.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        agent = agent.with_max_tokens(max_tokens);
    }

    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_fails_to_build() {
        let err = build_agent(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, loopclaw_core::Error::Config { .. }));
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn configured_limits_reach_the_loop() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            max_turns: 4,
            ..AppConfig::default()
        };
        let agent = build_agent(&config).unwrap();
        assert_eq!(agent.max_turns(), 4);
    }
}
