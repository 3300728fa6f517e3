//! loopclaw CLI entry point.
//!
//! Sends a prompt to the model, runs the `Read`/`Write`/`Bash` tools it
//! asks for, and prints its final answer.

use clap::Parser;
use loopclaw::commands::agent::{self, AgentArgs};

#[derive(Parser)]
#[command(
    name = "loopclaw",
    about = "loopclaw: a minimal tool-calling agent",
    version
)]
struct Cli {
    /// The prompt to send to the model
    #[arg(short = 'p', long = "prompt")]
    prompt: String,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Override the maximum number of model turns
    #[arg(long)]
    max_turns: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    loopclaw::logging::init(cli.verbose);

    agent::run(AgentArgs {
        prompt: cli.prompt,
        model: cli.model,
        max_turns: cli.max_turns,
    })
    .await
}
