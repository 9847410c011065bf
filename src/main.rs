use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chatsim::configuration::Settings;
use chatsim::prompt::cliclack::CliclackPrompt;
use chatsim::providers::sequence::SequenceExecutor;
use chatsim::providers::types::conversation::ConversationTurn;
use chatsim::session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Secrets file with a [general] table (defaults to ./secrets.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sequence to execute (overrides model_name from the configuration)
    #[arg(short, long)]
    sequence: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a saved transcript once and print the agent reply
    Submit {
        /// JSON file holding [{"speaker": "customer"|"agent", "text": "..."}]
        #[arg(short, long)]
        transcript: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let sequence_name = cli
        .sequence
        .unwrap_or_else(|| settings.general.model_name.clone());

    let client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let executor = SequenceExecutor::with_credentials(
        client,
        settings.general.api_base_url.clone(),
        settings.credentials(),
        settings.retry_policy(),
    );

    let mut session = Session::new(
        Box::new(executor),
        Box::new(CliclackPrompt::new()),
        sequence_name,
        settings.conversation_meta(),
    );

    match cli.command {
        Some(Command::Submit { transcript }) => {
            let contents = fs::read_to_string(&transcript)
                .with_context(|| format!("Failed to read {}", transcript.display()))?;
            let turns: Vec<ConversationTurn> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", transcript.display()))?;
            session.headless_start(turns)
        }
        None => session.start(),
    }
}
