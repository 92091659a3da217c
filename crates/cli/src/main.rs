//! bulkchat CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags and `BULKCHAT_*` environment variables
//!    (see [`config`]).
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer
//!    on stderr, plus an OpenTelemetry OTLP exporter when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 3. **Construct infrastructure**: resolve the backend from environment
//!    credentials, build the HTTP-backed `ChatClient`, and inject it into the
//!    command being run.
//! 4. **Run the command**: `complete` for one prompt, `batch` for a file of
//!    prompts. Results are printed to stdout as JSON.

mod config;
mod input;
mod observability;

use std::sync::Arc;

use chat::timed;
use clap::Parser;
use llm::{BackendResolver, ChatClient, Dispatcher, EnvCredentials};

use config::{BatchArgs, Cli, Command, CompleteArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = observability::init(cli.log_format)?;

    let model = cli.model_id()?;
    let service = cli.service_tag();
    let resolver = BackendResolver::new(Arc::new(EnvCredentials));
    let client = ChatClient::connect(&resolver, &model, service.as_ref())?;

    match &cli.command {
        Command::Complete(args) => timed("complete", complete(&cli, args, client)).await,
        Command::Batch(args) => timed("batch", batch(&cli, args, client)).await,
    }
}

async fn complete(cli: &Cli, args: &CompleteArgs, client: ChatClient) -> anyhow::Result<()> {
    let history = match &args.history {
        Some(path) => input::read_history(path)?,
        None => Vec::new(),
    };
    let spec = args.request(cli.model_id()?, cli.timeout(), history);
    let completions = client
        .with_retry_policy(args.retry_policy())
        .complete(&spec)
        .await?;
    println!("{}", serde_json::to_string_pretty(&completions)?);
    Ok(())
}

async fn batch(cli: &Cli, args: &BatchArgs, client: ChatClient) -> anyhow::Result<()> {
    let prompts = input::read_prompts(&args.input)?;
    let job = args.job(cli.model_id()?, cli.timeout(), prompts);
    let report = Dispatcher::new(client)
        .with_retry_policy(args.retry_policy()?)
        .run(job)
        .await;

    for failure in &report.failures {
        tracing::warn!(
            index = failure.index,
            attempts = failure.attempts,
            error = %failure.last_error,
            "Prompt produced no result"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report.results)?);
    Ok(())
}
