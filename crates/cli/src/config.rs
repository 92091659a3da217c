//! Command-line and environment configuration.
//!
//! Every option can also be supplied through the environment variable named
//! in its help text. Credentials are never accepted on the command line; they
//! are read from the per-backend variables at resolution time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chat::{
    BatchJob, ImmediateRetryPolicy, JitteredBackoffPolicy, Message, ModelId, RequestSpec,
    RetryPolicy, SamplingParams, ServiceTag,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "bulkchat", version, about = "Issue chat-completion requests one at a time or in bulk")]
pub struct Cli {
    /// Model identifier sent to the backend.
    #[arg(long, env = "BULKCHAT_MODEL")]
    pub model: String,

    /// Hosting provider (`vllm`, `siliconflow`). Omit to infer from the model prefix.
    #[arg(long, env = "BULKCHAT_SERVICE")]
    pub service: Option<String>,

    /// Per-attempt request timeout in seconds.
    #[arg(long, env = "BULKCHAT_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, env = "BULKCHAT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one prompt and print every completion as a JSON array.
    Complete(CompleteArgs),
    /// Complete a file of prompts concurrently and print the results as a JSON array.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    #[arg(long)]
    pub prompt: String,

    /// System instruction placed before the history.
    #[arg(long)]
    pub system: Option<String>,

    /// JSON file holding prior turns as `[{"role": ..., "content": ...}]`.
    #[arg(long)]
    pub history: Option<PathBuf>,

    #[arg(long, default_value_t = 2048)]
    pub max_tokens: u32,

    /// Number of completions to generate.
    #[arg(long, default_value_t = 1)]
    pub n: u32,

    #[arg(long, default_value_t = 0.8)]
    pub temperature: f32,

    #[arg(long, default_value_t = 1.0)]
    pub top_p: f32,

    /// Total attempts before giving up.
    #[arg(long, default_value_t = ImmediateRetryPolicy::DEFAULT_ATTEMPTS)]
    pub retries: u32,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Prompts as a JSON array of strings, or one prompt per line.
    #[arg(long)]
    pub input: PathBuf,

    /// Number of concurrent workers.
    #[arg(long, env = "BULKCHAT_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Attempts per prompt before recording an empty result.
    #[arg(long, default_value_t = JitteredBackoffPolicy::DEFAULT_ATTEMPTS)]
    pub retries: u32,

    /// Upper bound of the random sleep between attempts, in seconds.
    #[arg(long, default_value_t = 5.0)]
    pub max_jitter_secs: f64,

    /// System instruction sent with every prompt.
    #[arg(long, default_value = chat::DEFAULT_BATCH_SYSTEM)]
    pub system: String,

    #[arg(long, default_value_t = 2000)]
    pub max_tokens: u32,

    #[arg(long, default_value_t = 0.2)]
    pub temperature: f32,

    /// Do not report per-shard progress.
    #[arg(long)]
    pub no_progress: bool,

    /// Log every raw response.
    #[arg(long)]
    pub echo: bool,
}

// ---------------------------------------------------------------------------

impl Cli {
    pub fn model_id(&self) -> anyhow::Result<ModelId> {
        ModelId::new(self.model.clone()).ok_or_else(|| anyhow!("--model must not be empty"))
    }

    /// An empty `--service` is treated as absent.
    pub fn service_tag(&self) -> Option<ServiceTag> {
        self.service.clone().and_then(ServiceTag::new)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CompleteArgs {
    pub fn request(&self, model: ModelId, timeout: Duration, history: Vec<Message>) -> RequestSpec {
        let spec = RequestSpec::new(model, self.prompt.clone())
            .with_history(history)
            .with_sampling(SamplingParams {
                max_tokens: self.max_tokens,
                n: self.n,
                temperature: self.temperature,
                top_p: self.top_p,
            })
            .with_timeout(timeout);
        match &self.system {
            Some(system) => spec.with_system(system.clone()),
            None => spec,
        }
    }

    pub fn retry_policy(&self) -> Arc<dyn RetryPolicy> {
        Arc::new(ImmediateRetryPolicy::new(self.retries))
    }
}

impl BatchArgs {
    pub fn job(&self, model: ModelId, timeout: Duration, prompts: Vec<String>) -> BatchJob {
        BatchJob::new(model, prompts, self.workers)
            .with_system(Some(self.system.clone()).filter(|s| !s.is_empty()))
            .with_sampling(SamplingParams {
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                ..SamplingParams::batch()
            })
            .with_timeout(timeout)
            .with_progress(!self.no_progress)
            .with_echo(self.echo)
    }

    pub fn retry_policy(&self) -> anyhow::Result<Arc<dyn RetryPolicy>> {
        let jitter = Duration::try_from_secs_f64(self.max_jitter_secs)
            .with_context(|| format!("invalid --max-jitter-secs {}", self.max_jitter_secs))?;
        Ok(Arc::new(JitteredBackoffPolicy::new(self.retries, jitter)))
    }
}
