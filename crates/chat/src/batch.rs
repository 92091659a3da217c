//! Batch job description, sharding, and the batch report.
//!
//! The dispatcher that executes a [`BatchJob`] lives in the `llm` crate; this
//! module holds the parts that involve no I/O: how prompts are split between
//! workers and what a finished batch looks like.

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BatchRunId, ModelId, RequestSpec, SamplingParams, Timestamp, DEFAULT_TIMEOUT};

/// System instruction sent with every batch prompt unless overridden.
pub const DEFAULT_BATCH_SYSTEM: &str = "You are a helpful assistant.";

// ---------------------------------------------------------------------------
// Sharding
// ---------------------------------------------------------------------------

/// A contiguous slice of the prompt index space owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shard {
    pub id: usize,
    pub range: Range<usize>,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Splits `len` prompts into `workers` contiguous shards.
///
/// Every shard holds `len / workers` prompts except the last, which also takes
/// the remainder. When `workers > len` the leading shards are empty and the
/// last one holds everything. `workers == 0` is treated as 1.
pub fn shard_ranges(len: usize, workers: usize) -> Vec<Shard> {
    let workers = workers.max(1);
    let size = len / workers;
    (0..workers)
        .map(|id| {
            let start = id * size;
            let end = if id == workers - 1 { len } else { start + size };
            Shard {
                id,
                range: start..end,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A list of prompts to complete against one model.
///
/// Batch mode is single-sample: `sampling.n` is forced to 1 when requests are
/// built and only the first completion of each response is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub prompts: Vec<String>,
    pub workers: usize,
    pub model: ModelId,
    pub system: Option<String>,
    pub sampling: SamplingParams,
    pub timeout: Duration,
    /// Report per-shard progress to the sink.
    pub show_progress: bool,
    /// Echo every raw response to the sink. Always on for single-worker jobs.
    pub echo_responses: bool,
}

impl BatchJob {
    pub fn new(model: ModelId, prompts: Vec<String>, workers: usize) -> Self {
        Self {
            prompts,
            workers: workers.max(1),
            model,
            system: Some(DEFAULT_BATCH_SYSTEM.to_string()),
            sampling: SamplingParams::batch(),
            timeout: DEFAULT_TIMEOUT,
            show_progress: true,
            echo_responses: false,
        }
    }

    /// `None` sends prompts without a system message.
    #[must_use]
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_responses = echo;
        self
    }

    pub fn shards(&self) -> Vec<Shard> {
        shard_ranges(self.prompts.len(), self.workers)
    }

    pub fn echoes(&self) -> bool {
        self.echo_responses || self.workers == 1
    }

    /// The request sent for one prompt of this job.
    pub fn request_for(&self, prompt: &str) -> RequestSpec {
        let sampling = SamplingParams { n: 1, ..self.sampling };
        let spec = RequestSpec::new(self.model.clone(), prompt)
            .with_sampling(sampling)
            .with_timeout(self.timeout);
        match &self.system {
            Some(system) => spec.with_system(system.clone()),
            None => spec,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A prompt that produced no result. Its result slot holds `""`.
///
/// `attempts` is 0 when settling the prompt panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub index: usize,
    pub attempts: u32,
    pub last_error: String,
}

/// Outcome of a batch.
///
/// `results[i]` always corresponds to `prompts[i]`. Failed prompts hold an
/// empty string and are listed in `failures` in index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: BatchRunId,
    pub results: Vec<String>,
    pub failures: Vec<BatchFailure>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl BatchReport {
    /// `true` when no prompt fell back to the empty placeholder.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_results(self) -> Vec<String> {
        self.results
    }

    /// Wall-clock time between start and finish. Zero if the clock stepped back.
    pub fn elapsed(&self) -> Duration {
        (self.finished_at.as_datetime() - self.started_at.as_datetime())
            .to_std()
            .unwrap_or_default()
    }
}
