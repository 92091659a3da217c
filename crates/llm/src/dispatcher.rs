//! Concurrent batch dispatcher.
//!
//! A [`BatchJob`]'s prompts are split into contiguous shards (see
//! [`chat::shard_ranges`]). Each non-empty shard is handed to its own tokio
//! task, which works through its prompts in order and returns one outcome per
//! prompt. The dispatcher waits for every task and copies each shard's
//! outcomes into its slice of the pre-sized result vector, so `results[i]`
//! always belongs to `prompts[i]`.
//!
//! A prompt that exhausts its retries yields `""` and a [`BatchFailure`];
//! the rest of the batch is unaffected. A panic while settling one prompt is
//! caught at that prompt, so it fails alone and its shard carries on. There is
//! no cancellation: once started, every shard runs to completion.

use std::any::Any;
use std::ops::Range;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chat::{
    BatchFailure, BatchJob, BatchReport, BatchRunId, JitteredBackoffPolicy, ProgressSink,
    RetryPolicy, Shard, Timestamp, TransportError,
};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{ChatClient, TracingProgress};

/// Runs batch jobs against one [`ChatClient`].
///
/// The client's own retry policy is not used here; batch prompts retry per
/// the dispatcher's policy, a [`JitteredBackoffPolicy`] by default.
///
/// Completions are trimmed before they are stored. A reply that is empty or
/// only whitespace counts as an empty response and is retried.
#[derive(Clone)]
pub struct Dispatcher {
    client: ChatClient,
    policy: Arc<dyn RetryPolicy>,
    progress: Arc<dyn ProgressSink>,
}

impl Dispatcher {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            policy: Arc::new(JitteredBackoffPolicy::default()),
            progress: Arc::new(TracingProgress),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Completes every prompt of `job` and returns once all workers have
    /// finished.
    pub async fn run(&self, job: BatchJob) -> BatchReport {
        let run_id = BatchRunId::new_random();
        let span = tracing::info_span!(
            "batch",
            run_id = %run_id,
            model = %job.model,
            prompts = job.prompts.len(),
            workers = job.workers
        );
        self.execute(run_id, job).instrument(span).await
    }

    async fn execute(&self, run_id: BatchRunId, job: BatchJob) -> BatchReport {
        let started_at = Timestamp::now();
        let job = Arc::new(job);
        let mut results = vec![String::new(); job.prompts.len()];
        let mut failures = Vec::new();

        let mut handles: Vec<(Range<usize>, JoinHandle<Vec<Outcome>>)> = Vec::new();
        for shard in job.shards() {
            if shard.is_empty() {
                continue;
            }
            let span = tracing::info_span!(
                "shard",
                shard = shard.id,
                start = shard.range.start,
                end = shard.range.end
            );
            let worker = ShardWorker {
                client: self.client.clone(),
                policy: Arc::clone(&self.policy),
                progress: Arc::clone(&self.progress),
                job: Arc::clone(&job),
            };
            let range = shard.range.clone();
            handles.push((range, tokio::spawn(worker.run(shard).instrument(span))));
        }

        // Shards are awaited in index order, so failures stay sorted by index.
        for (range, handle) in handles {
            match handle.await {
                Ok(outcomes) => {
                    for (index, outcome) in range.zip(outcomes) {
                        match outcome {
                            Outcome::Completed(text) => results[index] = text,
                            Outcome::Failed { attempts, error } => failures.push(BatchFailure {
                                index,
                                attempts,
                                last_error: error,
                            }),
                        }
                    }
                }
                Err(join_error) => {
                    tracing::error!(
                        start = range.start,
                        end = range.end,
                        error = %join_error,
                        "Shard worker aborted; its prompts are recorded as failed"
                    );
                    failures.extend(range.map(|index| BatchFailure {
                        index,
                        attempts: 0,
                        last_error: format!("worker aborted: {join_error}"),
                    }));
                }
            }
        }

        let report = BatchReport {
            run_id,
            results,
            failures,
            started_at,
            finished_at: Timestamp::now(),
        };
        let elapsed_ms = report.elapsed().as_millis() as u64;
        if report.is_complete() {
            tracing::info!(prompts = report.results.len(), elapsed_ms, "Batch complete");
        } else {
            tracing::warn!(
                prompts = report.results.len(),
                failed = report.failures.len(),
                elapsed_ms,
                "Batch complete with empty results"
            );
        }
        report
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("client", &self.client)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

enum Outcome {
    Completed(String),
    /// `attempts` is 0 when settling panicked.
    Failed { attempts: u32, error: String },
}

struct ShardWorker {
    client: ChatClient,
    policy: Arc<dyn RetryPolicy>,
    progress: Arc<dyn ProgressSink>,
    job: Arc<BatchJob>,
}

impl ShardWorker {
    async fn run(self, shard: Shard) -> Vec<Outcome> {
        let total = shard.len();
        let show = self.job.show_progress;
        if show {
            self.progress.shard_started(shard.id, total);
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut failed = 0;
        for (done, index) in shard.range.clone().enumerate() {
            let outcome = AssertUnwindSafe(self.settle(shard.id, index))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let reason = panic_message(payload.as_ref());
                    tracing::error!(index, reason = %reason, "Prompt panicked while settling");
                    Outcome::Failed {
                        attempts: 0,
                        error: format!("panicked: {reason}"),
                    }
                });
            if matches!(outcome, Outcome::Failed { .. }) {
                failed += 1;
            }
            outcomes.push(outcome);
            if show {
                self.progress.item_finished(shard.id, done + 1, total);
            }
        }

        if show {
            self.progress.shard_finished(shard.id, failed);
        }
        outcomes
    }

    /// Retries one prompt until it yields a non-empty first completion or the
    /// policy's attempts run out.
    async fn settle(&self, shard: usize, index: usize) -> Outcome {
        let spec = self.job.request_for(&self.job.prompts[index]);
        let echo = self.job.echoes();
        let attempts = self.policy.max_attempts();
        let mut last_error = TransportError::EmptyResponse;

        for attempt in 1..=attempts {
            match self.client.attempt(&spec).await {
                Ok(texts) => {
                    let text = texts.into_iter().next().unwrap_or_default();
                    if echo {
                        self.progress.response(shard, index, &text);
                    }
                    if !text.is_empty() {
                        return Outcome::Completed(text);
                    }
                    last_error = TransportError::EmptyResponse;
                }
                Err(error) => last_error = error,
            }

            self.progress.attempt_failed(shard, index, attempt, &last_error);
            if attempt < attempts {
                let delay = self.policy.delay_after(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Outcome::Failed {
            attempts,
            error: last_error.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
