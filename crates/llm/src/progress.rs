//! [`ProgressSink`] that reports through `tracing`.

use chat::{ProgressSink, TransportError};

/// Logs shard progress at `info`, failed attempts at `warn`, and echoed
/// responses at `info` under the `bulkchat::response` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn shard_started(&self, shard: usize, total: usize) {
        tracing::info!(shard, total, "Shard started");
    }

    fn item_finished(&self, shard: usize, done: usize, total: usize) {
        tracing::info!(shard, done, total, "[shard {shard}] {done}/{total}");
    }

    fn attempt_failed(&self, shard: usize, index: usize, attempt: u32, error: &TransportError) {
        tracing::warn!(shard, index, attempt, error = %error, "Batch attempt failed");
    }

    fn response(&self, shard: usize, index: usize, text: &str) {
        tracing::info!(target: "bulkchat::response", shard, index, "==== Response ====\n{text}");
    }

    fn shard_finished(&self, shard: usize, failed: usize) {
        tracing::info!(shard, failed, "Shard finished");
    }
}
