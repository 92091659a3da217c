//! Wall-clock timing wrappers.
//!
//! Purely observational: the wrapped operation's output, including any error
//! it returns, is passed through untouched.

use std::future::Future;
use std::time::Instant;

/// Awaits `operation`, logging its name before and its duration after.
pub async fn timed<F, T>(name: &str, operation: F) -> T
where
    F: Future<Output = T>,
{
    tracing::info!(operation = name, "[{name}] running ...");
    let start = Instant::now();
    let output = operation.await;
    report(name, start);
    output
}

/// Synchronous counterpart of [`timed`].
pub fn timed_sync<T>(name: &str, operation: impl FnOnce() -> T) -> T {
    tracing::info!(operation = name, "[{name}] running ...");
    let start = Instant::now();
    let output = operation();
    report(name, start);
    output
}

fn report(name: &str, start: Instant) {
    let seconds = start.elapsed().as_secs();
    tracing::info!(operation = name, elapsed_secs = seconds, "[{name}] cost {seconds} seconds.");
}
