//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`ChatTransport`] | `llm::HttpTransport` (reqwest), test stubs |
//! | [`CredentialProvider`] | `llm::EnvCredentials`, [`StaticCredentials`] |
//! | [`ProgressSink`] | `llm::TracingProgress`, [`NoProgress`] |

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{BackendConfig, CompletionResult, RequestSpec, TransportError};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends one chat-completion request and returns the raw text of every choice.
///
/// Implementations make exactly one attempt. Retrying, timeouts, and trimming
/// are the caller's job. Implementations must be safe to share across
/// concurrently running batch workers.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        backend: &BackendConfig,
        request: &RequestSpec,
    ) -> Result<CompletionResult, TransportError>;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Looks up a secret by the name of the variable that holds it
/// (e.g. `"DEEPSEEK_API_KEY"`).
pub trait CredentialProvider: Send + Sync {
    fn credential(&self, variable: &str) -> Option<String>;
}

/// Credentials held in memory, for embedders and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, variable: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(variable.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self, variable: &str) -> Option<String> {
        self.values.get(variable).cloned()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Receives batch progress and diagnostics.
///
/// Every hook has a no-op default. Hooks are called concurrently from all
/// shard workers; `shard` identifies the caller.
pub trait ProgressSink: Send + Sync {
    /// A worker is about to process `total` prompts.
    fn shard_started(&self, _shard: usize, _total: usize) {}

    /// `done` of `total` prompts in the shard have been settled.
    fn item_finished(&self, _shard: usize, _done: usize, _total: usize) {}

    /// Attempt `attempt` (1-based) for the prompt at global `index` failed.
    fn attempt_failed(&self, _shard: usize, _index: usize, _attempt: u32, _error: &TransportError) {}

    /// Raw response text, reported only when echoing is enabled.
    fn response(&self, _shard: usize, _index: usize, _text: &str) {}

    /// The worker has settled all of its prompts; `failed` of them are empty.
    fn shard_finished(&self, _shard: usize, _failed: usize) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credentials_lookup() {
        let creds = StaticCredentials::new().with("GLM_API_KEY", "abc");
        assert_eq!(creds.credential("GLM_API_KEY").as_deref(), Some("abc"));
        assert_eq!(creds.credential("DEEPSEEK_API_KEY"), None);
    }
}
