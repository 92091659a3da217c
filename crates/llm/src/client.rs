//! Single-request chat client.

use std::sync::Arc;

use chat::{
    BackendConfig, ChatError, ChatTransport, CompletionResult, ImmediateRetryPolicy, ModelId,
    RequestSpec, ResolveError, RetryPolicy, ServiceTag, TransportError,
};
use tracing::instrument;

use crate::{BackendResolver, HttpTransport};

/// Issues chat-completion requests against one resolved backend.
///
/// Cheap to clone; clones share the transport and retry policy. Safe to use
/// from many tasks at once.
#[derive(Clone)]
pub struct ChatClient {
    backend: BackendConfig,
    transport: Arc<dyn ChatTransport>,
    policy: Arc<dyn RetryPolicy>,
}

impl ChatClient {
    /// Creates a client that retries with [`ImmediateRetryPolicy::default`].
    pub fn new(backend: BackendConfig, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            backend,
            transport,
            policy: Arc::new(ImmediateRetryPolicy::default()),
        }
    }

    /// Resolves the backend for `model` and connects over HTTP.
    pub fn connect(
        resolver: &BackendResolver,
        model: &ModelId,
        service: Option<&ServiceTag>,
    ) -> Result<Self, ResolveError> {
        let backend = resolver.resolve(model, service)?;
        Ok(Self::new(backend, Arc::new(HttpTransport::new())))
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    /// Makes exactly one attempt, bounded by `spec.timeout`.
    ///
    /// Returned texts are trimmed. No retrying happens here.
    pub async fn attempt(&self, spec: &RequestSpec) -> Result<CompletionResult, TransportError> {
        let texts = tokio::time::timeout(spec.timeout, self.transport.send(&self.backend, spec))
            .await
            .map_err(|_| TransportError::Timeout {
                after: spec.timeout,
            })??;
        Ok(texts.into_iter().map(|t| t.trim().to_string()).collect())
    }

    /// Sends `spec`, retrying per the client's policy.
    ///
    /// Returns every completion text in choice order, or
    /// [`ChatError::Service`] once all attempts have failed.
    #[instrument(skip_all, fields(model = %spec.model, endpoint = %self.backend.endpoint))]
    pub async fn complete(&self, spec: &RequestSpec) -> Result<CompletionResult, ChatError> {
        let attempts = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            match self.attempt(spec).await {
                Ok(texts) => {
                    tracing::debug!(attempt, choices = texts.len(), "Chat completion succeeded");
                    return Ok(texts);
                }
                Err(error) => {
                    tracing::warn!(attempt, attempts, error = %error, "Chat completion attempt failed");
                    if attempt >= attempts {
                        return Err(ChatError::Service {
                            endpoint: self.backend.endpoint.clone(),
                            attempts,
                            source: error,
                        });
                    }
                    let delay = self.policy.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("backend", &self.backend)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
