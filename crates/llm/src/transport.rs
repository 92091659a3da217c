//! reqwest-backed [`ChatTransport`].

use async_trait::async_trait;
use chat::{BackendConfig, ChatTransport, CompletionResult, RequestSpec, TransportError};

use crate::wire::{ChatCompletionRequest, ChatCompletionResponse};

/// Sends requests to `POST {endpoint}/chat/completions` with a bearer token.
///
/// Wraps one [`reqwest::Client`]; its connection pool is shared by every batch
/// worker.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(
        &self,
        backend: &BackendConfig,
        request: &RequestSpec,
    ) -> Result<CompletionResult, TransportError> {
        let response = self
            .http
            .post(backend.chat_completions_url())
            .bearer_auth(backend.credential.expose())
            .timeout(request.timeout)
            .json(&ChatCompletionRequest::from(request))
            .send()
            .await
            .map_err(|e| classify(e, request))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| classify(e, request))?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))?;
        Ok(parsed.into_texts())
    }
}

fn classify(error: reqwest::Error, request: &RequestSpec) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            after: request.timeout,
        }
    } else {
        TransportError::Network(error.to_string())
    }
}
