//! Error taxonomy for backend resolution and chat-completion calls.
//!
//! Three layers, from the inside out:
//!
//! - [`TransportError`] describes why one attempt failed. Retry policies
//!   consume it; it never reaches a batch caller.
//! - [`ResolveError`] is produced before any request is sent and is never
//!   retried.
//! - [`ChatError`] is what the single-request client returns once its retry
//!   budget is spent.
//!
//! Batch mode has no error type of its own: a failed item becomes an empty
//! string plus a [`crate::BatchFailure`] entry in the report.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Errors raised while mapping a model/service pair to connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Neither the service tag nor the model prefix matches a known backend.
    #[error("Unsupported backend for model '{model}' (service: {})", .service.as_deref().unwrap_or("<none>"))]
    UnsupportedBackend {
        model: String,
        service: Option<String>,
    },

    /// The backend is known but its credential variable is not set.
    #[error("Missing credential for backend '{backend}': set {variable}")]
    MissingCredential {
        backend: String,
        variable: String,
    },
}

// ---------------------------------------------------------------------------
// Per-attempt failures
// ---------------------------------------------------------------------------

/// Why a single request attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt did not finish within its timeout.
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded as a chat completion.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The backend returned no text.
    #[error("Empty response")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Single-request client
// ---------------------------------------------------------------------------

/// Errors returned by the single-request client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Every attempt failed. Carries the endpoint that was being called and
    /// the last attempt's failure.
    #[error("Service error from {endpoint} after {attempts} attempt(s)")]
    Service {
        endpoint: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },
}
