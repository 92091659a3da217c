//! Domain layer for bulkchat.
//!
//! This crate holds every value type, error type, retry policy, and port trait
//! used to issue chat-completion requests individually or in bulk.
//! Infrastructure crates implement the traits defined here.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** No network I/O. It defines *what* a request,
//! a backend, and a batch are; the `llm` crate defines *how* they reach a
//! server.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ModelId`, `ServiceTag`, `BatchRunId`) |
//! | [`types`] | Requests, messages, sampling, backend connection parameters |
//! | [`errors`] | Resolution, transport, and client error types |
//! | [`retry`] | `ImmediateRetryPolicy` and `JitteredBackoffPolicy` |
//! | [`batch`] | Batch jobs, sharding, and batch reports |
//! | [`ports`] | Transport, credential, and progress traits |
//! | [`extract`] | Code-block extraction and function-call parsing |
//! | [`timing`] | Wall-clock timing wrappers |

pub mod batch;
pub mod errors;
pub mod extract;
pub mod identifiers;
pub mod ports;
pub mod retry;
pub mod timing;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use batch::{shard_ranges, BatchFailure, BatchJob, BatchReport, Shard, DEFAULT_BATCH_SYSTEM};
pub use errors::{ChatError, ResolveError, TransportError};
pub use extract::{extract_code, parse_function_call, FunctionCall, Literal};
pub use identifiers::{BatchRunId, ModelId, ServiceTag};
pub use ports::{ChatTransport, CredentialProvider, NoProgress, ProgressSink, StaticCredentials};
pub use retry::{ImmediateRetryPolicy, JitteredBackoffPolicy, RetryPolicy};
pub use timing::{timed, timed_sync};
pub use types::{
    ApiKey, BackendConfig, CompletionResult, Message, RequestSpec, Role, SamplingParams,
    Timestamp, DEFAULT_TIMEOUT,
};
