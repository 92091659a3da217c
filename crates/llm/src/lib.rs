//! bulkchat infrastructure.
//!
//! Resolves backends, talks to OpenAI-compatible chat-completions endpoints
//! over reqwest, and runs single requests or whole batches against them.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, wire formats, retry loops, and
//! worker scheduling live here. The [`chat`] crate sees only the
//! [`chat::ChatTransport`], [`chat::CredentialProvider`], and
//! [`chat::ProgressSink`] ports.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`resolver`] | Service tag / model prefix → endpoint and credential |
//! | [`credentials`] | Environment-backed credential provider |
//! | [`transport`] | reqwest [`chat::ChatTransport`] |
//! | [`client`] | Single-request client with immediate retries |
//! | [`dispatcher`] | Sharded concurrent batch execution |
//! | [`progress`] | `tracing`-backed progress sink |

pub mod client;
pub mod credentials;
pub mod dispatcher;
pub mod progress;
pub mod resolver;
pub mod transport;
mod wire;

pub use client::ChatClient;
pub use credentials::EnvCredentials;
pub use dispatcher::Dispatcher;
pub use progress::TracingProgress;
pub use resolver::{BackendResolver, KnownBackend};
pub use transport::HttpTransport;
