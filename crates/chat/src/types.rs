//! Shared value types for chat-completion requests.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! sampling parameters, message history, and connection details that flow
//! through every request.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ModelId;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instruction that frames the whole conversation.
    System,
    /// Text written by the caller.
    User,
    /// Text previously generated by the model.
    Assistant,
}

/// One entry in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Generation controls forwarded verbatim to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Upper bound on generated tokens per completion.
    pub max_tokens: u32,
    /// Number of completions to generate for the prompt.
    pub n: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl SamplingParams {
    /// Defaults used by the batch path: a cooler temperature and a single sample.
    pub fn batch() -> Self {
        Self {
            max_tokens: 2000,
            n: 1,
            temperature: 0.2,
            top_p: 1.0,
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            n: 1,
            temperature: 0.8,
            top_p: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to issue one chat-completion call.
///
/// Constructed per call; the message sequence sent on the wire is derived from
/// it by [`RequestSpec::messages`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub model: ModelId,
    pub prompt: String,
    /// Prior turns, sent between the system instruction and the prompt.
    pub history: Vec<Message>,
    /// Omitted from the wire when `None`.
    pub system: Option<String>,
    pub sampling: SamplingParams,
    /// Bound on a single attempt, not on the whole retry sequence.
    pub timeout: Duration,
}

impl RequestSpec {
    /// Creates a request with default sampling, no history, and no system
    /// instruction.
    pub fn new(model: ModelId, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            history: Vec::new(),
            system: None,
            sampling: SamplingParams::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
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

    /// Builds `[system] + history + [user prompt]`.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(self.prompt.clone()));
        messages
    }
}

/// Generated texts for one request, one entry per returned choice.
pub type CompletionResult = Vec<String>;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Secret credential presented as a bearer token.
///
/// `Debug` is redacted so the key never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret. Only transports should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Resolved connection parameters for one backend.
///
/// Immutable once produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of an OpenAI-compatible API (e.g. `https://api.deepseek.com/v1`).
    pub endpoint: String,
    pub credential: ApiKey,
}

impl BackendConfig {
    pub fn new(endpoint: impl Into<String>, credential: ApiKey) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential,
        }
    }

    /// URL of the chat-completions route under this endpoint.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelId {
        ModelId::new("deepseek-chat").unwrap()
    }

    #[test]
    fn messages_put_system_first_and_prompt_last() {
        let spec = RequestSpec::new(model(), "and now?")
            .with_system("be brief")
            .with_history(vec![Message::user("hi"), Message::assistant("hello")]);

        let roles: Vec<Role> = spec.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(spec.messages().last().unwrap().content, "and now?");
    }

    #[test]
    fn messages_without_system_start_with_history() {
        let spec = RequestSpec::new(model(), "p");
        assert_eq!(spec.messages(), vec![Message::user("p")]);
    }

    #[test]
    fn chat_completions_url_ignores_trailing_slash() {
        let a = BackendConfig::new("https://open.bigmodel.cn/api/paas/v4/", ApiKey::new("k"));
        let b = BackendConfig::new("https://api.deepseek.com/v1", ApiKey::new("k"));
        assert_eq!(
            a.chat_completions_url(),
            "https://open.bigmodel.cn/api/paas/v4/chat/completions"
        );
        assert_eq!(
            b.chat_completions_url(),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let backend = BackendConfig::new("http://x", ApiKey::new("sk-secret"));
        assert!(!format!("{backend:?}").contains("sk-secret"));
    }
}
