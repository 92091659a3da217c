//! Newtype identifiers.
//!
//! A model identifier and a service tag are both plain strings on the wire, but
//! swapping them silently routes a request to the wrong backend. Each gets its
//! own newtype so the resolver signature cannot be called with the arguments
//! reversed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Model identifier sent in the `model` field of every request
    /// (e.g. `"deepseek-chat"`, `"glm-4-flash"`).
    ///
    /// Its prefix is also used to infer the vendor when no service tag is given.
    ModelId
}

string_id! {
    /// Names a hosting provider that serves many vendors' models behind one
    /// endpoint (e.g. `"vllm"`, `"siliconflow"`).
    ServiceTag
}

// ---------------------------------------------------------------------------
// UUID-backed
// ---------------------------------------------------------------------------

/// Identifies one batch invocation.
///
/// Generated fresh for every dispatcher run and attached to its tracing span so
/// all shard activity from a single batch can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRunId(Uuid);

impl BatchRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for BatchRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
