//! Maps a model identifier and optional service tag to connection parameters.
//!
//! Resolution order:
//!
//! 1. A known service tag selects a hosting provider (local gateway or hosted
//!    aggregator) regardless of the model.
//! 2. Otherwise the model identifier's prefix selects the vendor's own API.
//! 3. Anything else is [`ResolveError::UnsupportedBackend`].
//!
//! Credentials come from the injected [`CredentialProvider`]; this module never
//! touches the process environment itself.

use std::sync::Arc;

use chat::{ApiKey, BackendConfig, CredentialProvider, ModelId, ResolveError, ServiceTag};

/// A backend with a fixed endpoint and a dedicated credential variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownBackend {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub credential_variable: &'static str,
    /// Key used when the variable is unset. Only local gateways have one.
    pub fallback_key: Option<&'static str>,
}

/// Hosting providers selected by service tag.
pub const SERVICES: &[KnownBackend] = &[
    KnownBackend {
        name: "vllm",
        endpoint: "http://localhost:12001/v1",
        credential_variable: "VLLM_API_KEY",
        fallback_key: Some("EMPTY"),
    },
    KnownBackend {
        name: "siliconflow",
        endpoint: "https://api.siliconflow.cn/v1",
        credential_variable: "SILICONFLOW_API_KEY",
        fallback_key: None,
    },
];

/// Vendors selected by model-identifier prefix, checked in order.
pub const VENDOR_PREFIXES: &[(&str, KnownBackend)] = &[
    (
        "glm",
        KnownBackend {
            name: "glm",
            endpoint: "https://open.bigmodel.cn/api/paas/v4/",
            credential_variable: "GLM_API_KEY",
            fallback_key: None,
        },
    ),
    (
        "deepseek",
        KnownBackend {
            name: "deepseek",
            endpoint: "https://api.deepseek.com/v1",
            credential_variable: "DEEPSEEK_API_KEY",
            fallback_key: None,
        },
    ),
];

// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct BackendResolver {
    credentials: Arc<dyn CredentialProvider>,
}

impl BackendResolver {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// Picks the backend for `model`, without reading any credential.
    pub fn lookup(
        model: &ModelId,
        service: Option<&ServiceTag>,
    ) -> Result<&'static KnownBackend, ResolveError> {
        let by_service = service.and_then(|tag| SERVICES.iter().find(|b| b.name == tag.as_str()));
        let by_prefix = || {
            VENDOR_PREFIXES
                .iter()
                .find(|(prefix, _)| model.as_str().starts_with(*prefix))
                .map(|(_, backend)| backend)
        };
        by_service
            .or_else(by_prefix)
            .ok_or_else(|| ResolveError::UnsupportedBackend {
                model: model.to_string(),
                service: service.map(ToString::to_string),
            })
    }

    /// Resolves connection parameters for `model`.
    pub fn resolve(
        &self,
        model: &ModelId,
        service: Option<&ServiceTag>,
    ) -> Result<BackendConfig, ResolveError> {
        let backend = Self::lookup(model, service)?;
        let key = self
            .credentials
            .credential(backend.credential_variable)
            .or_else(|| backend.fallback_key.map(str::to_string))
            .ok_or_else(|| ResolveError::MissingCredential {
                backend: backend.name.to_string(),
                variable: backend.credential_variable.to_string(),
            })?;

        tracing::debug!(
            model = %model,
            service = service.map(ServiceTag::as_str),
            backend = backend.name,
            endpoint = backend.endpoint,
            "Resolved backend"
        );
        Ok(BackendConfig::new(backend.endpoint, ApiKey::new(key)))
    }
}

impl std::fmt::Debug for BackendResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chat::StaticCredentials;

    use super::*;

    fn resolver() -> BackendResolver {
        BackendResolver::new(Arc::new(
            StaticCredentials::new()
                .with("SILICONFLOW_API_KEY", "sf")
                .with("GLM_API_KEY", "glm")
                .with("DEEPSEEK_API_KEY", "ds"),
        ))
    }

    fn model(name: &str) -> ModelId {
        ModelId::new(name).unwrap()
    }

    fn tag(name: &str) -> ServiceTag {
        ServiceTag::new(name).unwrap()
    }

    #[test]
    fn service_tag_wins_over_model_prefix() {
        let backend = resolver()
            .resolve(&model("deepseek-ai/DeepSeek-V3"), Some(&tag("siliconflow")))
            .unwrap();
        assert_eq!(backend.endpoint, "https://api.siliconflow.cn/v1");
        assert_eq!(backend.credential.expose(), "sf");
    }

    #[test]
    fn prefix_selects_vendor() {
        let glm = resolver().resolve(&model("glm-4-flash"), None).unwrap();
        assert_eq!(glm.endpoint, "https://open.bigmodel.cn/api/paas/v4/");
        assert_eq!(glm.credential.expose(), "glm");

        let ds = resolver().resolve(&model("deepseek-chat"), None).unwrap();
        assert_eq!(ds.endpoint, "https://api.deepseek.com/v1");
    }

    #[test]
    fn unknown_service_falls_back_to_prefix() {
        let backend = resolver()
            .resolve(&model("deepseek-chat"), Some(&tag("nowhere")))
            .unwrap();
        assert_eq!(backend.endpoint, "https://api.deepseek.com/v1");
    }

    #[test]
    fn unmatched_model_is_unsupported() {
        let err = resolver().resolve(&model("llama-3-70b"), None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsupportedBackend {
                model: "llama-3-70b".into(),
                service: None,
            }
        );

        let err = resolver()
            .resolve(&model("llama-3-70b"), Some(&tag("nowhere")))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsupportedBackend { service: Some(s), .. } if s == "nowhere"
        ));
    }

    #[test]
    fn local_gateway_uses_placeholder_key() {
        let backend = resolver()
            .resolve(&model("Qwen2.5-7B-Instruct"), Some(&tag("vllm")))
            .unwrap();
        assert_eq!(backend.endpoint, "http://localhost:12001/v1");
        assert_eq!(backend.credential.expose(), "EMPTY");
    }

    #[test]
    fn hosted_backend_without_key_fails() {
        let resolver = BackendResolver::new(Arc::new(StaticCredentials::new()));
        let err = resolver.resolve(&model("glm-4"), None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingCredential {
                backend: "glm".into(),
                variable: "GLM_API_KEY".into(),
            }
        );
    }
}
