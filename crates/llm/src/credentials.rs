//! Process-environment credential source.

use chat::CredentialProvider;

/// Reads credentials from environment variables at resolution time.
///
/// Empty values are treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credential(&self, variable: &str) -> Option<String> {
        std::env::var(variable).ok().filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_is_none() {
        assert_eq!(
            EnvCredentials.credential("BULKCHAT_TEST_VARIABLE_THAT_IS_NEVER_SET"),
            None
        );
    }
}
