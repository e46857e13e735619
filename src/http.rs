//! HTTP client configuration shared by the service clients.

use crate::error::{Result, VidlearnError};
use std::time::Duration;

/// Create an HTTP client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VidlearnError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Read a required credential from the environment.
///
/// Empty values count as missing.
pub fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VidlearnError::CredentialMissing(name.to_string())),
    }
}

/// Whether a credential is present in the environment.
pub fn is_env_configured(name: &str) -> bool {
    require_env(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_env_missing() {
        let err = require_env("VIDLEARN_TEST_UNSET_CREDENTIAL").unwrap_err();
        assert!(matches!(err, VidlearnError::CredentialMissing(name) if name == "VIDLEARN_TEST_UNSET_CREDENTIAL"));
    }

    #[test]
    fn test_client_builds() {
        assert!(create_client_with_timeout(Duration::from_secs(300)).is_ok());
    }
}
