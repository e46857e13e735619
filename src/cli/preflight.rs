//! Pre-flight checks before a run.
//!
//! Validates credentials before any job starts so a missing key never
//! surfaces halfway through a batch.

use crate::article::GEMINI_API_KEY_ENV;
use crate::error::{Result, VidlearnError};
use crate::http::is_env_configured;
use crate::transcription::ASSEMBLYAI_API_KEY_ENV;

/// Credentials a run cannot proceed without.
pub const REQUIRED_CREDENTIALS: &[&str] = &[ASSEMBLYAI_API_KEY_ENV, GEMINI_API_KEY_ENV];

/// Names of required credentials that are missing or empty.
pub fn missing_credentials() -> Vec<&'static str> {
    REQUIRED_CREDENTIALS
        .iter()
        .copied()
        .filter(|name| !is_env_configured(name))
        .collect()
}

/// Run pre-flight checks.
///
/// Returns Ok(()) if all checks pass, or an error naming what's missing.
pub fn check() -> Result<()> {
    let missing = missing_credentials();
    if missing.is_empty() {
        return Ok(());
    }
    Err(VidlearnError::CredentialMissing(missing.join(", ")))
}

/// Hint printed alongside a credential error.
pub fn credential_hint(name: &str) -> String {
    format!("Set it with: export {}='your-key'", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_credentials_listed() {
        assert!(REQUIRED_CREDENTIALS.contains(&"ASSEMBLYAI_API_KEY"));
        assert!(REQUIRED_CREDENTIALS.contains(&"GEMINI_API_KEY"));
    }

    #[test]
    fn test_check_agrees_with_missing_list() {
        // Host-dependent; the two views must agree either way.
        assert_eq!(check().is_ok(), missing_credentials().is_empty());
    }

    #[test]
    fn test_hint_names_variable() {
        assert!(credential_hint("GEMINI_API_KEY").contains("export GEMINI_API_KEY="));
    }
}
