//! Failures of the analysis pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every way an analysis request can fail below the orchestrator.
///
/// The orchestrator converts all of these into a fallback transition. Only
/// [`AnalysisError::InsufficientData`] and [`AnalysisError::AnalyzerNotAvailable`]
/// ever reach a caller, and only when the local path produced nothing.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AnalysisError {
    /// No transport connectivity, before or during the call
    #[error("Network unavailable: {message}")]
    NetworkUnavailable { message: String },

    /// The remote service rejected the credential (401/403)
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The remote service itself reported throttling (429)
    #[error("Remote rate limit exceeded{}", retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RemoteRateLimitExceeded { retry_after_secs: Option<u64> },

    /// The local hourly or daily window is full
    #[error("Local quota exhausted")]
    LocalQuotaExhausted,

    /// The response body could not be parsed into the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The request exceeded its deadline
    #[error("Request timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Too few records for any analysis
    #[error("Insufficient data for analysis")]
    InsufficientData,

    /// The user turned cloud analysis off
    #[error("Cloud analysis disabled by user setting")]
    CloudDisabledBySetting,

    /// No local analyzer is configured to fall back to
    #[error("No local analyzer available")]
    AnalyzerNotAvailable,

    /// Anything else (unexpected status, transport oddities)
    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl AnalysisError {
    /// Transient failures are retried a bounded number of times.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Unknown { .. } | Self::RemoteRateLimitExceeded { .. }
        )
    }

    /// A rejected credential must not be reused on the next request.
    pub fn should_rotate_credential(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// The only failures the orchestrator hands back to its caller.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InsufficientData | Self::AnalyzerNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(AnalysisError::Timeout { duration_secs: 30 }.is_transient());
        assert!(AnalysisError::Unknown { message: "502".to_string() }.is_transient());
        assert!(AnalysisError::RemoteRateLimitExceeded { retry_after_secs: None }.is_transient());

        assert!(!AnalysisError::AuthenticationFailed { message: "bad key".to_string() }
            .is_transient());
        assert!(!AnalysisError::LocalQuotaExhausted.is_transient());
        assert!(!AnalysisError::CloudDisabledBySetting.is_transient());
        assert!(!AnalysisError::MalformedResponse { message: "eof".to_string() }.is_transient());
    }

    #[test]
    fn test_should_rotate() {
        let auth = AnalysisError::AuthenticationFailed { message: "401".to_string() };
        let timeout = AnalysisError::Timeout { duration_secs: 30 };

        assert!(auth.should_rotate_credential());
        assert!(!timeout.should_rotate_credential());
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(AnalysisError::InsufficientData.is_terminal());
        assert!(AnalysisError::AnalyzerNotAvailable.is_terminal());
        assert!(!AnalysisError::LocalQuotaExhausted.is_terminal());
    }

    #[test]
    fn test_rate_limit_display() {
        let with = AnalysisError::RemoteRateLimitExceeded { retry_after_secs: Some(60) };
        let without = AnalysisError::RemoteRateLimitExceeded { retry_after_secs: None };
        assert_eq!(with.to_string(), "Remote rate limit exceeded, retry after 60s");
        assert_eq!(without.to_string(), "Remote rate limit exceeded");
    }
}
