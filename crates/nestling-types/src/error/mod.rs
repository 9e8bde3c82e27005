//! Typed error definitions for Nestling.
//!
//! All errors are serializable so a failure can be handed to a UI layer or
//! written to a diagnostics log without losing its variant.

mod analysis;
mod config;

pub use analysis::AnalysisError;
pub use config::ConfigError;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AnalysisError::RemoteRateLimitExceeded { retry_after_secs: Some(12) };

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("RemoteRateLimitExceeded"));
        assert!(json.contains("12"));

        let deserialized: AnalysisError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::ValidationError {
            field: "hourly_limit".to_string(),
            message: "must be at least 1".to_string(),
        };

        let msg = format!("{}", err);
        assert!(msg.contains("hourly_limit"));
        assert!(msg.contains("at least 1"));
    }
}
