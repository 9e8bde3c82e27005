//! Analysis layer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use super::credential::Credential;
use crate::error::ConfigError;

/// Full configuration of the cloud analysis access layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct AnalysisConfig {
    /// Base URL of the OpenAI-compatible endpoint
    #[validate(url)]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier sent with every request
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_model")]
    pub model: String,
    /// Pre-provisioned API keys; one is picked per installation
    #[serde(default)]
    pub credentials: Vec<String>,
    /// Maximum successful cloud calls per hour
    #[validate(range(min = 1_u32, max = 1000_u32))]
    #[serde(default = "default_hourly_limit")]
    pub hourly_limit: u32,
    /// Maximum successful cloud calls per day
    #[validate(range(min = 1_u32, max = 10000_u32))]
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// How long a cached result stays valid
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_cache_validity")]
    pub cache_validity_secs: u64,
    /// Per-request deadline
    #[validate(range(min = 1_u64, max = 600_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Retries for transient failures (0 disables retrying)
    #[validate(range(max = 10_u32))]
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    /// Fixed delay between retries
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[validate(range(min = 0.0_f32, max = 2.0_f32))]
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            credentials: Vec::new(),
            hourly_limit: default_hourly_limit(),
            daily_limit: default_daily_limit(),
            cache_validity_secs: default_cache_validity(),
            request_timeout_secs: default_request_timeout(),
            max_retry_count: default_max_retry_count(),
            retry_interval_ms: default_retry_interval(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AnalysisConfig {
    /// Field validation plus the cross-field rules `validator` cannot express.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| {
            let field = e
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "config".to_string());
            ConfigError::ValidationError { field, message: e.to_string() }
        })?;

        if self.credentials.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "credentials".to_string(),
                message: "at least one credential is required".to_string(),
            });
        }
        if self.credentials.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                field: "credentials".to_string(),
                message: "credentials must not be blank".to_string(),
            });
        }
        if self.daily_limit < self.hourly_limit {
            return Err(ConfigError::ValidationError {
                field: "daily_limit".to_string(),
                message: format!(
                    "daily limit {} is below hourly limit {}",
                    self.daily_limit, self.hourly_limit
                ),
            });
        }
        Ok(())
    }

    pub fn credential_list(&self) -> Vec<Credential> {
        self.credentials.iter().map(|c| Credential::new(c.trim())).collect()
    }

    pub fn cache_validity(&self) -> Duration {
        Duration::from_secs(self.cache_validity_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

fn default_endpoint() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_hourly_limit() -> u32 {
    10
}

fn default_daily_limit() -> u32 {
    50
}

fn default_cache_validity() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retry_count() -> u32 {
    2
}

fn default_retry_interval() -> u64 {
    2000
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}
