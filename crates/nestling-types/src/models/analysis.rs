//! Analysis requests and results.

use serde::{Deserialize, Serialize};

use super::records::AnalysisPayload;
use crate::error::{AnalysisError, ConfigError};

/// Which analysis the caller wants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    SleepPattern,
    FeedingPattern,
    GrowthTrend,
    DailySummary,
    Comprehensive,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        Self::SleepPattern,
        Self::FeedingPattern,
        Self::GrowthTrend,
        Self::DailySummary,
        Self::Comprehensive,
    ];

    /// Stable identifier; part of every cache fingerprint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SleepPattern => "sleep_pattern",
            Self::FeedingPattern => "feeding_pattern",
            Self::GrowthTrend => "growth_trend",
            Self::DailySummary => "daily_summary",
            Self::Comprehensive => "comprehensive",
        }
    }

    /// Short description of what the analysis should focus on.
    pub fn focus(self) -> &'static str {
        match self {
            Self::SleepPattern => "sleep duration, sleep timing and sleep quality trends",
            Self::FeedingPattern => "feeding frequency, intake volume and feeding intervals",
            Self::GrowthTrend => "weight, height and head circumference development",
            Self::DailySummary => "the most recent day of sleep, feeding and activity",
            Self::Comprehensive => "overall development across sleep, feeding, growth and activity",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.as_str() == normalized).ok_or_else(|| {
            ConfigError::ValidationError {
                field: "kind".to_string(),
                message: format!("unknown analysis kind '{}'", s),
            }
        })
    }
}

/// One analysis request as handed to the cloud path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub subject_id: String,
    pub anonymize: bool,
    pub payload: AnalysisPayload,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Cloud,
    Local,
}

/// Final output of the analysis layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub text: String,
    pub source: AnalysisSource,
    /// Why the cloud path was not used (local results only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<AnalysisError>,
}

impl AnalysisResult {
    pub fn cloud(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: AnalysisSource::Cloud, fallback_reason: None }
    }

    pub fn local(text: impl Into<String>, reason: AnalysisError) -> Self {
        Self { text: text.into(), source: AnalysisSource::Local, fallback_reason: Some(reason) }
    }

    pub fn is_cloud(&self) -> bool {
        self.source == AnalysisSource::Cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_through_str() {
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.as_str().parse::<AnalysisKind>(), Ok(kind));
        }
        assert_eq!("Sleep-Pattern".parse::<AnalysisKind>(), Ok(AnalysisKind::SleepPattern));
        assert!(matches!(
            "naps".parse::<AnalysisKind>(),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "kind"
        ));
    }

    #[test]
    fn test_result_constructors() {
        let cloud = AnalysisResult::cloud("ok");
        assert!(cloud.is_cloud());
        assert!(cloud.fallback_reason.is_none());

        let local = AnalysisResult::local("ok", AnalysisError::LocalQuotaExhausted);
        assert_eq!(local.source, AnalysisSource::Local);
        assert_eq!(local.fallback_reason, Some(AnalysisError::LocalQuotaExhausted));
    }
}
