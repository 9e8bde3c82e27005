//! Care records as read from the on-device repositories.
//!
//! The analysis layer only reads these. Field order is part of the canonical
//! serialization used for cache fingerprints, so do not reorder fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The infant the records belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BabyProfile {
    pub id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepRecord {
    pub id: String,
    pub baby_id: String,
    pub start: DateTime<Utc>,
    /// `None` while the baby is still asleep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<SleepQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SleepRecord {
    /// Duration in minutes, or `None` for an open session.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end.map(|end| (end - self.start).num_minutes().max(0))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedingKind {
    Breast,
    Bottle,
    Formula,
    Solid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedingRecord {
    pub id: String,
    pub baby_id: String,
    pub time: DateTime<Utc>,
    pub kind: FeedingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_ml: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Diaper,
    Bath,
    Play,
    TummyTime,
    Medicine,
    Outdoor,
    Other,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diaper => "diaper",
            Self::Bath => "bath",
            Self::Play => "play",
            Self::TummyTime => "tummy_time",
            Self::Medicine => "medicine",
            Self::Outdoor => "outdoor",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub id: String,
    pub baby_id: String,
    pub time: DateTime<Utc>,
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthRecord {
    pub id: String,
    pub baby_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_circumference_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Everything an analysis may look at.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baby: Option<BabyProfile>,
    #[serde(default)]
    pub sleep: Vec<SleepRecord>,
    #[serde(default)]
    pub feeding: Vec<FeedingRecord>,
    #[serde(default)]
    pub activity: Vec<ActivityRecord>,
    #[serde(default)]
    pub growth: Vec<GrowthRecord>,
}

impl AnalysisPayload {
    /// Total number of care records (the profile does not count).
    pub fn record_count(&self) -> usize {
        self.sleep.len() + self.feeding.len() + self.activity.len() + self.growth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sleep(start_h: u32, end_h: Option<u32>) -> SleepRecord {
        SleepRecord {
            id: "s1".to_string(),
            baby_id: "b1".to_string(),
            start: Utc.with_ymd_and_hms(2026, 3, 1, start_h, 0, 0).unwrap(),
            end: end_h.map(|h| Utc.with_ymd_and_hms(2026, 3, 1, h, 30, 0).unwrap()),
            quality: None,
            location: None,
            notes: None,
        }
    }

    #[test]
    fn test_sleep_duration() {
        assert_eq!(sleep(1, Some(3)).duration_minutes(), Some(150));
        assert_eq!(sleep(1, None).duration_minutes(), None);
    }

    #[test]
    fn test_payload_counts() {
        let mut payload = AnalysisPayload::default();
        assert!(payload.is_empty());

        payload.sleep.push(sleep(1, Some(2)));
        assert_eq!(payload.record_count(), 1);
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_string(&sleep(1, None)).unwrap();
        assert!(!json.contains("notes"));
        assert!(!json.contains("end"));
    }
}
