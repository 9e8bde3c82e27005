//! Privacy scrubbing applied before any record leaves the device.
//!
//! With anonymization enabled every identifier becomes a keyed one-way token
//! (`sha256(device_secret ":" id)`), notes, sleep locations and media
//! references are removed, and names keep only their first character. Food
//! names stay: they are what a feeding analysis is about. The device secret differs per
//! installation, so tokens cannot be correlated across devices.

use nestling_types::{
    ActivityRecord, AnalysisPayload, BabyProfile, FeedingRecord, GrowthRecord, SleepRecord,
};
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "anon-";
const TOKEN_HEX_LEN: usize = 24;
const NAME_PLACEHOLDER: &str = "**";
const EMPTY_NAME: &str = "Baby";

#[derive(Clone)]
pub struct PayloadAnonymizer {
    secret: String,
}

impl std::fmt::Debug for PayloadAnonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadAnonymizer").field("secret", &"<redacted>").finish()
    }
}

impl PayloadAnonymizer {
    pub fn new(device_secret: impl Into<String>) -> Self {
        Self { secret: device_secret.into() }
    }

    /// Returns the payload unchanged when `enabled` is false.
    pub fn transform(&self, payload: &AnalysisPayload, enabled: bool) -> AnalysisPayload {
        if !enabled {
            return payload.clone();
        }
        AnalysisPayload {
            baby: payload.baby.as_ref().map(|b| self.baby(b)),
            sleep: payload.sleep.iter().map(|r| self.sleep(r)).collect(),
            feeding: payload.feeding.iter().map(|r| self.feeding(r)).collect(),
            activity: payload.activity.iter().map(|r| self.activity(r)).collect(),
            growth: payload.growth.iter().map(|r| self.growth(r)).collect(),
        }
    }

    /// Subject id as it should appear in an outbound request.
    pub fn subject_id(&self, id: &str, enabled: bool) -> String {
        if enabled {
            self.token(id)
        } else {
            id.to_string()
        }
    }

    pub fn token(&self, id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(id.as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}{}", TOKEN_PREFIX, &hex[..TOKEN_HEX_LEN])
    }

    fn baby(&self, b: &BabyProfile) -> BabyProfile {
        BabyProfile {
            id: self.token(&b.id),
            name: mask_name(&b.name),
            birth_date: b.birth_date,
            gender: b.gender.clone(),
            photo_url: None,
            notes: None,
        }
    }

    fn sleep(&self, r: &SleepRecord) -> SleepRecord {
        SleepRecord {
            id: self.token(&r.id),
            baby_id: self.token(&r.baby_id),
            location: None,
            notes: None,
            ..r.clone()
        }
    }

    fn feeding(&self, r: &FeedingRecord) -> FeedingRecord {
        FeedingRecord {
            id: self.token(&r.id),
            baby_id: self.token(&r.baby_id),
            notes: None,
            ..r.clone()
        }
    }

    fn activity(&self, r: &ActivityRecord) -> ActivityRecord {
        ActivityRecord {
            id: self.token(&r.id),
            baby_id: self.token(&r.baby_id),
            photo_url: None,
            notes: None,
            ..r.clone()
        }
    }

    fn growth(&self, r: &GrowthRecord) -> GrowthRecord {
        GrowthRecord {
            id: self.token(&r.id),
            baby_id: self.token(&r.baby_id),
            notes: None,
            ..r.clone()
        }
    }
}

/// "Amelia" → "A**", "" → "Baby".
fn mask_name(name: &str) -> String {
    match name.trim().chars().next() {
        Some(first) => format!("{}{}", first, NAME_PLACEHOLDER),
        None => EMPTY_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use nestling_types::{ActivityKind, FeedingKind, SleepQuality};

    fn payload() -> AnalysisPayload {
        let t = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
        AnalysisPayload {
            baby: Some(BabyProfile {
                id: "baby-1".into(),
                name: "Émile".into(),
                birth_date: NaiveDate::from_ymd_opt(2025, 11, 4).unwrap(),
                gender: Some("male".into()),
                photo_url: Some("file:///photos/emile.jpg".into()),
                notes: Some("allergic to peanuts".into()),
            }),
            sleep: vec![SleepRecord {
                id: "sleep-1".into(),
                baby_id: "baby-1".into(),
                start: t,
                end: Some(t + chrono::Duration::hours(3)),
                quality: Some(SleepQuality::Good),
                location: Some("crib at grandma's on Elm Street".into()),
                notes: Some("woke up crying at grandma's".into()),
            }],
            feeding: vec![FeedingRecord {
                id: "feed-1".into(),
                baby_id: "baby-1".into(),
                time: t,
                kind: FeedingKind::Bottle,
                amount_ml: Some(120.0),
                duration_minutes: Some(15),
                food_name: Some("oat formula".into()),
                notes: Some("refused the second half".into()),
            }],
            activity: vec![ActivityRecord {
                id: "act-1".into(),
                baby_id: "baby-1".into(),
                time: t,
                kind: ActivityKind::Bath,
                duration_minutes: Some(10),
                photo_url: Some("file:///photos/bath.jpg".into()),
                notes: Some("splashed a lot".into()),
            }],
            growth: vec![GrowthRecord {
                id: "growth-1".into(),
                baby_id: "baby-1".into(),
                date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                weight_kg: Some(6.4),
                height_cm: Some(62.0),
                head_circumference_cm: None,
                notes: Some("pediatrician visit".into()),
            }],
        }
    }

    #[test]
    fn test_disabled_is_identity() {
        let anonymizer = PayloadAnonymizer::new("secret");
        let input = payload();
        let output = anonymizer.transform(&input, false);
        assert_eq!(
            serde_json::to_vec(&input).unwrap(),
            serde_json::to_vec(&output).unwrap()
        );
        assert_eq!(anonymizer.subject_id("baby-1", false), "baby-1");
    }

    #[test]
    fn test_enabled_strips_notes_and_media() {
        let out = PayloadAnonymizer::new("secret").transform(&payload(), true);
        let baby = out.baby.as_ref().unwrap();
        assert!(baby.notes.is_none());
        assert!(baby.photo_url.is_none());
        assert!(out.sleep.iter().all(|r| r.notes.is_none() && r.location.is_none()));
        assert!(out.feeding.iter().all(|r| r.notes.is_none()));
        assert!(out.activity.iter().all(|r| r.notes.is_none() && r.photo_url.is_none()));
        assert!(out.growth.iter().all(|r| r.notes.is_none()));

        // Measurements stay intact.
        assert_eq!(out.feeding[0].amount_ml, Some(120.0));
        assert_eq!(out.feeding[0].food_name.as_deref(), Some("oat formula"));
        assert_eq!(out.growth[0].weight_kg, Some(6.4));
        assert_eq!(out.sleep[0].duration_minutes(), Some(180));
    }

    #[test]
    fn test_identifiers_never_equal_originals() {
        let input = payload();
        let out = PayloadAnonymizer::new("secret").transform(&input, true);
        assert_ne!(out.baby.as_ref().unwrap().id, "baby-1");
        assert_ne!(out.sleep[0].id, input.sleep[0].id);
        assert_ne!(out.feeding[0].baby_id, "baby-1");
        assert_ne!(out.activity[0].id, input.activity[0].id);
        assert_ne!(out.growth[0].id, input.growth[0].id);

        // Same identifier maps to the same token across record kinds.
        let baby_token = &out.baby.as_ref().unwrap().id;
        assert_eq!(&out.sleep[0].baby_id, baby_token);
        assert_eq!(&out.growth[0].baby_id, baby_token);
        assert!(baby_token.starts_with("anon-"));
        assert_eq!(baby_token.len(), "anon-".len() + 24);
    }

    #[test]
    fn test_tokens_differ_between_installations() {
        let a = PayloadAnonymizer::new("secret-a");
        let b = PayloadAnonymizer::new("secret-b");
        assert_eq!(a.token("baby-1"), a.token("baby-1"));
        assert_ne!(a.token("baby-1"), b.token("baby-1"));
    }

    #[test]
    fn test_name_masking() {
        assert_eq!(mask_name("Émile"), "É**");
        assert_eq!(mask_name("  Zoe"), "Z**");
        assert_eq!(mask_name(""), "Baby");
        assert_eq!(mask_name("   "), "Baby");
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", PayloadAnonymizer::new("top-secret"));
        assert!(!rendered.contains("top-secret"));
    }
}
