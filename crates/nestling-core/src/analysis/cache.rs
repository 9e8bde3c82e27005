//! Time-bounded result cache keyed by request fingerprint.

use chrono::{DateTime, Duration, Utc};
use nestling_types::{AnalysisKind, AnalysisPayload, AnalysisResult};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::AppResult;
use crate::modules::clock::Clock;

const CACHE_LIMIT: usize = 256;

#[derive(Clone, Debug)]
struct CacheEntry {
    text: String,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_valid(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        now - self.created_at < validity
    }
}

/// Maps `fingerprint(kind, anonymized payload)` to a cloud result text.
///
/// Only cloud results are stored; a hit is always returned as a cloud result.
/// Entries older than the validity duration are treated as absent.
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    validity: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(validity: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: RwLock::new(HashMap::new()), validity, clock }
    }

    /// SHA-256 over the kind and the canonical JSON of the payload.
    ///
    /// Field order is fixed by the record types and element order is kept, so
    /// equal inputs always give equal fingerprints.
    pub fn fingerprint(kind: AnalysisKind, payload: &AnalysisPayload) -> AppResult<String> {
        let canonical = serde_json::to_vec(payload)?;
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(&canonical);
        Ok(hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn get(&self, fingerprint: &str) -> Option<AnalysisResult> {
        let now = self.clock.now();
        let expired = {
            let cache = self.entries.read().ok()?;
            match cache.get(fingerprint) {
                Some(entry) if entry.is_valid(now, self.validity) => {
                    tracing::debug!("[ResultCache] Hit for {}", short(fingerprint));
                    return Some(AnalysisResult::cloud(entry.text.clone()));
                },
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.evict_expired(fingerprint, now);
        }
        None
    }

    /// Removes the entry only if it is still stale under the write lock; a
    /// `put` that landed after the read lock was released must survive.
    fn evict_expired(&self, fingerprint: &str, now: DateTime<Utc>) {
        if let Ok(mut cache) = self.entries.write() {
            if cache.get(fingerprint).is_some_and(|e| !e.is_valid(now, self.validity)) {
                cache.remove(fingerprint);
                tracing::debug!("[ResultCache] Expired entry for {}", short(fingerprint));
            }
        }
    }

    /// Inserts or overwrites, stamped with the current time.
    pub fn put(&self, fingerprint: &str, text: impl Into<String>) {
        let now = self.clock.now();
        if let Ok(mut cache) = self.entries.write() {
            cache.insert(fingerprint.to_string(), CacheEntry { text: text.into(), created_at: now });

            if cache.len() > CACHE_LIMIT {
                let before = cache.len();
                let validity = self.validity;
                cache.retain(|_, v| v.is_valid(now, validity));
                if cache.len() > CACHE_LIMIT {
                    if let Some(oldest) = cache
                        .iter()
                        .min_by_key(|(_, v)| v.created_at)
                        .map(|(k, _)| k.clone())
                    {
                        cache.remove(&oldest);
                    }
                }
                tracing::debug!("[ResultCache] Cleanup: {} -> {} entries", before, cache.len());
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.entries.write() {
            let removed = cache.len();
            cache.clear();
            tracing::debug!("[ResultCache] Cleared {} entries", removed);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::clock::ManualClock;
    use chrono::TimeZone;
    use nestling_types::{GrowthRecord, SleepRecord};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 4, 10, 8, 0, 0).unwrap()))
    }

    fn payload(ids: &[&str]) -> AnalysisPayload {
        let start = Utc.with_ymd_and_hms(2026, 4, 9, 21, 0, 0).unwrap();
        AnalysisPayload {
            sleep: ids
                .iter()
                .map(|id| SleepRecord {
                    id: id.to_string(),
                    baby_id: "b".into(),
                    start,
                    end: None,
                    quality: None,
                    location: None,
                    notes: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = ResultCache::fingerprint(AnalysisKind::SleepPattern, &payload(&["1", "2"])).unwrap();
        let b = ResultCache::fingerprint(AnalysisKind::SleepPattern, &payload(&["1", "2"])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_depends_on_kind_order_and_content() {
        let base = ResultCache::fingerprint(AnalysisKind::SleepPattern, &payload(&["1", "2"])).unwrap();
        let other_kind =
            ResultCache::fingerprint(AnalysisKind::DailySummary, &payload(&["1", "2"])).unwrap();
        let reordered =
            ResultCache::fingerprint(AnalysisKind::SleepPattern, &payload(&["2", "1"])).unwrap();
        let mut with_growth = payload(&["1", "2"]);
        with_growth.growth.push(GrowthRecord {
            id: "g".into(),
            baby_id: "b".into(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            weight_kg: Some(5.0),
            height_cm: None,
            head_circumference_cm: None,
            notes: None,
        });
        let extended = ResultCache::fingerprint(AnalysisKind::SleepPattern, &with_growth).unwrap();

        assert_ne!(base, other_kind);
        assert_ne!(base, reordered);
        assert_ne!(base, extended);
    }

    #[test]
    fn test_validity_boundary() {
        let clock = clock();
        let cache = ResultCache::new(Duration::seconds(3600), clock.clone());
        cache.put("fp", "slept well");

        clock.advance(Duration::seconds(3599));
        assert_eq!(cache.get("fp"), Some(AnalysisResult::cloud("slept well")));

        clock.advance(Duration::seconds(2));
        assert_eq!(cache.get("fp"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_expires_exactly_at_validity() {
        let clock = clock();
        let cache = ResultCache::new(Duration::seconds(60), clock.clone());
        cache.put("fp", "x");
        clock.advance(Duration::seconds(60));
        assert!(cache.get("fp").is_none());
    }

    #[test]
    fn test_put_overwrites_and_restamps() {
        let clock = clock();
        let cache = ResultCache::new(Duration::seconds(100), clock.clone());
        cache.put("fp", "old");
        clock.advance(Duration::seconds(90));
        cache.put("fp", "new");
        clock.advance(Duration::seconds(50));
        assert_eq!(cache.get("fp").map(|r| r.text), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_keeps_entry_refreshed_after_expiry_was_seen() {
        let clock = clock();
        let cache = ResultCache::new(Duration::seconds(60), clock.clone());
        cache.put("fp", "stale");
        clock.advance(Duration::seconds(61));
        let seen_expired_at = clock.now();

        // A writer refreshes the key between the reader's expiry check and its eviction.
        cache.put("fp", "fresh");
        cache.evict_expired("fp", seen_expired_at);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fp").map(|r| r.text), Some("fresh".to_string()));
    }

    #[test]
    fn test_eviction_removes_entry_still_stale() {
        let clock = clock();
        let cache = ResultCache::new(Duration::seconds(60), clock.clone());
        cache.put("fp", "stale");
        clock.advance(Duration::seconds(61));
        cache.evict_expired("fp", clock.now());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::new(Duration::seconds(100), clock());
        cache.put("a", "1");
        cache.put("b", "2");
        cache.clear();
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let clock = clock();
        let cache = ResultCache::new(Duration::days(1), clock.clone());
        for i in 0..=CACHE_LIMIT {
            cache.put(&format!("fp-{}", i), "r");
            clock.advance(Duration::seconds(1));
        }
        assert_eq!(cache.len(), CACHE_LIMIT);
        assert!(cache.get("fp-0").is_none());
        assert!(cache.get(&format!("fp-{}", CACHE_LIMIT)).is_some());
    }
}
