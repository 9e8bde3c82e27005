//! Quota window models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuotaWindowKind {
    Hourly,
    Daily,
}

impl QuotaWindowKind {
    /// Fixed window length.
    pub fn duration(self) -> Duration {
        match self {
            Self::Hourly => Duration::seconds(3600),
            Self::Daily => Duration::seconds(86_400),
        }
    }
}

/// Fixed-window request counter.
///
/// `count` never exceeds the configured maximum while the window is open.
/// The window resets (count → 0, start → now) once `now - window_start`
/// reaches the window duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaWindow {
    pub kind: QuotaWindowKind,
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl QuotaWindow {
    pub fn new(kind: QuotaWindowKind, now: DateTime<Utc>) -> Self {
        Self { kind, count: 0, window_start: now }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.window_start >= self.kind.duration()
    }

    /// Lazy reset. Returns `true` when the window was rolled over.
    pub fn roll_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            self.count = 0;
            self.window_start = now;
            true
        } else {
            false
        }
    }

    pub fn resets_at(&self) -> DateTime<Utc> {
        self.window_start + self.kind.duration()
    }
}

/// Remaining capacity per window, for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemainingQuota {
    pub hourly: u32,
    pub daily: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_resets_exactly_at_duration() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let mut window = QuotaWindow { kind: QuotaWindowKind::Hourly, count: 4, window_start: start };

        let just_before = start + Duration::seconds(3599);
        assert!(!window.roll_if_expired(just_before));
        assert_eq!(window.count, 4);

        let at = start + Duration::seconds(3600);
        assert!(window.roll_if_expired(at));
        assert_eq!(window.count, 0);
        assert_eq!(window.window_start, at);
    }

    #[test]
    fn test_daily_resets_at() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let window = QuotaWindow::new(QuotaWindowKind::Daily, start);
        assert_eq!(window.resets_at(), start + Duration::days(1));
    }
}
