//! Hourly and daily fixed-window quota for outbound cloud calls.
//!
//! A call needs room in both windows. Room is claimed with
//! [`QuotaTracker::try_reserve`], which holds an in-flight slot without
//! touching the committed counts; [`QuotaReservation::commit`] turns the slot
//! into one unit of each window after the call succeeded. Dropping an
//! uncommitted reservation gives the slot back, so failed calls cost nothing
//! and concurrent callers can never push committed counts past the maximum.

use chrono::{DateTime, Utc};
use nestling_types::{QuotaWindow, QuotaWindowKind, RemainingQuota};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::modules::clock::Clock;
use crate::modules::store::{get_json, set_json, SecureStore};

const QUOTA_KEY: &str = "analysis.quota_windows";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub hourly_max: u32,
    pub daily_max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedWindows {
    hourly: QuotaWindow,
    daily: QuotaWindow,
}

#[derive(Debug)]
struct QuotaState {
    hourly: QuotaWindow,
    daily: QuotaWindow,
    in_flight: u32,
}

impl QuotaState {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            hourly: QuotaWindow::new(QuotaWindowKind::Hourly, now),
            daily: QuotaWindow::new(QuotaWindowKind::Daily, now),
            in_flight: 0,
        }
    }

    /// Returns `true` if either window rolled over.
    fn roll(&mut self, now: DateTime<Utc>) -> bool {
        let hourly = self.hourly.roll_if_expired(now);
        let daily = self.daily.roll_if_expired(now);
        hourly || daily
    }

    fn persisted(&self) -> PersistedWindows {
        PersistedWindows { hourly: self.hourly.clone(), daily: self.daily.clone() }
    }
}

pub struct QuotaTracker {
    limits: QuotaLimits,
    state: Mutex<QuotaState>,
    store: Arc<dyn SecureStore>,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    /// Restores persisted windows, or opens fresh ones at `clock.now()`.
    pub fn new(limits: QuotaLimits, store: Arc<dyn SecureStore>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let state = match get_json::<PersistedWindows>(store.as_ref(), QUOTA_KEY) {
            Ok(Some(p)) => {
                let mut state = QuotaState { hourly: p.hourly, daily: p.daily, in_flight: 0 };
                // A start in the future means the clock moved backwards.
                if state.hourly.window_start > now {
                    state.hourly = QuotaWindow::new(QuotaWindowKind::Hourly, now);
                }
                if state.daily.window_start > now {
                    state.daily = QuotaWindow::new(QuotaWindowKind::Daily, now);
                }
                state
            },
            Ok(None) => QuotaState::fresh(now),
            Err(e) => {
                tracing::warn!("Quota windows unreadable, starting fresh: {}", e);
                QuotaState::fresh(now)
            },
        };

        Self { limits, state: Mutex::new(state), store, clock }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Claims room for one call, or `None` when either window is full.
    pub fn try_reserve(&self) -> Option<QuotaReservation<'_>> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.roll(now) {
            self.persist(&state);
        }

        let pending = state.in_flight;
        if state.hourly.count + pending >= self.limits.hourly_max
            || state.daily.count + pending >= self.limits.daily_max
        {
            tracing::debug!(
                "Quota full | hourly {}/{} | daily {}/{} | in flight {}",
                state.hourly.count,
                self.limits.hourly_max,
                state.daily.count,
                self.limits.daily_max,
                pending
            );
            return None;
        }

        state.in_flight += 1;
        Some(QuotaReservation { tracker: self, committed: false })
    }

    /// Remaining committed capacity per window.
    pub fn remaining(&self) -> RemainingQuota {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.roll(now) {
            self.persist(&state);
        }
        RemainingQuota {
            hourly: self.limits.hourly_max.saturating_sub(state.hourly.count),
            daily: self.limits.daily_max.saturating_sub(state.daily.count),
        }
    }

    /// Forces both windows to `(0, now)`.
    pub fn reset_all(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.hourly = QuotaWindow::new(QuotaWindowKind::Hourly, now);
        state.daily = QuotaWindow::new(QuotaWindowKind::Daily, now);
        self.persist(&state);
        tracing::info!("Quota windows reset");
    }

    /// Current hourly and daily windows, after lazy reset.
    pub fn snapshot(&self) -> (QuotaWindow, QuotaWindow) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.roll(now) {
            self.persist(&state);
        }
        (state.hourly.clone(), state.daily.clone())
    }

    fn commit_one(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.roll(now);
        state.in_flight = state.in_flight.saturating_sub(1);
        state.hourly.count += 1;
        state.daily.count += 1;
        self.persist(&state);
        tracing::debug!(
            "Quota committed | hourly {}/{} | daily {}/{}",
            state.hourly.count,
            self.limits.hourly_max,
            state.daily.count,
            self.limits.daily_max
        );
    }

    fn release_one(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    fn persist(&self, state: &QuotaState) {
        if let Err(e) = set_json(self.store.as_ref(), QUOTA_KEY, &state.persisted()) {
            tracing::warn!("Quota windows not persisted: {}", e);
        }
    }
}

/// One claimed unit of quota. Commit after a successful call; drop otherwise.
#[must_use = "dropping a reservation releases it without consuming quota"]
pub struct QuotaReservation<'a> {
    tracker: &'a QuotaTracker,
    committed: bool,
}

impl QuotaReservation<'_> {
    pub fn commit(mut self) {
        self.committed = true;
        self.tracker.commit_one();
    }
}

impl Drop for QuotaReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.tracker.release_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::clock::ManualClock;
    use crate::modules::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn tracker(hourly: u32, daily: u32) -> (QuotaTracker, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(start()));
        let store = Arc::new(MemoryStore::new());
        let t = QuotaTracker::new(
            QuotaLimits { hourly_max: hourly, daily_max: daily },
            store.clone(),
            clock.clone(),
        );
        (t, clock, store)
    }

    #[test]
    fn test_reserve_does_not_change_counts() {
        let (t, _, _) = tracker(3, 10);
        let r = t.try_reserve().unwrap();
        assert_eq!(t.remaining(), RemainingQuota { hourly: 3, daily: 10 });
        r.commit();
        assert_eq!(t.remaining(), RemainingQuota { hourly: 2, daily: 9 });
    }

    #[test]
    fn test_dropped_reservation_costs_nothing() {
        let (t, _, _) = tracker(1, 10);
        {
            let _r = t.try_reserve().unwrap();
            assert!(t.try_reserve().is_none());
        }
        assert!(t.try_reserve().is_some());
        assert_eq!(t.remaining().hourly, 1);
    }

    #[test]
    fn test_hourly_limit_blocks() {
        let (t, _, _) = tracker(2, 10);
        t.try_reserve().unwrap().commit();
        t.try_reserve().unwrap().commit();
        assert!(t.try_reserve().is_none());
        assert_eq!(t.remaining(), RemainingQuota { hourly: 0, daily: 8 });
    }

    #[test]
    fn test_daily_limit_blocks_even_with_hourly_room() {
        let (t, clock, _) = tracker(2, 3);
        t.try_reserve().unwrap().commit();
        t.try_reserve().unwrap().commit();
        clock.advance(Duration::hours(1));
        t.try_reserve().unwrap().commit();
        assert_eq!(t.remaining(), RemainingQuota { hourly: 1, daily: 0 });
        assert!(t.try_reserve().is_none());
    }

    #[test]
    fn test_hourly_resets_exactly_at_boundary() {
        let (t, clock, _) = tracker(1, 10);
        t.try_reserve().unwrap().commit();

        clock.advance(Duration::seconds(3599));
        assert!(t.try_reserve().is_none());

        clock.advance(Duration::seconds(1));
        assert_eq!(t.remaining().hourly, 1);
        let (hourly, daily) = t.snapshot();
        assert_eq!(hourly.count, 0);
        assert_eq!(hourly.window_start, start() + Duration::hours(1));
        assert_eq!(daily.count, 1);
        assert_eq!(daily.window_start, start());
    }

    #[test]
    fn test_daily_resets_after_a_day() {
        let (t, clock, _) = tracker(5, 5);
        for _ in 0..5 {
            t.try_reserve().unwrap().commit();
            clock.advance(Duration::hours(2));
        }
        assert!(t.try_reserve().is_none());
        clock.set(start() + Duration::days(1));
        assert_eq!(t.remaining(), RemainingQuota { hourly: 5, daily: 5 });
    }

    #[test]
    fn test_reset_all() {
        let (t, clock, _) = tracker(1, 1);
        t.try_reserve().unwrap().commit();
        clock.advance(Duration::minutes(5));
        t.reset_all();
        let (hourly, daily) = t.snapshot();
        assert_eq!((hourly.count, daily.count), (0, 0));
        assert_eq!(hourly.window_start, start() + Duration::minutes(5));
    }

    #[test]
    fn test_counts_survive_restart() {
        let (t, clock, store) = tracker(5, 20);
        t.try_reserve().unwrap().commit();
        t.try_reserve().unwrap().commit();
        drop(t);

        let restarted = QuotaTracker::new(
            QuotaLimits { hourly_max: 5, daily_max: 20 },
            store,
            clock,
        );
        assert_eq!(restarted.remaining(), RemainingQuota { hourly: 3, daily: 18 });
    }

    #[test]
    fn test_future_window_start_is_reset() {
        let (t, clock, store) = tracker(5, 20);
        t.try_reserve().unwrap().commit();
        drop(t);

        clock.set(start() - Duration::hours(3));
        let restarted = QuotaTracker::new(
            QuotaLimits { hourly_max: 5, daily_max: 20 },
            store,
            clock.clone(),
        );
        let (hourly, _) = restarted.snapshot();
        assert_eq!(hourly.window_start, clock.now());
        assert_eq!(hourly.count, 0);
    }

    #[test]
    fn test_concurrent_reservations_never_exceed_max() {
        let clock = Arc::new(ManualClock::new(start()));
        let t = Arc::new(QuotaTracker::new(
            QuotaLimits { hourly_max: 7, daily_max: 100 },
            Arc::new(MemoryStore::new()),
            clock,
        ));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let t = Arc::clone(&t);
                std::thread::spawn(move || {
                    if let Some(r) = t.try_reserve() {
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        r.commit();
                        true
                    } else {
                        false
                    }
                })
            })
            .collect();

        let granted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert!(granted <= 7);
        let (hourly, _) = t.snapshot();
        assert_eq!(hourly.count as usize, granted);
        assert!(hourly.count <= 7);
    }
}
