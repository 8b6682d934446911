//! Per-scope fixed-window admission control.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::types::ScopeKey;

/// Request counter for one scope's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// Shared admission controller.
///
/// All mutation happens under the map's per-key entry lock, so a
/// check-then-increment is a single atomic step: two concurrent requests can
/// never both be admitted past a limit with one slot remaining.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<ScopeKey, RateWindow>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a request may proceed.
    ///
    /// A rejected request leaves the window untouched: the caller is not
    /// charged for a call it was denied, and the rejection does not open or
    /// count against the next window.
    pub fn admit(&self, scope: &ScopeKey, limit: u32, window_minutes: i64) -> bool {
        self.admit_at(scope, limit, window_minutes, Utc::now())
    }

    fn admit_at(
        &self,
        scope: &ScopeKey,
        limit: u32,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> bool {
        let window = TimeDelta::minutes(window_minutes);

        match self.windows.entry(scope.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(RateWindow {
                    count: 1,
                    reset_at: now + window,
                });
                true
            }
            Entry::Occupied(mut slot) => {
                let state = slot.get_mut();
                if now >= state.reset_at {
                    state.count = 1;
                    state.reset_at = now + window;
                    true
                } else if state.count < limit {
                    state.count += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Snapshot of a scope's current window, if one exists.
    pub fn window(&self, scope: &ScopeKey) -> Option<RateWindow> {
        self.windows.get(scope).map(|w| *w)
    }

    /// Drop a scope's window. Administrative use only.
    pub fn reset(&self, scope: &ScopeKey) {
        self.windows.remove(scope);
    }

    pub fn tracked_scopes(&self) -> usize {
        self.windows.len()
    }
}
