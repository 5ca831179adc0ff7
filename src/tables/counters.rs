//! Dispatch statistics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic counters shared across concurrent selection and dispatch paths.
///
/// Incremented exactly once per triggering event and never reset while the
/// scheduler runs. Relaxed ordering is sufficient: the counters carry no
/// synchronization duty, they only have to not lose updates.
#[derive(Debug, Default)]
pub struct DispatchCounters {
    game_dispatched: AtomicU64,
    normal_dispatched: AtomicU64,
    isolation_redirects: AtomicU64,
}

impl DispatchCounters {
    /// A task entered a game-class (render/game) ready queue.
    pub fn bump_game(&self) {
        self.game_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// A task entered a normal/background ready queue.
    pub fn bump_normal(&self) {
        self.normal_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// A disallowed task's default CPU was isolated, forcing an
    /// alternate-unit search (whether or not one was found).
    pub fn bump_redirect(&self) {
        self.isolation_redirects.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough point-in-time view for the status surface.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            game_dispatched: self.game_dispatched.load(Ordering::Relaxed),
            normal_dispatched: self.normal_dispatched.load(Ordering::Relaxed),
            isolation_redirects: self.isolation_redirects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time counter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub game_dispatched: u64,
    pub normal_dispatched: u64,
    pub isolation_redirects: u64,
}
