//! Shared scheduling tables
//!
//! The tables are read on every scheduling decision and mutated by the
//! administrative surface at arbitrary times, so each one is independently
//! concurrency-safe: the pid-keyed maps sit behind an `RwLock` (momentarily
//! stale reads are acceptable), the isolation flags and counters are atomics.
//! A [`SchedTables`] bundle is shared via `Arc` between the engine, the admin
//! server, and the host-facing callbacks.

mod counters;
mod isolation;
mod pins;
mod priority;

pub use counters::{CounterSnapshot, DispatchCounters};
pub use isolation::IsolationSet;
pub use pins::PinTable;
pub use priority::PriorityTable;

use thiserror::Error;

use crate::domain::Pid;

/// Errors from table mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The table already holds its configured maximum number of entries.
    #[error("table full: limit of {limit} entries reached")]
    CapacityExceeded { limit: usize },
}

/// The shared state the policy engine decides against.
#[derive(Debug)]
pub struct SchedTables {
    /// pid -> priority class for registered game tasks
    pub priorities: PriorityTable,
    /// which CPUs are isolated, gated by the start-time enable flag
    pub isolation: IsolationSet,
    /// pid -> CPU hard bindings
    pub pins: PinTable,
    /// dispatch and redirect statistics
    pub counters: DispatchCounters,
}

impl SchedTables {
    /// Create the table bundle.
    ///
    /// `isolation_enabled` is fixed for the lifetime of the scheduler;
    /// `max_game_tasks` bounds both the priority and pin tables.
    pub fn new(isolation_enabled: bool, max_game_tasks: usize) -> Self {
        Self {
            priorities: PriorityTable::new(max_game_tasks),
            isolation: IsolationSet::new(isolation_enabled),
            pins: PinTable::new(max_game_tasks),
            counters: DispatchCounters::default(),
        }
    }

    /// Unregister a task: drop its priority registration and its pin.
    ///
    /// A no-op for unknown pids.
    pub fn unregister(&self, pid: Pid) {
        self.priorities.remove(pid);
        self.pins.remove(pid);
    }
}
