//! gamesched - gaming-optimized CPU scheduling policy engine
//!
//! gamesched decides, for every runnable task, which execution unit it runs
//! on and in what order tasks of differing importance get the CPU. A bounded
//! set of registered game threads (render threads first) gets preferential
//! dispatch and, optionally, exclusive access to isolated CPUs; everything
//! else is scheduled fairly on the remaining units.
//!
//! # Core Concepts
//!
//! - **Strict priority dispatch**: four FIFO ready queues drained
//!   render-first, with arrival order as the only tie-break within a level
//! - **CPU isolation**: designated CPUs only run game threads and
//!   host-internal helpers; other tasks are steered away at selection time
//! - **Pinning**: a hard task-to-CPU binding that overrides isolation and
//!   default placement
//! - **Bounded decisions**: no core decision loops beyond the CPU domain
//!   size or the fixed four priority levels, and nothing in the hot path
//!   blocks or awaits
//!
//! # Modules
//!
//! - [`scheduler`] - ready queues, decision policies, and the orchestrator
//! - [`tables`] - shared priority/isolation/pin tables and counters
//! - [`host`] - the host-runtime trait the engine is driven through
//! - [`admin`] - unix-socket control surface (register, isolate, pin, status)
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod admin;
pub mod cli;
pub mod config;
pub mod domain;
pub mod host;
pub mod scheduler;
pub mod tables;

// Re-export commonly used types
pub use admin::{AdminClient, AdminRequest, AdminResponse, StatusSnapshot, TaskEntry};
pub use config::Config;
pub use domain::{CpuId, MAX_CPUS, MAX_GAME_TASKS, Pid, PriorityClass};
pub use host::{HostRuntime, SystemHost};
pub use scheduler::{DispatchQueues, GameSched, Selection};
pub use tables::{CounterSnapshot, DispatchCounters, IsolationSet, PinTable, PriorityTable, SchedTables, TableError};
