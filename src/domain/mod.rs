//! Domain types for the gamesched policy engine
//!
//! Identifiers come from the host runtime and are opaque to the core:
//! a [`Pid`] identifies a schedulable task for its lifetime (the host may
//! reuse it after exit), a [`CpuId`] names one execution unit.

mod priority;

pub use priority::PriorityClass;

/// Task identifier as reported by the host runtime (process/thread id).
pub type Pid = u32;

/// Execution-unit identifier. Negative values mean "no CPU".
pub type CpuId = i32;

/// Maximum number of tasks the priority and pin tables can hold.
pub const MAX_GAME_TASKS: usize = 1024;

/// Size of the execution-unit domain covered by the isolation set.
pub const MAX_CPUS: usize = 256;
