//! Wire types for the admin control surface
//!
//! Each message is a single line of JSON followed by `\n`.

use serde::{Deserialize, Serialize};

use crate::domain::{CpuId, Pid, PriorityClass};
use crate::tables::CounterSnapshot;

/// Requests from the CLI to the running scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AdminRequest {
    /// Register a game thread with a game-class priority
    Add { pid: Pid, priority: PriorityClass },

    /// Unregister a thread (priority and pin); no-op if absent
    Remove { pid: Pid },

    /// Mark an explicit list of CPUs isolated
    Isolate { cpus: Vec<CpuId> },

    /// Clear all isolation flags
    ClearIsolation,

    /// Pin a thread to a CPU
    Pin { pid: Pid, cpu: CpuId },

    /// Query the full configuration snapshot
    Status,

    /// Liveness check
    Ping,

    /// Request the scheduler to stop gracefully
    Shutdown,
}

/// Responses from the scheduler to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AdminResponse {
    /// Acknowledgment
    Ok,

    /// Pong response to ping
    Pong { version: String },

    /// Status snapshot
    Status { snapshot: StatusSnapshot },

    /// Error response
    Error { message: String },
}

/// Point-in-time view of registered tasks, isolation, and counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub tasks: Vec<TaskEntry>,
    pub isolated_cpus: Vec<CpuId>,
    pub isolation_enabled: bool,
    pub counters: CounterSnapshot,
}

/// One registered task in the status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskEntry {
    pub pid: Pid,
    pub priority: PriorityClass,
    pub pinned_cpu: Option<CpuId>,
}
