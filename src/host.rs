//! Host runtime interface
//!
//! The policy engine decides *where* and *in what order* tasks run; the host
//! runtime is the external collaborator that actually context-switches them
//! and invokes the engine at wakeup, enqueue, and idle time. Everything the
//! core consumes but does not compute crosses this trait: idle state,
//! affinity membership, the baseline placement heuristic, and the capability
//! flag for host-internal helper tasks.

use std::time::Duration;

use tracing::debug;

use crate::domain::{CpuId, Pid};

/// Facts and effects supplied by the entity that runs tasks.
///
/// Every method is synchronous and expected to complete in bounded time;
/// the engine calls them from its hot decision path.
pub trait HostRuntime: Send + Sync {
    /// Size of the execution-unit domain.
    fn nr_cpus(&self) -> usize;

    /// Atomically check whether `cpu` is idle and claim it if so.
    fn test_and_clear_idle(&self, cpu: CpuId) -> bool;

    /// The host's baseline affinity-aware placement heuristic.
    ///
    /// Returns the candidate CPU and whether that CPU was idle (and claimed).
    fn select_cpu_default(&self, pid: Pid, prev_cpu: CpuId, wake_flags: u64) -> (CpuId, bool);

    /// Whether `cpu` is in the task's permitted affinity mask.
    fn task_allows_cpu(&self, pid: Pid, cpu: CpuId) -> bool;

    /// Whether the task is a non-preemptible host-internal helper
    /// (kernel thread or similar), which may run on isolated CPUs
    /// regardless of registration.
    fn is_kernel_helper(&self, pid: Pid) -> bool;

    /// Hand `pid` to `cpu` for one time slice.
    fn dispatch_local(&self, pid: Pid, cpu: CpuId, slice: Duration);
}

/// Stand-in host for running the control surface without a real runtime.
///
/// The daemon binary uses this so the admin socket, status surface, and
/// counters are live even when no runtime is driving scheduling callbacks.
/// It reports the machine's CPU count, never observes an idle CPU, and
/// records dispatches only in the log. Real integrations implement
/// [`HostRuntime`] against their own runtime.
#[derive(Debug)]
pub struct SystemHost {
    nr_cpus: usize,
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemHost {
    pub fn new() -> Self {
        let nr_cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { nr_cpus }
    }
}

impl HostRuntime for SystemHost {
    fn nr_cpus(&self) -> usize {
        self.nr_cpus
    }

    fn test_and_clear_idle(&self, _cpu: CpuId) -> bool {
        false
    }

    fn select_cpu_default(&self, _pid: Pid, prev_cpu: CpuId, _wake_flags: u64) -> (CpuId, bool) {
        (prev_cpu.max(0), false)
    }

    fn task_allows_cpu(&self, _pid: Pid, _cpu: CpuId) -> bool {
        true
    }

    fn is_kernel_helper(&self, _pid: Pid) -> bool {
        false
    }

    fn dispatch_local(&self, pid: Pid, cpu: CpuId, slice: Duration) {
        debug!(pid, cpu, ?slice, "dispatch_local (no runtime attached)");
    }
}
