//! Priority classification, isolation policy, and CPU selection
//!
//! Pure decision logic over the shared tables and host-supplied facts.
//! Every function here completes in a bounded number of steps: the only
//! loop is the alternate-CPU scan, capped at the execution-unit domain size.

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{CpuId, Pid, PriorityClass};
use crate::host::HostRuntime;
use crate::tables::SchedTables;

/// Outcome of a selection-time decision.
///
/// `dispatched` reports whether the task was eagerly handed to an idle CPU
/// as part of selection, so callers can tell the two paths apart instead of
/// inferring it from hidden state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub cpu: CpuId,
    pub dispatched: bool,
}

/// Effective priority for a task: its registered class, or `Normal`.
pub fn classify(tables: &SchedTables, pid: Pid) -> PriorityClass {
    tables.priorities.get(pid)
}

/// Whether a task may run on an isolated CPU.
///
/// Game-class tasks qualify by registration; host-internal helpers qualify
/// by capability. Evaluated fresh on every selection since a registration
/// can change between scheduling events.
pub fn allowed_on_isolated(tables: &SchedTables, host: &dyn HostRuntime, pid: Pid) -> bool {
    classify(tables, pid).is_game() || host.is_kernel_helper(pid)
}

/// Choose the CPU for a task about to become runnable, eagerly dispatching
/// to it when it is idle.
///
/// Pinned tasks go to their pinned CPU unconditionally; pinning is an
/// explicit override and isolation is not re-checked for it. Unpinned tasks
/// start from the host's default candidate and are steered off isolated
/// CPUs they are not allowed on, falling back to the isolated candidate
/// when no permitted alternative exists.
pub fn select_cpu(
    tables: &SchedTables,
    host: &dyn HostRuntime,
    nr_cpus: usize,
    slice: Duration,
    pid: Pid,
    prev_cpu: CpuId,
    wake_flags: u64,
) -> Selection {
    if let Some(cpu) = tables.pins.pinned_cpu(pid) {
        let dispatched = host.test_and_clear_idle(cpu);
        if dispatched {
            host.dispatch_local(pid, cpu, slice);
        }
        debug!(pid, cpu, dispatched, "placed pinned task");
        return Selection { cpu, dispatched };
    }

    let (mut cpu, mut is_idle) = host.select_cpu_default(pid, prev_cpu, wake_flags);

    if tables.isolation.is_isolated(cpu) && !allowed_on_isolated(tables, host, pid) {
        let alternate = (0..nr_cpus as CpuId)
            .find(|&candidate| !tables.isolation.is_isolated(candidate) && host.task_allows_cpu(pid, candidate));

        match alternate {
            Some(alt) => {
                debug!(pid, from = cpu, to = alt, "redirected off isolated cpu");
                cpu = alt;
                is_idle = host.test_and_clear_idle(cpu);
            }
            None => {
                // Affinity exhaustion: keep the isolated candidate rather
                // than stall the task. The isolation guarantee is violated
                // here; the outcome is deliberate and only logged.
                warn!(pid, cpu, "no permitted non-isolated cpu, keeping isolated candidate");
            }
        }
        tables.counters.bump_redirect();
    }

    let dispatched = is_idle;
    if dispatched {
        host.dispatch_local(pid, cpu, slice);
    }
    Selection { cpu, dispatched }
}
