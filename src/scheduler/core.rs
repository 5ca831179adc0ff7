//! Scheduler orchestrator
//!
//! Ties the tables, policies, and ready queues together across the two
//! decision points the host runtime drives: selection time (task wakeup)
//! and dispatch time (execution unit went idle). Every entry point is
//! synchronous and bounded; only the admin surface around the engine is
//! async.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use eyre::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{CpuId, MAX_CPUS, Pid};
use crate::host::HostRuntime;
use crate::tables::SchedTables;

use super::policy::{self, Selection};
use super::queue::DispatchQueues;

/// The scheduling policy engine.
///
/// Constructed once (allocating the ready queues), then serves selection,
/// enqueue, and dispatch requests until [`exit`](GameSched::exit) moves it
/// to the terminated state. Table mutations through [`tables`]
/// (GameSched::tables) are accepted at any point without a state change.
pub struct GameSched {
    host: Arc<dyn HostRuntime>,
    tables: Arc<SchedTables>,
    queues: DispatchQueues,
    slice: Duration,
    nr_cpus: usize,
    terminated: AtomicBool,
    exit_reason: Mutex<Option<String>>,
}

impl GameSched {
    /// Initialize the engine: validate configuration and allocate the
    /// per-priority ready queues. Failure here is fatal and propagated;
    /// the scheduler does not start.
    pub fn new(config: &Config, host: Arc<dyn HostRuntime>, tables: Arc<SchedTables>) -> Result<Self> {
        config.validate()?;

        let nr_cpus = if config.nr_cpus > 0 { config.nr_cpus } else { host.nr_cpus() };
        if nr_cpus == 0 {
            return Err(eyre::eyre!("host reports zero execution units"));
        }
        let nr_cpus = nr_cpus.min(MAX_CPUS);

        let sched = Self {
            host,
            tables,
            queues: DispatchQueues::new(),
            slice: config.slice(),
            nr_cpus,
            terminated: AtomicBool::new(false),
            exit_reason: Mutex::new(None),
        };
        info!(nr_cpus, slice = ?sched.slice, "scheduler initialized");
        Ok(sched)
    }

    /// Selection-time decision for a task waking up.
    ///
    /// Returns the chosen CPU and whether the task was eagerly dispatched
    /// to it. After termination the previous CPU is echoed back and nothing
    /// is dispatched.
    pub fn select_cpu(&self, pid: Pid, prev_cpu: CpuId, wake_flags: u64) -> Selection {
        if self.is_terminated() {
            return Selection { cpu: prev_cpu, dispatched: false };
        }
        policy::select_cpu(
            &self.tables,
            self.host.as_ref(),
            self.nr_cpus,
            self.slice,
            pid,
            prev_cpu,
            wake_flags,
        )
    }

    /// Classify a runnable task and append it to the matching ready queue.
    ///
    /// Bumps the game or normal dispatch counter according to the class;
    /// the counters reflect enqueue events, not completions.
    pub fn enqueue(&self, pid: Pid, enq_flags: u64) {
        if self.is_terminated() {
            return;
        }
        let class = policy::classify(&self.tables, pid);
        self.queues.push(class, pid);
        if class.is_game() {
            self.tables.counters.bump_game();
        } else {
            self.tables.counters.bump_normal();
        }
        debug!(pid, %class, enq_flags, "enqueued task");
    }

    /// Dispatch-time decision for an idle execution unit.
    ///
    /// Consumes the head of the highest-priority non-empty queue and hands
    /// it to `cpu` for one slice. `None` when every queue is empty (the
    /// unit stays idle) or after termination.
    pub fn dispatch(&self, cpu: CpuId) -> Option<Pid> {
        if self.is_terminated() {
            return None;
        }
        let (class, pid) = self.queues.pop_first()?;
        self.host.dispatch_local(pid, cpu, self.slice);
        debug!(pid, %class, cpu, "dispatched task");
        Some(pid)
    }

    /// Transition to the terminated state, recording the reason for the
    /// status surface. The first reason wins; later calls are no-ops.
    /// In-flight decisions already committed are not rolled back.
    pub fn exit(&self, reason: &str) {
        let mut stored = self.exit_reason.lock().unwrap_or_else(PoisonError::into_inner);
        if stored.is_none() {
            *stored = Some(reason.to_string());
            self.terminated.store(true, Ordering::Release);
            info!(reason, "scheduler terminated");
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// The recorded termination reason, if the engine has exited.
    pub fn exit_reason(&self) -> Option<String> {
        self.exit_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The shared tables this engine decides against.
    pub fn tables(&self) -> &Arc<SchedTables> {
        &self.tables
    }

    /// Configured time slice handed out with every dispatch.
    pub fn slice(&self) -> Duration {
        self.slice
    }

    /// Effective execution-unit domain size.
    pub fn nr_cpus(&self) -> usize {
        self.nr_cpus
    }

    /// Tasks currently waiting across all ready queues.
    pub fn queued_tasks(&self) -> usize {
        self.queues.total_len()
    }
}

impl std::fmt::Debug for GameSched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSched")
            .field("nr_cpus", &self.nr_cpus)
            .field("slice", &self.slice)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
