//! Integration tests for gamesched
//!
//! These tests verify end-to-end behavior of the scheduling engine and its
//! admin control surface.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gamesched::admin::{self, AdminClient};
use gamesched::config::Config;
use gamesched::domain::{CpuId, Pid, PriorityClass};
use gamesched::host::HostRuntime;
use gamesched::scheduler::{GameSched, Selection};
use gamesched::tables::SchedTables;
use tempfile::TempDir;

/// Host double with a scriptable idle set and a fixed default candidate.
struct FakeHost {
    nr_cpus: usize,
    default_cpu: CpuId,
    idle: Mutex<HashSet<CpuId>>,
    dispatched: Mutex<Vec<(Pid, CpuId)>>,
}

impl FakeHost {
    fn new(nr_cpus: usize, default_cpu: CpuId) -> Self {
        Self {
            nr_cpus,
            default_cpu,
            idle: Mutex::new(HashSet::new()),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    fn with_idle(self, cpus: &[CpuId]) -> Self {
        *self.idle.lock().unwrap() = cpus.iter().copied().collect();
        self
    }
}

impl HostRuntime for FakeHost {
    fn nr_cpus(&self) -> usize {
        self.nr_cpus
    }
    fn test_and_clear_idle(&self, cpu: CpuId) -> bool {
        self.idle.lock().unwrap().remove(&cpu)
    }
    fn select_cpu_default(&self, _pid: Pid, _prev_cpu: CpuId, _wake_flags: u64) -> (CpuId, bool) {
        let idle = self.test_and_clear_idle(self.default_cpu);
        (self.default_cpu, idle)
    }
    fn task_allows_cpu(&self, _pid: Pid, _cpu: CpuId) -> bool {
        true
    }
    fn is_kernel_helper(&self, _pid: Pid) -> bool {
        false
    }
    fn dispatch_local(&self, pid: Pid, cpu: CpuId, _slice: Duration) {
        self.dispatched.lock().unwrap().push((pid, cpu));
    }
}

fn build_engine(host: FakeHost, isolation_enabled: bool) -> (Arc<FakeHost>, Arc<GameSched>) {
    let host = Arc::new(host);
    let tables = Arc::new(SchedTables::new(isolation_enabled, 64));
    let sched = GameSched::new(&Config::default(), host.clone() as Arc<dyn HostRuntime>, tables)
        .expect("Failed to build engine");
    (host, Arc::new(sched))
}

// =============================================================================
// End-to-end Scheduling Flow Tests
// =============================================================================

#[test]
fn test_full_wakeup_to_dispatch_flow() {
    let (host, sched) = build_engine(FakeHost::new(4, 2), true);

    // Operator sets up the session: render thread registered, CPUs 2-3
    // reserved for game threads. The host's default placement favors CPU 2.
    sched.tables().priorities.insert(100, PriorityClass::Render).expect("register");
    sched.tables().isolation.set(&[2, 3]);

    // A normal task waking toward an isolated CPU is steered away
    let selection = sched.select_cpu(500, 2, 0);
    assert_eq!(selection.cpu, 0, "normal task should be redirected off isolated CPU");

    // The render thread is left on the isolated CPU
    let selection = sched.select_cpu(100, 2, 0);
    assert_eq!(selection.cpu, 2);

    // Both become runnable; the render thread drains first
    sched.enqueue(500, 0);
    sched.enqueue(100, 0);
    assert_eq!(sched.dispatch(2), Some(100));
    assert_eq!(sched.dispatch(0), Some(500));
    assert_eq!(sched.dispatch(0), None);

    assert_eq!(*host.dispatched.lock().unwrap(), vec![(100, 2), (500, 0)]);

    let counters = sched.tables().counters.snapshot();
    assert_eq!(counters.game_dispatched, 1);
    assert_eq!(counters.normal_dispatched, 1);
    assert_eq!(counters.isolation_redirects, 1);
}

#[test]
fn test_pinned_thread_eager_dispatch_flow() {
    let (host, sched) = build_engine(FakeHost::new(8, 0).with_idle(&[6]), true);

    sched.tables().priorities.insert(42, PriorityClass::GameOther).expect("register");
    sched.tables().pins.pin(42, 6).expect("pin");
    sched.tables().isolation.set(&[6]);

    // Pin wins over everything; the idle CPU takes the task immediately
    let selection = sched.select_cpu(42, 1, 0);
    assert_eq!(selection, Selection { cpu: 6, dispatched: true });
    assert_eq!(*host.dispatched.lock().unwrap(), vec![(42, 6)]);

    // Eagerly dispatched tasks never hit the ready queues
    assert_eq!(sched.queued_tasks(), 0);
}

#[test]
fn test_strict_priority_across_all_levels() {
    let (_, sched) = build_engine(FakeHost::new(4, 0), false);
    sched.tables().priorities.insert(1, PriorityClass::Render).expect("register");
    sched.tables().priorities.insert(2, PriorityClass::GameOther).expect("register");
    sched.tables().priorities.insert(4, PriorityClass::Background).expect("register");

    // Enqueue in reverse priority order
    sched.enqueue(4, 0); // background
    sched.enqueue(3, 0); // normal (unregistered)
    sched.enqueue(2, 0); // game
    sched.enqueue(1, 0); // render

    assert_eq!(sched.dispatch(0), Some(1));
    assert_eq!(sched.dispatch(0), Some(2));
    assert_eq!(sched.dispatch(0), Some(3));
    assert_eq!(sched.dispatch(0), Some(4));
    assert_eq!(sched.dispatch(0), None);
}

#[test]
fn test_unregister_demotes_to_normal() {
    let (_, sched) = build_engine(FakeHost::new(4, 1), true);
    sched.tables().priorities.insert(7, PriorityClass::Render).expect("register");
    sched.tables().isolation.set(&[1]);

    // Registered: allowed to stay on the isolated candidate
    assert_eq!(sched.select_cpu(7, 1, 0).cpu, 1);

    sched.tables().unregister(7);

    // Unregistered: treated as normal and redirected
    assert_eq!(sched.select_cpu(7, 1, 0).cpu, 0);
}

// =============================================================================
// Admin Surface Tests
// =============================================================================

async fn start_admin(sched: Arc<GameSched>) -> (TempDir, AdminClient, tokio::task::JoinHandle<eyre::Result<()>>) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let socket_path = temp.path().join("gamesched.sock");
    let (listener, _) = admin::create_listener_at(&socket_path).expect("Failed to bind socket");

    let handle = tokio::spawn(admin::serve(sched, listener));
    let client = AdminClient::with_socket_path(socket_path);
    (temp, client, handle)
}

#[tokio::test]
async fn test_admin_register_isolate_pin_status() {
    let (_, sched) = build_engine(FakeHost::new(8, 0), true);
    let (_temp, client, handle) = start_admin(sched.clone()).await;

    client.add(100, PriorityClass::Render).await.expect("add failed");
    client.add(101, PriorityClass::GameOther).await.expect("add failed");
    client.isolate(vec![2, 3]).await.expect("isolate failed");
    client.pin(100, 2).await.expect("pin failed");

    let status = client.status().await.expect("status failed");
    assert_eq!(status.tasks.len(), 2);
    assert_eq!(status.tasks[0].pid, 100);
    assert_eq!(status.tasks[0].priority, PriorityClass::Render);
    assert_eq!(status.tasks[0].pinned_cpu, Some(2));
    assert_eq!(status.isolated_cpus, vec![2, 3]);
    assert!(status.isolation_enabled);

    // The tables the admin surface mutated are the ones selection reads
    assert_eq!(sched.select_cpu(100, 0, 0).cpu, 2);
    assert_eq!(sched.select_cpu(500, 3, 0).cpu, 0);

    client.shutdown().await.expect("shutdown failed");
    handle.await.expect("serve task panicked").expect("serve failed");
}

#[tokio::test]
async fn test_admin_remove_and_clear_isolation() {
    let (_, sched) = build_engine(FakeHost::new(4, 0), true);
    let (_temp, client, handle) = start_admin(sched.clone()).await;

    client.add(7, PriorityClass::GameOther).await.expect("add failed");
    client.isolate(vec![1]).await.expect("isolate failed");

    client.remove(7).await.expect("remove failed");
    client.clear_isolation().await.expect("clear failed");

    let status = client.status().await.expect("status failed");
    assert!(status.tasks.is_empty());
    assert!(status.isolated_cpus.is_empty());

    // Removing an unknown pid is a no-op, not an error
    client.remove(9999).await.expect("remove of unknown pid failed");

    client.shutdown().await.expect("shutdown failed");
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await.expect("serve should stop");
}

#[tokio::test]
async fn test_admin_rejects_invalid_registration() {
    let (_, sched) = build_engine(FakeHost::new(4, 0), false);
    let (_temp, client, handle) = start_admin(sched.clone()).await;

    // Only the game classes are registrable
    let err = client.add(1, PriorityClass::Normal).await.expect_err("should reject");
    assert!(err.to_string().contains("render"), "error should name the valid classes: {err}");

    let err = client.pin(1, -2).await.expect_err("should reject");
    assert!(err.to_string().contains("Invalid cpu"), "unexpected error: {err}");

    client.shutdown().await.expect("shutdown failed");
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await.expect("serve should stop");
}

#[tokio::test]
async fn test_admin_capacity_exhaustion_reported() {
    let host = Arc::new(FakeHost::new(4, 0));
    let tables = Arc::new(SchedTables::new(false, 2));
    let sched = Arc::new(
        GameSched::new(&Config::default(), host as Arc<dyn HostRuntime>, tables).expect("Failed to build engine"),
    );
    let (_temp, client, handle) = start_admin(sched.clone()).await;

    client.add(1, PriorityClass::Render).await.expect("add failed");
    client.add(2, PriorityClass::GameOther).await.expect("add failed");

    let err = client.add(3, PriorityClass::GameOther).await.expect_err("should be full");
    assert!(err.to_string().contains("full"), "unexpected error: {err}");

    // Re-registering an existing pid is an update, not a new entry
    client.add(1, PriorityClass::GameOther).await.expect("update failed");

    client.shutdown().await.expect("shutdown failed");
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await.expect("serve should stop");
}

#[tokio::test]
async fn test_admin_shutdown_terminates_engine() {
    let (_, sched) = build_engine(FakeHost::new(4, 0), false);
    let (_temp, client, handle) = start_admin(sched.clone()).await;

    assert!(client.ping().await.is_ok());
    client.shutdown().await.expect("shutdown failed");

    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "serve loop should return after shutdown");
    assert!(sched.is_terminated());

    // A terminated engine serves no decisions
    assert_eq!(sched.dispatch(0), None);
    assert_eq!(sched.select_cpu(1, 3, 0), Selection { cpu: 3, dispatched: false });
}

// =============================================================================
// Config Loading Tests
// =============================================================================

#[test]
fn test_config_load_from_explicit_path() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("gamesched.yml");
    std::fs::write(
        &path,
        "isolation-enabled: true\nslice-us: 5000\nnr-cpus: 4\n",
    )
    .expect("Failed to write config");

    let config = Config::load(Some(&path)).expect("Failed to load config");
    assert!(config.isolation_enabled);
    assert_eq!(config.slice(), Duration::from_micros(5000));
    assert_eq!(config.nr_cpus, 4);
    // Unspecified fields keep their defaults
    assert_eq!(config.max_game_tasks, gamesched::domain::MAX_GAME_TASKS);
}

#[test]
fn test_config_drives_engine_setup() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("gamesched.yml");
    std::fs::write(&path, "slice-us: 1000\nnr-cpus: 2\n").expect("Failed to write config");

    let config = Config::load(Some(&path)).expect("Failed to load config");
    let host = Arc::new(FakeHost::new(16, 0));
    let tables = Arc::new(SchedTables::new(config.isolation_enabled, config.max_game_tasks));
    let sched = GameSched::new(&config, host as Arc<dyn HostRuntime>, tables).expect("Failed to build engine");

    // Config override beats the host's CPU count
    assert_eq!(sched.nr_cpus(), 2);
    assert_eq!(sched.slice(), Duration::from_micros(1000));
}
