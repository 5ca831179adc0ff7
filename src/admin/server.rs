//! Admin server: the daemon side of the control surface

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use crate::scheduler::GameSched;

use super::get_socket_path;
use super::messages::{AdminRequest, AdminResponse, StatusSnapshot, TaskEntry};

/// Maximum request size. Requests are single small JSON objects.
const MAX_REQUEST_SIZE: usize = 1024;

/// Create and bind the admin socket listener.
///
/// Handles cleanup of stale socket files from previous runs.
pub fn create_listener() -> Result<(UnixListener, PathBuf)> {
    let socket_path = get_socket_path();
    create_listener_at(&socket_path)
}

/// Create a listener at a specific path (for testing)
pub fn create_listener_at(socket_path: &PathBuf) -> Result<(UnixListener, PathBuf)> {
    debug!(?socket_path, "create_listener: creating admin socket");

    // Ensure parent directory exists
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    // Clean up stale socket if exists
    if socket_path.exists() {
        debug!(?socket_path, "create_listener: removing stale socket");
        std::fs::remove_file(socket_path).context("Failed to remove stale socket")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind admin socket")?;
    debug!(?socket_path, "create_listener: socket bound successfully");

    Ok((listener, socket_path.clone()))
}

/// Remove the socket file on shutdown
pub fn cleanup_socket(socket_path: &PathBuf) {
    if socket_path.exists()
        && let Err(e) = std::fs::remove_file(socket_path)
    {
        warn!(?socket_path, error = %e, "Failed to remove socket file");
    }
}

/// Read one request line from a connection.
pub async fn read_request(stream: &mut UnixStream) -> Result<AdminRequest> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    let bytes_read = reader
        .read_line(&mut line)
        .await
        .context("Failed to read admin request")?;

    if bytes_read > MAX_REQUEST_SIZE {
        return Err(eyre::eyre!("Request too large: {} bytes", bytes_read));
    }

    if line.is_empty() {
        return Err(eyre::eyre!("Empty request received"));
    }

    let req: AdminRequest = serde_json::from_str(line.trim()).context("Failed to parse admin request")?;
    debug!(?req, "read_request: parsed request");

    Ok(req)
}

/// Send a response on the stream.
pub async fn send_response(stream: &mut UnixStream, response: AdminResponse) -> Result<()> {
    let response_json = serde_json::to_string(&response).context("Failed to serialize response")?;
    stream
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write response")?;
    stream.write_all(b"\n").await.context("Failed to write newline")?;
    stream.flush().await.context("Failed to flush response")?;
    Ok(())
}

/// Apply one admin request against the engine's tables.
///
/// All table validation lives here: invalid priorities and CPUs are rejected
/// without mutating anything, capacity exhaustion is reported to the caller,
/// and removes of unknown pids succeed as no-ops.
pub fn apply_request(sched: &GameSched, req: &AdminRequest) -> AdminResponse {
    let tables = sched.tables();
    match req {
        AdminRequest::Add { pid, priority } => {
            if !priority.is_game() {
                return AdminResponse::Error {
                    message: format!("Invalid priority: {} (use 'render' or 'game')", priority),
                };
            }
            match tables.priorities.insert(*pid, *priority) {
                Ok(()) => {
                    info!(pid, %priority, "added game thread");
                    AdminResponse::Ok
                }
                Err(e) => AdminResponse::Error { message: e.to_string() },
            }
        }
        AdminRequest::Remove { pid } => {
            tables.unregister(*pid);
            info!(pid, "removed game thread");
            AdminResponse::Ok
        }
        AdminRequest::Isolate { cpus } => {
            if !tables.isolation.is_enabled() {
                warn!("isolation flags stored but enforcement is disabled at start");
            }
            tables.isolation.set(cpus);
            info!(?cpus, "isolated cpus");
            AdminResponse::Ok
        }
        AdminRequest::ClearIsolation => {
            tables.isolation.clear();
            info!("cleared cpu isolation");
            AdminResponse::Ok
        }
        AdminRequest::Pin { pid, cpu } => {
            if *cpu < 0 {
                return AdminResponse::Error {
                    message: format!("Invalid cpu: {}", cpu),
                };
            }
            match tables.pins.pin(*pid, *cpu) {
                Ok(()) => {
                    info!(pid, cpu, "pinned thread");
                    AdminResponse::Ok
                }
                Err(e) => AdminResponse::Error { message: e.to_string() },
            }
        }
        AdminRequest::Status => AdminResponse::Status { snapshot: snapshot(sched) },
        AdminRequest::Ping => AdminResponse::Pong {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        AdminRequest::Shutdown => AdminResponse::Ok,
    }
}

/// Build the status snapshot from the live tables.
pub fn snapshot(sched: &GameSched) -> StatusSnapshot {
    let tables = sched.tables();
    let tasks = tables
        .priorities
        .entries()
        .into_iter()
        .map(|(pid, priority)| TaskEntry {
            pid,
            priority,
            pinned_cpu: tables.pins.pinned_cpu(pid),
        })
        .collect();

    StatusSnapshot {
        tasks,
        isolated_cpus: tables.isolation.isolated_cpus(),
        isolation_enabled: tables.isolation.is_enabled(),
        counters: tables.counters.snapshot(),
    }
}

/// Serve admin requests until a shutdown request arrives.
///
/// One request/response per connection. A shutdown request is acknowledged,
/// then the engine is terminated and the loop returns.
pub async fn serve(sched: Arc<GameSched>, listener: UnixListener) -> Result<()> {
    loop {
        let (mut stream, _) = listener.accept().await.context("Failed to accept admin connection")?;

        match read_request(&mut stream).await {
            Ok(req) => {
                let shutdown = matches!(req, AdminRequest::Shutdown);
                let response = apply_request(&sched, &req);
                if let Err(e) = send_response(&mut stream, response).await {
                    warn!(error = %e, "failed to send admin response");
                }
                if shutdown {
                    sched.exit("shutdown requested over admin socket");
                    return Ok(());
                }
            }
            Err(e) => {
                warn!(error = %e, "invalid admin request");
                let _ = send_response(&mut stream, AdminResponse::Error { message: e.to_string() }).await;
            }
        }
    }
}
