//! Admin client: the CLI side of the control surface

use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use crate::domain::{CpuId, Pid, PriorityClass};

use super::get_socket_path;
use super::messages::{AdminRequest, AdminResponse, StatusSnapshot};

/// Default timeout for admin operations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests are single small JSON objects.
const MAX_REQUEST_SIZE: usize = 1024;

/// Responses can carry a full status snapshot (up to the table capacity of
/// registered tasks), so the cap is wider than for requests.
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Client for talking to the running scheduler's admin socket.
#[derive(Debug, Clone)]
pub struct AdminClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl Default for AdminClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminClient {
    /// Create a new client with the default socket path
    pub fn new() -> Self {
        Self {
            socket_path: get_socket_path(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client with a custom socket path (for testing)
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the scheduler's admin socket exists.
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Register a game thread.
    pub async fn add(&self, pid: Pid, priority: PriorityClass) -> Result<()> {
        self.expect_ok(AdminRequest::Add { pid, priority }).await
    }

    /// Unregister a thread (no-op if absent).
    pub async fn remove(&self, pid: Pid) -> Result<()> {
        self.expect_ok(AdminRequest::Remove { pid }).await
    }

    /// Mark CPUs isolated.
    pub async fn isolate(&self, cpus: Vec<CpuId>) -> Result<()> {
        self.expect_ok(AdminRequest::Isolate { cpus }).await
    }

    /// Clear all isolation flags.
    pub async fn clear_isolation(&self) -> Result<()> {
        self.expect_ok(AdminRequest::ClearIsolation).await
    }

    /// Pin a thread to a CPU.
    pub async fn pin(&self, pid: Pid, cpu: CpuId) -> Result<()> {
        self.expect_ok(AdminRequest::Pin { pid, cpu }).await
    }

    /// Fetch the status snapshot.
    pub async fn status(&self) -> Result<StatusSnapshot> {
        match self.send_request(AdminRequest::Status).await? {
            AdminResponse::Status { snapshot } => Ok(snapshot),
            AdminResponse::Error { message } => Err(eyre::eyre!("Scheduler error: {}", message)),
            _ => Err(eyre::eyre!("Unexpected response")),
        }
    }

    /// Check if the scheduler is alive and get its version
    pub async fn ping(&self) -> Result<String> {
        match self.send_request(AdminRequest::Ping).await? {
            AdminResponse::Pong { version } => Ok(version),
            AdminResponse::Error { message } => Err(eyre::eyre!("Scheduler error: {}", message)),
            _ => Err(eyre::eyre!("Unexpected response")),
        }
    }

    /// Request the scheduler to stop gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.expect_ok(AdminRequest::Shutdown).await
    }

    async fn expect_ok(&self, req: AdminRequest) -> Result<()> {
        match self.send_request(req).await? {
            AdminResponse::Ok => Ok(()),
            AdminResponse::Error { message } => Err(eyre::eyre!("Scheduler error: {}", message)),
            _ => Err(eyre::eyre!("Unexpected response")),
        }
    }

    /// Send a request and wait for the response.
    async fn send_request(&self, req: AdminRequest) -> Result<AdminResponse> {
        debug!(?self.socket_path, ?req, "AdminClient: sending request");

        // Connect with timeout
        let mut stream = tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to scheduler socket")?;

        // Serialize and validate request size
        let req_json = serde_json::to_string(&req).context("Failed to serialize request")?;
        if req_json.len() > MAX_REQUEST_SIZE {
            return Err(eyre::eyre!("Request too large: {} bytes", req_json.len()));
        }

        // Send request with newline
        tokio::time::timeout(self.timeout, async {
            stream
                .write_all(req_json.as_bytes())
                .await
                .context("Failed to write request")?;
            stream.write_all(b"\n").await.context("Failed to write newline")?;
            stream.flush().await.context("Failed to flush stream")?;
            Ok::<_, eyre::Error>(())
        })
        .await
        .context("Write timeout")??;

        // Read response with size limit
        let mut reader = BufReader::new(&mut stream);
        let mut response_line = String::new();

        tokio::time::timeout(self.timeout, async {
            let bytes_read = reader
                .read_line(&mut response_line)
                .await
                .context("Failed to read response")?;

            if bytes_read > MAX_RESPONSE_SIZE {
                return Err(eyre::eyre!("Response too large: {} bytes", bytes_read));
            }

            Ok::<_, eyre::Error>(())
        })
        .await
        .context("Read timeout")??;

        let response: AdminResponse =
            serde_json::from_str(response_line.trim()).context("Failed to parse scheduler response")?;

        debug!(?response, "AdminClient: received response");
        Ok(response)
    }
}
