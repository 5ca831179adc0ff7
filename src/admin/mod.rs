//! Administrative control surface
//!
//! The running daemon exposes its tables to CLI commands over a Unix Domain
//! Socket. The protocol is newline-delimited JSON: one request line, one
//! response line per connection.

use std::path::PathBuf;

pub mod client;
pub mod messages;
pub mod server;

pub use client::AdminClient;
pub use messages::{AdminRequest, AdminResponse, StatusSnapshot, TaskEntry};
pub use server::{apply_request, cleanup_socket, create_listener, create_listener_at, serve, snapshot};

/// Socket path for the admin control surface.
///
/// Lives alongside the daemon's other runtime files. CLI subcommands probe
/// this path to tell whether a scheduler is running.
pub fn get_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("gamesched")
        .join("gamesched.sock")
}
