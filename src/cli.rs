//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{CpuId, Pid, PriorityClass};

/// gamesched - gaming-optimized CPU scheduling policy engine
#[derive(Parser)]
#[command(
    name = "gamesched",
    about = "Gaming-optimized scheduler with priority classes, CPU isolation, and pinning",
    version,
    after_help = "Without a command, runs the scheduler in the foreground.\n\
                  Admin commands talk to the running scheduler over its control socket."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute (none = run the scheduler)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Register a game thread with the running scheduler
    Add {
        /// Thread id to register
        #[arg(long)]
        pid: Pid,

        /// Priority class: render or game
        #[arg(long, value_parser = parse_game_priority)]
        priority: PriorityClass,
    },

    /// Unregister a game thread (priority and pin)
    Remove {
        /// Thread id to unregister
        #[arg(long)]
        pid: Pid,
    },

    /// Isolate CPUs for game threads, or clear isolation
    Isolate {
        /// Comma-separated CPU list (e.g. 2,3)
        #[arg(long, value_delimiter = ',', required_unless_present = "clear", conflicts_with = "clear")]
        cpus: Vec<CpuId>,

        /// Clear all CPU isolation
        #[arg(long)]
        clear: bool,
    },

    /// Pin a thread to a CPU
    Pin {
        /// Thread id to pin
        #[arg(long)]
        pid: Pid,

        /// Target CPU
        #[arg(long)]
        cpu: CpuId,
    },

    /// Show current configuration and counters
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Registration only accepts the two game classes; normal/background exist
/// as defaults, not as registrable priorities.
fn parse_game_priority(s: &str) -> Result<PriorityClass, String> {
    let class: PriorityClass = s.parse()?;
    if !class.is_game() {
        return Err(format!("Invalid priority: {} (use 'render' or 'game')", s));
    }
    Ok(class)
}

/// Output format for the status command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
