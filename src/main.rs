//! gamesched - gaming-optimized CPU scheduling policy engine
//!
//! CLI entry point: runs the scheduler in the foreground, or talks to a
//! running instance over its admin socket.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use gamesched::admin::{self, AdminClient, StatusSnapshot};
use gamesched::cli::{Cli, Command, OutputFormat};
use gamesched::config::Config;
use gamesched::domain::{CpuId, Pid, PriorityClass};
use gamesched::host::SystemHost;
use gamesched::scheduler::GameSched;
use gamesched::tables::SchedTables;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gamesched")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to a log file, not stdout: the run mode owns stdout for the
    // stats line.
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("gamesched.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        None => cmd_run(&config).await,
        Some(Command::Add { pid, priority }) => cmd_add(pid, priority).await,
        Some(Command::Remove { pid }) => cmd_remove(pid).await,
        Some(Command::Isolate { cpus, clear }) => cmd_isolate(cpus, clear).await,
        Some(Command::Pin { pid, cpu }) => cmd_pin(pid, cpu).await,
        Some(Command::Status { format }) => cmd_status(format).await,
    }
}

/// Connect to the running scheduler, with guidance when it isn't up.
fn connect() -> Result<AdminClient> {
    let client = AdminClient::new();
    if !client.socket_exists() {
        return Err(eyre::eyre!(
            "gamesched scheduler is not running.\nStart it first with: gamesched"
        ));
    }
    Ok(client)
}

/// Register a game thread with the running scheduler
async fn cmd_add(pid: Pid, priority: PriorityClass) -> Result<()> {
    connect()?.add(pid, priority).await?;
    println!("Added PID {} with priority '{}'", pid, priority);
    Ok(())
}

/// Unregister a game thread
async fn cmd_remove(pid: Pid) -> Result<()> {
    connect()?.remove(pid).await?;
    println!("Removed PID {}", pid);
    Ok(())
}

/// Set or clear CPU isolation
async fn cmd_isolate(cpus: Vec<CpuId>, clear: bool) -> Result<()> {
    let client = connect()?;
    if clear {
        client.clear_isolation().await?;
        println!("Cleared CPU isolation");
    } else {
        client.isolate(cpus.clone()).await?;
        let list: Vec<String> = cpus.iter().map(|cpu| cpu.to_string()).collect();
        println!("Isolated CPUs: {}", list.join(","));
    }
    Ok(())
}

/// Pin a thread to a CPU
async fn cmd_pin(pid: Pid, cpu: CpuId) -> Result<()> {
    connect()?.pin(pid, cpu).await?;
    println!("Pinned PID {} to CPU {}", pid, cpu);
    Ok(())
}

/// Show the running scheduler's configuration and counters
async fn cmd_status(format: OutputFormat) -> Result<()> {
    let snapshot = connect()?.status().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Text => print_status(&snapshot),
    }
    Ok(())
}

fn print_status(snapshot: &StatusSnapshot) {
    println!("=== GameSched Status ===");
    println!();

    println!("Game Threads:");
    if snapshot.tasks.is_empty() {
        println!("  (none)");
    }
    for task in &snapshot.tasks {
        match task.pinned_cpu {
            Some(cpu) => println!("  PID {}: priority={} (pinned to CPU {})", task.pid, task.priority, cpu),
            None => println!("  PID {}: priority={}", task.pid, task.priority),
        }
    }

    println!();
    let isolated: Vec<String> = snapshot.isolated_cpus.iter().map(|cpu| cpu.to_string()).collect();
    if isolated.is_empty() {
        println!("Isolated CPUs: (none)");
    } else {
        println!("Isolated CPUs: {}", isolated.join(","));
    }
    if !snapshot.isolation_enabled {
        println!("  (isolation enforcement disabled)");
    }

    println!();
    println!(
        "Counters: game={} normal={} isolated_redirects={}",
        snapshot.counters.game_dispatched,
        snapshot.counters.normal_dispatched,
        snapshot.counters.isolation_redirects
    );
}

/// Run the scheduler in the foreground
async fn cmd_run(config: &Config) -> Result<()> {
    config.validate()?;

    let host = Arc::new(SystemHost::new());
    let tables = Arc::new(SchedTables::new(config.isolation_enabled, config.max_game_tasks));
    let sched = Arc::new(GameSched::new(config, host, tables.clone())?);

    let (listener, socket_path) = admin::create_listener().context("Is another instance running?")?;

    info!(
        nr_cpus = sched.nr_cpus(),
        isolation = config.isolation_enabled,
        "scheduler started"
    );
    println!("GameSched running. Press Ctrl+C to exit.");
    println!("Use 'gamesched add --pid PID --priority render' to add game threads.");
    println!();

    let mut serve_handle = tokio::spawn(admin::serve(sched.clone(), listener));

    // Stats line once per second until a signal or an admin shutdown
    // terminates the engine.
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let counters = tables.counters.snapshot();
                    println!(
                        "game={} normal={} isolated_redirects={}",
                        counters.game_dispatched, counters.normal_dispatched, counters.isolation_redirects
                    );
                }
                _ = sigint.recv() => {
                    warn!("SIGINT received");
                    sched.exit("SIGINT received");
                    break;
                }
                _ = sigterm.recv() => {
                    warn!("SIGTERM received");
                    sched.exit("SIGTERM received");
                    break;
                }
                result = &mut serve_handle => {
                    if let Err(e) = result.context("admin server task failed")? {
                        warn!(error = %e, "admin server stopped with error");
                    }
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        sched.exit("interrupt received");
    }

    if !serve_handle.is_finished() {
        serve_handle.abort();
    }
    admin::cleanup_socket(&socket_path);

    if let Some(reason) = sched.exit_reason() {
        println!("GameSched stopped: {}", reason);
    }
    Ok(())
}
