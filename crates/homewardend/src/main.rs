//! homewardend - the homewarden daemon
//!
//! Watches a fixed set of machines on the local network and powers a
//! shared server on or off depending on whether any of them is active.
//! It wires together:
//! - Configuration loading (homewarden-config)
//! - The presence/power engine (homewarden-core)
//! - The network primitives (homewarden-net)
//!
//! With `--wake` or `--shutdown` it performs the action once and exits
//! instead of entering the monitoring loop.

use anyhow::{Context, Result};
use clap::Parser;
use homewarden_config::{load_config, ConfigError, Settings};
use homewarden_core::{Engine, PowerAction, TICK_INTERVAL};
use homewarden_net::{resolve_interface, Interface, Prober, ShutdownClient, WakeSender};
use homewarden_util::MonotonicInstant;
use std::collections::HashSet;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Exit codes surfaced to the service manager. Code 2 is claimed by clap
// for usage errors.
const EXIT_CONFIG_MISSING: u8 = 1;
const EXIT_CONFIG_INVALID: u8 = 3;
const EXIT_NETWORK_INVALID: u8 = 4;
const EXIT_NO_MACHINES: u8 = 5;
const EXIT_ACTION_FAILED: u8 = 6;

/// Deadline for the whole SSH shutdown sequence (connect through exec)
const SSH_TIMEOUT: Duration = Duration::from_secs(30);

/// homewardend - wake and shut down a shared server based on LAN activity
#[derive(Parser, Debug)]
#[command(name = "homewardend")]
#[command(about = "Wake and shut down a shared server based on LAN activity", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/homewarden/homewarden.toml")]
    config: PathBuf,

    /// Wake the server up once and exit
    #[arg(short, long, conflicts_with = "shutdown")]
    wake: bool,

    /// Shut the server down once and exit
    #[arg(short, long)]
    shutdown: bool,

    /// Log level (RUST_LOG overrides)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// The running daemon
struct Daemon {
    settings: Settings,
    prober: Prober,
    wake_sender: WakeSender,
    shutdown_client: ShutdownClient,
    engine: Engine,
    last_sweep: MonotonicInstant,
}

impl Daemon {
    fn new(settings: Settings, iface: &Interface) -> Self {
        let now = MonotonicInstant::now();
        let engine = Engine::new(&settings.server, &settings.machines, now);

        Self {
            prober: Prober::new(iface),
            wake_sender: WakeSender::new(iface),
            shutdown_client: ShutdownClient::new(SSH_TIMEOUT),
            settings,
            engine,
            last_sweep: now,
        }
    }

    async fn run(mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("Monitoring the network for activity");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// One control-loop tick: always-on check, sweep on interval
    /// boundaries, then the policy evaluation - in that order.
    async fn tick(&mut self) {
        let now = MonotonicInstant::now();

        let always_on = self
            .settings
            .always_on_path
            .as_deref()
            .is_some_and(Path::exists);
        self.engine.set_always_on(always_on);

        if now.duration_since(self.last_sweep) >= self.settings.ping.interval {
            self.last_sweep = now;
            let replies = self.sweep().await;
            self.engine.observe_sweep(&replies, now);
        }

        if let Some(action) = self.engine.evaluate(now) {
            self.execute(action).await;
        }
    }

    /// Sweep the server and every machine in one batch. A failed sweep
    /// counts as all-missed; the hysteresis absorbs isolated occurrences.
    async fn sweep(&self) -> HashSet<Ipv4Addr> {
        let prober = self.prober.clone();
        let targets = self.engine.probe_targets();
        let timeout = self.settings.ping.timeout;

        match tokio::task::spawn_blocking(move || prober.sweep(&targets, timeout)).await {
            Ok(Ok(replies)) => replies,
            Ok(Err(e)) => {
                warn!(error = %e, "Probe sweep failed");
                HashSet::new()
            }
            Err(e) => {
                warn!(error = %e, "Probe task failed");
                HashSet::new()
            }
        }
    }

    /// Execute a power action; the cooldown clock only resets on success,
    /// so failures retry at the next eligible tick.
    async fn execute(&mut self, action: PowerAction) {
        let server = self.engine.server();
        let name = server.name().to_string();
        let ip = server.ip();
        let mac = server.mac();
        let credentials = server.credentials().cloned();

        match action {
            PowerAction::Wake => {
                info!(server = %name, "Waking up server");
                match self.wake_sender.wake(mac) {
                    Ok(()) => self.engine.action_succeeded(MonotonicInstant::now()),
                    Err(e) => {
                        error!(server = %name, error = %e, "Waking up server failed");
                    }
                }
            }

            PowerAction::Shutdown => {
                info!(server = %name, "Shutting down server");

                let Some(credentials) = credentials else {
                    error!(server = %name, "Server has no shutdown credentials");
                    return;
                };

                let client = self.shutdown_client.clone();
                let task_name = name.clone();
                let result = tokio::task::spawn_blocking(move || {
                    client.shutdown(
                        &task_name,
                        ip,
                        &credentials.username,
                        &credentials.password,
                    )
                })
                .await;

                match result {
                    Ok(Ok(())) => self.engine.action_succeeded(MonotonicInstant::now()),
                    Ok(Err(e)) => {
                        error!(server = %name, error = %e, "Shutting down server failed");
                    }
                    Err(e) => error!(error = %e, "Shutdown task failed"),
                }
            }
        }
    }
}

/// Manual one-shot wake, bypassing the control loop.
fn manual_wake(settings: &Settings, iface: &Interface) -> ExitCode {
    print!("Waking up {}... ", settings.server.name);
    let _ = std::io::stdout().flush();

    let sender = WakeSender::new(iface);
    match sender.wake(settings.server.mac) {
        Ok(()) => {
            println!("working");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("failed");
            error!(error = %e, "Manual wake failed");
            ExitCode::from(EXIT_ACTION_FAILED)
        }
    }
}

/// Manual one-shot shutdown, bypassing the control loop.
fn manual_shutdown(settings: &Settings) -> ExitCode {
    print!("Shutting down {}... ", settings.server.name);
    let _ = std::io::stdout().flush();

    let Some(credentials) = settings.server.credentials.as_ref() else {
        println!("failed");
        error!("Server has no shutdown credentials");
        return ExitCode::from(EXIT_ACTION_FAILED);
    };

    let client = ShutdownClient::new(SSH_TIMEOUT);
    match client.shutdown(
        &settings.server.name,
        settings.server.ip,
        &credentials.username,
        &credentials.password,
    ) {
        Ok(()) => {
            println!("working");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("failed");
            error!(error = %e, "Manual shutdown failed");
            ExitCode::from(EXIT_ACTION_FAILED)
        }
    }
}

fn log_monitoring_summary(settings: &Settings) {
    for machine in &settings.machines {
        info!(
            machine = %machine.name,
            mac = %machine.mac,
            ip = %machine.ip,
            timeout_secs = machine.timeout.as_secs(),
            "Watching machine"
        );
    }
    info!(
        interval_secs = settings.ping.interval.as_secs(),
        timeout_secs = settings.ping.timeout.as_secs(),
        "Ping"
    );
    match &settings.always_on_path {
        Some(path) => info!(path = %path.display(), "Always-on sentinel"),
        None => info!("No always-on sentinel configured"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "homewardend starting");

    let settings = match load_config(&args.config) {
        Ok(settings) => settings,
        Err(ConfigError::ReadError(e)) => {
            error!(
                path = %args.config.display(),
                error = %e,
                "Configuration file missing or unreadable"
            );
            return ExitCode::from(EXIT_CONFIG_MISSING);
        }
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Invalid configuration");
            return ExitCode::from(EXIT_CONFIG_INVALID);
        }
    };

    let iface = match resolve_interface(&settings.network.interface) {
        Ok(iface) => iface,
        Err(e) => {
            error!(
                interface = %settings.network.interface,
                error = %e,
                "Invalid network setup"
            );
            return ExitCode::from(EXIT_NETWORK_INVALID);
        }
    };

    info!(
        interface = %iface.name,
        mac = %iface.mac,
        ip = %iface.ip,
        "Network interface resolved"
    );
    info!(
        server = %settings.server.name,
        mac = %settings.server.mac,
        ip = %settings.server.ip,
        timeout_secs = settings.server.timeout.as_secs(),
        "Server"
    );

    if args.wake {
        return manual_wake(&settings, &iface);
    }
    if args.shutdown {
        return manual_shutdown(&settings);
    }

    if settings.machines.is_empty() {
        error!("No machines configured");
        return ExitCode::from(EXIT_NO_MACHINES);
    }

    log_monitoring_summary(&settings);

    match Daemon::new(settings, &iface).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Daemon failed");
            ExitCode::FAILURE
        }
    }
}
