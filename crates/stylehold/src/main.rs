//! stylehold - booking holds for stylist appointment slots
//!
//! This is the command-line entry point. It wires together:
//! - Configuration loading
//! - Store initialization
//! - The hold manager
//! - The long-running expiry sweeper (`serve`)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stylehold_api::{HoldFilter, HoldRecord, HoldRequest, HoldStatus};
use stylehold_config::{Policy, load_config};
use stylehold_core::{HoldManager, compute_booking_expiry_in};
use stylehold_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use stylehold_util::{
    ClientId, Clock, DB_FILENAME, HoldId, STYLEHOLD_CONFIG_ENV, STYLEHOLD_DATA_DIR_ENV, StylistId,
    SystemClock, Timestamp, default_config_path, format_datetime_full, format_duration,
    is_mock_time_active,
};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// stylehold - Temporary holds on stylist appointment slots
#[derive(Parser, Debug)]
#[command(name = "stylehold")]
#[command(about = "Temporary holds on stylist appointment slots", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/stylehold/config.toml)
    #[arg(short, long, env = STYLEHOLD_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set STYLEHOLD_DATA_DIR env var)
    #[arg(short, long, env = STYLEHOLD_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show when a hold placed now for a slot would expire
    Expiry {
        /// Booking date, YYYY-MM-DD
        date: String,
        /// Booking time, HH:mm (24-hour)
        time: String,
        /// Use this stylist's expiry settings
        #[arg(long)]
        stylist: Option<String>,
    },

    /// Place a pending hold on a slot
    Place {
        #[arg(long)]
        stylist: String,
        #[arg(long)]
        client: String,
        /// Booking date, YYYY-MM-DD
        date: String,
        /// Booking time, HH:mm (24-hour)
        time: String,
    },

    /// Confirm a pending hold
    Confirm { id: HoldId },

    /// Release a pending hold
    Release { id: HoldId },

    /// List holds
    List {
        #[arg(long)]
        status: Option<HoldStatus>,
        #[arg(long)]
        stylist: Option<String>,
    },

    /// Expire lapsed holds once and exit
    Sweep,

    /// Run the expiry sweeper until interrupted
    Serve,
}

/// Load the policy, falling back to defaults when no config file exists
fn load_policy(path: &Path) -> Result<Policy> {
    if !path.exists() {
        info!(config_path = %path.display(), "No configuration file, using defaults");
        return Ok(Policy::default());
    }

    let policy = load_config(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;

    info!(
        config_path = %path.display(),
        stylist_count = policy.stylists.len(),
        "Configuration loaded"
    );
    Ok(policy)
}

fn open_store(args: &Args, policy: &Policy) -> Result<Arc<dyn Store>> {
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| policy.service.data_dir.clone());

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DB_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open store at {:?}", db_path))?;
    anyhow::ensure!(store.is_healthy(), "Store at {:?} failed its health check", db_path);

    debug!(db_path = %db_path.display(), "Store opened");
    Ok(Arc::new(store))
}

/// Open the store and build a hold manager on top of it
fn open_manager(
    args: &Args,
    policy: Policy,
    clock: &Arc<dyn Clock>,
) -> Result<(HoldManager, Arc<dyn Store>)> {
    let store = open_store(args, &policy)?;
    let manager = HoldManager::new(policy, store.clone(), clock.clone());
    Ok((manager, store))
}

fn describe(ts: Timestamp) -> String {
    match ts.to_local() {
        Some(local) => format!("{} ({})", format_datetime_full(&local), ts),
        None => ts.to_string(),
    }
}

fn print_hold(hold: &HoldRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(hold)?);
    Ok(())
}

async fn serve(
    args: &Args,
    mut manager: HoldManager,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    let started = [
        AuditEventType::ServiceStarted,
        AuditEventType::PolicyLoaded {
            stylist_count: manager.policy().stylists.len(),
        },
    ];
    for event in started {
        if let Err(e) = store.append_audit(AuditEvent::new(event, clock.now())) {
            warn!(error = %e, "Failed to log service start");
        }
    }

    let mut sweep_timer = tokio::time::interval(manager.policy().service.sweep_interval);
    info!(
        sweep_interval_secs = manager.policy().service.sweep_interval.as_secs(),
        "Sweeper running"
    );

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
                break;
            }

            // SIGHUP - reload configuration
            _ = sighup.recv() => {
                match load_policy(&args.config) {
                    Ok(policy) => {
                        let interval = policy.service.sweep_interval;
                        manager.reload_policy(policy);
                        sweep_timer = tokio::time::interval(interval);
                    }
                    Err(e) => warn!(error = %e, "Config reload failed, keeping current policy"),
                }
            }

            _ = sweep_timer.tick() => {
                match manager.sweep_expired() {
                    Ok(events) => {
                        for event in events {
                            match serde_json::to_string(&event) {
                                Ok(line) => println!("{}", line),
                                Err(e) => warn!(error = %e, "Failed to serialize event"),
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "Sweep failed"),
                }
            }
        }
    }

    if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped, clock.now())) {
        warn!(error = %e, "Failed to log service shutdown");
    }

    info!("Shutdown complete");
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let policy = load_policy(&args.config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match &args.command {
        // Quoting needs no store
        Command::Expiry {
            date,
            time,
            stylist,
        } => {
            let expiry = match stylist {
                Some(id) => policy.expiry_for(&StylistId::new(id.as_str())),
                None => policy.expiry,
            };
            let expires_at =
                compute_booking_expiry_in(date, time, &expiry, clock.now(), &chrono::Local)?;
            println!("{}", describe(expires_at));
        }
        Command::Place {
            stylist,
            client,
            date,
            time,
        } => {
            let (manager, _) = open_manager(&args, policy, &clock)?;
            let hold = manager.place_hold(&HoldRequest {
                stylist_id: StylistId::new(stylist.as_str()),
                client_id: ClientId::new(client.as_str()),
                booking_date: date.clone(),
                booking_time: time.clone(),
            })?;
            eprintln!(
                "Hold {} expires {} (in {})",
                hold.id,
                describe(hold.expires_at),
                format_duration(hold.time_remaining(clock.now()))
            );
            print_hold(&hold)?;
        }
        Command::Confirm { id } => {
            let (manager, _) = open_manager(&args, policy, &clock)?;
            print_hold(&manager.confirm_hold(id)?)?;
        }
        Command::Release { id } => {
            let (manager, _) = open_manager(&args, policy, &clock)?;
            print_hold(&manager.release_hold(id)?)?;
        }
        Command::List { status, stylist } => {
            let (manager, _) = open_manager(&args, policy, &clock)?;
            let filter = HoldFilter {
                status: *status,
                stylist_id: stylist.as_deref().map(StylistId::new),
            };
            let holds = manager.list_holds(&filter)?;
            println!("{}", serde_json::to_string_pretty(&holds)?);
        }
        Command::Sweep => {
            let (manager, _) = open_manager(&args, policy, &clock)?;
            let events = manager.sweep_expired()?;
            for event in &events {
                println!("{}", serde_json::to_string(event)?);
            }
            eprintln!("Expired {} hold(s)", events.len());
        }
        Command::Serve => {
            let (manager, store) = open_manager(&args, policy, &clock)?;
            serve(&args, manager, store, clock).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for command output
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        mock_time = is_mock_time_active(),
        "stylehold starting"
    );

    run(args).await
}
