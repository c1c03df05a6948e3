//! Mixy BLE-MIDI tuner
//!
//! Monitors knob positions from a Mixy BLE-MIDI controller and sends it
//! tuning parameters.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mixy_ble::blemidi::MIDI_SERVICE_UUIDS;
use mixy_ble::config::AppConfig;
use mixy_ble::session::{Session, SessionActor};
use mixy_ble::transport::{ConsoleTransport, ReplaySource};
use mixy_ble::{cli, sniffer};

/// Mixy tuner - watch BLE-MIDI knobs and tune controller parameters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Decode hex packets from stdin and exit
    #[arg(long)]
    sniffer: bool,

    /// Replay recorded notifications (one hex packet per line) before the REPL
    #[arg(long)]
    replay: Option<String>,

    /// Delay between replayed packets in milliseconds
    #[arg(long, default_value = "0")]
    replay_delay_ms: u64,

    /// Start with the simulated device connected
    #[arg(long)]
    connected: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.sniffer {
        return sniffer::run_cli_sniffer().await;
    }

    info!("Starting Mixy tuner...");
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;
    run_app(config, &args).await?;

    info!("Mixy tuner shutdown complete");
    Ok(())
}

async fn run_app(config: AppConfig, args: &Args) -> Result<()> {
    let session = Session::new(
        &config.controls.controllers,
        config.parameters.defaults.values(),
    );
    let transport = Arc::new(ConsoleTransport::new("console"));
    let handle = SessionActor::spawn(session, transport);
    let device = config.device.device_info();

    info!(
        service = config
            .device
            .service_uuids
            .first()
            .map(String::as_str)
            .unwrap_or(MIDI_SERVICE_UUIDS[0]),
        characteristic = %config.device.characteristic_uuid,
        controls = config.controls.controllers.len(),
        "Session ready"
    );

    if args.connected {
        handle.connected(device.clone());
    }

    if let Some(path) = &args.replay {
        match ReplaySource::load(path).await {
            Ok(source) => {
                let sent = source
                    .run(&handle, Duration::from_millis(args.replay_delay_ms))
                    .await;
                info!(sent, "Replay finished");
            }
            Err(e) => warn!("Replay skipped: {:#}", e),
        }
    }

    tokio::select! {
        res = cli::run_repl(handle.clone(), device) => {
            if let Err(e) = res {
                warn!("REPL ended with error: {:#}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping session");
        }
    }

    handle.shutdown();
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
