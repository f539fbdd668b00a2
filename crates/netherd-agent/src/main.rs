//! Netherd Agent - Main entry point
//!
//! Scans the configured subnet and reconciles the result against the
//! device registry.

mod config;
mod report;
mod rest;

use anyhow::{Context, Result};
use clap::Parser;
use netherd_core::sync_devices;
use netherd_discovery::{parse_ipv4, PingProber, ScanOptions, Scanner};
use rest::HttpRegistry;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "netherd")]
#[command(about = "Subnet scanner and device inventory agent")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "netherd.toml")]
    config: PathBuf,

    /// Network name to sync into (overrides config)
    #[arg(short, long)]
    network: Option<String>,

    /// Scan this address's subnet instead of the local interface's
    #[arg(long)]
    target_ip: Option<String>,

    /// Netmask for --target-ip (defaults to 255.255.255.0)
    #[arg(long)]
    target_mask: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Scan and print results without touching the registry
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("netherd v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(network) = args.network {
        config.network = Some(network);
    }
    if args.target_ip.is_some() {
        config.scan.target_ip = args.target_ip;
    }
    if args.target_mask.is_some() {
        config.scan.target_mask = args.target_mask;
    }

    // Validate everything fatal before the first probe goes out.
    let registry = if args.dry_run {
        None
    } else {
        let network_name = config.network_name()?.to_string();
        let (base_url, api_key) = config.registry_credentials()?;
        let registry =
            HttpRegistry::new(&base_url, &api_key).context("failed to build registry client")?;
        Some((registry, network_name))
    };

    let options = ScanOptions {
        target_ip: config
            .scan
            .target_ip
            .as_deref()
            .map(parse_ipv4)
            .transpose()?,
        target_mask: config
            .scan
            .target_mask
            .as_deref()
            .map(parse_ipv4)
            .transpose()?,
        batch_size: config.scan.batch_size,
    };
    let prober = PingProber {
        ping_timeout_secs: config.scan.ping_timeout_secs,
        call_ceiling: Duration::from_secs(config.scan.ping_timeout_secs + 1),
    };

    let scanner = Scanner::with_prober(prober, Box::new(report::ProgressReporter), options);
    let devices = scanner.run().await?;

    report::print_devices(&devices);

    if let Some((registry, network_name)) = registry {
        let outcome = sync_devices(&registry, &network_name, &devices).await?;
        println!(
            "Registry sync: {} updated, {} added, {} set offline",
            outcome.updated, outcome.added, outcome.deactivated
        );
    } else {
        info!("Dry run, skipping registry sync");
    }

    Ok(())
}
