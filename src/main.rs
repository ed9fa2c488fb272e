//! u64-remote - upload and run a PRG on an Ultimate 64 / C64 Ultimate
//!
//! Without an address (from `--address`, `U64_ADDRESS` or creds.json) the
//! device is discovered on the local network. `--list` only prints what
//! discovery finds.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use u64_remote::{
    config::{Credentials, RemoteConfig},
    discovery::{DiscoveryCoordinator, Resolution, SelectedDevice},
    logging::{init_logging, LogConfig},
    utils::{format_device_list, prompt_pick_index, read_program},
    DeviceClient, RemoteError, Result,
};

/// Command line options
#[derive(Parser, Debug)]
#[command(name = "u64-remote")]
#[command(about = "Upload and run a PRG on an Ultimate 64 / C64 Ultimate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Credentials file (default: creds.json, ../json_examples/creds.json, json_examples/creds.json)
    #[arg(long, value_name = "PATH")]
    creds: Option<PathBuf>,

    /// Device address, e.g. http://192.168.1.64
    #[arg(long, env = "U64_ADDRESS")]
    address: Option<String>,

    /// Device password (sent as X-Password)
    #[arg(long, env = "U64_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Discover the device even if an address is configured
    #[arg(long)]
    discover: bool,

    /// List discovered devices and exit
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Program to upload
    #[arg(value_name = "FILE.prg", required_unless_present = "list")]
    program: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env().with_verbose(cli.verbose);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging setup failed: {e}");
            None
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Exiting with error: {:?}", e);
            eprintln!("Error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = RemoteConfig::from_env()?;

    if cli.list {
        return list_devices(&config).await;
    }

    let program_path = cli
        .program
        .ok_or_else(|| RemoteError::invalid_input("No program file given"))?;
    let program = read_program(&program_path).await?;

    let mut credentials = Credentials::locate(cli.creds.as_deref())?;
    if let Some(address) = cli.address.as_deref() {
        credentials.set_address(address);
    }
    if let Some(password) = cli.password {
        credentials.password = password;
    }

    if cli.discover || !credentials.has_address() {
        let device = discover_device(&config, !cli.discover).await?;
        info!("🎯 Using {} (via {})", device.address, device.source);
        credentials.set_address(&device.address);
    }

    if credentials.password.is_empty() {
        warn!("⚠️  Password is empty; set it in creds.json or pass --password");
    }

    let client = DeviceClient::connect(&credentials, &config.client).await?;
    client.run_prg(&program).await?;

    println!(
        "Started {} ({} bytes) on {}",
        program_path.display(),
        program.len(),
        client.base_url()
    );
    Ok(())
}

async fn discover_device(config: &RemoteConfig, use_cache: bool) -> Result<SelectedDevice> {
    let coordinator = DiscoveryCoordinator::from_config(&config.discovery)?;

    match coordinator.resolve(use_cache).await? {
        Resolution::Selected(device) => Ok(device),
        Resolution::Choose { source, devices } => {
            let listed = devices.clone();
            let index = tokio::task::spawn_blocking(move || {
                prompt_pick_index(&listed, io::stdin().lock(), io::stdout())
            })
            .await
            .map_err(|e| RemoteError::invalid_input(format!("Device prompt failed: {e}")))??;

            coordinator.select(&devices, index, source).await
        }
    }
}

async fn list_devices(config: &RemoteConfig) -> Result<()> {
    let coordinator = DiscoveryCoordinator::from_config(&config.discovery)?;
    let devices = coordinator.list_devices().await?;

    println!("Found {} device(s):", devices.len());
    print!("{}", format_device_list(&devices));
    Ok(())
}
