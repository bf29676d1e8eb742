//! SuperConductor Bridge
//!
//! Mirrors SuperConductor rundowns and groups, exposes play/stop/pause
//! commands and an "is group playing" feedback to a control panel, and keeps
//! both in sync through two polling schedules.

mod bridge;
mod client;
mod config;
mod error;
mod host;
mod logging;
mod model;
mod surface;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use bridge::{create_bridge_channels, Bridge, BridgeCommand, BridgeEngine};
use client::RemoteClient;
use config::Config;
use ui::{run_console, ConfigLoader, ConsoleHost};

/// Command-line overrides on top of the config file
#[derive(Debug, Default)]
struct CliArgs {
    help: bool,
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<String>,
    rundown_interval: Option<i64>,
    group_interval: Option<i64>,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = CliArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .with_context(|| format!("{} needs a value", arg))
            };
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "-c" | "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--host" => parsed.host = Some(value()?),
                "--port" => parsed.port = Some(value()?),
                "--rundown-interval" => {
                    parsed.rundown_interval = Some(
                        value()?
                            .parse()
                            .context("--rundown-interval must be a number of seconds")?,
                    )
                }
                "--group-interval" => {
                    parsed.group_interval = Some(
                        value()?
                            .parse()
                            .context("--group-interval must be a number of seconds")?,
                    )
                }
                other => bail!("Unknown argument {:?} (see --help)", other),
            }
        }

        Ok(parsed)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = &self.port {
            config.server.port = port.clone();
        }
        if let Some(secs) = self.rundown_interval {
            config.polling.rundown_poll_interval_secs = secs;
        }
        if let Some(secs) = self.group_interval {
            config.polling.group_poll_interval_secs = secs;
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = CliArgs::parse(&args)?;

    if cli.help {
        print_help();
        return Ok(());
    }

    // Initialize logging
    let _log_guard = logging::init_logging()?;

    info!("SuperConductor Bridge starting...");

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config_file = config.config_path()?;
    info!("Configuration loaded from {:?}", config_file);
    cli.apply(&mut config);
    config.validate()?;

    // `reload` re-reads the same file; command-line overrides still win
    let load_config: ConfigLoader = Box::new(move || {
        let mut config = Config::load_from(&config_file)?;
        cli.apply(&mut config);
        Ok(config)
    });

    // Create tokio runtime for async operations
    let runtime = Arc::new(tokio::runtime::Runtime::new()?);

    let (cmd_tx, cmd_rx) = create_bridge_channels();
    let (checks_tx, checks_rx) = mpsc::unbounded_channel();
    let host = Arc::new(ConsoleHost::new(checks_tx));
    let bridge = Bridge::new(
        RemoteClient::http(&config.server.host, &config.server.port),
        host.clone(),
    );
    let mut engine = BridgeEngine::new(config, bridge.clone(), cmd_rx);

    // Set up Ctrl+C handler that sends shutdown command
    let ctrl_c_tx = cmd_tx.clone();
    let ctrl_c_runtime = runtime.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        let tx = ctrl_c_tx.clone();
        ctrl_c_runtime.spawn(async move {
            let _ = tx.send(BridgeCommand::Shutdown).await;
        });
    })?;

    runtime.block_on(async {
        let console = tokio::spawn(run_console(
            bridge.clone(),
            host,
            cmd_tx,
            checks_rx,
            load_config,
        ));

        if let Err(e) = engine.run().await {
            error!("Bridge engine error: {}", e);
        }

        bridge.shutdown();
        console.abort();
    });

    // The Ctrl+C handler keeps the runtime alive; a pending stdin read
    // ends with the process.
    info!("Shutdown complete");
    Ok(())
}

fn print_help() {
    println!("SuperConductor Bridge - control-panel adapter for SuperConductor");
    println!();
    println!("USAGE:");
    println!("    superconductor-bridge [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help                   Print this help message");
    println!("    -c, --config <PATH>          Config file (default: per-user config dir)");
    println!("        --host <IPV4>            SuperConductor host");
    println!("        --port <PORT>            SuperConductor port");
    println!("        --rundown-interval <S>   Seconds between rundown refreshes (10-300)");
    println!("        --group-interval <S>     Seconds between playing-state polls (1-30)");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                          Set log level (e.g., debug, info, warn)");
    println!("    SUPERCONDUCTOR_BRIDGE_LOG_PATH    Override the log directory");
}
