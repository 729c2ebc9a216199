//! CLI entry point for the front-end simulator.
//!
//! Provides the legacy numeric menu over stdin plus one-shot monitor
//! commands. Device discovery and the remote-procedure transport live
//! outside this crate, so the binary always runs the simulated receiver;
//! hardware-backed deployments embed [`kband_fe::FrontEnd`] behind their
//! own transport.
//!
//! # Usage
//!
//! Interactive menu:
//! ```bash
//! kband-fe menu --seed 42
//! ```
//!
//! One minical acquisition as JSON:
//! ```bash
//! kband-fe minical --config cal/k2.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use kband_fe::{CalibrationConfig, Dispatcher, FrontEnd, Response};

#[derive(Parser)]
#[command(name = "kband-fe")]
#[command(about = "K-band front end monitor and control (simulated)", long_about = None)]
struct Cli {
    /// Calibration TOML overriding the built-in K2 constants.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pin the simulated sensor jitter for reproducible runs.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the legacy numeric menu: one option code per line on stdin.
    Menu,
    /// Acquire one minical data set and print it as JSON.
    Minical,
    /// Read the four physical temperatures and print them as JSON.
    Temps,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => CalibrationConfig::load(path)
            .with_context(|| format!("loading calibration from {}", path.display()))?,
        None => CalibrationConfig::default(),
    };
    let frontend = match cli.seed {
        Some(seed) => FrontEnd::with_seed(config, seed),
        None => FrontEnd::new(config),
    };

    match cli.command {
        Commands::Menu => menu_loop(Dispatcher::new(frontend)).await,
        Commands::Minical => {
            let set = frontend.collect_minical().await?;
            println!("{}", serde_json::to_string_pretty(&set)?);
            Ok(())
        }
        Commands::Temps => {
            let temps = frontend.read_temperatures().await;
            println!("{}", serde_json::to_string_pretty(&temps)?);
            Ok(())
        }
    }
}

async fn menu_loop(dispatcher: Dispatcher) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        let code: i64 = match line.parse() {
            Ok(code) => code,
            Err(_) => {
                eprintln!("not an option code: {line:?}");
                continue;
            }
        };
        match dispatcher.dispatch(code).await {
            Ok(Response::None) => {}
            Ok(Response::Text(text)) => print!("{text}"),
            Ok(Response::Flag(flag)) => println!("{}", u8::from(flag)),
            Ok(Response::Readings(readings)) => {
                println!("{}", serde_json::to_string(&readings)?)
            }
            Ok(Response::Temperatures(temps)) => {
                println!("{}", serde_json::to_string(&temps)?)
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}
