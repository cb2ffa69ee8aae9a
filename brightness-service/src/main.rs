use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, warn};

mod actuator;
mod config;
mod driver;
mod sensor;

use crate::{
    actuator::CommandActuator,
    config::{Config, DisplayConfig, RawConfig},
    driver::Driver,
};

#[derive(Parser, Debug, PartialEq)]
#[command(about, author = "Danilo Bargen", version)]
struct Args {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Poll the light sensor and adjust display brightness (default)
    Run,
    /// Validate the config file and show the brightness curves
    Check,
    /// Print an example config file
    ExampleConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = Args::parse();

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&args.config).await,
        Command::Check => check(&args.config),
        Command::ExampleConfig => {
            print!("{}", toml::to_string(&RawConfig::example())?);
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    RawConfig::load(path)?.try_into()
}

/// Load the config, or the example config if there is no file at `path`.
fn load_or_example(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!("Config file {:?} not found, using example configuration", path);
        return RawConfig::example().try_into();
    }
    load_config(path)
}

async fn run(path: &Path) -> anyhow::Result<()> {
    // Parse config
    let config = match load_or_example(path) {
        Ok(val) => val,
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            println!(
                "Example config:\n\n{}",
                toml::to_string(&RawConfig::example())?
            );
            return Err(e);
        }
    };
    info!("Loaded config from {:?}", path);

    // Connect to the light sensor
    let source = sensor::open(&config.sensor)?;

    let displays = config
        .displays
        .into_iter()
        .map(|DisplayConfig { name, command, curve }| (name, curve, CommandActuator::new(command)));
    let mut driver = Driver::start(source, displays, config.timing)?;

    // Main loop
    driver
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    for display in driver.displays() {
        info!("[{}] Final brightness: {}", display.name(), display.applied());
    }
    Ok(())
}

/// Lux values shown by `check` in addition to the breakpoints.
const CHECK_SAMPLES: [f64; 6] = [0.0, 10.0, 50.0, 100.0, 500.0, 1000.0];

fn check(path: &Path) -> anyhow::Result<()> {
    let config = load_config(path).context("Invalid configuration")?;

    println!("Config {:?} is valid", path);
    println!(
        "Sampling every {:?} ({:?} while converging)",
        config.timing.interval(),
        config.timing.catch_up()
    );
    println!("Sensor: {:?}", config.sensor);

    for display in &config.displays {
        println!();
        println!("Display {:?}", display.name);
        println!("  Command: {}", display.command.join(" "));
        println!("  Curve:");

        let mut samples: Vec<f64> = display
            .curve
            .breakpoints()
            .iter()
            .map(|point| point.lux)
            .chain(CHECK_SAMPLES)
            .collect();
        samples.sort_unstable_by(f64::total_cmp);
        samples.dedup();
        for lux in samples {
            println!("    {:>8.1} lx -> {:>3}%", lux, display.curve.evaluate(lux));
        }
    }

    Ok(())
}
