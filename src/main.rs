mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;

use chrono::{Datelike, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::{OpenWeatherMapClient, RachioClient};
use error::Result;
use logic::rain_delay::SECONDS_PER_DAY;
use logic::{DecisionEngine, Orchestrator, RunLock, RunOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("sprinklerops=debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Run { no_commit: false }) {
        Commands::Init => {
            Config::setup_interactive(cli.config.as_ref())?;
        }
        Commands::Run { no_commit } => {
            let orchestrator = load_orchestrator(cli.config.as_ref())?;
            let lock = RunLock::acquire(&Config::data_dir(cli.data_dir.as_ref())?)?;
            tracing::debug!("Holding {}", lock.path().display());

            let outcome = orchestrator.run(Utc::now(), !no_commit).await?;
            print_outcome(&outcome);
        }
        Commands::Check => {
            let orchestrator = load_orchestrator(cli.config.as_ref())?;
            println!("Config: OK");
            let status = orchestrator.check_connections().await;
            println!(
                "Rachio: {} | OpenWeatherMap: {}",
                if status.controller { "OK" } else { "OFFLINE" },
                if status.weather { "OK" } else { "OFFLINE" }
            );
            if !status.all_connected() {
                std::process::exit(2);
            }
        }
        Commands::Forecast => {
            let orchestrator = load_orchestrator(cli.config.as_ref())?;
            let (device, timezone, forecast) = orchestrator.fetch_inputs().await?;
            let today = Utc::now().with_timezone(&timezone).date_naive();
            let engine = orchestrator.engine();
            let basis = engine.calendar().basis_for(today.month())?;
            let window = engine.settings().rain_check_days as usize;

            println!("Forecast for {} ({}, {})", device.zip, device.name, timezone);
            println!("Temperature basis this month: {}", basis);
            println!("{:<12} {:>5} {:>5} {:>5}  Rain", "Date", "High", "Low", "Avg");
            for (i, day) in forecast.days.iter().enumerate() {
                println!(
                    "{:<12} {:>5} {:>5} {:>5}  {:<4}{}{}",
                    day.date.to_string(),
                    day.high,
                    day.low,
                    day.average(),
                    if day.rain_expected { "yes" } else { "no" },
                    if i < window { " *" } else { "  " },
                    if day.date == today { " <- today" } else { "" }
                );
            }
            println!("* inside the {}-day rain check window", window);
        }
    }

    Ok(())
}

/// Config is validated here, before any network call
fn load_orchestrator(
    config_path: Option<&PathBuf>,
) -> Result<Orchestrator<RachioClient, OpenWeatherMapClient>> {
    let config = Config::load(config_path)?;
    build_orchestrator(&config)
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator<RachioClient, OpenWeatherMapClient>> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let controller = RachioClient::new(config.rachio.clone(), timeout)?;
    let weather = OpenWeatherMapClient::new(config.openweathermap.clone(), timeout)?;
    let engine = DecisionEngine::from_config(config)?;
    Ok(Orchestrator::new(controller, weather, engine))
}

fn print_outcome(outcome: &RunOutcome) {
    println!("{}", outcome.status_line());
    match outcome {
        RunOutcome::Delayed {
            decision,
            delay_set_seconds,
        } => {
            println!("Reason: {}", decision);
            if let Some(seconds) = delay_set_seconds {
                println!("Controller rain delay set for {} days", seconds / SECONDS_PER_DAY);
            }
        }
        RunOutcome::Watered {
            plan,
            committed,
            zones_started,
        } => {
            match plan.temperature {
                Some(temp) => println!(
                    "{} temperature {}°F, multiplier {}",
                    plan.basis, temp, plan.multiplier
                ),
                None => println!("Fixed dry-run duration"),
            }
            for command in &plan.commands {
                println!(
                    "  Zone {:<2} {:<24} {:>3} min",
                    command.zone_number,
                    command.name,
                    command.duration_minutes()
                );
            }
            if *committed {
                println!("{} of {} zones started", zones_started, plan.commands.len());
            }
        }
    }
}
