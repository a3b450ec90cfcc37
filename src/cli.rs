use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sprinklerops",
    version,
    about = "Weather-adjusted daily watering for Rachio controllers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the directory holding the run lock
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decide whether to water today and start the zones (default)
    Run {
        /// Make every decision but send nothing to the controller
        #[arg(long)]
        no_commit: bool,
    },
    /// Validate config and test connections
    Check,
    /// Show the normalized forecast for the controller's location
    Forecast,
    /// Interactive setup
    Init,
}
