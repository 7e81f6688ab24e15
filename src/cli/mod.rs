pub mod commands;
pub mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "query-aggregator")]
#[command(about = "Aggregate query statistics across per-user data holders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file with default settings
    Init(InitArgs),
    /// Run the aggregation service
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Where to write the config file
    #[arg(long, default_value = config::CONFIG_FILENAME)]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// Config file (defaults to ./query-aggregator.toml when present)
    #[arg(long, env = "QUERY_AGGREGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "QUERY_AGGREGATOR_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "QUERY_AGGREGATOR_PORT")]
    pub port: Option<u16>,

    /// Seconds to wait for each data holder request
    #[arg(long, env = "QUERY_AGGREGATOR_HOLDER_TIMEOUT_SECS")]
    pub holder_timeout_secs: Option<u64>,

    /// Attempts per holder fetch (1 disables retries)
    #[arg(long, env = "QUERY_AGGREGATOR_HOLDER_ATTEMPTS")]
    pub holder_attempts: Option<u32>,
}
