//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::ShutdownBudget;
use std::path::PathBuf;

/// dispatchctl - inspect and exercise the category-partitioned dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "dispatchctl",
    author,
    version,
    about = "Category-partitioned dispatcher tooling",
    long_about = "Validates dispatcher settings files, prints the resolved pool layout, \n\
                  and runs synthetic workloads through the four category pools \n\
                  (signal, error, method-call, method-return)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DISPATCHCTL_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DISPATCHCTL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a synthetic workload through the dispatcher
    Run(RunArgs),

    /// Validate a settings file without running anything
    Validate(ValidateArgs),

    /// Display the resolved settings
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to settings file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "DISPATCHCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Units of work to submit per category
    #[arg(long, default_value = "100", env = "DISPATCHCTL_UNITS")]
    pub units: u64,

    /// Simulated duration of each unit in milliseconds
    #[arg(long, default_value = "1")]
    pub work_ms: u64,

    /// Make every Nth unit panic (0 = never)
    #[arg(long, default_value = "0")]
    pub panic_every: u64,

    /// Override shutdown.timeout_ms from the settings file
    #[arg(long, env = "DISPATCHCTL_SHUTDOWN_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Override shutdown.budget from the settings file
    #[arg(long, value_enum)]
    pub budget: Option<BudgetArg>,

    /// Follow the graceful shutdown with a forced one
    #[arg(long)]
    pub force: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DISPATCHCTL_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to settings file to validate
    #[arg(short, long, default_value = "dispatcher.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to settings file
    #[arg(short, long, default_value = "dispatcher.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show connection options
    #[arg(long)]
    pub connection: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Shutdown budget selection
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BudgetArg {
    /// Full timeout for every pool
    PerPool,
    /// One deadline for all pools
    Shared,
}

impl From<BudgetArg> for ShutdownBudget {
    fn from(arg: BudgetArg) -> Self {
        match arg {
            BudgetArg::PerPool => ShutdownBudget::PerPool,
            BudgetArg::Shared => ShutdownBudget::Shared,
        }
    }
}
