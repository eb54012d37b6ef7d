//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Harvest: enumerate subdomains from passive data sources
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file with domains and data source credentials
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root domain to enumerate (repeatable)
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Only query these data sources (repeatable, default: all)
    #[arg(short = 's', long = "source", value_name = "NAME")]
    pub sources: Vec<String>,

    /// Abort the whole scan after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json: bool,
}
