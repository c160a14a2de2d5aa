//! Command-line interface.
//!
//! `edgeip run` starts the proxy and `edgeip init` writes a starter config.
//! Every `run` option can also be given through an `EDGEIP_*` environment
//! variable.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(
    name = "edgeip",
    version,
    about = "Reverse proxy that promotes CF-Connecting-IP to X-Forwarded-For",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load the config and start proxying
    Run(Box<RunArgs>),

    /// Write a starter config file
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Config file; looks for edgeip.{yaml,yml,json,toml} when omitted
    #[arg(short, long, env = "EDGEIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to accept connections on
    #[arg(short, long, env = "EDGEIP_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Namespace handed to every middleware factory
    #[arg(short, long, env = "EDGEIP_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Upstream timeout in milliseconds, replacing `defaults.timeout`
    #[arg(long, env = "EDGEIP_TIMEOUT_MS")]
    pub timeout: Option<u64>,

    /// Largest request body accepted, in bytes
    #[arg(long, env = "EDGEIP_MAX_BODY", default_value_t = 1024 * 1024)]
    pub max_body: usize,

    /// Validate the config, print the middleware chain, and exit
    #[arg(long)]
    pub check: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Lowest level written (trace, debug, info, warn, error)
    #[arg(long = "log-level", env = "EDGEIP_LOG", default_value_t = Level::INFO)]
    pub level: Level,

    /// Human-readable output even when stdout is not a terminal
    #[arg(long, conflicts_with = "json")]
    pub pretty: bool,

    /// JSON output even on a terminal
    #[arg(long)]
    pub json: bool,
}

impl LogArgs {
    #[must_use]
    pub fn format(&self) -> LogFormat {
        LogFormat::select(self.pretty, self.json)
    }
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// File format to write
    #[arg(short, long, value_enum, default_value_t = ConfigFormat::Yaml)]
    pub format: ConfigFormat,

    /// Destination; defaults to edgeip.<format> in the working directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Spell out every option with its default value
    #[arg(long)]
    pub full: bool,

    /// Replace the destination if it already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }

    #[must_use]
    pub fn default_path(self) -> PathBuf {
        PathBuf::from(format!("edgeip.{}", self.extension()))
    }
}
