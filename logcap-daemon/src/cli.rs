//! CLI argument definitions for logcap-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use logcap_core::config::LogcapConfig;

/// Log capture daemon.
///
/// Tails a growing log file, persists lines matching the configured
/// patterns together with their surrounding context, and forwards each
/// captured line to an optional webhook.
#[derive(Parser, Debug)]
#[command(name = "logcap-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the configuration file (`.toml`, otherwise parsed as YAML).
    #[arg(short, long, default_value = "logcap.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Load the configuration, compile the rules, print the status report
    /// as JSON and exit without tailing anything.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    ///
    /// The caller is expected to re-run `validate()` afterwards.
    pub fn apply_overrides(&self, config: &mut LogcapConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
