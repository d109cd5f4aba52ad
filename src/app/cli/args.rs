//! Command line arguments
//!
//! Global flags override values from the configuration file. Each subcommand
//! runs one scan flow.

use crate::app::config::{ConfigError, ConfigResult, Settings};
use crate::core::validation::{validate_base_url, validate_positive_int};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "fieldscan")]
#[command(about = "QR scan sessions for scooter and battery fleets")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = "Type ids on stdin, one per line. Lines starting with ':' are commands \
(:pause, :resume, :delete <ledger-id>, :unvalidate <id>, :list, :finish).")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Color output control (unspecified = auto)
    #[arg(short = 'g', long = "color", global = true)]
    pub color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true,
          value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true,
          value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Ledger service base URL
    #[arg(short = 'u', long = "ledger-url", value_name = "URL", global = true)]
    pub ledger_url: Option<String>,

    /// Minimum milliseconds between accepted scans
    #[arg(short = 'd', long = "delay-ms", value_name = "MILLIS", global = true,
          value_parser = validate_positive_int)]
    pub delay_ms: Option<u64>,

    /// Record into an in-memory ledger instead of the service (dry run)
    #[arg(long = "offline-ledger", global = true)]
    pub offline_ledger: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect scooter QR codes into a list
    Scan(SessionArgs),
    /// Collect battery labels into a list
    Battery(SessionArgs),
    /// Check scooters off against an expected list
    Validate(ValidateArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SessionArgs {
    /// List or validation session to record into
    #[arg(short = 's', long = "session", value_name = "ID")]
    pub session: String,

    /// Read ids from a file instead of stdin, then finish
    #[arg(short = 'r', long = "replay", value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Expected ids, comma separated or repeated
    #[arg(short = 'e', long = "expected", value_name = "IDS", value_delimiter = ',')]
    pub expected: Vec<String>,

    /// File with one expected id per line
    #[arg(long = "expected-file", value_name = "FILE")]
    pub expected_file: Option<PathBuf>,
}

impl Command {
    pub fn session_args(&self) -> &SessionArgs {
        match self {
            Command::Scan(args) | Command::Battery(args) => args,
            Command::Validate(args) => &args.session,
        }
    }
}

impl Args {
    /// Apply command line overrides to settings loaded from file
    pub fn apply_to(&self, settings: &mut Settings) -> ConfigResult<()> {
        if let Some(color) = self.color {
            settings.color = Some(color);
        }
        if let Some(level) = &self.log_level {
            settings.log_level = Some(level.clone());
        }
        if let Some(format) = &self.log_format {
            settings.log_format = Some(format.clone());
        }
        if let Some(file) = &self.log_file {
            let raw = file.to_string_lossy();
            settings.log_file = if raw.eq_ignore_ascii_case("none") || raw == "-" {
                None
            } else {
                Some(file.clone())
            };
        }
        if let Some(url) = &self.ledger_url {
            let url = validate_base_url(url).map_err(|message| ConfigError::Invalid { message })?;
            settings.ledger.base_url = Some(url);
        }
        if let Some(delay) = self.delay_ms {
            settings.scan.delay = Duration::from_millis(delay);
        }
        Ok(())
    }
}

/// Colour is on when forced, otherwise when stdout is a terminal and NO_COLOR is unset
pub fn use_color(setting: Option<bool>) -> bool {
    match setting {
        Some(forced) => forced,
        None => std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}
