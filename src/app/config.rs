//! TOML configuration loading
//!
//! The file is optional. When `--config-file` names one it must exist;
//! otherwise `<config dir>/Fieldscan/fieldscan.toml` is used if present.
//! Values are read key by key from a `toml::Table` so every field can be
//! validated with a message naming the key, and command line flags are
//! applied on top afterwards.

use crate::core::validation::{
    validate_base_url, validate_id_pattern, validate_prefix, validate_route_prefix,
};
use crate::ledger::types::LedgerPaths;
use crate::offline::controller::CacheConfig;
use crate::session::throttle::DEFAULT_SCAN_DELAY;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LOG_FORMATS: [&str; 3] = ["text", "ext", "json"];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Error parsing configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl std::fmt::Display) -> Self {
        ConfigError::Invalid {
            message: format!("{}: {}", key, message),
        }
    }
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Io { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Parse { message, .. } | ConfigError::Invalid { message } => Some(message),
            ConfigError::NotFound { .. } => Some("The specified configuration file does not exist"),
            ConfigError::Io { .. } => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// `[ledger]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Ledger service base URL; `None` only works with the in-memory ledger
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub paths: LedgerPaths,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            paths: LedgerPaths::default(),
        }
    }
}

/// `[scan]` section; unset normalizer fields keep the profile's own values
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub delay: Duration,
    pub prefixes: Option<Vec<String>>,
    pub id_pattern: Option<Regex>,
    pub accept_bare_ids: Option<bool>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SCAN_DELAY,
            prefixes: None,
            id_pattern: None,
            accept_bare_ids: None,
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub ledger: LedgerSettings,
    pub scan: ScanSettings,
    pub cache: CacheConfig,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub color: Option<bool>,
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Fieldscan").join("fieldscan.toml"))
}

/// Pick the file to load: an explicit path must exist, the default may be absent
pub fn resolve_config_path(config_file: Option<&Path>) -> ConfigResult<Option<PathBuf>> {
    match config_file {
        Some(path) if !path.exists() => Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }),
        Some(path) => Ok(Some(path.to_path_buf())),
        None => Ok(default_config_path().filter(|path| path.exists())),
    }
}

/// Load settings from the resolved file, or defaults when there is none
pub async fn load_settings(config_file: Option<&Path>) -> ConfigResult<(Settings, Option<PathBuf>)> {
    let Some(path) = resolve_config_path(config_file)? else {
        log::trace!("No configuration file, using defaults");
        return Ok((Settings::default(), None));
    };

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConfigError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
    let table = toml::from_str::<toml::Table>(&contents).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let settings = Settings::from_table(&table)?;
    Ok((settings, Some(path)))
}

/// Accept either `key = "a"` or `key = ["a", "b"]`
fn string_list(value: &toml::Value, key: &str) -> ConfigResult<Vec<String>> {
    if let Some(single) = value.as_str() {
        return Ok(vec![single.to_string()]);
    }
    let array = value
        .as_array()
        .ok_or_else(|| ConfigError::invalid(key, "expected a string or an array of strings"))?;
    array
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ConfigError::invalid(key, "array entries must be strings"))
        })
        .collect()
}

fn positive_integer(value: &toml::Value, key: &str) -> ConfigResult<u64> {
    match value.as_integer() {
        Some(n) if n > 0 => Ok(n as u64),
        Some(_) => Err(ConfigError::invalid(key, "value must be greater than 0")),
        None => Err(ConfigError::invalid(key, "expected an integer")),
    }
}

fn section<'a>(config: &'a toml::Table, name: &str) -> ConfigResult<Option<&'a toml::Table>> {
    match config.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_table()
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(name, "expected a table")),
    }
}

impl Settings {
    pub fn from_table(config: &toml::Table) -> ConfigResult<Self> {
        let mut settings = Settings::default();
        settings.apply_toml_values(config)?;
        Ok(settings)
    }

    /// Apply TOML values on top of the current settings
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> ConfigResult<()> {
        if let Some(log_level) = config.get("log-level").and_then(|v| v.as_str()) {
            self.log_level = Some(log_level.to_string());
        }
        if let Some(log_format) = config.get("log-format").and_then(|v| v.as_str()) {
            if !LOG_FORMATS.contains(&log_format) {
                return Err(ConfigError::invalid(
                    "log-format",
                    format!("'{}' is not one of {}", log_format, LOG_FORMATS.join(", ")),
                ));
            }
            self.log_format = Some(log_format.to_string());
        }
        if let Some(log_file) = config.get("log-file").and_then(|v| v.as_str()) {
            // "none" and "-" disable file logging
            if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                self.log_file = None;
            } else {
                self.log_file = Some(PathBuf::from(log_file));
            }
        }
        if let Some(color) = config.get("color").and_then(|v| v.as_bool()) {
            self.color = Some(color);
        }

        if let Some(ledger) = section(config, "ledger")? {
            self.apply_ledger(ledger)?;
        }
        if let Some(scan) = section(config, "scan")? {
            self.apply_scan(scan)?;
        }
        if let Some(cache) = section(config, "cache")? {
            self.apply_cache(cache)?;
        }
        Ok(())
    }

    fn apply_ledger(&mut self, ledger: &toml::Table) -> ConfigResult<()> {
        if let Some(base_url) = ledger.get("base-url").and_then(|v| v.as_str()) {
            let url = validate_base_url(base_url).map_err(|e| ConfigError::invalid("ledger.base-url", e))?;
            self.ledger.base_url = Some(url);
        }
        if let Some(timeout) = ledger.get("timeout-secs") {
            self.ledger.timeout = Duration::from_secs(positive_integer(timeout, "ledger.timeout-secs")?);
        }
        if let Some(paths) = ledger.get("paths") {
            let paths: LedgerPaths = paths
                .clone()
                .try_into()
                .map_err(|e| ConfigError::invalid("ledger.paths", e))?;
            for path in paths.all() {
                validate_route_prefix(path).map_err(|e| ConfigError::invalid("ledger.paths", e))?;
            }
            self.ledger.paths = paths;
        }
        Ok(())
    }

    fn apply_scan(&mut self, scan: &toml::Table) -> ConfigResult<()> {
        if let Some(delay) = scan.get("delay-ms") {
            self.scan.delay = Duration::from_millis(positive_integer(delay, "scan.delay-ms")?);
        }
        if let Some(prefixes) = scan.get("prefixes") {
            let prefixes = string_list(prefixes, "scan.prefixes")?
                .iter()
                .map(|p| validate_prefix(p))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::invalid("scan.prefixes", e))?;
            self.scan.prefixes = Some(prefixes);
        }
        if let Some(pattern) = scan.get("id-pattern").and_then(|v| v.as_str()) {
            let pattern = validate_id_pattern(pattern).map_err(|e| ConfigError::invalid("scan.id-pattern", e))?;
            self.scan.id_pattern = Some(pattern);
        }
        if let Some(accept) = scan.get("accept-bare-ids").and_then(|v| v.as_bool()) {
            self.scan.accept_bare_ids = Some(accept);
        }
        Ok(())
    }

    fn apply_cache(&mut self, cache: &toml::Table) -> ConfigResult<()> {
        let config: CacheConfig = toml::Value::Table(cache.clone())
            .try_into()
            .map_err(|e| ConfigError::invalid("cache", e))?;
        if config.version.trim().is_empty() {
            return Err(ConfigError::invalid("cache.version", "cannot be empty"));
        }
        for route in &config.policy.dynamic_routes {
            validate_route_prefix(route).map_err(|e| ConfigError::invalid("cache.dynamic-routes", e))?;
        }
        self.cache = config;
        Ok(())
    }
}
