//! Configuration types.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default backing file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "jobs.json";

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Debug runs bind to localhost and log verbosely; production binds to all
/// interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Debug,
    Production,
}

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Path of the JSON file holding the job collection.
    pub data_file: PathBuf,
    /// Port for the HTTP front end.
    pub port: u16,
    pub mode: RunMode,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            port: DEFAULT_PORT,
            mode: RunMode::Production,
        }
    }
}

impl TrackerConfig {
    /// Build config from `JOB_TRACKER_DATA_FILE`, `PORT` and `JOB_TRACKER_DEBUG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_file = lookup("JOB_TRACKER_DATA_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        let port = match lookup("PORT") {
            Some(raw) => parse_port("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let mode = match lookup("JOB_TRACKER_DEBUG") {
            Some(v) if is_truthy(&v) => RunMode::Debug,
            _ => RunMode::Production,
        };

        Ok(Self {
            data_file,
            port,
            mode,
        })
    }

    /// Override the port from a command-line argument.
    pub fn with_port_arg(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.port = parse_port("port argument", raw)?;
        Ok(self)
    }

    /// Address the HTTP front end binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        let ip = match self.mode {
            RunMode::Debug => IpAddr::V4(Ipv4Addr::LOCALHOST),
            RunMode::Production => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        SocketAddr::new(ip, self.port)
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.mode {
            RunMode::Debug => "debug",
            RunMode::Production => "info",
        }
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?} is not a valid port: {e}"),
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
