use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

pub const KEYS_DIR_VAR: &str = "GPG_KEYS_FOLDER";
pub const INTERVAL_VAR: &str = "INTERVAL";
pub const LISTEN_ADDR_VAR: &str = "HTTP_LISTENADDR";

pub const DEFAULT_KEYS_DIR: &str = "/dev/shm/gpg";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_LISTEN_ADDR: &str = ":9112";

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one armored public key per file.
    pub keys_dir: PathBuf,
    /// Time between two directory scans.
    pub interval: Duration,
    /// Address the metrics endpoint listens on.
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    ///
    /// An invalid interval is not an error: a warning is logged and the
    /// default interval is used instead. An invalid listen address is.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys_dir = lookup(KEYS_DIR_VAR).unwrap_or_else(|| DEFAULT_KEYS_DIR.to_string());

        let interval = match lookup(INTERVAL_VAR) {
            Some(raw) => parse_interval(&raw).unwrap_or_else(|err| {
                warn!(
                    error = %err,
                    default_secs = DEFAULT_INTERVAL.as_secs(),
                    "using default scan interval"
                );
                DEFAULT_INTERVAL
            }),
            None => DEFAULT_INTERVAL,
        };

        let listen_addr =
            lookup(LISTEN_ADDR_VAR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = parse_listen_addr(&listen_addr)?;

        Ok(Self {
            keys_dir: PathBuf::from(keys_dir),
            interval,
            listen_addr,
        })
    }
}

/// Parses a scan interval given in whole seconds.
///
/// Accepted formats:
/// - A positive integer number of seconds, surrounding whitespace allowed
pub fn parse_interval(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| Error::InvalidInterval {
        value: raw.to_string(),
        reason: "interval must be a whole number of seconds".to_string(),
    })?;

    if secs == 0 {
        return Err(Error::InvalidInterval {
            value: raw.to_string(),
            reason: "interval must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}

/// Parses the metrics listen address.
///
/// Accepted formats:
/// - `host:port` or `ip:port`, including bracketed IPv6 (`[::1]:9112`)
/// - `:port`, listening on all IPv4 interfaces
pub fn parse_listen_addr(raw: &str) -> Result<SocketAddr> {
    let invalid = |reason: String| Error::InvalidListenAddr {
        value: raw.to_string(),
        reason,
    };

    let full = match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    };

    full.to_socket_addrs()
        .map_err(|err| invalid(err.to_string()))?
        .next()
        .ok_or_else(|| invalid("address did not resolve".to_string()))
}
