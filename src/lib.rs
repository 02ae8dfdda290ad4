//! Prometheus exporter for the encryption subkeys of OpenPGP public keys.
//!
//! A directory of armored public keys is scanned periodically. For every
//! key file the exporter counts the encryption subkeys that are valid now,
//! in one week and in two weeks, and publishes the counts as gauges
//! labelled with the file name:
//!
//! ```text
//! gpg_subkeys_current{name="alice.asc"} 1
//! gpg_subkeys_future_1week{name="alice.asc"} 1
//! gpg_subkeys_future_2weeks{name="alice.asc"} 0
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gpg_subkey_exporter::{Config, Scanner, SubkeyMetrics};
//!
//! #[tokio::main]
//! async fn main() -> gpg_subkey_exporter::Result<()> {
//!     let config = Config::from_env()?;
//!     let metrics = SubkeyMetrics::new()?;
//!
//!     let scanner = Scanner::new(config.keys_dir, metrics.clone());
//!     tokio::spawn(async move { scanner.run(config.interval).await });
//!
//!     gpg_subkey_exporter::serve(config.listen_addr, metrics).await
//! }
//! ```
//!
//! # Configuration
//!
//! - `GPG_KEYS_FOLDER`: key directory, default `/dev/shm/gpg`
//! - `INTERVAL`: seconds between scans, default `15`
//! - `HTTP_LISTENADDR`: metrics listen address, default `:9112`

mod config;
mod error;
mod metrics;
mod parse;
mod scanner;
mod server;
mod types;
mod validity;

pub use config::{Config, parse_interval, parse_listen_addr};
pub use error::{Error, Result};
pub use metrics::SubkeyMetrics;
pub use parse::{parse_entity, parse_entity_with_policy};
pub use scanner::{ScanReport, Scanner};
pub use server::{router, serve};
pub use types::{Entity, Subkey, ValidityCounts, Window};
pub use validity::{count_valid_subkeys, evaluate};
