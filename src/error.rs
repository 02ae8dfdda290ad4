use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to list key directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("failed to read key file {}: {source}", path.display())]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("OpenPGP key error: {0}")]
    OpenPgp(#[from] anyhow::Error),

    #[error("keyring contains no keys")]
    EmptyKeyring,

    #[error("invalid scan interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("invalid listen address '{value}': {reason}")]
    InvalidListenAddr { value: String, reason: String },

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
