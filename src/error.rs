use std::path::PathBuf;

use thiserror::Error;

/// Fatal before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no keywords given (-k needs at least one non-blank value)")]
    NoKeywords,

    #[error("no valid http(s) URLs given")]
    NoUrls,

    #[error("timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("cannot read IOC file {}: {source}", .path.display())]
    IocFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output file {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: SinkError,
    },

    #[error("invalid environment override: {0}")]
    Environment(#[from] config::ConfigError),

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Per-page failure. The loop logs it and moves on to the next URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),
}

/// Output file failure. Fatal: results can no longer be persisted.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
