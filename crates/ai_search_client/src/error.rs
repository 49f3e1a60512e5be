//! Error types for the client, the wire protocol and the config file.

use std::path::PathBuf;

use thiserror::Error;

/// Connection or transport failure. Ends the session it belongs to.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection closed before the answer completed")]
    ClosedEarly,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One inbound frame could not be understood. The frame is skipped; the
/// session keeps going.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("frame has no \"type\" field")]
    MissingType,

    #[error("invalid payload for \"{kind}\" frame: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Config load/save error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine config path (set --config or AI_SEARCH_CONFIG)")]
    NoHome,
}
