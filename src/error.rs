// src/error.rs

use thiserror::Error;

/// Why an inbound event was dropped. None of these are reported back to the client;
/// they only end up in the logs.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("frame is not a valid event: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("`{event}` is missing required field `{field}`")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
    #[error("`{0}` carries more than one payload")]
    AmbiguousPayload(&'static str),
    #[error("`{0}` has neither a receiver nor a room")]
    NoDestination(&'static str),
    #[error("`{0}` requires the connection to set a username first")]
    Anonymous(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid bind address `{addr}`: {source}")]
    BindAddr {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid allowed origin `{0}`")]
    Origin(String),
    #[error("history.{0} must be greater than zero")]
    ZeroLimit(&'static str),
}
