// src/config.rs

use std::net::SocketAddr;

use config::{builder::DefaultState, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "relay.toml";

/// Runtime settings, layered as: defaults < `relay.toml` < `RELAY__*` environment variables.
/// `RELAY_CONFIG` points at a different file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    /// Origin allowed by the CORS layer, or `*` for any.
    pub allowed_origin: String,
    pub history: HistorySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            allowed_origin: "http://localhost:3000".into(),
            history: HistorySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Messages retained per conversation target.
    pub capacity: usize,
    /// Messages returned per `get_history` page.
    pub page_size: usize,
    /// Keep files and reactions in history too.
    pub persist_attachments: bool,
    pub private_key: PrivateKeyMode,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: 100,
            page_size: 20,
            persist_attachments: false,
            private_key: PrivateKeyMode::SenderFirst,
        }
    }
}

/// How the history key of a private conversation is built.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrivateKeyMode {
    /// `"<sender>-<receiver>"`: each direction of a pair has its own log.
    #[default]
    SenderFirst,
    /// Both names sorted, so the pair shares one log.
    Sorted,
}

impl PrivateKeyMode {
    pub fn key(self, sender: &str, receiver: &str) -> String {
        match self {
            PrivateKeyMode::Sorted if receiver < sender => format!("{receiver}-{sender}"),
            _ => format!("{sender}-{receiver}"),
        }
    }
}

impl Settings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                addr: self.bind_addr.clone(),
                source,
            })
    }

    fn validate(self) -> Result<Self, ConfigError> {
        self.socket_addr()?;
        if self.allowed_origin != "*"
            && axum::http::HeaderValue::from_str(&self.allowed_origin).is_err()
        {
            return Err(ConfigError::Origin(self.allowed_origin));
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::ZeroLimit("capacity"));
        }
        if self.history.page_size == 0 {
            return Err(ConfigError::ZeroLimit("page_size"));
        }
        Ok(self)
    }
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
    let builder = config::Config::builder()
        .add_source(File::with_name(&path).required(false))
        .add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
    from_builder(builder)
}

fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    builder
        .build()?
        .try_deserialize::<Settings>()?
        .validate()
}
