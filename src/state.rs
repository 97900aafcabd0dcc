// src/state.rs

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{config::Settings, router::Relay};

/// The application's shared state, accessible from all request handlers.
/// Created once at startup and cloned into every connection via Axum's state management.
///
/// The single mutex around `Relay` is what serializes routing: one event is fully
/// handled before the next one starts.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Mutex<Relay>>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(Mutex::new(relay)),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Relay::from_settings(&settings.history))
    }
}
