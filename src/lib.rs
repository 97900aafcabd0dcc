// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod rooms;
pub mod router;
pub mod state;
pub mod transport;
pub mod websocket;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{error::ConfigError, state::AppState};

pub use crate::router::Relay;

/// Builds the HTTP + WebSocket application.
pub fn build_router(state: AppState, allowed_origin: &str) -> Result<Router, ConfigError> {
    let app = Router::new()
        .route("/healthz", get(api::healthz))
        .route("/ws", get(websocket::websocket_handler))
        .route("/api/users", get(api::list_users))
        .route("/api/history/{target}", get(api::history))
        .with_state(state)
        .layer(cors_layer(allowed_origin)?);
    Ok(app)
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if allowed_origin == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|_| ConfigError::Origin(allowed_origin.to_string()))?;
    Ok(layer.allow_origin(origin))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::*;
    use crate::{config::HistorySettings, event::Inbound, models::Message};

    const ORIGIN: &str = "http://localhost:3000";

    async fn app_with_alice() -> Router {
        let state = AppState::new(Relay::from_settings(&HistorySettings::default()));
        {
            let mut relay = state.relay.lock().await;
            let (tx, _rx) = mpsc::unbounded_channel();
            let alice = relay.connect(tx);
            relay
                .dispatch(alice, Inbound::SetUsername { name: "alice".into() })
                .expect("set_username");
            let hello = Inbound::parse(
                r#"{"event":"send_message","data":{"sender":"alice","text":"hello"}}"#,
            )
            .expect("valid");
            relay.dispatch(alice, hello).expect("send");
        }
        build_router(state, ORIGIN).expect("router")
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = app_with_alice().await;
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn lists_online_users() {
        let app = app_with_alice().await;
        let response = app
            .oneshot(Request::get("/api/users").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let users: Vec<String> = serde_json::from_slice(&body).expect("json");
        assert_eq!(users, vec!["alice"]);
    }

    #[tokio::test]
    async fn serves_history_pages_with_clamped_offset() {
        let app = app_with_alice().await;
        let response = app
            .clone()
            .oneshot(
                Request::get("/api/history/global?offset=-3")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let page: Vec<Message> = serde_json::from_slice(&body).expect("json");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].sender, "alice");

        let response = app
            .oneshot(
                Request::get("/api/history/global?offset=1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let page: Vec<Message> = serde_json::from_slice(&body).expect("json");
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn cors_allows_the_configured_origin() {
        let app = app_with_alice().await;
        let response = app
            .oneshot(
                Request::get("/api/users")
                    .header(header::ORIGIN, ORIGIN)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static(ORIGIN))
        );
    }

    #[test]
    fn rejects_unusable_origin() {
        assert!(matches!(cors_layer("bad\norigin"), Err(ConfigError::Origin(_))));
        assert!(cors_layer("*").is_ok());
    }
}
