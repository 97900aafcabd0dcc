// src/api.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{models::Message, state::AppState};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    offset: i64,
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /api/users: names currently online.
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.relay.lock().await.online())
}

/// GET /api/history/{target}: one page of history, same window as `get_history`.
pub async fn history(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<Message>> {
    let offset = usize::try_from(query.offset).unwrap_or(0);
    Json(state.relay.lock().await.history_page(&target, offset))
}
