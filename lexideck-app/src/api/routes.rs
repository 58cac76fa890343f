use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use lexideck_core::{DialogueController, Repository};

use crate::api::dto::{CardOut, WebhookIn};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DialogueController>,
    pub repo: Arc<dyn Repository>,
}

pub async fn health() -> &'static str {
    "ok"
}

/// One inbound chat event in, one reply batch out. Inputs the session drops
/// answer `204 No Content`.
pub async fn webhook(State(st): State<Arc<AppState>>, Json(body): Json<WebhookIn>) -> Response {
    let Some(event) = body.into_event() else {
        warn!("webhook call without conversation id");
        return StatusCode::BAD_REQUEST.into_response();
    };
    match st.controller.handle(&event).await {
        Some(batch) => Json(batch).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn list_cards(State(st): State<Arc<AppState>>) -> Result<Json<Vec<CardOut>>, StatusCode> {
    let mut cards = st.repo.list_cards().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    lexideck_core::sort_deck_order(&mut cards);
    Ok(Json(cards.into_iter().map(CardOut::from).collect()))
}
