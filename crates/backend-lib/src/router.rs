// ============================
// chatroom-backend-lib/src/router.rs
// ============================
//! HTTP router and request handlers: the thin layer mapping inbound
//! requests onto the registry and the message store.
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chatroom_common::{Message, NewMessage, NewParticipant};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::store::MessageStore;
use crate::AppState;

/// Create the application router
pub fn create_router<S: MessageStore + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/participants", post(join).get(list_participants))
        .route("/messages", post(send_message).get(read_messages))
        .route("/status", post(heartbeat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The acting participant, carried in the `User` header.
fn user_header(headers: &HeaderMap) -> Result<String, AppError> {
    let user = headers
        .get("User")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if user.is_empty() {
        return Err(AppError::Validation(
            "missing or empty 'User' header".to_string(),
        ));
    }
    Ok(user.to_string())
}

/// POST /participants — register a display name.
async fn join<S: MessageStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<NewParticipant>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let participant = state.registry.join(&body.name)?;
    tracing::info!(participant = %participant.name, "participant joined");

    let greeting = Message::status(participant.name.clone(), "joined");
    if let Err(error) = state.store.append(greeting).await {
        // no partial effect: a failed status append undoes the join
        state.registry.remove(&participant.name);
        return Err(error);
    }

    Ok((StatusCode::CREATED, Json(participant)))
}

/// GET /participants — snapshot of the active room.
async fn list_participants<S: MessageStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    Json(state.registry.list())
}

/// POST /messages — append a broadcast or private message.
async fn send_message<S: MessageStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    payload: Result<Json<NewMessage>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let from = user_header(&headers)?;
    let Json(body) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    if !state.registry.contains(&from) {
        return Err(AppError::Validation(format!(
            "sender '{from}' is not an active participant"
        )));
    }

    let message = Message::new(from, body.to, body.text, body.kind.into());
    state.store.append(message.clone()).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
struct ReadQuery {
    /// kept as a raw string so a non-numeric value maps to 422, not 400
    limit: Option<String>,
}

/// GET /messages — read the messages visible to the requesting reader.
async fn read_messages<S: MessageStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    // an absent User header reads anonymously: broadcasts and status only
    let reader = headers
        .get("User")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let limit = match query.limit {
        None => None,
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            AppError::Validation(format!("limit must be a positive integer, got '{raw}'"))
        })?),
    };

    let messages = state.store.read_visible(&reader, limit).await?;
    Ok(Json(messages))
}

/// POST /status — heartbeat for the participant named in the `User` header.
async fn heartbeat<S: MessageStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user = user_header(&headers)?;
    state.registry.heartbeat(&user)?;
    Ok(StatusCode::OK)
}
