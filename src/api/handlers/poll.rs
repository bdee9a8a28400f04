//! Poll-message handlers: list and acknowledge.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AckRequest, AckResponse, MessageListResponse, QueueItemDto};
use crate::app_state::AppState;
use crate::domain::RegistrarId;
use crate::error::{ErrorResponse, RegistryError};

/// `GET /registrars/:registrar_id/messages` — List queued messages.
///
/// # Errors
///
/// Returns [`RegistryError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/registrars/{registrar_id}/messages",
    tag = "Poll",
    summary = "List queued poll messages",
    description = "Returns every message currently visible to the registrar, oldest first. Autorenew series appear as one virtual message per elapsed year.",
    params(
        ("registrar_id" = String, Path, description = "Registrar id"),
    ),
    responses(
        (status = 200, description = "Queued messages", body = MessageListResponse),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(registrar_id): Path<String>,
) -> Result<impl IntoResponse, RegistryError> {
    let registrar = RegistrarId::from(registrar_id);
    let items = state.poll_queue.list(&registrar, None).await?;
    let data: Vec<QueueItemDto> = items.into_iter().map(QueueItemDto::from).collect();
    let count = data.len();
    Ok(Json(MessageListResponse { data, count }))
}

/// `POST /registrars/:registrar_id/messages/ack` — Acknowledge a message.
///
/// # Errors
///
/// Returns [`RegistryError`] when the id is missing, malformed,
/// unresolvable, or owned by another registrar.
#[utoipa::path(
    post,
    path = "/api/v1/registrars/{registrar_id}/messages/ack",
    tag = "Poll",
    summary = "Acknowledge a poll message",
    description = "Consumes the message addressed by the id and reports how many messages remain. With `dry_run` set, runs every check without consuming anything.",
    params(
        ("registrar_id" = String, Path, description = "Registrar id"),
    ),
    request_body = AckRequest,
    responses(
        (status = 200, description = "Message acknowledged", body = AckResponse),
        (status = 400, description = "Missing or malformed message id", body = ErrorResponse),
        (status = 403, description = "Message owned by another registrar", body = ErrorResponse),
        (status = 404, description = "No message matches the id", body = ErrorResponse),
    )
)]
pub async fn ack_message(
    State(state): State<AppState>,
    Path(registrar_id): Path<String>,
    Json(req): Json<AckRequest>,
) -> Result<impl IntoResponse, RegistryError> {
    let registrar = RegistrarId::from(registrar_id);
    let raw_id = req.message_id.as_deref();
    let outcome = if req.dry_run {
        state.ack_handler.dry_run(&registrar, raw_id).await?
    } else {
        state.ack_handler.acknowledge(&registrar, raw_id).await?
    };
    Ok(Json(AckResponse {
        acked_id: outcome.acked_id.to_string(),
        remaining_count: outcome.remaining_count,
        dry_run: req.dry_run,
    }))
}

/// Poll message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/registrars/{registrar_id}/messages", get(list_messages))
        .route("/registrars/{registrar_id}/messages/ack", post(ack_message))
}
