//! Domain and transfer handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    RegisterDomainRequest, RegisterDomainResponse, TransferActionRequest, TransferResponse,
};
use crate::app_state::AppState;
use crate::domain::history::RepoId;
use crate::domain::{DomainEntry, RegistrarId};
use crate::error::{ErrorResponse, RegistryError};

/// `POST /domains` — Register a domain.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidRequest`] on a malformed repo id or
/// a duplicate registration.
#[utoipa::path(
    post,
    path = "/api/v1/domains",
    tag = "Domains",
    summary = "Register a domain",
    description = "Creates a domain with its initial auto-renewing regime: the sponsor's autorenew poll series and the linked recurring billing event.",
    request_body = RegisterDomainRequest,
    responses(
        (status = 201, description = "Domain registered", body = RegisterDomainResponse),
        (status = 400, description = "Malformed repo id or duplicate domain", body = ErrorResponse),
    )
)]
pub async fn register_domain(
    State(state): State<AppState>,
    Json(req): Json<RegisterDomainRequest>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = req.repo_id.parse()?;
    let sponsor = RegistrarId::from(req.sponsor_registrar);
    let now = state.clock.now();

    let entry: DomainEntry = state
        .store
        .transact(move |s| {
            let repo = s.register_domain(
                repo,
                req.fqdn,
                sponsor,
                now,
                req.registration_expiration,
            )?;
            Ok(s.domain(&repo)?.clone())
        })
        .await?;

    tracing::info!(repo_id = %entry.repo_id, fqdn = %entry.fqdn, "domain registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterDomainResponse {
            repo_id: entry.repo_id.to_string(),
            fqdn: entry.fqdn,
            sponsor_registrar: entry.sponsor_registrar.to_string(),
            registration_expiration: entry.registration_expiration,
            created_at: entry.created_at,
        }),
    ))
}

/// `GET /domains/:repo_id` — Get domain details.
///
/// # Errors
///
/// Returns [`RegistryError::DomainNotFound`] if the domain does not
/// exist.
#[utoipa::path(
    get,
    path = "/api/v1/domains/{repo_id}",
    tag = "Domains",
    summary = "Get domain details",
    description = "Returns the domain's registration state and current transfer status.",
    params(
        ("repo_id" = String, Path, description = "Repo id, e.g. 3-EXAMPLE"),
    ),
    responses(
        (status = 200, description = "Domain details", body = serde_json::Value),
        (status = 404, description = "Domain not found", body = ErrorResponse),
    )
)]
pub async fn get_domain(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = repo_id.parse()?;
    let entry = state
        .store
        .read(|s| Ok(s.domain(&repo)?.clone()))
        .await?;

    let response = serde_json::json!({
        "repo_id": entry.repo_id,
        "fqdn": entry.fqdn,
        "sponsor_registrar": entry.sponsor_registrar,
        "registration_expiration": entry.registration_expiration.to_rfc3339(),
        "created_at": entry.created_at.to_rfc3339(),
        "updated_at": entry.last_modified_at.to_rfc3339(),
        "transfer_status": entry.transfer_data.status.as_str(),
        "latest_revision": entry.latest_revision(),
    });
    Ok(Json(response))
}

/// `GET /domains/:repo_id/transfer` — Current transfer state.
///
/// Observing a pending transfer past its deadline commits the automatic
/// approval before reporting.
///
/// # Errors
///
/// Returns [`RegistryError::DomainNotFound`] if the domain does not
/// exist.
#[utoipa::path(
    get,
    path = "/api/v1/domains/{repo_id}/transfer",
    tag = "Transfers",
    summary = "Get transfer state",
    description = "Returns the current transfer negotiation state. A pending transfer whose automatic-resolve deadline has passed is committed as SERVER_APPROVED before the response is built.",
    params(
        ("repo_id" = String, Path, description = "Repo id, e.g. 3-EXAMPLE"),
    ),
    responses(
        (status = 200, description = "Transfer state", body = TransferResponse),
        (status = 404, description = "Domain not found", body = ErrorResponse),
    )
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = repo_id.parse()?;
    let view = state.transfer_engine.current(&repo).await?;
    Ok(Json(TransferResponse::from(view)))
}

/// `POST /domains/:repo_id/transfer` — Request a transfer.
///
/// # Errors
///
/// Returns [`RegistryError`] when the domain is unknown, a transfer is
/// already pending, or the requester already sponsors the domain.
#[utoipa::path(
    post,
    path = "/api/v1/domains/{repo_id}/transfer",
    tag = "Transfers",
    summary = "Request a transfer",
    description = "Opens a transfer negotiation on behalf of the gaining registrar. The transfer self-approves after the automatic transfer period unless the losing registrar acts first.",
    params(
        ("repo_id" = String, Path, description = "Repo id, e.g. 3-EXAMPLE"),
    ),
    request_body = TransferActionRequest,
    responses(
        (status = 201, description = "Transfer requested", body = TransferResponse),
        (status = 400, description = "Requester already sponsors the domain", body = ErrorResponse),
        (status = 404, description = "Domain not found", body = ErrorResponse),
        (status = 409, description = "Transfer already pending", body = ErrorResponse),
    )
)]
pub async fn request_transfer(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Json(req): Json<TransferActionRequest>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = repo_id.parse()?;
    let gaining = RegistrarId::from(req.registrar_id);
    let view = state.transfer_engine.request(&repo, &gaining).await?;
    Ok((StatusCode::CREATED, Json(TransferResponse::from(view))))
}

/// `POST /domains/:repo_id/transfer/approve` — Approve the pending transfer.
///
/// # Errors
///
/// Returns [`RegistryError`] when no transfer is pending or the acting
/// registrar is not a party to it.
#[utoipa::path(
    post,
    path = "/api/v1/domains/{repo_id}/transfer/approve",
    tag = "Transfers",
    summary = "Approve the pending transfer",
    description = "Commits the transfer: approval by the gaining registrar resolves to SERVER_APPROVED, approval by the losing registrar to CLIENT_APPROVED.",
    params(
        ("repo_id" = String, Path, description = "Repo id, e.g. 3-EXAMPLE"),
    ),
    request_body = TransferActionRequest,
    responses(
        (status = 200, description = "Transfer approved", body = TransferResponse),
        (status = 403, description = "Registrar is not a party to the transfer", body = ErrorResponse),
        (status = 404, description = "Domain not found or no pending transfer", body = ErrorResponse),
    )
)]
pub async fn approve_transfer(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Json(req): Json<TransferActionRequest>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = repo_id.parse()?;
    let acting = RegistrarId::from(req.registrar_id);
    let view = state.transfer_engine.approve(&repo, &acting).await?;
    Ok(Json(TransferResponse::from(view)))
}

/// `POST /domains/:repo_id/transfer/reject` — Reject the pending transfer.
///
/// # Errors
///
/// Returns [`RegistryError`] when no transfer is pending or the acting
/// registrar is not the losing side.
#[utoipa::path(
    post,
    path = "/api/v1/domains/{repo_id}/transfer/reject",
    tag = "Transfers",
    summary = "Reject the pending transfer",
    description = "Losing registrar only. The domain keeps its sponsor and expiration; the gaining registrar is notified.",
    params(
        ("repo_id" = String, Path, description = "Repo id, e.g. 3-EXAMPLE"),
    ),
    request_body = TransferActionRequest,
    responses(
        (status = 200, description = "Transfer rejected", body = TransferResponse),
        (status = 403, description = "Only the losing registrar may reject", body = ErrorResponse),
        (status = 404, description = "Domain not found or no pending transfer", body = ErrorResponse),
    )
)]
pub async fn reject_transfer(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Json(req): Json<TransferActionRequest>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = repo_id.parse()?;
    let acting = RegistrarId::from(req.registrar_id);
    let view = state.transfer_engine.reject(&repo, &acting).await?;
    Ok(Json(TransferResponse::from(view)))
}

/// `POST /domains/:repo_id/transfer/cancel` — Cancel the pending transfer.
///
/// # Errors
///
/// Returns [`RegistryError`] when no transfer is pending or the acting
/// registrar is not the losing side.
#[utoipa::path(
    post,
    path = "/api/v1/domains/{repo_id}/transfer/cancel",
    tag = "Transfers",
    summary = "Cancel the pending transfer",
    description = "Losing registrar only; symmetric to reject.",
    params(
        ("repo_id" = String, Path, description = "Repo id, e.g. 3-EXAMPLE"),
    ),
    request_body = TransferActionRequest,
    responses(
        (status = 200, description = "Transfer cancelled", body = TransferResponse),
        (status = 403, description = "Only the losing registrar may cancel", body = ErrorResponse),
        (status = 404, description = "Domain not found or no pending transfer", body = ErrorResponse),
    )
)]
pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(repo_id): Path<String>,
    Json(req): Json<TransferActionRequest>,
) -> Result<impl IntoResponse, RegistryError> {
    let repo: RepoId = repo_id.parse()?;
    let acting = RegistrarId::from(req.registrar_id);
    let view = state.transfer_engine.cancel(&repo, &acting).await?;
    Ok(Json(TransferResponse::from(view)))
}

/// Domain and transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/domains", post(register_domain))
        .route("/domains/{repo_id}", get(get_domain))
        .route(
            "/domains/{repo_id}/transfer",
            get(get_transfer).post(request_transfer),
        )
        .route("/domains/{repo_id}/transfer/approve", post(approve_transfer))
        .route("/domains/{repo_id}/transfer/reject", post(reject_transfer))
        .route("/domains/{repo_id}/transfer/cancel", post(cancel_transfer))
}
