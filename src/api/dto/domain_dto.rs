//! Domain and transfer DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::transfer_engine::TransferView;

/// Request body for `POST /domains`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterDomainRequest {
    /// Repo id to assign, e.g. `3-EXAMPLE`.
    pub repo_id: String,
    /// Fully-qualified domain name.
    pub fqdn: String,
    /// Sponsoring registrar id.
    pub sponsor_registrar: String,
    /// Initial registration expiration.
    pub registration_expiration: DateTime<Utc>,
}

/// Response body for `POST /domains` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterDomainResponse {
    /// Assigned repo id.
    pub repo_id: String,
    /// Fully-qualified domain name.
    pub fqdn: String,
    /// Sponsoring registrar id.
    pub sponsor_registrar: String,
    /// Registration expiration.
    pub registration_expiration: DateTime<Utc>,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request body for transfer actions (request/approve/reject/cancel).
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferActionRequest {
    /// Registrar performing the action.
    pub registrar_id: String,
}

/// Transfer state snapshot returned by every transfer endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    /// Repo id of the domain.
    pub repo_id: String,
    /// Fully-qualified domain name.
    pub fqdn: String,
    /// Current sponsoring registrar.
    pub sponsor_registrar: String,
    /// Current registration expiration.
    pub registration_expiration: DateTime<Utc>,
    /// Transfer status (`PENDING`, `SERVER_APPROVED`, ...).
    pub status: String,
    /// Gaining side, if a transfer was ever requested.
    pub gaining_registrar: Option<String>,
    /// Losing side, if a transfer was ever requested.
    pub losing_registrar: Option<String>,
    /// When the transfer was requested.
    pub request_time: Option<DateTime<Utc>>,
    /// Deadline at which a pending transfer self-approves.
    pub automatic_resolve_time: Option<DateTime<Utc>>,
    /// When the transfer reached a terminal status.
    pub resolution_time: Option<DateTime<Utc>>,
}

impl From<TransferView> for TransferResponse {
    fn from(view: TransferView) -> Self {
        Self {
            repo_id: view.repo_id.to_string(),
            fqdn: view.fqdn,
            sponsor_registrar: view.sponsor_registrar.to_string(),
            registration_expiration: view.registration_expiration,
            status: view.status.as_str().to_string(),
            gaining_registrar: view.gaining_registrar.map(|r| r.to_string()),
            losing_registrar: view.losing_registrar.map(|r| r.to_string()),
            request_time: view.request_time,
            automatic_resolve_time: view.automatic_resolve_time,
            resolution_time: view.resolution_time,
        }
    }
}
