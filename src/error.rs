//! Registry error types with EPP result-code and HTTP status mapping.
//!
//! [`RegistryError`] is the central error type for the core. Each
//! variant maps to an EPP result code (RFC 5730 §3) and to an HTTP
//! status with a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2303,
///     "message": "message with this id does not exist: (1-3-EXAMPLE-4-3-2011)",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with EPP result code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// EPP result code for the failure.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Central error enum with EPP result-code mapping.
///
/// The first four variants are the client-input taxonomy of the poll
/// ack protocol; they are surfaced verbatim to the caller and never
/// retried internally. Everything else is either transfer-flow
/// validation or an internal failure that rolls the transaction back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Ack request carried no message id at all.
    #[error("message id is required")]
    MissingMessageId,

    /// Message id failed strict decoding.
    #[error("invalid message id: ({0})")]
    InvalidMessageId(String),

    /// Valid id, but no matching message is visible to the caller.
    #[error("message with this id does not exist: ({0})")]
    MessageDoesNotExist(String),

    /// Message exists and is visible but belongs to another registrar.
    #[error("registrar is not authorized to ack this message")]
    NotAuthorizedToAckMessage,

    /// Domain with the given repo id was not found.
    #[error("domain not found: {0}")]
    DomainNotFound(String),

    /// A transfer request arrived while one is already pending.
    #[error("transfer already pending for domain: {0}")]
    TransferAlreadyPending(String),

    /// An explicit transfer action found no pending negotiation.
    #[error("no pending transfer for domain: {0}")]
    NoPendingTransfer(String),

    /// Acting registrar is not a party allowed to take this action.
    #[error("registrar {0} is not authorized for this transfer action")]
    NotAuthorizedForTransfer(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal failure; the enclosing transaction is rolled back.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Returns the EPP result code for this variant (RFC 5730 §3).
    #[must_use]
    pub const fn epp_code(&self) -> u16 {
        match self {
            Self::MissingMessageId => 2003,
            Self::InvalidMessageId(_) => 2005,
            Self::MessageDoesNotExist(_) | Self::DomainNotFound(_) => 2303,
            Self::NotAuthorizedToAckMessage | Self::NotAuthorizedForTransfer(_) => 2201,
            Self::TransferAlreadyPending(_) => 2304,
            Self::NoPendingTransfer(_) => 2301,
            Self::InvalidRequest(_) => 2306,
            Self::Internal(_) => 2400,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingMessageId | Self::InvalidMessageId(_) | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MessageDoesNotExist(_) | Self::DomainNotFound(_) | Self::NoPendingTransfer(_) => {
                StatusCode::NOT_FOUND
            }
            Self::NotAuthorizedToAckMessage | Self::NotAuthorizedForTransfer(_) => {
                StatusCode::FORBIDDEN
            }
            Self::TransferAlreadyPending(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.epp_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
