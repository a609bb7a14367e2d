use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::STATUS_HEADER;
use crate::ids::CommunityId;
use crate::ledger::LedgerError;
use crate::relevance::AdvisorError;
use crate::scoring::ScoringError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing or empty {header} header")]
    Unauthenticated { header: &'static str },

    #[error("community not found: {0}")]
    CommunityNotFound(CommunityId),

    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<AdvisorError> for GatewayError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::CommunityNotFound(id) => GatewayError::CommunityNotFound(id),
            AdvisorError::Scoring(ScoringError::InvalidInput { reason }) => {
                GatewayError::InvalidRequest(reason)
            }
            AdvisorError::Scoring(e) => GatewayError::ScoringUnavailable(e.to_string()),
            AdvisorError::Store(e) => GatewayError::StorageError(e.to_string()),
        }
    }
}

impl From<LedgerError> for GatewayError {
    fn from(err: LedgerError) -> Self {
        GatewayError::StorageError(err.to_string())
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        GatewayError::StorageError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, gateway_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            GatewayError::CommunityNotFound(_) => (StatusCode::NOT_FOUND, "community_not_found"),
            GatewayError::ScoringUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "scoring_unavailable")
            }
            GatewayError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(STATUS_HEADER, HeaderValue::from_static(gateway_status));

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
