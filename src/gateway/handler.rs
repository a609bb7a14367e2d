use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use super::{STATUS_HEADER, USER_ID_HEADER};
use crate::gate::{ErrorKind, ModerationOutcome};
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::ids::{CommunityId, QuestionId, UserId};

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub community_id: CommunityId,
    pub text: String,
    #[serde(default)]
    pub thread_context_id: Option<QuestionId>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateContentRequest {
    pub community_id: CommunityId,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub query: String,
    #[serde(default)]
    pub community_id: Option<CommunityId>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    5
}

fn default_min_score() -> f32 {
    crate::constants::DEFAULT_SIMILAR_QUESTION_THRESHOLD
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, GatewayError> {
    serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))
}

/// Identity of the caller, as asserted by the fronting auth layer.
pub(crate) fn user_from_headers(headers: &HeaderMap) -> Result<UserId, GatewayError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(UserId::new)
        .ok_or(GatewayError::Unauthenticated {
            header: USER_ID_HEADER,
        })
}

pub(crate) fn outcome_status(outcome: &ModerationOutcome) -> StatusCode {
    match outcome {
        ModerationOutcome::Accepted { .. } => StatusCode::OK,
        ModerationOutcome::RejectedOffTopic { .. }
        | ModerationOutcome::RejectedInappropriate { .. } => StatusCode::BAD_REQUEST,
        ModerationOutcome::RejectedBanned { .. } => StatusCode::FORBIDDEN,
        ModerationOutcome::Error { kind, .. } => match kind {
            ErrorKind::CommunityNotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidSubmission => StatusCode::BAD_REQUEST,
            ErrorKind::ScoringUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

#[instrument(skip_all, fields(user = tracing::field::Empty, community = tracing::field::Empty))]
pub async fn moderate_handler(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let author_id = user_from_headers(&headers)?;
    let request: ModerateRequest = parse_body(body)?;

    let span = tracing::Span::current();
    span.record("user", tracing::field::display(&author_id));
    span.record("community", tracing::field::display(&request.community_id));

    let outcome = state
        .gate
        .submit_for_moderation(
            author_id,
            request.community_id,
            request.text,
            request.thread_context_id,
        )
        .await;
    debug!(status = outcome.status(), "Moderation outcome");

    let mut headers = HeaderMap::new();
    headers.insert(STATUS_HEADER, HeaderValue::from_static(outcome.status()));
    Ok((outcome_status(&outcome), headers, Json(outcome)).into_response())
}

/// Relevance check without moderation side effects.
#[instrument(skip_all)]
pub async fn validate_content_handler(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    user_from_headers(&headers)?;
    let request: ValidateContentRequest = parse_body(body)?;
    if request.content.trim().is_empty() || request.community_id.is_blank() {
        return Err(GatewayError::InvalidRequest(
            "Missing content or community_id".to_string(),
        ));
    }

    let verdict = state
        .gate
        .advisor()
        .evaluate(&request.content, &request.community_id)
        .await?;
    Ok((StatusCode::OK, Json(verdict)).into_response())
}

#[instrument(skip_all)]
pub async fn recommendations_handler(
    State(state): State<HandlerState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: RecommendationsRequest = parse_body(body)?;
    if request.query.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("query is empty".to_string()));
    }
    if request.top_k == 0 || request.top_k > state.max_recommendations {
        return Err(GatewayError::InvalidRequest(format!(
            "top_k must be between 1 and {}",
            state.max_recommendations
        )));
    }

    let recommendations = state
        .gate
        .advisor()
        .recommend(
            &request.query,
            request.community_id.as_ref(),
            request.top_k,
            request.min_score,
        )
        .await?;
    Ok((StatusCode::OK, Json(recommendations)).into_response())
}

/// Unexpired bans in a community.
#[instrument(skip(state))]
pub async fn active_bans_handler(
    State(state): State<HandlerState>,
    Path(community_id): Path<String>,
) -> Result<Response, GatewayError> {
    let community_id = CommunityId::new(community_id);
    state.gate.advisor().community(&community_id).await?;
    let bans = state.gate.ledger().active_bans(&community_id).await?;
    Ok((StatusCode::OK, Json(bans)).into_response())
}
