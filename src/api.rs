//! HTTP API endpoints.
//!
//! JSON over HTTP. Every failure goes through [`AppError`] so clients always get
//! `{error, message}` with a distinct code.

use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, rejection::QueryRejection,
        DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, State,
    },
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{AppError, AppResult, ValidationError};
use crate::state::export::StateSnapshot;
use crate::state::AppState;
use crate::types::*;
use crate::validation::{SubmissionCandidate, VideoUpload};

/// Header carrying the browser-local user id
pub const USER_HEADER: &str = "x-konnect-user";
/// Header carrying the browser-local display name
pub const NAME_HEADER: &str = "x-konnect-name";

/// Extra room for the non-video multipart fields
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientContext {
            user_id: header_value(&parts.headers, USER_HEADER),
            display_name: header_value(&parts.headers, NAME_HEADER),
        })
    }
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = usize::try_from(state.config.contest.max_video_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/api/contest/entry",
            post(submit_entry).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/contest/entry/{id}", get(get_entry))
        .route("/api/contest/leaderboard", get(contest_leaderboard))
        .route("/api/referral/leaderboard", get(referral_leaderboard))
        .route("/api/referral/{user_id}", get(referral_profile))
        .route("/api/raffle-entry", post(raffle_entry))
        .route("/api/health", get(health))
        .route("/api/state/export", get(export_state))
        .route("/api/state/import", post(import_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn multipart_error(e: MultipartError, max_video_bytes: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The body limit tripped before the whole file was read
        return ValidationError::UploadTooLarge {
            max: max_video_bytes,
        }
        .into();
    }
    AppError::MalformedPayload(e.body_text())
}

async fn read_submission(
    multipart: &mut Multipart,
    max_video_bytes: u64,
) -> AppResult<SubmissionCandidate> {
    let mut candidate = SubmissionCandidate::default();
    let mut declared_duration = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_video_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_video_bytes))?;
                candidate.video = Some(VideoUpload {
                    file_name,
                    mime_type,
                    size: bytes.len() as u64,
                    bytes,
                    declared_duration: None,
                });
            }
            "language" | "region" | "caption" | "duration" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_video_bytes))?;
                match name.as_str() {
                    "language" => candidate.language = Some(text),
                    "region" => candidate.region = Some(text),
                    "caption" => candidate.caption = Some(text),
                    _ => declared_duration = text.trim().parse::<f64>().ok(),
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    if let Some(video) = candidate.video.as_mut() {
        video.declared_duration = declared_duration;
    }
    Ok(candidate)
}

/// Submit a contest entry.
///
/// POST /api/contest/entry (multipart: language, region, caption, video, duration?)
pub async fn submit_entry(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ContestEntry>)> {
    let candidate = read_submission(&mut multipart, state.config.contest.max_video_bytes).await?;
    let entry = state.submit_entry(candidate, &ctx).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/contest/entry/{id}
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ContestEntry>> {
    state
        .get_entry(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("entry {id}")))
}

/// Ranked contest leaderboard.
///
/// GET /api/contest/leaderboard?sortBy=votes|views|recent&language=..&region=..
pub async fn contest_leaderboard(
    State(state): State<Arc<AppState>>,
    filters: Result<Query<LeaderboardFilters>, QueryRejection>,
) -> AppResult<Json<Vec<ContestEntry>>> {
    let Query(filters) = filters.map_err(|e| AppError::MalformedPayload(e.body_text()))?;
    Ok(Json(state.query_leaderboard(&filters).await?))
}

/// Get or create the user's referral identity.
///
/// GET /api/referral/{user_id}
pub async fn referral_profile(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    Path(user_id): Path<String>,
) -> AppResult<Json<ReferralProfile>> {
    Ok(Json(
        state
            .referral_profile(&user_id, ctx.display_name.as_deref())
            .await?,
    ))
}

/// GET /api/referral/leaderboard
pub async fn referral_leaderboard(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<ReferralStanding>>> {
    Ok(Json(state.referral_leaderboard().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleEntryRequest {
    pub referral_id: Option<String>,
}

/// Redeem a referral identifier.
///
/// POST /api/raffle-entry {"referralId": "..."}
pub async fn raffle_entry(
    State(state): State<Arc<AppState>>,
    ctx: ClientContext,
    body: Result<Json<RaffleEntryRequest>, JsonRejection>,
) -> AppResult<Json<RaffleReceipt>> {
    let Json(request) = body.map_err(|e| AppError::MalformedPayload(e.body_text()))?;
    let referral_id = request.referral_id.unwrap_or_default();
    Ok(Json(state.record_referral(&referral_id, &ctx).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub entries: usize,
    pub referrals: usize,
    pub uptime_secs: u64,
}

/// Availability probe for polling clients.
///
/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let counts = async {
        let entries = state.entries.list().await?.len();
        let referrals = state.referrals.list().await?.len();
        Ok::<_, AppError>((entries, referrals))
    }
    .await;

    match counts {
        Ok((entries, referrals)) => Json(HealthResponse {
            status: "ok",
            entries,
            referrals,
            uptime_secs: state.uptime_secs(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "error": e.code(),
                "message": e.to_string(),
            })),
        )
            .into_response(),
    }
}

/// Export the entire state as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> AppResult<Json<StateSnapshot>> {
    Ok(Json(state.export_state().await?))
}

/// Import a state snapshot.
///
/// POST /api/state/import
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StateSnapshot>, JsonRejection>,
) -> AppResult<(StatusCode, &'static str)> {
    let Json(snapshot) = body.map_err(|e| AppError::MalformedPayload(e.body_text()))?;
    if let Err(e) = state.import_state(snapshot).await {
        tracing::error!("State import failed: {}", e);
        return Err(e);
    }
    Ok((StatusCode::OK, "State imported successfully"))
}
