use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{
    AggregateStats, ClientEnvironment, ManualStatsUpdate, OperationResult, Testimonial,
    TestimonialInput, WaitlistEntry, WaitlistRequest,
};
use crate::services::testimonials::DEFAULT_TESTIMONIAL_LIMIT;
use crate::services::{Dashboard, Services};

const MAX_VISITOR_ID_LEN: usize = 128;

pub struct AppState {
    pub services: Services,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct TestimonialQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_TESTIMONIAL_LIMIT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitRequest {
    pub visitor_id: String,
    #[serde(default)]
    pub is_first_visit: bool,
    #[serde(default)]
    pub is_new_session: bool,
    #[serde(default)]
    pub environment: ClientEnvironment,
}

type ApiResult = (StatusCode, Json<OperationResult>);

fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Duplicate => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Store(_) | ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(context: &str, err: ServiceError) -> ApiResult {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{}: {}", context, err);
    }
    (status, Json(err.into_result()))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}

/// Public site counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<AggregateStats> {
    Json(state.services.stats.get_stats().await)
}

/// Join the waitlist
pub async fn join_waitlist(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WaitlistRequest>,
) -> ApiResult {
    match state
        .services
        .waitlist
        .try_add(&payload.email, &payload.name)
        .await
    {
        Ok(id) => (StatusCode::CREATED, Json(OperationResult::created(id))),
        Err(e) => failure("Failed to add to waitlist", e),
    }
}

/// Published testimonials, newest first
pub async fn list_testimonials(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TestimonialQuery>,
) -> Json<Vec<Testimonial>> {
    Json(
        state
            .services
            .testimonials
            .get_testimonials(query.limit)
            .await,
    )
}

/// Record a page visit whose local classification the client already did.
/// Analytics never fail the page, so anything past validation is a 202.
pub async fn track_visit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TrackVisitRequest>,
) -> ApiResult {
    let visitor_id = payload.visitor_id.trim();
    if visitor_id.is_empty() || visitor_id.len() > MAX_VISITOR_ID_LEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(OperationResult::failed("Invalid visitor id")),
        );
    }

    let result = state
        .services
        .counters
        .track_page_visit(
            visitor_id,
            payload.is_first_visit,
            payload.is_new_session,
            &payload.environment,
        )
        .await;

    (StatusCode::ACCEPTED, Json(result))
}

/// Stats, waitlist and testimonials in one round trip
pub async fn admin_dashboard(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    Json(state.services.load_dashboard().await)
}

/// Every waitlist signup, newest first
pub async fn admin_list_waitlist(State(state): State<Arc<AppState>>) -> Json<Vec<WaitlistEntry>> {
    Json(state.services.waitlist.list_waitlist().await)
}

/// Overwrite manually tracked counters
pub async fn admin_update_stats(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ManualStatsUpdate>,
) -> ApiResult {
    match state.services.stats.try_update(&payload).await {
        Ok(()) => (StatusCode::OK, Json(OperationResult::ok())),
        Err(e) => failure("Failed to update stats", e),
    }
}

pub async fn admin_create_testimonial(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TestimonialInput>,
) -> ApiResult {
    match state.services.testimonials.try_add(&payload).await {
        Ok(id) => (StatusCode::CREATED, Json(OperationResult::created(id))),
        Err(e) => failure("Failed to add testimonial", e),
    }
}

pub async fn admin_update_testimonial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<TestimonialInput>,
) -> ApiResult {
    match state.services.testimonials.try_update(&id, &payload).await {
        Ok(()) => (StatusCode::OK, Json(OperationResult::ok())),
        Err(e) => failure("Failed to update testimonial", e),
    }
}

pub async fn admin_delete_testimonial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    match state.services.testimonials.try_delete(&id).await {
        Ok(()) => (StatusCode::OK, Json(OperationResult::ok())),
        Err(e) => failure("Failed to delete testimonial", e),
    }
}
