//! Route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::params::{EventParams, LocationParams};
use super::server::AppState;
use super::ApiError;
use crate::models::{Event, VesselKind};
use crate::service::LocationStats;

/// `GET /bridge-lifts`
pub async fn bridge_lifts(
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let query = params.event_query()?;
    let events = state.orchestrator.bridge_lifts(params.unique()).await?;
    Ok(Json(query.filter(events)))
}

/// `GET /vessels`
pub async fn vessels(
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let kind = params.vessel_kind()?;
    let mut query = params.event_query()?;

    // A single list is narrowed (and cached) by exact location upstream of
    // the query; `all` falls back to substring matching here.
    let location = query.location.take().unwrap_or_default();
    let events = state
        .orchestrator
        .vessels_at(kind, &location, params.unique())
        .await?;
    if kind == VesselKind::All && !location.is_empty() {
        query.location = Some(location);
    }

    Ok(Json(query.filter(events)))
}

/// `GET /locations`
pub async fn locations(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> Result<Json<Vec<LocationStats>>, ApiError> {
    let min_total = params.min_total()?;
    let stats = state.orchestrator.locations().await?;
    Ok(Json(
        stats
            .into_iter()
            .filter(|s| s.matches(min_total, params.q()))
            .collect(),
    ))
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.orchestrator.health_check().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
