//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{HealthDto, HubSnapshotDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto { status: "ok" })
}

/// Live statistics of every room hub
pub async fn debug_hubs(State(state): State<Arc<AppState>>) -> Json<Vec<HubSnapshotDto>> {
    let snapshots = state.registry.snapshots().await;
    Json(snapshots.into_iter().map(HubSnapshotDto::from).collect())
}
