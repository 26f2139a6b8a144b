//! HTTP API response DTOs.

use serde::Serialize;

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
}

/// Live statistics of one room hub (`GET /debug/hubs`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSnapshotDto {
    pub room_id: String,
    pub members: usize,
    pub broadcasts: u64,
    pub evictions: u64,
    /// "len/cap"
    pub broadcast_queue: String,
    pub register_queue: String,
    pub unregister_queue: String,
}
