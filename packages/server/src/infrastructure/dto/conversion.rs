//! Conversion logic between DTOs and domain / realtime types.

use crate::domain::entity::Principal;
use crate::infrastructure::dto::{http as http_dto, websocket as ws_dto};
use crate::realtime::{HubSnapshot, QueueStat};

// ========================================
// Domain Entity → DTO
// ========================================

impl<'a> From<&'a Principal> for ws_dto::SenderInfo<'a> {
    fn from(principal: &'a Principal) -> Self {
        Self {
            id: principal.id,
            name: &principal.name,
        }
    }
}

impl<'a> From<&'a Principal> for ws_dto::JoiningUser<'a> {
    fn from(principal: &'a Principal) -> Self {
        Self {
            user_id: principal.id,
            name: &principal.name,
        }
    }
}

// ========================================
// Realtime → DTO
// ========================================

fn queue_stat(stat: QueueStat) -> String {
    format!("{}/{}", stat.len, stat.capacity)
}

impl From<HubSnapshot> for http_dto::HubSnapshotDto {
    fn from(snapshot: HubSnapshot) -> Self {
        Self {
            room_id: snapshot.room_id.to_string(),
            members: snapshot.members,
            broadcasts: snapshot.broadcasts,
            evictions: snapshot.evictions,
            broadcast_queue: queue_stat(snapshot.broadcast_queue),
            register_queue: queue_stat(snapshot.register_queue),
            unregister_queue: queue_stat(snapshot.unregister_queue),
        }
    }
}
