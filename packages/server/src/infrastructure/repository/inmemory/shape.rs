//! InMemory Shape Repository 実装

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{RepositoryError, RoomId, Shape, ShapeId, ShapeRepository};

/// インメモリ Shape Repository 実装
///
/// 作成時刻順、同時刻は挿入順で返す。
#[derive(Default)]
pub struct InMemoryShapeRepository {
    shapes: RwLock<Vec<Shape>>,
}

impl InMemoryShapeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShapeRepository for InMemoryShapeRepository {
    async fn create_shape(&self, shape: Shape) -> Result<(), RepositoryError> {
        let mut shapes = self.shapes.write().await;
        if shapes.iter().any(|s| s.id == shape.id) {
            return Err(RepositoryError::Conflict(shape.id.to_string()));
        }
        shapes.push(shape);
        Ok(())
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Shape>, RepositoryError> {
        let shapes = self.shapes.read().await;
        let mut in_room: Vec<Shape> = shapes
            .iter()
            .filter(|s| s.room_id == room_id)
            .cloned()
            .collect();
        // stable: ties keep insertion order
        in_room.sort_by_key(|s| s.created_at);
        Ok(in_room)
    }

    async fn delete_shape(&self, shape_id: ShapeId) -> Result<(), RepositoryError> {
        let mut shapes = self.shapes.write().await;
        let before = shapes.len();
        shapes.retain(|s| s.id != shape_id);
        if shapes.len() == before {
            return Err(RepositoryError::NotFound(shape_id.to_string()));
        }
        Ok(())
    }

    async fn delete_by_room(&self, room_id: RoomId) -> Result<u64, RepositoryError> {
        let mut shapes = self.shapes.write().await;
        let before = shapes.len();
        shapes.retain(|s| s.room_id != room_id);
        Ok((before - shapes.len()) as u64)
    }
}
