//! SQLite Shape Repository 実装

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{corrupt, map_sqlx_error};
use crate::domain::{
    RepositoryError, RoomId, Shape, ShapeId, ShapeRepository, Timestamp, UserId,
};

type ShapeRow = (String, String, String, String, i64);

pub struct SqliteShapeRepository {
    pool: SqlitePool,
}

impl SqliteShapeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn shape_from_row(row: ShapeRow) -> Result<Shape, RepositoryError> {
    let (id, room_id, creator_id, payload, created_at) = row;
    Ok(Shape {
        id: ShapeId::parse(&id).map_err(|e| corrupt("shapes.id", e))?,
        room_id: RoomId::parse(&room_id).map_err(|e| corrupt("shapes.room_id", e))?,
        creator_id: UserId::parse(&creator_id).map_err(|e| corrupt("shapes.creator_id", e))?,
        payload: serde_json::from_str(&payload).map_err(|e| corrupt("shapes.payload", e))?,
        created_at: Timestamp::new(created_at),
    })
}

#[async_trait]
impl ShapeRepository for SqliteShapeRepository {
    async fn create_shape(&self, shape: Shape) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&shape.payload)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO shapes (id, room_id, creator_id, payload, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(shape.id.to_string())
        .bind(shape.room_id.to_string())
        .bind(shape.creator_id.to_string())
        .bind(payload)
        .bind(shape.created_at.value())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, shape.id))?;

        Ok(())
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Shape>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShapeRow>(
            r#"
            SELECT id, room_id, creator_id, payload, created_at
            FROM shapes
            WHERE room_id = ?
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, room_id))?;

        rows.into_iter().map(shape_from_row).collect()
    }

    async fn delete_shape(&self, shape_id: ShapeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shapes WHERE id = ?")
            .bind(shape_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, shape_id))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(shape_id.to_string()));
        }
        Ok(())
    }

    async fn delete_by_room(&self, room_id: RoomId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shapes WHERE room_id = ?")
            .bind(room_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, room_id))?;

        Ok(result.rows_affected())
    }
}
