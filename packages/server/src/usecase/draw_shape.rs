//! UseCase: 図形の保存
//!
//! クライアントが楽観的に確定させた図形 ID をそのまま採用し、
//! ルーム ID と作成者を付与して永続化する。

use std::sync::Arc;

use kokuban_shared::time::Clock;

use crate::domain::{
    Principal, RepositoryError, RoomId, Shape, ShapeId, ShapeRepository, Timestamp,
};

use super::error::DrawShapeError;

/// 図形保存のユースケース
pub struct DrawShapeUseCase {
    shapes: Arc<dyn ShapeRepository>,
    clock: Arc<dyn Clock>,
}

impl DrawShapeUseCase {
    pub fn new(shapes: Arc<dyn ShapeRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { shapes, clock }
    }

    /// 図形を保存する。`payload` はクライアントが送った本文そのもの
    pub async fn execute(
        &self,
        principal: &Principal,
        room_id: RoomId,
        shape_id: ShapeId,
        payload: serde_json::Value,
    ) -> Result<Shape, DrawShapeError> {
        let shape = Shape {
            id: shape_id,
            room_id,
            creator_id: principal.id,
            payload,
            created_at: Timestamp::new(self.clock.now_millis()),
        };

        match self.shapes.create_shape(shape.clone()).await {
            Ok(()) => Ok(shape),
            Err(RepositoryError::Conflict(_)) => Err(DrawShapeError::Duplicate(shape_id)),
            Err(err) => Err(DrawShapeError::Storage(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockShapeRepository, UserId};
    use crate::infrastructure::repository::InMemoryShapeRepository;
    use kokuban_shared::time::FixedClock;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_draw_stamps_room_creator_and_time() {
        // テスト項目: 図形にルーム・作成者・作成時刻が付与され、保存される
        // given (前提条件):
        let shapes = Arc::new(InMemoryShapeRepository::new());
        let usecase = DrawShapeUseCase::new(shapes.clone(), Arc::new(FixedClock::new(42_000)));
        let principal = Principal::new(UserId::new(Uuid::new_v4()), "alice");
        let room = RoomId::new(Uuid::new_v4());
        let id = ShapeId::new(Uuid::new_v4());
        let payload = json!({"id": id.to_string(), "kind": "rect", "w": 10});

        // when (操作):
        let shape = usecase
            .execute(&principal, room, id, payload.clone())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(shape.creator_id, principal.id);
        assert_eq!(shape.room_id, room);
        assert_eq!(shape.payload, payload);
        assert_eq!(shape.created_at, Timestamp::new(42_000));
        assert_eq!(shapes.list_by_room(room).await.unwrap(), vec![shape]);
    }

    #[tokio::test]
    async fn test_duplicate_shape_id() {
        // テスト項目: 既存 ID での保存は Duplicate
        // given (前提条件):
        let usecase = DrawShapeUseCase::new(
            Arc::new(InMemoryShapeRepository::new()),
            Arc::new(FixedClock::new(0)),
        );
        let principal = Principal::new(UserId::new(Uuid::new_v4()), "alice");
        let room = RoomId::new(Uuid::new_v4());
        let id = ShapeId::new(Uuid::new_v4());
        usecase
            .execute(&principal, room, id, json!({}))
            .await
            .unwrap();

        // when (操作):
        let result = usecase.execute(&principal, room, id, json!({})).await;

        // then (期待する結果):
        assert_eq!(result, Err(DrawShapeError::Duplicate(id)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        // テスト項目: ストレージ障害は Storage として返る
        // given (前提条件):
        let mut shapes = MockShapeRepository::new();
        shapes
            .expect_create_shape()
            .times(1)
            .returning(|_| Err(RepositoryError::Storage("disk full".to_string())));
        let usecase = DrawShapeUseCase::new(Arc::new(shapes), Arc::new(FixedClock::new(0)));
        let principal = Principal::new(UserId::new(Uuid::new_v4()), "alice");

        // when (操作):
        let result = usecase
            .execute(
                &principal,
                RoomId::new(Uuid::new_v4()),
                ShapeId::new(Uuid::new_v4()),
                json!({}),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DrawShapeError::Storage(RepositoryError::Storage(
                "disk full".to_string()
            )))
        );
    }
}
