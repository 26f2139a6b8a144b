//! UseCase: 図形の削除（Undo / Erase）
//!
//! クライアントは既に図形を消しているため、存在しない図形の削除は
//! エラーではなく `AlreadyGone` として扱う。

use std::sync::Arc;

use crate::domain::{RepositoryError, ShapeId, ShapeRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    AlreadyGone,
}

/// 図形削除のユースケース
pub struct RemoveShapeUseCase {
    shapes: Arc<dyn ShapeRepository>,
}

impl RemoveShapeUseCase {
    pub fn new(shapes: Arc<dyn ShapeRepository>) -> Self {
        Self { shapes }
    }

    pub async fn execute(&self, shape_id: ShapeId) -> Result<RemoveOutcome, RepositoryError> {
        match self.shapes.delete_shape(shape_id).await {
            Ok(()) => Ok(RemoveOutcome::Removed),
            Err(RepositoryError::NotFound(_)) => Ok(RemoveOutcome::AlreadyGone),
            Err(err) => Err(err),
        }
    }
}
