//! UseCase: ルーム参加処理
//!
//! ### 何をテストしているか
//! - メンバーシップの確認（認可）と、キャンバス（図形一覧）の読み込み
//! - 2 つは分かれており、間にハブへの登録が入る
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーが参加し、作成順の図形一覧を受け取る
//! - 異常系：非メンバー、メンバーシップ確認の失敗、図形読み込みの失敗

use std::sync::Arc;

use crate::domain::{MembershipRepository, Principal, RoomId, Shape, ShapeRepository};

use super::error::JoinRoomError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    memberships: Arc<dyn MembershipRepository>,
    shapes: Arc<dyn ShapeRepository>,
}

impl JoinRoomUseCase {
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        shapes: Arc<dyn ShapeRepository>,
    ) -> Self {
        Self {
            memberships,
            shapes,
        }
    }

    /// 参加を認可する。ハブへの登録より前に呼ぶ
    ///
    /// # Returns
    ///
    /// * `Ok(())` - メンバーである
    /// * `Err(JoinRoomError)` - 非メンバー、またはメンバーシップ確認の失敗
    pub async fn authorize(
        &self,
        principal: &Principal,
        room_id: RoomId,
    ) -> Result<(), JoinRoomError> {
        // 失敗・エラーのどちらでも参加させない
        let is_member = self
            .memberships
            .is_member(principal.id, room_id)
            .await
            .map_err(JoinRoomError::MembershipLookup)?;
        if !is_member {
            return Err(JoinRoomError::NotAuthorized {
                user_id: principal.id,
                room_id,
            });
        }
        Ok(())
    }

    /// 初期表示用の図形一覧（作成順）を読み込む
    ///
    /// ハブへの登録が反映された後に呼ぶこと。読み込み後に確定した描画は
    /// ブロードキャストで届くため、取りこぼしが無い（重複は図形 ID で吸収される）。
    pub async fn load_canvas(&self, room_id: RoomId) -> Result<Vec<Shape>, JoinRoomError> {
        self.shapes
            .list_by_room(room_id)
            .await
            .map_err(JoinRoomError::LoadCanvas)
    }
}
