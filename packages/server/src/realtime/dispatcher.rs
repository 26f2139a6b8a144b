//! Dispatcher: セッションの状態に応じた受信フレームの処理
//!
//! ```text
//! Connected --join(ok)--> Joined(room)
//! Joined(room) --user_left--> Connected
//! ```
//!
//! - `Connected`: `join` と `ping` のみ受け付け、それ以外は "Must join a room first"
//! - `Joined`: 描画・チャット・カーソルなどをハブへ流す。`join` は "Already joined a room"
//!
//! 1 つの不正なフレームでセッションは終了しない（ログとエラーフレームのみ）。
//! 例外は参加時の認可失敗で、エラーフレームを送った後に接続を閉じる。

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::domain::RoomId;
use crate::infrastructure::dto::websocket::{
    DrawBody, ErrorFrame, InboundFrame, InitialStateContent, InitialStateFrame, MessageKind,
    PongFrame, RoomRefBody, ShapeRefBody,
};
use crate::usecase::{
    DrawShapeUseCase, JoinRoomUseCase, RemoveOutcome, RemoveShapeUseCase, SendChatUseCase,
};

use super::hub::{BroadcastPayload, RoomHub};
use super::registry::HubRegistry;
use super::session::{Session, SessionState};

const MSG_INVALID_FORMAT: &str = "Invalid message format";
const MSG_MUST_JOIN: &str = "Must join a room first";
const MSG_ALREADY_JOINED: &str = "Already joined a room";
const MSG_NOT_AUTHORIZED: &str = "You are not authorized to join this room.";
const MSG_CANVAS_LOAD_FAILED: &str = "Could not load canvas history.";
const MSG_DRAW_FAILED: &str = "Could not save your drawing.";
const MSG_ROOM_GONE: &str = "Room no longer exists";

/// クライアントに返すエラー。値はそのままエラーフレームの文言になる
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Protocol(String),
    #[error("{0}")]
    Storage(String),
}

impl DispatchError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// フレーム処理後にセッションをどうするか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// 送信キューを閉じて接続を終える
    Close,
}

pub struct Dispatcher {
    registry: Arc<HubRegistry>,
    join_room: Arc<JoinRoomUseCase>,
    draw_shape: Arc<DrawShapeUseCase>,
    remove_shape: Arc<RemoveShapeUseCase>,
    send_chat: Arc<SendChatUseCase>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HubRegistry>,
        join_room: Arc<JoinRoomUseCase>,
        draw_shape: Arc<DrawShapeUseCase>,
        remove_shape: Arc<RemoveShapeUseCase>,
        send_chat: Arc<SendChatUseCase>,
    ) -> Self {
        Self {
            registry,
            join_room,
            draw_shape,
            remove_shape,
            send_chat,
        }
    }

    pub fn registry(&self) -> &Arc<HubRegistry> {
        &self.registry
    }

    /// 受信したテキストフレームを 1 つ処理する
    pub async fn dispatch(&self, session: &Arc<Session>, text: &str) -> Outcome {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(session_id = %session.id(), "Error parsing frame: {}", e);
                self.reply_error(session, &DispatchError::bad_request(MSG_INVALID_FORMAT))
                    .await;
                return Outcome::Continue;
            }
        };

        let state = session.state().await;
        tracing::debug!(
            session_id = %session.id(),
            user_id = %session.principal().id,
            "Session in state {:?} sent '{}' frame",
            state,
            frame.kind.as_str()
        );

        let result = match state {
            SessionState::Connected => self.dispatch_connected(session, &frame).await,
            SessionState::Joined(room_id) => self.dispatch_joined(session, room_id, frame).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.reply_error(session, &err).await;
                match err {
                    DispatchError::Forbidden(_) => Outcome::Close,
                    _ => Outcome::Continue,
                }
            }
        }
    }

    /// セッション終了時の後片付け。何度呼んでもよい
    pub async fn disconnect(&self, session: &Arc<Session>) {
        if let Some(room_id) = session.leave().await {
            self.registry.leave(room_id, session.clone()).await;
        }
    }

    async fn dispatch_connected(
        &self,
        session: &Arc<Session>,
        frame: &InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        match frame.kind {
            MessageKind::Join => self.handle_join(session, frame).await,
            MessageKind::Ping => self.reply_pong(session).await,
            _ => Err(DispatchError::protocol(MSG_MUST_JOIN)),
        }
    }

    async fn dispatch_joined(
        &self,
        session: &Arc<Session>,
        room_id: RoomId,
        frame: InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        match frame.kind {
            MessageKind::Ping => self.reply_pong(session).await,
            MessageKind::Join => Err(DispatchError::protocol(MSG_ALREADY_JOINED)),
            MessageKind::Chat => self.handle_chat(session, room_id, frame.body).await,
            MessageKind::Draw => self.handle_draw(session, room_id, frame).await,
            MessageKind::Undo | MessageKind::Erase => {
                self.handle_remove(session, room_id, frame).await
            }
            MessageKind::PencilChunk | MessageKind::CursorMove => {
                self.relay(session, room_id, frame).await
            }
            MessageKind::UserLeft => self.handle_leave(session, room_id, &frame).await,
            kind => {
                tracing::warn!(
                    session_id = %session.id(),
                    "Unknown message type '{}' from user {}",
                    kind.as_str(),
                    session.principal().id
                );
                Ok(Outcome::Continue)
            }
        }
    }

    async fn handle_join(
        &self,
        session: &Arc<Session>,
        frame: &InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        let RoomRefBody { room_id } = parse_body(frame)?;
        let principal = session.principal();
        tracing::info!(
            session_id = %session.id(),
            "User {} attempting to join room {}",
            principal.id,
            room_id
        );

        // 認可が通るまでハブには触れない（非メンバーがハブを作らない）
        if let Err(err) = self.join_room.authorize(principal, room_id).await {
            tracing::warn!(
                session_id = %session.id(),
                "Unauthorized join attempt: {}",
                err
            );
            return Err(DispatchError::Forbidden(MSG_NOT_AUTHORIZED.to_string()));
        }

        if !session.enter(room_id).await {
            return Err(DispatchError::protocol(MSG_ALREADY_JOINED));
        }
        // 登録が反映されてからキャンバスを読む。読み込み後に確定した描画は配信で届く
        self.registry.join(room_id, session.clone()).await;

        let shapes = match self.join_room.load_canvas(room_id).await {
            Ok(shapes) => shapes,
            Err(err) => {
                // 参加は維持する（以降の配信は届く）
                tracing::error!(session_id = %session.id(), "Join failed: {}", err);
                return Err(DispatchError::Storage(MSG_CANVAS_LOAD_FAILED.to_string()));
            }
        };

        let payloads: Vec<&Value> = shapes.iter().map(|shape| &shape.payload).collect();
        let initial_state = InitialStateFrame {
            kind: MessageKind::InitialState,
            content: InitialStateContent {
                shapes: payloads,
                user: principal.into(),
            },
        };
        self.reply(session, &initial_state).await;
        Ok(Outcome::Continue)
    }

    async fn handle_chat(
        &self,
        session: &Arc<Session>,
        room_id: RoomId,
        body: Value,
    ) -> Result<Outcome, DispatchError> {
        let hub = self.hub(room_id).await?;
        if let Err(e) = self
            .send_chat
            .execute(session.principal(), room_id, body.clone())
            .await
        {
            // チャットの永続化失敗は配信を止めない
            tracing::error!(room_id = %room_id, "Failed to persist chat message: {}", e);
        }
        self.broadcast(&hub, session, MessageKind::Chat, body).await;
        Ok(Outcome::Continue)
    }

    async fn handle_draw(
        &self,
        session: &Arc<Session>,
        room_id: RoomId,
        frame: InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        let hub = self.hub(room_id).await?;
        let DrawBody { id } = parse_body(&frame)?;

        // 永続化が終わってから配信する（配信順 = コミット順）
        if let Err(e) = self
            .draw_shape
            .execute(session.principal(), room_id, id, frame.body.clone())
            .await
        {
            tracing::error!(room_id = %room_id, shape_id = %id, "Failed to persist shape: {}", e);
            return Err(DispatchError::Storage(MSG_DRAW_FAILED.to_string()));
        }

        self.broadcast(&hub, session, MessageKind::Draw, frame.body)
            .await;
        Ok(Outcome::Continue)
    }

    async fn handle_remove(
        &self,
        session: &Arc<Session>,
        room_id: RoomId,
        frame: InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        let hub = self.hub(room_id).await?;
        let ShapeRefBody { shape_id } = parse_body(&frame)?;

        match self.remove_shape.execute(shape_id).await {
            Ok(RemoveOutcome::Removed) => {}
            Ok(RemoveOutcome::AlreadyGone) => {
                tracing::debug!(shape_id = %shape_id, "Shape already removed");
            }
            // クライアントは既に消しているので、失敗しても他の参加者には配信する
            Err(e) => {
                tracing::error!(shape_id = %shape_id, "Failed to delete shape: {}", e);
            }
        }

        let body = serde_json::json!({ "shapeID": shape_id });
        self.broadcast(&hub, session, frame.kind, body).await;
        Ok(Outcome::Continue)
    }

    async fn relay(
        &self,
        session: &Arc<Session>,
        room_id: RoomId,
        frame: InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        match self.registry.get(room_id).await {
            Some(hub) => {
                self.broadcast(&hub, session, frame.kind, frame.body).await;
            }
            None => {
                tracing::debug!(room_id = %room_id, "Dropping '{}' for a vanished room", frame.kind.as_str());
            }
        }
        Ok(Outcome::Continue)
    }

    /// 退出はセッションが参加中のルームに対して行う。本文の `roomID` が
    /// 別のルームを指していても、参加中のルームに取り残されないようにする
    async fn handle_leave(
        &self,
        session: &Arc<Session>,
        room_id: RoomId,
        frame: &InboundFrame,
    ) -> Result<Outcome, DispatchError> {
        let RoomRefBody { room_id: requested } = parse_body(frame)?;
        if requested != room_id {
            tracing::warn!(
                session_id = %session.id(),
                "Leave requested for room {} while joined to {}",
                requested,
                room_id
            );
        }

        tracing::info!(
            session_id = %session.id(),
            "User {} leaving room {}",
            session.principal().id,
            room_id
        );
        session.leave().await;
        self.registry.leave(room_id, session.clone()).await;
        Ok(Outcome::Continue)
    }

    async fn hub(&self, room_id: RoomId) -> Result<Arc<RoomHub>, DispatchError> {
        self.registry
            .get(room_id)
            .await
            .ok_or_else(|| DispatchError::protocol(MSG_ROOM_GONE))
    }

    async fn broadcast(&self, hub: &RoomHub, session: &Session, kind: MessageKind, body: Value) {
        let payload = BroadcastPayload {
            kind,
            sender: session.principal().clone(),
            origin: session.id(),
            body,
        };
        if let Err(e) = hub.broadcast(payload).await {
            tracing::warn!(room_id = %hub.room_id(), "Broadcast dropped: {}", e);
        }
    }

    async fn reply_pong(&self, session: &Session) -> Result<Outcome, DispatchError> {
        self.reply(session, &PongFrame::default()).await;
        Ok(Outcome::Continue)
    }

    async fn reply_error(&self, session: &Session, err: &DispatchError) {
        let message = err.to_string();
        self.reply(session, &ErrorFrame::new(&message)).await;
    }

    /// セッション自身への直接の返信
    async fn reply<T: serde::Serialize>(&self, session: &Session, frame: &T) {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session_id = %session.id(), "Failed to serialize reply: {}", e);
                return;
            }
        };
        if let Err(e) = session.outbound().push(text).await {
            tracing::debug!(session_id = %session.id(), "Reply dropped: {}", e);
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(frame: &InboundFrame) -> Result<T, DispatchError> {
    frame.parse_body().map_err(|e| {
        DispatchError::bad_request(format!(
            "Invalid {} message: {}",
            frame.kind.as_str(),
            e
        ))
    })
}
