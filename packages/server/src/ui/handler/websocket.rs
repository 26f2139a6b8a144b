//! WebSocket connection handlers.
//!
//! 1 接続につき読み取りポンプと書き込みポンプの 2 タスクを起動する。
//!
//! - 読み取り: フレームごとに読み取り期限を延長し、ディスパッチャへ渡す
//! - 書き込み: 送信キューを順に書き出し、定期的に ping を送る
//!
//! 書き込み側が先に終われば読み取り側を止める。読み取り側が先に終われば
//! ハブから外した後に送信キューを閉じ、残りのフレームを書き出してから接続を閉じる。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::time::{Instant, interval_at, timeout};

use crate::{
    config::Timings,
    domain::{AuthError, Principal, SessionId},
    infrastructure::auth::credential_from_headers,
    realtime::{Dispatcher, Outcome, OutboundReceiver, Session, outbound_channel},
    ui::state::AppState,
};

/// Pre-upgrade status for a rejected credential
fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidSubject(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNAUTHORIZED,
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AuthError> {
    let token = credential_from_headers(headers).ok_or(AuthError::Missing)?;
    state.verifier.verify(&token)
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    // 認証に失敗した呼び出し元にはトランスポートを割り当てない
    let principal = match authenticate(&state, &headers) {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!("Rejected WebSocket upgrade: {}", e);
            return auth_status(&e).into_response();
        }
    };

    let max_size = state.timings.max_frame_size;
    ws.max_message_size(max_size)
        .max_frame_size(max_size)
        .on_upgrade(move |socket| handle_socket(socket, state, principal))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, principal: Principal) {
    let timings = state.timings;
    let (outbound, outbound_rx) = outbound_channel(timings.outbound_capacity);
    let session = Arc::new(Session::new(principal, outbound));
    tracing::info!(
        session_id = %session.id(),
        "New connection established for user {} ({})",
        session.principal().id,
        session.principal().name
    );

    let (sender, receiver) = socket.split();

    let mut send_task = tokio::spawn(write_pump(sender, outbound_rx, timings, session.id()));
    let mut recv_task = tokio::spawn(read_pump(
        receiver,
        state.dispatcher.clone(),
        session.clone(),
        timings.pong_wait,
    ));

    tokio::select! {
        _ = &mut recv_task => {
            // 先にハブから外し、キューはその後に閉じる
            state.dispatcher.disconnect(&session).await;
            // 積まれているフレーム（参加拒否のエラーなど）を書き出してから閉じる
            session.outbound().close();
            if timeout(timings.write_wait, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            recv_task.abort();
            state.dispatcher.disconnect(&session).await;
        }
    };
    tracing::info!(
        session_id = %session.id(),
        "Connection closed for user {} ({})",
        session.principal().id,
        session.principal().name
    );
}

async fn read_pump(
    mut receiver: SplitStream<WebSocket>,
    dispatcher: Arc<Dispatcher>,
    session: Arc<Session>,
    pong_wait: Duration,
) {
    loop {
        // どのフレーム（pong を含む）を受け取っても期限は延長される
        let msg = match timeout(pong_wait, receiver.next()).await {
            Err(_) => {
                tracing::info!(session_id = %session.id(), "Read deadline exceeded");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::warn!(session_id = %session.id(), "WebSocket error: {}", e);
                break;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        match msg {
            Message::Text(text) => {
                if dispatcher.dispatch(&session, text.as_str()).await == Outcome::Close {
                    break;
                }
            }
            Message::Binary(_) => {
                tracing::debug!(session_id = %session.id(), "Ignoring binary frame");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                tracing::info!(session_id = %session.id(), "Client requested close");
                break;
            }
        }
    }
    tracing::debug!(session_id = %session.id(), "Read pump stopped");
}

async fn write_pump(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: OutboundReceiver,
    timings: Timings,
    session_id: SessionId,
) {
    let mut ping = interval_at(Instant::now() + timings.ping_period, timings.ping_period);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = write(&mut sender, Message::Text(text.into()), timings.write_wait).await {
                        tracing::warn!(session_id = %session_id, "Write failed: {}", e);
                        break;
                    }
                }
                None => {
                    // キューが閉じられた（退去・参加拒否・読み取り終了）
                    let _ = write(&mut sender, Message::Close(None), timings.write_wait).await;
                    break;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = write(&mut sender, Message::Ping(Bytes::new()), timings.write_wait).await {
                    tracing::warn!(session_id = %session_id, "Ping failed: {}", e);
                    break;
                }
            }
        }
    }
    tracing::debug!(session_id = %session_id, "Write pump stopped");
}

async fn write(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: Message,
    deadline: Duration,
) -> Result<(), String> {
    match timeout(deadline, sender.send(msg)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("write deadline exceeded".to_string()),
    }
}
