//! Outbound: セッションごとの送信キュー
//!
//! 送り手は複数（セッション自身のディスパッチャ、ルームのハブ）で、
//! 受け手は書き込みポンプ 1 つだけ。ハブは他の送り手が送信側を保持したまま
//! キューを閉じる必要があるため、クローズは明示的なフラグで表す。
//!
//! クローズ時点で積まれていたフレームは届き、その後に受信側は終端を受け取る。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Notify, mpsc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("outbound queue is full")]
    Full,
    #[error("outbound queue is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Closer {
    closed: AtomicBool,
    notify: Notify,
}

/// 送信キューの送り手側
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<String>,
    closer: Arc<Closer>,
}

/// 受け手側（書き込みポンプが所有する）
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::Receiver<String>,
    closer: Arc<Closer>,
}

/// 容量付きの送信キューを作成
pub fn outbound_channel(capacity: usize) -> (Outbound, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let closer = Arc::new(Closer::default());
    (
        Outbound {
            tx,
            closer: closer.clone(),
        },
        OutboundReceiver { rx, closer },
    )
}

impl Outbound {
    /// 待たずに積む。ハブの fan-out 用
    pub fn try_push(&self, frame: String) -> Result<(), PushError> {
        if self.is_closed() {
            return Err(PushError::Closed);
        }
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PushError::Full,
            mpsc::error::TrySendError::Closed(_) => PushError::Closed,
        })
    }

    /// 空きができるまで待って積む。本人への直接の返信用
    pub async fn push(&self, frame: String) -> Result<(), PushError> {
        if self.is_closed() {
            return Err(PushError::Closed);
        }
        self.tx.send(frame).await.map_err(|_| PushError::Closed)
    }

    /// キューを閉じる。実際に閉じた呼び出しだけが `true` を返す
    pub fn close(&self) -> bool {
        if self.closer.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.closer.notify.notify_one();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closer.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    /// 書き込み待ちのフレーム数
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl OutboundReceiver {
    /// 次のフレーム。閉じられて空になった後は `None`
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            if self.closer.closed.load(Ordering::Acquire) {
                return self.rx.try_recv().ok();
            }
            tokio::select! {
                biased;
                frame = self.rx.recv() => return frame,
                _ = self.closer.notify.notified() => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_are_delivered_in_order() {
        // テスト項目: キューに入れた順に取り出される
        // given (前提条件):
        let (outbound, mut receiver) = outbound_channel(4);

        // when (操作):
        outbound.try_push("a".to_string()).unwrap();
        outbound.push("b".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(receiver.recv().await.as_deref(), Some("a"));
        assert_eq!(receiver.recv().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_try_push_reports_full() {
        // テスト項目: 容量いっぱいのキューへの try_push は Full
        // given (前提条件):
        let (outbound, _receiver) = outbound_channel(2);
        outbound.try_push("1".to_string()).unwrap();
        outbound.try_push("2".to_string()).unwrap();

        // when (操作):
        let result = outbound.try_push("3".to_string());

        // then (期待する結果):
        assert_eq!(result, Err(PushError::Full));
        assert_eq!(outbound.len(), 2);
        assert_eq!(outbound.capacity(), 2);
    }

    #[tokio::test]
    async fn test_close_flushes_pending_frames_then_ends() {
        // テスト項目: クローズ前に積まれたフレームは届き、その後 None になる
        // given (前提条件):
        let (outbound, mut receiver) = outbound_channel(4);
        let producer = outbound.clone();
        outbound.try_push("error".to_string()).unwrap();

        // when (操作):
        let first_close = outbound.close();
        let second_close = producer.close();

        // then (期待する結果):
        assert!(first_close);
        assert!(!second_close);
        assert_eq!(receiver.recv().await.as_deref(), Some("error"));
        assert_eq!(receiver.recv().await, None);
        assert_eq!(producer.try_push("late".to_string()), Err(PushError::Closed));
    }

    #[tokio::test]
    async fn test_close_wakes_a_waiting_receiver() {
        // テスト項目: 待機中の受信側がクローズで起こされる
        // given (前提条件):
        let (outbound, mut receiver) = outbound_channel(4);
        let waiter = tokio::spawn(async move { receiver.recv().await });

        // when (操作):
        tokio::task::yield_now().await;
        outbound.close();

        // then (期待する結果):
        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_means_closed() {
        // テスト項目: 受信側が無くなったキューは Closed を返す
        // given (前提条件):
        let (outbound, receiver) = outbound_channel(4);

        // when (操作):
        drop(receiver);

        // then (期待する結果):
        assert!(outbound.is_closed());
        assert_eq!(outbound.try_push("x".to_string()), Err(PushError::Closed));
    }
}
