//! Shared application state.

use std::sync::Arc;

use crate::config::Timings;
use crate::domain::CredentialVerifier;
use crate::realtime::{Dispatcher, HubRegistry};

/// Shared application state
pub struct AppState {
    /// 受信フレームの状態機械
    pub dispatcher: Arc<Dispatcher>,
    /// ルーム ID → ハブ
    pub registry: Arc<HubRegistry>,
    /// クレデンシャル Cookie の検証
    pub verifier: Arc<dyn CredentialVerifier>,
    pub timings: Timings,
}
