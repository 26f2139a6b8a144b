//! HTTP / WebSocket handlers.

pub mod http;
pub mod websocket;

pub use http::{debug_hubs, health_check};
pub use websocket::websocket_handler;
