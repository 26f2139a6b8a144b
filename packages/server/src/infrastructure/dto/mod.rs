//! Data Transfer Objects (DTOs) for the whiteboard backend.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs (both directions)
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
