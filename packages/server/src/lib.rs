//! Kokuban realtime collaboration server.
//!
//! Multi-user whiteboard + chat hub: authenticated WebSocket sessions join
//! rooms, and every room has a hub that fans drawing, chat and cursor
//! events out to the other members while the canvas is persisted.

// layers
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod realtime;
pub mod ui;
pub mod usecase;
