//! Infrastructure layer: credential verification, wire DTOs and stores.

pub mod auth;
pub mod dto;
pub mod repository;
