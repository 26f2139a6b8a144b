//! Utilities shared by the Kokuban binaries.

pub mod logger;
pub mod time;
