//! Server configuration.

use std::time::Duration;

use clap::Parser;

/// Command line / environment configuration of the server binary
#[derive(Parser, Debug, Clone)]
#[command(name = "kokuban-server")]
#[command(about = "Real-time collaboration hub for the Kokuban whiteboard", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KOKUBAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "KOKUBAN_PORT", default_value = "8082")]
    pub port: u16,

    /// HMAC key used to verify credential cookies
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// SQLite database URL (e.g. sqlite://kokuban.db); in-memory stores when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Default log level (RUST_LOG overrides)
    #[arg(long, env = "KOKUBAN_LOG", default_value = "info")]
    pub log_level: String,
}

/// Deadlines, periods and queue capacities of the realtime core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Ping period of the write pump (0.9 × `pong_wait`)
    pub ping_period: Duration,
    /// Read deadline, refreshed by every inbound frame
    pub pong_wait: Duration,
    /// Deadline of a single transport write
    pub write_wait: Duration,
    /// Period of the hub statistics log
    pub stats_period: Duration,
    /// Period of the idle hub reaper
    pub reaper_period: Duration,
    /// Maximum size of one inbound frame in bytes
    pub max_frame_size: usize,
    pub outbound_capacity: usize,
    pub broadcast_capacity: usize,
    pub register_capacity: usize,
    pub unregister_capacity: usize,
}

impl Default for Timings {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            ping_period: pong_wait * 9 / 10,
            pong_wait,
            write_wait: Duration::from_secs(10),
            stats_period: Duration::from_secs(30),
            reaper_period: Duration::from_secs(5 * 60),
            max_frame_size: 512_000,
            outbound_capacity: 256,
            broadcast_capacity: 100,
            register_capacity: 10,
            unregister_capacity: 10,
        }
    }
}
