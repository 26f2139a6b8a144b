//! Kokuban realtime collaboration server.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=secret cargo run --bin kokuban-server
//! JWT_SECRET=secret cargo run --bin kokuban-server -- --host 0.0.0.0 --port 8082 \
//!     --database-url sqlite://kokuban.db
//! ```

use std::sync::Arc;

use clap::Parser;
use kokuban_server::{
    config::{ServerConfig, Timings},
    infrastructure::{
        auth::JwtVerifier,
        repository::{SqliteStore, Stores},
    },
    realtime::{Dispatcher, HubRegistry},
    ui::Server,
    usecase::{DrawShapeUseCase, JoinRoomUseCase, RemoveShapeUseCase, SendChatUseCase},
};
use kokuban_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. Stores
    // 2. Credential verifier
    // 3. UseCases
    // 4. Hub registry + dispatcher
    // 5. Server

    // 1. Stores (SQLite when configured, in-memory otherwise)
    let stores = match &config.database_url {
        Some(url) => Stores::sqlite(&SqliteStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL is not set; using in-memory stores");
            Stores::in_memory()
        }
    };

    // 2. Credential verifier
    let verifier = Arc::new(JwtVerifier::new(config.jwt_secret.as_bytes()));

    // 3. UseCases
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let join_room = Arc::new(JoinRoomUseCase::new(
        stores.memberships.clone(),
        stores.shapes.clone(),
    ));
    let draw_shape = Arc::new(DrawShapeUseCase::new(stores.shapes.clone(), clock.clone()));
    let remove_shape = Arc::new(RemoveShapeUseCase::new(stores.shapes.clone()));
    let send_chat = Arc::new(SendChatUseCase::new(stores.chats.clone(), clock.clone()));

    // 4. Hub registry + dispatcher
    let timings = Timings::default();
    let registry = Arc::new(HubRegistry::new(timings, clock));
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        join_room,
        draw_shape,
        remove_shape,
        send_chat,
    ));

    // 5. Create and run the server
    let server = Server::new(dispatcher, verifier, timings);
    server.run(config.host, config.port).await
}
