//! Seed a room membership and mint a credential for it.
//!
//! The REST surface that normally writes memberships and issues tokens is not
//! part of this server; this tool covers local development.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=secret cargo run --bin kokuban-seed -- \
//!     --database-url sqlite://kokuban.db --name alice
//! ```

use clap::Parser;
use kokuban_server::{
    domain::{Membership, MembershipRepository, MembershipRole, Principal, RoomId, UserId},
    infrastructure::{
        auth::{CREDENTIAL_COOKIE, JwtVerifier, TOKEN_TTL_SECS},
        repository::SqliteStore,
    },
};
use kokuban_shared::{
    logger::setup_logger,
    time::{millis_to_rfc3339, unix_millis},
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "kokuban-seed")]
#[command(about = "Add a room member and print a credential cookie for it", long_about = None)]
struct Args {
    /// SQLite database URL shared with the server
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// HMAC key shared with the server
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Display name of the user
    #[arg(long)]
    name: String,

    /// Existing user id; a new one is generated when omitted
    #[arg(long)]
    user_id: Option<String>,

    /// Existing room id; a new one is generated when omitted
    #[arg(long)]
    room_id: Option<String>,

    /// creator, admin or member
    #[arg(long, default_value = "member")]
    role: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("Seed error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = match &args.user_id {
        Some(raw) => UserId::parse(raw)?,
        None => UserId::new(Uuid::new_v4()),
    };
    let room_id = match &args.room_id {
        Some(raw) => RoomId::parse(raw)?,
        None => RoomId::new(Uuid::new_v4()),
    };
    let role = MembershipRole::parse(&args.role)
        .ok_or_else(|| format!("unknown role '{}'", args.role))?;

    let store = SqliteStore::connect(&args.database_url).await?;
    store
        .memberships()
        .add_member(Membership {
            user_id,
            room_id,
            role,
        })
        .await?;

    let principal = Principal::new(user_id, args.name);
    let issued_at = u64::try_from(unix_millis() / 1000)?;
    let token = JwtVerifier::new(args.jwt_secret.as_bytes()).issue(&principal, issued_at)?;

    println!("user_id = {}", user_id);
    println!("room_id = {}", room_id);
    println!("cookie  = {}={}", CREDENTIAL_COOKIE, token);
    let expires_millis = i64::try_from((issued_at + TOKEN_TTL_SECS) * 1000)?;
    if let Some(expires) = millis_to_rfc3339(expires_millis) {
        println!("expires = {}", expires);
    }
    Ok(())
}
