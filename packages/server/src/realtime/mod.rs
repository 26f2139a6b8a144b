//! Realtime core: sessions, per-room hubs and the hub registry.

pub mod dispatcher;
pub mod hub;
pub mod outbound;
pub mod registry;
pub mod session;

pub use dispatcher::{DispatchError, Dispatcher, Outcome};
pub use hub::{BroadcastPayload, HubClosed, HubSnapshot, QueueStat, RoomHub};
pub use outbound::{Outbound, OutboundReceiver, PushError, outbound_channel};
pub use registry::HubRegistry;
pub use session::{Session, SessionState};
