//! Domain layer: connection identity and the registry of open connections.

pub mod connection_id;
pub mod connection_registry;

pub use connection_id::ConnectionId;
pub use connection_registry::{ConnectionInfo, ConnectionRegistry};
