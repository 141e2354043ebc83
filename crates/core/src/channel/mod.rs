//! Connected channel registry and connection lifecycle.

mod registry;
mod sqlite;
mod types;

pub use registry::{ChannelError, ChannelFilter, ChannelRegistry};
pub use sqlite::SqliteChannelRegistry;
pub use types::{Channel, ConnectionStatus, Platform};
