pub mod connection;
pub mod events;

pub use connection::{BlockStream, BridgeEventStream, ChainConnection, ConnectionError};
pub use events::{BlockEvent, BridgeEvent};
