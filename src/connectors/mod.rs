pub mod mock;

pub use mock::{MockChainConnection, MockChainHandle};
