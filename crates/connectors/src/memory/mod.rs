pub mod connector;
pub mod store;

pub use connector::MemoryConnector;
pub use store::MemoryStore;
