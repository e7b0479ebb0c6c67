pub mod command;
pub mod connector;
pub mod error;
pub mod factory;
pub mod file;
pub mod memory;
mod rows;

pub use connector::{CommandSpec, DataConnector, ReadRequest, ReadResult};
pub use error::ConnectorError;
pub use factory::ConnectorFactory;
