pub mod connector;
pub mod core;
pub mod error;
pub mod events;
pub mod execution;
pub mod progress;
pub mod records;
pub mod transform;
