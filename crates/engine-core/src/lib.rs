pub mod audit;
pub mod cache;
pub mod error;
pub mod event_bus;
pub mod metrics;
pub mod pool;
pub mod settings;
