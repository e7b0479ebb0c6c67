pub mod coordinator;
pub mod error;
pub mod picker;
pub mod transform;
pub mod writer;

pub use coordinator::{CoordinatorDeps, SyncCoordinator, SyncOutcome};
pub use error::{SyncError, TransformError};
