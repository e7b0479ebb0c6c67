pub mod parallel;

pub use parallel::{ParallelBatchWriter, WriteTarget};
