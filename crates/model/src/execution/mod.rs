pub mod audit;
pub mod write_result;
