pub mod field;
pub mod value;
