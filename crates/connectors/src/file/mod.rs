//! JSON-lines directory connector: each table is `<dir>/<table>.jsonl`.

pub mod jsonl;

pub use jsonl::JsonFileConnector;
