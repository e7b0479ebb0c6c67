#![allow(dead_code)]

pub mod utils;

/// Dataset backing the source connector.
const SOURCE_DATASET: &str = "crm";
/// Dataset backing the target connector.
const TARGET_DATASET: &str = "warehouse";

const SOURCE_CONNECTOR: &str = "crm-src";
const TARGET_CONNECTOR: &str = "warehouse-dst";
const META_ID: &str = "meta-users";
