//! Command maps shared by all connectors.
//!
//! A command is built once per job from the field correspondences and then
//! handed back to the connector on every read and write.

use crate::{connector::CommandSpec, error::ConnectorError};
use model::transform::filter::Filter;
use std::collections::HashMap;

pub const SOURCE_TABLE: &str = "SOURCE_TABLE";
pub const SOURCE_COLUMNS: &str = "SOURCE_COLUMNS";
pub const TARGET_TABLE: &str = "TARGET_TABLE";
pub const TARGET_COLUMNS: &str = "TARGET_COLUMNS";
pub const PRIMARY_KEY: &str = "PRIMARY_KEY";
pub const QUERY: &str = "QUERY";
pub const QUERY_COUNT: &str = "QUERY_COUNT";
pub const INSERT: &str = "INSERT";
pub const UPDATE: &str = "UPDATE";
pub const DELETE: &str = "DELETE";

pub trait Dialect: Send + Sync {
    /// Wraps an identifier in the dialect's quotation marks.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the zero-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;
}

/// ANSI quoting with `?` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl Dialect for Ansi {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{ident}""#)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".into()
    }
}

/// Keys the target connector owns when source and target commands are merged.
pub const WRITE_KEYS: [&str; 6] = [
    TARGET_TABLE,
    TARGET_COLUMNS,
    PRIMARY_KEY,
    INSERT,
    UPDATE,
    DELETE,
];

/// Read keys from the source connector's command, write keys from the
/// target's.
pub fn merge(
    mut source: HashMap<String, String>,
    mut target: HashMap<String, String>,
) -> HashMap<String, String> {
    for key in WRITE_KEYS {
        match target.remove(key) {
            Some(value) => {
                source.insert(key.to_string(), value);
            }
            None => {
                source.remove(key);
            }
        }
    }
    source
}

/// Builds the standard command map for a source/target pair.
pub fn build(
    dialect: &dyn Dialect,
    source: &CommandSpec,
    target: &CommandSpec,
) -> HashMap<String, String> {
    let q = |s: &str| dialect.quote_identifier(s);
    let src_cols: Vec<&str> = source.columns.iter().map(|c| c.name.as_str()).collect();
    let dst_cols: Vec<&str> = target.columns.iter().map(|c| c.name.as_str()).collect();
    let pks = target.primary_keys();

    let mut command = HashMap::new();
    command.insert(SOURCE_TABLE.into(), source.table.clone());
    command.insert(SOURCE_COLUMNS.into(), src_cols.join(","));
    command.insert(TARGET_TABLE.into(), target.table.clone());
    command.insert(TARGET_COLUMNS.into(), dst_cols.join(","));
    command.insert(PRIMARY_KEY.into(), pks.join(","));

    let select_list = if src_cols.is_empty() {
        "*".to_string()
    } else {
        src_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ")
    };
    let where_clause = render_where(dialect, &source.filters);
    command.insert(
        QUERY.into(),
        format!(
            "SELECT {select_list} FROM {}{where_clause} LIMIT {} OFFSET {}",
            q(&source.table),
            dialect.placeholder(0),
            dialect.placeholder(1)
        ),
    );
    command.insert(
        QUERY_COUNT.into(),
        format!("SELECT COUNT(*) FROM {}{where_clause}", q(&source.table)),
    );

    let placeholders: Vec<String> = (0..dst_cols.len()).map(|i| dialect.placeholder(i)).collect();
    command.insert(
        INSERT.into(),
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            q(&target.table),
            dst_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", "),
            placeholders.join(", ")
        ),
    );

    if !pks.is_empty() {
        let non_keys: Vec<&str> = dst_cols.iter().copied().filter(|c| !pks.contains(c)).collect();
        let set_list = non_keys
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", q(c), dialect.placeholder(i)))
            .collect::<Vec<_>>()
            .join(", ");
        let key_match = |offset: usize| {
            pks.iter()
                .enumerate()
                .map(|(i, c)| format!("{} = {}", q(c), dialect.placeholder(offset + i)))
                .collect::<Vec<_>>()
                .join(" AND ")
        };
        command.insert(
            UPDATE.into(),
            format!(
                "UPDATE {} SET {set_list} WHERE {}",
                q(&target.table),
                key_match(non_keys.len())
            ),
        );
        command.insert(
            DELETE.into(),
            format!("DELETE FROM {} WHERE {}", q(&target.table), key_match(0)),
        );
    }

    command
}

fn render_where(dialect: &dyn Dialect, filters: &[Filter]) -> String {
    use model::transform::filter::FilterLogic;

    let render = |f: &Filter| {
        format!(
            "{} {} '{}'",
            dialect.quote_identifier(&f.name),
            f.operation.as_sql(),
            f.value.replace('\'', "''")
        )
    };
    let ands: Vec<String> = filters
        .iter()
        .filter(|f| f.logic == FilterLogic::And)
        .map(render)
        .collect();
    let ors: Vec<String> = filters
        .iter()
        .filter(|f| f.logic == FilterLogic::Or)
        .map(render)
        .collect();

    let mut clauses = ands;
    if !ors.is_empty() {
        clauses.push(format!("({})", ors.join(" OR ")));
    }
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

pub fn required<'a>(
    command: &'a HashMap<String, String>,
    key: &'static str,
) -> Result<&'a str, ConnectorError> {
    command
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(ConnectorError::MissingCommand(key))
}

/// Comma-separated column list stored under `key`, empty when absent.
pub fn columns(command: &HashMap<String, String>, key: &str) -> Vec<String> {
    command
        .get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
