//! Row-level helpers shared by the in-process and file connectors.

use crate::connector::ReadResult;
use model::{
    core::{field::Field, value::Value},
    records::record::Record,
    transform::filter::Filter,
};

/// Primary-key tuple of a record, `None` when any key column is missing or null.
pub(crate) fn key_of(record: &Record, pks: &[String]) -> Option<Vec<String>> {
    pks.iter()
        .map(|pk| {
            record
                .get(pk)
                .filter(|v| !v.is_null())
                .and_then(Value::as_string)
        })
        .collect()
}

/// Inserts `record`, replacing the row that shares its key.
/// Without key columns every write appends.
pub(crate) fn upsert(rows: &mut Vec<Record>, pks: &[String], record: Record) -> Result<(), String> {
    if pks.is_empty() {
        rows.push(record);
        return Ok(());
    }

    let key = key_of(&record, pks).ok_or_else(|| missing_key(pks))?;
    match rows
        .iter_mut()
        .find(|row| key_of(row, pks).as_ref() == Some(&key))
    {
        Some(existing) => *existing = record,
        None => rows.push(record),
    }
    Ok(())
}

/// Removes the row matching `record`'s key. Only key columns are consulted.
pub(crate) fn delete(rows: &mut Vec<Record>, pks: &[String], record: &Record) -> Result<bool, String> {
    if pks.is_empty() {
        return Err("delete requires a primary key".to_string());
    }
    let key = key_of(record, pks).ok_or_else(|| missing_key(pks))?;
    let before = rows.len();
    rows.retain(|row| key_of(row, pks).as_ref() != Some(&key));
    Ok(rows.len() != before)
}

/// Keeps only `columns` when any are named.
pub(crate) fn project(record: &Record, columns: &[String]) -> Record {
    if columns.is_empty() {
        return record.clone();
    }
    record
        .iter()
        .filter(|(name, _)| columns.iter().any(|c| c == name))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Filters then slices one 1-based page.
pub(crate) fn page<'a>(
    rows: impl IntoIterator<Item = &'a Record>,
    filters: &[Filter],
    columns: &[String],
    page_index: u64,
    page_size: usize,
) -> ReadResult {
    let skip = usize::try_from(page_index.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .saturating_mul(page_size);
    let mut scanned = 0u64;
    let records = rows
        .into_iter()
        .inspect(|_| scanned += 1)
        .filter(|row| Filter::evaluate(filters, row))
        .skip(skip)
        .take(page_size)
        .map(|row| project(row, columns))
        .collect();

    ReadResult { records, scanned }
}

/// Key columns from the command, falling back to the fields flagged as keys.
pub(crate) fn primary_keys(declared: Vec<String>, fields: &[Field]) -> Vec<String> {
    if !declared.is_empty() {
        return declared;
    }
    fields
        .iter()
        .filter(|f| f.pk)
        .map(|f| f.name.clone())
        .collect()
}

fn missing_key(pks: &[String]) -> String {
    format!("missing primary key value for [{}]", pks.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk() -> Vec<String> {
        vec!["id".to_string()]
    }

    #[test]
    fn upsert_replaces_by_key() {
        let mut rows = Vec::new();
        upsert(&mut rows, &pk(), Record::new().with("id", 1).with("v", "a")).unwrap();
        upsert(&mut rows, &pk(), Record::new().with("id", 1).with("v", "b")).unwrap();
        upsert(&mut rows, &pk(), Record::new().with("id", 2).with("v", "c")).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("v"), Some(&Value::from("b")));
    }

    #[test]
    fn upsert_without_key_value_fails() {
        let mut rows = Vec::new();
        let err = upsert(&mut rows, &pk(), Record::new().with("v", "a")).unwrap_err();
        assert!(err.contains("missing primary key"));
        assert!(rows.is_empty());
    }

    #[test]
    fn delete_only_needs_key_columns() {
        let mut rows = vec![Record::new().with("id", 1).with("v", "a")];
        assert!(delete(&mut rows, &pk(), &Record::new().with("id", 1)).unwrap());
        assert!(rows.is_empty());
    }

    #[test]
    fn page_slices_after_filtering() {
        let rows: Vec<Record> = (1..=25).map(|i| Record::new().with("id", i)).collect();

        let second = page(&rows, &[], &[], 2, 10);
        assert_eq!(second.records.len(), 10);
        assert_eq!(second.records[0].get("id"), Some(&Value::Int(11)));

        let past_end = page(&rows, &[], &[], 4, 10);
        assert!(past_end.records.is_empty());
    }

    #[test]
    fn huge_page_index_reads_nothing() {
        let rows: Vec<Record> = (1..=5).map(|i| Record::new().with("id", i)).collect();

        let result = page(&rows, &[], &[], u64::MAX, 1_000);
        assert!(result.records.is_empty());
        assert_eq!(result.scanned, 5);
    }
}
