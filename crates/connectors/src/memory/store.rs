use model::{core::field::Field, records::record::Record};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct MemTable {
    pub columns: Vec<Field>,
    pub rows: Vec<Record>,
}

type Datasets = HashMap<String, HashMap<String, MemTable>>;

/// Shared in-process tables, grouped by dataset name.
///
/// Cloning the store shares the underlying tables, so a test can seed a source
/// and inspect a target through the same handle the connector writes to.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Datasets>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a table with its columns, keeping any existing rows.
    pub fn define_table(&self, dataset: &str, table: &str, columns: Vec<Field>) {
        let mut guard = self.write();
        let entry = guard
            .entry(dataset.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default();
        entry.columns = columns;
    }

    pub fn insert_rows(&self, dataset: &str, table: &str, rows: impl IntoIterator<Item = Record>) {
        let mut guard = self.write();
        guard
            .entry(dataset.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default()
            .rows
            .extend(rows);
    }

    /// Snapshot of a table's rows; empty when the table does not exist.
    pub fn rows(&self, dataset: &str, table: &str) -> Vec<Record> {
        self.read()
            .get(dataset)
            .and_then(|tables| tables.get(table))
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, dataset: &str, table: &str) {
        if let Some(t) = self
            .write()
            .get_mut(dataset)
            .and_then(|tables| tables.get_mut(table))
        {
            t.rows.clear();
        }
    }

    pub(crate) fn table_names(&self, dataset: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .get(dataset)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub(crate) fn with_table<R>(
        &self,
        dataset: &str,
        table: &str,
        f: impl FnOnce(&MemTable) -> R,
    ) -> Option<R> {
        self.read()
            .get(dataset)
            .and_then(|tables| tables.get(table))
            .map(f)
    }

    /// Runs `f` against the table, creating it when absent.
    pub(crate) fn with_table_mut<R>(
        &self,
        dataset: &str,
        table: &str,
        f: impl FnOnce(&mut MemTable) -> R,
    ) -> R {
        let mut guard = self.write();
        let t = guard
            .entry(dataset.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default();
        f(t)
    }

    fn read(&self) -> RwLockReadGuard<'_, Datasets> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Datasets> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
