//! In-process store
//!
//! Keeps each table as a `BTreeMap` over the same encoded cell keys the
//! RocksDB store uses, so ordering and scan semantics are identical.

use super::{
    cell_from_entry, encode_cell_key, row_key_prefix, Cell, CellIter, ColumnUpdate, KvStore,
    Mutation, RowRange, ScanSpec, StoreError, StoreResult,
};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// `BTreeMap`-backed store for tests and ephemeral graphs
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, Table>>> {
        self.tables.read().map_err(|_| StoreError::Poisoned("memory store"))
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, Table>>> {
        self.tables.write().map_err(|_| StoreError::Poisoned("memory store"))
    }

    /// Total cells in a table, for tests and diagnostics
    pub fn cell_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.read()?;
        tables
            .get(table)
            .map(|t| t.len())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }
}

fn collect_row(table_name: &str, table: &Table, row: &[u8], spec: &ScanSpec, out: &mut Vec<StoreResult<Cell>>) {
    let prefix = row_key_prefix(row);
    for (key, value) in table.range(prefix.clone()..) {
        if !key.starts_with(&prefix) {
            break;
        }
        match cell_from_entry(table_name, key, value) {
            Ok(cell) if spec.matches(&cell) => out.push(Ok(cell)),
            Ok(_) => {}
            Err(e) => out.push(Err(e)),
        }
    }
}

impl KvStore for MemoryStore {
    fn create_table(&self, table: &str) -> StoreResult<()> {
        let mut tables = self.write_lock()?;
        if tables.contains_key(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        tables.insert(table.to_string(), Table::new());
        Ok(())
    }

    fn delete_table(&self, table: &str) -> StoreResult<()> {
        let mut tables = self.write_lock()?;
        tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn table_exists(&self, table: &str) -> bool {
        self.read().map(|t| t.contains_key(table)).unwrap_or(false)
    }

    fn list_tables(&self) -> StoreResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn write(&self, table: &str, mutations: &[Mutation]) -> StoreResult<()> {
        let mut tables = self.write_lock()?;
        let target = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        for mutation in mutations {
            for update in mutation.updates() {
                match update {
                    ColumnUpdate::Put {
                        family,
                        qualifier,
                        value,
                    } => {
                        target.insert(encode_cell_key(mutation.row(), family, qualifier), value.clone());
                    }
                    ColumnUpdate::Delete { family, qualifier } => {
                        target.remove(&encode_cell_key(mutation.row(), family, qualifier));
                    }
                }
            }
        }
        Ok(())
    }

    fn scan<'a>(&'a self, table: &str, spec: ScanSpec) -> StoreResult<CellIter<'a>> {
        let tables = self.read()?;
        let source = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        // Snapshot under the lock; the cursor itself holds no guard.
        let mut cells = Vec::new();
        match &spec.range {
            RowRange::All => {
                for (key, value) in source {
                    match cell_from_entry(table, key, value) {
                        Ok(cell) if spec.matches(&cell) => cells.push(Ok(cell)),
                        Ok(_) => {}
                        Err(e) => cells.push(Err(e)),
                    }
                }
            }
            RowRange::Exact(row) => collect_row(table, source, row, &spec, &mut cells),
            RowRange::Rows(rows) => {
                for row in rows {
                    collect_row(table, source, row, &spec, &mut cells);
                }
            }
        }
        Ok(Box::new(cells.into_iter()))
    }

    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::bytes::Regex;

    fn store_with_table() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table("t").unwrap();
        store
    }

    fn put(store: &MemoryStore, row: &str, family: &str, qualifier: &str, value: &str) {
        let mut m = Mutation::new(row);
        m.put(family, qualifier, value);
        store.write("t", &[m]).unwrap();
    }

    #[test]
    fn test_table_lifecycle() {
        let store = MemoryStore::new();
        assert!(!store.table_exists("t"));
        store.create_table("t").unwrap();
        assert!(store.table_exists("t"));
        assert!(matches!(store.create_table("t"), Err(StoreError::TableExists(_))));
        assert_eq!(store.list_tables().unwrap(), vec!["t".to_string()]);
        store.delete_table("t").unwrap();
        assert!(!store.table_exists("t"));
        assert!(matches!(store.delete_table("t"), Err(StoreError::TableNotFound(_))));
    }

    #[test]
    fn test_put_scan_delete() {
        let store = store_with_table();
        put(&store, "r2", "f", "q", "2");
        put(&store, "r1", "f", "q", "1");
        put(&store, "r1", "g", "", "x");

        let cells: Vec<Cell> = store
            .scan("t", ScanSpec::all())
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].row, b"r1".to_vec());
        assert_eq!(cells[2].row, b"r2".to_vec());

        let mut m = Mutation::new("r1");
        m.put_delete("g", "");
        store.write("t", &[m]).unwrap();
        assert_eq!(store.cell_count("t").unwrap(), 2);
    }

    #[test]
    fn test_scan_filters() {
        let store = store_with_table();
        put(&store, "a", "name", "", "alice");
        put(&store, "b", "name", "", "bob");
        put(&store, "b", "age", "", "7");
        put(&store, "c", "name", "", "alice");

        let rows: Vec<Vec<u8>> = store
            .scan("t", ScanSpec::all().fetch_family("name").with_value("alice"))
            .unwrap()
            .map(|c| c.unwrap().row)
            .collect();
        assert_eq!(rows, vec![b"a".to_vec(), b"c".to_vec()]);

        let count = store.scan("t", ScanSpec::row("b")).unwrap().count();
        assert_eq!(count, 2);

        let count = store.scan("t", ScanSpec::rows(["a", "c", "zz"])).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_delete_matching() {
        let store = store_with_table();
        put(&store, "x", "k", "id-1", "");
        put(&store, "y", "k", "id-2", "");
        put(&store, "z", "k", "id-1", "");

        let pattern = Regex::new("^id-1$").unwrap();
        let deleted = store
            .delete_matching("t", ScanSpec::all().with_qualifier_pattern(pattern))
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.cell_count("t").unwrap(), 1);

        // Nothing left to match
        let pattern = Regex::new("^id-1$").unwrap();
        let deleted = store
            .delete_matching("t", ScanSpec::all().with_qualifier_pattern(pattern))
            .unwrap();
        assert_eq!(deleted, 0);
    }

    #[test]
    fn test_missing_table() {
        let store = MemoryStore::new();
        assert!(matches!(store.scan("nope", ScanSpec::all()), Err(StoreError::TableNotFound(_))));
        assert!(matches!(store.write("nope", &[]), Err(StoreError::TableNotFound(_))));
    }
}
