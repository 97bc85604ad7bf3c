//! RocksDB storage layer
//!
//! Each table is a column family. Cell keys use the order-preserving
//! encoding from the parent module, so a row is one contiguous key range
//! and prefix seeks give exact-row reads.

use super::{
    cell_from_entry, encode_cell_key, row_key_prefix, Cell, CellIter, ColumnUpdate, KvStore, Mutation,
    RowRange, ScanSpec, StoreError, StoreResult,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

type Db = DBWithThreadMode<MultiThreaded>;

const DEFAULT_CF: &str = "default";

/// RocksDB-backed store
pub struct RocksStore {
    db: Arc<Db>,
    tables: RwLock<BTreeSet<String>>,
    path: PathBuf,
}

impl RocksStore {
    /// Open or create a database, attaching every existing column family
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let location = path.display().to_string();
        info!("Opening RocksDB store at: {}", location);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        // A fresh directory has no column family list yet
        let existing = Db::list_cf(&opts, &path).unwrap_or_else(|_| vec![DEFAULT_CF.to_string()]);
        let descriptors: Vec<ColumnFamilyDescriptor> = existing
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Self::table_options()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, &path, descriptors)
            .map_err(|e| StoreError::rocks(&location, "open", e))?;

        let tables: BTreeSet<String> = existing
            .into_iter()
            .filter(|name| name != DEFAULT_CF)
            .collect();
        info!("RocksDB store opened with {} tables", tables.len());

        Ok(Self {
            db: Arc::new(db),
            tables: RwLock::new(tables),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn handle(&self, table: &str) -> StoreResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    /// Cells of one row, via a prefix seek
    fn row_cells<'a>(
        &'a self,
        cf: &Arc<BoundColumnFamily<'a>>,
        table: Arc<str>,
        row: &[u8],
    ) -> impl Iterator<Item = StoreResult<Cell>> + 'a {
        let prefix = row_key_prefix(row);
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, rocksdb::Direction::Forward));
        iter.take_while(move |item| match item {
            Ok((key, _)) => key.starts_with(&prefix),
            Err(_) => true,
        })
        .map(move |item| decode_entry(&table, item))
    }
}

type RawEntry = Result<(Box<[u8]>, Box<[u8]>), rocksdb::Error>;

fn decode_entry(table: &str, item: RawEntry) -> StoreResult<Cell> {
    let (key, value) = item.map_err(|e| StoreError::rocks(table, "scan", e))?;
    cell_from_entry(table, &key, &value)
}

impl KvStore for RocksStore {
    fn create_table(&self, table: &str) -> StoreResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Poisoned("rocks table set"))?;
        if tables.contains(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        self.db
            .create_cf(table, &Self::table_options())
            .map_err(|e| StoreError::rocks(table, "create table", e))?;
        tables.insert(table.to_string());
        debug!("Created table {}", table);
        Ok(())
    }

    fn delete_table(&self, table: &str) -> StoreResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Poisoned("rocks table set"))?;
        if !tables.remove(table) {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        self.db
            .drop_cf(table)
            .map_err(|e| StoreError::rocks(table, "delete table", e))?;
        debug!("Deleted table {}", table);
        Ok(())
    }

    fn table_exists(&self, table: &str) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains(table))
            .unwrap_or(false)
    }

    fn list_tables(&self) -> StoreResult<Vec<String>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Poisoned("rocks table set"))?;
        Ok(tables.iter().cloned().collect())
    }

    fn write(&self, table: &str, mutations: &[Mutation]) -> StoreResult<()> {
        let cf = self.handle(table)?;
        let mut batch = WriteBatch::default();
        for mutation in mutations {
            for update in mutation.updates() {
                match update {
                    ColumnUpdate::Put {
                        family,
                        qualifier,
                        value,
                    } => batch.put_cf(&cf, encode_cell_key(mutation.row(), family, qualifier), value),
                    ColumnUpdate::Delete { family, qualifier } => {
                        batch.delete_cf(&cf, encode_cell_key(mutation.row(), family, qualifier))
                    }
                }
            }
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::rocks(table, "write", e))
    }

    fn scan<'a>(&'a self, table: &str, spec: ScanSpec) -> StoreResult<CellIter<'a>> {
        let cf = self.handle(table)?;
        let table: Arc<str> = Arc::from(table);
        let cells: CellIter<'a> = match spec.range.clone() {
            RowRange::All => {
                let iter = self
                    .db
                    .iterator_cf(&cf, IteratorMode::Start)
                    .map(move |item| decode_entry(&table, item));
                Box::new(iter)
            }
            RowRange::Exact(row) => Box::new(self.row_cells(&cf, table, &row)),
            RowRange::Rows(rows) => {
                let iter = rows
                    .into_iter()
                    .flat_map(move |row| self.row_cells(&cf, table.clone(), &row));
                Box::new(iter)
            }
        };
        Ok(Box::new(cells.filter(move |item| match item {
            Ok(cell) => spec.matches(cell),
            Err(_) => true,
        })))
    }

    fn flush(&self) -> StoreResult<()> {
        for table in self.list_tables()? {
            let cf = self.handle(&table)?;
            self.db
                .flush_cf(&cf)
                .map_err(|e| StoreError::rocks(&table, "flush", e))?;
        }
        debug!("Flushed RocksDB store at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn put(store: &RocksStore, table: &str, row: &str, family: &str, qualifier: &str, value: &str) {
        let mut m = Mutation::new(row);
        m.put(family, qualifier, value);
        store.write(table, &[m]).unwrap();
    }

    #[test]
    fn test_store_open() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();
        assert!(store.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_table_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();

        store.create_table("g_vertex").unwrap();
        assert!(store.table_exists("g_vertex"));
        assert!(matches!(store.create_table("g_vertex"), Err(StoreError::TableExists(_))));

        store.delete_table("g_vertex").unwrap();
        assert!(!store.table_exists("g_vertex"));
        assert!(matches!(store.scan("g_vertex", ScanSpec::all()), Err(StoreError::TableNotFound(_))));
    }

    #[test]
    fn test_row_scans() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();
        store.create_table("t").unwrap();

        put(&store, "t", "a", "L", "E", "");
        put(&store, "t", "a", "name", "", "alice");
        put(&store, "t", "ab", "name", "", "abby");
        put(&store, "t", "b", "name", "", "bob");

        let row_a: Vec<Cell> = store
            .scan("t", ScanSpec::row("a"))
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(row_a.len(), 2);
        assert!(row_a.iter().all(|c| c.row == b"a".to_vec()));

        let named: Vec<String> = store
            .scan("t", ScanSpec::rows(["ab", "b"]).fetch_family("name"))
            .unwrap()
            .map(|c| String::from_utf8(c.unwrap().value).unwrap())
            .collect();
        assert_eq!(named, vec!["abby".to_string(), "bob".to_string()]);

        let all = store.scan("t", ScanSpec::all()).unwrap().count();
        assert_eq!(all, 4);
    }

    #[test]
    fn test_delete_cells() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();
        store.create_table("t").unwrap();
        put(&store, "t", "v1", "age", "", "1");

        let mut m = Mutation::new("v1");
        m.put_delete("age", "");
        store.write("t", &[m]).unwrap();
        assert_eq!(store.scan("t", ScanSpec::row("v1")).unwrap().count(), 0);
    }

    #[test]
    fn test_reopen_keeps_tables_and_cells() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = RocksStore::open(temp_dir.path()).unwrap();
            store.create_table("g_edge").unwrap();
            put(&store, "g_edge", "e1", "L", "b_a", "knows");
            store.flush().unwrap();
        }

        let store = RocksStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.list_tables().unwrap(), vec!["g_edge".to_string()]);
        let cells: Vec<Cell> = store
            .scan("g_edge", ScanSpec::all())
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(cells, vec![Cell::new("e1", "L", "b_a", "knows")]);
    }
}
