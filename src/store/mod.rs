//! Ordered column-family key-value store
//!
//! A table is a sorted set of cells addressed by `(row, family, qualifier)`.
//! Cells of one row are contiguous and ordered by family then qualifier.
//! [`KvStore`] is the seam between the graph mapping and a concrete
//! store; [`RocksStore`] maps each table onto a RocksDB column family and
//! [`MemoryStore`] keeps tables in process.

pub mod memory;
pub mod rocks;
pub mod rows;
pub mod writer;

pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use rows::Rows;
pub use writer::MultiTableWriter;

use regex::bytes::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// RocksDB error, tagged with the table and operation
    #[error("RocksDB error during {op} on table {table}: {source}")]
    RocksDb {
        table: String,
        op: &'static str,
        #[source]
        source: rocksdb::Error,
    },

    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table already exists
    #[error("Table already exists: {0}")]
    TableExists(String),

    /// Stored key does not decode as a cell key
    #[error("Malformed cell key in table {table}: {reason}")]
    MalformedKey { table: String, reason: String },

    /// A buffered batch failed to write; later batches were kept for the
    /// next flush
    #[error("Dropped {rejected} buffered mutations for table {table} ({requeued} kept for retry): {source}")]
    BatchRejected {
        table: String,
        rejected: usize,
        requeued: usize,
        #[source]
        source: Box<StoreError>,
    },

    /// A lock guarding store state was poisoned
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl StoreError {
    pub(crate) fn rocks(table: &str, op: &'static str, source: rocksdb::Error) -> Self {
        StoreError::RocksDb {
            table: table.to_string(),
            op,
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: Vec<u8>,
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
}

impl Cell {
    pub fn new(
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
        }
    }

    pub fn row_str(&self) -> String {
        String::from_utf8_lossy(&self.row).into_owned()
    }

    pub fn family_str(&self) -> String {
        String::from_utf8_lossy(&self.family).into_owned()
    }

    pub fn qualifier_str(&self) -> String {
        String::from_utf8_lossy(&self.qualifier).into_owned()
    }

    /// Mutation writing this cell
    pub fn to_put(&self) -> Mutation {
        let mut m = Mutation::new(self.row.clone());
        m.put(self.family.clone(), self.qualifier.clone(), self.value.clone());
        m
    }

    /// Mutation removing this cell
    pub fn to_delete(&self) -> Mutation {
        let mut m = Mutation::new(self.row.clone());
        m.put_delete(self.family.clone(), self.qualifier.clone());
        m
    }
}

/// Single column change within a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnUpdate {
    Put {
        family: Vec<u8>,
        qualifier: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        family: Vec<u8>,
        qualifier: Vec<u8>,
    },
}

/// Ordered column updates against one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    row: Vec<u8>,
    updates: Vec<ColumnUpdate>,
}

impl Mutation {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            updates: Vec::new(),
        }
    }

    pub fn put(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.updates.push(ColumnUpdate::Put {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
        });
        self
    }

    pub fn put_delete(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.updates.push(ColumnUpdate::Delete {
            family: family.into(),
            qualifier: qualifier.into(),
        });
        self
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn updates(&self) -> &[ColumnUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Rows a scan covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RowRange {
    #[default]
    All,
    /// Exactly one row
    Exact(Vec<u8>),
    /// A set of exact rows (batch scan)
    Rows(BTreeSet<Vec<u8>>),
}

/// What to read from a table
///
/// Filters are applied inside the store, before cells reach the caller.
#[derive(Debug, Clone, Default)]
pub struct ScanSpec {
    pub range: RowRange,
    /// Only these families (None = all)
    pub families: Option<BTreeSet<Vec<u8>>>,
    pub qualifier_pattern: Option<Regex>,
    pub value_equals: Option<Vec<u8>>,
}

impl ScanSpec {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn row(row: impl Into<Vec<u8>>) -> Self {
        Self {
            range: RowRange::Exact(row.into()),
            ..Self::default()
        }
    }

    pub fn rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<u8>>,
    {
        Self {
            range: RowRange::Rows(rows.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn fetch_family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.families
            .get_or_insert_with(BTreeSet::new)
            .insert(family.into());
        self
    }

    pub fn with_qualifier_pattern(mut self, pattern: Regex) -> Self {
        self.qualifier_pattern = Some(pattern);
        self
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value_equals = Some(value.into());
        self
    }

    pub fn covers_row(&self, row: &[u8]) -> bool {
        match &self.range {
            RowRange::All => true,
            RowRange::Exact(r) => r.as_slice() == row,
            RowRange::Rows(rows) => rows.contains(row),
        }
    }

    /// Range and filter check for one cell
    pub fn matches(&self, cell: &Cell) -> bool {
        if !self.covers_row(&cell.row) {
            return false;
        }
        if let Some(families) = &self.families {
            if !families.contains(&cell.family) {
                return false;
            }
        }
        if let Some(pattern) = &self.qualifier_pattern {
            if !pattern.is_match(&cell.qualifier) {
                return false;
            }
        }
        if let Some(value) = &self.value_equals {
            if value != &cell.value {
                return false;
            }
        }
        true
    }
}

/// Rebuild a cell from an encoded key and its value
pub(crate) fn cell_from_entry(table: &str, key: &[u8], value: &[u8]) -> StoreResult<Cell> {
    let (row, family, qualifier) =
        decode_cell_key(key).ok_or_else(|| StoreError::MalformedKey {
            table: table.to_string(),
            reason: format!("{} undecodable bytes", key.len()),
        })?;
    Ok(Cell {
        row,
        family,
        qualifier,
        value: value.to_vec(),
    })
}

/// Lazy, fallible, single-pass cursor over scanned cells
pub type CellIter<'a> = Box<dyn Iterator<Item = StoreResult<Cell>> + 'a>;

/// Ordered multi-table key-value store
pub trait KvStore: Send + Sync {
    fn create_table(&self, table: &str) -> StoreResult<()>;

    fn delete_table(&self, table: &str) -> StoreResult<()>;

    fn table_exists(&self, table: &str) -> bool;

    fn list_tables(&self) -> StoreResult<Vec<String>>;

    /// Apply mutations as one batch, in order.
    fn write(&self, table: &str, mutations: &[Mutation]) -> StoreResult<()>;

    fn scan<'a>(&'a self, table: &str, spec: ScanSpec) -> StoreResult<CellIter<'a>>;

    /// Persist buffered engine state
    fn flush(&self) -> StoreResult<()>;

    /// Batch delete every cell the scan matches. Returns the cell count.
    fn delete_matching(&self, table: &str, spec: ScanSpec) -> StoreResult<usize> {
        let mut deletes = Vec::new();
        for cell in self.scan(table, spec)? {
            deletes.push(cell?.to_delete());
        }
        let count = deletes.len();
        if count > 0 {
            self.write(table, &deletes)?;
        }
        Ok(count)
    }
}

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

fn push_component(out: &mut Vec<u8>, component: &[u8]) {
    for &b in component {
        if b == ESCAPE {
            out.push(ESCAPE);
            out.push(ESCAPED_ZERO);
        } else {
            out.push(b);
        }
    }
    out.push(ESCAPE);
    out.push(TERMINATOR);
}

/// Order-preserving encoding of `(row, family, qualifier)`
pub fn encode_cell_key(row: &[u8], family: &[u8], qualifier: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(row.len() + family.len() + qualifier.len() + 6);
    push_component(&mut out, row);
    push_component(&mut out, family);
    push_component(&mut out, qualifier);
    out
}

/// Prefix shared by every cell key of `row`
pub fn row_key_prefix(row: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(row.len() + 2);
    push_component(&mut out, row);
    out
}

/// Inverse of [`encode_cell_key`]
pub fn decode_cell_key(key: &[u8]) -> Option<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let mut parts: Vec<Vec<u8>> = Vec::with_capacity(3);
    let mut current = Vec::new();
    let mut i = 0;
    while i < key.len() {
        let b = key[i];
        if b == ESCAPE {
            match key.get(i + 1) {
                Some(&ESCAPED_ZERO) => current.push(ESCAPE),
                Some(&TERMINATOR) => parts.push(std::mem::take(&mut current)),
                _ => return None,
            }
            i += 2;
        } else {
            current.push(b);
            i += 1;
        }
    }
    if !current.is_empty() || parts.len() != 3 {
        return None;
    }
    let qualifier = parts.pop()?;
    let family = parts.pop()?;
    let row = parts.pop()?;
    Some((row, family, qualifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_round_trip() {
        let cases: [(&[u8], &[u8], &[u8]); 4] = [
            (b"v1", b"L", b"E"),
            (b"", b"", b""),
            (b"a\x00b", b"\x00", b"q\x00\x00"),
            (b"\xff\x01", b"name", b""),
        ];
        for (row, family, qualifier) in cases {
            let key = encode_cell_key(row, family, qualifier);
            let (r, f, q) = decode_cell_key(&key).unwrap();
            assert_eq!((r.as_slice(), f.as_slice(), q.as_slice()), (row, family, qualifier));
        }
    }

    #[test]
    fn test_cell_key_order_groups_rows() {
        let mut keys = vec![
            encode_cell_key(b"ab", b"A", b""),
            encode_cell_key(b"a", b"Z", b"z"),
            encode_cell_key(b"a", b"A", b"b"),
            encode_cell_key(b"a\x00", b"A", b""),
            encode_cell_key(b"a", b"A", b"a"),
        ];
        keys.sort();
        let decoded: Vec<_> = keys.iter().map(|k| decode_cell_key(k).unwrap()).collect();
        let rows: Vec<&[u8]> = decoded.iter().map(|(r, _, _)| r.as_slice()).collect();
        assert_eq!(rows, vec![&b"a"[..], b"a", b"a", b"a\x00", b"ab"]);
        assert_eq!(decoded[0].2, b"a".to_vec());
        assert_eq!(decoded[1].2, b"b".to_vec());
        assert_eq!(decoded[2].1, b"Z".to_vec());
    }

    #[test]
    fn test_row_prefix_is_exact() {
        let prefix = row_key_prefix(b"a");
        assert!(encode_cell_key(b"a", b"f", b"q").starts_with(&prefix));
        assert!(!encode_cell_key(b"ab", b"f", b"q").starts_with(&prefix));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_cell_key(b"abc").is_none());
        assert!(decode_cell_key(&[b'a', 0x00]).is_none());
        assert!(decode_cell_key(&[0x00, 0x07]).is_none());
    }

    #[test]
    fn test_scan_spec_matching() {
        let cell = Cell::new("v1", "name", "", "x");
        assert!(ScanSpec::all().matches(&cell));
        assert!(ScanSpec::row("v1").fetch_family("name").matches(&cell));
        assert!(!ScanSpec::row("v2").matches(&cell));
        assert!(!ScanSpec::all().fetch_family("age").matches(&cell));
        assert!(ScanSpec::rows(["v0", "v1"]).with_value("x").matches(&cell));
        assert!(!ScanSpec::all().with_value("y").matches(&cell));
        let pattern = Regex::new("^$").unwrap();
        assert!(ScanSpec::all().with_qualifier_pattern(pattern).matches(&cell));
    }
}
