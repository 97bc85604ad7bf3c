//! Key indexes
//!
//! One index table per element type. A property key is indexed when
//! auto-indexing is on or a key-index metadata row exists for it.

use crate::codec::{self, PropertyValue};
use crate::context::GraphContext;
use crate::element::{ElementId, ElementKind};
use crate::error::{GraphError, GraphResult};
use crate::keys;
use crate::store::{Cell, Mutation, ScanSpec, StoreResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Keeps key-index tables in step with property writes
pub struct KeyIndexer {
    ctx: Arc<GraphContext>,
}

impl KeyIndexer {
    pub fn new(ctx: Arc<GraphContext>) -> Self {
        Self { ctx }
    }

    fn index_table(&self, kind: ElementKind) -> String {
        kind.key_index_table(self.ctx.config())
    }

    fn metadata_table(&self) -> String {
        self.ctx.config().key_metadata_table_name()
    }

    /// Keys with an explicit key index for `kind`
    pub fn indexed_keys(&self, kind: ElementKind) -> GraphResult<Vec<String>> {
        let spec = ScanSpec::all().fetch_family(kind.name());
        let mut keys = Vec::new();
        for cell in self.ctx.scan(&self.metadata_table(), spec)? {
            keys.push(cell?.row_str());
        }
        Ok(keys)
    }

    fn has_key_index(&self, kind: ElementKind, key: &str) -> GraphResult<bool> {
        let spec = ScanSpec::row(key.as_bytes()).fetch_family(kind.name());
        let mut cells = self.ctx.scan(&self.metadata_table(), spec)?;
        Ok(cells.next().transpose()?.is_some())
    }

    pub fn is_indexed(&self, kind: ElementKind, key: &str) -> GraphResult<bool> {
        if self.ctx.config().auto_index {
            return Ok(true);
        }
        self.has_key_index(kind, key)
    }

    /// Replace the index row for a changed value. Caller has checked
    /// [`is_indexed`](Self::is_indexed).
    pub fn on_property_set(
        &self,
        kind: ElementKind,
        id: &ElementId,
        key: &str,
        old: Option<&PropertyValue>,
        new: &PropertyValue,
    ) -> GraphResult<()> {
        let table = self.index_table(kind);
        if let Some(old) = old {
            self.ctx.add(&table, keys::index_entry_delete(key, old, id)?)?;
        }
        self.ctx.add(&table, keys::index_entry(key, new, id, false)?)?;
        Ok(())
    }

    pub fn on_property_removed(
        &self,
        kind: ElementKind,
        id: &ElementId,
        key: &str,
        old: &PropertyValue,
    ) -> GraphResult<()> {
        self.ctx
            .add(&self.index_table(kind), keys::index_entry_delete(key, old, id)?)?;
        Ok(())
    }

    /// Queue index deletes for property cells read from a row being removed.
    ///
    /// Uses the stored value bytes directly, so no decode is needed.
    pub fn remove_cells(&self, kind: ElementKind, cells: &[Cell]) -> GraphResult<()> {
        let deletes = cells.iter().filter(|c| keys::is_property_cell(c)).map(|cell| {
            let mut m = Mutation::new(cell.value.clone());
            m.put_delete(cell.family.clone(), cell.row.clone());
            m
        });
        self.ctx.add_all(&self.index_table(kind), deletes)?;
        Ok(())
    }

    /// Record a key index and rebuild it from a full table scan.
    ///
    /// Returns the number of index rows written.
    pub fn create_key_index(&self, key: &str, kind: ElementKind) -> GraphResult<usize> {
        validate_index_key(key)?;
        self.ctx
            .add(&self.metadata_table(), keys::metadata_entry(key, kind))?;

        let spec = ScanSpec::all().fetch_family(key);
        let cells = self
            .ctx
            .scan_flushed(&kind.data_table(self.ctx.config()), spec)?
            .filter(|cell| cell.as_ref().map(|c| c.qualifier.is_empty()).unwrap_or(true))
            .collect::<StoreResult<Vec<_>>>()?;

        let entries = cells.iter().map(|cell| {
            let mut m = Mutation::new(cell.value.clone());
            m.put(cell.family.clone(), cell.row.clone(), Vec::<u8>::new());
            m
        });
        let table = self.index_table(kind);
        self.ctx.add_all(&table, entries)?;
        self.ctx.flush()?;
        info!(
            "Built {} key index on '{}' with {} rows",
            kind,
            key,
            cells.len()
        );
        Ok(cells.len())
    }

    /// Remove the metadata row and every index row for `key`.
    ///
    /// Refused under auto-indexing, where every key stays indexed.
    pub fn drop_key_index(&self, key: &str, kind: ElementKind) -> GraphResult<usize> {
        validate_index_key(key)?;
        if self.ctx.config().auto_index {
            return Err(GraphError::UnsupportedOperation(format!(
                "cannot drop {} key index on '{}' while auto-indexing",
                kind, key
            )));
        }
        self.ctx
            .add(&self.metadata_table(), keys::metadata_entry_delete(key, kind))?;
        let removed = self
            .ctx
            .delete_matching(&self.index_table(kind), ScanSpec::all().fetch_family(key))?;
        info!("Dropped {} key index on '{}' ({} rows)", kind, key, removed);
        Ok(removed)
    }

    /// Ids of elements whose `key` currently equals `value`
    pub fn lookup(
        &self,
        kind: ElementKind,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<Vec<ElementId>> {
        let spec = ScanSpec::row(codec::encode(value)?).fetch_family(key);
        let mut ids = Vec::new();
        for cell in self.ctx.scan(&self.index_table(kind), spec)? {
            ids.push(ElementId::new(cell?.qualifier_str()));
        }
        debug!("Key index lookup {}={} found {} {}s", key, value, ids.len(), kind);
        Ok(ids)
    }
}

fn validate_index_key(key: &str) -> GraphResult<()> {
    if key.trim().is_empty() {
        return Err(GraphError::validation("index key must not be empty"));
    }
    if keys::is_reserved_property(key) {
        return Err(GraphError::validation(format!("'{}' is a reserved key", key)));
    }
    Ok(())
}
