//! Named indexes
//!
//! Each named index is its own table. Callers put elements into an index
//! explicitly under a (key, value) pair; the metadata table records which
//! element type each index covers.

use crate::codec::PropertyValue;
use crate::config::validate_table_component;
use crate::context::GraphContext;
use crate::element::{ElementId, ElementKind};
use crate::error::{GraphError, GraphResult};
use crate::keys;
use crate::store::{ScanSpec, StoreResult};
use regex::bytes::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// Handle to one named index
#[derive(Clone)]
pub struct Index {
    name: String,
    kind: ElementKind,
    table: String,
    ctx: Arc<GraphContext>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("table", &self.table)
            .finish()
    }
}

impl Index {
    fn new(name: &str, kind: ElementKind, ctx: Arc<GraphContext>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            table: ctx.config().named_index_table_name(name),
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type the index holds
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Add `element` under `key = value`
    pub fn put(&self, key: &str, value: &PropertyValue, element: &ElementId) -> GraphResult<()> {
        validate_entry(key, value)?;
        self.ctx
            .add(&self.table, keys::index_entry(key, value, element, true)?)?;
        self.ctx.checked_flush()?;
        Ok(())
    }

    /// Elements stored under `key = value`
    pub fn get(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<ElementId>> {
        validate_entry(key, value)?;
        let spec = ScanSpec::row(crate::codec::encode(value)?).fetch_family(key);
        let mut ids = Vec::new();
        for cell in self.ctx.scan(&self.table, spec)? {
            let cell = cell?;
            ids.push(ElementId::new(String::from_utf8_lossy(&cell.value).into_owned()));
        }
        Ok(ids)
    }

    pub fn count(&self, key: &str, value: &PropertyValue) -> GraphResult<usize> {
        Ok(self.get(key, value)?.len())
    }

    pub fn remove(&self, key: &str, value: &PropertyValue, element: &ElementId) -> GraphResult<()> {
        validate_entry(key, value)?;
        self.ctx
            .add(&self.table, keys::index_entry_delete(key, value, element)?)?;
        self.ctx.checked_flush()?;
        Ok(())
    }
}

fn validate_entry(key: &str, value: &PropertyValue) -> GraphResult<()> {
    if key.trim().is_empty() {
        return Err(GraphError::validation("index key must not be empty"));
    }
    if value.is_null() {
        return Err(GraphError::validation("index value must not be null"));
    }
    Ok(())
}

/// Registry and lifecycle of named indexes
pub struct NamedIndexes {
    ctx: Arc<GraphContext>,
}

impl NamedIndexes {
    pub fn new(ctx: Arc<GraphContext>) -> Self {
        Self { ctx }
    }

    fn metadata_table(&self) -> String {
        self.ctx.config().metadata_table_name()
    }

    fn ensure_enabled(&self) -> GraphResult<()> {
        if self.ctx.config().indexable_graph_disabled {
            return Err(GraphError::UnsupportedOperation(
                "named indexes are disabled for this graph".to_string(),
            ));
        }
        Ok(())
    }

    /// Kind recorded for `name`, if the index exists
    fn lookup_kind(&self, name: &str) -> GraphResult<Option<ElementKind>> {
        let mut cells = self
            .ctx
            .scan_flushed(&self.metadata_table(), ScanSpec::row(name.as_bytes()))?;
        match cells.next().transpose()? {
            Some(cell) => Ok(ElementKind::from_name(&cell.family_str())),
            None => Ok(None),
        }
    }

    pub fn create_index(&self, name: &str, kind: ElementKind) -> GraphResult<Index> {
        self.ensure_enabled()?;
        validate_table_component("index name", name)
            .map_err(|e| GraphError::validation(e.to_string()))?;
        if self.lookup_kind(name)?.is_some() {
            return Err(GraphError::validation(format!("Index {} already exists", name)));
        }

        let index = Index::new(name, kind, self.ctx.clone());
        // Unrecorded tables under the index name belong to someone else
        if self.ctx.store().table_exists(index.table_name()) {
            return Err(GraphError::validation(format!(
                "Index {} would reuse existing table {}",
                name,
                index.table_name()
            )));
        }
        self.ctx.store().create_table(index.table_name())?;
        self.ctx
            .add(&self.metadata_table(), keys::metadata_entry(name, kind))?;
        self.ctx.checked_flush()?;
        info!("Created {} index {}", kind, name);
        Ok(index)
    }

    /// Existing index; an index of the other element type is an error
    pub fn get_index(&self, name: &str, kind: ElementKind) -> GraphResult<Option<Index>> {
        self.ensure_enabled()?;
        match self.lookup_kind(name)? {
            None => Ok(None),
            Some(found) if found == kind => Ok(Some(Index::new(name, kind, self.ctx.clone()))),
            Some(found) => Err(GraphError::validation(format!(
                "Index {} holds {}s, not {}s",
                name, found, kind
            ))),
        }
    }

    pub fn indices(&self) -> GraphResult<Vec<Index>> {
        self.ensure_enabled()?;
        let mut indices = Vec::new();
        for cell in self.ctx.scan_flushed(&self.metadata_table(), ScanSpec::all())? {
            let cell = cell?;
            if let Some(kind) = ElementKind::from_name(&cell.family_str()) {
                indices.push(Index::new(&cell.row_str(), kind, self.ctx.clone()));
            }
        }
        Ok(indices)
    }

    /// Remove the index table, then its metadata row. Dropping an unknown
    /// name does nothing.
    pub fn drop_index(&self, name: &str) -> GraphResult<()> {
        self.ensure_enabled()?;
        let Some(kind) = self.lookup_kind(name)? else {
            debug!("Index {} does not exist, nothing to drop", name);
            return Ok(());
        };
        let table = self.ctx.config().named_index_table_name(name);
        if self.ctx.store().table_exists(&table) {
            self.ctx.store().delete_table(&table)?;
        }

        self.ctx
            .add(&self.metadata_table(), keys::metadata_entry_delete(name, kind))?;
        self.ctx.flush()?;
        info!("Dropped {} index {}", kind, name);
        Ok(())
    }

    /// Delete every entry referencing `id` across all indexes of `kind`
    pub fn clear_element(&self, kind: ElementKind, id: &ElementId) -> GraphResult<usize> {
        if self.ctx.config().indexable_graph_disabled {
            return Ok(0);
        }
        // Anchored: a bare suffix match would also hit ids ending in `id`
        let pattern = Regex::new(&format!("^{}$", regex::escape(id.as_str())))
            .map_err(|e| GraphError::validation(format!("bad id pattern: {}", e)))?;
        let mut removed = 0;
        for index in self.indices()?.into_iter().filter(|i| i.kind() == kind) {
            removed += self.ctx.delete_matching(
                index.table_name(),
                ScanSpec::all().with_qualifier_pattern(pattern.clone()),
            )?;
        }
        if removed > 0 {
            debug!("Removed {} named index entries for {} {}", removed, kind, id);
        }
        Ok(removed)
    }

    /// Number of entries an index holds
    pub fn entry_count(&self, index: &Index) -> GraphResult<usize> {
        let count = self
            .ctx
            .scan(index.table_name(), ScanSpec::all())?
            .collect::<StoreResult<Vec<_>>>()?
            .len();
        Ok(count)
    }
}
