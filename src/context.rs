//! Per-graph shared state
//!
//! One [`GraphContext`] is built when a graph opens and handed (as an
//! `Arc`) to every table wrapper and index component. It owns the store
//! handle, the write buffer and the element caches.

use crate::cache::ElementCaches;
use crate::config::{ConfigError, GraphConfig};
use crate::element::ElementKind;
use crate::error::GraphResult;
use crate::store::{CellIter, KvStore, Mutation, MultiTableWriter, ScanSpec, StoreResult};
use std::sync::Arc;
use tracing::{debug, info};

pub struct GraphContext {
    config: GraphConfig,
    store: Arc<dyn KvStore>,
    writer: MultiTableWriter,
    caches: ElementCaches,
}

impl GraphContext {
    pub fn new(config: GraphConfig, store: Arc<dyn KvStore>) -> Self {
        let writer = MultiTableWriter::new(store.clone(), config.max_buffered_mutations);
        let caches = ElementCaches::new(&config.vertex_cache, &config.edge_cache);
        Self {
            config,
            store,
            writer,
            caches,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    pub fn caches(&self) -> &ElementCaches {
        &self.caches
    }

    /// Buffer a mutation for `table`
    pub fn add(&self, table: &str, mutation: Mutation) -> StoreResult<()> {
        self.writer.add_mutation(table, mutation)
    }

    pub fn add_all<I>(&self, table: &str, mutations: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = Mutation>,
    {
        self.writer.add_mutations(table, mutations)
    }

    /// Write out every buffered mutation
    pub fn flush(&self) -> StoreResult<usize> {
        self.writer.flush()
    }

    /// Flush only under the auto-flush policy
    pub fn checked_flush(&self) -> StoreResult<()> {
        if self.config.auto_flush {
            self.writer.flush()?;
        }
        Ok(())
    }

    pub fn pending_mutations(&self) -> usize {
        self.writer.pending_count()
    }

    /// Scan what the store holds now, without draining the write buffer
    pub fn scan(&self, table: &str, spec: ScanSpec) -> StoreResult<CellIter<'_>> {
        self.store.scan(table, spec)
    }

    /// Drain the write buffer, then scan
    ///
    /// Structural operations read through this so they see their own
    /// earlier writes regardless of the auto-flush policy.
    pub fn scan_flushed(&self, table: &str, spec: ScanSpec) -> StoreResult<CellIter<'_>> {
        self.writer.flush()?;
        self.store.scan(table, spec)
    }

    /// Drain the write buffer, then batch-delete matching cells
    pub fn delete_matching(&self, table: &str, spec: ScanSpec) -> StoreResult<usize> {
        self.writer.flush()?;
        self.store.delete_matching(table, spec)
    }

    /// Tables of the named indexes recorded in this graph's metadata
    pub fn named_index_tables(&self) -> StoreResult<Vec<String>> {
        let metadata = self.config.metadata_table_name();
        if !self.store.table_exists(&metadata) {
            return Ok(Vec::new());
        }
        let mut tables = Vec::new();
        for cell in self.scan_flushed(&metadata, ScanSpec::all())? {
            let cell = cell?;
            if ElementKind::from_name(&cell.family_str()).is_some() {
                tables.push(self.config.named_index_table_name(&cell.row_str()));
            }
        }
        Ok(tables)
    }

    /// Create or reset this graph's tables per the `create` and `clear` options
    pub fn provision(&self) -> GraphResult<()> {
        let fixed = self.config.table_names();

        if self.config.clear {
            info!("Clearing graph {}", self.config.graph_name);
            self.drop_tables()?;
        }

        let missing: Vec<&String> = fixed.iter().filter(|t| !self.store.table_exists(t)).collect();
        if missing.is_empty() {
            return Ok(());
        }
        if !self.config.create {
            return Err(ConfigError::GraphMissing(self.config.graph_name.clone()).into());
        }
        if !self.config.splits.is_empty() {
            debug!("Ignoring {} split hints", self.config.splits.len());
        }
        for table in missing {
            self.store.create_table(table)?;
            debug!("Created table {}", table);
        }
        Ok(())
    }

    /// Drop every table of this graph, named indexes included
    pub fn drop_tables(&self) -> StoreResult<()> {
        for table in self.named_index_tables()? {
            if self.store.table_exists(&table) {
                self.store.delete_table(&table)?;
            }
        }
        for table in self.config.table_names() {
            if self.store.table_exists(&table) {
                self.store.delete_table(&table)?;
            }
        }
        Ok(())
    }
}
