//! Graph configuration
//!
//! The core receives a fully constructed [`GraphConfig`]; reading it from a
//! file is the caller's business (the bundled binary uses YAML).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Field failed validation
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// No tables exist and `create` is off
    #[error("Graph {0} does not exist, and create option is disabled")]
    GraphMissing(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which store backs the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process ordered maps; nothing survives the process
    #[default]
    Memory,
    /// RocksDB database directory; each table is a column family
    RocksDb { path: PathBuf },
}

/// Per element type cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of cached elements
    pub capacity: usize,
    /// Entry lifetime in milliseconds (None = no expiry)
    pub timeout_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 10_000,
            timeout_ms: Some(30_000),
        }
    }
}

impl CacheConfig {
    pub fn enabled(capacity: usize, timeout_ms: Option<u64>) -> Self {
        Self {
            enabled: true,
            capacity,
            timeout_ms,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Prefix for every table name
    pub graph_name: String,
    pub storage: StorageBackend,
    /// Create missing tables on open
    pub create: bool,
    /// Drop and recreate all tables on open
    pub clear: bool,
    /// Flush write buffers after every logical operation
    pub auto_flush: bool,
    /// Index every property key without explicit key-index requests
    pub auto_index: bool,
    /// Skip duplicate-id and existence checks (bulk loading)
    pub skip_existence_checks: bool,
    /// Disable named indexes entirely
    pub indexable_graph_disabled: bool,
    /// Property keys fetched together with the existence check
    pub preloaded_properties: Vec<String>,
    pub vertex_cache: CacheConfig,
    pub edge_cache: CacheConfig,
    /// Buffered mutations that force a flush even without auto-flush
    pub max_buffered_mutations: usize,
    /// Parallelism hint for batch scans
    pub query_threads: usize,
    /// Visibility labels passed through to the store
    pub authorizations: Vec<String>,
    /// Pre-split hints for table creation
    pub splits: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            graph_name: "graph".to_string(),
            storage: StorageBackend::Memory,
            create: true,
            clear: false,
            auto_flush: true,
            auto_index: false,
            skip_existence_checks: false,
            indexable_graph_disabled: false,
            preloaded_properties: Vec::new(),
            vertex_cache: CacheConfig::default(),
            edge_cache: CacheConfig::default(),
            max_buffered_mutations: 50_000,
            query_threads: 3,
            authorizations: Vec::new(),
            splits: Vec::new(),
        }
    }
}

impl GraphConfig {
    /// In-memory configuration for the given graph name
    pub fn in_memory(graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
            ..Self::default()
        }
    }

    /// RocksDB configuration rooted at `path`
    pub fn rocksdb(graph_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            graph_name: graph_name.into(),
            storage: StorageBackend::RocksDb { path: path.into() },
            ..Self::default()
        }
    }

    pub fn set_auto_index(mut self, auto_index: bool) -> Self {
        self.auto_index = auto_index;
        self
    }

    pub fn set_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    pub fn set_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn set_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn set_skip_existence_checks(mut self, skip: bool) -> Self {
        self.skip_existence_checks = skip;
        self
    }

    pub fn set_indexable_graph_disabled(mut self, disabled: bool) -> Self {
        self.indexable_graph_disabled = disabled;
        self
    }

    pub fn set_preloaded_properties(mut self, keys: Vec<String>) -> Self {
        self.preloaded_properties = keys;
        self
    }

    pub fn set_vertex_cache(mut self, cache: CacheConfig) -> Self {
        self.vertex_cache = cache;
        self
    }

    pub fn set_edge_cache(mut self, cache: CacheConfig) -> Self {
        self.edge_cache = cache;
        self
    }

    pub fn set_max_buffered_mutations(mut self, max: usize) -> Self {
        self.max_buffered_mutations = max;
        self
    }

    pub fn vertex_table_name(&self) -> String {
        format!("{}_vertex", self.graph_name)
    }

    pub fn edge_table_name(&self) -> String {
        format!("{}_edge", self.graph_name)
    }

    pub fn vertex_key_index_table_name(&self) -> String {
        format!("{}_vertex_index", self.graph_name)
    }

    pub fn edge_key_index_table_name(&self) -> String {
        format!("{}_edge_index", self.graph_name)
    }

    /// Named index registry
    pub fn metadata_table_name(&self) -> String {
        format!("{}_meta", self.graph_name)
    }

    /// Key-index registry
    pub fn key_metadata_table_name(&self) -> String {
        format!("{}_key_meta", self.graph_name)
    }

    pub fn named_index_table_name(&self, index_name: &str) -> String {
        format!("{}_index_{}", self.graph_name, index_name)
    }

    /// Every fixed table; named index tables come and go at runtime.
    pub fn table_names(&self) -> Vec<String> {
        vec![
            self.vertex_table_name(),
            self.edge_table_name(),
            self.vertex_key_index_table_name(),
            self.edge_key_index_table_name(),
            self.metadata_table_name(),
            self.key_metadata_table_name(),
        ]
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.graph_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "graph_name",
                reason: "must not be empty".to_string(),
            });
        }
        validate_table_component("graph_name", &self.graph_name)?;

        if self.query_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "query_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_buffered_mutations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_buffered_mutations",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, cache) in [("vertex_cache", &self.vertex_cache), ("edge_cache", &self.edge_cache)] {
            if cache.enabled && cache.capacity == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "capacity must be positive when the cache is enabled".to_string(),
                });
            }
        }
        for key in &self.preloaded_properties {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "preloaded_properties",
                    reason: "property keys must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Table names are built from user text; keep them to `[A-Za-z0-9_]`.
pub fn validate_table_component(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if let Some(bad) = value.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("character {:?} is not allowed in table names", bad),
        });
    }
    Ok(())
}
