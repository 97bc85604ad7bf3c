//! Stratagraph
//!
//! A property graph stored in an ordered, column-family key-value store,
//! with automatic key indexes, caller-managed named indexes, and bounded
//! LRU caches for element handles.
//!
//! # Layout
//!
//! - [`codec`]: order-preserving, type-tagged property value encoding
//! - [`keys`]: how vertices, edges and index entries map onto cells
//! - [`store`]: the cell store trait with in-memory and RocksDB backends
//! - [`tables`]: vertex and edge table wrappers
//! - [`index`]: key indexes and named indexes
//! - [`graph`]: the [`Graph`] orchestrator and its deletion cascades
//!
//! ## Example Usage
//!
//! ```rust
//! use stratagraph::{Direction, Graph, GraphConfig};
//!
//! let graph = Graph::open(GraphConfig::in_memory("social")).unwrap();
//! let mut alice = graph.add_vertex(Some("alice")).unwrap();
//! let bob = graph.add_vertex(Some("bob")).unwrap();
//! graph.set_property(&mut alice, "age", 30i64).unwrap();
//! graph.add_edge(None, alice.id(), bob.id(), "knows").unwrap();
//!
//! let out = graph.vertex_edges(alice.id(), Direction::Out, &[]).unwrap();
//! assert_eq!(out.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod codec;
pub mod config;
pub mod context;
pub mod element;
pub mod error;
pub mod graph;
pub mod index;
pub mod keys;
pub mod store;
pub mod tables;

// Re-export main types for convenience
pub use codec::{PropertyMap, PropertyValue};
pub use config::{CacheConfig, GraphConfig, StorageBackend};
pub use element::{Direction, Edge, ElementId, ElementKind, GraphElement, Vertex};
pub use error::{GraphError, GraphResult};
pub use graph::{EdgeIter, Graph, GraphSummary, VertexIter};
pub use index::Index;
pub use store::{KvStore, MemoryStore, RocksStore};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
