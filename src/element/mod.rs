//! Graph elements
//!
//! Vertices and edges are lightweight handles: an id plus whatever
//! properties have been read or written through this process. The store
//! is the source of truth; a handle's resident properties are a cache.

pub mod edge;
pub mod properties;
pub mod vertex;

pub use edge::{Edge, EdgeEndpoints};
pub use properties::ResidentProperties;
pub use vertex::Vertex;

use crate::cache::ElementCaches;
use crate::config::GraphConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a vertex or edge
///
/// Ids are opaque strings used directly as row keys, so they sort the
/// way their bytes sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        ElementId(id.into())
    }

    /// Random v4 UUID. Never contains the qualifier delimiter.
    pub fn generate() -> Self {
        ElementId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        ElementId(s)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId(s.to_string())
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The two element types. Everything that differs between vertex and
/// edge storage (tables, cache, metadata family) is selected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl ElementKind {
    /// Name recorded in metadata tables
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Vertex => "Vertex",
            ElementKind::Edge => "Edge",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Vertex" => Some(ElementKind::Vertex),
            "Edge" => Some(ElementKind::Edge),
            _ => None,
        }
    }

    /// Primary table holding rows of this kind
    pub fn data_table(self, config: &GraphConfig) -> String {
        match self {
            ElementKind::Vertex => config.vertex_table_name(),
            ElementKind::Edge => config.edge_table_name(),
        }
    }

    /// Key-index table for this kind
    pub fn key_index_table(self, config: &GraphConfig) -> String {
        match self {
            ElementKind::Vertex => config.vertex_key_index_table_name(),
            ElementKind::Edge => config.edge_key_index_table_name(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Edge direction relative to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Out,
    In,
    Both,
}

impl Direction {
    pub fn includes_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Both)
    }

    pub fn includes_in(self) -> bool {
        matches!(self, Direction::In | Direction::Both)
    }
}

/// Behaviour shared by [`Vertex`] and [`Edge`] handles
pub trait GraphElement: Clone {
    const KIND: ElementKind;

    fn id(&self) -> &ElementId;

    fn properties(&self) -> &ResidentProperties;

    fn properties_mut(&mut self) -> &mut ResidentProperties;

    /// Store this handle in the matching cache
    fn cache_in(&self, caches: &ElementCaches);
}
