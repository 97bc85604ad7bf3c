//! Graph operations
//!
//! [`Graph`] sequences every graph-level operation across the primary
//! tables, the index tables and the element caches. Multi-table steps are
//! ordered but not atomic: a failure midway is reported and leaves earlier
//! steps applied.

mod iter;
mod remove;

pub use iter::{EdgeIter, ElementIter, ScannedElement, VertexIter};

use crate::codec::{self, PropertyMap, PropertyValue};
use crate::config::{GraphConfig, StorageBackend};
use crate::context::GraphContext;
use crate::element::{
    Direction, Edge, EdgeEndpoints, ElementId, ElementKind, GraphElement, ResidentProperties,
    Vertex,
};
use crate::error::{GraphError, GraphResult};
use crate::index::{Index, KeyIndexer, NamedIndexes};
use crate::keys;
use crate::store::{KvStore, MemoryStore, RocksStore, ScanSpec};
use crate::tables::{EdgeTable, ElementTable, VertexTable};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Counts and index names of an open graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub graph_name: String,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub named_indices: Vec<String>,
    pub vertex_key_indices: Vec<String>,
    pub edge_key_indices: Vec<String>,
}

/// A property graph stored in an ordered column-family store
pub struct Graph {
    ctx: Arc<GraphContext>,
    vertices: VertexTable,
    edges: EdgeTable,
    key_index: KeyIndexer,
    named: NamedIndexes,
}

impl Graph {
    /// Open a graph on the backend named in the configuration
    pub fn open(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let store: Arc<dyn KvStore> = match &config.storage {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::RocksDb { path } => Arc::new(RocksStore::open(path)?),
        };
        Self::open_with_store(config, store)
    }

    /// Open a graph on an existing store, provisioning its tables
    pub fn open_with_store(config: GraphConfig, store: Arc<dyn KvStore>) -> GraphResult<Self> {
        config.validate()?;
        let ctx = Arc::new(GraphContext::new(config, store));
        ctx.provision()?;
        info!("Opened graph {}", ctx.config().graph_name);
        Ok(Self {
            vertices: VertexTable::new(ctx.clone()),
            edges: EdgeTable::new(ctx.clone()),
            key_index: KeyIndexer::new(ctx.clone()),
            named: NamedIndexes::new(ctx.clone()),
            ctx,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        self.ctx.config()
    }

    pub fn context(&self) -> &Arc<GraphContext> {
        &self.ctx
    }

    fn table(&self, kind: ElementKind) -> &dyn ElementTable {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
        }
    }

    fn new_id(&self, id: Option<&str>) -> GraphResult<(ElementId, bool)> {
        match id {
            Some(id) => {
                validate_id(id)?;
                Ok((ElementId::new(id), true))
            }
            None => Ok((ElementId::generate(), false)),
        }
    }

    // === Vertices ===

    /// Create a vertex. Without an id a UUID is generated.
    pub fn add_vertex(&self, id: Option<&str>) -> GraphResult<Vertex> {
        let (id, explicit) = self.new_id(id)?;
        let checked = !self.config().skip_existence_checks;
        if explicit && checked && self.vertices.exists(&id)? {
            return Err(GraphError::validation(format!("Vertex {} already exists", id)));
        }

        self.vertices.write_vertex(&id)?;
        self.ctx.checked_flush()?;

        let vertex = if checked {
            Vertex::with_properties(id, ResidentProperties::complete(PropertyMap::new()))
        } else {
            Vertex::new(id)
        };
        vertex.cache_in(self.ctx.caches());
        debug!("Added vertex {}", vertex.id());
        Ok(vertex)
    }

    /// Vertex by id, or `None` if it does not exist
    pub fn get_vertex(&self, id: impl Into<ElementId>) -> GraphResult<Option<Vertex>> {
        let id = id.into();
        if let Some(vertex) = self.ctx.caches().vertices().retrieve(&id) {
            return Ok(Some(vertex));
        }
        if self.config().skip_existence_checks {
            let vertex = Vertex::new(id);
            vertex.cache_in(self.ctx.caches());
            return Ok(Some(vertex));
        }

        let preload = &self.config().preloaded_properties;
        let Some(found) = self.vertices.read_properties(&id, preload)? else {
            return Ok(None);
        };
        let vertex = Vertex::with_properties(id, resident(preload, found));
        vertex.cache_in(self.ctx.caches());
        Ok(Some(vertex))
    }

    // === Edges ===

    /// Create an edge from `out_vertex` to `in_vertex`
    ///
    /// Endpoint vertices are not checked for existence.
    pub fn add_edge(
        &self,
        id: Option<&str>,
        out_vertex: &ElementId,
        in_vertex: &ElementId,
        label: &str,
    ) -> GraphResult<Edge> {
        if label.trim().is_empty() {
            return Err(GraphError::validation("edge label must not be empty"));
        }
        validate_id(out_vertex.as_str())?;
        validate_id(in_vertex.as_str())?;
        let (id, explicit) = self.new_id(id)?;
        let checked = !self.config().skip_existence_checks;
        if explicit && checked && self.edges.exists(&id)? {
            return Err(GraphError::validation(format!("Edge {} already exists", id)));
        }

        let endpoints = EdgeEndpoints {
            label: label.to_string(),
            out_vertex: out_vertex.clone(),
            in_vertex: in_vertex.clone(),
        };
        self.edges.write_edge(&id, &endpoints)?;
        self.vertices.write_edge_endpoints(&id, &endpoints)?;
        self.ctx.checked_flush()?;

        let mut edge = Edge::new(id, out_vertex.clone(), in_vertex.clone(), label);
        if checked {
            edge = edge.with_properties(ResidentProperties::complete(PropertyMap::new()));
        }
        edge.cache_in(self.ctx.caches());
        debug!("Added edge {} ({} -{}-> {})", edge.id(), out_vertex, label, in_vertex);
        Ok(edge)
    }

    /// Edge by id, or `None` if it does not exist
    pub fn get_edge(&self, id: impl Into<ElementId>) -> GraphResult<Option<Edge>> {
        let id = id.into();
        if let Some(edge) = self.ctx.caches().edges().retrieve(&id) {
            return Ok(Some(edge));
        }
        if self.config().skip_existence_checks {
            let edge = Edge::unresolved(id);
            edge.cache_in(self.ctx.caches());
            return Ok(Some(edge));
        }

        let preload = &self.config().preloaded_properties;
        let Some((endpoints, found)) = self.edges.read_edge(&id, preload)? else {
            return Ok(None);
        };
        let mut edge = Edge::unresolved(id).with_properties(resident(preload, found));
        edge.set_endpoints(endpoints);
        edge.cache_in(self.ctx.caches());
        Ok(Some(edge))
    }

    /// Load label and endpoints into a handle that lacks them
    pub fn resolve_edge(&self, edge: &mut Edge) -> GraphResult<()> {
        if edge.endpoints().is_some() {
            return Ok(());
        }
        let endpoints = self.edges.read_endpoints(edge.id())?.ok_or_else(|| GraphError::NotFound {
            kind: ElementKind::Edge,
            id: edge.id().clone(),
        })?;
        edge.set_endpoints(endpoints);
        edge.cache_in(self.ctx.caches());
        Ok(())
    }

    // === Properties ===

    /// Set a property, keeping key indexes in step
    pub fn set_property<E: GraphElement>(
        &self,
        element: &mut E,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<()> {
        let value = value.into();
        validate_property_key(key)?;
        if value.is_null() {
            return Err(GraphError::validation(format!("null value for property '{}'", key)));
        }
        let kind = E::KIND;
        let indexed = self.key_index.is_indexed(kind, key)?;
        // The index row to replace is the one for the stored value, which
        // buffered writes or other handles may have changed
        let old = if indexed {
            self.table(kind).read_stored_property(element.id(), key)?
        } else {
            None
        };

        self.table(kind).write_property(element.id(), key, &value)?;
        if indexed {
            self.key_index
                .on_property_set(kind, element.id(), key, old.as_ref(), &value)?;
        }
        element.properties_mut().set(key, value);
        element.cache_in(self.ctx.caches());
        self.ctx.checked_flush()?;
        Ok(())
    }

    /// Property value; resident values are served without a store read
    pub fn get_property<E: GraphElement>(
        &self,
        element: &mut E,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        validate_property_key(key)?;
        if let Some(known) = element.properties().lookup(key) {
            return Ok(known.cloned());
        }
        let value = self.table(E::KIND).read_property(element.id(), key)?;
        match &value {
            Some(v) => element.properties_mut().set(key, v.clone()),
            None => element.properties_mut().mark_absent(key),
        }
        element.cache_in(self.ctx.caches());
        Ok(value)
    }

    /// Remove a property; returns the previous value
    pub fn remove_property<E: GraphElement>(
        &self,
        element: &mut E,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        validate_property_key(key)?;
        let kind = E::KIND;
        let indexed = self.key_index.is_indexed(kind, key)?;
        let old = if indexed {
            self.table(kind).read_stored_property(element.id(), key)?
        } else {
            self.get_property(element, key)?
        };
        let Some(old_value) = &old else {
            element.properties_mut().mark_absent(key);
            return Ok(None);
        };
        self.table(kind).delete_property(element.id(), key)?;
        if indexed {
            self.key_index
                .on_property_removed(kind, element.id(), key, old_value)?;
        }
        element.properties_mut().mark_absent(key);
        element.cache_in(self.ctx.caches());
        self.ctx.checked_flush()?;
        Ok(old)
    }

    /// All property keys, read from the store unless already complete
    pub fn property_keys<E: GraphElement>(&self, element: &mut E) -> GraphResult<Vec<String>> {
        if !element.properties().is_complete() {
            let found = self
                .table(E::KIND)
                .read_properties(element.id(), &[])?
                .unwrap_or_default();
            element.properties_mut().load_all(found);
            element.cache_in(self.ctx.caches());
        }
        Ok(element.properties().keys())
    }

    // === Adjacency ===

    /// Edges incident to `vertex`, optionally restricted to `labels`
    pub fn vertex_edges(
        &self,
        vertex: &ElementId,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Edge>> {
        let mut seen = BTreeSet::new();
        let mut edges = Vec::new();
        for pointer in self.vertices.read_pointers(vertex, direction)? {
            if !labels.is_empty() && !labels.contains(&pointer.label.as_str()) {
                continue;
            }
            // Self-loops carry both pointers
            if !seen.insert(pointer.edge.clone()) {
                continue;
            }
            let mut edge = self
                .ctx
                .caches()
                .edges()
                .retrieve(&pointer.edge)
                .unwrap_or_else(|| Edge::unresolved(pointer.edge.clone()));
            if edge.endpoints().is_none() {
                edge.set_endpoints(pointer.endpoints(vertex));
                edge.cache_in(self.ctx.caches());
            }
            edges.push(edge);
        }
        Ok(edges)
    }

    /// Vertices on the far side of `vertex`'s edges, one per edge
    pub fn adjacent_vertices(
        &self,
        vertex: &ElementId,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Vertex>> {
        let pointers = self.vertices.read_pointers(vertex, direction)?;
        Ok(pointers
            .into_iter()
            .filter(|p| labels.is_empty() || labels.contains(&p.label.as_str()))
            .map(|p| {
                self.ctx
                    .caches()
                    .vertices()
                    .retrieve(&p.neighbor)
                    .unwrap_or_else(|| Vertex::new(p.neighbor))
            })
            .collect())
    }

    // === Scans and lookups ===

    /// Every vertex, lazily
    pub fn vertices(&self) -> GraphResult<VertexIter<'_>> {
        let spec = ScanSpec::all().fetch_family(keys::LABEL);
        let cells = self.ctx.scan(&self.config().vertex_table_name(), spec)?;
        Ok(VertexIter::rows(cells, self.ctx.caches()))
    }

    /// Every edge, lazily
    pub fn edges(&self) -> GraphResult<EdgeIter<'_>> {
        let spec = ScanSpec::all().fetch_family(keys::LABEL);
        let cells = self.ctx.scan(&self.config().edge_table_name(), spec)?;
        Ok(EdgeIter::rows(cells, self.ctx.caches()))
    }

    /// Vertices whose `key` equals `value`
    pub fn vertices_with(
        &self,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<VertexIter<'_>> {
        let value = value.into();
        validate_property_key(key)?;
        self.lookup(ElementKind::Vertex, key, value)
    }

    /// Edges whose `key` equals `value`; key `label` matches edge labels
    pub fn edges_with(
        &self,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<EdgeIter<'_>> {
        let value = value.into();
        if key == keys::LABEL_PROPERTY {
            let Some(label) = value.as_string() else {
                return Ok(EdgeIter::ids(Vec::new(), self.ctx.caches()));
            };
            let encoded = codec::encode(&PropertyValue::String(label.to_string()))?;
            let spec = ScanSpec::all().fetch_family(keys::LABEL).with_value(encoded);
            let cells = self.ctx.scan(&self.config().edge_table_name(), spec)?;
            return Ok(EdgeIter::rows(cells, self.ctx.caches()));
        }
        validate_property_key(key)?;
        self.lookup(ElementKind::Edge, key, value)
    }

    fn lookup<E: ScannedElement>(
        &self,
        kind: ElementKind,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<ElementIter<'_, E>> {
        if value.is_null() {
            return Err(GraphError::validation(format!("null value for property '{}'", key)));
        }
        if self.key_index.is_indexed(kind, key)? {
            let ids = self.key_index.lookup(kind, key, &value)?;
            return Ok(ElementIter::ids(ids, self.ctx.caches()).with_match(key, value));
        }

        let encoded = codec::encode(&value)?;
        if !codec::tag_of(&encoded)?.is_comparable() {
            return Err(GraphError::UnsupportedOperation(format!(
                "unindexed lookup on {} value of '{}'",
                value.type_name(),
                key
            )));
        }
        let spec = ScanSpec::all().fetch_family(key).with_value(encoded);
        let cells = self.ctx.scan(&kind.data_table(self.config()), spec)?;
        Ok(ElementIter::rows(cells, self.ctx.caches()).with_match(key, value))
    }

    // === Named indexes ===

    pub fn create_index(&self, name: &str, kind: ElementKind) -> GraphResult<Index> {
        self.named.create_index(name, kind)
    }

    pub fn get_index(&self, name: &str, kind: ElementKind) -> GraphResult<Option<Index>> {
        self.named.get_index(name, kind)
    }

    pub fn indices(&self) -> GraphResult<Vec<Index>> {
        self.named.indices()
    }

    pub fn drop_index(&self, name: &str) -> GraphResult<()> {
        self.named.drop_index(name)
    }

    // === Key indexes ===

    /// Index `key` for `kind`, rebuilding from existing rows
    pub fn create_key_index(&self, key: &str, kind: ElementKind) -> GraphResult<usize> {
        self.key_index.create_key_index(key, kind)
    }

    pub fn drop_key_index(&self, key: &str, kind: ElementKind) -> GraphResult<usize> {
        self.key_index.drop_key_index(key, kind)
    }

    pub fn indexed_keys(&self, kind: ElementKind) -> GraphResult<Vec<String>> {
        self.key_index.indexed_keys(kind)
    }

    // === Lifecycle ===

    /// Write out buffered mutations
    pub fn flush(&self) -> GraphResult<()> {
        self.ctx.flush()?;
        Ok(())
    }

    /// Drop and recreate every table of this graph
    pub fn clear(&self) -> GraphResult<()> {
        self.ctx.flush()?;
        self.ctx.drop_tables()?;
        for table in self.config().table_names() {
            self.ctx.store().create_table(&table)?;
        }
        self.ctx.caches().clear_all();
        info!("Cleared graph {}", self.config().graph_name);
        Ok(())
    }

    /// Flush everything down to the store and drop cached handles
    pub fn shutdown(&self) -> GraphResult<()> {
        self.ctx.flush()?;
        self.ctx.store().flush()?;
        self.ctx.caches().clear_all();
        info!("Shut down graph {}", self.config().graph_name);
        Ok(())
    }

    pub fn is_empty(&self) -> GraphResult<bool> {
        Ok(self.vertices()?.next().is_none() && self.edges()?.next().is_none())
    }

    pub fn summary(&self) -> GraphResult<GraphSummary> {
        let named_indices = if self.config().indexable_graph_disabled {
            Vec::new()
        } else {
            self.indices()?.iter().map(|i| i.name().to_string()).collect()
        };
        Ok(GraphSummary {
            graph_name: self.config().graph_name.clone(),
            vertex_count: self.vertices()?.count(),
            edge_count: self.edges()?.count(),
            named_indices,
            vertex_key_indices: self.indexed_keys(ElementKind::Vertex)?,
            edge_key_indices: self.indexed_keys(ElementKind::Edge)?,
        })
    }
}

/// Resident properties after a read with the given preload list
fn resident(preload: &[String], found: PropertyMap) -> ResidentProperties {
    if preload.is_empty() {
        ResidentProperties::complete(found)
    } else {
        let mut properties = ResidentProperties::new();
        properties.load_subset(preload, found);
        properties
    }
}

fn validate_id(id: &str) -> GraphResult<()> {
    if !keys::id_is_encodable(id) {
        return Err(GraphError::validation(format!(
            "id '{}' must be non-empty and must not contain '{}'",
            id,
            keys::ID_DELIM
        )));
    }
    Ok(())
}

fn validate_property_key(key: &str) -> GraphResult<()> {
    if key.trim().is_empty() {
        return Err(GraphError::validation("property key must not be empty"));
    }
    if keys::is_reserved_property(key) {
        return Err(GraphError::validation(format!("'{}' is a reserved property key", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn graph() -> Graph {
        Graph::open(GraphConfig::in_memory("test")).unwrap()
    }

    #[test]
    fn test_add_and_get_vertex() {
        let graph = graph();
        let vertex = graph.add_vertex(Some("A")).unwrap();
        assert_eq!(vertex.id().as_str(), "A");
        assert!(graph.get_vertex("A").unwrap().is_some());
        assert!(graph.get_vertex("never").unwrap().is_none());
    }

    #[test]
    fn test_generated_vertex_id() {
        let graph = graph();
        let vertex = graph.add_vertex(None).unwrap();
        assert!(graph.get_vertex(vertex.id().clone()).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_vertex_rejected() {
        let graph = graph();
        graph.add_vertex(Some("A")).unwrap();
        assert!(graph.add_vertex(Some("A")).unwrap_err().is_validation());
    }

    #[test]
    fn test_skip_existence_checks_allows_rewrite() {
        let graph = Graph::open(GraphConfig::in_memory("t").set_skip_existence_checks(true)).unwrap();
        graph.add_vertex(Some("A")).unwrap();
        graph.add_vertex(Some("A")).unwrap();
        // Without checks every id resolves to a handle
        assert!(graph.get_vertex("ghost").unwrap().is_some());
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let graph = graph();
        assert!(graph.add_vertex(Some("a_b")).unwrap_err().is_validation());
        assert!(graph.add_vertex(Some("")).unwrap_err().is_validation());
        let err = graph
            .add_edge(None, &"a_b".into(), &"c".into(), "knows")
            .unwrap_err();
        assert!(err.is_validation());
        let err = graph.add_edge(None, &"a".into(), &"c".into(), " ").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_property_round_trip() {
        let graph = graph();
        let mut vertex = graph.add_vertex(Some("A")).unwrap();
        graph.set_property(&mut vertex, "name", "Alice").unwrap();
        graph.set_property(&mut vertex, "age", 30i64).unwrap();

        let mut fresh = Vertex::new("A");
        assert_eq!(graph.get_property(&mut fresh, "name").unwrap(), Some("Alice".into()));
        assert_eq!(graph.get_property(&mut fresh, "missing").unwrap(), None);
        assert_eq!(graph.property_keys(&mut fresh).unwrap(), vec!["age".to_string(), "name".to_string()]);

        assert_eq!(graph.remove_property(&mut fresh, "age").unwrap(), Some(PropertyValue::Integer(30)));
        assert_eq!(graph.remove_property(&mut fresh, "age").unwrap(), None);
        let mut again = Vertex::new("A");
        assert_eq!(graph.get_property(&mut again, "age").unwrap(), None);
    }

    #[test]
    fn test_property_validation() {
        let graph = graph();
        let mut vertex = graph.add_vertex(Some("A")).unwrap();
        for key in ["", "  ", "id", "label", "L"] {
            assert!(graph.set_property(&mut vertex, key, 1i64).unwrap_err().is_validation());
        }
        let err = graph
            .set_property(&mut vertex, "x", PropertyValue::Null)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(graph.property_keys(&mut vertex).unwrap().is_empty());
    }

    #[test]
    fn test_preloaded_properties() {
        let config = GraphConfig::in_memory("t").set_preloaded_properties(vec!["name".to_string()]);
        let graph = Graph::open(config).unwrap();
        let mut vertex = graph.add_vertex(Some("A")).unwrap();
        graph.set_property(&mut vertex, "name", "Alice").unwrap();
        graph.set_property(&mut vertex, "age", 3i64).unwrap();

        let loaded = graph.get_vertex("A").unwrap().unwrap();
        assert_eq!(loaded.cached_property("name"), Some(&PropertyValue::from("Alice")));
        assert_eq!(loaded.cached_property("age"), None);
    }

    #[test]
    fn test_cache_serves_reads() {
        let config = GraphConfig::in_memory("t").set_vertex_cache(CacheConfig::enabled(10, None));
        let graph = Graph::open(config).unwrap();
        let mut vertex = graph.add_vertex(Some("A")).unwrap();
        graph.set_property(&mut vertex, "name", "Alice").unwrap();

        let cached = graph.get_vertex("A").unwrap().unwrap();
        assert_eq!(cached.cached_property("name"), Some(&PropertyValue::from("Alice")));
    }

    #[test]
    fn test_edges_and_adjacency() {
        let graph = graph();
        let a = graph.add_vertex(Some("A")).unwrap();
        let b = graph.add_vertex(Some("B")).unwrap();
        let c = graph.add_vertex(Some("C")).unwrap();
        graph.add_edge(Some("e1"), a.id(), b.id(), "knows").unwrap();
        graph.add_edge(Some("e2"), a.id(), c.id(), "likes").unwrap();
        graph.add_edge(Some("e3"), c.id(), a.id(), "knows").unwrap();

        assert_eq!(graph.vertex_edges(a.id(), Direction::Out, &[]).unwrap().len(), 2);
        assert_eq!(graph.vertex_edges(a.id(), Direction::In, &[]).unwrap().len(), 1);
        assert_eq!(graph.vertex_edges(a.id(), Direction::Both, &["knows"]).unwrap().len(), 2);

        let neighbors: Vec<String> = graph
            .adjacent_vertices(a.id(), Direction::Out, &["likes"])
            .unwrap()
            .iter()
            .map(|v| v.id().to_string())
            .collect();
        assert_eq!(neighbors, vec!["C".to_string()]);

        let e3 = graph.get_edge("e3").unwrap().unwrap();
        assert_eq!(e3.out_vertex(), Some(c.id()));
        assert_eq!(e3.label(), Some("knows"));
    }

    #[test]
    fn test_self_loop_listed_once() {
        let graph = graph();
        let a = graph.add_vertex(Some("A")).unwrap();
        graph.add_edge(Some("loop"), a.id(), a.id(), "self").unwrap();
        assert_eq!(graph.vertex_edges(a.id(), Direction::Both, &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_edge() {
        let graph = graph();
        graph.add_edge(Some("e1"), &"A".into(), &"B".into(), "knows").unwrap();
        let mut edge = Edge::unresolved("e1");
        graph.resolve_edge(&mut edge).unwrap();
        assert_eq!(edge.label(), Some("knows"));

        let mut ghost = Edge::unresolved("ghost");
        assert!(graph.resolve_edge(&mut ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unindexed_lookup_on_opaque_value() {
        let graph = graph();
        let result = graph.vertices_with("blob", PropertyValue::Bytes(vec![1, 2]));
        assert!(matches!(result, Err(GraphError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_edges_with_label() {
        let graph = graph();
        graph.add_edge(Some("e1"), &"A".into(), &"B".into(), "knows").unwrap();
        graph.add_edge(Some("e2"), &"A".into(), &"C".into(), "likes").unwrap();
        let found: Vec<Edge> = graph
            .edges_with("label", "knows")
            .unwrap()
            .collect::<GraphResult<_>>()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "e1");
        assert_eq!(graph.edges_with("label", 5i64).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_and_is_empty() {
        let graph = graph();
        assert!(graph.is_empty().unwrap());
        graph.add_vertex(Some("A")).unwrap();
        graph.create_index("idx", ElementKind::Vertex).unwrap();
        assert!(!graph.is_empty().unwrap());

        graph.clear().unwrap();
        assert!(graph.is_empty().unwrap());
        assert!(graph.indices().unwrap().is_empty());
        assert!(graph.get_vertex("A").unwrap().is_none());
    }

    #[test]
    fn test_summary_serializes() {
        let graph = graph();
        graph.add_vertex(Some("A")).unwrap();
        graph.create_key_index("name", ElementKind::Vertex).unwrap();
        let summary = graph.summary().unwrap();
        assert_eq!(summary.vertex_count, 1);
        assert_eq!(summary.vertex_key_indices, vec!["name".to_string()]);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"graph_name\":\"test\""));
    }

    fn auto_indexed(auto_flush: bool) -> Graph {
        let config = GraphConfig::in_memory("auto")
            .set_auto_index(true)
            .set_auto_flush(auto_flush);
        Graph::open(config).unwrap()
    }

    #[test]
    fn test_index_follows_buffered_overwrite() {
        let graph = auto_indexed(false);
        let mut first = graph.add_vertex(Some("A")).unwrap();
        graph.set_property(&mut first, "name", "Alice").unwrap();
        let mut second = Vertex::new("A");
        graph.set_property(&mut second, "name", "Bob").unwrap();
        graph.flush().unwrap();

        assert_eq!(graph.vertices_with("name", "Alice").unwrap().count(), 0);
        assert_eq!(graph.vertices_with("name", "Bob").unwrap().count(), 1);
    }

    #[test]
    fn test_index_follows_overwrite_through_stale_handle() {
        let graph = auto_indexed(true);
        let mut stale = graph.add_vertex(Some("A")).unwrap();
        let mut other = Vertex::new("A");
        graph.set_property(&mut other, "name", "Alice").unwrap();

        // `stale` is complete and believes `name` is unset
        graph.set_property(&mut stale, "name", "Bob").unwrap();
        assert_eq!(graph.vertices_with("name", "Alice").unwrap().count(), 0);
        assert_eq!(graph.vertices_with("name", "Bob").unwrap().count(), 1);
    }

    #[test]
    fn test_indexed_remove_through_stale_handle() {
        let graph = auto_indexed(true);
        let mut stale = graph.add_vertex(Some("A")).unwrap();
        let mut other = Vertex::new("A");
        graph.set_property(&mut other, "name", "Alice").unwrap();

        assert_eq!(
            graph.remove_property(&mut stale, "name").unwrap(),
            Some(PropertyValue::from("Alice"))
        );
        assert_eq!(graph.vertices_with("name", "Alice").unwrap().count(), 0);
        let mut fresh = Vertex::new("A");
        assert_eq!(graph.get_property(&mut fresh, "name").unwrap(), None);
    }

    #[test]
    fn test_rejected_flush_keeps_later_writes() {
        let graph = Graph::open(GraphConfig::in_memory("w").set_auto_flush(false)).unwrap();
        let index = graph.create_index("tmp", ElementKind::Vertex).unwrap();
        graph.drop_index("tmp").unwrap();

        index.put("k", &"v".into(), &"A".into()).unwrap();
        let vertex = graph.add_vertex(None).unwrap();

        let err = graph.flush().unwrap_err();
        assert!(matches!(
            err,
            GraphError::Storage(crate::store::StoreError::BatchRejected { rejected: 1, .. })
        ));
        graph.flush().unwrap();
        assert!(graph.get_vertex(vertex.id().clone()).unwrap().is_some());
    }
}
