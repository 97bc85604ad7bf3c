//! Edge handle

use super::{ElementId, ElementKind, GraphElement, ResidentProperties};
use crate::cache::ElementCaches;
use crate::codec::PropertyValue;

/// Label and endpoints of an edge; immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeEndpoints {
    pub label: String,
    /// Edge goes FROM this vertex
    pub out_vertex: ElementId,
    /// Edge goes TO this vertex
    pub in_vertex: ElementId,
}

/// A directed edge in the property graph
///
/// Handles produced by property lookups may not carry endpoints yet;
/// `Graph::resolve_edge` loads them.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: ElementId,
    endpoints: Option<EdgeEndpoints>,
    properties: ResidentProperties,
}

impl Edge {
    pub fn new(
        id: impl Into<ElementId>,
        out_vertex: ElementId,
        in_vertex: ElementId,
        label: impl Into<String>,
    ) -> Self {
        Edge {
            id: id.into(),
            endpoints: Some(EdgeEndpoints {
                label: label.into(),
                out_vertex,
                in_vertex,
            }),
            properties: ResidentProperties::new(),
        }
    }

    /// Handle that only knows its id
    pub fn unresolved(id: impl Into<ElementId>) -> Self {
        Edge {
            id: id.into(),
            endpoints: None,
            properties: ResidentProperties::new(),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn endpoints(&self) -> Option<&EdgeEndpoints> {
        self.endpoints.as_ref()
    }

    pub fn set_endpoints(&mut self, endpoints: EdgeEndpoints) {
        self.endpoints = Some(endpoints);
    }

    pub fn label(&self) -> Option<&str> {
        self.endpoints.as_ref().map(|e| e.label.as_str())
    }

    pub fn out_vertex(&self) -> Option<&ElementId> {
        self.endpoints.as_ref().map(|e| &e.out_vertex)
    }

    pub fn in_vertex(&self) -> Option<&ElementId> {
        self.endpoints.as_ref().map(|e| &e.in_vertex)
    }

    pub fn with_properties(mut self, properties: ResidentProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Resident value, if known. Use `Graph::get_property` to fetch.
    pub fn cached_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.lookup(key).flatten()
    }
}

impl GraphElement for Edge {
    const KIND: ElementKind = ElementKind::Edge;

    fn id(&self) -> &ElementId {
        &self.id
    }

    fn properties(&self) -> &ResidentProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ResidentProperties {
        &mut self.properties
    }

    fn cache_in(&self, caches: &ElementCaches) {
        caches.edges().cache(self.id.clone(), self.clone());
    }
}
