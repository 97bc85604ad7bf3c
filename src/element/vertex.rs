//! Vertex handle

use super::{ElementId, ElementKind, GraphElement, ResidentProperties};
use crate::cache::ElementCaches;
use crate::codec::PropertyValue;

/// A vertex in the property graph
///
/// Incident edges are not held on the handle; they live as pointer cells
/// in the vertex row and are read on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    id: ElementId,
    properties: ResidentProperties,
}

impl Vertex {
    pub fn new(id: impl Into<ElementId>) -> Self {
        Vertex {
            id: id.into(),
            properties: ResidentProperties::new(),
        }
    }

    pub fn with_properties(id: impl Into<ElementId>, properties: ResidentProperties) -> Self {
        Vertex {
            id: id.into(),
            properties,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Resident value, if known. Use `Graph::get_property` to fetch.
    pub fn cached_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.lookup(key).flatten()
    }
}

impl GraphElement for Vertex {
    const KIND: ElementKind = ElementKind::Vertex;

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
        caches.vertices().cache(self.id.clone(), self.clone());
    }
}
