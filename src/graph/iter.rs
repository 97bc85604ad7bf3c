//! Lazy element iteration
//!
//! Wraps either a row-grouped scan cursor or a list of ids from an index
//! lookup. Single pass; re-issue the query to iterate again.

use crate::cache::ElementCaches;
use crate::codec::PropertyValue;
use crate::element::{Edge, ElementId, GraphElement, Vertex};
use crate::error::{GraphError, GraphResult};
use crate::store::{Cell, CellIter, Rows};
use crate::tables::edge::{endpoints_from_label_cell, is_label_cell};
use crate::tables::properties_from_cells;
use std::marker::PhantomData;

/// Element types that can be rebuilt from scanned rows or bare ids
pub trait ScannedElement: GraphElement + Sized {
    /// Handle from the cells a scan returned for one row
    fn from_row(id: ElementId, cells: &[Cell]) -> GraphResult<Self>;

    /// Handle knowing only its id
    fn from_id(id: ElementId) -> Self;

    fn cached(caches: &ElementCaches, id: &ElementId) -> Option<Self>;
}

impl ScannedElement for Vertex {
    fn from_row(id: ElementId, cells: &[Cell]) -> GraphResult<Self> {
        let mut vertex = Vertex::new(id);
        for (key, value) in properties_from_cells(cells)? {
            vertex.properties_mut().set(key, value);
        }
        Ok(vertex)
    }

    fn from_id(id: ElementId) -> Self {
        Vertex::new(id)
    }

    fn cached(caches: &ElementCaches, id: &ElementId) -> Option<Self> {
        caches.vertices().retrieve(id)
    }
}

impl ScannedElement for Edge {
    fn from_row(id: ElementId, cells: &[Cell]) -> GraphResult<Self> {
        let mut edge = Edge::unresolved(id);
        if let Some(label_cell) = cells.iter().find(|c| is_label_cell(c)) {
            edge.set_endpoints(endpoints_from_label_cell(label_cell)?);
        }
        for (key, value) in properties_from_cells(cells)? {
            edge.properties_mut().set(key, value);
        }
        Ok(edge)
    }

    fn from_id(id: ElementId) -> Self {
        Edge::unresolved(id)
    }

    fn cached(caches: &ElementCaches, id: &ElementId) -> Option<Self> {
        caches.edges().retrieve(id)
    }
}

enum Source<'g> {
    Rows(Rows<'g>),
    Ids(std::vec::IntoIter<ElementId>),
}

/// Lazy sequence of element handles
pub struct ElementIter<'g, E> {
    source: Source<'g>,
    caches: &'g ElementCaches,
    /// Property the query matched on; set on every handle produced
    matched: Option<(String, PropertyValue)>,
    _element: PhantomData<E>,
}

pub type VertexIter<'g> = ElementIter<'g, Vertex>;
pub type EdgeIter<'g> = ElementIter<'g, Edge>;

impl<'g, E: ScannedElement> ElementIter<'g, E> {
    /// Over a table scan; handles are not cached
    pub(crate) fn rows(cells: CellIter<'g>, caches: &'g ElementCaches) -> Self {
        Self {
            source: Source::Rows(Rows::new(cells)),
            caches,
            matched: None,
            _element: PhantomData,
        }
    }

    /// Over index hits; reuses cached handles and caches new ones
    pub(crate) fn ids(ids: Vec<ElementId>, caches: &'g ElementCaches) -> Self {
        Self {
            source: Source::Ids(ids.into_iter()),
            caches,
            matched: None,
            _element: PhantomData,
        }
    }

    pub(crate) fn with_match(mut self, key: &str, value: PropertyValue) -> Self {
        self.matched = Some((key.to_string(), value));
        self
    }

    fn apply_match(&self, element: &mut E) {
        if let Some((key, value)) = &self.matched {
            element.properties_mut().set(key.clone(), value.clone());
        }
    }
}

impl<'g, E: ScannedElement> Iterator for ElementIter<'g, E> {
    type Item = GraphResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match &mut self.source {
            Source::Rows(rows) => {
                let row = rows.next()?;
                row.map_err(GraphError::from).and_then(|(row, cells)| {
                    E::from_row(ElementId::new(String::from_utf8_lossy(&row).into_owned()), &cells)
                })
            }
            Source::Ids(ids) => {
                let id = ids.next()?;
                let element = E::cached(self.caches, &id).unwrap_or_else(|| E::from_id(id));
                Ok(element)
            }
        };
        let cache = matches!(self.source, Source::Ids(_));
        Some(item.map(|mut element| {
            self.apply_match(&mut element);
            if cache {
                element.cache_in(self.caches);
            }
            element
        }))
    }
}
