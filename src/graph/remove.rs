//! Deletion cascades

use super::Graph;
use crate::element::{ElementId, ElementKind};
use crate::error::{GraphError, GraphResult};
use crate::store::{Cell, ScanSpec, StoreResult};
use crate::tables::edge::{endpoints_from_label_cell, is_label_cell};
use crate::tables::{EdgePointer, ElementTable};
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl Graph {
    /// Remove a vertex, every incident edge, and their index entries
    pub fn remove_vertex(&self, id: &ElementId) -> GraphResult<()> {
        self.ctx.caches().remove(id, ElementKind::Vertex);
        self.named.clear_element(ElementKind::Vertex, id)?;

        let cells = self.flushed_row(&self.vertices.table_name(), id)?;
        if cells.is_empty() {
            return Err(GraphError::NotFound {
                kind: ElementKind::Vertex,
                id: id.clone(),
            });
        }

        let mut done = "reading its row";
        match self.cascade_vertex(id, &cells, &mut done) {
            Ok(edges) => {
                debug!("Removed vertex {} and {} edges", id, edges);
                Ok(())
            }
            Err(e) => {
                warn!("Removal of vertex {} stopped after {}: {}", id, done, e);
                Err(e)
            }
        }
    }

    fn cascade_vertex(
        &self,
        id: &ElementId,
        cells: &[Cell],
        done: &mut &'static str,
    ) -> GraphResult<usize> {
        let mut removed = BTreeSet::new();
        for pointer in cells.iter().filter_map(EdgePointer::from_cell) {
            if !removed.insert(pointer.edge.clone()) {
                continue;
            }
            let endpoints = pointer.endpoints(id);
            self.vertices.delete_edge_endpoints(
                &pointer.edge,
                &endpoints.out_vertex,
                &endpoints.in_vertex,
            )?;
            self.drop_edge_row(&pointer.edge)?;
            *done = "removing some incident edges";
        }
        *done = "removing its incident edges";

        self.key_index.remove_cells(ElementKind::Vertex, cells)?;
        *done = "removing its key-index entries";
        self.vertices.delete_cells(cells)?;
        *done = "deleting its row";
        self.ctx.checked_flush()?;
        Ok(removed.len())
    }

    /// Remove an edge, both endpoint pointers and its index entries
    ///
    /// An edge row without a label cell is left alone.
    pub fn remove_edge(&self, id: &ElementId) -> GraphResult<()> {
        let cells = self.evict_edge(id)?;
        let Some(label_cell) = cells.iter().find(|c| is_label_cell(c)) else {
            warn!("Edge {} has no label cell, nothing removed", id);
            return Ok(());
        };
        let endpoints = endpoints_from_label_cell(label_cell)?;

        let mut done = "reading its row";
        let result = (|| {
            self.key_index.remove_cells(ElementKind::Edge, &cells)?;
            done = "removing its key-index entries";
            self.vertices
                .delete_edge_endpoints(id, &endpoints.out_vertex, &endpoints.in_vertex)?;
            done = "removing its endpoint pointers";
            self.edges.delete_edge(&cells)?;
            done = "deleting its row";
            self.ctx.checked_flush()?;
            Ok::<_, GraphError>(())
        })();
        match result {
            Ok(()) => {
                debug!("Removed edge {}", id);
                Ok(())
            }
            Err(e) => {
                warn!("Removal of edge {} stopped after {}: {}", id, done, e);
                Err(e)
            }
        }
    }

    fn flushed_row(&self, table: &str, id: &ElementId) -> StoreResult<Vec<Cell>> {
        self.ctx
            .scan_flushed(table, ScanSpec::row(id.as_bytes()))?
            .collect()
    }

    /// Drop cached and named-index references to an edge, then read its row
    fn evict_edge(&self, id: &ElementId) -> GraphResult<Vec<Cell>> {
        self.ctx.caches().remove(id, ElementKind::Edge);
        self.named.clear_element(ElementKind::Edge, id)?;
        Ok(self.flushed_row(&self.edges.table_name(), id)?)
    }

    /// Edge row and index deletes for an edge whose pointers are handled
    /// by the caller
    fn drop_edge_row(&self, id: &ElementId) -> GraphResult<()> {
        let cells = self.evict_edge(id)?;
        self.key_index.remove_cells(ElementKind::Edge, &cells)?;
        self.edges.delete_edge(&cells)
    }
}
