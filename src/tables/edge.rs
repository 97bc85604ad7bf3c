//! Edge table

use super::{properties_from_cells, ElementTable};
use crate::codec::{self, PropertyMap};
use crate::context::GraphContext;
use crate::element::{EdgeEndpoints, ElementId, ElementKind};
use crate::error::{GraphError, GraphResult};
use crate::keys;
use crate::store::{Cell, ScanSpec, StoreResult};
use std::sync::Arc;

pub struct EdgeTable {
    ctx: Arc<GraphContext>,
}

impl EdgeTable {
    pub fn new(ctx: Arc<GraphContext>) -> Self {
        Self { ctx }
    }

    /// Label and both endpoint cells on the edge row
    pub fn write_edge(&self, id: &ElementId, endpoints: &EdgeEndpoints) -> GraphResult<()> {
        let mutation = keys::edge_structure(
            id,
            &endpoints.out_vertex,
            &endpoints.in_vertex,
            &endpoints.label,
        )?;
        self.ctx.add(&self.table_name(), mutation)?;
        Ok(())
    }

    /// Queue removal of every given cell of an edge row
    pub fn delete_edge(&self, cells: &[Cell]) -> GraphResult<()> {
        self.delete_cells(cells)
    }

    /// Endpoints plus properties (all, or only `keys`) in one row scan
    pub fn read_edge(
        &self,
        id: &ElementId,
        keys: &[String],
    ) -> GraphResult<Option<(EdgeEndpoints, PropertyMap)>> {
        let mut spec = ScanSpec::row(id.as_bytes());
        if !keys.is_empty() {
            spec = spec.fetch_family(keys::LABEL);
            for key in keys {
                spec = spec.fetch_family(key.as_str());
            }
        }
        let cells = self
            .ctx
            .scan(&self.table_name(), spec)?
            .collect::<StoreResult<Vec<_>>>()?;
        let Some(label_cell) = cells.iter().find(|c| is_label_cell(c)) else {
            return Ok(None);
        };
        let endpoints = endpoints_from_label_cell(label_cell)?;
        Ok(Some((endpoints, properties_from_cells(&cells)?)))
    }

    /// Label and endpoints, or `None` when the edge has no label cell
    pub fn read_endpoints(&self, id: &ElementId) -> GraphResult<Option<EdgeEndpoints>> {
        let spec = ScanSpec::row(id.as_bytes()).fetch_family(keys::LABEL);
        let cells = self
            .ctx
            .scan(&self.table_name(), spec)?
            .collect::<StoreResult<Vec<_>>>()?;
        match cells.first() {
            Some(cell) => Ok(Some(endpoints_from_label_cell(cell)?)),
            None => Ok(None),
        }
    }
}

/// Decode an edge label cell `(e, L, <in>_<out>) -> label`
pub fn endpoints_from_label_cell(cell: &Cell) -> GraphResult<EdgeEndpoints> {
    let (out_vertex, in_vertex) = keys::parse_label_qualifier(&cell.qualifier).ok_or_else(|| {
        GraphError::validation(format!("malformed label cell on edge {}", cell.row_str()))
    })?;
    let label = codec::decode(&cell.value)?;
    let label = label
        .as_string()
        .ok_or_else(|| GraphError::validation(format!("non-string label on edge {}", cell.row_str())))?
        .to_string();
    Ok(EdgeEndpoints {
        label,
        out_vertex,
        in_vertex,
    })
}

/// Label cell of an edge row
pub fn is_label_cell(cell: &Cell) -> bool {
    cell.family == keys::LABEL.as_bytes()
}

impl ElementTable for EdgeTable {
    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn context(&self) -> &GraphContext {
        &self.ctx
    }

    fn row_exists(&self, cells: &[Cell]) -> bool {
        cells.iter().any(is_label_cell)
    }
}
