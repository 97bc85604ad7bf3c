//! Vertex table

use super::ElementTable;
use crate::context::GraphContext;
use crate::element::{Direction, EdgeEndpoints, ElementId, ElementKind};
use crate::error::GraphResult;
use crate::keys;
use crate::store::{Cell, ScanSpec, StoreResult};
use std::sync::Arc;
use tracing::warn;

/// One edge pointer cell read from a vertex row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePointer {
    /// `Out` when the vertex is the edge's out-vertex
    pub direction: Direction,
    pub neighbor: ElementId,
    pub edge: ElementId,
    pub label: String,
}

impl EdgePointer {
    /// Endpoints of the edge as seen from `vertex`
    pub fn endpoints(&self, vertex: &ElementId) -> EdgeEndpoints {
        let (out_vertex, in_vertex) = match self.direction {
            Direction::In => (self.neighbor.clone(), vertex.clone()),
            _ => (vertex.clone(), self.neighbor.clone()),
        };
        EdgeEndpoints {
            label: self.label.clone(),
            out_vertex,
            in_vertex,
        }
    }

    /// Parse a pointer cell; `None` for any other cell
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        let direction = if cell.family == keys::OUT_EDGE.as_bytes() {
            Direction::Out
        } else if cell.family == keys::IN_EDGE.as_bytes() {
            Direction::In
        } else {
            return None;
        };
        let Some((neighbor, edge)) = keys::parse_pointer_qualifier(&cell.qualifier) else {
            warn!("Unparseable edge pointer in vertex row {}", cell.row_str());
            return None;
        };
        Some(Self {
            direction,
            neighbor,
            edge,
            label: String::from_utf8_lossy(&cell.value).into_owned(),
        })
    }
}

pub struct VertexTable {
    ctx: Arc<GraphContext>,
}

impl VertexTable {
    pub fn new(ctx: Arc<GraphContext>) -> Self {
        Self { ctx }
    }

    /// Exists marker for a new vertex
    pub fn write_vertex(&self, id: &ElementId) -> GraphResult<()> {
        self.ctx.add(&self.table_name(), keys::vertex_exists(id))?;
        Ok(())
    }

    /// Pointer cells on both endpoint rows of an edge
    pub fn write_edge_endpoints(&self, edge: &ElementId, endpoints: &EdgeEndpoints) -> GraphResult<()> {
        let out = keys::vertex_edge_pointer(
            &endpoints.out_vertex,
            keys::OUT_EDGE,
            &endpoints.in_vertex,
            edge,
            &endpoints.label,
        );
        let inc = keys::vertex_edge_pointer(
            &endpoints.in_vertex,
            keys::IN_EDGE,
            &endpoints.out_vertex,
            edge,
            &endpoints.label,
        );
        self.ctx.add_all(&self.table_name(), [out, inc])?;
        Ok(())
    }

    pub fn delete_edge_endpoints(
        &self,
        edge: &ElementId,
        out_vertex: &ElementId,
        in_vertex: &ElementId,
    ) -> GraphResult<()> {
        let out = keys::vertex_edge_pointer_delete(out_vertex, keys::OUT_EDGE, in_vertex, edge);
        let inc = keys::vertex_edge_pointer_delete(in_vertex, keys::IN_EDGE, out_vertex, edge);
        self.ctx.add_all(&self.table_name(), [out, inc])?;
        Ok(())
    }

    /// Edge pointers of a vertex in the given direction
    pub fn read_pointers(&self, id: &ElementId, direction: Direction) -> GraphResult<Vec<EdgePointer>> {
        let mut spec = ScanSpec::row(id.as_bytes());
        if direction.includes_out() {
            spec = spec.fetch_family(keys::OUT_EDGE);
        }
        if direction.includes_in() {
            spec = spec.fetch_family(keys::IN_EDGE);
        }
        let cells = self
            .ctx
            .scan(&self.table_name(), spec)?
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(cells.iter().filter_map(EdgePointer::from_cell).collect())
    }
}

impl ElementTable for VertexTable {
    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn context(&self) -> &GraphContext {
        &self.ctx
    }

    fn row_exists(&self, cells: &[Cell]) -> bool {
        cells.iter().any(keys::is_exists_marker)
    }
}
