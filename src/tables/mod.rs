//! Primary table wrappers
//!
//! Translate graph-level reads and writes into cell mutations and scans
//! on the vertex and edge tables. Writes are buffered through the
//! context's writer; callers decide when to flush.

pub mod edge;
pub mod vertex;

pub use edge::EdgeTable;
pub use vertex::{EdgePointer, VertexTable};

use crate::codec::{self, PropertyMap, PropertyValue};
use crate::context::GraphContext;
use crate::element::{ElementId, ElementKind};
use crate::error::GraphResult;
use crate::keys;
use crate::store::{Cell, CellIter, ScanSpec, StoreResult};

/// Shared behaviour of the vertex and edge tables
pub trait ElementTable {
    fn kind(&self) -> ElementKind;

    fn context(&self) -> &GraphContext;

    /// Row holds the structural cell that makes the element exist
    fn row_exists(&self, cells: &[Cell]) -> bool;

    fn table_name(&self) -> String {
        self.kind().data_table(self.context().config())
    }

    /// Every cell of the element's row
    fn read_row(&self, id: &ElementId) -> GraphResult<Vec<Cell>> {
        let cells = self
            .context()
            .scan(&self.table_name(), ScanSpec::row(id.as_bytes()))?
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(cells)
    }

    /// Read the element's properties
    ///
    /// With `keys` empty the whole row is read; otherwise only those
    /// families plus the label family. `None` means the element does not
    /// exist, which differs from existing with no properties.
    fn read_properties(&self, id: &ElementId, keys: &[String]) -> GraphResult<Option<PropertyMap>> {
        let mut spec = ScanSpec::row(id.as_bytes());
        if !keys.is_empty() {
            spec = spec.fetch_family(keys::LABEL);
            for key in keys {
                spec = spec.fetch_family(key.as_str());
            }
        }
        let cells = self
            .context()
            .scan(&self.table_name(), spec)?
            .collect::<StoreResult<Vec<_>>>()?;
        if !self.row_exists(&cells) {
            return Ok(None);
        }
        Ok(Some(properties_from_cells(&cells)?))
    }

    /// Single-family read of one property
    fn read_property(&self, id: &ElementId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let spec = ScanSpec::row(id.as_bytes()).fetch_family(key);
        first_property(self.context().scan(&self.table_name(), spec)?)
    }

    /// Single-family read after draining the write buffer
    fn read_stored_property(&self, id: &ElementId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let spec = ScanSpec::row(id.as_bytes()).fetch_family(key);
        first_property(self.context().scan_flushed(&self.table_name(), spec)?)
    }

    fn write_property(&self, id: &ElementId, key: &str, value: &PropertyValue) -> GraphResult<()> {
        let mutation = keys::element_property(id, key, value)?;
        self.context().add(&self.table_name(), mutation)?;
        Ok(())
    }

    fn delete_property(&self, id: &ElementId, key: &str) -> GraphResult<()> {
        self.context()
            .add(&self.table_name(), keys::element_property_delete(id, key))?;
        Ok(())
    }

    /// Element exists in the store now
    fn exists(&self, id: &ElementId) -> GraphResult<bool> {
        let spec = ScanSpec::row(id.as_bytes()).fetch_family(keys::LABEL);
        let cells = self
            .context()
            .scan_flushed(&self.table_name(), spec)?
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(self.row_exists(&cells))
    }

    /// Queue deletes for the given cells of this table
    fn delete_cells(&self, cells: &[Cell]) -> GraphResult<()> {
        self.context()
            .add_all(&self.table_name(), cells.iter().map(Cell::to_delete))?;
        Ok(())
    }
}

fn first_property(cells: CellIter<'_>) -> GraphResult<Option<PropertyValue>> {
    for cell in cells {
        let cell = cell?;
        if cell.qualifier.is_empty() {
            return Ok(Some(codec::decode(&cell.value)?));
        }
    }
    Ok(None)
}

/// Decode the property cells of a row, skipping structure
pub fn properties_from_cells(cells: &[Cell]) -> GraphResult<PropertyMap> {
    let mut properties = PropertyMap::new();
    for cell in cells.iter().filter(|c| keys::is_property_cell(c)) {
        properties.insert(cell.family_str(), codec::decode(&cell.value)?);
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_from_cells_skips_structure() {
        let cells = vec![
            Cell::new("v", "L", "E", ""),
            Cell::new("v", "O", "b_e1", "knows"),
            Cell::new("v", "age", "", codec::encode(&PropertyValue::Integer(3)).unwrap()),
        ];
        let props = properties_from_cells(&cells).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("age"), Some(&PropertyValue::Integer(3)));
    }

    #[test]
    fn test_properties_from_cells_reports_bad_values() {
        let cells = vec![Cell::new("v", "age", "", vec![0x07])];
        assert!(properties_from_cells(&cells).is_err());
    }
}
