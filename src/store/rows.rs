//! Row grouping over a cell cursor

use super::{Cell, CellIter, StoreResult};
use std::iter::Peekable;

/// Groups consecutive cells sharing a row key
///
/// Scans return cells row by row, so grouping never needs to buffer more
/// than one row.
pub struct Rows<'a> {
    cells: Peekable<CellIter<'a>>,
}

impl<'a> Rows<'a> {
    pub fn new(cells: CellIter<'a>) -> Self {
        Self {
            cells: cells.peekable(),
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = StoreResult<(Vec<u8>, Vec<Cell>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.cells.next()? {
            Ok(cell) => cell,
            Err(e) => return Some(Err(e)),
        };
        let row = first.row.clone();
        let mut cells = vec![first];
        while let Some(Ok(next)) = self.cells.peek() {
            if next.row != row {
                break;
            }
            if let Some(Ok(cell)) = self.cells.next() {
                cells.push(cell);
            }
        }
        Some(Ok((row, cells)))
    }
}
