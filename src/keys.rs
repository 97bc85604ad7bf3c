//! Element key scheme
//!
//! Pure functions building and parsing the cells that make up vertex
//! rows, edge rows and index rows. No I/O.
//!
//! Vertex row `v`:
//!   `(v, L, E) -> ""`                          exists marker
//!   `(v, O, <in>_<edge>) -> label`             outgoing edge pointer
//!   `(v, I, <out>_<edge>) -> label`            incoming edge pointer
//!   `(v, <key>, "") -> encoded value`          property
//!
//! Edge row `e`:
//!   `(e, L, <in>_<out>) -> encoded label`
//!   `(e, O, <out>) -> ""` and `(e, I, <in>) -> ""`
//!   `(e, <key>, "") -> encoded value`
//!
//! Index row: `(encoded value, key, element id) -> "" | element id`

use crate::codec::{self, CodecResult, PropertyValue};
use crate::element::{ElementId, ElementKind};
use crate::store::{Cell, Mutation};

/// Label family; exists marker on vertices, label cell on edges
pub const LABEL: &str = "L";
pub const IN_EDGE: &str = "I";
pub const OUT_EDGE: &str = "O";
/// Qualifier of the vertex exists marker
pub const EXISTS: &str = "E";
/// Separates the two ids of a compound qualifier
pub const ID_DELIM: char = '_';

/// Property key callers use for the edge label
pub const LABEL_PROPERTY: &str = "label";
/// Property key callers use for the element id
pub const ID_PROPERTY: &str = "id";

const EMPTY: &[u8] = &[];

/// Structural families; never usable as property keys.
pub fn is_reserved_family(key: &str) -> bool {
    matches!(key, LABEL | IN_EDGE | OUT_EDGE)
}

/// Property keys the graph refuses to store
pub fn is_reserved_property(key: &str) -> bool {
    key == ID_PROPERTY || key == LABEL_PROPERTY || is_reserved_family(key)
}

/// An id can be embedded in compound qualifiers without misparsing.
pub fn id_is_encodable(id: &str) -> bool {
    !id.is_empty() && !id.contains(ID_DELIM)
}

fn compound(first: &ElementId, second: &ElementId) -> String {
    format!("{}{}{}", first, ID_DELIM, second)
}

/// Exists marker for a vertex row
pub fn vertex_exists(id: &ElementId) -> Mutation {
    let mut m = Mutation::new(id.as_bytes());
    m.put(LABEL, EXISTS, EMPTY);
    m
}

/// Property cell on a vertex or edge row
pub fn element_property(id: &ElementId, key: &str, value: &PropertyValue) -> CodecResult<Mutation> {
    let mut m = Mutation::new(id.as_bytes());
    m.put(key, EMPTY, codec::encode(value)?);
    Ok(m)
}

/// Removes a property cell
pub fn element_property_delete(id: &ElementId, key: &str) -> Mutation {
    let mut m = Mutation::new(id.as_bytes());
    m.put_delete(key, EMPTY);
    m
}

/// Pointer from `vertex` to `neighbor` through `edge`.
///
/// `family` is [`OUT_EDGE`] on the out-vertex row (neighbor is the in-vertex)
/// and [`IN_EDGE`] on the in-vertex row.
pub fn vertex_edge_pointer(
    vertex: &ElementId,
    family: &str,
    neighbor: &ElementId,
    edge: &ElementId,
    label: &str,
) -> Mutation {
    let mut m = Mutation::new(vertex.as_bytes());
    m.put(family, compound(neighbor, edge), label);
    m
}

pub fn vertex_edge_pointer_delete(
    vertex: &ElementId,
    family: &str,
    neighbor: &ElementId,
    edge: &ElementId,
) -> Mutation {
    let mut m = Mutation::new(vertex.as_bytes());
    m.put_delete(family, compound(neighbor, edge));
    m
}

/// Label and endpoint cells of an edge row
pub fn edge_structure(
    edge: &ElementId,
    out_vertex: &ElementId,
    in_vertex: &ElementId,
    label: &str,
) -> CodecResult<Mutation> {
    let mut m = Mutation::new(edge.as_bytes());
    m.put(
        LABEL,
        compound(in_vertex, out_vertex),
        codec::encode(&PropertyValue::String(label.to_string()))?,
    );
    m.put(OUT_EDGE, out_vertex.as_bytes(), EMPTY);
    m.put(IN_EDGE, in_vertex.as_bytes(), EMPTY);
    Ok(m)
}

/// Key-index entry (value empty) or named-index entry (value = id)
pub fn index_entry(
    key: &str,
    value: &PropertyValue,
    id: &ElementId,
    named: bool,
) -> CodecResult<Mutation> {
    let mut m = Mutation::new(codec::encode(value)?);
    let payload = if named { id.as_bytes().to_vec() } else { Vec::new() };
    m.put(key, id.as_bytes(), payload);
    Ok(m)
}

pub fn index_entry_delete(key: &str, value: &PropertyValue, id: &ElementId) -> CodecResult<Mutation> {
    let mut m = Mutation::new(codec::encode(value)?);
    m.put_delete(key, id.as_bytes());
    Ok(m)
}

/// Metadata row recording a named index or key index of `kind`
pub fn metadata_entry(name: &str, kind: ElementKind) -> Mutation {
    let mut m = Mutation::new(name.as_bytes());
    m.put(kind.name(), EMPTY, EMPTY);
    m
}

pub fn metadata_entry_delete(name: &str, kind: ElementKind) -> Mutation {
    let mut m = Mutation::new(name.as_bytes());
    m.put_delete(kind.name(), EMPTY);
    m
}

/// Split `<neighbor>_<edge>` from a vertex pointer qualifier.
pub fn parse_pointer_qualifier(qualifier: &[u8]) -> Option<(ElementId, ElementId)> {
    split_compound(qualifier)
}

/// Split `<in>_<out>` from an edge label qualifier; returns `(out, in)`.
pub fn parse_label_qualifier(qualifier: &[u8]) -> Option<(ElementId, ElementId)> {
    split_compound(qualifier).map(|(in_vertex, out_vertex)| (out_vertex, in_vertex))
}

fn split_compound(qualifier: &[u8]) -> Option<(ElementId, ElementId)> {
    let text = std::str::from_utf8(qualifier).ok()?;
    let (first, second) = text.split_once(ID_DELIM)?;
    if first.is_empty() || second.is_empty() || second.contains(ID_DELIM) {
        return None;
    }
    Some((ElementId::new(first), ElementId::new(second)))
}

/// Cell is the vertex exists marker
pub fn is_exists_marker(cell: &Cell) -> bool {
    cell.family == LABEL.as_bytes() && cell.qualifier == EXISTS.as_bytes()
}

/// Cell holds a property (not structure)
pub fn is_property_cell(cell: &Cell) -> bool {
    cell.qualifier.is_empty()
        && std::str::from_utf8(&cell.family)
            .map(|f| !is_reserved_family(f))
            .unwrap_or(false)
}
