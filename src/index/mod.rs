//! Secondary indexing
//!
//! Key indexes are maintained automatically on every property write to an
//! indexed key. Named indexes are filled explicitly by callers.

pub mod key_index;
pub mod named;

pub use key_index::KeyIndexer;
pub use named::{Index, NamedIndexes};
