// ABOUTME: Table metadata model shared with introspection and export layers
// ABOUTME: Exports tables, unique indexes, references, and exported rows

pub mod row;
pub mod table;

pub use row::{Row, RowColumn, Value};
pub use table::{Reference, Table, UniqueIndex, VIRTUAL_INDEX_NAME};
