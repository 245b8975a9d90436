//! Purpose: Define the stable public Rust API boundary for rowpack.
//! Exports: Column domains, schema, storage, views, byte order, and errors.
//! Role: Public, additive-only surface used by the CLI and embedding applications.
//! Invariants: Everything an embedder needs is reachable from this module.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::column::{Column, Field, FieldDomain};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::order::ByteOrder;
pub use crate::core::schema::Schema;
pub use crate::core::storage::{RowState, RowValues, Storage, StorageOptions};
pub use crate::core::view::{Row, View};
pub use crate::columns;
