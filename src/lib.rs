//! Purpose: Library crate packing named f64 fields into a fixed-capacity row-major matrix.
//! Exports: `api` (stable surface), `core` (schema, storage, views, errors), `columns!`.
//! Role: Backs the `rowpack` CLI and embedding applications feeding numeric consumers.
//! Invariants: Storage is single-threaded; share across threads only behind external locking.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
