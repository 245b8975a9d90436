//! Purpose: JSON serializers for packed matrices emitted by the CLI.
//! Exports: `matrix_json`, `row_json`.
//! Role: Keep the matrix envelope shape consistent across output formats.
//! Invariants: Stable key names for the v0 matrix envelope; `data` rows follow schema order.
//! Invariants: Non-finite values serialize as `null`.

use rowpack::api::{Field, FieldDomain, Row, Storage, View};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct MatrixDoc<'a> {
    columns: Vec<&'a str>,
    row_width: usize,
    rows: usize,
    capacity: usize,
    byte_order: &'static str,
    data: Vec<Value>,
}

fn column_names<'a>(storage: &Storage<Field>, domain: &'a FieldDomain) -> Vec<&'a str> {
    storage
        .schema()
        .columns()
        .iter()
        .map(|&field| domain.name(field).unwrap_or_default())
        .collect()
}

pub(crate) fn row_json(row: Row<'_>) -> Value {
    Value::Array(row.iter().map(|value| json!(value)).collect())
}

pub(crate) fn matrix_json(storage: &Storage<Field>, domain: &FieldDomain, view: View<'_>) -> Value {
    let doc = MatrixDoc {
        columns: column_names(storage, domain),
        row_width: view.row_width(),
        rows: view.rows(),
        capacity: storage.capacity(),
        byte_order: view.byte_order().as_str(),
        data: view.iter_rows().map(row_json).collect(),
    };
    serde_json::to_value(doc).unwrap_or(Value::Null)
}
