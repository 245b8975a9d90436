// Contract tests for the public packing API: layout, commit, read-back, and discard.
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use rowpack::api::{ByteOrder, ErrorKind, FieldDomain, RowState, Schema, Storage, StorageOptions};

rowpack::columns! {
    enum Column { A, B, C, D }
}

fn storage(columns: &[Column], rows: usize) -> Storage<Column> {
    let schema = Schema::new(columns.iter().copied()).expect("schema");
    Storage::with_capacity(Arc::new(schema), rows).expect("storage")
}

#[test]
fn example_single_column_discards_tail_then_head() {
    let mut s = storage(&[Column::B], 4);
    for value in [555.0, 666.0, 777.0, 888.0] {
        s.pack(Column::B, value).expect("pack");
    }
    assert!(!s.has_remaining());

    assert_eq!(
        s.discard(0, 0).expect("view").to_vec(),
        vec![555.0, 666.0, 777.0, 888.0]
    );
    assert_eq!(
        s.discard(0, 1).expect("view").to_vec(),
        vec![555.0, 666.0, 777.0]
    );
    assert_eq!(s.discard(2, 0).expect("view").to_vec(), vec![777.0]);
    assert_eq!(s.capacity(), 4);
}

#[test]
fn example_two_columns_flatten_in_schema_order() {
    let mut s = storage(&[Column::B, Column::A], 4);
    s.pack(Column::B, 555.0).expect("pack");
    s.pack(Column::A, 1.0).expect("pack");
    s.pack(Column::A, 2.0).expect("pack");
    s.pack(Column::B, 666.0).expect("pack");
    s.pack_row(&HashMap::from([
        (Column::A, 3.0),
        (Column::B, 777.0),
        (Column::D, 2.0),
    ]))
    .expect("pack row");
    s.pack(Column::B, 888.0).expect("pack");
    s.pack(Column::A, 4.0).expect("pack");

    let view = s.discard(0, 0).expect("view");
    assert_eq!(
        view.as_slice().map(<[f64]>::to_vec),
        Some(vec![555.0, 1.0, 666.0, 2.0, 777.0, 3.0, 888.0, 4.0])
    );
}

#[test]
fn has_remaining_flips_after_exactly_capacity_rows() {
    let columns = [Column::C, Column::A, Column::D];
    let capacity = 5;
    let mut s = storage(&columns, capacity);
    for row in 0..capacity {
        assert!(s.has_remaining());
        for (i, &column) in columns.iter().rev().enumerate() {
            s.pack(Column::B, -1.0).expect("ignored");
            s.pack(column, (row * 10 + i) as f64).expect("pack");
            let committed = if i + 1 == columns.len() { row + 1 } else { row };
            assert_eq!(s.committed_rows(), committed);
        }
    }
    assert!(!s.has_remaining());
    assert_eq!(s.capacity(), capacity);
}

#[test]
fn out_of_schema_packs_have_no_effect_anywhere() {
    let mut s = storage(&[Column::A], 1);
    s.pack(Column::D, 1.0).expect("before");
    assert_eq!(s.active_state(), RowState::Empty);
    s.pack(Column::A, 2.0).expect("fill");
    s.pack(Column::D, 3.0).expect("after full");
    assert_eq!(s.discard(0, 0).expect("view").to_vec(), vec![2.0]);
}

#[test]
fn appends_after_head_discard_never_touch_retained_rows() {
    let mut s = storage(&[Column::A, Column::B], 3);
    for row in 0..3 {
        s.pack(Column::A, row as f64).expect("pack");
        s.pack(Column::B, row as f64 + 0.5).expect("pack");
    }
    s.discard(2, 0).expect("discard");

    s.pack(Column::B, 10.5).expect("pack");
    s.pack(Column::A, 10.0).expect("pack");
    s.pack_row(&[(Column::A, 20.0), (Column::B, 20.5)][..]).expect("pack row");
    assert!(!s.has_remaining());
    assert_eq!(
        s.pack(Column::A, 30.0).expect_err("full").kind(),
        ErrorKind::State
    );

    let view = s.discard(0, 0).expect("view");
    assert_eq!(view.to_vec(), vec![2.0, 2.5, 10.0, 10.5, 20.0, 20.5]);
    assert_eq!(view.rows(), 3);
}

#[test]
fn failed_calls_leave_state_unchanged() {
    let mut s = storage(&[Column::A, Column::B], 2);
    s.pack_row(&[(Column::A, 1.0), (Column::B, 2.0)][..]).expect("pack row");
    s.pack(Column::B, 9.0).expect("partial");

    let err = s.pack_row(&[(Column::B, 3.0)][..]).expect_err("missing A");
    assert_eq!(err.kind(), ErrorKind::MissingValue);
    assert_eq!(s.missing_columns().collect::<Vec<_>>(), vec![Column::A]);

    assert_eq!(s.discard(1, 1).expect_err("range").kind(), ErrorKind::Range);
    assert_eq!(s.get(0, 2, |_, _, _| {}).expect_err("range").kind(), ErrorKind::Range);
    assert_eq!(s.committed_rows(), 1);
    assert_eq!(s.active_state(), RowState::Partial);

    s.pack(Column::A, 8.0).expect("complete row");
    assert_eq!(
        s.discard(0, 0).expect("view").to_vec(),
        vec![1.0, 2.0, 8.0, 9.0]
    );
}

#[test]
fn big_endian_storage_exposes_big_endian_bytes() {
    let schema = Arc::new(Schema::new([Column::A]).expect("schema"));
    let options = StorageOptions::new(2).with_byte_order(ByteOrder::Big);
    let mut s = Storage::new(schema, options).expect("storage");
    s.pack(Column::A, 1.25).expect("pack");
    s.pack(Column::A, -8.0).expect("pack");

    let view = s.discard(0, 0).expect("view");
    let mut expected = Vec::new();
    expected.extend_from_slice(&1.25f64.to_be_bytes());
    expected.extend_from_slice(&(-8.0f64).to_be_bytes());
    assert_eq!(view.as_bytes(), expected.as_slice());
    assert_eq!(view.to_vec(), vec![1.25, -8.0]);
}

#[test]
fn snapshot_survives_later_discard() {
    let mut s = storage(&[Column::C], 3);
    for value in [1.0, 2.0, 3.0] {
        s.pack(Column::C, value).expect("pack");
    }
    let snapshot = s.discard(0, 0).expect("view").to_vec();
    s.discard(1, 1).expect("discard");
    assert_eq!(snapshot, vec![1.0, 2.0, 3.0]);
    assert_eq!(s.view().to_vec(), vec![2.0]);
}

#[test]
fn schema_is_shared_across_threads() {
    let domain = FieldDomain::new(["x", "y", "z"]).expect("domain");
    let schema = Arc::new(domain.schema(["z", "x"]).expect("schema"));
    let x = domain.field("x").expect("x");
    let z = domain.field("z").expect("z");

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let mut s = Storage::with_capacity(schema, 2).expect("storage");
                s.pack(x, worker as f64).expect("pack");
                s.pack(z, -(worker as f64)).expect("pack");
                s.discard(0, 0).expect("view").to_vec()
            })
        })
        .collect();

    for (worker, handle) in handles.into_iter().enumerate() {
        let values = handle.join().expect("join");
        assert_eq!(values, vec![-(worker as f64), worker as f64]);
    }
}
