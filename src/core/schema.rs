//! Purpose: Immutable row layout mapping column identifiers to offsets within a row.
//! Exports: `Schema`.
//! Role: Leaf of the packing engine; one schema is shared by any number of storages.
//! Invariants: Columns are non-empty, duplicate-free, and drawn from a single domain.
//! Invariants: The offset table covers the full domain; unconfigured entries hold `ABSENT`.
//! Invariants: When present, `labels` has exactly one entry per column, in row order.
use crate::core::column::Column;
use crate::core::error::{Error, ErrorKind};

const ABSENT: u32 = u32::MAX;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema<C> {
    columns: Box<[C]>,
    offsets: Box<[u32]>,
    domain_id: u64,
    labels: Option<Box<[String]>>,
}

impl<C: Column> Schema<C> {
    pub fn new(columns: impl IntoIterator<Item = C>) -> Result<Self, Error> {
        let columns: Box<[C]> = columns.into_iter().collect();
        let Some(&first) = columns.first() else {
            return Err(Error::new(ErrorKind::Config).with_message("empty columns"));
        };
        if columns.len() >= ABSENT as usize {
            return Err(Error::new(ErrorKind::Config).with_message("too many columns"));
        }

        let domain_id = first.domain_id();
        let domain_len = first.domain_len();
        let mut offsets = vec![ABSENT; domain_len].into_boxed_slice();
        for (offset, &column) in columns.iter().enumerate() {
            if column.domain_id() != domain_id || column.domain_len() != domain_len {
                return Err(Error::new(ErrorKind::Config)
                    .with_message("columns has mixed domains")
                    .with_column(format!("{column:?}")));
            }
            let slot = offsets.get_mut(column.ordinal()).ok_or_else(|| {
                Error::new(ErrorKind::Config)
                    .with_message("column ordinal outside its domain")
                    .with_column(format!("{column:?}"))
            })?;
            if *slot != ABSENT {
                return Err(Error::new(ErrorKind::Config)
                    .with_message("duplicate column")
                    .with_column(format!("{column:?}")));
            }
            *slot = offset as u32;
        }

        Ok(Self {
            columns,
            offsets,
            domain_id,
            labels: None,
        })
    }

    /// Attaches display names used when errors refer to a column.
    pub(crate) fn with_labels(mut self, labels: Vec<String>) -> Self {
        debug_assert_eq!(labels.len(), self.columns.len());
        self.labels = Some(labels.into_boxed_slice());
        self
    }

    pub fn row_width(&self) -> usize {
        self.columns.len()
    }

    /// Columns in row order.
    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    pub fn domain_len(&self) -> usize {
        self.offsets.len()
    }

    pub fn offset_of(&self, column: C) -> Option<usize> {
        if column.domain_id() != self.domain_id {
            return None;
        }
        match self.offsets.get(column.ordinal()) {
            Some(&offset) if offset != ABSENT => Some(offset as usize),
            _ => None,
        }
    }

    pub fn contains(&self, column: C) -> bool {
        self.offset_of(column).is_some()
    }

    /// Human-readable name of `column`; falls back to its `Debug` form.
    pub fn label(&self, column: C) -> String {
        let named = self
            .labels
            .as_deref()
            .zip(self.offset_of(column))
            .and_then(|(labels, offset)| labels.get(offset));
        match named {
            Some(label) => label.clone(),
            None => format!("{column:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Schema;
    use crate::core::column::{Column, FieldDomain};
    use crate::core::error::ErrorKind;

    crate::columns! {
        enum Col { A, B, C, D }
    }

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct Rogue(usize);

    impl Column for Rogue {
        fn ordinal(self) -> usize {
            self.0
        }

        fn domain_len(self) -> usize {
            2
        }
    }

    #[test]
    fn offsets_follow_configured_order() {
        let schema = Schema::new([Col::B, Col::D, Col::A]).expect("schema");
        assert_eq!(schema.row_width(), 3);
        assert_eq!(schema.domain_len(), 4);
        assert_eq!(schema.columns(), &[Col::B, Col::D, Col::A]);
        assert_eq!(schema.offset_of(Col::B), Some(0));
        assert_eq!(schema.offset_of(Col::D), Some(1));
        assert_eq!(schema.offset_of(Col::A), Some(2));
        assert_eq!(schema.offset_of(Col::C), None);
        assert!(!schema.contains(Col::C));
    }

    #[test]
    fn empty_columns_rejected() {
        let err = Schema::<Col>::new([]).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn duplicate_columns_rejected() {
        let err = Schema::new([Col::A, Col::B, Col::A]).expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.column(), Some("A"));
    }

    #[test]
    fn mixed_domains_rejected() {
        let left = FieldDomain::new(["x", "y"]).expect("left");
        let right = FieldDomain::new(["x", "y"]).expect("right");
        let columns = [left.field("x").expect("x"), right.field("y").expect("y")];
        let err = Schema::new(columns).expect_err("mixed");
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn foreign_domain_lookup_is_absent() {
        let left = FieldDomain::new(["x", "y"]).expect("left");
        let right = FieldDomain::new(["x", "y"]).expect("right");
        let schema = left.schema(["y", "x"]).expect("schema");
        assert_eq!(schema.offset_of(right.field("x").expect("x")), None);
        assert_eq!(schema.offset_of(left.field("x").expect("x")), Some(1));
    }

    #[test]
    fn out_of_domain_ordinal_rejected() {
        let err = Schema::new([Rogue(0), Rogue(5)]).expect_err("ordinal");
        assert_eq!(err.kind(), ErrorKind::Config);
        let schema = Schema::new([Rogue(1)]).expect("schema");
        assert_eq!(schema.offset_of(Rogue(9)), None);
    }
}
