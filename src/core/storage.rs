// Fixed-capacity row-major packing with an active row, a committed region, and in-place discard.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::sync::Arc;

use crate::core::column::Column;
use crate::core::error::{Error, ErrorKind};
use crate::core::missing::MissingSet;
use crate::core::order::ByteOrder;
use crate::core::schema::Schema;
use crate::core::view::{View, Window};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StorageOptions {
    pub rows: usize,
    pub byte_order: ByteOrder,
}

impl StorageOptions {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            byte_order: ByteOrder::Native,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

/// Progress of the active row. A row that receives its last column commits immediately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowState {
    Empty,
    Partial,
}

/// Source of one row's values keyed by column.
pub trait RowValues<C> {
    fn value(&self, column: C) -> Option<f64>;
}

impl<C, V, S> RowValues<C> for HashMap<C, V, S>
where
    C: Hash + Eq,
    V: Copy + Into<f64>,
    S: BuildHasher,
{
    fn value(&self, column: C) -> Option<f64> {
        self.get(&column).map(|&value| value.into())
    }
}

impl<C, V> RowValues<C> for BTreeMap<C, V>
where
    C: Ord,
    V: Copy + Into<f64>,
{
    fn value(&self, column: C) -> Option<f64> {
        self.get(&column).map(|&value| value.into())
    }
}

/// Later pairs take precedence over earlier ones for the same column.
impl<C, V> RowValues<C> for [(C, V)]
where
    C: PartialEq,
    V: Copy + Into<f64>,
{
    fn value(&self, column: C) -> Option<f64> {
        self.iter()
            .rev()
            .find(|(candidate, _)| *candidate == column)
            .map(|&(_, value)| value.into())
    }
}

pub struct Storage<C> {
    schema: Arc<Schema<C>>,
    words: Box<[u64]>,
    order: ByteOrder,
    committed: usize,
    missing: MissingSet,
    window: Window,
}

impl<C: Column> Storage<C> {
    pub fn new(schema: Arc<Schema<C>>, options: StorageOptions) -> Result<Self, Error> {
        let width = schema.row_width();
        let slots = options
            .rows
            .checked_mul(width)
            .ok_or_else(|| overflow(options.rows, width))?;
        let bytes = slots
            .checked_mul(mem::size_of::<u64>())
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or_else(|| overflow(options.rows, width))?;

        tracing::debug!(
            rows = options.rows,
            row_width = width,
            bytes,
            byte_order = options.byte_order.as_str(),
            "allocating row storage"
        );

        Ok(Self {
            words: vec![0u64; slots].into_boxed_slice(),
            order: options.byte_order,
            committed: 0,
            missing: MissingSet::full(width),
            window: Window::default(),
            schema,
        })
    }

    /// Native byte order shorthand for `new`.
    pub fn with_capacity(schema: Arc<Schema<C>>, rows: usize) -> Result<Self, Error> {
        Self::new(schema, StorageOptions::new(rows))
    }

    pub fn schema(&self) -> &Arc<Schema<C>> {
        &self.schema
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn row_width(&self) -> usize {
        self.schema.row_width()
    }

    /// Rows this storage can hold.
    pub fn capacity(&self) -> usize {
        self.words.len() / self.row_width()
    }

    /// Complete rows readable through `get` or a view.
    pub fn committed_rows(&self) -> usize {
        self.committed / self.row_width()
    }

    pub fn has_remaining(&self) -> bool {
        self.committed < self.words.len()
    }

    pub fn active_state(&self) -> RowState {
        if self.missing.is_full() {
            RowState::Empty
        } else {
            RowState::Partial
        }
    }

    /// Columns not yet supplied for the active row, in schema order.
    pub fn missing_columns(&self) -> impl Iterator<Item = C> + '_ {
        let columns = self.schema.columns();
        self.missing.iter().map(move |offset| columns[offset])
    }

    /// Writes one column of the active row; columns outside the schema are ignored.
    pub fn pack(&mut self, column: C, value: f64) -> Result<(), Error> {
        let Some(offset) = self.schema.offset_of(column) else {
            return Ok(());
        };
        if !self.has_remaining() {
            return Err(self.full_error());
        }
        self.words[self.committed + offset] = self.order.encode(value);
        self.missing.remove(offset);
        if self.missing.is_empty() {
            self.commit_row();
        }
        Ok(())
    }

    /// Writes every schema column of the active row from `values`, then commits it.
    ///
    /// All columns are checked before anything is written, so a failure leaves the
    /// active row exactly as it was.
    pub fn pack_row<R>(&mut self, values: &R) -> Result<(), Error>
    where
        R: RowValues<C> + ?Sized,
    {
        if !self.has_remaining() {
            return Err(self.full_error());
        }
        if let Some(&column) = self
            .schema
            .columns()
            .iter()
            .find(|&&column| values.value(column).is_none())
        {
            return Err(Error::new(ErrorKind::MissingValue)
                .with_message("row is missing a required column")
                .with_column(self.schema.label(column))
                .with_row(self.committed_rows() as u64));
        }

        let base = self.committed;
        for (offset, &column) in self.schema.columns().iter().enumerate() {
            if let Some(value) = values.value(column) {
                self.words[base + offset] = self.order.encode(value);
                self.missing.remove(offset);
            }
        }
        if self.missing.is_empty() {
            self.commit_row();
        }
        Ok(())
    }

    /// Visits rows `[begin_row, end_row)` of the committed region in schema order.
    pub fn get<F>(&self, begin_row: usize, end_row: usize, mut observer: F) -> Result<(), Error>
    where
        F: FnMut(usize, C, f64),
    {
        let available = self.committed_rows();
        if end_row > available {
            return Err(Error::new(ErrorKind::Range)
                .with_message(format!("end row exceeds committed rows ({available})"))
                .with_row(end_row as u64));
        }
        if begin_row > end_row {
            return Err(Error::new(ErrorKind::Range)
                .with_message("begin row after end row")
                .with_row(begin_row as u64));
        }

        let width = self.row_width();
        let columns = self.schema.columns();
        for row in begin_row..end_row {
            let words = &self.words[row * width..(row + 1) * width];
            for (&column, &word) in columns.iter().zip(words) {
                observer(row, column, self.order.decode(word));
            }
        }
        Ok(())
    }

    /// Drops the first `head_rows` and last `tail_rows` committed rows and compacts the rest
    /// to the start of the buffer. Any partially written active row is forgotten.
    pub fn discard(&mut self, head_rows: usize, tail_rows: usize) -> Result<View<'_>, Error> {
        let available = self.committed_rows();
        let dropped = head_rows
            .checked_add(tail_rows)
            .filter(|&dropped| dropped <= available)
            .ok_or_else(|| {
                Error::new(ErrorKind::Range)
                    .with_message(format!(
                        "cannot discard {head_rows} head and {tail_rows} tail rows of {available}"
                    ))
                    .with_hint("head + tail must not exceed committed rows")
            })?;

        let width = self.row_width();
        let kept = available - dropped;
        if head_rows > 0 && kept > 0 {
            let from = head_rows * width;
            self.words.copy_within(from..from + kept * width, 0);
        }
        self.committed = kept * width;
        self.missing.reset();
        self.window = Window {
            start: 0,
            end: self.committed,
        };

        if dropped > 0 {
            tracing::debug!(head_rows, tail_rows, kept_rows = kept, "discarded committed rows");
        }
        Ok(self.view())
    }

    /// View over the window established by the most recent `discard`.
    pub fn view(&self) -> View<'_> {
        View::new(&self.words, self.order, self.row_width(), self.window)
    }

    fn commit_row(&mut self) {
        self.committed += self.row_width();
        self.missing.reset();
    }

    fn full_error(&self) -> Error {
        tracing::trace!(capacity = self.capacity(), "rejecting pack into full storage");
        Error::new(ErrorKind::State)
            .with_message(format!("storage is full ({} rows)", self.capacity()))
            .with_hint("discard consumed rows to make room")
    }
}

impl<C: Column> fmt::Debug for Storage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("columns", &self.schema.columns())
            .field("capacity", &self.capacity())
            .field("committed_rows", &self.committed_rows())
            .field("active_state", &self.active_state())
            .field("byte_order", &self.order)
            .finish()
    }
}

fn overflow(rows: usize, width: usize) -> Error {
    Error::new(ErrorKind::Overflow).with_message(format!(
        "{rows} rows of {width} columns exceed addressable memory"
    ))
}
