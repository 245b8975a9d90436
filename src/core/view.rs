//! Purpose: Bounds-limited, read-only window over the committed region of a storage buffer.
//! Exports: `View`, `Row`.
//! Role: Zero-copy hand-off of the row-major matrix to downstream numeric code.
//! Invariants: A view never exposes slots outside `[start, end)`.
//! Invariants: A view is a live snapshot of the storage's persistent window; copy with `to_vec`.
use std::mem;
use std::slice;

use crate::core::order::ByteOrder;

/// Persistent bounds owned by a storage and repositioned in place by `discard`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Window {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct View<'a> {
    words: &'a [u64],
    order: ByteOrder,
    row_width: usize,
    window: Window,
}

impl<'a> View<'a> {
    pub(crate) fn new(words: &'a [u64], order: ByteOrder, row_width: usize, window: Window) -> Self {
        debug_assert!(window.start <= window.end && window.end <= words.len());
        Self {
            words,
            order,
            row_width,
            window,
        }
    }

    pub fn start(&self) -> usize {
        self.window.start
    }

    pub fn end(&self) -> usize {
        self.window.end
    }

    /// Slots between `start` and `end`.
    pub fn len(&self) -> usize {
        self.window.end - self.window.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots in the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn rows(&self) -> usize {
        self.len() / self.row_width
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.visible().get(index).map(|&word| self.order.decode(word))
    }

    pub fn row(&self, index: usize) -> Option<Row<'a>> {
        let begin = index.checked_mul(self.row_width)?;
        let end = begin.checked_add(self.row_width)?;
        self.visible().get(begin..end).map(|words| Row {
            words,
            order: self.order,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + use<'a> {
        let order = self.order;
        self.visible().iter().map(move |&word| order.decode(word))
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Row<'a>> + use<'a> {
        let order = self.order;
        self.visible()
            .chunks_exact(self.row_width)
            .map(move |words| Row { words, order })
    }

    /// The matrix as `f64` slots without copying; `None` unless the byte order is native.
    pub fn as_slice(&self) -> Option<&'a [f64]> {
        if !self.order.is_native() {
            return None;
        }
        let words = self.visible();
        // SAFETY: u64 and f64 share size and alignment and every bit pattern is a valid f64.
        Some(unsafe { slice::from_raw_parts(words.as_ptr().cast::<f64>(), words.len()) })
    }

    /// The matrix bytes in the configured byte order, without copying.
    pub fn as_bytes(&self) -> &'a [u8] {
        let words = self.visible();
        // SAFETY: u64 has no padding, u8 has alignment 1, and the length covers exactly the slice.
        unsafe {
            slice::from_raw_parts(
                words.as_ptr().cast::<u8>(),
                words.len() * mem::size_of::<u64>(),
            )
        }
    }

    /// Decoded copy of the visible slots, stable across later storage mutation.
    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    fn visible(&self) -> &'a [u64] {
        &self.words[self.window.start..self.window.end]
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    words: &'a [u64],
    order: ByteOrder,
}

impl<'a> Row<'a> {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, offset: usize) -> Option<f64> {
        self.words.get(offset).map(|&word| self.order.decode(word))
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + use<'a> {
        let order = self.order;
        self.words.iter().map(move |&word| order.decode(word))
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}
