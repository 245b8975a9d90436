// Fixed-size bitset over schema positions still missing from the active row.

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MissingSet {
    words: Box<[u64]>,
    full: Box<[u64]>,
    width: usize,
    remaining: usize,
}

impl MissingSet {
    /// Set containing every position in `0..width`.
    pub fn full(width: usize) -> Self {
        let word_count = width.div_ceil(WORD_BITS);
        let mut full = vec![u64::MAX; word_count].into_boxed_slice();
        let tail = width % WORD_BITS;
        if tail != 0 {
            if let Some(last) = full.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self {
            words: full.clone(),
            full,
            width,
            remaining: width,
        }
    }

    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_full(&self) -> bool {
        self.remaining == self.width
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos < self.width && self.words[pos / WORD_BITS] & (1u64 << (pos % WORD_BITS)) != 0
    }

    /// Clears `pos`; returns whether it was still missing.
    pub fn remove(&mut self, pos: usize) -> bool {
        if !self.contains(pos) {
            return false;
        }
        self.words[pos / WORD_BITS] &= !(1u64 << (pos % WORD_BITS));
        self.remaining -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.words.copy_from_slice(&self.full);
        self.remaining = self.width;
    }

    /// Positions still missing, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(move |&pos| self.contains(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::MissingSet;

    #[test]
    fn full_set_spans_word_boundaries() {
        for width in [1usize, 63, 64, 65, 130] {
            let set = MissingSet::full(width);
            assert_eq!(set.len(), width);
            assert!(set.is_full());
            assert!(set.contains(width - 1));
            assert!(!set.contains(width));
            assert_eq!(set.iter().count(), width);
        }
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = MissingSet::full(3);
        assert!(set.remove(1));
        assert!(!set.remove(1));
        assert!(!set.remove(7));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 2]);
        assert!(!set.is_full());
    }

    #[test]
    fn reset_restores_every_position() {
        let mut set = MissingSet::full(65);
        for pos in 0..65 {
            assert!(set.remove(pos));
        }
        assert!(set.is_empty());
        set.reset();
        assert!(set.is_full());
        assert_eq!(set, MissingSet::full(65));
    }
}
