//! Sibling position of a node
//!
//! Every positional predicate (`first-child`, `nth-last-of-type`, ...) is
//! answered from an [`Index`] alone.

/// Position of a node among a filtered sibling set, and the size of that set
///
/// `position` is zero-based and always below `size` when present. A missing
/// position means the node has no parent or is not part of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Index {
    position: Option<usize>,
    size: usize,
}

impl Index {
    /// Build an index; a position outside `0..size` is treated as not found
    pub fn new(position: Option<usize>, size: usize) -> Self {
        Index {
            position: position.filter(|&p| p < size),
            size,
        }
    }

    /// Index of a node without a parent
    pub const fn detached() -> Self {
        Index { position: None, size: 0 }
    }

    /// Zero-based position, `None` when not found
    #[inline]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Number of siblings in the filtered set
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Position with `-1` standing for "not found"
    pub fn as_signed(&self) -> (isize, usize) {
        (self.position.map_or(-1, |p| p as isize), self.size)
    }

    /// One-based position counted from the first sibling, as `nth-child` counts
    pub fn nth(&self) -> Option<usize> {
        self.position.map(|p| p + 1)
    }

    /// One-based position counted from the last sibling, as `nth-last-child` counts
    pub fn nth_last(&self) -> Option<usize> {
        self.position.map(|p| self.size - p)
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_first(&self) -> bool {
        self.position == Some(0)
    }

    pub fn is_last(&self) -> bool {
        self.nth_last() == Some(1)
    }

    pub fn is_only(&self) -> bool {
        self.is_found() && self.size == 1
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::detached()
    }
}
