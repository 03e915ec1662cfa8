//! RowIndex - O(log n) row offsets and row lookup via Fenwick tree
//!
//! Each entry is the vertical span of one grid row: the distance from the
//! row's top edge to the next row's top edge, so row spacing and the title of
//! the following group are folded into the preceding row.
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `offset_of`: O(log n)
//! - `row_at`: O(log² n)
//! - `push`: O(log n)
//! - `clear`: O(n) in the number of rows

/// Fenwick tree over row spans.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    /// Fenwick tree backing storage.
    tree: Vec<isize>,
    /// Number of valid entries (len <= tree.len()).
    len: usize,
}

impl RowIndex {
    /// Creates an empty index with room for `capacity` rows.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scrollcell::items::RowIndex;
    /// let index = RowIndex::new(100);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            len: 0,
        }
    }

    /// Replaces the span of `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len()`.
    pub fn set(&mut self, row: usize, span: usize) {
        assert!(row < self.len, "row {} out of bounds (len: {})", row, self.len);
        let delta = span as isize - self.span(row) as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, row, delta);
        }
    }

    /// Span of `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len()`.
    pub fn span(&self, row: usize) -> usize {
        self.offset_of(row + 1) - self.offset_of(row)
    }

    /// Sum of the spans before `row`, i.e. the offset of its top edge.
    /// `offset_of(len())` is the total.
    ///
    /// # Panics
    ///
    /// Panics if `row > len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scrollcell::items::RowIndex;
    /// let mut index = RowIndex::new(4);
    /// index.push(3);
    /// index.push(4);
    /// assert_eq!(index.offset_of(0), 0);
    /// assert_eq!(index.offset_of(1), 3);
    /// assert_eq!(index.offset_of(2), 7);
    /// ```
    pub fn offset_of(&self, row: usize) -> usize {
        assert!(row <= self.len, "row {} out of bounds (len: {})", row, self.len);
        if row == 0 {
            return 0;
        }
        let sum = fenwick::array::prefix_sum(&self.tree, row - 1);
        sum.max(0) as usize
    }

    /// Row whose span contains `offset`, `None` past the last row.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scrollcell::items::RowIndex;
    /// let mut index = RowIndex::new(4);
    /// index.push(10); // [0..10)
    /// index.push(20); // [10..30)
    /// assert_eq!(index.row_at(0), Some(0));
    /// assert_eq!(index.row_at(10), Some(1));
    /// assert_eq!(index.row_at(30), None);
    /// ```
    pub fn row_at(&self, offset: usize) -> Option<usize> {
        // First row whose end offset is past `offset`.
        let mut left = 0;
        let mut right = self.len;
        while left < right {
            let mid = left + (right - left) / 2;
            if self.offset_of(mid + 1) > offset {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        (left < self.len).then_some(left)
    }

    /// Sum of all spans.
    pub fn total(&self) -> usize {
        self.offset_of(self.len)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a row.
    pub fn push(&mut self, span: usize) {
        if self.len >= self.tree.len() {
            self.grow();
        }
        let row = self.len;
        self.len += 1;
        fenwick::array::update(&mut self.tree, row, span as isize);
    }

    // New interior nodes cover earlier rows, so the tree is rebuilt.
    fn grow(&mut self) {
        let spans: Vec<usize> = (0..self.len).map(|row| self.span(row)).collect();
        self.tree = vec![0; self.tree.len().max(1) * 2];
        for (row, span) in spans.into_iter().enumerate() {
            fenwick::array::update(&mut self.tree, row, span as isize);
        }
    }

    /// Removes every row, keeping the allocation.
    pub fn clear(&mut self) {
        self.tree.iter_mut().for_each(|slot| *slot = 0);
        self.len = 0;
    }
}
