//! Grid geometry: column metrics, groups, arrangement and hit testing.
//!
//! Rows are filled left to right, top to bottom. Items may be split into
//! groups; each group starts on a fresh row and may carry a title spanning
//! the full row width. An optional header sits above the first row and an
//! optional footer below the last. Row offsets live in a [`RowIndex`] so
//! point and rect hit tests stay logarithmic in the number of rows.

use super::adapter::{Constraint, MeasureSpec};
use super::cell::Cell;
use super::row_index::RowIndex;
use crate::config::{GridConfig, StretchMode};
use crate::geometry::{Rect, Size};
use std::ops::Range;

/// Space between the content edges and the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    /// Left padding.
    pub left: i32,
    /// Top padding.
    pub top: i32,
    /// Right padding.
    pub right: i32,
    /// Bottom padding.
    pub bottom: i32,
}

impl Padding {
    /// Same padding on every side.
    pub const fn uniform(value: i32) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    /// Left plus right.
    pub const fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    /// Top plus bottom.
    pub const fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

/// Resolved column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnMetrics {
    /// Number of columns, at least 1.
    pub count: usize,
    /// Width of every column.
    pub width: i32,
    /// Gap between adjacent columns.
    pub spacing: i32,
}

impl ColumnMetrics {
    /// Derives the columns from the grid settings.
    ///
    /// `available` is the row width the cells may use, `None` when the
    /// width is unbounded. `cell_width` is the natural width of the first
    /// item.
    pub fn compute(config: &GridConfig, available: Option<i32>, cell_width: i32) -> Self {
        let desired_spacing = config.desired_column_spacing;
        let natural_width = if config.desired_column_width > 0 {
            config.desired_column_width
        } else {
            cell_width
        };
        let fit = |width: i32| match available {
            Some(available) if width + desired_spacing > 0 => {
                ((available + desired_spacing) / (width + desired_spacing)).max(1) as usize
            }
            _ => 1,
        };
        let count = if config.num_columns > 0 {
            config.num_columns
        } else {
            fit(natural_width)
        };

        let (width, spacing) = match (config.stretch_mode, available) {
            (StretchMode::ColumnSpacing, Some(available)) => {
                let spacing = if count < 2 {
                    0
                } else {
                    (available - natural_width * count as i32) / (count as i32 - 1)
                };
                (natural_width, spacing)
            }
            (StretchMode::ColumnWidth, Some(available)) => (
                (available + desired_spacing) / count as i32 - desired_spacing,
                desired_spacing,
            ),
            _ => (natural_width, desired_spacing),
        };

        if spacing < 0 {
            let width = available.map_or(width, |available| available / count as i32);
            Self {
                count,
                width,
                spacing: 0,
            }
        } else {
            Self {
                count,
                width,
                spacing,
            }
        }
    }

    /// Width of one full row.
    pub fn row_width(&self) -> i32 {
        self.width * self.count as i32 + self.spacing * (self.count as i32 - 1)
    }
}

/// A run of items starting on a fresh row.
#[derive(Debug)]
pub(crate) struct Group<V> {
    /// First cell index.
    pub(crate) start: usize,
    /// Number of cells.
    pub(crate) len: usize,
    pub(crate) first_row: usize,
    pub(crate) rows: usize,
    pub(crate) title: Option<V>,
    pub(crate) title_size: Size,
    pub(crate) title_bounds: Rect,
}

impl<V> Group<V> {
    fn end(&self) -> usize {
        self.start + self.len
    }

    fn end_row(&self) -> usize {
        self.first_row + self.rows
    }
}

/// Groups, columns and row offsets of the current structure.
#[derive(Debug)]
pub(crate) struct GridLayout<V> {
    pub(crate) columns: ColumnMetrics,
    pub(crate) groups: Vec<Group<V>>,
    pub(crate) row_spacing: i32,
    /// Height assumed for cells that were never measured.
    pub(crate) supposed_cell_height: i32,
    /// Measured header, zero when there is none.
    pub(crate) header_size: Size,
    /// Measured footer, zero when there is none.
    pub(crate) footer_size: Size,
    pub(crate) header_bounds: Rect,
    pub(crate) footer_bounds: Rect,
    row_count: usize,
    rows: RowIndex,
    rows_top: i32,
}

impl<V> Default for GridLayout<V> {
    fn default() -> Self {
        Self {
            columns: ColumnMetrics {
                count: 1,
                width: 0,
                spacing: 0,
            },
            groups: Vec::new(),
            row_spacing: 0,
            supposed_cell_height: 0,
            header_size: Size::default(),
            footer_size: Size::default(),
            header_bounds: Rect::default(),
            footer_bounds: Rect::default(),
            row_count: 0,
            rows: RowIndex::new(64),
            rows_top: 0,
        }
    }
}

impl<V> GridLayout<V> {
    /// Rebuilds the groups from their sizes. An empty `sizes` yields one
    /// untitled group of `item_count` items. Returns the previous titles,
    /// indexed by group, for reuse.
    pub(crate) fn set_groups(&mut self, sizes: &[usize], item_count: usize) -> Vec<Option<V>> {
        let old_titles = self.groups.drain(..).map(|group| group.title).collect();
        let single = [item_count];
        let sizes = if sizes.is_empty() { &single[..] } else { sizes };
        let mut start = 0;
        for &len in sizes {
            // Group sizes beyond the item count are cut off.
            let len = len.min(item_count - start);
            self.groups.push(Group {
                start,
                len,
                first_row: 0,
                rows: 0,
                title: None,
                title_size: Size::default(),
                title_bounds: Rect::default(),
            });
            start += len;
        }
        self.set_columns(self.columns);
        old_titles
    }

    /// Applies column metrics and recounts rows.
    pub(crate) fn set_columns(&mut self, columns: ColumnMetrics) {
        self.columns = columns;
        let mut row = 0;
        for group in &mut self.groups {
            group.first_row = row;
            group.rows = group.len.div_ceil(columns.count);
            row += group.rows;
        }
        self.row_count = row;
    }

    pub(crate) fn row_count(&self) -> usize {
        self.row_count
    }

    pub(crate) fn row_width(&self) -> i32 {
        self.columns.row_width()
    }

    pub(crate) fn group_of_cell(&self, index: usize) -> Option<usize> {
        let group = self.groups.partition_point(|group| group.end() <= index);
        (group < self.groups.len()).then_some(group)
    }

    pub(crate) fn group_of_row(&self, row: usize) -> Option<usize> {
        let group = self.groups.partition_point(|group| group.end_row() <= row);
        (group < self.groups.len()).then_some(group)
    }

    pub(crate) fn row_of_cell(&self, index: usize) -> Option<usize> {
        let group = &self.groups[self.group_of_cell(index)?];
        Some(group.first_row + (index - group.start) / self.columns.count)
    }

    pub(crate) fn column_of_cell(&self, index: usize) -> Option<usize> {
        let group = &self.groups[self.group_of_cell(index)?];
        Some((index - group.start) % self.columns.count)
    }

    /// Cell at `(row, column)`, clamped into the row's group.
    pub(crate) fn cell_index(&self, row: usize, column: usize) -> Option<usize> {
        let group = &self.groups[self.group_of_row(row)?];
        let index = group.start + self.columns.count * (row - group.first_row) + column;
        Some(index.clamp(group.start, group.end() - 1))
    }

    /// Splits an item index into `(group, offset within group)`.
    pub(crate) fn group_position(&self, index: usize) -> Option<(usize, usize)> {
        let group = self.group_of_cell(index)?;
        Some((group, index - self.groups[group].start))
    }

    /// Item index of `offset` within `group`.
    pub(crate) fn item_index(&self, group: usize, offset: usize) -> Option<usize> {
        let found = self.groups.get(group)?;
        (offset < found.len).then_some(found.start + offset)
    }

    /// Whether row spacing follows the given row of `group`.
    ///
    /// Inside a group every row but the last is followed by spacing. The
    /// last row is followed by spacing when a later group contributes rows
    /// before any titled group.
    fn followed_by_row_spacing(&self, group: usize, row_in_group: usize) -> bool {
        if row_in_group + 1 < self.groups[group].rows {
            return true;
        }
        for later in &self.groups[group + 1..] {
            if later.title.is_some() {
                return false;
            }
            if later.rows > 0 {
                return true;
            }
        }
        false
    }

    /// Estimated content height before arrangement.
    pub(crate) fn estimated_height(&self, padding: Padding, cell_height: i32) -> i32 {
        let mut height =
            padding.vertical() + self.header_size.height + self.footer_size.height;
        for (n, group) in self.groups.iter().enumerate() {
            height += group.title_size.height;
            if group.rows > 0 {
                let rows = group.rows as i32;
                height += cell_height * rows + self.row_spacing * (rows - 1);
                if self.followed_by_row_spacing(n, group.rows - 1) {
                    height += self.row_spacing;
                }
            }
        }
        height
    }

    /// Places the header, titles, cells and footer. Row height is the
    /// tallest measured (or supposed) cell in the row. Returns the content
    /// size.
    pub(crate) fn arrange(&mut self, cells: &mut [Cell], padding: Padding) -> Size {
        let columns = self.columns;
        let row_width = columns.row_width();
        let left = padding.left;
        let mut top = padding.top;
        let mut row_tops = Vec::with_capacity(self.row_count);

        self.header_bounds = Rect::new(left, top, left + row_width, top + self.header_size.height);
        top = self.header_bounds.bottom;

        for n in 0..self.groups.len() {
            let group = &mut self.groups[n];
            if group.title.is_some() {
                group.title_bounds =
                    Rect::new(left, top, left + row_width, top + group.title_size.height);
                top += group.title_size.height;
            } else {
                group.title_bounds = Rect::new(left, top, left + row_width, top);
            }

            let (start, end, rows) = (group.start, group.end(), group.rows);
            for row in 0..rows {
                let first = start + row * columns.count;
                let last = (first + columns.count).min(end);
                let height = cells[first..last]
                    .iter()
                    .map(|cell| {
                        cell.measured
                            .map_or(self.supposed_cell_height, |size| size.height)
                    })
                    .max()
                    .unwrap_or(0);

                for (column, cell) in cells[first..last].iter_mut().enumerate() {
                    let cell_left = left + (columns.width + columns.spacing) * column as i32;
                    let bounds = Rect::new(cell_left, top, cell_left + columns.width, top + height);
                    if cell.bounds != bounds {
                        cell.bounds = bounds;
                        cell.layout_valid = false;
                    }
                    let height_constraint = if cell.measured.is_some() {
                        Constraint::Exactly(height)
                    } else {
                        Constraint::Unspecified
                    };
                    cell.spec = MeasureSpec::new(Constraint::Exactly(columns.width), height_constraint);
                }

                row_tops.push(top);
                top += height;
                if self.followed_by_row_spacing(n, row) {
                    top += self.row_spacing;
                }
            }
        }

        self.footer_bounds = Rect::new(left, top, left + row_width, top + self.footer_size.height);
        top = self.footer_bounds.bottom;

        self.rows.clear();
        self.rows_top = row_tops.first().copied().unwrap_or(self.header_bounds.bottom);
        for pair in row_tops.windows(2) {
            self.rows.push((pair[1] - pair[0]).max(0) as usize);
        }
        if let Some(&last_top) = row_tops.last() {
            self.rows.push((self.footer_bounds.top - last_top).max(0) as usize);
        }

        Size::new(row_width + padding.horizontal(), top + padding.bottom)
    }

    fn row_top(&self, row: usize) -> i32 {
        self.rows_top + self.rows.offset_of(row) as i32
    }

    /// Bounds of one full row.
    pub(crate) fn row_bounds(&self, cells: &[Cell], row: usize) -> Option<Rect> {
        let first = self.cell_index(row, 0)?;
        let bounds = cells.get(first)?.bounds;
        Some(Rect::new(
            bounds.left,
            bounds.top,
            bounds.left + self.row_width(),
            bounds.bottom,
        ))
    }

    /// Bounds of one column from the first row to the bottom of the last.
    pub(crate) fn column_bounds(&self, cells: &[Cell], padding: Padding, column: usize) -> Option<Rect> {
        if column >= self.columns.count || self.row_count == 0 {
            return None;
        }
        let last = self.cell_index(self.row_count - 1, 0)?;
        let left = padding.left + (self.columns.width + self.columns.spacing) * column as i32;
        Some(Rect::new(
            left,
            self.rows_top,
            left + self.columns.width,
            cells.get(last)?.bounds.bottom,
        ))
    }

    /// Cell containing the content point `(x, y)`.
    pub(crate) fn hit_test_cell(&self, cells: &[Cell], x: i32, y: i32) -> Option<usize> {
        if y < self.rows_top {
            return None;
        }
        let row = self.rows.row_at((y - self.rows_top) as usize)?;
        (0..self.columns.count)
            .filter_map(|column| self.cell_index(row, column))
            .find(|&index| cells[index].bounds.contains(x, y))
    }

    /// Contiguous range of cells whose rows intersect `rect` (content
    /// coordinates).
    pub(crate) fn hit_test_cells(&self, cells: &[Cell], rect: &Rect) -> Range<usize> {
        if rect.is_empty() || self.rows.is_empty() {
            return 0..0;
        }
        let mut row = match rect.top - self.rows_top {
            offset if offset < 0 => 0,
            offset => match self.rows.row_at(offset as usize) {
                Some(row) => row,
                None => return 0..0,
            },
        };

        let mut range: Option<Range<usize>> = None;
        while row < self.row_count && self.row_top(row) < rect.bottom {
            if let Some(bounds) = self.row_bounds(cells, row) {
                if bounds.intersects(rect) {
                    let first = self.cell_index(row, 0).unwrap_or(0);
                    let last = self.cell_index(row, self.columns.count - 1).unwrap_or(first);
                    range = Some(match range {
                        Some(found) => found.start..last + 1,
                        None => first..last + 1,
                    });
                }
            }
            row += 1;
        }
        range.unwrap_or(0..0)
    }
}

#[cfg(test)]
#[path = "grid_tests.rs"]
mod tests;
