//! Terminal mouse events to pointer samples.
//!
//! The engine works in pixels; a terminal reports cells. Every cell is
//! treated as a fixed-size block of pixels and pointer positions map to the
//! center of the cell under the mouse.

use crate::geometry::{Rect, Size};
use crate::gesture::{PointerAction, Sample};
use crate::scheduler::Timestamp;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// Wheel notches scroll this many terminal rows.
pub const WHEEL_ROWS: i32 = 3;

/// Pixel size of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    /// Cell width in pixels.
    pub width: i32,
    /// Cell height in pixels.
    pub height: i32,
}

impl Default for CellSize {
    fn default() -> Self {
        Self {
            width: 8,
            height: 16,
        }
    }
}

impl CellSize {
    /// Pixel size of a `columns` x `rows` area.
    pub fn view_size(&self, columns: u16, rows: u16) -> Size {
        Size::new(
            i32::from(columns) * self.width,
            i32::from(rows) * self.height,
        )
    }

    /// Center of a cell in pixels.
    pub fn cell_center(&self, column: u16, row: u16) -> (f32, f32) {
        (
            (i32::from(column) * self.width) as f32 + self.width as f32 / 2.0,
            (i32::from(row) * self.height) as f32 + self.height as f32 / 2.0,
        )
    }

    /// Cells covered by a pixel rect, as `(left, top, right, bottom)` with
    /// exclusive right and bottom. Partly covered cells count.
    pub fn cells_of(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        (
            rect.left.div_euclid(self.width),
            rect.top.div_euclid(self.height),
            (rect.right + self.width - 1).div_euclid(self.width),
            (rect.bottom + self.height - 1).div_euclid(self.height),
        )
    }
}

/// Converts a left-button press, drag or release into a sample. Other
/// buttons, moves without a button and wheel events yield `None`.
pub fn sample_from_mouse(mouse: &MouseEvent, cell: CellSize, time: Timestamp) -> Option<Sample> {
    let action = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerAction::Down,
        MouseEventKind::Drag(MouseButton::Left) => PointerAction::Move,
        MouseEventKind::Up(MouseButton::Left) => PointerAction::Up,
        _ => return None,
    };
    let (x, y) = cell.cell_center(mouse.column, mouse.row);
    Some(Sample::single(action, x, y, time))
}

/// Scroll offset in pixels for a wheel event.
pub fn wheel_delta(mouse: &MouseEvent, cell: CellSize) -> Option<(i32, i32)> {
    let vertical = WHEEL_ROWS * cell.height;
    let horizontal = WHEEL_ROWS * cell.width;
    match mouse.kind {
        MouseEventKind::ScrollUp => Some((0, -vertical)),
        MouseEventKind::ScrollDown => Some((0, vertical)),
        MouseEventKind::ScrollLeft => Some((-horizontal, 0)),
        MouseEventKind::ScrollRight => Some((horizontal, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn left_button_maps_to_cell_centers() {
        let cell = CellSize::default();
        let time = Timestamp::from_millis(7);

        let down = sample_from_mouse(&mouse(MouseEventKind::Down(MouseButton::Left), 2, 1), cell, time)
            .expect("press is a sample");
        assert_eq!(down.action, PointerAction::Down);
        assert_eq!(down.position(), Point::new(20.0, 24.0));
        assert_eq!(down.time, time);

        let drag = sample_from_mouse(&mouse(MouseEventKind::Drag(MouseButton::Left), 0, 0), cell, time)
            .expect("drag is a sample");
        assert_eq!(drag.action, PointerAction::Move);

        let up = sample_from_mouse(&mouse(MouseEventKind::Up(MouseButton::Left), 0, 0), cell, time)
            .expect("release is a sample");
        assert_eq!(up.action, PointerAction::Up);
    }

    #[test]
    fn other_events_are_not_samples() {
        let cell = CellSize::default();
        let time = Timestamp::default();
        for kind in [
            MouseEventKind::Down(MouseButton::Right),
            MouseEventKind::Moved,
            MouseEventKind::ScrollDown,
        ] {
            assert_eq!(sample_from_mouse(&mouse(kind, 1, 1), cell, time), None);
        }
    }

    #[test]
    fn wheel_scrolls_by_rows() {
        let cell = CellSize::default();
        assert_eq!(wheel_delta(&mouse(MouseEventKind::ScrollDown, 0, 0), cell), Some((0, 48)));
        assert_eq!(wheel_delta(&mouse(MouseEventKind::ScrollUp, 0, 0), cell), Some((0, -48)));
        assert_eq!(wheel_delta(&mouse(MouseEventKind::ScrollLeft, 0, 0), cell), Some((-24, 0)));
        assert_eq!(
            wheel_delta(&mouse(MouseEventKind::Down(MouseButton::Left), 0, 0), cell),
            None
        );
    }

    #[test]
    fn partly_covered_cells_count() {
        let cell = CellSize::default();
        assert_eq!(cell.cells_of(&Rect::new(153, 2, 158, 47)), (19, 0, 20, 3));
        assert_eq!(cell.cells_of(&Rect::new(-8, -20, 8, 16)), (-1, -2, 1, 1));
        assert_eq!(cell.view_size(20, 4), Size::new(160, 64));
    }
}
