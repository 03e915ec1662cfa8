//! Per-item layout slot.

use super::adapter::MeasureSpec;
use super::pool::ContainerId;
use crate::geometry::{Rect, Size};

/// Whether a cell is materialized for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Outside the viewport and the preview margin.
    #[default]
    Hidden,
    /// Intersects the viewport.
    Visible,
    /// Inside the preview margin only.
    Preview,
}

/// Visual offset and opacity applied to one item on top of its layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTransform {
    /// Horizontal offset in pixels.
    pub dx: i32,
    /// Vertical offset in pixels.
    pub dy: i32,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
}

impl ItemTransform {
    const IDENTITY: ItemTransform = ItemTransform {
        dx: 0,
        dy: 0,
        alpha: 1.0,
    };

    fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Layout slot for one adapter position.
#[derive(Debug, Clone)]
pub(crate) struct Cell {
    /// Arranged bounds in content coordinates.
    pub(crate) bounds: Rect,
    /// Last measured size, `None` until measured or after invalidation.
    pub(crate) measured: Option<Size>,
    /// Constraint used for the next measurement.
    pub(crate) spec: MeasureSpec,
    pub(crate) container: Option<ContainerId>,
    /// The adapter must produce a fresh view before the next display.
    pub(crate) item_changed: bool,
    /// The container has been laid out at `bounds`.
    pub(crate) layout_valid: bool,
    pub(crate) force_visual: bool,
    /// Kept materialized regardless of visibility.
    pub(crate) pinned: bool,
    pub(crate) animating: bool,
    pub(crate) visibility: Visibility,
    pub(crate) transform: Option<ItemTransform>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            bounds: Rect::default(),
            measured: None,
            spec: MeasureSpec::UNSPECIFIED,
            container: None,
            item_changed: true,
            layout_valid: false,
            force_visual: false,
            pinned: false,
            animating: false,
            visibility: Visibility::Hidden,
            transform: None,
        }
    }
}

impl Cell {
    pub(crate) fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// True when the cell's container must stay with it.
    pub(crate) fn holds_container(&self) -> bool {
        self.visibility != Visibility::Hidden || self.pinned || self.animating
    }

    /// Next view must come from the adapter and be measured from scratch.
    pub(crate) fn mark_changed(&mut self) {
        self.item_changed = true;
        self.measured = None;
        self.layout_valid = false;
    }

    /// Sets the offset, keeping the current alpha. Returns true when a
    /// transform remains.
    pub(crate) fn set_offset(&mut self, dx: i32, dy: i32) -> bool {
        let alpha = self.transform.map_or(1.0, |t| t.alpha);
        self.set_transform(ItemTransform { dx, dy, alpha })
    }

    /// Sets the alpha, keeping the current offset. Returns true when a
    /// transform remains.
    pub(crate) fn set_alpha(&mut self, alpha: f32) -> bool {
        let (dx, dy) = self.transform.map_or((0, 0), |t| (t.dx, t.dy));
        self.set_transform(ItemTransform {
            dx,
            dy,
            alpha: alpha.clamp(0.0, 1.0),
        })
    }

    fn set_transform(&mut self, transform: ItemTransform) -> bool {
        self.transform = (!transform.is_identity()).then_some(transform);
        self.transform.is_some()
    }

    /// Recomputes the pin from the force flag and the transform.
    pub(crate) fn update_pin(&mut self) {
        self.pinned = self.force_visual || self.transform.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cells_need_a_view() {
        let cell = Cell::default();
        assert!(cell.item_changed);
        assert_eq!(cell.measured, None);
        assert!(!cell.holds_container());
    }

    #[test]
    fn identity_transform_collapses_to_none() {
        let mut cell = Cell::default();
        assert!(cell.set_offset(4, 0));
        assert!(cell.set_alpha(0.5));
        assert!(cell.set_offset(0, 0));
        assert!(!cell.set_alpha(1.0));
        assert_eq!(cell.transform, None);
    }

    #[test]
    fn pin_follows_force_or_transform() {
        let mut cell = Cell::default();
        cell.force_visual = true;
        cell.update_pin();
        assert!(cell.pinned);
        cell.force_visual = false;
        cell.update_pin();
        assert!(!cell.pinned);
        cell.set_alpha(0.2);
        cell.update_pin();
        assert!(cell.pinned);
        assert!(cell.holds_container());
    }
}
