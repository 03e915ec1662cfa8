//! Scrollbar thumbs.
//!
//! Thumb bounds are in view coordinates and derived on demand from the
//! viewport and content bounds, so they never go stale.

use super::viewport::ScrollCore;
use super::ScrollState;
use crate::geometry::Rect;

/// Insets of a thumb track from the view edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbMargins {
    /// Left inset.
    pub left: i32,
    /// Top inset.
    pub top: i32,
    /// Right inset.
    pub right: i32,
    /// Bottom inset.
    pub bottom: i32,
}

impl ThumbMargins {
    /// Default track of the vertical thumb.
    pub const VERTICAL: ThumbMargins = ThumbMargins::new(0, 2, 2, 6);
    /// Default track of the horizontal thumb.
    pub const HORIZONTAL: ThumbMargins = ThumbMargins::new(2, 0, 6, 2);

    /// Creates margins.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Which thumb is shown on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbKind {
    /// Proportional thumb.
    #[default]
    Normal,
    /// Fixed-length thumb that can be grabbed to seek.
    Seek,
}

/// A thumb ready to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumb {
    /// Bounds in view coordinates.
    pub bounds: Rect,
    /// Thumb kind.
    pub kind: ThumbKind,
    /// Opacity, 0-255.
    pub alpha: u8,
}

impl ScrollCore {
    /// Visible part of the content width.
    pub fn horizontal_scroll_extent(&self) -> i32 {
        let (viewport, content) = (self.viewport(), self.content);
        let visible_left = content.left.max(viewport.left);
        let visible_right = viewport.right.min(content.right);
        (visible_right - visible_left).max(0)
    }

    /// Offset of the viewport into the content width.
    pub fn horizontal_scroll_offset(&self) -> i32 {
        (self.viewport().left - self.content.left)
            .min(self.content.width())
            .max(0)
    }

    /// Full content width.
    pub fn horizontal_scroll_range(&self) -> i32 {
        self.content.width()
    }

    /// Visible part of the content height.
    pub fn vertical_scroll_extent(&self) -> i32 {
        let (viewport, content) = (self.viewport(), self.content);
        let visible_top = content.top.max(viewport.top);
        let visible_bottom = viewport.bottom.min(content.bottom);
        (visible_bottom - visible_top).max(0)
    }

    /// Offset of the viewport into the content height.
    pub fn vertical_scroll_offset(&self) -> i32 {
        (self.viewport().top - self.content.top)
            .min(self.content.height())
            .max(0)
    }

    /// Full content height.
    pub fn vertical_scroll_range(&self) -> i32 {
        self.content.height()
    }

    /// Whether thumbs are drawn.
    pub fn thumb_enabled(&self) -> bool {
        self.thumb_enabled
    }

    /// Shows or hides thumbs.
    pub fn set_thumb_enabled(&mut self, enabled: bool) {
        self.thumb_enabled = enabled;
    }

    /// Whether seek thumbs may be used.
    pub fn seek_enabled(&self) -> bool {
        self.seek_enabled
    }

    /// Allows or forbids seek thumbs.
    pub fn set_seek_enabled(&mut self, enabled: bool) {
        self.seek_enabled = enabled;
    }

    /// Length of the seek thumb, `None` when there is no seek thumb.
    pub fn set_seek_thumb_length(&mut self, length: Option<i32>) {
        self.thumb_config.seek_length = length.filter(|length| *length > 0);
    }

    /// Track insets of the vertical thumb.
    pub fn vertical_thumb_margins(&self) -> ThumbMargins {
        self.vertical_thumb_margins
    }

    /// Sets the track insets of the vertical thumb.
    pub fn set_vertical_thumb_margins(&mut self, margins: ThumbMargins) {
        self.vertical_thumb_margins = margins;
    }

    /// Track insets of the horizontal thumb.
    pub fn horizontal_thumb_margins(&self) -> ThumbMargins {
        self.horizontal_thumb_margins
    }

    /// Sets the track insets of the horizontal thumb.
    pub fn set_horizontal_thumb_margins(&mut self, margins: ThumbMargins) {
        self.horizontal_thumb_margins = margins;
    }

    /// Thumb opacity, 0-255.
    ///
    /// Fully opaque while scrolling and for the keep-visible time after,
    /// then fades out linearly.
    pub fn thumb_alpha(&self) -> u8 {
        let opacity = if !self.thumb_enabled {
            0.0
        } else if self.state() == ScrollState::Idle {
            let idle = self.idle_time();
            let keep = self.thumb_config.keep_visible_ms;
            let fade = self.thumb_config.fade_ms;
            if idle <= keep {
                1.0
            } else if idle < keep + fade {
                (keep + fade - idle) as f32 / fade as f32
            } else {
                0.0
            }
        } else {
            1.0
        };
        (255.0 * opacity) as u8
    }

    /// True while any thumb is at least partly opaque.
    pub fn is_thumb_visible(&self) -> bool {
        self.thumb_alpha() > 0
    }

    fn horizontal_max_thumb_width(&self) -> i32 {
        let margins = self.horizontal_thumb_margins;
        self.view_size().width - margins.left - margins.right
    }

    fn vertical_max_thumb_height(&self) -> i32 {
        let margins = self.vertical_thumb_margins;
        self.view_size().height - margins.top - margins.bottom
    }

    fn thumb_kind(&self, content: i32, max_thumb: i32, viewport: f32, seeking: bool) -> ThumbKind {
        if !self.seek_enabled || content == 0 || max_thumb == 0 {
            return ThumbKind::Normal;
        }
        let Some(seek_length) = self.thumb_config.seek_length else {
            return ThumbKind::Normal;
        };
        if seeking {
            return ThumbKind::Seek;
        }
        let extent = viewport / content as f32;
        let max = seek_length as f32 / max_thumb as f32;
        if extent > max {
            ThumbKind::Normal
        } else {
            ThumbKind::Seek
        }
    }

    /// Kind of the horizontal thumb.
    pub fn horizontal_thumb_kind(&self) -> ThumbKind {
        self.thumb_kind(
            self.content.width(),
            self.horizontal_max_thumb_width(),
            self.viewport_f().width(),
            self.seeking.horizontal,
        )
    }

    /// Kind of the vertical thumb.
    pub fn vertical_thumb_kind(&self) -> ThumbKind {
        self.thumb_kind(
            self.content.height(),
            self.vertical_max_thumb_height(),
            self.viewport_f().height(),
            self.seeking.vertical,
        )
    }

    fn min_thumb_length(&self, kind: ThumbKind) -> i32 {
        match (kind, self.thumb_config.seek_length) {
            (ThumbKind::Seek, Some(length)) => length,
            _ => self.thumb_config.min_extent,
        }
    }

    /// Horizontal thumb bounds in view coordinates, `None` when the content
    /// fits.
    pub fn horizontal_thumb_bounds(&self) -> Option<Rect> {
        let offset = self.horizontal_scroll_offset();
        let extent = self.horizontal_scroll_extent();
        let range = self.horizontal_scroll_range();
        if range <= 0 || range <= extent {
            return None;
        }

        let margins = self.horizontal_thumb_margins;
        let view = self.view_size();
        let max_width = self.horizontal_max_thumb_width() as f32;
        let kind = self.horizontal_thumb_kind();
        let width = self
            .min_thumb_length(kind)
            .max((max_width * extent as f32 / range as f32).round() as i32);
        let left = margins.left + (max_width * offset as f32 / range as f32).round() as i32;
        let height = self.thumb_config.thickness;

        let bounds = Rect::new(
            left,
            view.height - margins.bottom - height,
            left + width,
            view.height - margins.bottom,
        );
        let limit = view.width - margins.right;
        Some(if bounds.right > limit {
            bounds.offset(limit - bounds.right, 0)
        } else {
            bounds
        })
    }

    /// Vertical thumb bounds in view coordinates, `None` when the content
    /// fits.
    pub fn vertical_thumb_bounds(&self) -> Option<Rect> {
        let offset = self.vertical_scroll_offset();
        let extent = self.vertical_scroll_extent();
        let range = self.vertical_scroll_range();
        if range <= 0 || range <= extent {
            return None;
        }

        let margins = self.vertical_thumb_margins;
        let view = self.view_size();
        let max_height = self.vertical_max_thumb_height() as f32;
        let kind = self.vertical_thumb_kind();
        let height = self
            .min_thumb_length(kind)
            .max((max_height * extent as f32 / range as f32).round() as i32);
        let top = margins.top + (max_height * offset as f32 / range as f32).round() as i32;
        let width = self.thumb_config.thickness;

        let bounds = Rect::new(
            view.width - width - margins.right,
            top,
            view.width - margins.right,
            top + height,
        );
        let limit = view.height - margins.bottom;
        Some(if bounds.bottom > limit {
            bounds.offset(0, limit - bounds.bottom)
        } else {
            bounds
        })
    }

    /// Horizontal thumb ready to draw, if visible.
    pub fn horizontal_thumb(&self) -> Option<Thumb> {
        self.thumb(self.horizontal_thumb_bounds(), self.horizontal_thumb_kind())
    }

    /// Vertical thumb ready to draw, if visible.
    pub fn vertical_thumb(&self) -> Option<Thumb> {
        self.thumb(self.vertical_thumb_bounds(), self.vertical_thumb_kind())
    }

    fn thumb(&self, bounds: Option<Rect>, kind: ThumbKind) -> Option<Thumb> {
        let alpha = self.thumb_alpha();
        if alpha == 0 {
            return None;
        }
        bounds.map(|bounds| Thumb {
            bounds,
            kind,
            alpha,
        })
    }

    fn seek_range(&self, kind: ThumbKind, max_thumb: i32) -> i32 {
        match (kind, self.thumb_config.seek_length) {
            (ThumbKind::Seek, Some(length)) => max_thumb - length,
            _ => 0,
        }
    }

    /// Converts a horizontal pointer step on the seek thumb into a change
    /// of the normalized position.
    pub(crate) fn horizontal_seek_offset(&self, dx: f32) -> f32 {
        let range = self.seek_range(
            self.horizontal_thumb_kind(),
            self.horizontal_max_thumb_width(),
        );
        if range == 0 {
            0.0
        } else {
            dx.trunc() / range as f32
        }
    }

    /// Vertical counterpart of [`ScrollCore::horizontal_seek_offset`].
    pub(crate) fn vertical_seek_offset(&self, dy: f32) -> f32 {
        let range = self.seek_range(self.vertical_thumb_kind(), self.vertical_max_thumb_height());
        if range == 0 {
            0.0
        } else {
            dy.trunc() / range as f32
        }
    }
}
