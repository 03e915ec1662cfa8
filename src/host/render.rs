//! Drawing an [`ItemsView`] into a ratatui buffer.

use super::input::CellSize;
use super::labels::TextItem;
use crate::items::{DrawableKind, ItemsAdapter, ItemsView};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use unicode_width::UnicodeWidthChar;

/// Glyph used for scroll thumbs.
pub const THUMB_SYMBOL: &str = "┃";

/// Alpha below which an item is drawn dimmed.
const DIM_ALPHA: f32 = 0.75;

/// Longest prefix of `text` that fits in `max` columns. Truncated labels
/// end with an ellipsis.
pub fn fit_to_width(text: &str, max: usize) -> String {
    let total: usize = text.chars().filter_map(UnicodeWidthChar::width).sum();
    if total <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > max - 1 {
            break;
        }
        out.push(ch);
        used += width;
    }
    out.push('…');
    out
}

fn item_style(kind: DrawableKind, alpha: f32) -> Style {
    let style = match kind {
        DrawableKind::Item { pressed: true, .. } => {
            Style::default().add_modifier(Modifier::REVERSED)
        }
        DrawableKind::Item { .. } => Style::default(),
        DrawableKind::GroupTitle { .. } => Style::default().add_modifier(Modifier::BOLD),
        DrawableKind::Header | DrawableKind::Footer => Style::default().fg(Color::Cyan),
        DrawableKind::Empty => Style::default().fg(Color::DarkGray),
    };
    if alpha < DIM_ALPHA {
        style.add_modifier(Modifier::DIM)
    } else {
        style
    }
}

/// Draws the view's header, footer, visible items, group titles or empty
/// placeholder into `area`, followed by the vertical thumb when it is visible.
///
/// Labels start one cell in from their item's left edge and are cut to the
/// item's width. A label whose row or first column falls outside `area` is
/// skipped.
pub fn render_items<A>(view: &mut ItemsView<A>, area: Rect, buf: &mut Buffer, cell: CellSize)
where
    A: ItemsAdapter<View = TextItem>,
{
    let left = i32::from(area.x);
    let top = i32::from(area.y);
    let right = i32::from(area.right());
    let bottom = i32::from(area.bottom());

    for drawable in view.drawables() {
        let (x0, y0, x1, _) = cell.cells_of(&drawable.bounds);
        let row = top + y0;
        let column = left + x0 + 1;
        if row < top || row >= bottom || column < left || column >= right {
            continue;
        }
        let room = (left + x1).min(right) - column;
        if room <= 0 {
            continue;
        }
        let label = fit_to_width(drawable.view.label(), room as usize);
        buf.set_string(
            column as u16,
            row as u16,
            label,
            item_style(drawable.kind, drawable.alpha),
        );
    }

    let core = view.core();
    if !core.is_thumb_visible() {
        return;
    }
    let Some(thumb) = core.vertical_thumb() else {
        return;
    };
    let (x0, y0, _, y1) = cell.cells_of(&thumb.bounds);
    let column = left + x0;
    if column < left || column >= right {
        return;
    }
    let style = if thumb.alpha < 128 {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Gray)
    };
    for row in (top + y0).max(top)..(top + y1).min(bottom) {
        buf.set_string(column as u16, row as u16, THUMB_SYMBOL, style);
    }
}
