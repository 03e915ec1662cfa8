//! Drag, fling and seek recognition for the scroller.

use super::viewport::{Axes, ScrollCore};
use super::{ScrollState, ThumbKind};
use crate::geometry::{Point, Rect};
use crate::gesture::{
    calc_angle, is_angle_between, FlingGesture, Gesture, GestureContext, GestureEvent,
    GestureFlags, PointerAction, Sample, TranslateGesture,
};
use tracing::trace;

type Host = ScrollCore;

/// Drives a [`ScrollCore`] from a pointer stream.
///
/// Wraps a translate recognizer (drag and seek steps) and a fling recognizer
/// (release velocity). A press on a seek thumb enters SEEK at once; a press
/// while the viewport is moving grabs it and enters DRAG; otherwise a drag
/// starts once the travel from the press passes the touch slop along a
/// scrollable axis.
#[derive(Debug, Clone)]
pub struct ScrollGesture {
    flags: GestureFlags,
    drag: TranslateGesture,
    fling: FlingGesture,
    scroll_order: u32,
}

impl ScrollGesture {
    /// Creates the recognizer. `scroll_order` translate steps are swallowed
    /// after a drag is recognized.
    pub fn new(scroll_order: u32) -> Self {
        let mut drag = TranslateGesture::new();
        drag.set_translate_slop(0.0);
        drag.set_detect_order(scroll_order);
        let mut fling = FlingGesture::new();
        fling.set_min_velocity(0.0);
        Self {
            flags: GestureFlags::default(),
            drag,
            fling,
            scroll_order,
        }
    }

    fn track_freely(&mut self) {
        self.drag.set_translate_slop(0.0);
        self.drag.set_angle_range(0.0, 360.0);
    }

    fn on_press(&mut self, at: Point, core: &mut ScrollCore, touch_slop: f32) -> bool {
        let state = core.state();
        if state != ScrollState::Drag
            && state != ScrollState::Seek
            && core.seek_enabled()
            && core.is_thumb_visible()
        {
            let (x, y) = (at.x as i32, at.y as i32);
            let on_thumb = |kind: ThumbKind, bounds: Option<Rect>| {
                kind == ThumbKind::Seek && bounds.is_some_and(|b| b.contains(x, y))
            };
            if on_thumb(core.horizontal_thumb_kind(), core.horizontal_thumb_bounds()) {
                core.seeking.horizontal = true;
            } else if on_thumb(core.vertical_thumb_kind(), core.vertical_thumb_bounds()) {
                core.seeking.vertical = true;
            }
        }

        if core.seeking.any() {
            self.track_freely();
            core.set_scroll_state(ScrollState::Seek);
            self.flags.set_hold_detecting(true);
        } else if state == ScrollState::Smooth {
            self.flags.set_keep_detecting(false);
            return false;
        } else if state != ScrollState::Idle && core.can_drag_fling() {
            trace!(%state, "grabbed moving viewport");
            if !core.dragging.any() {
                core.dragging = Axes {
                    horizontal: core.can_horz_drag() && core.can_scroll_horizontally(),
                    vertical: core.can_vert_drag() && core.can_scroll_vertically(),
                };
            }
            core.set_scroll_state(ScrollState::Drag);
            core.scroll_by_f(0.0, 0.0);
            self.flags.set_hold_detecting(true);
        } else {
            self.drag.set_translate_slop(touch_slop);
        }
        true
    }

    fn on_translate(&mut self, translation: Point, core: &mut ScrollCore) {
        match core.state() {
            ScrollState::Seek => {
                let dx = if core.seeking.horizontal {
                    core.horizontal_seek_offset(translation.x)
                } else {
                    0.0
                };
                let dy = if core.seeking.vertical {
                    core.vertical_seek_offset(translation.y)
                } else {
                    0.0
                };
                let px = (core.normalized_scroll_x() + dx).clamp(0.0, 1.0);
                let py = (core.normalized_scroll_y() + dy).clamp(0.0, 1.0);
                core.on_seek(px, py);
            }
            ScrollState::Drag => {
                let dx = if core.dragging.horizontal {
                    translation.x
                } else {
                    0.0
                };
                let dy = if core.dragging.vertical {
                    translation.y
                } else {
                    0.0
                };
                core.on_drag(dx, dy);
            }
            _ => self.maybe_start_drag(translation, core),
        }
    }

    fn maybe_start_drag(&mut self, translation: Point, core: &mut ScrollCore) {
        let angle = calc_angle(Point::default(), translation);
        if !core.can_scroll_horizontally() && !core.can_scroll_vertically() {
            Gesture::<Host>::flags_mut(&mut self.drag).set_keep_detecting(false);
            core.dragging = Axes::NONE;
        } else {
            core.dragging = Axes {
                horizontal: starts_horizontal_drag(core, angle, translation.x as i32),
                vertical: starts_vertical_drag(core, angle, translation.y as i32),
            };
        }

        if core.dragging.any() {
            self.track_freely();
            core.set_scroll_state(ScrollState::Drag);
            self.flags.set_hold_detecting(true);
        }
    }

    fn on_fling(&mut self, velocity: Point, core: &mut ScrollCore) {
        match core.state() {
            ScrollState::Seek => core.set_scroll_state(ScrollState::Idle),
            ScrollState::Drag => {
                core.set_scroll_state(ScrollState::Fling);
                let vx = if core.dragging.horizontal {
                    velocity.x
                } else {
                    0.0
                };
                let vy = if core.dragging.vertical {
                    velocity.y
                } else {
                    0.0
                };
                core.on_fling(vx, vy);
            }
            _ => {}
        }
    }

    fn runs_inner(&self) -> bool {
        self.flags.keep_detecting() && !self.flags.skip_next_detecting()
    }
}

fn starts_horizontal_drag(core: &ScrollCore, angle: f64, dx: i32) -> bool {
    core.can_horz_drag()
        && core.can_scroll_horizontally()
        && is_angle_between(angle, -50.0, 50.0)
        && dx != 0
        && (core.can_overscroll_horizontally()
            || (dx > 0 && !core.reaches_content_left())
            || (dx < 0 && !core.reaches_content_right()))
}

fn starts_vertical_drag(core: &ScrollCore, angle: f64, dy: i32) -> bool {
    core.can_vert_drag()
        && core.can_scroll_vertically()
        && is_angle_between(angle, 40.0, 140.0)
        && dy != 0
        && (core.can_overscroll_vertically()
            || (dy > 0 && !core.reaches_content_top())
            || (dy < 0 && !core.reaches_content_bottom()))
}

impl Gesture<Host> for ScrollGesture {
    fn flags(&self) -> &GestureFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut GestureFlags {
        &mut self.flags
    }

    fn do_restart(&mut self, reset: bool) {
        let drag_reset = reset || !Gesture::<Host>::flags(&self.drag).keep_detecting();
        Gesture::<Host>::restart(&mut self.drag, drag_reset);
        let fling_reset = reset || !Gesture::<Host>::flags(&self.fling).keep_detecting();
        Gesture::<Host>::restart(&mut self.fling, fling_reset);
        self.drag.set_detect_order(self.scroll_order);
    }

    fn do_detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, Host>) {
        if sample.pointer_count() > 1 && cx.host().state() == ScrollState::Idle {
            self.flags.set_keep_detecting(false);
            return;
        }

        if sample.action == PointerAction::Down {
            let touch_slop = cx.config().touch_slop;
            if !self.on_press(sample.position(), cx.host(), touch_slop) {
                return;
            }
        }

        if self.runs_inner() {
            let mut steps = Vec::new();
            self.drag.detect(sample, &mut cx.nested(&mut steps));
            if let Some(travel) = self.drag.take_recognized() {
                let state = cx.host().state();
                if state != ScrollState::Drag && state != ScrollState::Seek {
                    self.maybe_start_drag(travel, cx.host());
                }
            }
            for step in steps {
                if let GestureEvent::Translate { translation, .. } = step {
                    self.on_translate(translation, cx.host());
                }
            }
        }

        if self.runs_inner() {
            let mut releases = Vec::new();
            self.fling.detect(sample, &mut cx.nested(&mut releases));
            for release in releases {
                if let GestureEvent::Fling { velocity, .. } = release {
                    self.on_fling(velocity, cx.host());
                }
            }
        }

        if sample.action == PointerAction::Up {
            let core = cx.host();
            match core.state() {
                ScrollState::Seek => core.set_scroll_state(ScrollState::Idle),
                ScrollState::Drag => {
                    core.set_scroll_state(ScrollState::Fling);
                    core.on_fling(0.0, 0.0);
                }
                _ => {}
            }
        }
    }

    fn do_intercept(&mut self, sample: &Sample, cx: &mut GestureContext<'_, Host>) {
        self.do_detect(sample, cx);
    }
}
