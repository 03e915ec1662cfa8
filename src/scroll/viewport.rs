//! Viewport position, content bounds and the scroll state machine.

use super::physics::{Motion, MotionParams, ScrollLimits};
use super::thumb::ThumbMargins;
use super::{
    AnimationId, AnimationOutcome, ObserverId, ScrollEvent, ScrollObserver, ScrollState,
    ScrollTask,
};
use crate::config::{EngineConfig, OverscrollMode, ThumbConfig};
use crate::error::EngineError;
use crate::geometry::{Point, Rect, RectF, Size};
use crate::scheduler::{SharedClock, TaskId, TaskQueue, Timestamp};
use std::fmt;
use tracing::{debug, trace};

/// Duration of the ease used by [`ScrollCore::request_rect_on_screen`].
const REQUEST_ON_SCREEN_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slide {
    id: AnimationId,
    force: bool,
}

/// Per-axis flag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Axes {
    pub(crate) horizontal: bool,
    pub(crate) vertical: bool,
}

impl Axes {
    pub(crate) const NONE: Axes = Axes {
        horizontal: false,
        vertical: false,
    };

    pub(crate) fn any(self) -> bool {
        self.horizontal || self.vertical
    }
}

/// Viewport, content bounds and scroll animation.
///
/// Positions are content-space coordinates of the viewport's top-left corner.
/// The viewport is kept as floats so animations move smoothly; the rounded
/// [`ScrollCore::viewport`] is what observers and the layout engine see.
pub struct ScrollCore {
    pub(super) thumb_config: ThumbConfig,
    tasks: TaskQueue<ScrollTask>,
    view_size: Size,
    viewport_f: RectF,
    viewport: Rect,
    pub(super) content: Rect,
    state: ScrollState,
    idle_since: Timestamp,
    scrolling_since: Timestamp,
    motion: Motion,
    slide: Option<Slide>,
    next_animation: u64,
    pending_restrict: Option<TaskId>,
    max_overscroll: Size,
    horizontal_overscroll: OverscrollMode,
    vertical_overscroll: OverscrollMode,
    can_drag_fling: bool,
    can_horz_drag: bool,
    can_vert_drag: bool,
    pub(crate) dragging: Axes,
    pub(crate) seeking: Axes,
    pub(super) thumb_enabled: bool,
    pub(super) seek_enabled: bool,
    pub(super) vertical_thumb_margins: ThumbMargins,
    pub(super) horizontal_thumb_margins: ThumbMargins,
    observers: Vec<(ObserverId, Box<dyn ScrollObserver>)>,
    next_observer: u64,
    record_events: bool,
    events: Vec<ScrollEvent>,
}

impl fmt::Debug for ScrollCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollCore")
            .field("state", &self.state)
            .field("viewport", &self.viewport)
            .field("content", &self.content)
            .field("slide", &self.slide)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ScrollCore {
    /// Creates an idle core with an empty view and no content.
    pub fn new(config: &EngineConfig, clock: SharedClock) -> Self {
        let scroll = &config.scroll;
        let tasks = TaskQueue::new(clock);
        let now = tasks.now();
        let params = MotionParams {
            decay_ms: scroll.fling_decay_ms,
            stop_velocity: scroll.fling_stop_velocity,
            spring_back_ms: scroll.spring_back_ms,
        };
        Self {
            max_overscroll: Size::new(scroll.overscroll_width, scroll.overscroll_height),
            horizontal_overscroll: scroll.horizontal_overscroll,
            vertical_overscroll: scroll.vertical_overscroll,
            thumb_enabled: config.thumb.enabled,
            seek_enabled: config.thumb.seek_enabled,
            thumb_config: config.thumb.clone(),
            tasks,
            view_size: Size::default(),
            viewport_f: RectF::default(),
            viewport: Rect::default(),
            content: Rect::default(),
            state: ScrollState::Idle,
            idle_since: now,
            scrolling_since: now,
            motion: Motion::new(params),
            slide: None,
            next_animation: 0,
            pending_restrict: None,
            can_drag_fling: true,
            can_horz_drag: true,
            can_vert_drag: true,
            dragging: Axes::NONE,
            seeking: Axes::NONE,
            vertical_thumb_margins: ThumbMargins::VERTICAL,
            horizontal_thumb_margins: ThumbMargins::HORIZONTAL,
            observers: Vec::new(),
            next_observer: 0,
            record_events: false,
            events: Vec::new(),
        }
    }

    // ---- view and content ----

    /// Size of the view the viewport is shown in.
    pub fn view_size(&self) -> Size {
        self.view_size
    }

    /// Resizes the view, keeping the viewport origin.
    pub fn set_view_size(&mut self, size: Size) {
        let changed = size != self.view_size;
        self.view_size = size;
        self.after_layout(changed);
    }

    /// Layout finished. Re-applies the viewport when the view changed and
    /// schedules one clamp into the overscroll range.
    pub fn after_layout(&mut self, changed: bool) {
        if changed {
            self.do_scroll_by(0.0, 0.0);
        }
        if self.pending_restrict.is_none() {
            self.pending_restrict = Some(self.tasks.post(ScrollTask::RestrictAfterLayout));
        }
    }

    /// Rounded viewport in content coordinates.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Sub-pixel viewport in content coordinates.
    pub fn viewport_f(&self) -> RectF {
        self.viewport_f
    }

    /// Full extent of the content.
    pub fn content_bounds(&self) -> Rect {
        self.content
    }

    /// Replaces the content bounds.
    ///
    /// A running fling is restarted from the current position and velocity
    /// so it stops within the new limits.
    pub fn set_content_bounds(&mut self, bounds: Rect) {
        if bounds == self.content {
            return;
        }
        trace!(?bounds, "content bounds changed");
        self.content = bounds;

        if self.state == ScrollState::Fling {
            let velocity = self.motion.current_velocity();
            let start = self.rounded_origin();
            let now = self.tasks.now();
            self.motion.fling(
                start,
                velocity,
                self.scroll_limits(),
                self.overscroll_slack(),
                now,
            );
        }
    }

    /// Resizes the content, keeping its origin.
    pub fn set_content_size(&mut self, width: i32, height: i32) {
        let c = self.content;
        self.set_content_bounds(Rect::new(c.left, c.top, c.left + width, c.top + height));
    }

    /// Width of the content.
    pub fn content_width(&self) -> i32 {
        self.content.width()
    }

    /// Height of the content.
    pub fn content_height(&self) -> i32 {
        self.content.height()
    }

    // ---- limits ----

    /// Smallest resting horizontal position.
    pub fn min_scroll_x(&self) -> i32 {
        self.content.left
    }

    /// Largest resting horizontal position.
    pub fn max_scroll_x(&self) -> i32 {
        self.content
            .left
            .max(self.content.right - self.view_size.width)
    }

    /// Smallest resting vertical position.
    pub fn min_scroll_y(&self) -> i32 {
        self.content.top
    }

    /// Largest resting vertical position.
    pub fn max_scroll_y(&self) -> i32 {
        self.content
            .top
            .max(self.content.bottom - self.view_size.height)
    }

    /// Horizontal slack allowed past the content edges.
    pub fn max_overscroll_width(&self) -> i32 {
        match self.horizontal_overscroll {
            OverscrollMode::Always => self.max_overscroll.width,
            OverscrollMode::Auto if self.content.width() > self.view_size.width => {
                self.max_overscroll.width
            }
            OverscrollMode::Auto | OverscrollMode::Never => 0,
        }
    }

    /// Vertical slack allowed past the content edges.
    pub fn max_overscroll_height(&self) -> i32 {
        match self.vertical_overscroll {
            OverscrollMode::Always => self.max_overscroll.height,
            OverscrollMode::Auto if self.content.height() > self.view_size.height => {
                self.max_overscroll.height
            }
            OverscrollMode::Auto | OverscrollMode::Never => 0,
        }
    }

    /// Smallest horizontal position, slack included.
    pub fn min_overscroll_x(&self) -> i32 {
        self.min_scroll_x() - self.max_overscroll_width()
    }

    /// Largest horizontal position, slack included.
    pub fn max_overscroll_x(&self) -> i32 {
        self.max_scroll_x() + self.max_overscroll_width()
    }

    /// Smallest vertical position, slack included.
    pub fn min_overscroll_y(&self) -> i32 {
        self.min_scroll_y() - self.max_overscroll_height()
    }

    /// Largest vertical position, slack included.
    pub fn max_overscroll_y(&self) -> i32 {
        self.max_scroll_y() + self.max_overscroll_height()
    }

    /// Sets the configured slack for both axes.
    pub fn set_max_overscroll(&mut self, width: i32, height: i32) {
        self.max_overscroll = Size::new(width.max(0), height.max(0));
    }

    /// Horizontal overscroll mode.
    pub fn horizontal_overscroll_mode(&self) -> OverscrollMode {
        self.horizontal_overscroll
    }

    /// Sets the horizontal overscroll mode.
    pub fn set_horizontal_overscroll_mode(&mut self, mode: OverscrollMode) {
        self.horizontal_overscroll = mode;
    }

    /// Vertical overscroll mode.
    pub fn vertical_overscroll_mode(&self) -> OverscrollMode {
        self.vertical_overscroll
    }

    /// Sets the vertical overscroll mode.
    pub fn set_vertical_overscroll_mode(&mut self, mode: OverscrollMode) {
        self.vertical_overscroll = mode;
    }

    /// True when the content is wider than the view, or overscroll is
    /// always allowed horizontally.
    pub fn can_scroll_horizontally(&self) -> bool {
        self.content.width() > self.view_size.width
            || (self.horizontal_overscroll == OverscrollMode::Always
                && self.max_overscroll.width > 0)
    }

    /// True when the content is taller than the view, or overscroll is
    /// always allowed vertically.
    pub fn can_scroll_vertically(&self) -> bool {
        self.content.height() > self.view_size.height
            || (self.vertical_overscroll == OverscrollMode::Always
                && self.max_overscroll.height > 0)
    }

    /// True when there is horizontal slack.
    pub fn can_overscroll_horizontally(&self) -> bool {
        self.max_overscroll_width() > 0
    }

    /// True when there is vertical slack.
    pub fn can_overscroll_vertically(&self) -> bool {
        self.max_overscroll_height() > 0
    }

    /// True when the viewport is at or left of the content's left edge.
    pub fn reaches_content_left(&self) -> bool {
        self.viewport.left <= self.content.left
    }

    /// True when the viewport is at or right of the content's right edge.
    pub fn reaches_content_right(&self) -> bool {
        self.viewport.left >= self.content.right - self.view_size.width
    }

    /// True when the viewport is at or above the content's top edge.
    pub fn reaches_content_top(&self) -> bool {
        self.viewport.top <= self.content.top
    }

    /// True when the viewport is at or below the content's bottom edge.
    pub fn reaches_content_bottom(&self) -> bool {
        self.viewport.top >= self.content.bottom - self.view_size.height
    }

    /// Horizontal position as a fraction of the scroll range.
    pub fn normalized_scroll_x(&self) -> f32 {
        normalized(
            self.viewport_f.left,
            self.min_scroll_x(),
            self.max_scroll_x(),
        )
    }

    /// Vertical position as a fraction of the scroll range.
    pub fn normalized_scroll_y(&self) -> f32 {
        normalized(self.viewport_f.top, self.min_scroll_y(), self.max_scroll_y())
    }

    // ---- drag permissions ----

    /// Whether a press during an animation turns straight into a drag.
    pub fn can_drag_fling(&self) -> bool {
        self.can_drag_fling
    }

    /// Allows or forbids grabbing a moving viewport.
    pub fn set_can_drag_fling(&mut self, can: bool) {
        self.can_drag_fling = can;
    }

    /// Whether horizontal drags are recognized.
    pub fn can_horz_drag(&self) -> bool {
        self.can_horz_drag
    }

    /// Allows or forbids horizontal drags.
    pub fn set_can_horz_drag(&mut self, can: bool) {
        self.can_horz_drag = can;
    }

    /// Whether vertical drags are recognized.
    pub fn can_vert_drag(&self) -> bool {
        self.can_vert_drag
    }

    /// Allows or forbids vertical drags.
    pub fn set_can_vert_drag(&mut self, can: bool) {
        self.can_vert_drag = can;
    }

    /// True while a drag moves the viewport horizontally.
    pub fn is_horz_dragging(&self) -> bool {
        self.dragging.horizontal
    }

    /// True while a drag moves the viewport vertically.
    pub fn is_vert_dragging(&self) -> bool {
        self.dragging.vertical
    }

    /// True while a seek thumb is held.
    pub fn is_seeking(&self) -> bool {
        self.seeking.any()
    }

    // ---- state ----

    /// Current scroll state.
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Milliseconds since the scroller last became idle, zero while scrolling.
    pub fn idle_time(&self) -> u64 {
        if self.state == ScrollState::Idle {
            self.tasks.now().since(self.idle_since)
        } else {
            0
        }
    }

    /// Milliseconds since the current scroll started, zero while idle.
    pub fn scroll_time(&self) -> u64 {
        if self.state == ScrollState::Idle {
            0
        } else {
            self.tasks.now().since(self.scrolling_since)
        }
    }

    /// Current time of the core's clock.
    pub fn now(&self) -> Timestamp {
        self.tasks.now()
    }

    /// Where the viewport comes to rest, accounting for a running animation.
    pub fn final_position(&self) -> Point {
        if self.slide.is_some() {
            self.motion.final_position()
        } else {
            Point::new(self.viewport_f.left, self.viewport_f.top)
        }
    }

    /// Animation currently driving the viewport.
    pub fn running_animation(&self) -> Option<AnimationId> {
        self.slide.map(|slide| slide.id)
    }

    pub(crate) fn set_scroll_state(&mut self, state: ScrollState) {
        if self.state == state {
            return;
        }
        let old = self.state;
        self.state = state;

        let now = self.tasks.now();
        if state == ScrollState::Idle {
            self.idle_since = now;
        } else {
            self.scrolling_since = now;
        }
        if matches!(state, ScrollState::Idle | ScrollState::Smooth) {
            self.seeking = Axes::NONE;
            self.dragging = Axes::NONE;
        }

        debug!(%old, new = %state, "scroll state changed");
        self.notify(ScrollEvent::StateChanged { old, new: state });
    }

    // ---- immediate scrolling ----

    /// Moves the viewport to `(x, y)` clamped to the overscroll range.
    /// Aborts any animation and leaves the scroller idle.
    pub fn scroll_to(&mut self, x: i32, y: i32) {
        self.abort_slide();
        self.set_scroll_state(ScrollState::Idle);
        self.restrict_scroll_to(x as f32, y as f32);
    }

    /// Moves the viewport by `(dx, dy)`, see [`ScrollCore::scroll_to`].
    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.abort_slide();
        self.set_scroll_state(ScrollState::Idle);
        self.restrict_scroll_by(dx as f32, dy as f32);
    }

    /// Moves the viewport to `(x, y)` without clamping.
    pub fn force_scroll_to(&mut self, x: i32, y: i32) {
        self.abort_slide();
        self.set_scroll_state(ScrollState::Idle);
        self.do_scroll_to(x as f32, y as f32);
    }

    /// Clamps the viewport into the resting range if it is outside.
    pub fn spring_back(&mut self) {
        let x = self
            .viewport
            .left
            .min(self.max_scroll_x())
            .max(self.min_scroll_x());
        let y = self
            .viewport
            .top
            .min(self.max_scroll_y())
            .max(self.min_scroll_y());
        if x != self.viewport.left || y != self.viewport.top {
            self.scroll_to(x, y);
        }
    }

    /// Moves the viewport without changing the state, clamped to the
    /// overscroll range.
    pub(crate) fn scroll_to_f(&mut self, x: f32, y: f32) {
        self.abort_slide();
        self.restrict_scroll_to(x, y);
    }

    pub(crate) fn scroll_by_f(&mut self, dx: f32, dy: f32) {
        self.abort_slide();
        self.restrict_scroll_by(dx, dy);
    }

    fn restrict_scroll_by(&mut self, dx: f32, dy: f32) {
        self.restrict_scroll_to(self.viewport_f.left + dx, self.viewport_f.top + dy);
    }

    fn restrict_scroll_to(&mut self, x: f32, y: f32) {
        let x = x
            .min(self.max_overscroll_x() as f32)
            .max(self.min_overscroll_x() as f32);
        let y = y
            .min(self.max_overscroll_y() as f32)
            .max(self.min_overscroll_y() as f32);
        self.do_scroll_to(x, y);
    }

    pub(crate) fn do_scroll_by(&mut self, dx: f32, dy: f32) {
        self.do_scroll_to(self.viewport_f.left + dx, self.viewport_f.top + dy);
    }

    /// Places the viewport without clamping, aborting nothing.
    pub(crate) fn do_scroll_to(&mut self, x: f32, y: f32) {
        self.viewport_f = RectF::from_origin_size(x, y, self.view_size);
        let rounded = self.viewport_f.round();
        let viewport_changed = rounded != self.viewport;
        self.viewport = rounded;
        self.notify(ScrollEvent::Scrolled {
            viewport_changed,
            viewport: rounded,
        });
    }

    // ---- animated scrolling ----

    /// Flings with a pointer velocity (px/s). A pointer moving up (negative
    /// `vy`) scrolls the content down. Past a limit the velocity is damped
    /// by the rubber band.
    pub fn fling_by(&mut self, vx: f32, vy: f32) -> AnimationId {
        self.abort_slide();
        self.set_scroll_state(ScrollState::Fling);
        self.on_fling(vx, vy)
    }

    pub(crate) fn on_fling(&mut self, vx: f32, vy: f32) -> AnimationId {
        let vx = -vx * self.scale_of_scroll_x(-vx);
        let vy = -vy * self.scale_of_scroll_y(-vy);
        self.slide_with_velocity(vx, vy)
    }

    /// Drags the viewport by a pointer translation, damped past the limits.
    /// Enters [`ScrollState::Drag`] and aborts any animation.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if self.state != ScrollState::Drag {
            self.abort_slide();
            self.set_scroll_state(ScrollState::Drag);
            self.dragging = Axes {
                horizontal: dx != 0.0,
                vertical: dy != 0.0,
            };
        }
        self.on_drag(dx, dy);
    }

    pub(crate) fn on_drag(&mut self, dx: f32, dy: f32) {
        let sx = -dx * self.scale_of_scroll_x(-dx);
        let sy = -dy * self.scale_of_scroll_y(-dy);
        self.scroll_to_f(self.viewport_f.left + sx, self.viewport_f.top + sy);
    }

    /// Seeks to a normalized position, `0.0..=1.0` per axis. Enters
    /// [`ScrollState::Seek`].
    pub fn seek(&mut self, px: f32, py: f32) {
        if self.state != ScrollState::Seek {
            self.abort_slide();
            self.set_scroll_state(ScrollState::Seek);
        }
        self.on_seek(px, py);
    }

    pub(crate) fn on_seek(&mut self, px: f32, py: f32) {
        let (min_x, max_x) = (self.min_scroll_x() as f32, self.max_scroll_x() as f32);
        let (min_y, max_y) = (self.min_scroll_y() as f32, self.max_scroll_y() as f32);
        self.scroll_to_f(min_x + (max_x - min_x) * px, min_y + (max_y - min_y) * py);
    }

    /// Pointer stream ended without a release: a drag springs back, a seek
    /// ends.
    pub(crate) fn end_interaction(&mut self) {
        match self.state {
            ScrollState::Drag => {
                self.set_scroll_state(ScrollState::Fling);
                self.on_fling(0.0, 0.0);
            }
            ScrollState::Seek => self.set_scroll_state(ScrollState::Idle),
            _ => {}
        }
    }

    /// Scrolls with a velocity (px/s) in content direction, in
    /// [`ScrollState::Smooth`].
    pub fn scroll_smoothly(&mut self, vx: f32, vy: f32) -> AnimationId {
        self.abort_slide();
        self.set_scroll_state(ScrollState::Smooth);
        self.slide_with_velocity(vx, vy)
    }

    /// Eases to `(x, y)` over `duration` ms, clamped to the overscroll range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDuration`] for a zero duration.
    pub fn scroll_smoothly_to(
        &mut self,
        x: i32,
        y: i32,
        duration: u64,
    ) -> Result<AnimationId, EngineError> {
        let (dx, dy) = (x as f32 - self.viewport_f.left, y as f32 - self.viewport_f.top);
        self.start_smooth(dx, dy, duration, false)
    }

    /// Eases by `(dx, dy)` over `duration` ms, clamped to the overscroll
    /// range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDuration`] for a zero duration.
    pub fn scroll_smoothly_by(
        &mut self,
        dx: i32,
        dy: i32,
        duration: u64,
    ) -> Result<AnimationId, EngineError> {
        self.start_smooth(dx as f32, dy as f32, duration, false)
    }

    /// Eases to `(x, y)` without clamping and without springing back.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDuration`] for a zero duration.
    pub fn force_scroll_smoothly_to(
        &mut self,
        x: i32,
        y: i32,
        duration: u64,
    ) -> Result<AnimationId, EngineError> {
        let (dx, dy) = (x as f32 - self.viewport_f.left, y as f32 - self.viewport_f.top);
        self.start_smooth(dx, dy, duration, true)
    }

    /// Eases back into the resting range, in [`ScrollState::Smooth`].
    pub fn spring_back_smoothly(&mut self) -> AnimationId {
        self.abort_slide();
        self.set_scroll_state(ScrollState::Smooth);
        self.slide_with_velocity(0.0, 0.0)
    }

    /// Scrolls the least distance that brings `rect` (content coordinates)
    /// on screen. Returns the animation when not `immediate`.
    pub fn request_rect_on_screen(&mut self, rect: Rect, immediate: bool) -> Option<AnimationId> {
        let request = rect.intersection(&self.content)?;
        let visible = self.viewport;
        let dx = visible_delta(visible.left, visible.right, request.left, request.right);
        let dy = visible_delta(visible.top, visible.bottom, request.top, request.bottom);
        if dx == 0 && dy == 0 {
            return None;
        }
        if immediate {
            self.scroll_by(dx, dy);
            None
        } else {
            self.scroll_smoothly_by(dx, dy, REQUEST_ON_SCREEN_MS).ok()
        }
    }

    fn start_smooth(
        &mut self,
        dx: f32,
        dy: f32,
        duration: u64,
        force: bool,
    ) -> Result<AnimationId, EngineError> {
        if duration == 0 {
            return Err(EngineError::InvalidDuration);
        }
        self.abort_slide();
        self.set_scroll_state(ScrollState::Smooth);
        Ok(self.slide_by(dx, dy, duration, force))
    }

    fn slide_with_velocity(&mut self, vx: f32, vy: f32) -> AnimationId {
        let start = self.rounded_origin();
        let now = self.tasks.now();
        self.motion.fling(
            start,
            Point::new(vx.round(), vy.round()),
            self.scroll_limits(),
            self.overscroll_slack(),
            now,
        );
        self.start_slide(false)
    }

    fn slide_by(&mut self, dx: f32, dy: f32, duration: u64, force: bool) -> AnimationId {
        let start = self.rounded_origin();
        let (dx, dy) = if force {
            (dx, dy)
        } else {
            (
                dx.min(self.max_overscroll_x() as f32 - start.x)
                    .max(self.min_overscroll_x() as f32 - start.x),
                dy.min(self.max_overscroll_y() as f32 - start.y)
                    .max(self.min_overscroll_y() as f32 - start.y),
            )
        };
        let now = self.tasks.now();
        self.motion
            .start_scroll(start, Point::new(dx.round(), dy.round()), duration, now);
        self.start_slide(force)
    }

    fn start_slide(&mut self, force: bool) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        self.slide = Some(Slide { id, force });
        self.tasks.post(ScrollTask::Slide(id));
        trace!(animation = id.0, force, "slide started");
        id
    }

    fn abort_slide(&mut self) {
        self.motion.force_finished();
        if let Some(slide) = self.slide.take() {
            trace!(animation = slide.id.0, "slide aborted");
        }
    }

    fn step_slide(&mut self, id: AnimationId) {
        let Some(slide) = self.slide.filter(|slide| slide.id == id) else {
            self.notify(ScrollEvent::AnimationFinished {
                id,
                outcome: AnimationOutcome::Cancelled,
            });
            return;
        };

        let now = self.tasks.now();
        self.motion.compute(now);
        let at = self.motion.current();
        self.do_scroll_to(at.x, at.y);

        if !self.motion.is_finished() {
            self.tasks.post(ScrollTask::Slide(id));
            return;
        }
        if !slide.force {
            let start = self.rounded_origin();
            let limits = self.scroll_limits();
            if self.motion.spring_back(start, limits, now) {
                self.tasks.post(ScrollTask::Slide(id));
                return;
            }
        }

        self.slide = None;
        self.set_scroll_state(ScrollState::Idle);
        self.notify(ScrollEvent::AnimationFinished {
            id,
            outcome: AnimationOutcome::Finished,
        });
    }

    fn rounded_origin(&self) -> Point {
        Point::new(self.viewport.left as f32, self.viewport.top as f32)
    }

    fn scroll_limits(&self) -> ScrollLimits {
        ScrollLimits {
            min_x: self.min_scroll_x() as f32,
            max_x: self.max_scroll_x() as f32,
            min_y: self.min_scroll_y() as f32,
            max_y: self.max_scroll_y() as f32,
        }
    }

    fn overscroll_slack(&self) -> Point {
        Point::new(
            self.max_overscroll_width() as f32,
            self.max_overscroll_height() as f32,
        )
    }

    /// Rubber-band factor for a horizontal move in direction `v`.
    pub fn scale_of_scroll_x(&self, v: f32) -> f32 {
        rubber_band(
            self.viewport_f.left,
            v,
            self.min_scroll_x() as f32,
            self.max_scroll_x() as f32,
            self.max_overscroll_width() as f32,
        )
    }

    /// Rubber-band factor for a vertical move in direction `v`.
    pub fn scale_of_scroll_y(&self, v: f32) -> f32 {
        rubber_band(
            self.viewport_f.top,
            v,
            self.min_scroll_y() as f32,
            self.max_scroll_y() as f32,
            self.max_overscroll_height() as f32,
        )
    }

    // ---- coordinates ----

    /// Converts a content point to view coordinates.
    pub fn content_to_view(&self, point: Point) -> Point {
        point.offset(-(self.viewport.left as f32), -(self.viewport.top as f32))
    }

    /// Converts a view point to content coordinates.
    pub fn view_to_content(&self, point: Point) -> Point {
        point.offset(self.viewport.left as f32, self.viewport.top as f32)
    }

    /// Converts a content rectangle to view coordinates.
    pub fn content_rect_to_view(&self, rect: Rect) -> Rect {
        rect.offset(-self.viewport.left, -self.viewport.top)
    }

    /// Converts a view rectangle to content coordinates.
    pub fn view_rect_to_content(&self, rect: Rect) -> Rect {
        rect.offset(self.viewport.left, self.viewport.top)
    }

    // ---- notification ----

    /// Registers an observer.
    pub fn add_observer(&mut self, observer: Box<dyn ScrollObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unregisters an observer. Returns false for an unknown id.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Also records notifications for [`ScrollCore::take_events`].
    pub fn set_record_events(&mut self, record: bool) {
        self.record_events = record;
        if !record {
            self.events.clear();
        }
    }

    /// Drains recorded notifications.
    pub fn take_events(&mut self) -> Vec<ScrollEvent> {
        std::mem::take(&mut self.events)
    }

    fn notify(&mut self, event: ScrollEvent) {
        for (_, observer) in &mut self.observers {
            match event {
                ScrollEvent::StateChanged { old, new } => {
                    observer.on_scroll_state_changed(old, new)
                }
                ScrollEvent::Scrolled {
                    viewport_changed,
                    viewport,
                } => observer.on_scroll(viewport_changed, viewport),
                ScrollEvent::AnimationFinished { id, outcome } => {
                    observer.on_animation_finished(id, outcome)
                }
            }
        }
        if self.record_events {
            self.events.push(event);
        }
    }

    // ---- frames ----

    /// Runs due animation frames and the post-layout clamp.
    pub fn run_due(&mut self) {
        for (task, kind) in self.tasks.drain_due() {
            match kind {
                ScrollTask::Slide(id) => self.step_slide(id),
                ScrollTask::RestrictAfterLayout => {
                    if self.pending_restrict == Some(task) {
                        self.pending_restrict = None;
                        self.restrict_scroll_by(0.0, 0.0);
                    }
                }
            }
        }
    }

    /// True while frames or the post-layout clamp are scheduled.
    pub fn has_pending_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Earliest scheduled frame.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.tasks.next_due()
    }
}

fn normalized(position: f32, min: i32, max: i32) -> f32 {
    if max == min {
        0.0
    } else {
        (position - min as f32) / (max - min) as f32
    }
}

/// Rubber-band factor: 1 inside the limits, falling linearly to 0 at the end
/// of the slack when moving further out.
fn rubber_band(position: f32, direction: f32, min: f32, max: f32, slack: f32) -> f32 {
    if position <= min && direction < 0.0 {
        let over = min - slack;
        if slack == 0.0 || position <= over {
            0.0
        } else {
            (position - over).abs() / slack
        }
    } else if position >= max && direction > 0.0 {
        let over = max + slack;
        if slack == 0.0 || position >= over {
            0.0
        } else {
            (over - position).abs() / slack
        }
    } else {
        1.0
    }
}

/// Smallest move of `[start, end)` that brings `[request_start,
/// request_end)` into view. Zero when already visible, or when the request
/// covers the visible span.
pub(crate) fn visible_delta(start: i32, end: i32, request_start: i32, request_end: i32) -> i32 {
    if start <= request_start && end >= request_end {
        return 0;
    }
    if start > request_start && end < request_end {
        return 0;
    }
    if start < request_start {
        (request_start - start).min(request_end - end)
    } else {
        -(start - request_start).min(end - request_end)
    }
}

#[cfg(test)]
#[path = "viewport_tests.rs"]
mod tests;
