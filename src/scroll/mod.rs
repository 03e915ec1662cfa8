//! Momentum scrolling.
//!
//! [`ScrollCore`] owns the viewport position, the content bounds and the
//! scroll state machine, and animates the viewport with [`physics::Motion`].
//! [`Scroller`] pairs it with two gesture detectors: a drag/fling/seek
//! recognizer that drives the core directly, and a click detector (tap and
//! long press) that only listens while the scroller is idle.
//!
//! Everything is single-threaded. Animation frames are tasks in the core's
//! [`TaskQueue`](crate::scheduler::TaskQueue); the host calls
//! [`Scroller::run_due`] once per frame.

pub mod gesture;
pub mod physics;
mod thumb;
pub mod viewport;

pub use gesture::ScrollGesture;
pub use physics::{Motion, MotionParams, ScrollLimits};
pub use thumb::{Thumb, ThumbKind, ThumbMargins};
pub use viewport::ScrollCore;

use crate::config::EngineConfig;
use crate::geometry::Rect;
use crate::gesture::{
    GestureDetector, GestureEvent, LongPressGesture, PointerAction, Sample, TapGesture,
};
use crate::scheduler::SharedClock;
use std::fmt;
use tracing::trace;

/// Scroll state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollState {
    /// At rest.
    #[default]
    Idle,
    /// Following a drag.
    Drag,
    /// Following a seek thumb.
    Seek,
    /// Decelerating after a release.
    Fling,
    /// Running a programmatic animation.
    Smooth,
}

impl fmt::Display for ScrollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrollState::Idle => "idle",
            ScrollState::Drag => "drag",
            ScrollState::Seek => "seek",
            ScrollState::Fling => "fling",
            ScrollState::Smooth => "smooth",
        };
        f.write_str(name)
    }
}

/// Identity of one viewport animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub u64);

/// How an animation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// It ran to completion.
    Finished,
    /// It was replaced or aborted.
    Cancelled,
}

/// Handle returned by [`ScrollCore::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Receives scroll notifications synchronously.
pub trait ScrollObserver {
    /// The scroll state changed.
    fn on_scroll_state_changed(&mut self, _old: ScrollState, _new: ScrollState) {}

    /// The viewport was repositioned. `viewport_changed` is false when the
    /// rounded viewport stayed where it was.
    fn on_scroll(&mut self, _viewport_changed: bool, _viewport: Rect) {}

    /// An animation ended.
    fn on_animation_finished(&mut self, _id: AnimationId, _outcome: AnimationOutcome) {}
}

/// Recorded scroll notification, for owners that poll instead of observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEvent {
    /// See [`ScrollObserver::on_scroll_state_changed`].
    StateChanged {
        /// Previous state.
        old: ScrollState,
        /// New state.
        new: ScrollState,
    },
    /// See [`ScrollObserver::on_scroll`].
    Scrolled {
        /// Whether the rounded viewport moved.
        viewport_changed: bool,
        /// Viewport after the move.
        viewport: Rect,
    },
    /// See [`ScrollObserver::on_animation_finished`].
    AnimationFinished {
        /// Animation that ended.
        id: AnimationId,
        /// How it ended.
        outcome: AnimationOutcome,
    },
}

/// Deferred scroller work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTask {
    /// One frame of the animation with this id.
    Slide(AnimationId),
    /// Clamp the viewport once layout has settled.
    RestrictAfterLayout,
}

/// Scroll core plus the detectors that feed it.
pub struct Scroller {
    core: ScrollCore,
    scroll_detector: GestureDetector<ScrollCore>,
    click_detector: GestureDetector,
    enabled: bool,
}

impl fmt::Debug for Scroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scroller")
            .field("core", &self.core)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Scroller {
    /// Creates an idle scroller with empty content.
    pub fn new(config: &EngineConfig, clock: SharedClock) -> Self {
        let core = ScrollCore::new(config, clock.clone());

        let mut scroll_detector = GestureDetector::new(config.gesture.clone(), clock.clone());
        scroll_detector.push_gesture(Box::new(ScrollGesture::new(config.scroll.scroll_order)));

        let mut click_detector = GestureDetector::new(config.gesture.clone(), clock);
        click_detector.push_gesture(Box::new(LongPressGesture::new()));
        click_detector.push_gesture(Box::new(TapGesture::new()));

        Self {
            core,
            scroll_detector,
            click_detector,
            enabled: true,
        }
    }

    /// Scroll state and viewport.
    pub fn core(&self) -> &ScrollCore {
        &self.core
    }

    /// Mutable scroll state and viewport.
    pub fn core_mut(&mut self) -> &mut ScrollCore {
        &mut self.core
    }

    /// Whether pointer input is processed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A disabled scroller ignores pointer input.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Feeds a pointer sample.
    ///
    /// The scroll recognizer always sees the sample. The click detector sees
    /// it only while idle and is reset otherwise. Returns the click
    /// detector's events (touch down/up/cancel, tap, long press).
    pub fn on_touch(&mut self, sample: &Sample) -> Vec<GestureEvent> {
        if !self.enabled {
            return Vec::new();
        }

        self.scroll_detector.on_touch_with(&mut self.core, sample);
        if sample.action == PointerAction::Cancel {
            self.core.end_interaction();
        }

        if self.core.state() == ScrollState::Idle {
            self.click_detector.on_touch(sample).events
        } else {
            trace!(state = %self.core.state(), "click detector reset while scrolling");
            self.click_detector.reset();
            Vec::new()
        }
    }

    /// Feeds a sample in intercept mode. Returns true when the scroll
    /// recognizer claims the stream.
    pub fn on_intercept(&mut self, sample: &Sample) -> bool {
        if !self.enabled {
            return false;
        }
        self.scroll_detector
            .on_intercept_with(&mut self.core, sample)
            .handled
    }

    /// A child asked not to have its stream intercepted.
    pub fn request_disallow_intercept(&mut self, disallow: bool) {
        if disallow {
            self.scroll_detector.reset();
        }
    }

    /// Runs due animation frames and gesture timers. Returns click events
    /// produced by timers (long press).
    pub fn run_due(&mut self) -> Vec<GestureEvent> {
        self.core.run_due();
        self.scroll_detector.run_due_with(&mut self.core);
        if self.core.state() == ScrollState::Idle {
            self.click_detector.run_due()
        } else {
            Vec::new()
        }
    }

    /// True while anything is scheduled.
    pub fn has_pending_work(&self) -> bool {
        self.core.has_pending_tasks()
            || self.scroll_detector.next_due().is_some()
            || self.click_detector.next_due().is_some()
    }
}

#[cfg(test)]
#[path = "scroller_tests.rs"]
mod tests;
