//! Pointer gesture recognition.
//!
//! Raw pointer [`Sample`]s are fed to a [`GestureDetector`], which arbitrates
//! between an ordered list of recognizers implementing [`Gesture`]. A
//! recognizer either confirms its gesture (pushing a [`GestureEvent`] into the
//! [`GestureContext`]), keeps watching, or declines by clearing its
//! keep-detecting flag. A recognizer that sets hold-detecting claims the
//! stream and every other recognizer is reset until it lets go.
//!
//! Recognizers are generic over a host type `H`. Plain recognizers ignore it;
//! a recognizer that must drive some state directly while it detects (the
//! scroller's drag/fling recognizer) receives that state through
//! [`GestureContext::host`].

pub mod detector;
pub mod fling;
pub mod long_press;
pub mod tap;
pub mod translate;
pub mod velocity;

pub use detector::{Dispatch, GestureDetector};
pub use fling::FlingGesture;
pub use long_press::LongPressGesture;
pub use tap::TapGesture;
pub use translate::TranslateGesture;
pub use velocity::VelocityTracker;

use crate::config::GestureConfig;
use crate::geometry::Point;
use crate::scheduler::{TaskId, TaskQueue, Timestamp};

/// Phase of a pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// First contact went down.
    Down,
    /// One or more contacts moved.
    Move,
    /// Last contact lifted.
    Up,
    /// The stream was aborted by the host.
    Cancel,
}

/// One contact of a pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Stable id of the contact for the duration of the stream.
    pub id: u32,
    /// Position in view coordinates.
    pub position: Point,
}

/// A pointer sample delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Phase of the sample.
    pub action: PointerAction,
    /// Active contacts, primary first.
    pub pointers: Vec<Pointer>,
    /// Monotonic time of the sample.
    pub time: Timestamp,
}

impl Sample {
    /// Single-contact sample at `(x, y)`.
    pub fn single(action: PointerAction, x: f32, y: f32, time: Timestamp) -> Self {
        Self {
            action,
            pointers: vec![Pointer {
                id: 0,
                position: Point::new(x, y),
            }],
            time,
        }
    }

    /// Single-contact down sample.
    pub fn down(x: f32, y: f32, time: Timestamp) -> Self {
        Self::single(PointerAction::Down, x, y, time)
    }

    /// Single-contact move sample.
    pub fn moved(x: f32, y: f32, time: Timestamp) -> Self {
        Self::single(PointerAction::Move, x, y, time)
    }

    /// Single-contact up sample.
    pub fn up(x: f32, y: f32, time: Timestamp) -> Self {
        Self::single(PointerAction::Up, x, y, time)
    }

    /// Single-contact cancel sample.
    pub fn cancel(x: f32, y: f32, time: Timestamp) -> Self {
        Self::single(PointerAction::Cancel, x, y, time)
    }

    /// Multi-contact sample.
    pub fn with_pointers(action: PointerAction, pointers: Vec<Pointer>, time: Timestamp) -> Self {
        Self {
            action,
            pointers,
            time,
        }
    }

    /// Position of the primary contact, origin if there is none.
    pub fn position(&self) -> Point {
        self.pointers
            .first()
            .map(|pointer| pointer.position)
            .unwrap_or_default()
    }

    /// Number of active contacts.
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Contact with the given id.
    pub fn find_pointer(&self, id: u32) -> Option<&Pointer> {
        self.pointers.iter().find(|pointer| pointer.id == id)
    }

    /// Copy of this sample with a different action.
    pub fn with_action(&self, action: PointerAction) -> Sample {
        Sample {
            action,
            pointers: self.pointers.clone(),
            time: self.time,
        }
    }
}

/// Identity of a recognizer inside its detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(pub u32);

/// Semantic event produced by the detector or one of its recognizers.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// A new stream started.
    TouchDown {
        /// Contact position.
        at: Point,
    },
    /// The stream ended normally.
    TouchUp {
        /// Contact position.
        at: Point,
    },
    /// The stream was cancelled.
    TouchCancel {
        /// Contact position.
        at: Point,
    },
    /// A tap was confirmed.
    Tap {
        /// Recognizer that confirmed it.
        gesture: GestureId,
        /// Release position.
        at: Point,
    },
    /// A long press was confirmed.
    LongPress {
        /// Recognizer that confirmed it.
        gesture: GestureId,
        /// Press position.
        at: Point,
    },
    /// A translation step.
    Translate {
        /// Recognizer that produced it.
        gesture: GestureId,
        /// Position the step started from.
        origin: Point,
        /// Offset of this step.
        translation: Point,
    },
    /// A fling on release.
    Fling {
        /// Recognizer that produced it.
        gesture: GestureId,
        /// Release position.
        at: Point,
        /// Velocity in px/s.
        velocity: Point,
    },
}

/// Control flags shared by every recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureFlags {
    keep: bool,
    hold: bool,
    skip_next: bool,
    delay_touch_up: bool,
    enabled: bool,
}

impl Default for GestureFlags {
    fn default() -> Self {
        Self {
            keep: true,
            hold: false,
            skip_next: false,
            delay_touch_up: false,
            enabled: true,
        }
    }
}

impl GestureFlags {
    /// Whether the recognizer still wants samples.
    pub fn keep_detecting(&self) -> bool {
        self.keep
    }

    /// Declining also drops any hold or touch-up delay.
    pub fn set_keep_detecting(&mut self, keep: bool) {
        self.keep = keep;
        if !keep {
            self.hold = false;
            self.delay_touch_up = false;
        }
    }

    /// Whether the recognizer claims the stream.
    pub fn hold_detecting(&self) -> bool {
        self.hold
    }

    /// Holding implies keep-detecting.
    pub fn set_hold_detecting(&mut self, hold: bool) {
        self.hold = hold;
        if hold {
            self.keep = true;
        }
    }

    /// Whether lower-priority recognizers are skipped for this sample.
    pub fn skip_next_detecting(&self) -> bool {
        self.skip_next
    }

    /// Skips lower-priority recognizers for the current sample.
    pub fn set_skip_next_detecting(&mut self, skip: bool) {
        self.skip_next = skip;
    }

    /// Whether the final up sample should be held back.
    pub fn delay_touch_up(&self) -> bool {
        self.delay_touch_up
    }

    /// Requests that the final up sample be held back.
    pub fn set_delay_touch_up(&mut self, delay: bool) {
        self.delay_touch_up = delay;
    }

    /// Whether the detector dispatches to this recognizer.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the recognizer.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn restart(&mut self) {
        self.keep = true;
        self.skip_next = false;
        self.hold = false;
        self.delay_touch_up = false;
    }
}

/// Deferred work owned by a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetectorTask {
    /// A recognizer timer.
    Gesture(GestureId),
    /// Redelivery of a held-back up sample.
    DelayedUp,
}

/// Everything a recognizer can touch while it looks at a sample.
pub struct GestureContext<'a, H> {
    host: &'a mut H,
    config: &'a GestureConfig,
    gesture: GestureId,
    delayed: bool,
    intercept: bool,
    events: &'a mut Vec<GestureEvent>,
    timers: &'a mut TaskQueue<DetectorTask>,
}

impl<'a, H> GestureContext<'a, H> {
    pub(crate) fn new(
        host: &'a mut H,
        config: &'a GestureConfig,
        gesture: GestureId,
        delayed: bool,
        intercept: bool,
        events: &'a mut Vec<GestureEvent>,
        timers: &'a mut TaskQueue<DetectorTask>,
    ) -> Self {
        Self {
            host,
            config,
            gesture,
            delayed,
            intercept,
            events,
            timers,
        }
    }

    /// State the detector was asked to drive.
    pub fn host(&mut self) -> &mut H {
        self.host
    }

    /// Gesture thresholds.
    pub fn config(&self) -> &GestureConfig {
        self.config
    }

    /// Id of the recognizer being run.
    pub fn gesture_id(&self) -> GestureId {
        self.gesture
    }

    /// True when the sample is a held-back up being redelivered.
    pub fn is_delayed(&self) -> bool {
        self.delayed
    }

    /// True when the detector runs in intercept mode.
    pub fn is_intercept(&self) -> bool {
        self.intercept
    }

    /// Current time.
    pub fn now(&self) -> Timestamp {
        self.timers.now()
    }

    /// Publishes an event.
    pub fn emit(&mut self, event: GestureEvent) {
        self.events.push(event);
    }

    /// Schedules [`Gesture::on_timer`] for the current recognizer.
    pub fn post_timer(&mut self, delay_millis: u64) -> TaskId {
        self.timers
            .post_delayed(DetectorTask::Gesture(self.gesture), delay_millis)
    }

    /// Cancels a timer posted with [`GestureContext::post_timer`].
    pub fn cancel_timer(&mut self, task: TaskId) {
        self.timers.cancel(task);
    }

    /// Context for a nested recognizer whose events go to `events`.
    ///
    /// Nested recognizers always run in detect mode, even while the outer
    /// one is intercepting.
    pub fn nested<'b>(&'b mut self, events: &'b mut Vec<GestureEvent>) -> GestureContext<'b, H> {
        GestureContext {
            host: &mut *self.host,
            config: self.config,
            gesture: self.gesture,
            delayed: self.delayed,
            intercept: false,
            events,
            timers: &mut *self.timers,
        }
    }
}

/// A gesture recognizer.
///
/// Implementors provide [`Gesture::do_restart`] and [`Gesture::do_detect`];
/// the provided [`Gesture::restart`] and [`Gesture::detect`] maintain the
/// shared flags around them.
pub trait Gesture<H = ()> {
    /// Shared flags.
    fn flags(&self) -> &GestureFlags;

    /// Mutable shared flags.
    fn flags_mut(&mut self) -> &mut GestureFlags;

    /// Clears per-stream state. `reset` also drops state kept across streams.
    fn do_restart(&mut self, reset: bool);

    /// Examines one sample.
    fn do_detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, H>);

    /// Examines one sample in intercept mode. Ignores it by default.
    fn do_intercept(&mut self, _sample: &Sample, _cx: &mut GestureContext<'_, H>) {}

    /// A timer posted by this recognizer fired.
    ///
    /// Returning a sample makes the detector dispatch it as if the host had
    /// sent it, followed by [`Gesture::after_timer`].
    fn on_timer(&mut self, _task: TaskId) -> Option<Sample> {
        None
    }

    /// Called after the sample returned by [`Gesture::on_timer`] was dispatched.
    fn after_timer(&mut self) {}

    /// Restarts detection for a new stream.
    fn restart(&mut self, reset: bool) {
        self.flags_mut().restart();
        self.do_restart(reset);
    }

    /// Runs detection on one sample unless the recognizer already declined.
    fn detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, H>) {
        self.flags_mut().set_skip_next_detecting(false);
        if !self.flags().keep_detecting() {
            return;
        }
        if cx.is_intercept() {
            self.do_intercept(sample, cx);
        } else {
            self.do_detect(sample, cx);
        }
    }
}

/// Angle of the vector `origin -> point`, counter-clockwise from +x with y
/// pointing up, in `[0, 360)`.
pub fn calc_angle(origin: Point, point: Point) -> f64 {
    let dx = f64::from(point.x - origin.x);
    let dy = f64::from(origin.y - point.y);
    if dx == 0.0 {
        return if dy > 0.0 { 90.0 } else { 270.0 };
    }
    let degrees = dy.atan2(dx).to_degrees();
    if degrees < 0.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

/// Angle of the line through `p1` and `p2`, in `[0, 180]`.
pub fn calc_line_angle(p1: Point, p2: Point) -> f64 {
    let angle = calc_angle(p1, p2);
    if angle > 180.0 {
        angle - 180.0
    } else {
        angle
    }
}

/// Wraps `degree` into `[min, min + 360)`.
pub fn normalize_degree(degree: f64, min: f64) -> f64 {
    (degree - min).rem_euclid(360.0) + min
}

/// True when the line through `p1` and `p2`, or its mirror across the
/// vertical axis, lies within `[min, max]` degrees.
pub fn is_line_between(p1: Point, p2: Point, min: f64, max: f64) -> bool {
    let line = calc_line_angle(p1, p2);
    let angle = normalize_degree(line, min);
    if angle >= min && angle <= max {
        return true;
    }
    let mirrored = normalize_degree(180.0 - line, min);
    mirrored >= min && mirrored <= max
}

/// True when `angle` or its opposite direction lies within `[min, max)`.
pub fn is_angle_between(angle: f64, min: f64, max: f64) -> bool {
    let direct = normalize_degree(angle, min);
    if direct >= min && direct < max {
        return true;
    }
    let opposite = normalize_degree(angle + 180.0, min);
    opposite >= min && opposite < max
}

/// Euclidean distance.
pub fn distance(p0: Point, p1: Point) -> f64 {
    f64::from(p0.distance(p1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Point = Point::new(0.0, 0.0);

    mod angles {
        use super::*;

        #[test]
        fn calc_angle_uses_upward_y() {
            assert_eq!(calc_angle(ORIGIN, Point::new(10.0, 0.0)), 0.0);
            assert_eq!(calc_angle(ORIGIN, Point::new(0.0, -10.0)), 90.0);
            assert_eq!(calc_angle(ORIGIN, Point::new(-10.0, 0.0)), 180.0);
            assert_eq!(calc_angle(ORIGIN, Point::new(0.0, 10.0)), 270.0);
        }

        #[test]
        fn calc_angle_diagonal() {
            let angle = calc_angle(ORIGIN, Point::new(10.0, -10.0));
            assert!((angle - 45.0).abs() < 1e-9, "got {angle}");
            let angle = calc_angle(ORIGIN, Point::new(10.0, 10.0));
            assert!((angle - 315.0).abs() < 1e-9, "got {angle}");
        }

        #[test]
        fn line_angle_folds_lower_half() {
            let angle = calc_line_angle(ORIGIN, Point::new(10.0, 10.0));
            assert!((angle - 135.0).abs() < 1e-9, "got {angle}");
        }

        #[test]
        fn normalize_wraps_into_window() {
            assert_eq!(normalize_degree(370.0, 0.0), 10.0);
            assert_eq!(normalize_degree(-10.0, 0.0), 350.0);
            assert_eq!(normalize_degree(300.0, -50.0), 300.0);
            assert_eq!(normalize_degree(320.0, -50.0), -40.0);
        }

        #[test]
        fn angle_between_accepts_opposite_direction() {
            assert!(is_angle_between(0.0, -50.0, 50.0));
            assert!(is_angle_between(180.0, -50.0, 50.0));
            assert!(!is_angle_between(90.0, -50.0, 50.0));
            assert!(is_angle_between(270.0, 40.0, 140.0));
        }

        #[test]
        fn line_between_full_range_accepts_everything() {
            assert!(is_line_between(ORIGIN, Point::new(3.0, 7.0), 0.0, 180.0));
            assert!(is_line_between(ORIGIN, Point::new(-3.0, -7.0), 0.0, 360.0));
        }

        #[test]
        fn line_between_narrow_window() {
            assert!(is_line_between(ORIGIN, Point::new(0.0, -10.0), 80.0, 100.0));
            assert!(!is_line_between(ORIGIN, Point::new(10.0, 0.0), 80.0, 100.0));
        }
    }

    mod flags {
        use super::*;

        #[test]
        fn declining_drops_hold_and_delay() {
            let mut flags = GestureFlags::default();
            flags.set_hold_detecting(true);
            flags.set_delay_touch_up(true);
            flags.set_keep_detecting(false);
            assert!(!flags.hold_detecting());
            assert!(!flags.delay_touch_up());
        }

        #[test]
        fn holding_implies_keep() {
            let mut flags = GestureFlags::default();
            flags.set_keep_detecting(false);
            flags.set_hold_detecting(true);
            assert!(flags.keep_detecting());
        }

        #[test]
        fn restart_keeps_enabled_state() {
            let mut flags = GestureFlags::default();
            flags.set_enabled(false);
            flags.set_keep_detecting(false);
            flags.restart();
            assert!(flags.keep_detecting());
            assert!(!flags.is_enabled());
        }
    }

    #[test]
    fn sample_position_defaults_to_origin_without_pointers() {
        let sample = Sample::with_pointers(PointerAction::Move, Vec::new(), Timestamp::default());
        assert_eq!(sample.position(), Point::default());
    }
}
