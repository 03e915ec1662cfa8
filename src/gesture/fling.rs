//! Fling on release.

use super::{
    calc_line_angle, distance, is_angle_between, Gesture, GestureContext, GestureEvent,
    GestureFlags, PointerAction, Sample, VelocityTracker,
};
use crate::geometry::Point;

/// Emits the release velocity when a stream ends with enough speed.
///
/// Velocities below the minimum are zeroed per axis, so a mostly vertical
/// fling reports a pure vertical velocity.
#[derive(Debug, Clone)]
pub struct FlingGesture {
    flags: GestureFlags,
    tracker: VelocityTracker,
    down: Option<Point>,
    min_velocity: Option<f32>,
    max_velocity: Option<f32>,
    min_angle: f64,
    max_angle: f64,
}

impl Default for FlingGesture {
    fn default() -> Self {
        Self {
            flags: GestureFlags::default(),
            tracker: VelocityTracker::new(),
            down: None,
            min_velocity: None,
            max_velocity: None,
            min_angle: 0.0,
            max_angle: 180.0,
        }
    }
}

impl FlingGesture {
    /// Creates a recognizer using the configured velocity limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the configured minimum velocity.
    pub fn set_min_velocity(&mut self, velocity: f32) {
        self.min_velocity = Some(velocity);
    }

    /// Overrides the configured maximum velocity.
    pub fn set_max_velocity(&mut self, velocity: f32) {
        self.max_velocity = Some(velocity);
    }

    /// Accepts only flings whose line angle lies in `[min, max)` degrees.
    pub fn set_angle_range(&mut self, min: f64, max: f64) {
        self.min_angle = min;
        self.max_angle = max;
    }
}

impl<H> Gesture<H> for FlingGesture {
    fn flags(&self) -> &GestureFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut GestureFlags {
        &mut self.flags
    }

    fn do_restart(&mut self, _reset: bool) {
        self.tracker.clear();
        self.down = None;
    }

    fn do_detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, H>) {
        self.tracker.add(sample);
        if sample.action == PointerAction::Down {
            self.down = Some(sample.position());
        }
        if sample.action != PointerAction::Up {
            return;
        }

        let config = cx.config();
        let at = sample.position();
        let origin = self.down.unwrap_or(at);
        if distance(origin, at) < f64::from(config.touch_slop) {
            return;
        }

        let min = self.min_velocity.unwrap_or(config.min_fling_velocity);
        let max = self.max_velocity.unwrap_or(config.max_fling_velocity);
        let mut velocity = self.tracker.velocity(config.velocity_window_ms, max);
        if velocity.x.abs() < min {
            velocity.x = 0.0;
        }
        if velocity.y.abs() < min {
            velocity.y = 0.0;
        }

        let angle = calc_line_angle(Point::default(), velocity);
        if !is_angle_between(angle, self.min_angle, self.max_angle) {
            return;
        }

        if velocity != Point::default() {
            let gesture = cx.gesture_id();
            cx.emit(GestureEvent::Fling {
                gesture,
                at,
                velocity,
            });
        }
    }
}
