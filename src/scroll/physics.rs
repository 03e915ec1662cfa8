//! Time-based viewport motion.
//!
//! [`Motion`] animates a 2D position with one of three curves per axis:
//! an eased scroll over a fixed duration, a fling with exponential velocity
//! decay, and a spring back to the nearest scroll limit. It is sampled at
//! arbitrary times, so a late frame just lands further along the curve.

use crate::geometry::Point;
use crate::scheduler::Timestamp;

/// Scroll limits on both axes, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollLimits {
    /// Smallest horizontal position.
    pub min_x: f32,
    /// Largest horizontal position.
    pub max_x: f32,
    /// Smallest vertical position.
    pub min_y: f32,
    /// Largest vertical position.
    pub max_y: f32,
}

/// Tuning shared by both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Time constant of the fling velocity decay, in milliseconds.
    pub decay_ms: f32,
    /// Velocity (px/s) below which a fling stops.
    pub stop_velocity: f32,
    /// Duration of a spring back.
    pub spring_back_ms: u64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            decay_ms: 325.0,
            stop_velocity: 20.0,
            spring_back_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Still,
    Ease {
        from: f32,
        delta: f32,
        duration: u64,
    },
    Fling {
        from: f32,
        velocity: f32,
        lower: f32,
        upper: f32,
        duration: f32,
        tau: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisMotion {
    curve: Curve,
    start: Timestamp,
    current: f32,
    velocity: f32,
    finished: bool,
}

impl Default for AxisMotion {
    fn default() -> Self {
        Self {
            curve: Curve::Still,
            start: Timestamp::default(),
            current: 0.0,
            velocity: 0.0,
            finished: true,
        }
    }
}

fn ease_out(progress: f32) -> f32 {
    let remaining = 1.0 - progress;
    1.0 - remaining * remaining
}

impl AxisMotion {
    fn hold(&mut self, at: f32) {
        self.curve = Curve::Still;
        self.current = at;
        self.velocity = 0.0;
        self.finished = true;
    }

    fn ease(&mut self, from: f32, delta: f32, duration: u64, now: Timestamp) {
        self.curve = Curve::Ease {
            from,
            delta,
            duration: duration.max(1),
        };
        self.start = now;
        self.current = from;
        self.velocity = 0.0;
        self.finished = false;
    }

    fn fling(
        &mut self,
        from: f32,
        velocity: f32,
        (min, max): (f32, f32),
        over: f32,
        params: &MotionParams,
        now: Timestamp,
    ) {
        if from < min || from > max {
            self.spring_back(from, min, max, params, now);
            return;
        }
        if velocity.abs() <= params.stop_velocity {
            self.hold(from);
            return;
        }

        let tau = params.decay_ms;
        // v(t) = v0 * e^(-t / tau) reaches the stop velocity at this time.
        let duration = tau * (velocity.abs() / params.stop_velocity).ln();
        self.curve = Curve::Fling {
            from,
            velocity,
            lower: min - over,
            upper: max + over,
            duration,
            tau,
        };
        self.start = now;
        self.current = from;
        self.velocity = velocity;
        self.finished = false;
    }

    fn spring_back(
        &mut self,
        from: f32,
        min: f32,
        max: f32,
        params: &MotionParams,
        now: Timestamp,
    ) -> bool {
        let target = if from < min {
            min
        } else if from > max {
            max
        } else {
            self.hold(from);
            return false;
        };
        self.ease(from, target - from, params.spring_back_ms, now);
        true
    }

    fn final_position(&self) -> f32 {
        match self.curve {
            Curve::Still => self.current,
            Curve::Ease { from, delta, .. } => from + delta,
            Curve::Fling {
                from,
                velocity,
                lower,
                upper,
                duration,
                tau,
            } => fling_position(from, velocity, duration, tau).clamp(lower, upper),
        }
    }

    fn compute(&mut self, now: Timestamp) {
        if self.finished {
            return;
        }
        let elapsed = now.since(self.start);
        match self.curve {
            Curve::Still => self.finished = true,
            Curve::Ease {
                from,
                delta,
                duration,
            } => {
                if elapsed >= duration {
                    self.hold(from + delta);
                } else {
                    let progress = elapsed as f32 / duration as f32;
                    self.current = from + delta * ease_out(progress);
                }
            }
            Curve::Fling {
                from,
                velocity,
                lower,
                upper,
                duration,
                tau,
            } => {
                let t = (elapsed as f32).min(duration);
                let position = fling_position(from, velocity, t, tau);
                // Only a bound the motion is heading for can stop it.
                if velocity < 0.0 && position <= lower {
                    self.hold(lower);
                } else if velocity > 0.0 && position >= upper {
                    self.hold(upper);
                } else if elapsed as f32 >= duration {
                    self.hold(position);
                } else {
                    self.current = position;
                    self.velocity = velocity * (-t / tau).exp();
                }
            }
        }
    }
}

/// Position `t` ms into a fling. `tau_ms` is the decay time constant.
fn fling_position(from: f32, velocity: f32, t: f32, tau_ms: f32) -> f32 {
    from + velocity * (tau_ms / 1000.0) * (1.0 - (-t / tau_ms).exp())
}

/// Two-axis motion.
#[derive(Debug, Clone, Default)]
pub struct Motion {
    x: AxisMotion,
    y: AxisMotion,
    params: MotionParams,
}

impl Motion {
    /// Creates a finished motion at the origin.
    pub fn new(params: MotionParams) -> Self {
        Self {
            x: AxisMotion::default(),
            y: AxisMotion::default(),
            params,
        }
    }

    /// Tuning in use.
    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Eases from `start` by `delta` over `duration` ms.
    pub fn start_scroll(&mut self, start: Point, delta: Point, duration: u64, now: Timestamp) {
        self.x.ease(start.x, delta.x, duration, now);
        self.y.ease(start.y, delta.y, duration, now);
    }

    /// Flings from `start` with `velocity` (px/s).
    ///
    /// The motion may run `over` past `limits` and stops there. An axis that
    /// starts outside its limits springs back instead.
    pub fn fling(
        &mut self,
        start: Point,
        velocity: Point,
        limits: ScrollLimits,
        over: Point,
        now: Timestamp,
    ) {
        let params = self.params;
        self.x.fling(
            start.x,
            velocity.x,
            (limits.min_x, limits.max_x),
            over.x,
            &params,
            now,
        );
        self.y.fling(
            start.y,
            velocity.y,
            (limits.min_y, limits.max_y),
            over.y,
            &params,
            now,
        );
    }

    /// Starts easing back into `limits`. Returns false when `start` is
    /// already inside them.
    pub fn spring_back(&mut self, start: Point, limits: ScrollLimits, now: Timestamp) -> bool {
        let params = self.params;
        let x = self
            .x
            .spring_back(start.x, limits.min_x, limits.max_x, &params, now);
        let y = self
            .y
            .spring_back(start.y, limits.min_y, limits.max_y, &params, now);
        x || y
    }

    /// Advances to `now`. Returns true while still moving.
    pub fn compute(&mut self, now: Timestamp) -> bool {
        self.x.compute(now);
        self.y.compute(now);
        !self.is_finished()
    }

    /// Position after the last [`Motion::compute`].
    pub fn current(&self) -> Point {
        Point::new(self.x.current, self.y.current)
    }

    /// Where the motion will come to rest.
    pub fn final_position(&self) -> Point {
        Point::new(self.x.final_position(), self.y.final_position())
    }

    /// Velocity (px/s) after the last [`Motion::compute`].
    pub fn current_velocity(&self) -> Point {
        Point::new(self.x.velocity, self.y.velocity)
    }

    /// True when both axes are at rest.
    pub fn is_finished(&self) -> bool {
        self.x.finished && self.y.finished
    }

    /// Stops both axes where they are.
    pub fn force_finished(&mut self) {
        let (x, y) = (self.x.current, self.y.current);
        self.x.hold(x);
        self.y.hold(y);
    }
}
