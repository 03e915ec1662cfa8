//! Drag translation with one or two contacts.

use super::{
    calc_angle, distance, is_line_between, Gesture, GestureContext, GestureEvent, GestureFlags,
    PointerAction, Sample,
};
use crate::geometry::Point;

/// Two-contact samples whose contact angle changes more than this (degrees)
/// are treated as a rotation, not a translation.
const MAX_PINCH_ROTATION: f64 = 10.0;

/// Emits translation steps while contacts move.
///
/// The first step is recognized once the travel reaches the slop along an
/// accepted angle; the next `detect_order` steps are swallowed, and every
/// later step of at least `min_step` is emitted. With two contacts the
/// centroid is tracked and a rotation or pinch restarts the measurement.
#[derive(Debug, Clone)]
pub struct TranslateGesture {
    flags: GestureFlags,
    last: Option<Sample>,
    min_step: f32,
    min_angle: f64,
    max_angle: f64,
    slop: f32,
    order: u32,
    detected: i64,
    recognized: Option<Point>,
    hold_on_detect: bool,
}

impl Default for TranslateGesture {
    fn default() -> Self {
        Self {
            flags: GestureFlags::default(),
            last: None,
            min_step: 1.0,
            min_angle: 0.0,
            max_angle: 180.0,
            slop: 0.0,
            order: 0,
            detected: -1,
            recognized: None,
            hold_on_detect: false,
        }
    }
}

impl TranslateGesture {
    /// Creates a recognizer with no slop and a one-pixel step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum travel of an emitted step after recognition.
    pub fn set_min_step(&mut self, step: f32) {
        self.min_step = step;
    }

    /// Accepted line angles for recognition, in degrees.
    pub fn set_angle_range(&mut self, min: f64, max: f64) {
        self.min_angle = min;
        self.max_angle = max;
    }

    /// Travel required before the first step is recognized.
    pub fn set_translate_slop(&mut self, slop: f32) {
        self.slop = slop;
    }

    /// Current slop.
    pub fn translate_slop(&self) -> f32 {
        self.slop
    }

    /// Steps swallowed after recognition before steps are emitted.
    pub fn set_detect_order(&mut self, order: u32) {
        self.order = order;
    }

    /// Claims the stream as soon as the translation is recognized.
    pub fn set_hold_on_detect(&mut self, hold: bool) {
        self.hold_on_detect = hold;
    }

    /// True once the first step has been recognized.
    pub fn is_detected(&self) -> bool {
        self.detected >= 0
    }

    /// Takes the travel of the step that recognized the translation, once.
    ///
    /// The recognition step itself is never emitted, so a host that starts
    /// work on recognition reads it here.
    pub fn take_recognized(&mut self) -> Option<Point> {
        self.recognized.take()
    }

    fn advance<H>(
        &mut self,
        origin: Point,
        translation: Point,
        sample: &Sample,
        cx: &mut GestureContext<'_, H>,
    ) {
        let travel = translation.x * translation.x + translation.y * translation.y;

        if self.detected < 0 {
            if travel >= self.slop * self.slop {
                if is_line_between(Point::default(), translation, self.min_angle, self.max_angle) {
                    self.detected += 1;
                    self.recognized = Some(translation);
                    if self.hold_on_detect {
                        self.flags.set_hold_detecting(true);
                    }
                }
                self.last = Some(sample.clone());
            }
            return;
        }

        self.detected += 1;
        if self.detected > i64::from(self.order) && travel >= self.min_step * self.min_step {
            let gesture = cx.gesture_id();
            cx.emit(GestureEvent::Translate {
                gesture,
                origin,
                translation,
            });
            self.last = Some(sample.clone());
        }
    }
}

fn centroid(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

impl<H> Gesture<H> for TranslateGesture {
    fn flags(&self) -> &GestureFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut GestureFlags {
        &mut self.flags
    }

    fn do_restart(&mut self, _reset: bool) {
        self.last = None;
        self.detected = -1;
        self.recognized = None;
    }

    fn do_detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, H>) {
        match sample.action {
            PointerAction::Move => {}
            PointerAction::Down => {
                self.last = Some(sample.clone());
                return;
            }
            PointerAction::Up | PointerAction::Cancel => {
                self.last = None;
                return;
            }
        }
        let Some(last) = self.last.take() else {
            self.last = Some(sample.clone());
            return;
        };

        let count = sample.pointer_count();
        if count == 0 || count > 2 || count != last.pointer_count() {
            self.last = Some(sample.clone());
            return;
        }

        if count == 1 {
            let origin = last.position();
            let current = sample.position();
            self.last = Some(last);
            self.advance(
                origin,
                Point::new(current.x - origin.x, current.y - origin.y),
                sample,
                cx,
            );
            return;
        }

        let (p0, p1) = (last.pointers[0], last.pointers[1]);
        let (Some(c0), Some(c1)) = (sample.find_pointer(p0.id), sample.find_pointer(p1.id)) else {
            self.flags.set_keep_detecting(false);
            return;
        };

        let angle_delta = (calc_angle(c0.position, c1.position)
            - calc_angle(p0.position, p1.position))
        .abs();
        let distance_delta = (distance(c0.position, c1.position)
            - distance(p0.position, p1.position))
        .abs();
        if angle_delta > MAX_PINCH_ROTATION || distance_delta > f64::from(cx.config().touch_slop) {
            self.last = Some(sample.clone());
            return;
        }

        let origin = centroid(p0.position, p1.position);
        let current = centroid(c0.position, c1.position);
        self.last = Some(last);
        self.advance(
            origin,
            Point::new(current.x - origin.x, current.y - origin.y),
            sample,
            cx,
        );
    }
}
