//! Single tap.

use super::{distance, Gesture, GestureContext, GestureEvent, GestureFlags, PointerAction, Sample};
use crate::geometry::Point;
use crate::scheduler::Timestamp;

/// Confirms a tap when one contact goes down and comes up again within the
/// jump-tap timeout without travelling past the touch slop.
#[derive(Debug, Clone, Default)]
pub struct TapGesture {
    flags: GestureFlags,
    first: Option<(Point, Timestamp)>,
}

impl TapGesture {
    /// Creates a recognizer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H> Gesture<H> for TapGesture {
    fn flags(&self) -> &GestureFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut GestureFlags {
        &mut self.flags
    }

    fn do_restart(&mut self, _reset: bool) {
        self.first = None;
    }

    fn do_detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, H>) {
        let Some((origin, start)) = self.first else {
            if sample.pointer_count() == 1 {
                self.first = Some((sample.position(), sample.time));
            }
            return;
        };

        let config = cx.config();
        if sample.pointer_count() > 1
            || sample.time.since(start) > config.jump_tap_timeout_ms
            || distance(origin, sample.position()) > f64::from(config.touch_slop)
        {
            self.flags.set_keep_detecting(false);
            return;
        }

        if sample.action == PointerAction::Up {
            let gesture = cx.gesture_id();
            cx.emit(GestureEvent::Tap {
                gesture,
                at: sample.position(),
            });
        }
    }
}
