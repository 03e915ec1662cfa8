//! Press and hold.

use super::{distance, Gesture, GestureContext, GestureEvent, GestureFlags, PointerAction, Sample};
use crate::scheduler::TaskId;

/// Confirms a long press when a single contact stays within the touch slop
/// until the long-press timeout fires.
///
/// The check runs from a timer: when it fires the recognizer replays its last
/// sample as a move through the detector, so the confirmation goes through the
/// same arbitration as any real sample.
#[derive(Debug, Clone, Default)]
pub struct LongPressGesture {
    flags: GestureFlags,
    down: Option<Sample>,
    last: Option<Sample>,
    pending_check: Option<TaskId>,
    checking: bool,
}

impl LongPressGesture {
    /// Creates a recognizer.
    pub fn new() -> Self {
        Self::default()
    }

    fn decline(&mut self) {
        self.flags.set_keep_detecting(false);
        self.pending_check = None;
    }
}

impl<H> Gesture<H> for LongPressGesture {
    fn flags(&self) -> &GestureFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut GestureFlags {
        &mut self.flags
    }

    fn do_restart(&mut self, _reset: bool) {
        self.down = None;
        self.last = None;
        self.pending_check = None;
        self.checking = false;
    }

    fn do_detect(&mut self, sample: &Sample, cx: &mut GestureContext<'_, H>) {
        if sample.pointer_count() > 1 {
            self.decline();
            return;
        }

        let Some(down) = &self.down else {
            if sample.action == PointerAction::Down {
                self.down = Some(sample.clone());
                let delay = cx.config().long_press_timeout_ms;
                self.pending_check = Some(cx.post_timer(delay));
            } else {
                self.decline();
            }
            return;
        };

        if distance(down.position(), sample.position()) > f64::from(cx.config().touch_slop) {
            self.decline();
            return;
        }
        self.last = Some(sample.clone());

        if self.checking {
            let gesture = cx.gesture_id();
            cx.emit(GestureEvent::LongPress {
                gesture,
                at: sample.position(),
            });
            self.decline();
        }
    }

    fn on_timer(&mut self, task: TaskId) -> Option<Sample> {
        if self.pending_check != Some(task) {
            return None;
        }
        self.pending_check = None;

        if !self.flags.keep_detecting() {
            return None;
        }
        let last = self.last.as_ref().or(self.down.as_ref())?;
        if matches!(last.action, PointerAction::Up | PointerAction::Cancel) {
            return None;
        }

        self.checking = true;
        Some(last.with_action(PointerAction::Move))
    }

    fn after_timer(&mut self) {
        self.checking = false;
    }
}
