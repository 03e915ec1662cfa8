//! Item press feedback and click dispatch.

use super::ItemsView;
use crate::gesture::{GestureEvent, Sample};
use crate::geometry::Point;
use crate::items::adapter::ItemsAdapter;
use crate::scroll::ScrollState;
use tracing::trace;

/// Item-level input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemEvent {
    /// An item was tapped.
    ItemClick {
        /// Item index.
        index: usize,
    },
    /// An item was held.
    ItemLongPress {
        /// Item index.
        index: usize,
    },
    /// A tap outside every item.
    Tap {
        /// Release position in view coordinates.
        at: Point,
    },
    /// A long press outside every item.
    LongPress {
        /// Press position in view coordinates.
        at: Point,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PressTask {
    Press,
    Unpress,
}

impl<A: ItemsAdapter> ItemsView<A> {
    /// Feeds a pointer sample. Returns the item events it produced.
    pub fn on_touch(&mut self, sample: &Sample) -> Vec<ItemEvent> {
        self.sync_adapter();
        let gestures = self.scroller.on_touch(sample);
        self.sync_scroll();
        self.handle_gestures(gestures);
        self.visualize();
        std::mem::take(&mut self.events)
    }

    /// Feeds a sample in intercept mode. Returns true when scrolling claims
    /// the stream.
    pub fn on_intercept(&mut self, sample: &Sample) -> bool {
        let claimed = self.scroller.on_intercept(sample);
        self.visualize();
        claimed
    }

    /// See [`crate::scroll::Scroller::request_disallow_intercept`].
    pub fn request_disallow_intercept(&mut self, disallow: bool) {
        self.scroller.request_disallow_intercept(disallow);
    }

    /// Runs one frame: announced data changes, due animation steps, gesture
    /// timers and press feedback timers.
    pub fn run_due(&mut self) -> Vec<ItemEvent> {
        self.sync_adapter();
        let gestures = self.scroller.run_due();
        self.sync_scroll();
        self.handle_gestures(gestures);

        for (id, task) in self.tasks.drain_due() {
            match task {
                PressTask::Press => {
                    if let Some((pending, index)) = self.pending_press {
                        if pending == id {
                            self.pending_press = None;
                            self.press(index);
                        }
                    }
                }
                PressTask::Unpress => {
                    if let Some((pending, index)) = self.pending_unpress {
                        if pending == id {
                            self.pending_unpress = None;
                            self.pressed = None;
                            if index < self.cells.len() {
                                self.events.push(ItemEvent::ItemClick { index });
                            }
                        }
                    }
                }
            }
        }

        self.visualize();
        std::mem::take(&mut self.events)
    }

    /// True while an animation, gesture timer or press timer is scheduled.
    pub fn has_pending_work(&self) -> bool {
        self.scroller.has_pending_work() || !self.tasks.is_empty()
    }

    fn handle_gestures(&mut self, gestures: Vec<GestureEvent>) {
        for gesture in gestures {
            match gesture {
                GestureEvent::TouchDown { at } => self.touch_down(at),
                GestureEvent::TouchUp { .. } => {
                    if self.touching.take().is_some() {
                        self.cancel_pressing();
                    }
                }
                GestureEvent::TouchCancel { .. } => {
                    self.cancel_pressing();
                    self.touching = None;
                }
                GestureEvent::Tap { at, .. } => match self.touching.take() {
                    Some(index) => self.pend_unpress(index),
                    None => self.events.push(ItemEvent::Tap { at }),
                },
                GestureEvent::LongPress { at, .. } => match self.touching {
                    Some(index) => {
                        self.cancel_pressing();
                        self.events.push(ItemEvent::ItemLongPress { index });
                    }
                    None => self.events.push(ItemEvent::LongPress { at }),
                },
                GestureEvent::Translate { .. } | GestureEvent::Fling { .. } => {}
            }
        }
    }

    fn touch_down(&mut self, at: Point) {
        self.touching = None;
        if self.scroller.core().state() != ScrollState::Idle
            || self.pending_unpress.is_some()
            || self.pressed.is_some()
        {
            return;
        }
        self.visualize();
        let point = self.scroller.core().view_to_content(at);
        let hit = self
            .grid
            .hit_test_cell(&self.cells, point.x as i32, point.y as i32);
        if let Some(index) = hit {
            trace!(index, "item touched");
            self.touching = Some(index);
            let id = self.tasks.post_delayed(PressTask::Press, self.tap_timeout_ms);
            self.pending_press = Some((id, index));
        }
    }

    fn press(&mut self, index: usize) {
        if index < self.cells.len() {
            self.pressed = Some(index);
            self.invalidate(super::Stage::Visualize);
        }
    }

    /// The tap was confirmed: show the press if it was still pending, then
    /// clear it and click once the pressed state has been visible.
    fn pend_unpress(&mut self, index: usize) {
        if let Some((id, pending)) = self.pending_press.take() {
            self.tasks.cancel(id);
            self.press(pending);
        }
        if self.pressed.is_some() {
            let id = self
                .tasks
                .post_delayed(PressTask::Unpress, self.pressed_state_ms);
            self.pending_unpress = Some((id, index));
        }
    }

    pub(super) fn cancel_pressing(&mut self) {
        if let Some((id, _)) = self.pending_press.take() {
            self.tasks.cancel(id);
        }
        if let Some((id, _)) = self.pending_unpress.take() {
            self.tasks.cancel(id);
        }
        if self.pressed.take().is_some() {
            self.invalidate(super::Stage::Visualize);
        }
    }
}
