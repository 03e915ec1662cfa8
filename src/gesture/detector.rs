//! Arbitration between recognizers.

use super::{
    DetectorTask, Gesture, GestureContext, GestureEvent, GestureId, PointerAction, Sample,
};
use crate::config::GestureConfig;
use crate::scheduler::{SharedClock, TaskId, TaskQueue, Timestamp};
use tracing::{debug, trace};

/// Result of dispatching one sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    /// Whether any recognizer handled the sample. In intercept mode, whether
    /// one holds the stream.
    pub handled: bool,
    /// Events produced while dispatching, in order.
    pub events: Vec<GestureEvent>,
}

struct Slot<H> {
    id: GestureId,
    gesture: Box<dyn Gesture<H>>,
}

#[derive(Debug, Clone)]
struct DelayedUp {
    task: TaskId,
    sample: Sample,
    intercept: bool,
}

/// Ordered list of recognizers with exclusive holding.
///
/// Recognizers are consulted front to back. The first one that sets
/// hold-detecting becomes the holder: every other recognizer is reset and the
/// holder alone receives samples until it lets go.
///
/// `H` is the state recognizers drive while detecting; use `()` when they only
/// emit events.
pub struct GestureDetector<H = ()> {
    gestures: Vec<Slot<H>>,
    holder: Option<GestureId>,
    enabled: bool,
    delay_touch_up: bool,
    delayed_up: Option<DelayedUp>,
    config: GestureConfig,
    timers: TaskQueue<DetectorTask>,
    next_id: u32,
}

impl<H> std::fmt::Debug for GestureDetector<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureDetector")
            .field("gestures", &self.gestures.iter().map(|s| s.id).collect::<Vec<_>>())
            .field("holder", &self.holder)
            .field("enabled", &self.enabled)
            .field("delayed_up", &self.delayed_up.is_some())
            .finish()
    }
}

impl<H> GestureDetector<H> {
    /// Creates an empty detector.
    pub fn new(config: GestureConfig, clock: SharedClock) -> Self {
        Self {
            gestures: Vec::new(),
            holder: None,
            enabled: true,
            delay_touch_up: false,
            delayed_up: None,
            config,
            timers: TaskQueue::new(clock),
            next_id: 0,
        }
    }

    /// Gesture thresholds.
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Adds a recognizer ahead of all existing ones.
    pub fn push_gesture(&mut self, gesture: Box<dyn Gesture<H>>) -> GestureId {
        let id = GestureId(self.next_id);
        self.next_id += 1;
        self.gestures.insert(0, Slot { id, gesture });
        id
    }

    /// Recognizer ids in priority order.
    pub fn gesture_ids(&self) -> Vec<GestureId> {
        self.gestures.iter().map(|slot| slot.id).collect()
    }

    /// Looks up a recognizer.
    pub fn gesture(&self, id: GestureId) -> Option<&dyn Gesture<H>> {
        self.gestures
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.gesture.as_ref())
    }

    /// Looks up a recognizer mutably.
    pub fn gesture_mut(&mut self, id: GestureId) -> Option<&mut (dyn Gesture<H> + 'static)> {
        self.gestures
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(|slot| slot.gesture.as_mut())
    }

    /// Enables or disables one recognizer. Returns false for an unknown id.
    pub fn set_gesture_enabled(&mut self, id: GestureId, enabled: bool) -> bool {
        match self.gesture_mut(id) {
            Some(gesture) => {
                gesture.flags_mut().set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Enables every recognizer not listed and disables the listed ones.
    ///
    /// Returns the recognizers that were enabled before the call.
    pub fn enable_all_except(&mut self, except: &[GestureId]) -> Vec<GestureId> {
        let mut previously_enabled = Vec::new();
        for slot in &mut self.gestures {
            let flags = slot.gesture.flags_mut();
            if flags.is_enabled() {
                previously_enabled.push(slot.id);
            }
            flags.set_enabled(!except.contains(&slot.id));
        }
        previously_enabled
    }

    /// Disables every recognizer not listed and enables the listed ones.
    ///
    /// Returns the recognizers that were disabled before the call.
    pub fn disable_all_except(&mut self, except: &[GestureId]) -> Vec<GestureId> {
        let mut previously_disabled = Vec::new();
        for slot in &mut self.gestures {
            let flags = slot.gesture.flags_mut();
            if !flags.is_enabled() {
                previously_disabled.push(slot.id);
            }
            flags.set_enabled(except.contains(&slot.id));
        }
        previously_disabled
    }

    /// Whether the detector dispatches at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A disabled detector resets on every sample and handles nothing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Recognizer currently holding the stream.
    pub fn holder(&self) -> Option<GestureId> {
        self.holder
    }

    /// Earliest pending timer, for hosts that sleep between frames.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.timers.next_due()
    }

    /// Drops the holder and any buffered up, and fully resets every recognizer.
    pub fn reset(&mut self) {
        for slot in &mut self.gestures {
            slot.gesture.restart(true);
        }
        self.delay_touch_up = false;
        if let Some(pending) = self.delayed_up.take() {
            self.timers.cancel(pending.task);
        }
        if self.holder.take().is_some() {
            debug!("gesture holder cleared by reset");
        }
    }

    /// Dispatches a sample, letting recognizers drive `host`.
    pub fn on_touch_with(&mut self, host: &mut H, sample: &Sample) -> Dispatch {
        let mut events = Vec::new();
        let handled = self.dispatch(host, sample, false, false, &mut events);
        Dispatch { handled, events }
    }

    /// Dispatches a sample in intercept mode.
    ///
    /// `handled` reports whether a recognizer holds the stream, i.e. whether
    /// the caller should take the stream away from its children.
    pub fn on_intercept_with(&mut self, host: &mut H, sample: &Sample) -> Dispatch {
        let mut events = Vec::new();
        let handled = self.dispatch(host, sample, false, true, &mut events);
        Dispatch { handled, events }
    }

    /// Runs recognizer timers and buffered ups that are due.
    pub fn run_due_with(&mut self, host: &mut H) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        for (task, kind) in self.timers.drain_due() {
            match kind {
                DetectorTask::DelayedUp => {
                    let current = self
                        .delayed_up
                        .as_ref()
                        .is_some_and(|pending| pending.task == task);
                    if !current {
                        continue;
                    }
                    if let Some(pending) = self.delayed_up.take() {
                        self.delay_touch_up = false;
                        trace!("redelivering delayed touch up");
                        self.dispatch(host, &pending.sample, true, pending.intercept, &mut events);
                    }
                }
                DetectorTask::Gesture(id) => {
                    let Some(index) = self.index_of(id) else {
                        continue;
                    };
                    let synthetic = self.gestures[index].gesture.on_timer(task);
                    if let Some(sample) = synthetic {
                        self.dispatch(host, &sample, false, false, &mut events);
                        if let Some(index) = self.index_of(id) {
                            self.gestures[index].gesture.after_timer();
                        }
                    }
                }
            }
        }
        events
    }

    fn index_of(&self, id: GestureId) -> Option<usize> {
        self.gestures.iter().position(|slot| slot.id == id)
    }

    fn restart_all(&mut self) {
        for slot in &mut self.gestures {
            let reset = !slot.gesture.flags().keep_detecting();
            slot.gesture.restart(reset);
        }
    }

    fn dispatch(
        &mut self,
        host: &mut H,
        sample: &Sample,
        delayed: bool,
        intercept: bool,
        events: &mut Vec<GestureEvent>,
    ) -> bool {
        if !self.enabled {
            self.reset();
            return false;
        }

        let at = sample.position();
        match sample.action {
            PointerAction::Down => {
                if let Some(pending) = self.delayed_up.take() {
                    self.timers.cancel(pending.task);
                    self.delay_touch_up = false;
                    self.dispatch(host, &pending.sample, true, pending.intercept, events);
                }
                self.restart_all();
                events.push(GestureEvent::TouchDown { at });
            }
            PointerAction::Cancel => {
                events.push(GestureEvent::TouchCancel { at });
                self.reset();
                return false;
            }
            PointerAction::Up => {
                if self.delay_touch_up && self.delayed_up.is_none() {
                    let task = self
                        .timers
                        .post_delayed(DetectorTask::DelayedUp, self.config.double_tap_timeout_ms);
                    self.delayed_up = Some(DelayedUp {
                        task,
                        sample: sample.clone(),
                        intercept,
                    });
                    trace!("touch up delayed");
                    return false;
                }
            }
            PointerAction::Move => {}
        }

        self.delay_touch_up = false;
        let handled = self.detect_gesture(host, sample, delayed, intercept, events);

        if sample.action == PointerAction::Up {
            events.push(GestureEvent::TouchUp { at });
            self.restart_all();
        }
        handled
    }

    fn detect_gesture(
        &mut self,
        host: &mut H,
        sample: &Sample,
        delayed: bool,
        intercept: bool,
        events: &mut Vec<GestureEvent>,
    ) -> bool {
        if let Some(holder) = self.holder {
            match self.index_of(holder) {
                Some(index) => {
                    let flags = *self.gestures[index].gesture.flags();
                    if flags.is_enabled() && flags.hold_detecting() {
                        self.detect_one(index, host, sample, delayed, intercept, events);
                        let flags = *self.gestures[index].gesture.flags();
                        self.delay_touch_up = flags.delay_touch_up();
                        if !flags.hold_detecting() {
                            debug!(gesture = ?holder, "gesture holder released");
                            self.holder = None;
                            self.restart_all();
                        }
                        // The holder is both holding and detecting here.
                        return true;
                    }
                    debug!(gesture = ?holder, "gesture holder dropped");
                    self.holder = None;
                }
                None => self.holder = None,
            }
        }

        let mut any_holding = false;
        let mut any_detected = false;
        for index in 0..self.gestures.len() {
            if !self.gestures[index].gesture.flags().is_enabled() {
                continue;
            }
            if self.gestures[index].gesture.flags().keep_detecting() {
                self.detect_one(index, host, sample, delayed, intercept, events);
                self.delay_touch_up |= self.gestures[index].gesture.flags().delay_touch_up();
                any_detected = true;
            }
            let flags = *self.gestures[index].gesture.flags();
            if flags.hold_detecting() {
                let id = self.gestures[index].id;
                debug!(gesture = ?id, "gesture holder acquired");
                self.holder = Some(id);
                for (other, slot) in self.gestures.iter_mut().enumerate() {
                    if other != index {
                        slot.gesture.restart(true);
                    }
                }
                any_holding = true;
                break;
            }
            if flags.skip_next_detecting() {
                break;
            }
        }

        if intercept {
            any_holding
        } else {
            any_detected
        }
    }

    fn detect_one(
        &mut self,
        index: usize,
        host: &mut H,
        sample: &Sample,
        delayed: bool,
        intercept: bool,
        events: &mut Vec<GestureEvent>,
    ) {
        let slot = &mut self.gestures[index];
        let mut cx = GestureContext::new(
            host,
            &self.config,
            slot.id,
            delayed,
            intercept,
            events,
            &mut self.timers,
        );
        slot.gesture.detect(sample, &mut cx);
    }
}

impl GestureDetector<()> {
    /// Dispatches a sample to host-less recognizers.
    pub fn on_touch(&mut self, sample: &Sample) -> Dispatch {
        self.on_touch_with(&mut (), sample)
    }

    /// Dispatches a sample to host-less recognizers in intercept mode.
    pub fn on_intercept(&mut self, sample: &Sample) -> Dispatch {
        self.on_intercept_with(&mut (), sample)
    }

    /// Runs due timers of host-less recognizers.
    pub fn run_due(&mut self) -> Vec<GestureEvent> {
        self.run_due_with(&mut ())
    }
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
