//! Tests for recognizer arbitration.

use super::*;
use crate::gesture::{
    FlingGesture, GestureFlags, LongPressGesture, TapGesture, TranslateGesture,
};
use crate::geometry::Point;
use crate::scheduler::ManualClock;
use std::cell::Cell;
use std::rc::Rc;

fn t(ms: u64) -> Timestamp {
    Timestamp::from_millis(ms)
}

/// Recognizer that records what it sees and raises flags on request.
#[derive(Default)]
struct Probe {
    flags: GestureFlags,
    seen: Rc<Cell<usize>>,
    hold_on: Option<PointerAction>,
    release_on: Option<PointerAction>,
    delay_up: bool,
    skip_next: bool,
}

impl Probe {
    fn counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.seen)
    }
}

impl Gesture for Probe {
    fn flags(&self) -> &GestureFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut GestureFlags {
        &mut self.flags
    }

    fn do_restart(&mut self, _reset: bool) {}

    fn do_detect(&mut self, sample: &Sample, _cx: &mut GestureContext<'_, ()>) {
        self.seen.set(self.seen.get() + 1);
        if self.hold_on == Some(sample.action) {
            self.flags.set_hold_detecting(true);
        }
        if self.release_on == Some(sample.action) {
            self.flags.set_hold_detecting(false);
        }
        if self.delay_up {
            self.flags.set_delay_touch_up(true);
        }
        if self.skip_next {
            self.flags.set_skip_next_detecting(true);
        }
    }

    fn do_intercept(&mut self, sample: &Sample, cx: &mut GestureContext<'_, ()>) {
        self.do_detect(sample, cx);
    }
}

fn new_detector() -> (ManualClock, GestureDetector) {
    let clock = ManualClock::new();
    let detector = GestureDetector::new(GestureConfig::default(), clock.shared());
    (clock, detector)
}

struct Standard {
    clock: ManualClock,
    detector: GestureDetector,
    tap: GestureId,
    long_press: GestureId,
    translate: GestureId,
    fling: GestureId,
}

/// Tap and long press first, then translate (holding once recognized), then fling.
fn standard() -> Standard {
    let (clock, mut detector) = new_detector();
    let fling = detector.push_gesture(Box::new(FlingGesture::new()));
    let mut translate_gesture = TranslateGesture::new();
    translate_gesture.set_translate_slop(detector.config().touch_slop);
    translate_gesture.set_hold_on_detect(true);
    let translate = detector.push_gesture(Box::new(translate_gesture));
    let long_press = detector.push_gesture(Box::new(LongPressGesture::new()));
    let tap = detector.push_gesture(Box::new(TapGesture::new()));
    Standard {
        clock,
        detector,
        tap,
        long_press,
        translate,
        fling,
    }
}

fn has(events: &[GestureEvent], pred: impl Fn(&GestureEvent) -> bool) -> bool {
    events.iter().any(pred)
}

mod scenarios {
    use super::*;

    #[test]
    fn short_press_is_a_tap() {
        let mut s = standard();
        let mut events = Vec::new();
        events.extend(s.detector.on_touch(&Sample::down(10.0, 10.0, t(0))).events);
        s.clock.advance(50);
        events.extend(s.detector.on_touch(&Sample::moved(12.0, 11.0, t(50))).events);
        s.clock.advance(70);
        events.extend(s.detector.on_touch(&Sample::up(12.0, 11.0, t(120))).events);

        assert!(has(&events, |e| matches!(e, GestureEvent::Tap { gesture, .. } if *gesture == s.tap)));
        assert!(!has(&events, |e| matches!(e, GestureEvent::Translate { .. })));
        assert!(!has(&events, |e| matches!(e, GestureEvent::Fling { .. })));
        assert_eq!(
            events.first(),
            Some(&GestureEvent::TouchDown {
                at: Point::new(10.0, 10.0)
            })
        );
        assert_eq!(
            events.last(),
            Some(&GestureEvent::TouchUp {
                at: Point::new(12.0, 11.0)
            })
        );
    }

    #[test]
    fn drag_is_held_by_translate() {
        let mut s = standard();
        s.detector.on_touch(&Sample::down(10.0, 10.0, t(0)));
        let out = s.detector.on_touch(&Sample::moved(100.0, 10.0, t(16)));

        assert!(out.handled);
        assert_eq!(s.detector.holder(), Some(s.translate));
        for id in [s.tap, s.long_press, s.fling] {
            let flags = s.detector.gesture(id).map(|g| *g.flags());
            assert!(
                flags.is_some_and(|f| !f.hold_detecting()),
                "{id:?} must not hold"
            );
        }

        // The long-press timer of the restarted recognizer is stale.
        s.clock.advance(600);
        let late = s.detector.run_due();
        assert!(!has(&late, |e| matches!(e, GestureEvent::LongPress { .. })));

        let up = s.detector.on_touch(&Sample::up(100.0, 10.0, t(650)));
        assert!(!has(&up.events, |e| matches!(e, GestureEvent::Tap { .. })));
    }

    #[test]
    fn holding_still_is_a_long_press() {
        let mut s = standard();
        s.detector.on_touch(&Sample::down(40.0, 40.0, t(0)));
        s.clock.advance(200);
        s.detector.on_touch(&Sample::moved(41.0, 40.0, t(200)));
        s.clock.advance(299);
        assert!(s.detector.run_due().is_empty());
        s.clock.advance(1);
        let events = s.detector.run_due();
        assert!(has(&events, |e| matches!(
            e,
            GestureEvent::LongPress { gesture, at } if *gesture == s.long_press && *at == Point::new(41.0, 40.0)
        )));
    }

    #[test]
    fn long_press_declines_after_travel() {
        let mut s = standard();
        s.detector.on_touch(&Sample::down(40.0, 40.0, t(0)));
        s.detector.on_touch(&Sample::moved(40.0, 60.0, t(100)));
        s.clock.advance(500);
        let events = s.detector.run_due();
        assert!(!has(&events, |e| matches!(e, GestureEvent::LongPress { .. })));
    }

    #[test]
    fn swipe_is_not_a_tap() {
        let mut s = standard();
        let mut events = Vec::new();
        events.extend(s.detector.on_touch(&Sample::down(100.0, 300.0, t(0))).events);
        // Translate holds after the first real step; the fling recognizer is
        // reset then, so only the translate steps come through.
        events.extend(s.detector.on_touch(&Sample::moved(100.0, 250.0, t(20))).events);
        events.extend(s.detector.on_touch(&Sample::moved(100.0, 200.0, t(40))).events);
        events.extend(s.detector.on_touch(&Sample::up(100.0, 150.0, t(60))).events);
        assert!(!has(&events, |e| matches!(e, GestureEvent::Tap { .. })));
    }

    #[test]
    fn fling_alone_reports_release_velocity() {
        let (_clock, mut detector) = new_detector();
        let fling = detector.push_gesture(Box::new(FlingGesture::new()));
        detector.on_touch(&Sample::down(100.0, 300.0, t(0)));
        detector.on_touch(&Sample::moved(100.0, 250.0, t(50)));
        let out = detector.on_touch(&Sample::up(100.0, 200.0, t(100)));
        assert!(has(&out.events, |e| matches!(
            e,
            GestureEvent::Fling { gesture, velocity, .. } if *gesture == fling && *velocity == Point::new(0.0, -1000.0)
        )));
    }

    #[test]
    fn slow_release_does_not_fling() {
        let (_clock, mut detector) = new_detector();
        detector.push_gesture(Box::new(FlingGesture::new()));
        detector.on_touch(&Sample::down(100.0, 300.0, t(0)));
        let out = detector.on_touch(&Sample::up(103.0, 300.0, t(100)));
        assert!(!has(&out.events, |e| matches!(e, GestureEvent::Fling { .. })));
    }
}

mod arbitration {
    use super::*;

    #[test]
    fn holder_receives_samples_exclusively() {
        let (_clock, mut detector) = new_detector();
        let low = Probe::default();
        let low_seen = low.counter();
        detector.push_gesture(Box::new(low));
        let high = Probe {
            hold_on: Some(PointerAction::Down),
            ..Probe::default()
        };
        let high_seen = high.counter();
        let high_id = detector.push_gesture(Box::new(high));

        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        assert_eq!(detector.holder(), Some(high_id));
        for ms in 1..5 {
            detector.on_touch(&Sample::moved(ms as f32, 0.0, t(ms)));
        }
        assert_eq!(high_seen.get(), 5);
        assert_eq!(low_seen.get(), 0);
    }

    #[test]
    fn releasing_hold_restarts_everyone() {
        let (_clock, mut detector) = new_detector();
        let low = Probe::default();
        let low_seen = low.counter();
        detector.push_gesture(Box::new(low));
        detector.push_gesture(Box::new(Probe {
            hold_on: Some(PointerAction::Down),
            release_on: Some(PointerAction::Move),
            ..Probe::default()
        }));

        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        detector.on_touch(&Sample::moved(1.0, 0.0, t(1)));
        assert_eq!(detector.holder(), None);
        assert_eq!(low_seen.get(), 0);

        // Low-priority recognizer is back in play on the next sample.
        detector.on_touch(&Sample::moved(2.0, 0.0, t(2)));
        assert_eq!(low_seen.get(), 1);
    }

    #[test]
    fn skip_next_stops_lower_priorities() {
        let (_clock, mut detector) = new_detector();
        let low = Probe::default();
        let low_seen = low.counter();
        detector.push_gesture(Box::new(low));
        detector.push_gesture(Box::new(Probe {
            skip_next: true,
            ..Probe::default()
        }));

        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        assert_eq!(low_seen.get(), 0);
    }

    #[test]
    fn disabled_gesture_is_skipped() {
        let (_clock, mut detector) = new_detector();
        let probe = Probe::default();
        let seen = probe.counter();
        let id = detector.push_gesture(Box::new(probe));
        assert!(detector.set_gesture_enabled(id, false));
        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn disabled_detector_handles_nothing() {
        let (_clock, mut detector) = new_detector();
        let probe = Probe::default();
        let seen = probe.counter();
        detector.push_gesture(Box::new(probe));
        detector.set_enabled(false);
        let out = detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        assert!(!out.handled);
        assert!(out.events.is_empty());
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn cancel_drops_holder() {
        let (_clock, mut detector) = new_detector();
        detector.push_gesture(Box::new(Probe {
            hold_on: Some(PointerAction::Down),
            ..Probe::default()
        }));
        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        assert!(detector.holder().is_some());
        let out = detector.on_touch(&Sample::cancel(0.0, 0.0, t(5)));
        assert!(!out.handled);
        assert_eq!(
            out.events,
            vec![GestureEvent::TouchCancel {
                at: Point::new(0.0, 0.0)
            }]
        );
        assert_eq!(detector.holder(), None);
    }

    #[test]
    fn intercept_reports_holding_only() {
        let (_clock, mut detector) = new_detector();
        detector.push_gesture(Box::new(Probe {
            hold_on: Some(PointerAction::Move),
            ..Probe::default()
        }));
        let down = detector.on_intercept(&Sample::down(0.0, 0.0, t(0)));
        assert!(!down.handled);
        let moved = detector.on_intercept(&Sample::moved(5.0, 0.0, t(5)));
        assert!(moved.handled);
    }

    #[test]
    fn enable_and_disable_all_except_report_previous_state() {
        let (_clock, mut detector) = new_detector();
        let a = detector.push_gesture(Box::new(Probe::default()));
        let b = detector.push_gesture(Box::new(Probe::default()));
        let c = detector.push_gesture(Box::new(Probe::default()));

        let previously_enabled = detector.enable_all_except(&[b]);
        assert_eq!(previously_enabled, vec![c, b, a]);
        assert!(!detector.gesture(b).is_some_and(|g| g.flags().is_enabled()));

        let previously_disabled = detector.disable_all_except(&[a]);
        assert_eq!(previously_disabled, vec![b]);
        assert!(detector.gesture(a).is_some_and(|g| g.flags().is_enabled()));
        assert!(!detector.gesture(c).is_some_and(|g| g.flags().is_enabled()));
    }

    #[test]
    fn push_gesture_goes_first() {
        let (_clock, mut detector) = new_detector();
        let a = detector.push_gesture(Box::new(Probe::default()));
        let b = detector.push_gesture(Box::new(Probe::default()));
        assert_eq!(detector.gesture_ids(), vec![b, a]);
    }
}

mod delayed_up {
    use super::*;

    fn delaying() -> (ManualClock, GestureDetector) {
        let (clock, mut detector) = new_detector();
        detector.push_gesture(Box::new(Probe {
            delay_up: true,
            ..Probe::default()
        }));
        (clock, detector)
    }

    fn touch_ups(events: &[GestureEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GestureEvent::TouchUp { .. }))
            .count()
    }

    #[test]
    fn up_is_held_back_until_timeout() {
        let (clock, mut detector) = delaying();
        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        let up = detector.on_touch(&Sample::up(0.0, 0.0, t(50)));
        assert!(!up.handled);
        assert_eq!(touch_ups(&up.events), 0);

        clock.advance(299);
        assert_eq!(touch_ups(&detector.run_due()), 0);
        clock.advance(1);
        assert_eq!(touch_ups(&detector.run_due()), 1);
    }

    #[test]
    fn new_down_flushes_pending_up_first() {
        let (clock, mut detector) = delaying();
        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        detector.on_touch(&Sample::up(0.0, 0.0, t(50)));
        clock.advance(100);
        let out = detector.on_touch(&Sample::down(3.0, 3.0, t(150)));
        assert!(matches!(out.events.first(), Some(GestureEvent::TouchUp { .. })));
        assert!(matches!(out.events.last(), Some(GestureEvent::TouchDown { .. })));

        // The original timer no longer redelivers.
        clock.advance(1000);
        assert_eq!(touch_ups(&detector.run_due()), 0);
    }

    #[test]
    fn reset_discards_pending_up() {
        let (clock, mut detector) = delaying();
        detector.on_touch(&Sample::down(0.0, 0.0, t(0)));
        detector.on_touch(&Sample::up(0.0, 0.0, t(50)));
        detector.reset();
        clock.advance(1000);
        assert!(detector.run_due().is_empty());
    }
}
