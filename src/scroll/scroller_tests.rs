//! Pointer-driven scroller scenarios.

use super::*;
use crate::geometry::Size;
use crate::scheduler::{ManualClock, Timestamp};

struct Rig {
    clock: ManualClock,
    scroller: Scroller,
}

impl Rig {
    fn with_config(config: EngineConfig, content: Size) -> Self {
        let clock = ManualClock::new();
        let mut scroller = Scroller::new(&config, clock.shared());
        scroller.core_mut().set_view_size(Size::new(400, 800));
        scroller
            .core_mut()
            .set_content_size(content.width, content.height);
        Self { clock, scroller }
    }

    fn new() -> Self {
        Self::with_config(EngineConfig::default(), Size::new(800, 2000))
    }

    /// Advances to `ms` and feeds a single-contact sample.
    fn touch(&mut self, action: PointerAction, x: f32, y: f32, ms: u64) -> Vec<GestureEvent> {
        self.clock.set(Timestamp::from_millis(ms));
        let sample = Sample::single(action, x, y, Timestamp::from_millis(ms));
        self.scroller.on_touch(&sample)
    }

    fn intercept(&mut self, action: PointerAction, x: f32, y: f32, ms: u64) -> bool {
        self.clock.set(Timestamp::from_millis(ms));
        let sample = Sample::single(action, x, y, Timestamp::from_millis(ms));
        self.scroller.on_intercept(&sample)
    }

    /// Runs frames every 16 ms until nothing is scheduled.
    fn settle(&mut self) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        for _ in 0..2000 {
            self.clock.advance(16);
            events.extend(self.scroller.run_due());
            if !self.scroller.has_pending_work() {
                return events;
            }
        }
        panic!("scroller never settled");
    }

    fn state(&self) -> ScrollState {
        self.scroller.core().state()
    }

    fn top(&self) -> i32 {
        self.scroller.core().viewport().top
    }

    /// Down at `(x, y0)` then one move 50 px upward, past the touch slop.
    fn start_vertical_drag(&mut self, x: f32, y0: f32) {
        self.touch(PointerAction::Down, x, y0, 0);
        self.touch(PointerAction::Move, x, y0 - 50.0, 48);
    }
}

fn has_tap(events: &[GestureEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, GestureEvent::Tap { .. }))
}

#[test]
fn tap_while_idle() {
    let mut rig = Rig::new();
    let mut events = rig.touch(PointerAction::Down, 10.0, 10.0, 0);
    events.extend(rig.touch(PointerAction::Move, 12.0, 11.0, 50));
    events.extend(rig.touch(PointerAction::Up, 12.0, 11.0, 90));
    assert!(has_tap(&events), "{events:?}");
    assert_eq!(rig.state(), ScrollState::Idle);
    assert_eq!(rig.top(), 0);
}

#[test]
fn one_move_past_the_slop_starts_a_drag() {
    let mut config = EngineConfig::default();
    config.scroll.overscroll_width = 100;
    let mut rig = Rig::with_config(config, Size::new(800, 2000));
    rig.touch(PointerAction::Down, 10.0, 10.0, 0);
    rig.touch(PointerAction::Move, 100.0, 10.0, 16);
    assert_eq!(rig.state(), ScrollState::Drag);
    assert!(rig.scroller.core().is_horz_dragging());
    assert!(!rig.scroller.core().is_vert_dragging());

    // The slop travel itself does not scroll; the next step does.
    assert_eq!(rig.scroller.core().viewport().left, 0);
    rig.touch(PointerAction::Move, 80.0, 10.0, 32);
    assert_eq!(rig.scroller.core().viewport().left, 20);
}

#[test]
fn vertical_drag_then_fling() {
    let mut rig = Rig::new();
    rig.start_vertical_drag(200.0, 600.0);
    assert_eq!(rig.state(), ScrollState::Drag);
    assert!(rig.scroller.core().is_vert_dragging());
    assert!(!rig.scroller.core().is_horz_dragging());

    let events = rig.touch(PointerAction::Move, 200.0, 450.0, 64);
    assert!(events.is_empty(), "click detector is reset while dragging");
    assert_eq!(rig.top(), 100);

    rig.touch(PointerAction::Up, 200.0, 450.0, 80);
    assert_eq!(rig.state(), ScrollState::Fling);
    let events = rig.settle();
    assert!(!has_tap(&events));
    assert!(rig.top() > 100);
    assert!(rig.top() <= 1200);
    assert_eq!(rig.state(), ScrollState::Idle);
}

#[test]
fn release_without_fling_springs_back() {
    let mut config = EngineConfig::default();
    config.scroll.overscroll_height = 100;
    let mut rig = Rig::with_config(config, Size::new(800, 2000));

    // Pull down from the top: content follows the pointer into the slack.
    rig.touch(PointerAction::Down, 200.0, 100.0, 0);
    rig.touch(PointerAction::Move, 200.0, 110.0, 16);
    assert_eq!(rig.state(), ScrollState::Drag);
    assert_eq!(rig.top(), 0);
    rig.touch(PointerAction::Move, 200.0, 150.0, 32);
    assert_eq!(rig.top(), -40);

    // Hold still long enough for the velocity window to see no motion.
    rig.touch(PointerAction::Move, 200.0, 150.0, 500);
    rig.touch(PointerAction::Up, 200.0, 150.0, 900);
    assert_eq!(rig.state(), ScrollState::Fling);
    rig.settle();
    assert_eq!(rig.top(), 0);
    assert_eq!(rig.state(), ScrollState::Idle);
}

#[test]
fn cancel_during_drag_springs_back() {
    let mut config = EngineConfig::default();
    config.scroll.overscroll_height = 100;
    let mut rig = Rig::with_config(config, Size::new(800, 2000));

    rig.touch(PointerAction::Down, 200.0, 100.0, 0);
    rig.touch(PointerAction::Move, 200.0, 110.0, 16);
    rig.touch(PointerAction::Move, 200.0, 130.0, 32);
    rig.touch(PointerAction::Move, 200.0, 150.0, 48);
    rig.touch(PointerAction::Move, 200.0, 190.0, 64);
    rig.touch(PointerAction::Cancel, 200.0, 190.0, 80);
    rig.settle();
    assert_eq!(rig.top(), 0);
    assert_eq!(rig.state(), ScrollState::Idle);
}

#[test]
fn press_grabs_a_fling() {
    let mut rig = Rig::new();
    rig.scroller.core_mut().fling_by(0.0, -3000.0);
    for _ in 0..5 {
        rig.clock.advance(16);
        rig.scroller.run_due();
    }
    let moving_at = rig.top();
    assert!(moving_at > 0);

    let now = rig.scroller.core().now().millis();
    let events = rig.touch(PointerAction::Down, 200.0, 400.0, now);
    assert!(events.is_empty(), "no click while the viewport moves");
    assert_eq!(rig.state(), ScrollState::Drag);
    assert_eq!(rig.scroller.core().running_animation(), None);

    rig.touch(PointerAction::Up, 200.0, 400.0, now + 40);
    rig.settle();
    assert_eq!(rig.state(), ScrollState::Idle);
    assert_eq!(rig.top(), moving_at);
}

#[test]
fn press_during_smooth_scroll_is_ignored() {
    let mut rig = Rig::new();
    rig.scroller
        .core_mut()
        .scroll_smoothly_to(0, 800, 250)
        .expect("duration is positive");
    rig.start_vertical_drag(200.0, 600.0);
    assert_eq!(rig.state(), ScrollState::Smooth);
    rig.settle();
    assert_eq!(rig.top(), 800);
}

#[test]
fn sideways_swipe_on_vertical_content_does_not_drag() {
    let mut rig = Rig::with_config(EngineConfig::default(), Size::new(400, 2000));
    rig.touch(PointerAction::Down, 100.0, 300.0, 0);
    rig.touch(PointerAction::Move, 110.0, 300.0, 16);
    rig.touch(PointerAction::Move, 130.0, 300.0, 32);
    rig.touch(PointerAction::Move, 150.0, 300.0, 48);
    assert_eq!(rig.state(), ScrollState::Idle);
    assert_eq!(rig.top(), 0);
}

#[test]
fn seek_thumb_drag() {
    let mut config = EngineConfig::default();
    config.thumb.enabled = true;
    config.thumb.seek_enabled = true;
    config.thumb.seek_length = Some(40);
    let mut rig = Rig::with_config(config, Size::new(400, 80_000));
    assert_eq!(
        rig.scroller.core().vertical_thumb_kind(),
        ThumbKind::Seek
    );

    rig.touch(PointerAction::Down, 395.0, 10.0, 0);
    assert_eq!(rig.state(), ScrollState::Seek);
    assert!(rig.scroller.core().is_seeking());
    rig.touch(PointerAction::Move, 395.0, 10.0, 16);
    rig.touch(PointerAction::Move, 395.0, 10.0, 32);
    rig.touch(PointerAction::Move, 395.0, 85.0, 48);
    // 75 px of a 752 px seek track.
    let top = rig.top();
    assert!((7800..=8000).contains(&top), "top {top}");

    rig.touch(PointerAction::Up, 395.0, 85.0, 64);
    assert_eq!(rig.state(), ScrollState::Idle);
    assert!(!rig.scroller.core().is_seeking());
}

#[test]
fn long_press_while_idle() {
    let mut rig = Rig::new();
    rig.touch(PointerAction::Down, 50.0, 50.0, 0);
    rig.clock.advance(500);
    let events = rig.scroller.run_due();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, GestureEvent::LongPress { .. })),
        "{events:?}"
    );
}

#[test]
fn intercept_claims_once_dragging() {
    let mut rig = Rig::new();
    assert!(!rig.intercept(PointerAction::Down, 200.0, 600.0, 0));
    assert!(!rig.intercept(PointerAction::Move, 200.0, 596.0, 16));
    assert!(rig.intercept(PointerAction::Move, 200.0, 590.0, 32));
    assert_eq!(rig.state(), ScrollState::Drag);
}

#[test]
fn disabled_scroller_ignores_input() {
    let mut rig = Rig::new();
    rig.scroller.set_enabled(false);
    rig.start_vertical_drag(200.0, 600.0);
    assert_eq!(rig.state(), ScrollState::Idle);
    assert!(!rig.intercept(PointerAction::Move, 200.0, 100.0, 64));
}
