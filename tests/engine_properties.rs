//! Property-based tests for the scroll core, the items view and gesture
//! arbitration.
//!
//! Properties under test:
//! - Immediate scrolls never leave the overscroll range
//! - Spring-back lands inside the scroll range and is idempotent
//! - Visible items always own distinct containers showing their own label
//! - Edits above the viewport keep the first visible item where it was
//! - A stream that travels past the touch slop never produces a tap

use proptest::prelude::*;
use scrollcell::config::EngineConfig;
use scrollcell::geometry::Size;
use scrollcell::gesture::{GestureEvent, Sample};
use scrollcell::host::{CellSize, LabelAdapter};
use scrollcell::items::ItemsView;
use scrollcell::scheduler::{ManualClock, Timestamp};
use scrollcell::scroll::{ScrollCore, ScrollState, Scroller};
use std::collections::HashSet;

// ===== Helpers =====

fn core_with(view: Size, content: Size, slack: i32) -> ScrollCore {
    let mut config = EngineConfig::default();
    config.scroll.overscroll_width = slack;
    config.scroll.overscroll_height = slack;
    let mut core = ScrollCore::new(&config, ManualClock::new().shared());
    core.set_view_size(view);
    core.set_content_size(content.width, content.height);
    core
}

/// Single-column list of numbered labels in a 20x10 cell view.
fn list(count: usize) -> ItemsView<LabelAdapter> {
    let cell = CellSize::default();
    let mut config = EngineConfig::default();
    config.grid.num_columns = 1;
    let mut view = ItemsView::with_adapter(
        &config,
        ManualClock::new().shared(),
        LabelAdapter::numbered(count, cell),
    );
    view.set_view_size(cell.view_size(20, 10));
    view
}

/// Label shown by the first visible item and its offset from the viewport top.
fn first_visible(view: &mut ItemsView<LabelAdapter>) -> Option<(String, i32)> {
    let index = view.first_visible_index()?;
    let top = view.item_bounds(index).ok()?.top;
    let label = view.item_view(index).ok()??.label().to_string();
    Some((label, top - view.core().viewport().top))
}

// ===== Arbitrary Strategies =====

fn arb_size() -> impl Strategy<Value = Size> {
    (0..4000i32, 0..4000i32).prop_map(|(w, h)| Size::new(w, h))
}

fn arb_view_size() -> impl Strategy<Value = Size> {
    (1..1000i32, 1..1000i32).prop_map(|(w, h)| Size::new(w, h))
}

/// Pointer offsets from the down position, one per 16 ms frame.
fn arb_path() -> impl Strategy<Value = Vec<(f32, f32)>> {
    prop::collection::vec((-40.0f32..40.0, -40.0f32..40.0), 1..20)
}

// ===== Scroll core =====

proptest! {
    #[test]
    fn prop_scroll_to_stays_in_overscroll_range(
        view in arb_view_size(),
        content in arb_size(),
        slack in 0..200i32,
        x in -10_000..10_000i32,
        y in -10_000..10_000i32,
    ) {
        let mut core = core_with(view, content, slack);
        core.scroll_to(x, y);
        let viewport = core.viewport();

        prop_assert!(viewport.left >= core.min_overscroll_x());
        prop_assert!(viewport.left <= core.max_overscroll_x().max(core.min_overscroll_x()));
        prop_assert!(viewport.top >= core.min_overscroll_y());
        prop_assert!(viewport.top <= core.max_overscroll_y().max(core.min_overscroll_y()));
        prop_assert_eq!(viewport.width(), view.width);
        prop_assert_eq!(viewport.height(), view.height);
    }

    #[test]
    fn prop_spring_back_is_idempotent(
        view in arb_view_size(),
        content in arb_size(),
        slack in 0..200i32,
        x in -10_000..10_000i32,
        y in -10_000..10_000i32,
    ) {
        let mut core = core_with(view, content, slack);
        core.scroll_to(x, y);
        core.spring_back();
        let settled = core.viewport();

        prop_assert!(settled.left >= core.min_scroll_x());
        prop_assert!(settled.left <= core.max_scroll_x().max(core.min_scroll_x()));
        prop_assert!(settled.top >= core.min_scroll_y());
        prop_assert!(settled.top <= core.max_scroll_y().max(core.min_scroll_y()));

        core.spring_back();
        prop_assert_eq!(core.viewport(), settled);
        prop_assert_eq!(core.state(), ScrollState::Idle);
    }
}

// ===== Items view =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_visible_items_own_distinct_containers(
        count in 0..400usize,
        steps in prop::collection::vec(-400..400i32, 1..30),
    ) {
        let mut view = list(count);
        for dy in steps {
            view.scroll_by(0, dy);

            let visible = view.visible_indices();
            prop_assert!(visible.windows(2).all(|pair| pair[1] == pair[0] + 1));
            prop_assert!(visible.iter().all(|&index| index < count));

            let mut containers = HashSet::new();
            for &index in &visible {
                let container = view.container_of(index).unwrap();
                prop_assert!(container.is_some(), "visible item {} has no container", index);
                prop_assert!(containers.insert(container), "container shared at {}", index);

                let label = view.item_view(index).unwrap().map(|item| item.label().to_string());
                prop_assert_eq!(label, Some(format!("Item {index}")));
            }
        }
    }

    #[test]
    fn prop_insert_above_keeps_first_visible_item(
        count in 40..300usize,
        scroll in 0..4000i32,
        insert in 1..20usize,
        at_fraction in 0.0f64..=1.0,
    ) {
        let mut view = list(count);
        view.scroll_to(0, scroll);
        let Some(first) = view.first_visible_index() else {
            return Ok(());
        };
        let before = first_visible(&mut view);
        let top = view.core().viewport().top;

        let at = (first as f64 * at_fraction).floor() as usize;
        if let Some(labels) = view.adapter_mut() {
            for _ in 0..insert {
                labels.insert(at, "new");
            }
        }
        view.sync_adapter();

        prop_assert_eq!(first_visible(&mut view), before);
        prop_assert_eq!(view.core().viewport().top, top + insert as i32 * 16);
    }

    #[test]
    fn prop_remove_above_keeps_first_visible_item(
        count in 40..300usize,
        scroll in 0..4000i32,
        remove in 1..20usize,
    ) {
        let mut view = list(count);
        view.scroll_to(0, scroll);
        let Some(first) = view.first_visible_index() else {
            return Ok(());
        };
        let remove = remove.min(first);
        let before = first_visible(&mut view);
        let top = view.core().viewport().top;

        if let Some(labels) = view.adapter_mut() {
            for _ in 0..remove {
                labels.remove(0);
            }
        }
        view.sync_adapter();

        prop_assert_eq!(first_visible(&mut view), before);
        prop_assert_eq!(view.core().viewport().top, top - remove as i32 * 16);
    }
}

// ===== Gesture arbitration =====

proptest! {
    #[test]
    fn prop_travel_past_slop_never_taps(path in arb_path()) {
        let clock = ManualClock::new();
        let config = EngineConfig::default();
        let slop = config.gesture.touch_slop;
        let mut scroller = Scroller::new(&config, clock.shared());
        scroller.core_mut().set_view_size(Size::new(400, 800));
        scroller.core_mut().set_content_size(800, 4000);

        let (x0, y0) = (200.0f32, 400.0f32);
        let mut events = scroller.on_touch(&Sample::down(x0, y0, Timestamp::default()));
        let mut farthest = 0.0f32;
        let mut ms = 0;
        for &(dx, dy) in &path {
            ms += 16;
            clock.set(Timestamp::from_millis(ms));
            farthest = farthest.max(dx.hypot(dy));
            events.extend(scroller.on_touch(&Sample::moved(x0 + dx, y0 + dy, Timestamp::from_millis(ms))));
        }
        let (dx, dy) = path[path.len() - 1];
        ms += 16;
        clock.set(Timestamp::from_millis(ms));
        events.extend(scroller.on_touch(&Sample::up(x0 + dx, y0 + dy, Timestamp::from_millis(ms))));

        let tapped = events.iter().any(|event| matches!(event, GestureEvent::Tap { .. }));
        if farthest > slop {
            prop_assert!(!tapped, "tap after travelling {}: {:?}", farthest, events);
        }

        for _ in 0..2000 {
            if !scroller.has_pending_work() {
                break;
            }
            clock.advance(16);
            scroller.run_due();
        }
        let core = scroller.core();
        prop_assert_eq!(core.state(), ScrollState::Idle);
        prop_assert!(core.viewport().top >= core.min_scroll_y());
        prop_assert!(core.viewport().top <= core.max_scroll_y());
    }
}
