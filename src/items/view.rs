//! Virtualized grid of adapter items on top of a [`Scroller`].
//!
//! Layout runs in three stages. Structure asks the adapter for item and
//! group counts, measures one representative item and derives the columns.
//! Arrange places every cell row by row. Visualize hit-tests the viewport,
//! binds containers for visible, preview and pinned cells and re-measures
//! them; a cell whose measured size disagrees with its arranged size sends
//! the pipeline back to arrange. Invalidating a stage invalidates every
//! stage after it.

mod press;

pub use press::ItemEvent;

use super::adapter::{Constraint, ItemView, ItemsAdapter, ItemsChange, MeasureSpec, Subscription};
use super::cell::{Cell, ItemTransform, Visibility};
use super::grid::{ColumnMetrics, GridLayout, Padding};
use super::pool::{ContainerId, ContainerPool};
use crate::config::{EngineConfig, GridConfig};
use crate::error::EngineError;
use crate::geometry::{Gravity, Point, Rect, Size};
use crate::scheduler::{SharedClock, TaskId, TaskQueue};
use crate::scroll::{
    AnimationId, ObserverId, ScrollCore, ScrollEvent, ScrollObserver, ScrollState, Scroller,
};
use press::PressTask;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Visualize gives up after this many arrange/measure rounds.
const MAX_PASSES: usize = 8;

/// Layout work still owed, ordered by how much of the pipeline must rerun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Clean,
    Visualize,
    Arrange,
    Structure,
}

struct EmptySlot<V> {
    view: Option<V>,
    bounds: Rect,
    active: bool,
}

impl<V> Default for EmptySlot<V> {
    fn default() -> Self {
        Self {
            view: None,
            bounds: Rect::default(),
            active: false,
        }
    }
}

/// What a [`Drawable`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawableKind {
    /// An item.
    Item {
        /// Item index.
        index: usize,
        /// The item shows pressed feedback.
        pressed: bool,
    },
    /// A group title.
    GroupTitle {
        /// Group index.
        group: usize,
    },
    /// The view above the first row.
    Header,
    /// The view below the last row.
    Footer,
    /// Placeholder shown while there are no items.
    Empty,
}

/// A materialized view and where to draw it.
#[derive(Debug)]
pub struct Drawable<'a, V> {
    /// What is drawn.
    pub kind: DrawableKind,
    /// Bounds in view coordinates, item offset applied.
    pub bounds: Rect,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
    /// The view itself.
    pub view: &'a V,
}

/// First visible cell and the viewport's offset from its top-left corner.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    index: Option<usize>,
    x: f32,
    y: f32,
}

impl Anchor {
    /// Moves the anchor along with its cell across one change applied to
    /// `len` cells.
    fn follow(&mut self, change: ItemsChange, len: usize) {
        let Some(index) = self.index.as_mut() else {
            return;
        };
        match change {
            ItemsChange::Added { at, count } => {
                if at.min(len) <= *index {
                    *index += count;
                }
            }
            ItemsChange::Removed { at, count } => {
                let end = at.saturating_add(count).min(len);
                if end <= *index {
                    *index -= end.saturating_sub(at);
                } else if at <= *index {
                    *index = at;
                }
            }
            ItemsChange::Moved { from, count, to } => {
                if count == 0 || from >= len {
                    return;
                }
                let count = count.min(len - from);
                let to = to.min(len - count);
                // A moved anchor keeps its position.
                if (from..from + count).contains(index) {
                    return;
                }
                if *index >= from + count {
                    *index -= count;
                }
                if *index >= to {
                    *index += count;
                }
            }
            ItemsChange::Modified { .. } | ItemsChange::Changed { .. } => {}
        }
    }
}

/// Scrollable, virtualized grid of items.
pub struct ItemsView<A: ItemsAdapter> {
    scroller: Scroller,
    adapter: Option<A>,
    subscription: Option<Subscription>,
    grid_config: GridConfig,
    padding: Padding,
    unbounded_width: bool,
    cells: Vec<Cell>,
    pool: ContainerPool<A::View>,
    grid: GridLayout<A::View>,
    empty: EmptySlot<A::View>,
    header: Option<A::View>,
    footer: Option<A::View>,
    dirty: Stage,
    visible: Vec<usize>,
    preview: Vec<usize>,
    pinned: BTreeSet<usize>,

    tasks: TaskQueue<PressTask>,
    tap_timeout_ms: u64,
    pressed_state_ms: u64,
    touching: Option<usize>,
    pressed: Option<usize>,
    pending_press: Option<(TaskId, usize)>,
    pending_unpress: Option<(TaskId, usize)>,
    events: Vec<ItemEvent>,
}

impl<A: ItemsAdapter> fmt::Debug for ItemsView<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemsView")
            .field("scroller", &self.scroller)
            .field("cells", &self.cells.len())
            .field("containers", &self.pool.len())
            .field("visible", &self.visible)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl<A: ItemsAdapter> ItemsView<A> {
    /// Creates a view with no adapter.
    pub fn new(config: &EngineConfig, clock: SharedClock) -> Self {
        let mut scroller = Scroller::new(config, clock.clone());
        scroller.core_mut().set_record_events(true);
        Self {
            scroller,
            adapter: None,
            subscription: None,
            grid_config: config.grid.clone(),
            padding: Padding::default(),
            unbounded_width: false,
            cells: Vec::new(),
            pool: ContainerPool::default(),
            grid: GridLayout::default(),
            empty: EmptySlot::default(),
            header: None,
            footer: None,
            dirty: Stage::Structure,
            visible: Vec::new(),
            preview: Vec::new(),
            pinned: BTreeSet::new(),
            tasks: TaskQueue::new(clock),
            tap_timeout_ms: config.gesture.tap_timeout_ms,
            pressed_state_ms: config.gesture.pressed_state_ms,
            touching: None,
            pressed: None,
            pending_press: None,
            pending_unpress: None,
            events: Vec::new(),
        }
    }

    /// Creates a view showing `adapter`.
    pub fn with_adapter(config: &EngineConfig, clock: SharedClock, adapter: A) -> Self {
        let mut view = Self::new(config, clock);
        view.set_adapter(Some(adapter));
        view
    }

    // ---- adapter ----

    /// Replaces the adapter and returns the previous one.
    ///
    /// The old adapter is unsubscribed and every cell and container is
    /// dropped; the new adapter is subscribed and laid out from scratch.
    pub fn set_adapter(&mut self, adapter: Option<A>) -> Option<A> {
        self.cancel_pressing();
        self.touching = None;

        let mut old = self.adapter.take();
        if let Some(subscription) = self.subscription.take() {
            if let Some(old) = old.as_mut() {
                old.unsubscribe(subscription.id());
            }
        }

        self.pool = ContainerPool::default();
        self.grid = GridLayout::default();
        self.empty = EmptySlot::default();
        self.visible.clear();
        self.preview.clear();
        self.pinned.clear();

        let count = adapter.as_ref().map_or(0, |adapter| adapter.item_count());
        self.cells = (0..count).map(|_| Cell::default()).collect();
        self.adapter = adapter;
        if let Some(adapter) = self.adapter.as_mut() {
            self.subscription = adapter.subscribe();
        }
        debug!(count, "adapter attached");

        self.invalidate(Stage::Structure);
        self.visualize();
        self.scroller.core_mut().spring_back();
        self.visualize();
        old
    }

    /// The attached adapter.
    pub fn adapter(&self) -> Option<&A> {
        self.adapter.as_ref()
    }

    /// The attached adapter, for data changes. Changes it announces are
    /// applied on the next frame or [`ItemsView::sync_adapter`].
    pub fn adapter_mut(&mut self) -> Option<&mut A> {
        self.adapter.as_mut()
    }

    /// Applies every change the adapter announced since the last sync.
    pub fn sync_adapter(&mut self) {
        let changes = self
            .subscription
            .as_ref()
            .map(Subscription::drain)
            .unwrap_or_default();
        if !changes.is_empty() {
            self.apply_changes(&changes);
        }
    }

    /// Applies one change directly, bypassing the subscription.
    pub fn apply_change(&mut self, change: ItemsChange) {
        self.apply_changes(&[change]);
    }

    // ---- configuration ----

    /// The scroller.
    pub fn scroller(&self) -> &Scroller {
        &self.scroller
    }

    /// The scroller, mutable.
    pub fn scroller_mut(&mut self) -> &mut Scroller {
        &mut self.scroller
    }

    /// Scroll state and viewport.
    pub fn core(&self) -> &ScrollCore {
        self.scroller.core()
    }

    /// Scroll state and viewport, mutable. Viewport changes made here are
    /// picked up by the next query or frame.
    pub fn core_mut(&mut self) -> &mut ScrollCore {
        self.scroller.core_mut()
    }

    /// Resizes the view.
    pub fn set_view_size(&mut self, size: Size) {
        if size != self.scroller.core().view_size() {
            self.scroller.core_mut().set_view_size(size);
            self.invalidate(Stage::Structure);
        }
    }

    /// Padding around the cells.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Sets the padding around the cells.
    pub fn set_padding(&mut self, padding: Padding) {
        if padding != self.padding {
            self.padding = padding;
            self.invalidate(Stage::Structure);
        }
    }

    /// Grid settings.
    pub fn grid_config(&self) -> &GridConfig {
        &self.grid_config
    }

    /// Replaces the grid settings.
    pub fn set_grid_config(&mut self, config: GridConfig) {
        if config != self.grid_config {
            self.grid_config = config;
            self.invalidate(Stage::Structure);
        }
    }

    /// Shows `view` above the first row while an adapter is attached. It
    /// scrolls with the items and counts toward the content height. Returns
    /// the previous header.
    pub fn set_header_view(&mut self, view: Option<A::View>) -> Option<A::View> {
        self.invalidate(Stage::Structure);
        std::mem::replace(&mut self.header, view)
    }

    /// Shows `view` below the last row. Returns the previous footer.
    pub fn set_footer_view(&mut self, view: Option<A::View>) -> Option<A::View> {
        self.invalidate(Stage::Structure);
        std::mem::replace(&mut self.footer, view)
    }

    /// The header view.
    pub fn header_view(&self) -> Option<&A::View> {
        self.header.as_ref()
    }

    /// The footer view.
    pub fn footer_view(&self) -> Option<&A::View> {
        self.footer.as_ref()
    }

    /// Lays rows out without a width limit, for horizontally scrolling
    /// grids.
    pub fn set_unbounded_width(&mut self, unbounded: bool) {
        if unbounded != self.unbounded_width {
            self.unbounded_width = unbounded;
            self.invalidate(Stage::Structure);
        }
    }

    /// Forces a full relayout on the next query or frame.
    pub fn invalidate_layout(&mut self) {
        self.invalidate(Stage::Structure);
    }

    // ---- scrolling ----

    /// See [`ScrollCore::scroll_to`].
    pub fn scroll_to(&mut self, x: i32, y: i32) {
        self.scroller.core_mut().scroll_to(x, y);
        self.visualize();
    }

    /// See [`ScrollCore::scroll_by`].
    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.scroller.core_mut().scroll_by(dx, dy);
        self.visualize();
    }

    /// See [`ScrollCore::force_scroll_to`].
    pub fn force_scroll_to(&mut self, x: i32, y: i32) {
        self.scroller.core_mut().force_scroll_to(x, y);
        self.visualize();
    }

    /// See [`ScrollCore::spring_back`].
    pub fn spring_back(&mut self) {
        self.scroller.core_mut().spring_back();
        self.visualize();
    }

    /// See [`ScrollCore::spring_back_smoothly`].
    pub fn spring_back_smoothly(&mut self) -> AnimationId {
        self.scroller.core_mut().spring_back_smoothly()
    }

    /// See [`ScrollCore::scroll_smoothly_to`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDuration`] for a zero duration.
    pub fn scroll_smoothly_to(
        &mut self,
        x: i32,
        y: i32,
        duration: u64,
    ) -> Result<AnimationId, EngineError> {
        self.scroller.core_mut().scroll_smoothly_to(x, y, duration)
    }

    /// See [`ScrollCore::scroll_smoothly_by`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDuration`] for a zero duration.
    pub fn scroll_smoothly_by(
        &mut self,
        dx: i32,
        dy: i32,
        duration: u64,
    ) -> Result<AnimationId, EngineError> {
        self.scroller.core_mut().scroll_smoothly_by(dx, dy, duration)
    }

    /// Converts a content point to view coordinates.
    pub fn content_to_view(&self, point: Point) -> Point {
        self.scroller.core().content_to_view(point)
    }

    /// Converts a view point to content coordinates.
    pub fn view_to_content(&self, point: Point) -> Point {
        self.scroller.core().view_to_content(point)
    }

    /// Registers a scroll observer.
    pub fn add_scroll_observer(&mut self, observer: Box<dyn ScrollObserver>) -> ObserverId {
        self.scroller.core_mut().add_observer(observer)
    }

    /// Unregisters a scroll observer.
    pub fn remove_scroll_observer(&mut self, id: ObserverId) -> bool {
        self.scroller.core_mut().remove_observer(id)
    }

    // ---- pipeline ----

    fn invalidate(&mut self, stage: Stage) {
        self.dirty = self.dirty.max(stage);
    }

    /// Reacts to recorded scroll notifications.
    fn sync_scroll(&mut self) {
        for event in self.scroller.core_mut().take_events() {
            match event {
                ScrollEvent::StateChanged {
                    old: ScrollState::Idle,
                    new: ScrollState::Drag,
                } => self.cancel_pressing(),
                ScrollEvent::Scrolled {
                    viewport_changed: true,
                    ..
                } => self.invalidate(Stage::Visualize),
                _ => {}
            }
        }
    }

    /// Runs whatever layout stages are owed and materializes the cells in
    /// and around the viewport.
    pub fn visualize(&mut self) {
        self.sync_scroll();
        if self.dirty == Stage::Clean {
            return;
        }

        let mut settled = false;
        for _ in 0..MAX_PASSES {
            let stage = std::mem::replace(&mut self.dirty, Stage::Clean);
            if stage == Stage::Structure {
                self.structure();
            }
            if stage >= Stage::Arrange {
                self.arrange();
            }
            self.update_visibility();

            let pinned_hidden = self
                .pinned
                .iter()
                .copied()
                .filter(|&index| {
                    self.cells
                        .get(index)
                        .is_some_and(|cell| cell.visibility == Visibility::Hidden)
                });
            let targets: Vec<usize> = self
                .visible
                .iter()
                .chain(&self.preview)
                .copied()
                .chain(pinned_hidden)
                .collect();
            for index in targets {
                self.visualize_cell(index);
            }

            if self.dirty == Stage::Clean {
                settled = true;
                break;
            }
        }
        if !settled {
            warn!(passes = MAX_PASSES, "cell sizes did not settle");
            self.dirty = Stage::Clean;
        }

        self.hide_stray_containers();
    }

    fn structure(&mut self) {
        let Some(adapter) = self.adapter.as_ref() else {
            self.grid = GridLayout::default();
            self.empty.active = false;
            self.set_content_size(Size::default());
            return;
        };
        let count = adapter.item_count();
        let group_sizes: Vec<usize> = (0..adapter.group_count())
            .map(|group| adapter.group_size(group))
            .collect();

        if count != self.cells.len() {
            warn!(
                cells = self.cells.len(),
                count, "adapter count disagrees with cells, clamping"
            );
            self.resize_cells(count);
        }
        if count == 0 && group_sizes.is_empty() {
            self.structure_empty();
            return;
        }
        self.empty.active = false;

        let old_titles = self.grid.set_groups(&group_sizes, count);
        if let Some(adapter) = self.adapter.as_mut() {
            let mut old_titles = old_titles.into_iter();
            for (n, group) in self.grid.groups.iter_mut().enumerate() {
                let reuse = old_titles.next().flatten();
                group.title = if group_sizes.is_empty() {
                    None
                } else {
                    adapter.group_title(n, reuse)
                };
            }
        }

        let view = self.scroller.core().view_size();
        let available =
            (!self.unbounded_width).then(|| (view.width - self.padding.horizontal()).max(0));
        let natural = if count > 0 {
            self.measure_cell(0, MeasureSpec::UNSPECIFIED)
        } else {
            Size::default()
        };
        let cell_width = available.map_or(natural.width, |width| natural.width.min(width));

        let columns = ColumnMetrics::compute(&self.grid_config, available, cell_width);
        let old_width = self.grid.columns.width;
        self.grid.set_columns(columns);
        self.grid.row_spacing = self.grid_config.row_spacing;
        self.grid.supposed_cell_height = if count > 0 {
            let exact = MeasureSpec::new(Constraint::Exactly(columns.width), Constraint::Unspecified);
            self.measure_cell(0, exact).height
        } else {
            natural.height
        };

        let title_spec =
            MeasureSpec::new(Constraint::Exactly(columns.row_width()), Constraint::Unspecified);
        for group in &mut self.grid.groups {
            group.title_size = group
                .title
                .as_ref()
                .map_or(Size::default(), |title| title.measure(title_spec));
        }
        self.measure_frames(columns.row_width());

        let height = self.grid.estimated_height(self.padding, natural.height);
        self.set_content_size(Size::new(
            columns.row_width() + self.padding.horizontal(),
            height,
        ));

        if columns.width != old_width {
            for cell in &mut self.cells {
                cell.measured = None;
                cell.layout_valid = false;
            }
        }
        debug!(
            count,
            groups = self.grid.groups.len(),
            columns = columns.count,
            column_width = columns.width,
            "grid structured"
        );
    }

    fn structure_empty(&mut self) {
        self.grid = GridLayout::default();
        let reuse = self.empty.view.take();
        let view = self
            .adapter
            .as_mut()
            .and_then(|adapter| adapter.empty_view(reuse));
        let size = view
            .as_ref()
            .map_or(Size::default(), |view| view.measure(MeasureSpec::UNSPECIFIED));
        self.empty.view = view;
        self.empty.active = true;

        let view_size = self.scroller.core().view_size();
        let padding = self.padding;
        let width = (view_size.width - padding.horizontal()).max(0);
        self.measure_frames(width);
        let header = self.grid.header_size.height;
        let footer = self.grid.footer_size.height;

        let content = Size::new(
            view_size.width.max(size.width + padding.horizontal()),
            view_size
                .height
                .max(size.height + padding.vertical() + header + footer),
        );
        self.set_content_size(content);
        // The placeholder is centered between the header and the footer.
        let inner = Rect::new(
            padding.left,
            padding.top + header,
            content.width - padding.right,
            content.height - padding.bottom - footer,
        );
        self.grid.header_bounds =
            Rect::new(padding.left, padding.top, padding.left + width, inner.top);
        self.grid.footer_bounds =
            Rect::new(padding.left, inner.bottom, padding.left + width, inner.bottom + footer);
        self.empty.bounds = Gravity::CENTER.apply(size.width, size.height, &inner);
        debug!("no items, showing the empty placeholder");
    }

    /// Measures the header and footer at `width`.
    fn measure_frames(&mut self, width: i32) {
        let spec = MeasureSpec::new(Constraint::Exactly(width), Constraint::Unspecified);
        let measure =
            |frame: Option<&A::View>| frame.map_or(Size::default(), |view| view.measure(spec));
        self.grid.header_size = measure(self.header.as_ref());
        self.grid.footer_size = measure(self.footer.as_ref());
    }

    fn arrange(&mut self) {
        if self.empty.active || self.adapter.is_none() {
            return;
        }
        let content = self.grid.arrange(&mut self.cells, self.padding);
        self.set_content_size(content);
        trace!(?content, "cells arranged");
    }

    fn set_content_size(&mut self, size: Size) {
        let core = self.scroller.core_mut();
        let before = core.content_bounds();
        core.set_content_size(size.width, size.height);
        if core.content_bounds() != before {
            core.after_layout(false);
        }
    }

    fn reset_visibility(&mut self) {
        for &index in self.visible.iter().chain(&self.preview) {
            if let Some(cell) = self.cells.get_mut(index) {
                cell.visibility = Visibility::Hidden;
            }
        }
        self.visible.clear();
        self.preview.clear();
    }

    fn update_visibility(&mut self) {
        self.reset_visibility();
        let viewport = self.scroller.core().viewport();
        if self.empty.active || viewport.is_empty() {
            return;
        }
        let area = viewport.inset(
            -self.grid_config.preview_width,
            -self.grid_config.preview_height,
        );
        for index in self.grid.hit_test_cells(&self.cells, &area) {
            let cell = &mut self.cells[index];
            if cell.bounds.intersects(&viewport) {
                cell.visibility = Visibility::Visible;
                self.visible.push(index);
            } else {
                cell.visibility = Visibility::Preview;
                self.preview.push(index);
            }
        }
    }

    /// Makes sure the cell has a container holding a current view. Returns
    /// true when the cell must be measured.
    fn fill_cell(&mut self, index: usize) -> bool {
        let Some(adapter) = self.adapter.as_mut() else {
            return false;
        };
        let cell = &self.cells[index];
        if !cell.item_changed && cell.container.is_some() {
            return cell.measured != Some(cell.bounds.size());
        }

        let id = match cell.container {
            Some(id) => id,
            None => {
                let cells = &self.cells;
                let (id, previous) = self.pool.bind(index, |owner| {
                    cells.get(owner).map_or(true, |cell| !cell.holds_container())
                });
                if let Some(previous) = previous {
                    trace!(from = previous, to = index, "container recycled");
                    let cell = &mut self.cells[previous];
                    cell.container = None;
                    cell.layout_valid = false;
                }
                self.cells[index].container = Some(id);
                id
            }
        };

        let reuse = self.pool.take_view(id);
        let view = adapter.item_view(index, reuse);
        self.pool.put_view(id, view);
        let cell = &mut self.cells[index];
        cell.item_changed = false;
        cell.layout_valid = false;
        true
    }

    fn measure_cell(&mut self, index: usize, spec: MeasureSpec) -> Size {
        self.cells[index].spec = spec;
        self.fill_cell(index);
        let size = self.cells[index]
            .container
            .and_then(|id| self.pool.view(id))
            .map_or(Size::default(), |view| view.measure(spec));
        self.cells[index].measured = Some(size);
        size
    }

    fn visualize_cell(&mut self, index: usize) {
        if index >= self.cells.len() {
            return;
        }
        if self.fill_cell(index) {
            let cell = &self.cells[index];
            let spec = cell.spec;
            let size = cell
                .container
                .and_then(|id| self.pool.view(id))
                .map_or(Size::default(), |view| view.measure(spec));
            let cell = &mut self.cells[index];
            cell.measured = Some(size);
            if size != cell.bounds.size() {
                trace!(index, ?size, arranged = ?cell.bounds.size(), "cell size changed");
                self.invalidate(Stage::Arrange);
                return;
            }
        }

        let cell = &mut self.cells[index];
        if let Some(id) = cell.container {
            if !cell.layout_valid {
                self.pool.set_frame(id, cell.bounds);
                cell.layout_valid = true;
            }
            self.pool.set_shown(id, true);
        }
    }

    /// Hides containers whose cell is neither visible nor pinned. They stay
    /// filled and may be recycled.
    fn hide_stray_containers(&mut self) {
        let stray: Vec<(ContainerId, bool)> = self
            .pool
            .filled()
            .filter_map(|(id, owner)| match self.cells.get(owner) {
                Some(cell) if cell.is_visible() || cell.pinned => None,
                Some(_) => Some((id, false)),
                None => Some((id, true)),
            })
            .collect();
        for (id, orphaned) in stray {
            if orphaned {
                self.pool.release(id);
            } else {
                self.pool.set_shown(id, false);
            }
        }
    }

    // ---- mutations ----

    fn apply_changes(&mut self, changes: &[ItemsChange]) {
        self.visualize();
        let mut anchor = self.save_viewport();
        self.reset_visibility();

        let mut applied = false;
        let mut spring_back = false;
        for &change in changes {
            anchor.follow(change, self.cells.len());
            let done = match change {
                ItemsChange::Added { at, count } => self.items_added(at, count),
                ItemsChange::Removed { at, count } => self.items_removed(at, count),
                ItemsChange::Moved { from, count, to } => self.items_moved(from, count, to),
                ItemsChange::Modified { at, count } => self.items_modified(at, count),
                ItemsChange::Changed { count } => {
                    spring_back = true;
                    self.items_changed(count)
                }
            };
            if done {
                debug!(?change, cells = self.cells.len(), "items changed");
            }
            applied |= done;
        }

        self.invalidate(Stage::Visualize);
        self.visualize();
        if !applied {
            return;
        }
        self.restore_viewport(anchor);
        if spring_back {
            self.scroller.core_mut().spring_back();
        }
        self.visualize();
    }

    fn save_viewport(&self) -> Anchor {
        let viewport = self.scroller.core().viewport_f();
        let first = self.visible.first().or(self.preview.first()).copied();
        match first.and_then(|index| self.cells.get(index).map(|cell| (index, cell.bounds))) {
            Some((index, bounds)) => Anchor {
                index: Some(index),
                x: viewport.left - bounds.left as f32,
                y: viewport.top - bounds.top as f32,
            },
            None => Anchor {
                index: None,
                x: viewport.left,
                y: viewport.top,
            },
        }
    }

    fn restore_viewport(&mut self, anchor: Anchor) {
        let (x, y) = match (anchor.index, self.cells.len()) {
            (Some(index), len) if len > 0 => {
                let bounds = self.cells[index.min(len - 1)].bounds;
                (bounds.left as f32 + anchor.x, bounds.top as f32 + anchor.y)
            }
            _ => (anchor.x, anchor.y),
        };
        self.scroller.core_mut().do_scroll_to(x, y);
    }

    /// Re-points containers and the pin set at the cells' new positions.
    fn after_cells_moved(&mut self) {
        self.pinned.clear();
        for (index, cell) in self.cells.iter().enumerate() {
            if let Some(id) = cell.container {
                self.pool.set_owner(id, index);
            }
            if cell.pinned {
                self.pinned.insert(index);
            }
        }
    }

    fn resize_cells(&mut self, count: usize) {
        if count < self.cells.len() {
            for cell in self.cells.drain(count..) {
                if let Some(id) = cell.container {
                    self.pool.release(id);
                }
            }
        } else {
            self.cells.resize_with(count, Cell::default);
        }
        self.after_cells_moved();
    }

    fn items_added(&mut self, at: usize, count: usize) -> bool {
        if count == 0 {
            return false;
        }
        let len = self.cells.len();
        if at > len {
            warn!(at, len, "insert position past the end, appending");
        }
        let at = at.min(len);

        self.cancel_pressing();
        self.touching = None;
        self.cells
            .splice(at..at, (0..count).map(|_| Cell::default()));
        self.after_cells_moved();
        self.invalidate(Stage::Structure);
        true
    }

    fn items_removed(&mut self, at: usize, count: usize) -> bool {
        let len = self.cells.len();
        if count == 0 {
            return false;
        }
        if at >= len {
            warn!(at, count, len, "removal past the end ignored");
            return false;
        }
        let end = at.saturating_add(count).min(len);

        self.cancel_pressing();
        self.touching = None;
        for cell in self.cells.drain(at..end) {
            if let Some(id) = cell.container {
                self.pool.release(id);
            }
        }
        self.after_cells_moved();
        self.invalidate(Stage::Structure);
        true
    }

    fn items_moved(&mut self, from: usize, count: usize, to: usize) -> bool {
        let len = self.cells.len();
        if count == 0 || from == to || from >= len {
            return false;
        }
        let count = count.min(len - from);
        let to = to.min(len - count);
        if from == to {
            return false;
        }

        self.cancel_pressing();
        self.touching = None;
        let block: Vec<Cell> = self.cells.drain(from..from + count).collect();
        self.cells.splice(to..to, block);
        self.after_cells_moved();
        self.invalidate(Stage::Structure);
        true
    }

    fn items_modified(&mut self, at: usize, count: usize) -> bool {
        let len = self.cells.len();
        if count == 0 || at >= len {
            return false;
        }
        let end = at.saturating_add(count).min(len);

        self.cancel_pressing();
        for cell in &mut self.cells[at..end] {
            cell.mark_changed();
        }
        // The first item sizes the columns.
        self.invalidate(if at == 0 {
            Stage::Structure
        } else {
            Stage::Arrange
        });
        true
    }

    fn items_changed(&mut self, count: usize) -> bool {
        self.cancel_pressing();
        self.touching = None;
        for cell in &mut self.cells {
            cell.mark_changed();
        }
        self.resize_cells(count);
        self.invalidate(Stage::Structure);
        true
    }

    // ---- queries ----

    fn check_item(&self, index: usize) -> Result<(), EngineError> {
        if self.adapter.is_none() {
            return Err(EngineError::NoAdapter);
        }
        EngineError::check_index(index, self.cells.len())
    }

    fn check_group(&mut self, group: usize) -> Result<(), EngineError> {
        if self.adapter.is_none() {
            return Err(EngineError::NoAdapter);
        }
        self.visualize();
        let len = self.grid.groups.len();
        if group < len {
            Ok(())
        } else {
            Err(EngineError::GroupOutOfRange { group, len })
        }
    }

    /// Number of cells.
    pub fn item_count(&self) -> usize {
        self.cells.len()
    }

    /// True while the empty placeholder is in effect.
    pub fn is_showing_empty(&mut self) -> bool {
        self.visualize();
        self.empty.active
    }

    /// Indices of the visible items, ascending.
    pub fn visible_indices(&mut self) -> Vec<usize> {
        self.visualize();
        self.visible.clone()
    }

    /// Number of visible items.
    pub fn visible_count(&mut self) -> usize {
        self.visualize();
        self.visible.len()
    }

    /// First visible item.
    pub fn first_visible_index(&mut self) -> Option<usize> {
        self.visualize();
        self.visible.first().copied()
    }

    /// Last visible item.
    pub fn last_visible_index(&mut self) -> Option<usize> {
        self.visualize();
        self.visible.last().copied()
    }

    /// Range from the first to the last visible item, empty when nothing
    /// is visible.
    pub fn visible_index_range(&mut self) -> Range<usize> {
        self.visualize();
        match (self.visible.first(), self.visible.last()) {
            (Some(&first), Some(&last)) => first..last + 1,
            _ => 0..0,
        }
    }

    /// Whether the item intersects the viewport.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn is_item_visible(&mut self, index: usize) -> Result<bool, EngineError> {
        self.check_item(index)?;
        self.visualize();
        Ok(self.cells[index].is_visible())
    }

    /// Item under the view point `(x, y)`.
    pub fn hit_test_item_cell(&mut self, x: i32, y: i32) -> Option<usize> {
        self.visualize();
        let viewport = self.scroller.core().viewport();
        self.grid
            .hit_test_cell(&self.cells, x + viewport.left, y + viewport.top)
    }

    /// Items whose rows intersect `rect` (view coordinates).
    pub fn hit_test_item_cells(&mut self, rect: Rect) -> Range<usize> {
        self.visualize();
        let rect = self.scroller.core().view_rect_to_content(rect);
        self.grid.hit_test_cells(&self.cells, &rect)
    }

    /// Visible items intersecting `rect` (view coordinates).
    pub fn hit_test_visible_items(&mut self, rect: Rect) -> Vec<usize> {
        self.visualize();
        let rect = self.scroller.core().view_rect_to_content(rect);
        self.visible
            .iter()
            .copied()
            .filter(|&index| self.cells[index].bounds.intersects(&rect))
            .collect()
    }

    /// Settled bounds of an item in content coordinates. The item is
    /// materialized for the duration of the call.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn item_bounds(&mut self, index: usize) -> Result<Rect, EngineError> {
        let forced = self.force_item_visual(index, true)?;
        self.visualize();
        let bounds = self.cells[index].bounds;
        self.force_item_visual(index, forced)?;
        Ok(bounds)
    }

    /// View currently bound to the item, if it is materialized.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn item_view(&mut self, index: usize) -> Result<Option<&A::View>, EngineError> {
        self.check_item(index)?;
        self.visualize();
        Ok(self.cells[index]
            .container
            .and_then(|id| self.pool.view(id)))
    }

    /// Container bound to the item.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn container_of(&mut self, index: usize) -> Result<Option<ContainerId>, EngineError> {
        self.check_item(index)?;
        self.visualize();
        Ok(self.cells[index].container)
    }

    /// True when the item's view must be fetched again before display.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn is_item_dirty(&self, index: usize) -> Result<bool, EngineError> {
        self.check_item(index)?;
        Ok(self.cells[index].item_changed)
    }

    /// Visual offset and opacity of the item.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn item_transform(&self, index: usize) -> Result<Option<ItemTransform>, EngineError> {
        self.check_item(index)?;
        Ok(self.cells[index].transform)
    }

    /// Item showing pressed feedback.
    pub fn pressed_index(&self) -> Option<usize> {
        self.pressed
    }

    /// Current column layout.
    pub fn column_metrics(&mut self) -> ColumnMetrics {
        self.visualize();
        self.grid.columns
    }

    /// Number of rows across all groups.
    pub fn row_count(&mut self) -> usize {
        self.visualize();
        self.grid.row_count()
    }

    /// Row of an item.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn row_index(&mut self, index: usize) -> Result<usize, EngineError> {
        self.check_item(index)?;
        self.visualize();
        self.grid
            .row_of_cell(index)
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.cells.len(),
            })
    }

    /// Column of an item.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn column_index(&mut self, index: usize) -> Result<usize, EngineError> {
        self.check_item(index)?;
        self.visualize();
        self.grid
            .column_of_cell(index)
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.cells.len(),
            })
    }

    /// Bounds of a full row in content coordinates.
    pub fn row_bounds(&mut self, row: usize) -> Option<Rect> {
        self.visualize();
        self.grid.row_bounds(&self.cells, row)
    }

    /// Bounds of a column in content coordinates.
    pub fn column_bounds(&mut self, column: usize) -> Option<Rect> {
        self.visualize();
        self.grid.column_bounds(&self.cells, self.padding, column)
    }

    /// Number of groups; an adapter without groups has one.
    pub fn group_count(&mut self) -> usize {
        self.visualize();
        self.grid.groups.len()
    }

    /// Splits an item index into `(group, offset within group)`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn group_position(&mut self, index: usize) -> Result<(usize, usize), EngineError> {
        self.check_item(index)?;
        self.visualize();
        self.grid
            .group_position(index)
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.cells.len(),
            })
    }

    /// Item index of `offset` within `group`.
    ///
    /// # Errors
    ///
    /// [`EngineError::GroupOutOfRange`] for a bad group,
    /// [`EngineError::IndexOutOfRange`] for an offset past its end.
    pub fn item_index(&mut self, group: usize, offset: usize) -> Result<usize, EngineError> {
        self.check_group(group)?;
        self.grid
            .item_index(group, offset)
            .ok_or(EngineError::IndexOutOfRange {
                index: offset,
                len: self.grid.groups[group].len,
            })
    }

    /// Bounds of a group, title included, in content coordinates.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::GroupOutOfRange`].
    pub fn group_bounds(&mut self, group: usize) -> Result<Rect, EngineError> {
        self.check_group(group)?;
        let found = &self.grid.groups[group];
        let mut bounds = found.title_bounds;
        if found.rows > 0 {
            let last_row = found.first_row + found.rows - 1;
            if let Some(row) = self.grid.row_bounds(&self.cells, last_row) {
                bounds.bottom = bounds.bottom.max(row.bottom);
            }
        }
        Ok(bounds)
    }

    /// Bounds of the header in content coordinates, `None` without a header
    /// or an adapter.
    pub fn header_bounds(&mut self) -> Option<Rect> {
        self.visualize();
        let shown = self.adapter.is_some() && self.header.is_some();
        shown.then_some(self.grid.header_bounds)
    }

    /// Bounds of the footer in content coordinates, `None` without one.
    pub fn footer_bounds(&mut self) -> Option<Rect> {
        self.visualize();
        let shown = self.adapter.is_some() && self.footer.is_some();
        shown.then_some(self.grid.footer_bounds)
    }

    /// Title view of a group.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::GroupOutOfRange`].
    pub fn group_title_view(&mut self, group: usize) -> Result<Option<&A::View>, EngineError> {
        self.check_group(group)?;
        Ok(self.grid.groups[group].title.as_ref())
    }

    // ---- requests ----

    /// Scrolls an off-screen item to the top-left of the viewport, then
    /// back into the resting range. Visible items stay where they are.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn request_item_visible(&mut self, index: usize) -> Result<(), EngineError> {
        self.check_item(index)?;
        self.visualize();
        let core = self.scroller.core();
        let view = core.view_size();
        if view.width <= 0 || view.height <= 0 || core.content_bounds().is_empty() {
            return Ok(());
        }
        if self.cells[index].is_visible() {
            return Ok(());
        }
        let bounds = self.item_bounds(index)?;
        self.scroll_to_then_spring_back(bounds);
        Ok(())
    }

    /// Scrolls so the item lands in `rect` (view coordinates) placed by
    /// `gravity`, then back into the resting range.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn request_item_in_rect(
        &mut self,
        index: usize,
        rect: Rect,
        gravity: Gravity,
    ) -> Result<(), EngineError> {
        self.check_item(index)?;
        if rect.is_empty() {
            return Ok(());
        }
        let bounds = self.item_bounds(index)?;
        self.place_in_rect(bounds, rect, gravity);
        Ok(())
    }

    /// Scrolls a group's top-left corner to the viewport's.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::GroupOutOfRange`].
    pub fn request_group_visible(&mut self, group: usize) -> Result<(), EngineError> {
        let bounds = self.group_bounds(group)?;
        self.scroll_to_then_spring_back(bounds);
        Ok(())
    }

    /// Group counterpart of [`ItemsView::request_item_in_rect`].
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::GroupOutOfRange`].
    pub fn request_group_in_rect(
        &mut self,
        group: usize,
        rect: Rect,
        gravity: Gravity,
    ) -> Result<(), EngineError> {
        let bounds = self.group_bounds(group)?;
        if !rect.is_empty() {
            self.place_in_rect(bounds, rect, gravity);
        }
        Ok(())
    }

    fn scroll_to_then_spring_back(&mut self, bounds: Rect) {
        let core = self.scroller.core_mut();
        core.scroll_to(bounds.left, bounds.top);
        core.spring_back();
        self.visualize();
    }

    fn place_in_rect(&mut self, bounds: Rect, rect: Rect, gravity: Gravity) {
        let core = self.scroller.core_mut();
        let target = gravity.apply(
            bounds.width(),
            bounds.height(),
            &core.view_rect_to_content(rect),
        );
        core.scroll_by(bounds.left - target.left, bounds.top - target.top);
        core.spring_back();
        self.visualize();
    }

    // ---- effects ----

    fn sync_pin(&mut self, index: usize) {
        if self.cells[index].pinned {
            self.pinned.insert(index);
        } else {
            self.pinned.remove(&index);
        }
        self.invalidate(Stage::Visualize);
    }

    /// Keeps the item materialized while `force` is set. Returns the
    /// previous setting.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn force_item_visual(&mut self, index: usize, force: bool) -> Result<bool, EngineError> {
        self.check_item(index)?;
        let cell = &mut self.cells[index];
        let previous = std::mem::replace(&mut cell.force_visual, force);
        cell.update_pin();
        self.sync_pin(index);
        Ok(previous)
    }

    /// Offsets the item's drawing. A non-identity transform pins the item.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn set_item_offset(&mut self, index: usize, dx: i32, dy: i32) -> Result<(), EngineError> {
        self.check_item(index)?;
        let cell = &mut self.cells[index];
        cell.set_offset(dx, dy);
        cell.update_pin();
        self.sync_pin(index);
        Ok(())
    }

    /// Sets the item's opacity. A non-identity transform pins the item.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn set_item_alpha(&mut self, index: usize, alpha: f32) -> Result<(), EngineError> {
        self.check_item(index)?;
        let cell = &mut self.cells[index];
        cell.set_alpha(alpha);
        cell.update_pin();
        self.sync_pin(index);
        Ok(())
    }

    /// Marks the item as animating; its container is not recycled until
    /// cleared.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn set_item_animating(&mut self, index: usize, animating: bool) -> Result<(), EngineError> {
        self.check_item(index)?;
        self.cells[index].animating = animating;
        self.invalidate(Stage::Visualize);
        Ok(())
    }

    /// Drops the item's measurement so it is measured again.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoAdapter`] or [`EngineError::IndexOutOfRange`].
    pub fn invalidate_item_layout(&mut self, index: usize) -> Result<(), EngineError> {
        self.check_item(index)?;
        let cell = &mut self.cells[index];
        cell.measured = None;
        cell.layout_valid = false;
        self.invalidate(Stage::Arrange);
        Ok(())
    }

    // ---- drawing ----

    /// Everything to draw this frame: the visible header and footer, then
    /// visible group titles and the shown items (transformed ones last), or
    /// the empty placeholder.
    pub fn drawables(&mut self) -> Vec<Drawable<'_, A::View>> {
        self.visualize();
        let core = self.scroller.core();
        let viewport = core.viewport();
        let mut drawables = Vec::new();

        if self.adapter.is_some() {
            let frames = [
                (DrawableKind::Header, self.header.as_ref(), self.grid.header_bounds),
                (DrawableKind::Footer, self.footer.as_ref(), self.grid.footer_bounds),
            ];
            for (kind, view, bounds) in frames {
                if let Some(view) = view.filter(|_| bounds.intersects(&viewport)) {
                    drawables.push(Drawable {
                        kind,
                        bounds: core.content_rect_to_view(bounds),
                        alpha: 1.0,
                        view,
                    });
                }
            }
        }

        if self.empty.active {
            if let Some(view) = self.empty.view.as_ref() {
                drawables.push(Drawable {
                    kind: DrawableKind::Empty,
                    bounds: core.content_rect_to_view(self.empty.bounds),
                    alpha: 1.0,
                    view,
                });
            }
            return drawables;
        }

        for (group, found) in self.grid.groups.iter().enumerate() {
            if let Some(view) = found.title.as_ref() {
                if found.title_bounds.intersects(&viewport) {
                    drawables.push(Drawable {
                        kind: DrawableKind::GroupTitle { group },
                        bounds: core.content_rect_to_view(found.title_bounds),
                        alpha: 1.0,
                        view,
                    });
                }
            }
        }

        let mut shown: Vec<(usize, ContainerId)> = self
            .pool
            .filled()
            .filter(|&(id, _)| self.pool.is_shown(id))
            .map(|(id, owner)| (owner, id))
            .collect();
        shown.sort_by_key(|&(index, _)| (self.cells[index].transform.is_some(), index));

        for (index, id) in shown {
            let (Some(view), Some(frame)) = (self.pool.view(id), self.pool.frame(id)) else {
                continue;
            };
            let (dx, dy, alpha) = self.cells[index]
                .transform
                .map_or((0, 0, 1.0), |t| (t.dx, t.dy, t.alpha));
            drawables.push(Drawable {
                kind: DrawableKind::Item {
                    index,
                    pressed: self.pressed == Some(index),
                },
                bounds: core.content_rect_to_view(frame.offset(dx, dy)),
                alpha,
                view,
            });
        }
        drawables
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
