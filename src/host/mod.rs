//! Terminal host for the demo binary (impure shell).
//!
//! Owns the ratatui terminal, feeds crossterm mouse and key events into an
//! [`ItemsView`] of [`LabelAdapter`] items and runs the view's frames.

pub mod input;
pub mod labels;
pub mod render;

pub use input::{sample_from_mouse, wheel_delta, CellSize};
pub use labels::{LabelAdapter, TextItem};
pub use render::render_items;

use crate::config::keybindings::{KeyAction, KeyBindings};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::items::{ItemEvent, ItemsView};
use crate::scheduler::{SharedClock, SystemClock};
use crossterm::{
    event::{self, Event, KeyEvent, MouseEvent},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Poll interval while something is animating.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Poll interval while idle.
const IDLE_INTERVAL: Duration = Duration::from_millis(250);

/// Duration of key-driven smooth scrolls.
const KEY_SCROLL_MS: u64 = 120;

/// Errors that can occur while running the demo.
#[derive(Debug, Error)]
pub enum HostError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Engine rejected a request
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Demo application.
///
/// Generic over backend to support testing with `TestBackend`.
pub struct DemoApp<B>
where
    B: Backend,
{
    terminal: Terminal<B>,
    view: ItemsView<LabelAdapter>,
    cell: CellSize,
    keys: KeyBindings,
    status: String,
    next_label: usize,
}

impl<B> DemoApp<B>
where
    B: Backend,
{
    /// Creates the app with `items` numbered labels.
    pub fn new(
        terminal: Terminal<B>,
        config: &EngineConfig,
        clock: SharedClock,
        items: usize,
    ) -> Result<Self, HostError> {
        let cell = CellSize::default();
        let mut view = ItemsView::new(config, clock);
        view.core_mut().set_thumb_enabled(true);

        let mut app = Self {
            terminal,
            view,
            cell,
            keys: KeyBindings::default(),
            status: String::new(),
            next_label: items,
        };
        let size = app.terminal.size()?;
        app.handle_resize(size.width, size.height);
        app.view
            .set_adapter(Some(LabelAdapter::numbered(items, cell)));
        app.status = format!("{items} items");
        Ok(app)
    }

    /// The items view.
    pub fn view(&mut self) -> &mut ItemsView<LabelAdapter> {
        &mut self.view
    }

    /// Text of the status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The terminal.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Handles a key. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.keys.get(key) else {
            return false;
        };
        debug!(?action, "key action");

        let step = 3 * self.cell.height;
        let page = self.view.core().view_size().height;
        let result = match action {
            KeyAction::Quit => return true,
            KeyAction::ScrollUp => self.view.scroll_smoothly_by(0, -step, KEY_SCROLL_MS),
            KeyAction::ScrollDown => self.view.scroll_smoothly_by(0, step, KEY_SCROLL_MS),
            KeyAction::ScrollLeft => {
                self.view
                    .scroll_smoothly_by(-3 * self.cell.width, 0, KEY_SCROLL_MS)
            }
            KeyAction::ScrollRight => {
                self.view
                    .scroll_smoothly_by(3 * self.cell.width, 0, KEY_SCROLL_MS)
            }
            KeyAction::PageUp => self.view.scroll_smoothly_by(0, -page, KEY_SCROLL_MS),
            KeyAction::PageDown => self.view.scroll_smoothly_by(0, page, KEY_SCROLL_MS),
            KeyAction::ScrollToTop => {
                self.view.scroll_to(0, 0);
                return false;
            }
            KeyAction::ScrollToBottom => {
                let core = self.view.core();
                let bottom = core.max_scroll_y();
                self.view.scroll_to(0, bottom);
                return false;
            }
            KeyAction::InsertItem => {
                self.insert_item();
                return false;
            }
            KeyAction::RemoveItem => {
                self.remove_item();
                return false;
            }
            KeyAction::ToggleThumbs => {
                let core = self.view.core_mut();
                let enabled = !core.thumb_enabled();
                core.set_thumb_enabled(enabled);
                return false;
            }
        };
        if let Err(err) = result {
            warn!(%err, "key scroll rejected");
        }
        false
    }

    fn insert_item(&mut self) {
        let at = self.view.first_visible_index().unwrap_or(0);
        let label = format!("Item {}", self.next_label);
        self.next_label += 1;
        if let Some(labels) = self.view.adapter_mut() {
            labels.insert(at, label.as_str());
        }
        self.view.sync_adapter();
        self.status = format!("inserted {label} at {at}");
    }

    fn remove_item(&mut self) {
        let Some(at) = self.view.first_visible_index() else {
            return;
        };
        let removed = self.view.adapter_mut().and_then(|labels| labels.remove(at));
        self.view.sync_adapter();
        if let Some(label) = removed {
            self.status = format!("removed {label}");
        }
    }

    /// Handles a mouse event: the wheel scrolls, the left button is a
    /// pointer.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if let Some((dx, dy)) = wheel_delta(&mouse, self.cell) {
            self.view.scroll_by(dx, dy);
            return;
        }
        let now = self.view.core().now();
        if let Some(sample) = sample_from_mouse(&mouse, self.cell, now) {
            let events = self.view.on_touch(&sample);
            self.report(events);
        }
    }

    /// Resizes the view to the terminal minus the status line.
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        let size = self.cell.view_size(width, height.saturating_sub(1));
        debug!(width, height, ?size, "resized");
        self.view.set_view_size(size);
    }

    /// Runs one frame of animations and timers.
    pub fn tick(&mut self) {
        let events = self.view.run_due();
        self.report(events);
    }

    fn report(&mut self, events: Vec<ItemEvent>) {
        for event in events {
            info!(?event, "item event");
            let label = |view: &ItemsView<LabelAdapter>, index: usize| {
                view.adapter()
                    .and_then(|labels| labels.label(index))
                    .unwrap_or("?")
                    .to_string()
            };
            self.status = match event {
                ItemEvent::ItemClick { index } => {
                    format!("clicked {}", label(&self.view, index))
                }
                ItemEvent::ItemLongPress { index } => {
                    format!("long-pressed {}", label(&self.view, index))
                }
                ItemEvent::Tap { .. } => "tapped outside the items".to_string(),
                ItemEvent::LongPress { .. } => "long-pressed outside the items".to_string(),
            };
        }
    }

    /// Renders the current frame.
    pub fn draw(&mut self) -> Result<(), HostError> {
        let Self {
            terminal,
            view,
            cell,
            status,
            ..
        } = self;
        terminal.draw(|frame| {
            let area = frame.area();
            let items = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            let status_area = Rect {
                y: area.bottom().saturating_sub(1),
                height: area.height.min(1),
                ..area
            };
            render_items(view, items, frame.buffer_mut(), *cell);
            frame.render_widget(
                Line::styled(status.as_str(), Style::default().add_modifier(Modifier::DIM)),
                status_area,
            );
        })?;
        Ok(())
    }

    /// Runs the event loop until the user quits.
    pub fn run(&mut self) -> Result<(), HostError> {
        self.draw()?;
        loop {
            let animating = self.view.has_pending_work() || self.view.core().is_thumb_visible();
            let timeout = if animating {
                FRAME_INTERVAL
            } else {
                IDLE_INTERVAL
            };

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(width, height) => self.handle_resize(width, height),
                    _ => {}
                }
            }

            self.tick();
            self.draw()?;
        }
    }
}

/// Sets up the terminal, runs the demo and restores the terminal.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run_demo(config: &EngineConfig, items: usize) -> Result<(), HostError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(crossterm::event::EnableMouseCapture)?;
    let terminal: Terminal<CrosstermBackend<Stdout>> = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = DemoApp::new(terminal, config, SystemClock::shared(), items)
        .and_then(|mut app| app.run());

    // Always restore terminal state
    restore_terminal()?;
    result
}

fn restore_terminal() -> Result<(), HostError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
