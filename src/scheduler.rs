//! Single-threaded deferred task queue and clocks.
//!
//! Everything in the engine runs on one thread. Work that must happen later
//! (animation frames, long-press checks, delayed touch-up, press feedback) is
//! posted to a [`TaskQueue`] as a plain value and handed back to its owner
//! when the host drives a frame. Tasks posted while a frame is draining run on
//! the following frame, so a self-rescheduling animation advances exactly one
//! step per frame.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the clock origin.
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Timestamp `millis` later.
    pub const fn plus(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub const fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Source of the current time.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Timestamp;
}

/// Shared handle to a clock.
pub type SharedClock = Rc<dyn Clock>;

/// Wall clock backed by [`Instant`], measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convenience constructor for a shared handle.
    pub fn shared() -> SharedClock {
        Rc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = self.origin.elapsed().as_millis();
        Timestamp(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

/// Manually advanced clock for tests and deterministic replays.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    /// Sets the absolute time.
    pub fn set(&self, at: Timestamp) {
        self.now.set(at.millis());
    }

    /// Shared handle that follows this clock.
    pub fn shared(&self) -> SharedClock {
        Rc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}

/// Identity of a posted task.
///
/// Owners keep the id of the task they consider current and ignore any other
/// task of the same kind when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Scheduled<T> {
    due: Timestamp,
    id: TaskId,
    task: T,
}

/// Deferred task queue ordered by due time, then by posting order.
pub struct TaskQueue<T> {
    clock: SharedClock,
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> std::fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("now", &self.clock.now())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue reading time from `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current time of the queue's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The clock this queue reads.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Posts a task for the next frame.
    pub fn post(&mut self, task: T) -> TaskId {
        self.post_delayed(task, 0)
    }

    /// Posts a task to run once `delay_millis` have elapsed.
    pub fn post_delayed(&mut self, task: T, delay_millis: u64) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let due = self.clock.now().plus(delay_millis);
        self.pending.push(Scheduled { due, id, task });
        id
    }

    /// Removes a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|scheduled| scheduled.id != id);
        self.pending.len() != before
    }

    /// Removes every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Takes all tasks that are due now, in due order.
    ///
    /// Tasks posted by the caller while handling the returned batch are not
    /// part of it.
    pub fn drain_due(&mut self) -> Vec<(TaskId, T)> {
        let now = self.clock.now();
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|scheduled| scheduled.due <= now);
        self.pending = rest;
        due.sort_by_key(|scheduled| (scheduled.due, scheduled.id));
        due.into_iter()
            .map(|scheduled| (scheduled.id, scheduled.task))
            .collect()
    }

    /// Earliest due time among pending tasks.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.pending.iter().map(|scheduled| scheduled.due).min()
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> (ManualClock, TaskQueue<&'static str>) {
        let clock = ManualClock::new();
        let queue = TaskQueue::new(clock.shared());
        (clock, queue)
    }

    #[test]
    fn posted_task_is_due_immediately() {
        let (_clock, mut q) = queue();
        q.post("tick");
        let due = q.drain_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, "tick");
        assert!(q.is_empty());
    }

    #[test]
    fn delayed_task_waits_for_clock() {
        let (clock, mut q) = queue();
        q.post_delayed("later", 100);
        assert!(q.drain_due().is_empty());
        clock.advance(99);
        assert!(q.drain_due().is_empty());
        clock.advance(1);
        assert_eq!(q.drain_due().len(), 1);
    }

    #[test]
    fn drain_orders_by_due_then_post_order() {
        let (clock, mut q) = queue();
        q.post_delayed("b", 20);
        q.post_delayed("a", 10);
        q.post_delayed("c", 20);
        clock.advance(50);
        let names: Vec<_> = q.drain_due().into_iter().map(|(_, t)| t).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let (_clock, mut q) = queue();
        let id = q.post("gone");
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(q.drain_due().is_empty());
    }

    #[test]
    fn next_due_reports_earliest() {
        let (_clock, mut q) = queue();
        assert_eq!(q.next_due(), None);
        q.post_delayed("x", 30);
        q.post_delayed("y", 5);
        assert_eq!(q.next_due(), Some(Timestamp::from_millis(5)));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(42);
        assert_eq!(other.now(), Timestamp::from_millis(42));
    }
}
