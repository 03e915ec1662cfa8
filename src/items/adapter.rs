//! Collection adapter boundary.
//!
//! An [`ItemsAdapter`] is an index-addressed data source that produces item
//! views on demand. Change notifications travel over a channel: the adapter
//! owns an [`ItemsNotifier`], the items view holds the receiving
//! [`Subscription`] and applies the changes on its next frame.

use crate::geometry::Size;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use tracing::trace;

/// Size constraint along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Constraint {
    /// Any size.
    #[default]
    Unspecified,
    /// Exactly this size.
    Exactly(i32),
    /// At most this size.
    AtMost(i32),
}

impl Constraint {
    /// Resolves a desired size against the constraint.
    pub fn resolve(self, desired: i32) -> i32 {
        match self {
            Constraint::Unspecified => desired,
            Constraint::Exactly(size) => size,
            Constraint::AtMost(size) => desired.min(size),
        }
    }
}

/// Width and height constraints handed to [`ItemView::measure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasureSpec {
    /// Horizontal constraint.
    pub width: Constraint,
    /// Vertical constraint.
    pub height: Constraint,
}

impl MeasureSpec {
    /// No constraint on either axis.
    pub const UNSPECIFIED: MeasureSpec = MeasureSpec::new(Constraint::Unspecified, Constraint::Unspecified);

    /// Creates a spec.
    pub const fn new(width: Constraint, height: Constraint) -> Self {
        Self { width, height }
    }
}

/// A materialized item, group title or empty placeholder.
pub trait ItemView {
    /// Size this view wants under `spec`.
    fn measure(&self, spec: MeasureSpec) -> Size;
}

/// Index-based data source.
///
/// Group support is optional: an adapter reporting zero groups is laid out
/// as a single untitled group.
pub trait ItemsAdapter {
    /// View type produced for items, titles and the empty placeholder.
    type View: ItemView;

    /// Number of items.
    fn item_count(&self) -> usize;

    /// Produces the view for `index`, reusing `reuse` when possible.
    fn item_view(&mut self, index: usize, reuse: Option<Self::View>) -> Self::View;

    /// Placeholder shown while there are no items.
    fn empty_view(&mut self, _reuse: Option<Self::View>) -> Option<Self::View> {
        None
    }

    /// Number of groups, 0 when the adapter does not group its items.
    fn group_count(&self) -> usize {
        0
    }

    /// Number of items in `group`.
    fn group_size(&self, _group: usize) -> usize {
        0
    }

    /// Heading shown above `group`.
    fn group_title(&mut self, _group: usize, _reuse: Option<Self::View>) -> Option<Self::View> {
        None
    }

    /// Opens a change subscription. Adapters whose data never changes may
    /// return `None`.
    fn subscribe(&mut self) -> Option<Subscription> {
        None
    }

    /// Closes a subscription opened by [`ItemsAdapter::subscribe`].
    fn unsubscribe(&mut self, _id: SubscriptionId) {}
}

/// A change to the adapter's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsChange {
    /// `count` items were inserted at `at`.
    Added {
        /// Insertion index.
        at: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items starting at `at` were removed.
    Removed {
        /// First removed index.
        at: usize,
        /// Number of removed items.
        count: usize,
    },
    /// `count` items starting at `from` now start at `to`.
    Moved {
        /// First moved index before the move.
        from: usize,
        /// Number of moved items.
        count: usize,
        /// First moved index after the move.
        to: usize,
    },
    /// The content of `count` items starting at `at` changed.
    Modified {
        /// First modified index.
        at: usize,
        /// Number of modified items.
        count: usize,
    },
    /// Everything changed; there are now `count` items.
    Changed {
        /// New item count.
        count: usize,
    },
}

/// Identity of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of an adapter's change stream.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<ItemsChange>,
}

impl Subscription {
    /// Identity to pass back to [`ItemsAdapter::unsubscribe`].
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Takes every change sent so far, oldest first.
    pub fn drain(&self) -> Vec<ItemsChange> {
        let mut changes = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(change) => changes.push(change),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return changes,
            }
        }
    }
}

/// Sending side kept by adapters.
///
/// Subscribers whose receiver was dropped are pruned on the next send.
#[derive(Debug, Default)]
pub struct ItemsNotifier {
    senders: Vec<(SubscriptionId, Sender<ItemsChange>)>,
    next_id: u64,
}

impl ItemsNotifier {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a subscription.
    pub fn subscribe(&mut self) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.senders.push((id, sender));
        trace!(subscription = id.0, "items subscription opened");
        Subscription { id, receiver }
    }

    /// Closes a subscription. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.senders.len();
        self.senders.retain(|(sub, _)| *sub != id);
        self.senders.len() != before
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }

    /// Sends `change` to every subscriber.
    pub fn notify(&mut self, change: ItemsChange) {
        self.senders
            .retain(|(_, sender)| sender.send(change).is_ok());
    }

    /// Sends [`ItemsChange::Added`].
    pub fn added(&mut self, at: usize, count: usize) {
        self.notify(ItemsChange::Added { at, count });
    }

    /// Sends [`ItemsChange::Removed`].
    pub fn removed(&mut self, at: usize, count: usize) {
        self.notify(ItemsChange::Removed { at, count });
    }

    /// Sends [`ItemsChange::Moved`].
    pub fn moved(&mut self, from: usize, count: usize, to: usize) {
        self.notify(ItemsChange::Moved { from, count, to });
    }

    /// Sends [`ItemsChange::Modified`].
    pub fn modified(&mut self, at: usize, count: usize) {
        self.notify(ItemsChange::Modified { at, count });
    }

    /// Sends [`ItemsChange::Changed`].
    pub fn changed(&mut self, count: usize) {
        self.notify(ItemsChange::Changed { count });
    }
}
