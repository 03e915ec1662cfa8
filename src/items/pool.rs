//! Container pool.
//!
//! A container holds one materialized view and remembers which cell it is
//! bound to. Containers outlive their cells: when a cell scrolls away its
//! container can be rebound to another cell, and the old view is handed to
//! the adapter for reuse.

use crate::geometry::Rect;

/// Identity of a pooled container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(usize);

#[derive(Debug)]
struct Container<V> {
    view: Option<V>,
    owner: Option<usize>,
    frame: Option<Rect>,
    shown: bool,
}

/// Every container created so far, filled or free.
#[derive(Debug)]
pub(crate) struct ContainerPool<V> {
    containers: Vec<Container<V>>,
}

impl<V> Default for ContainerPool<V> {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
        }
    }
}

impl<V> ContainerPool<V> {
    /// Binds a container to `owner`.
    ///
    /// Prefers a filled container whose current owner `may_take` allows,
    /// then a free one, then a new one. Returns the container and the owner
    /// it was taken from.
    pub(crate) fn bind(
        &mut self,
        owner: usize,
        may_take: impl Fn(usize) -> bool,
    ) -> (ContainerId, Option<usize>) {
        let taken = self
            .containers
            .iter()
            .position(|c| c.owner.is_some_and(|o| o != owner && may_take(o)));
        let slot = taken.or_else(|| self.containers.iter().position(|c| c.owner.is_none()));
        let slot = match slot {
            Some(slot) => slot,
            None => {
                self.containers.push(Container {
                    view: None,
                    owner: None,
                    frame: None,
                    shown: false,
                });
                self.containers.len() - 1
            }
        };
        let container = &mut self.containers[slot];
        let previous = container.owner.replace(owner);
        container.frame = None;
        (ContainerId(slot), previous)
    }

    /// Detaches a container from its owner. The view is kept for reuse.
    pub(crate) fn release(&mut self, id: ContainerId) {
        let container = &mut self.containers[id.0];
        container.owner = None;
        container.shown = false;
        container.frame = None;
    }

    #[cfg(test)]
    pub(crate) fn owner(&self, id: ContainerId) -> Option<usize> {
        self.containers[id.0].owner
    }

    /// Rebinds after the owning cell changed position.
    pub(crate) fn set_owner(&mut self, id: ContainerId, owner: usize) {
        self.containers[id.0].owner = Some(owner);
    }

    pub(crate) fn view(&self, id: ContainerId) -> Option<&V> {
        self.containers[id.0].view.as_ref()
    }

    pub(crate) fn take_view(&mut self, id: ContainerId) -> Option<V> {
        self.containers[id.0].view.take()
    }

    pub(crate) fn put_view(&mut self, id: ContainerId, view: V) {
        self.containers[id.0].view = Some(view);
    }

    pub(crate) fn set_frame(&mut self, id: ContainerId, frame: Rect) {
        self.containers[id.0].frame = Some(frame);
    }

    pub(crate) fn frame(&self, id: ContainerId) -> Option<Rect> {
        self.containers[id.0].frame
    }

    pub(crate) fn set_shown(&mut self, id: ContainerId, shown: bool) {
        self.containers[id.0].shown = shown;
    }

    pub(crate) fn is_shown(&self, id: ContainerId) -> bool {
        self.containers[id.0].shown
    }

    /// Filled containers with their owners.
    pub(crate) fn filled(&self) -> impl Iterator<Item = (ContainerId, usize)> + '_ {
        self.containers
            .iter()
            .enumerate()
            .filter_map(|(slot, c)| c.owner.map(|owner| (ContainerId(slot), owner)))
    }

    /// Containers created so far.
    pub(crate) fn len(&self) -> usize {
        self.containers.len()
    }
}
