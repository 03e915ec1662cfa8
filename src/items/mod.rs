//! Virtualized item grid.
//!
//! An [`ItemsAdapter`] supplies item views and announces data changes
//! through an [`ItemsNotifier`]. [`ItemsView`] lays the items out in a grid
//! of optionally titled groups, materializes only the cells in and around
//! the viewport and recycles their containers as they scroll away.

pub mod adapter;
mod cell;
pub mod grid;
mod pool;
pub mod row_index;
pub mod view;

pub use adapter::{
    Constraint, ItemView, ItemsAdapter, ItemsChange, ItemsNotifier, MeasureSpec, Subscription,
    SubscriptionId,
};
pub use cell::{ItemTransform, Visibility};
pub use grid::{ColumnMetrics, Padding};
pub use pool::ContainerId;
pub use row_index::RowIndex;
pub use view::{Drawable, DrawableKind, ItemEvent, ItemsView};
