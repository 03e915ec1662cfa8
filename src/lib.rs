//! scrollcell
//!
//! Momentum scrolling, gesture arbitration and cell virtualization for very
//! large item collections.
//!
//! The crate follows a Pure Core / Impure Shell layout. Everything under
//! [`gesture`], [`scroll`] and [`items`] is deterministic: time comes from a
//! [`scheduler::Clock`] and delayed work sits in a [`scheduler::TaskQueue`]
//! the host drains once per frame. [`host`] is the shell that drives the
//! engine from a crossterm terminal and draws it with ratatui.

pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod items;
pub mod logging;
pub mod scheduler;
pub mod scroll;
