//! # trellis-core
//!
//! The host-engine surface trellis collection views are layered on:
//!
//! - [`element::ElementTree`] — a retained tree of positionable, stylable
//!   elements (add/remove/reparent, class lists, assigned layout rects).
//! - [`events::Dispatcher`] — pointer/keyboard dispatch with trickle/bubble
//!   phases, stop-propagation, and exclusive pointer capture.
//! - [`schedule::Scheduler`] — a virtual-clock deferred task queue; all
//!   "later" work is cooperative re-entry into the frame tick.
//! - [`viewdata::ViewDataStore`] — the persisted key/value blob views use to
//!   restore selection, scroll position and expansion across rebuilds.
//! - [`observers::Observers`] — ordered observer lists with defined
//!   re-entrancy behavior, owned by view façades for their public events.
//!
//! Everything here is single-threaded and event/tick driven. There are no
//! locks, no timers and no async: the host calls in, work completes
//! synchronously, and deferred work waits for the next tick.

pub mod element;
pub mod error;
pub mod events;
pub mod geometry;
pub mod input;
pub mod observers;
pub mod schedule;
pub mod tests;
pub mod viewdata;

pub use element::*;
pub use error::*;
pub use events::*;
pub use geometry::*;
pub use input::*;
pub use observers::*;
pub use schedule::*;
pub use viewdata::*;
