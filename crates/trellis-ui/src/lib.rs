//! # trellis-ui
//!
//! Virtualized collection views over the `trellis-core` host surface.
//!
//! The centerpiece is [`collection::CollectionView`], a façade composing:
//!
//! - an identity-map controller ([`ids::ListController`] or
//!   [`tree::TreeController`]) that owns the index↔id mapping,
//! - a [`virtualization::VirtualizationController`] recycling a bounded row
//!   pool across a fixed- or dynamic-height layout,
//! - a [`selection::SelectionTracker`] whose source of truth is stable item
//!   ids, not indices,
//! - an optional [`reorder::ReorderController`] for drag-and-drop row moves,
//! - [`scroll::ScrollState`] for clamped/elastic scrolling with inertia.
//!
//! [`list::ListView`] and [`treeview::TreeView`] are the typed entry points.

pub mod collection;
pub mod ids;
pub mod list;
pub mod reorder;
pub mod scroll;
pub mod selection;
pub mod style;
pub mod tree;
pub mod treeview;
pub mod virtualization;

pub use collection::*;
pub use ids::*;
pub use list::*;
pub use reorder::*;
pub use scroll::*;
pub use selection::*;
pub use style::*;
pub use tree::*;
pub use treeview::*;
pub use virtualization::*;
