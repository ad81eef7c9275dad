//! A headless, windowed masonry grid engine.
//!
//! For frame-level utilities (animated view rects, a host-loop controller), see the
//! `masonry-grid-adapter` crate.
//!
//! The grid lays out variable-height items in equal-width columns, placing each item under the
//! currently shortest column. Only a bounded pool of item views exists at any time; views are
//! rebound to records as the viewport moves, and records are pulled page by page from a data
//! source when the window runs past the cache.
//!
//! It is UI-agnostic and performs no IO. A UI layer is expected to provide:
//! - the container and scroller rectangles (a viewport query)
//! - a content binder that fills an [`ItemView`] from a record
//! - scroll, resize and pointer signals, plus periodic [`Grid::tick`] calls
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod drag;
mod error;
mod events;
mod geometry;
mod grid;
mod meta;
mod options;
mod pool;
mod solver;
mod state;
mod timer;
mod types;
mod view;


pub use cache::{DataCache, DataSource, Fetch, PageFuture, Record};
pub use error::{ConfigError, FetchError, GridError};
pub use events::{GridEvent, ViewHook};
pub use geometry::Geometry;
pub use grid::Grid;
pub use meta::MetaStore;
pub use options::{
    AUTO_COLUMN_CAP, Animation, Columns, ContainerHeight, ContentBinder, Easing, GridOptions,
    HeightResolver, ItemHeight, OnEventCallback, ViewHookCallback, ViewportQuery,
};
pub use pool::ItemPool;
pub use solver::{Layout, place};
pub use state::GridState;
pub use types::{
    Bounds, ItemRect, LayoutEntry, Padding, Point, ScrollDirection, Spacing, Span, Viewport,
    Window,
};
pub use view::ItemView;
