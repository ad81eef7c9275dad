use crate::error::FetchError;
use crate::{ScrollDirection, Window};

/// Per-view rendering hooks, delivered synchronously to `GridOptions::on_view`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewHook {
    /// The view was bound to a record and its content populated.
    Load,
    Resize,
    Reposition,
    /// The view is being torn down (rebuild or destroy).
    Destroy,
}

/// Lifecycle notifications delivered to `GridOptions::on_event`.
///
/// Notifications produced by an operation are delivered only after the grid has left the
/// `Building` state, in the order they were produced.
#[derive(Clone, Debug, PartialEq)]
pub enum GridEvent<R> {
    /// The first page is laid out and bound.
    Ready,
    Resize {
        column_count: usize,
        item_width: u32,
    },
    /// Column geometry was (re)computed.
    SizeCalc {
        column_count: usize,
        item_width: u32,
        left_offset: u32,
    },
    Scroll {
        offset: i64,
        direction: Option<ScrollDirection>,
    },
    ScrollEnd {
        offset: i64,
    },
    DirectionChange {
        direction: ScrollDirection,
    },
    /// The window starts moving; a page fetch may follow.
    DataLoadStart {
        direction: ScrollDirection,
    },
    DataLoadEnd {
        direction: ScrollDirection,
        window: Option<Window>,
    },
    /// A page request to the data source failed.
    LoadError {
        start: usize,
        error: FetchError,
    },
    BeginOfData,
    EndOfData {
        len: usize,
    },
    /// A view was bound to `index`.
    ItemEnter {
        index: usize,
        slot: usize,
    },
    /// A view was released from `index`.
    ItemExit {
        index: usize,
        slot: usize,
    },
    /// The binder populated the view for `index`.
    ItemLoaded {
        index: usize,
        slot: usize,
    },
    ItemVisibility {
        index: usize,
        slot: usize,
        visible: bool,
    },
    ItemCenterEnter {
        index: usize,
        slot: usize,
    },
    ItemCenterExit {
        index: usize,
        slot: usize,
    },
    ItemClick {
        index: usize,
        slot: usize,
    },
    ItemDoubleClick {
        index: usize,
        slot: usize,
    },
    ItemContextMenu {
        index: usize,
        slot: usize,
    },
    ItemInsert {
        index: usize,
    },
    ItemDelete {
        index: usize,
        record: R,
    },
    SortStart {
        index: usize,
        slot: usize,
    },
    SortEnd {
        from: usize,
        to: usize,
    },
}
