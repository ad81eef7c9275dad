use crate::ItemRect;

/// One recyclable visual slot.
///
/// A view is bound to at most one logical index at a time. Unbound views render nothing and
/// are ignored by windowing. The host renders from [`ItemView::rect`] and the flags; the engine
/// owns every field except the content height reported by the binder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemView {
    slot: usize,
    bound: Option<usize>,
    rect: ItemRect,
    visible: bool,
    centered: bool,
    selected: bool,
    dragging: bool,
    transition_until: Option<u64>,
    content_height: Option<u32>,
}

impl ItemView {
    pub(crate) fn new(slot: usize) -> Self {
        Self {
            slot,
            bound: None,
            rect: ItemRect::default(),
            visible: false,
            centered: false,
            selected: false,
            dragging: false,
            transition_until: None,
            content_height: None,
        }
    }

    /// Stable pool slot id.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Logical index this view shows, if any.
    pub fn bound_index(&self) -> Option<usize> {
        self.bound
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub fn rect(&self) -> ItemRect {
        self.rect
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether the view is animating towards its current rect.
    pub fn in_transition(&self) -> bool {
        self.transition_until.is_some()
    }

    pub fn transition_until(&self) -> Option<u64> {
        self.transition_until
    }

    /// Content height measured by the binder, if it reported one.
    pub fn content_height(&self) -> Option<u32> {
        self.content_height
    }

    /// Reports the natural height of the content the binder just rendered.
    ///
    /// Used for records whose height is not otherwise determined by the options.
    pub fn set_content_height(&mut self, height: u32) {
        self.content_height = Some(height);
    }

    pub(crate) fn bind(&mut self, index: usize) {
        self.bound = Some(index);
        self.visible = false;
        self.centered = false;
        self.selected = false;
        self.content_height = None;
    }

    pub(crate) fn unbind(&mut self) -> Option<usize> {
        self.visible = false;
        self.centered = false;
        self.selected = false;
        self.dragging = false;
        self.transition_until = None;
        self.content_height = None;
        self.bound.take()
    }

    pub(crate) fn rebind_index(&mut self, index: usize) {
        self.bound = Some(index);
    }

    /// Moves the view; returns `(moved, resized)`.
    pub(crate) fn place(&mut self, rect: ItemRect) -> (bool, bool) {
        let moved = rect.x != self.rect.x || rect.y != self.rect.y;
        let resized = rect.width != self.rect.width || rect.height != self.rect.height;
        self.rect = rect;
        (moved, resized)
    }

    pub(crate) fn set_visible(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }

    pub(crate) fn set_centered(&mut self, centered: bool) -> bool {
        let changed = self.centered != centered;
        self.centered = centered;
        changed
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub(crate) fn start_transition(&mut self, until: u64) {
        self.transition_until = Some(until);
    }

    /// Ends the transition if it is due; returns whether it ended.
    pub(crate) fn settle(&mut self, now_ms: u64) -> bool {
        match self.transition_until {
            Some(until) if now_ms >= until => {
                self.transition_until = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn end_transition(&mut self) {
        self.transition_until = None;
    }
}
