use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::meta::{shift_insert, shift_move, shift_remove};
use crate::solver::Layout;
use crate::view::ItemView;
use crate::{ScrollDirection, Span, Window};

/// How the bound views sit relative to the viewport in one reconciliation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Census {
    /// First and last index whose entry intersects the viewport.
    pub(crate) first: usize,
    pub(crate) last: usize,
    /// Every intersecting index has a view.
    pub(crate) covered: bool,
    /// Bound views directly before `first`, counted backwards until the first unbound index.
    pub(crate) before: usize,
    /// Bound views after `last`.
    pub(crate) after: usize,
}

impl Census {
    pub(crate) fn buffered(&self) -> usize {
        self.before + self.after
    }
}

/// The bounded set of item views plus the slot <-> index table.
#[derive(Clone, Debug, Default)]
pub struct ItemPool {
    views: Vec<ItemView>,
    by_index: BTreeMap<usize, usize>,
}

impl ItemPool {
    pub fn capacity(&self) -> usize {
        self.views.len()
    }

    pub fn views(&self) -> &[ItemView] {
        &self.views
    }

    pub fn view(&self, slot: usize) -> Option<&ItemView> {
        self.views.get(slot)
    }

    pub(crate) fn view_mut(&mut self, slot: usize) -> Option<&mut ItemView> {
        self.views.get_mut(slot)
    }

    /// Slot of the view bound to `index`.
    pub fn slot_of(&self, index: usize) -> Option<usize> {
        self.by_index.get(&index).copied()
    }

    pub fn bound_index(&self, slot: usize) -> Option<usize> {
        self.views.get(slot).and_then(ItemView::bound_index)
    }

    pub fn bound_count(&self) -> usize {
        self.by_index.len()
    }

    pub(crate) fn free_count(&self) -> usize {
        self.views.len() - self.by_index.len()
    }

    /// Bound `(index, slot)` pairs in index order.
    pub fn bindings(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_index.iter().map(|(&i, &s)| (i, s))
    }

    pub fn window(&self) -> Option<Window> {
        let (&min_index, _) = self.by_index.first_key_value()?;
        let (&max_index, _) = self.by_index.last_key_value()?;
        Some(Window {
            min_index,
            max_index,
        })
    }

    pub(crate) fn free_slot(&self) -> Option<usize> {
        self.views.iter().position(|v| !v.is_bound())
    }

    pub(crate) fn bind(&mut self, slot: usize, index: usize) {
        debug_assert!(
            !self.by_index.contains_key(&index),
            "index {index} is already bound"
        );
        if let Some(view) = self.views.get_mut(slot) {
            if let Some(prev) = view.bound_index() {
                self.by_index.remove(&prev);
            }
            view.bind(index);
            self.by_index.insert(index, slot);
        }
    }

    pub(crate) fn unbind(&mut self, slot: usize) -> Option<usize> {
        let index = self.views.get_mut(slot)?.unbind()?;
        self.by_index.remove(&index);
        Some(index)
    }

    /// Grows or shrinks the pool. Views dropped while bound are released first.
    pub(crate) fn resize(&mut self, capacity: usize) {
        if capacity < self.views.len() {
            for slot in capacity..self.views.len() {
                self.unbind(slot);
            }
            self.views.truncate(capacity);
        } else {
            let start = self.views.len();
            self.views.extend((start..capacity).map(ItemView::new));
        }
    }

    /// Record at `index` was removed: views bound past it move down by one.
    pub(crate) fn on_remove(&mut self, index: usize) {
        debug_assert!(!self.by_index.contains_key(&index));
        shift_remove(&mut self.by_index, index);
        self.sync_views();
    }

    /// A record was inserted at `index`: views bound at or past it move up by one.
    pub(crate) fn on_insert(&mut self, index: usize) {
        shift_insert(&mut self.by_index, index);
        self.sync_views();
    }

    /// The record at `from` moved to `to`.
    pub(crate) fn on_move(&mut self, from: usize, to: usize) {
        shift_move(&mut self.by_index, from, to);
        self.sync_views();
    }

    fn sync_views(&mut self) {
        for (&index, &slot) in &self.by_index {
            if let Some(view) = self.views.get_mut(slot) {
                view.rebind_index(index);
            }
        }
    }

    /// Classifies the bound views against `span`.
    pub(crate) fn census(&self, layout: &Layout, span: Span) -> Option<Census> {
        let (lo, hi) = layout.candidates(span)?;
        let first = (lo..=hi).find(|&i| layout.intersects(i, span))?;
        let last = (first..=hi).rev().find(|&i| layout.intersects(i, span))?;
        let covered = (first..=last)
            .all(|i| self.by_index.contains_key(&i) || !layout.intersects(i, span));

        // Stops at the first gap: views bound further back are not useful for extending.
        let mut before = 0usize;
        let mut i = first;
        while i > 0 && self.by_index.contains_key(&(i - 1)) {
            before += 1;
            i -= 1;
        }
        let after = self.by_index.range(last + 1..).count();

        Some(Census {
            first,
            last,
            covered,
            before,
            after,
        })
    }
}

/// Chooses the half-open index range the pool should cover.
///
/// The on-screen run `first..=last` is always included. The remaining capacity is split
/// between both sides: one third trails and two thirds lead when a direction is known, half
/// and half otherwise, with at least one row of `columns` on each side when there is room.
/// Capacity that would fall outside `0..len` is moved to the other side.
pub(crate) fn plan_window(
    first: usize,
    last: usize,
    direction: Option<ScrollDirection>,
    capacity: usize,
    columns: usize,
    len: usize,
) -> (usize, usize) {
    if len == 0 || capacity == 0 {
        return (0, 0);
    }
    let first = first.min(len - 1);
    let last = last.clamp(first, len - 1);
    let on_screen = last - first + 1;
    if on_screen >= capacity {
        return (first, first + capacity);
    }

    let spare = capacity - on_screen;
    let row = columns.min(spare / 2);
    let trail = match direction {
        Some(_) => spare / 3,
        None => spare / 2,
    }
    .max(row);
    let lead = spare - trail;
    let (before, after) = match direction {
        Some(ScrollDirection::Backward) => (lead, trail),
        _ => (trail, lead),
    };

    let start = first.saturating_sub(before);
    let unused_before = before - (first - start);
    let mut end = (last + 1)
        .saturating_add(after)
        .saturating_add(unused_before);
    let mut start = start;
    if end > len {
        let over = end - len;
        end = len;
        start = start.saturating_sub(over);
    }
    (start, end)
}
