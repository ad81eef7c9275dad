use alloc::vec::Vec;

use crate::geometry::Geometry;
use crate::{LayoutEntry, Span};

/// Places item `index` below the shortest column, given the entries of every earlier item.
///
/// The first `column_count` items fill the first row left to right. Every later item scans
/// `prior` backwards, keeping the most recent entry of each distinct column until all columns
/// have been seen, and lands under the one with the smallest `bottom`. On equal bottoms the
/// column met first in the backward scan wins.
pub fn place(
    index: usize,
    geometry: &Geometry,
    prior: &[LayoutEntry],
    height: u32,
    seen: &mut Vec<bool>,
) -> LayoutEntry {
    let cols = geometry.column_count.max(1);
    let height = height.max(1);
    if index < cols {
        return LayoutEntry::new(
            index,
            geometry.column_left(index),
            geometry.padding.top as u64,
            height,
        );
    }

    seen.clear();
    seen.resize(cols, false);
    let mut found = 0usize;
    let mut best: Option<(usize, u64)> = None;
    for entry in prior[..index.min(prior.len())].iter().rev() {
        let column = entry.column.min(cols - 1);
        if seen[column] {
            continue;
        }
        seen[column] = true;
        found += 1;
        match best {
            Some((_, bottom)) if entry.bottom >= bottom => {}
            _ => best = Some((column, entry.bottom)),
        }
        if found == cols {
            break;
        }
    }

    let (column, bottom) = best.unwrap_or((0, geometry.padding.top as u64));
    let top = bottom.saturating_add(geometry.spacing.rows as u64);
    LayoutEntry::new(column, geometry.column_left(column), top, height)
}

/// Layout entries for every cached record, in index order.
///
/// Besides the entries this keeps `reach[i]`, the largest `bottom` among entries `0..=i`, so
/// viewport lookups are binary searches rather than scans.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    entries: Vec<LayoutEntry>,
    reach: Vec<u64>,
    seen: Vec<bool>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LayoutEntry> {
        self.entries.get(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.reach.clear();
    }

    /// Recomputes entries `start..count`, keeping `0..start` untouched.
    ///
    /// Returns `false` (and changes nothing) when `start` lies beyond the resolved entries:
    /// there is no prior history to place from.
    pub fn relayout_from(
        &mut self,
        start: usize,
        count: usize,
        geometry: &Geometry,
        mut height_of: impl FnMut(usize) -> u32,
    ) -> bool {
        if start > self.entries.len() || start > count {
            return false;
        }
        self.entries.truncate(start);
        self.reach.truncate(start);
        self.entries.reserve(count - start);
        self.reach.reserve(count - start);

        for index in start..count {
            let entry = place(
                index,
                geometry,
                &self.entries,
                height_of(index),
                &mut self.seen,
            );
            let prev = self.reach.last().copied().unwrap_or(0);
            self.reach.push(prev.max(entry.bottom));
            self.entries.push(entry);
        }
        true
    }

    /// Largest `bottom` over all entries.
    pub fn content_bottom(&self) -> u64 {
        self.reach.last().copied().unwrap_or(0)
    }

    /// Inclusive range of indexes that may intersect `span`; `None` when none can.
    ///
    /// Tops never decrease with the index (each item lands on the current shortest column),
    /// and `reach` never decreases by construction, so both ends are binary searches.
    /// Entries inside the returned range can still miss the span; use [`Self::intersects`].
    pub fn candidates(&self, span: Span) -> Option<(usize, usize)> {
        if span.is_empty() || self.entries.is_empty() {
            return None;
        }
        let first = self.reach.partition_point(|&r| r <= span.top);
        let end = self.entries.partition_point(|e| e.top < span.bottom);
        (first < end).then(|| (first, end - 1))
    }

    pub fn intersects(&self, index: usize, span: Span) -> bool {
        self.entries
            .get(index)
            .is_some_and(|e| span.intersects(e.top, e.bottom))
    }

    /// Index of the first entry intersecting `span`.
    pub fn first_visible(&self, span: Span) -> Option<usize> {
        let (first, last) = self.candidates(span)?;
        (first..=last).find(|&i| self.intersects(i, span))
    }
}
