use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use crate::error::FetchError;
use crate::geometry::Geometry;
use crate::solver::Layout;

/// A record shown by the grid.
///
/// Both hooks are optional layout hints; records that return `None` are sized by the grid
/// options.
pub trait Record {
    fn explicit_height(&self) -> Option<u32> {
        None
    }

    fn explicit_aspect_ratio(&self) -> Option<f32> {
        None
    }
}

macro_rules! plain_record {
    ($($t:ty),* $(,)?) => {
        $(impl Record for $t {})*
    };
}

plain_record!(u8, u16, u32, u64, usize, i32, i64, String, &'static str);

/// A page the data source has not produced yet.
pub type PageFuture<R> = Pin<Box<dyn Future<Output = Result<Vec<R>, FetchError>>>>;

/// What a data source returns for a page request.
pub enum Fetch<R> {
    Ready(Result<Vec<R>, FetchError>),
    Pending(PageFuture<R>),
}

impl<R> Fetch<R> {
    pub fn ready(records: Vec<R>) -> Self {
        Self::Ready(Ok(records))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Ready(Err(FetchError::new(message)))
    }

    pub fn pending(future: impl Future<Output = Result<Vec<R>, FetchError>> + 'static) -> Self {
        Self::Pending(Box::pin(future))
    }
}

impl<R> core::fmt::Debug for Fetch<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ready(Ok(records)) => f.debug_tuple("Ready").field(&records.len()).finish(),
            Self::Ready(Err(e)) => f.debug_tuple("Ready").field(e).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Supplies records page by page.
///
/// `start` counts the records this source has delivered so far. Returning fewer than `count`
/// records signals that the source is exhausted.
pub trait DataSource<R> {
    fn fetch(&mut self, start: usize, count: usize) -> Fetch<R>;
}

impl<R, F> DataSource<R> for F
where
    F: FnMut(usize, usize) -> Fetch<R>,
{
    fn fetch(&mut self, start: usize, count: usize) -> Fetch<R> {
        self(start, count)
    }
}

/// A page request whose result is still pending.
pub(crate) struct InFlight<R> {
    pub(crate) start: usize,
    pub(crate) count: usize,
    future: PageFuture<R>,
}

impl<R> InFlight<R> {
    pub(crate) fn new(start: usize, count: usize, future: PageFuture<R>) -> Self {
        Self {
            start,
            count,
            future,
        }
    }

    pub(crate) fn poll(&mut self, cx: &mut Context<'_>) -> Poll<Result<Vec<R>, FetchError>> {
        self.future.as_mut().poll(cx)
    }
}

/// Every loaded record plus its resolved layout.
///
/// Grows by whole pages; entries are edited in place on resize, insert, delete and reorder.
pub struct DataCache<R> {
    records: Vec<R>,
    measured: Vec<Option<u32>>,
    layout: Layout,
    fetched: usize,
    end_of_data: bool,
    stalled: bool,
}

impl<R> Default for DataCache<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            measured: Vec::new(),
            layout: Layout::new(),
            fetched: 0,
            end_of_data: false,
            stalled: false,
        }
    }
}

impl<R> DataCache<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.records.get(index)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether the source reported that no records follow the cached ones.
    pub fn end_of_data(&self) -> bool {
        self.end_of_data
    }

    /// Whether the last page request failed. No automatic fetch is issued until a later
    /// successful load clears it.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Records delivered by the data source so far.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    pub fn measured(&self, index: usize) -> Option<u32> {
        self.measured.get(index).copied().flatten()
    }

    /// Replaces everything with a complete dataset.
    pub(crate) fn replace(&mut self, records: Vec<R>) {
        self.measured.clear();
        self.measured.resize(records.len(), None);
        self.fetched = records.len();
        self.records = records;
        self.layout.clear();
        self.end_of_data = true;
        self.stalled = false;
    }

    /// Empties the cache so pages are fetched again from the start.
    pub(crate) fn reset(&mut self) {
        self.records.clear();
        self.measured.clear();
        self.layout.clear();
        self.fetched = 0;
        self.end_of_data = false;
        self.stalled = false;
    }

    /// Whether indexes up to `index` need a page from the source.
    pub(crate) fn needs_fetch(&self, index: usize) -> bool {
        index >= self.records.len() && !self.end_of_data && !self.stalled
    }

    /// Appends a fetched page. Returns `true` when the page was short (end of data).
    pub(crate) fn append_page(&mut self, page: Vec<R>, requested: usize) -> bool {
        let got = page.len();
        self.fetched = self.fetched.saturating_add(got);
        self.measured.extend(core::iter::repeat_n(None, got));
        self.records.extend(page);
        self.stalled = false;
        if got < requested {
            self.end_of_data = true;
        }
        self.end_of_data
    }

    pub(crate) fn mark_stalled(&mut self) {
        self.stalled = true;
    }

    pub(crate) fn clear_stall(&mut self) {
        self.stalled = false;
    }

    pub(crate) fn insert_front(&mut self, record: R) {
        self.records.insert(0, record);
        self.measured.insert(0, None);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<R> {
        if index >= self.records.len() {
            return None;
        }
        self.measured.remove(index);
        Some(self.records.remove(index))
    }

    /// Moves the record at `from` to `to` (remove then insert).
    pub(crate) fn move_record(&mut self, from: usize, to: usize) -> bool {
        let len = self.records.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let record = self.records.remove(from);
        self.records.insert(to, record);
        let measured = self.measured.remove(from);
        self.measured.insert(to, measured);
        true
    }

    /// Stores a measured content height; returns whether it changed.
    pub(crate) fn set_measured(&mut self, index: usize, height: u32) -> bool {
        match self.measured.get_mut(index) {
            Some(slot) if *slot != Some(height) => {
                *slot = Some(height);
                true
            }
            _ => false,
        }
    }

    /// Re-places every record from `start` onward. `height` resolves a record's height from
    /// the record and its measured content height.
    pub(crate) fn relayout_from(
        &mut self,
        start: usize,
        geometry: &Geometry,
        mut height: impl FnMut(&R, Option<u32>) -> u32,
    ) -> bool {
        let records = &self.records;
        let measured = &self.measured;
        self.layout
            .relayout_from(start, records.len(), geometry, |i| height(&records[i], measured[i]))
    }
}
