use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec;
use alloc::vec::Vec;
use core::mem;
use core::task::{Context, Poll, Waker};

use crate::cache::{DataCache, DataSource, Fetch, InFlight, Record};
use crate::drag::{DragSession, DropCandidate, swap_target};
use crate::error::{ConfigError, FetchError, GridError};
use crate::events::{GridEvent, ViewHook};
use crate::geometry::Geometry;
use crate::meta::{MetaStore, shift_insert, shift_move, shift_remove};
use crate::options::{ContainerHeight, ContentBinder, GridOptions, ViewportQuery};
use crate::pool::{ItemPool, plan_window};
use crate::state::{GridState, StateMachine};
use crate::timer::Timer;
use crate::view::ItemView;
use crate::{ItemRect, LayoutEntry, Point, ScrollDirection, Span, Window};

/// Operations requested while the grid could not run them. Replayed in order once it is back
/// in `Normal`.
enum Deferred<R> {
    Insert(R),
    Remove(usize),
    Reorder(usize, usize),
    Relayout(usize),
    Load(Vec<R>),
    Refresh,
    Resize,
    Reload,
    Rebuild(Box<GridOptions<R>>),
}

/// A virtualized masonry grid.
///
/// The grid owns the record cache, the resolved layout and a bounded pool of item views. It
/// performs no IO and owns no clock: the host forwards scroll, resize and pointer signals with
/// a timestamp, and calls [`Grid::tick`] to let debounces, animations and pending page fetches
/// progress.
///
/// Every mutating operation runs inside [`GridState::Building`]. Notifications produced while
/// building are queued and handed to `GridOptions::on_event` once the grid has settled.
pub struct Grid<R> {
    options: GridOptions<R>,
    binder: ContentBinder<R>,
    viewport: ViewportQuery,
    geometry: Geometry,

    cache: DataCache<R>,
    pool: ItemPool,
    meta: MetaStore,
    selection: BTreeMap<usize, ()>,
    state: StateMachine,

    source: Option<Box<dyn DataSource<R>>>,
    in_flight: Option<InFlight<R>>,
    pending_load: Option<ScrollDirection>,
    last_error: Option<FetchError>,

    events: VecDeque<GridEvent<R>>,
    settle_events: Vec<GridEvent<R>>,
    deferred: VecDeque<Deferred<R>>,

    drag: DragSession,
    resize_timer: Timer,
    scroll_end_timer: Timer,
    settle_timer: Timer,
    now_ms: u64,

    last_offset: Option<i64>,
    direction: Option<ScrollDirection>,
    scroll_request: Option<u64>,
    reconcile_pending: bool,

    ready: bool,
    at_begin: bool,
    at_end: bool,
    degraded_logged: bool,
}

impl<R: Record> Grid<R> {
    /// Creates an empty grid. Records arrive later through [`Grid::load`] or
    /// [`Grid::insert`].
    pub fn new(options: GridOptions<R>) -> Result<Self, ConfigError> {
        Self::build(options, None, Vec::new())
    }

    /// Creates a grid over a complete, already loaded dataset.
    pub fn with_records(options: GridOptions<R>, records: Vec<R>) -> Result<Self, ConfigError> {
        Self::build(options, None, records)
    }

    /// Creates a grid that pulls records page by page from `source`.
    pub fn with_source(
        options: GridOptions<R>,
        source: impl DataSource<R> + 'static,
    ) -> Result<Self, ConfigError> {
        Self::build(options, Some(Box::new(source)), Vec::new())
    }

    fn build(
        options: GridOptions<R>,
        source: Option<Box<dyn DataSource<R>>>,
        records: Vec<R>,
    ) -> Result<Self, ConfigError> {
        let (binder, viewport) = options.validate()?;
        let mut cache = DataCache::default();
        if source.is_none() {
            cache.replace(records);
        }
        let mut grid = Self {
            options,
            binder,
            viewport,
            geometry: Geometry::default(),
            cache,
            pool: ItemPool::default(),
            meta: MetaStore::new(),
            selection: BTreeMap::new(),
            state: StateMachine::default(),
            source,
            in_flight: None,
            pending_load: None,
            last_error: None,
            events: VecDeque::new(),
            settle_events: Vec::new(),
            deferred: VecDeque::new(),
            drag: DragSession::default(),
            resize_timer: Timer::default(),
            scroll_end_timer: Timer::default(),
            settle_timer: Timer::default(),
            now_ms: 0,
            last_offset: None,
            direction: None,
            scroll_request: None,
            reconcile_pending: false,
            ready: false,
            at_begin: true,
            at_end: false,
            degraded_logged: false,
        };
        grid.initialize();
        Ok(grid)
    }

    /// Computes geometry, sizes the pool and runs the first window load.
    fn initialize(&mut self) {
        let viewport = (self.viewport)();
        self.last_offset = Some(viewport.scroll_offset());
        let width = viewport.container_width();
        if width == 0 {
            gdebug!("container has no width; starting hidden");
            self.state.settle_to(GridState::Hidden);
            return;
        }
        self.apply_geometry(width);
        self.relayout_from(0);
        if let Err(_err) = self.load_window(ScrollDirection::Forward) {
            gwarn!(error = %_err, "initial load failed");
        }
        self.flush_events();
    }

    pub fn options(&self) -> &GridOptions<R> {
        &self.options
    }

    pub fn state(&self) -> GridState {
        self.state.state()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn records(&self) -> &[R] {
        self.cache.records()
    }

    pub fn record(&self, index: usize) -> Option<&R> {
        self.cache.get(index)
    }

    pub fn cache(&self) -> &DataCache<R> {
        &self.cache
    }

    pub fn layout_entries(&self) -> &[LayoutEntry] {
        self.cache.layout().entries()
    }

    pub fn layout_entry(&self, index: usize) -> Option<&LayoutEntry> {
        self.cache.layout().get(index)
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    pub fn items(&self) -> &[ItemView] {
        self.pool.views()
    }

    pub fn item(&self, slot: usize) -> Option<&ItemView> {
        self.pool.view(slot)
    }

    /// View currently bound to `index`.
    pub fn item_for_index(&self, index: usize) -> Option<&ItemView> {
        self.pool.slot_of(index).and_then(|slot| self.pool.view(slot))
    }

    /// Inclusive index range the pool currently covers.
    pub fn window(&self) -> Option<Window> {
        self.pool.window()
    }

    /// Last scroll direction observed.
    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    /// Scroll offset the grid wants the host to apply, e.g. to keep the first visible item
    /// in place after a resize. Cleared by the next [`Grid::on_scroll`].
    pub fn scroll_request(&self) -> Option<u64> {
        self.scroll_request
    }

    pub fn take_scroll_request(&mut self) -> Option<u64> {
        self.scroll_request.take()
    }

    /// Height the container should take.
    pub fn content_height(&self) -> u64 {
        match self.options.container_height {
            ContainerHeight::Fixed(height) => height as u64,
            ContainerHeight::Auto => {
                let padding = self.geometry.padding;
                self.cache.layout().content_bottom().max(padding.top as u64)
                    + padding.bottom as u64
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether the data source reported its last record.
    pub fn is_end_of_data(&self) -> bool {
        self.cache.end_of_data()
    }

    /// Whether a drag session (pressed or armed) is running.
    pub fn is_dragging(&self) -> bool {
        !self.drag.is_idle()
    }

    /// Whether a page fetch is pending.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Error of the last failed page request, until a later page succeeds.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn meta(&self) -> &MetaStore {
        &self.meta
    }

    /// Per-record metadata. Entries follow their record through inserts, deletes and reorders.
    pub fn meta_mut(&mut self) -> &mut MetaStore {
        &mut self.meta
    }

    /// The scroller moved.
    pub fn on_scroll(&mut self, now_ms: u64) -> Result<(), GridError> {
        self.now_ms = now_ms;
        self.scroll_request = None;
        let offset = (self.viewport)().scroll_offset();
        let direction = self
            .last_offset
            .and_then(|prev| ScrollDirection::from_delta(prev, offset));
        self.last_offset = Some(offset);
        if let Some(direction) = direction {
            if self.direction.is_some_and(|d| d != direction) {
                self.emit(GridEvent::DirectionChange { direction });
            }
            self.direction = Some(direction);
        }
        gtrace!(offset, ?direction, "scroll");
        self.emit(GridEvent::Scroll { offset, direction });
        self.scroll_end_timer
            .arm(now_ms, self.options.scroll_end_delay_ms);

        let result = match self.state.state() {
            GridState::Normal => self.reconcile(direction),
            GridState::Building => {
                // Layout is already final; only the window move waits for the build.
                self.update_visibility(self.span());
                self.reconcile_pending = true;
                Ok(())
            }
            GridState::Disabled | GridState::Hidden => Ok(()),
        };
        self.flush_events();
        result
    }

    /// The container or the scroller was resized. Applied after the debounce delay.
    pub fn on_resize(&mut self, now_ms: u64) -> Result<(), GridError> {
        self.now_ms = now_ms;
        if self.options.resize_debounce_ms == 0 {
            let result = self.apply_resize();
            self.flush_events();
            return result;
        }
        self.resize_timer
            .arm(now_ms, self.options.resize_debounce_ms);
        Ok(())
    }

    /// Advances timers and pending work to `now_ms`.
    ///
    /// Polls a pending page fetch, arms a held drag, fires debounced resize and scroll-end
    /// signals and completes settle periods.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), GridError> {
        self.now_ms = now_ms;
        let mut result = Ok(());

        if self.in_flight.is_some() {
            let mut cx = Context::from_waker(Waker::noop());
            if let Poll::Ready(Err(err)) = self.poll_in_flight(&mut cx) {
                result = Err(err);
            }
        }

        self.try_arm(now_ms);

        if self.settle_timer.fire(now_ms) {
            let completion = mem::take(&mut self.settle_events);
            self.complete_settle(completion, true);
        }
        if !self.state.is_building() {
            for slot in 0..self.pool.capacity() {
                if let Some(view) = self.pool.view_mut(slot) {
                    view.settle(now_ms);
                }
            }
        }

        if self.resize_timer.fire(now_ms) {
            if let Err(err) = self.apply_resize() {
                result = result.and(Err(err));
            }
        }
        if self.scroll_end_timer.fire(now_ms) {
            let offset = self.last_offset.unwrap_or(0);
            self.emit(GridEvent::ScrollEnd { offset });
        }

        self.flush_events();
        result
    }

    /// Drives a pending page fetch with the caller's waker.
    ///
    /// [`Grid::tick`] polls with a no-op waker; hosts running an executor can call this from a
    /// task instead so they are woken when the page arrives.
    pub fn poll_fetch(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), GridError>> {
        self.poll_in_flight(cx)
    }

    /// Replaces all records with a complete dataset. A data source, if any, is detached.
    pub fn load(&mut self, records: Vec<R>) -> Result<(), GridError> {
        self.cancel_fetch();
        if !self.state.is_normal() {
            return self.defer(Deferred::Load(records));
        }
        self.release_all(false);
        self.source = None;
        self.cache.replace(records);
        self.meta.clear();
        self.selection.clear();
        self.relayout_from(0);
        self.restart();
        let result = self.load_window(ScrollDirection::Forward);
        self.flush_events();
        result
    }

    /// Drops every fetched record and pages the data source again from the start. Cancels a
    /// pending fetch.
    pub fn reload(&mut self) -> Result<(), GridError> {
        self.cancel_fetch();
        if !self.state.is_normal() {
            return self.defer(Deferred::Reload);
        }
        self.release_all(false);
        if self.source.is_some() {
            self.cache.reset();
            self.meta.clear();
            self.selection.clear();
        } else {
            self.cache.clear_stall();
        }
        self.last_error = None;
        self.ready = false;
        self.relayout_from(0);
        self.restart();
        let result = self.load_window(ScrollDirection::Forward);
        self.flush_events();
        result
    }

    /// Inserts `record` at the head of the list.
    pub fn insert(&mut self, record: R) -> Result<(), GridError> {
        if !self.state.is_normal() {
            return self.defer(Deferred::Insert(record));
        }
        self.state.begin();
        gdebug!(len = self.cache.len(), "insert at head");
        self.cache.insert_front(record);
        self.meta.on_insert(0);
        shift_insert(&mut self.selection, 0);
        self.pool.on_insert(0);
        self.after_layout_change(0);
        self.finish_op(vec![GridEvent::ItemInsert { index: 0 }], true);
        self.flush_events();
        Ok(())
    }

    /// Deletes the record at `index`. Later records move down by one.
    pub fn remove(&mut self, index: usize) -> Result<(), GridError> {
        self.check_index(index)?;
        if !self.state.is_normal() {
            return self.defer(Deferred::Remove(index));
        }
        self.remove_now(index)
    }

    /// Moves the record at `from` to `to`, shifting the records in between.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), GridError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        if !self.state.is_normal() {
            return self.defer(Deferred::Reorder(from, to));
        }
        self.state.begin();
        self.move_now(from, to);
        self.finish_op(Vec::new(), true);
        self.flush_events();
        Ok(())
    }

    /// Recomputes geometry and layout, keeping the first visible item in place.
    pub fn refresh(&mut self) -> Result<(), GridError> {
        if !self.state.is_normal() {
            return self.defer(Deferred::Refresh);
        }
        let width = (self.viewport)().container_width();
        if width == 0 {
            self.hide();
        } else {
            self.relayout_anchored(width, None);
        }
        self.flush_events();
        Ok(())
    }

    /// Tears the views down and builds the grid again with new options. Records and the data
    /// source are kept.
    pub fn rebuild(&mut self, options: GridOptions<R>) -> Result<(), GridError> {
        let (binder, viewport) = options.validate()?;
        self.cancel_fetch();
        if matches!(
            self.state.state(),
            GridState::Building | GridState::Disabled
        ) {
            return self.defer(Deferred::Rebuild(Box::new(options)));
        }
        let anchor = self.capture_anchor(self.span());
        self.drag.cancel();
        self.release_all(true);
        self.options = options;
        self.binder = binder;
        self.viewport = viewport;
        self.pool = ItemPool::default();
        self.geometry = Geometry::default();
        self.state = StateMachine::default();
        self.ready = false;
        self.degraded_logged = false;
        for timer in [
            &mut self.resize_timer,
            &mut self.scroll_end_timer,
            &mut self.settle_timer,
        ] {
            timer.cancel();
        }

        let viewport = (self.viewport)();
        self.last_offset = Some(viewport.scroll_offset());
        let width = viewport.container_width();
        if width == 0 {
            self.state.settle_to(GridState::Hidden);
            self.flush_events();
            return Ok(());
        }
        self.apply_geometry(width);
        self.relayout_from(0);
        self.restore_anchor(anchor);
        let result = self.load_window(ScrollDirection::Forward);
        self.flush_events();
        result
    }

    /// Reports the measured content height of the view in `slot`. Layout is recomputed from
    /// that record onward when the measurement changed.
    pub fn measure(&mut self, slot: usize, height: u32) -> Result<(), GridError> {
        let index = self.bound_slot(slot)?;
        if let Some(view) = self.pool.view_mut(slot) {
            view.set_content_height(height);
        }
        if !self.cache.set_measured(index, height) {
            return Ok(());
        }
        if !self.state.is_normal() {
            return self.defer(Deferred::Relayout(index));
        }
        self.relayout_at(index);
        Ok(())
    }

    /// Pointer pressed on the view in `slot`. Starts the hold delay of a drag when sorting is
    /// enabled.
    pub fn pointer_down(&mut self, slot: usize, at: Point, now_ms: u64) -> Result<(), GridError> {
        self.now_ms = now_ms;
        self.bound_slot(slot)?;
        if !self.options.sortable || !self.state.is_normal() {
            return Ok(());
        }
        self.drag
            .press(slot, at, now_ms, self.options.drag_start_delay_ms);
        self.try_arm(now_ms);
        self.flush_events();
        Ok(())
    }

    /// Pointer moved. Moves the dragged view and swaps it with the view it mostly covers.
    pub fn pointer_move(&mut self, at: Point, now_ms: u64) -> Result<(), GridError> {
        self.now_ms = now_ms;
        self.try_arm(now_ms);
        let Some((slot, rect)) = self.drag.track(at, self.options.drag_jitter) else {
            self.flush_events();
            return Ok(());
        };
        if let Some(view) = self.pool.view_mut(slot) {
            let (moved, _) = view.place(rect);
            if moved {
                self.hook(slot, ViewHook::Reposition);
            }
        }

        if let Some(index) = self.pool.bound_index(slot) {
            let candidates = self
                .pool
                .views()
                .iter()
                .filter(|v| v.slot() != slot && v.is_visible())
                .filter_map(|v| {
                    Some(DropCandidate {
                        index: v.bound_index()?,
                        rect: v.rect(),
                        in_transition: v.in_transition(),
                    })
                });
            if let Some(target) = swap_target(index, rect, candidates) {
                if self.state.begin() {
                    gdebug!(from = index, to = target, "drag swap");
                    self.move_now(index, target);
                    self.finish_op(Vec::new(), false);
                }
            }
        }
        self.flush_events();
        Ok(())
    }

    /// Pointer released. Ends a drag and snaps the dragged view onto its layout position.
    pub fn pointer_up(&mut self, now_ms: u64) -> Result<(), GridError> {
        self.now_ms = now_ms;
        if let Some((slot, from)) = self.drag.release() {
            let index = self.pool.bound_index(slot);
            let rect = index.and_then(|i| self.entry_rect(i));
            let until = self.transition_deadline(true);
            let mut moved = false;
            if let Some(view) = self.pool.view_mut(slot) {
                view.set_dragging(false);
                if let Some(rect) = rect {
                    (moved, _) = view.place(rect);
                    if let (true, Some(until)) = (moved, until) {
                        view.start_transition(until);
                    }
                }
            }
            if moved {
                self.hook(slot, ViewHook::Reposition);
            }
            if let Some(to) = index {
                self.emit(GridEvent::SortEnd { from, to });
            }
        }
        self.flush_events();
        Ok(())
    }

    /// The view in `slot` was clicked. Updates the selection and emits `ItemClick`.
    pub fn click(&mut self, slot: usize) -> Result<(), GridError> {
        let index = self.bound_slot(slot)?;
        if self.options.multi_select {
            if self.selection.remove(&index).is_none() {
                self.selection.insert(index, ());
            }
        } else {
            self.selection.clear();
            self.selection.insert(index, ());
        }
        self.sync_selection();
        self.emit(GridEvent::ItemClick { index, slot });
        self.flush_events();
        Ok(())
    }

    pub fn double_click(&mut self, slot: usize) -> Result<(), GridError> {
        let index = self.bound_slot(slot)?;
        self.emit(GridEvent::ItemDoubleClick { index, slot });
        self.flush_events();
        Ok(())
    }

    pub fn context_menu(&mut self, slot: usize) -> Result<(), GridError> {
        let index = self.bound_slot(slot)?;
        self.emit(GridEvent::ItemContextMenu { index, slot });
        self.flush_events();
        Ok(())
    }

    /// Selects `index`. Without multi-select the previous selection is replaced.
    pub fn select(&mut self, index: usize) -> Result<(), GridError> {
        self.check_index(index)?;
        if !self.options.multi_select {
            self.selection.clear();
        }
        self.selection.insert(index, ());
        self.sync_selection();
        Ok(())
    }

    /// Returns whether `index` was selected.
    pub fn deselect(&mut self, index: usize) -> bool {
        let removed = self.selection.remove(&index).is_some();
        if removed {
            self.sync_selection();
        }
        removed
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.sync_selection();
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains_key(&index)
    }

    /// Selected indexes in ascending order.
    pub fn selection(&self) -> impl Iterator<Item = usize> + '_ {
        self.selection.keys().copied()
    }

    /// Stops reacting to scroll, resize and pointer signals. Mutations are queued until
    /// [`Grid::enable`].
    pub fn disable(&mut self) {
        self.drag.cancel();
        self.state.settle_to(GridState::Disabled);
    }

    pub fn enable(&mut self) -> Result<(), GridError> {
        if self.state.state() != GridState::Disabled && !self.state.is_building() {
            return Ok(());
        }
        self.state.settle_to(GridState::Normal);
        if !self.state.is_normal() {
            return Ok(());
        }
        self.reconcile_pending = true;
        self.refresh()?;
        self.after_settled();
        self.flush_events();
        Ok(())
    }

    /// Releases every view and stops the grid. Pending fetches, timers and queued operations
    /// are dropped.
    pub fn destroy(&mut self) {
        gdebug!("destroy");
        self.drag.cancel();
        self.in_flight = None;
        self.pending_load = None;
        self.deferred.clear();
        self.settle_events.clear();
        for timer in [
            &mut self.resize_timer,
            &mut self.scroll_end_timer,
            &mut self.settle_timer,
        ] {
            timer.cancel();
        }
        self.release_all(true);
        self.pool = ItemPool::default();
        self.state = StateMachine::default();
        self.state.settle_to(GridState::Disabled);
        self.flush_events();
    }

    /// Container-local band the grid considers visible.
    fn span(&self) -> Span {
        let span = (self.viewport)().span();
        match self.scroll_request {
            Some(top) => Span {
                top,
                bottom: top.saturating_add(span.height()),
            },
            None => span,
        }
    }

    /// First and last on-screen index, or the nearest edge when nothing intersects.
    fn focus(&self, span: Span) -> (usize, usize) {
        if let Some(census) = self.pool.census(self.cache.layout(), span) {
            return (census.first, census.last);
        }
        let len = self.cache.len();
        if len > 0 && !span.is_empty() && span.top >= self.cache.layout().content_bottom() {
            (len - 1, len - 1)
        } else {
            (0, 0)
        }
    }

    fn can_fetch(&self) -> bool {
        self.source.is_some()
            && self.in_flight.is_none()
            && self.cache.needs_fetch(self.cache.len())
    }

    fn plan(&mut self, span: Span, direction: Option<ScrollDirection>, len: usize) -> (usize, usize) {
        let (first, last) = self.focus(span);
        let capacity = self.pool.capacity();
        if last - first + 1 >= capacity && capacity > 0 && !self.degraded_logged {
            self.degraded_logged = true;
            gwarn!(
                capacity,
                on_screen = last - first + 1,
                "item pool is smaller than the visible range; the window will reload on every scroll"
            );
        }
        plan_window(
            first,
            last,
            direction,
            capacity,
            self.geometry.column_count,
            len,
        )
    }

    /// Decides whether the pool must move, and in which direction.
    fn load_needed(&self, direction: Option<ScrollDirection>, span: Span) -> Option<ScrollDirection> {
        let len = self.cache.len();
        let window = self.pool.window();
        let forward_room = window.map_or(len > 0, |w| w.max_index + 1 < len) || self.can_fetch();
        let Some(census) = self.pool.census(self.cache.layout(), span) else {
            let past_end = !span.is_empty() && span.top >= self.cache.layout().content_bottom();
            return (past_end && forward_room).then_some(ScrollDirection::Forward);
        };
        if !census.covered {
            return Some(direction.unwrap_or(ScrollDirection::Forward));
        }
        let columns = self.geometry.column_count;
        let buffered = census.buffered();
        let backward_room = window.is_some_and(|w| w.min_index > 0);
        match direction {
            Some(ScrollDirection::Forward)
                if forward_room && (census.after * 3 < buffered || census.after < columns) =>
            {
                Some(ScrollDirection::Forward)
            }
            Some(ScrollDirection::Backward)
                if backward_room && (census.before * 3 < buffered || census.before < columns) =>
            {
                Some(ScrollDirection::Backward)
            }
            _ if self.pool.free_count() > 0 && forward_room => Some(ScrollDirection::Forward),
            _ => None,
        }
    }

    /// Refreshes visibility and moves the window when the viewport outgrew it.
    fn reconcile(&mut self, direction: Option<ScrollDirection>) -> Result<(), GridError> {
        self.reconcile_pending = false;
        let span = self.span();
        self.update_visibility(span);
        match self.load_needed(direction, span) {
            Some(direction) => self.load_window(direction),
            None => {
                self.edge_events(direction);
                Ok(())
            }
        }
    }

    /// Moves the window in `direction`, fetching a page first when the plan runs past the
    /// cached records.
    fn load_window(&mut self, direction: ScrollDirection) -> Result<(), GridError> {
        if !self.state.begin() {
            self.reconcile_pending = true;
            return Ok(());
        }
        gdebug!(?direction, len = self.cache.len(), "load window");
        self.emit(GridEvent::DataLoadStart { direction });

        let span = self.span();
        if self.can_fetch() && self.plan(span, Some(direction), usize::MAX).1 > self.cache.len() {
            match self.request_page() {
                Ok(true) => {
                    self.pending_load = Some(direction);
                    return Ok(());
                }
                Ok(false) => {}
                Err(err) => {
                    self.complete_load(direction);
                    return Err(err);
                }
            }
        }
        self.complete_load(direction);
        Ok(())
    }

    /// Asks the data source for the next page. Returns `true` while the page is pending.
    fn request_page(&mut self) -> Result<bool, GridError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        let start = self.cache.fetched();
        let count = self
            .options
            .data_block_size_for(self.geometry.column_count);
        gdebug!(start, count, "request page");
        let result = match source.fetch(start, count) {
            Fetch::Ready(result) => result,
            Fetch::Pending(future) => {
                let mut in_flight = InFlight::new(start, count, future);
                let mut cx = Context::from_waker(Waker::noop());
                match in_flight.poll(&mut cx) {
                    Poll::Ready(result) => result,
                    Poll::Pending => {
                        self.in_flight = Some(in_flight);
                        return Ok(true);
                    }
                }
            }
        };
        self.apply_page(start, count, result).map(|()| false)
    }

    fn apply_page(
        &mut self,
        start: usize,
        count: usize,
        result: Result<Vec<R>, FetchError>,
    ) -> Result<(), GridError> {
        match result {
            Ok(page) => {
                let from = self.cache.len().min(self.cache.layout().len());
                let _got = page.len();
                let _end = self.cache.append_page(page, count);
                gdebug!(start, got = _got, end_of_data = _end, "page loaded");
                self.last_error = None;
                self.relayout_from(from);
                Ok(())
            }
            Err(error) => {
                gwarn!(start, error = %error, "page request failed");
                self.cache.mark_stalled();
                self.last_error = Some(error.clone());
                self.emit(GridEvent::LoadError {
                    start,
                    error: error.clone(),
                });
                Err(GridError::DataSource(error))
            }
        }
    }

    fn poll_in_flight(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), GridError>> {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        let Poll::Ready(result) = in_flight.poll(cx) else {
            return Poll::Pending;
        };
        let (start, count) = (in_flight.start, in_flight.count);
        self.in_flight = None;
        let outcome = self.apply_page(start, count, result);
        let direction = self
            .pending_load
            .take()
            .unwrap_or(ScrollDirection::Forward);
        self.complete_load(direction);
        self.flush_events();
        Poll::Ready(outcome)
    }

    fn cancel_fetch(&mut self) {
        if self.in_flight.take().is_some() {
            gdebug!("pending page request cancelled");
            self.pending_load = None;
            self.state.finish();
        }
    }

    /// Rebinds the pool around the viewport after records arrived (or did not).
    fn complete_load(&mut self, direction: ScrollDirection) {
        let span = self.span();
        let (start, end) = self.plan(span, Some(direction), self.cache.len());
        self.rebind(start, end, Some(direction));
        self.update_visibility(span);
        let window = self.pool.window();
        self.emit(GridEvent::DataLoadEnd { direction, window });
        self.edge_events(Some(direction));

        if self.can_fetch() && self.plan(span, Some(direction), usize::MAX).1 > self.cache.len() {
            self.reconcile_pending = true;
        }
        if !self.ready && !self.cache.is_stalled() {
            self.ready = true;
            gdebug!(len = self.cache.len(), "ready");
            self.emit(GridEvent::Ready);
        }
        self.finish_op(Vec::new(), false);
    }

    /// Binds free views to `start..end`, releasing views bound outside of it.
    fn rebind(&mut self, start: usize, end: usize, direction: Option<ScrollDirection>) {
        // The dragged view stays bound only while its index is inside the plan.
        let pinned = self.drag.pinned_slot();
        for slot in 0..self.pool.capacity() {
            match self.pool.bound_index(slot) {
                Some(index) if !(start..end).contains(&index) => {
                    if Some(slot) == pinned {
                        gdebug!(index, slot, "dragged item left the window; drag cancelled");
                        self.drag.cancel();
                    }
                    self.release(slot);
                }
                _ => {}
            }
        }

        let mut dirty: Option<usize> = None;
        let count = end.saturating_sub(start);
        for k in 0..count {
            // Closest records to the direction of travel come first.
            let index = match direction {
                Some(ScrollDirection::Backward) => end - 1 - k,
                _ => start + k,
            };
            if self.pool.slot_of(index).is_some() {
                continue;
            }
            let Some(slot) = self.pool.free_slot() else {
                break;
            };
            if self.bind_slot(slot, index) {
                dirty = Some(dirty.map_or(index, |d| d.min(index)));
            }
        }
        if let Some(from) = dirty {
            if self.relayout_from(from) {
                self.reposition_from(from, false);
            }
        }
        gtrace!(start, end, bound = self.pool.bound_count(), "rebind");
    }

    /// Binds `slot` to `index` and runs the binder. Returns whether the binder reported a new
    /// content height.
    fn bind_slot(&mut self, slot: usize, index: usize) -> bool {
        self.pool.bind(slot, index);
        let selected = self.selection.contains_key(&index);
        let rect = self.entry_rect(index);
        if let (Some(view), Some(record)) = (self.pool.view_mut(slot), self.cache.get(index)) {
            view.set_selected(selected);
            if let Some(rect) = rect {
                view.place(rect);
            }
            (self.binder)(view, record);
        }
        let measured = self.pool.view(slot).and_then(ItemView::content_height);
        let changed = measured.is_some_and(|h| self.cache.set_measured(index, h));
        self.hook(slot, ViewHook::Load);
        self.emit(GridEvent::ItemEnter { index, slot });
        self.emit(GridEvent::ItemLoaded { index, slot });
        changed
    }

    fn release(&mut self, slot: usize) {
        if let Some(index) = self.pool.unbind(slot) {
            self.emit(GridEvent::ItemExit { index, slot });
        }
    }

    fn release_all(&mut self, destroy: bool) {
        for slot in 0..self.pool.capacity() {
            if destroy {
                self.hook(slot, ViewHook::Destroy);
            }
            self.release(slot);
        }
    }

    fn hide(&mut self) {
        gdebug!("container has no width; hiding");
        self.drag.cancel();
        self.release_all(false);
        self.state.settle_to(GridState::Hidden);
    }

    fn restart(&mut self) {
        self.at_begin = true;
        self.at_end = false;
        self.scroll_request = Some(0);
    }

    fn edge_events(&mut self, direction: Option<ScrollDirection>) {
        let Some(window) = self.pool.window() else {
            return;
        };
        let at_begin = window.min_index == 0;
        if at_begin && !self.at_begin && direction == Some(ScrollDirection::Backward) {
            self.emit(GridEvent::BeginOfData);
        }
        self.at_begin = at_begin;

        let len = self.cache.len();
        let at_end = self.cache.end_of_data() && window.max_index + 1 == len;
        if at_end && !self.at_end {
            self.emit(GridEvent::EndOfData { len });
        }
        self.at_end = at_end;
    }

    fn compute_geometry(&self, width: u32) -> Geometry {
        let options = &self.options;
        Geometry::compute(
            width,
            options.padding,
            options.spacing,
            options.min_width,
            options.max_width,
            options.columns,
        )
    }

    fn apply_geometry(&mut self, width: u32) {
        let geometry = self.compute_geometry(width);
        self.geometry = geometry;
        let capacity = self.options.items_count_for(geometry.column_count);
        if capacity != self.pool.capacity() {
            for slot in capacity..self.pool.capacity() {
                if Some(slot) == self.drag.pinned_slot() {
                    self.drag.cancel();
                }
                self.hook(slot, ViewHook::Destroy);
                self.release(slot);
            }
            self.pool.resize(capacity);
        }
        gdebug!(
            width,
            columns = geometry.column_count,
            item_width = geometry.item_width,
            capacity,
            "geometry"
        );
        self.emit(GridEvent::SizeCalc {
            column_count: geometry.column_count,
            item_width: geometry.item_width,
            left_offset: geometry.left_offset,
        });
    }

    fn relayout_from(&mut self, start: usize) -> bool {
        let options = &self.options;
        let geometry = self.geometry;
        self.cache.relayout_from(start, &geometry, |record, measured| {
            options.resolve_height(&geometry, record, measured)
        })
    }

    fn entry_rect(&self, index: usize) -> Option<ItemRect> {
        self.cache
            .layout()
            .get(index)
            .map(|e| ItemRect::from_entry(e, self.geometry.item_width))
    }

    fn transition_deadline(&self, animate: bool) -> Option<u64> {
        let animation = self.options.animation;
        (animate && animation.enabled && animation.duration_ms > 0)
            .then(|| self.now_ms.saturating_add(animation.duration_ms))
    }

    /// Moves every bound view at `from` or later onto its layout entry. The dragged view keeps
    /// following the pointer.
    fn reposition_from(&mut self, from: usize, animate: bool) {
        let width = self.geometry.item_width;
        let until = self.transition_deadline(animate);
        for slot in 0..self.pool.capacity() {
            let Some(index) = self.pool.bound_index(slot) else {
                continue;
            };
            if index < from {
                continue;
            }
            let Some(entry) = self.cache.layout().get(index) else {
                continue;
            };
            let rect = ItemRect::from_entry(entry, width);
            let Some(view) = self.pool.view_mut(slot) else {
                continue;
            };
            if view.is_dragging() {
                continue;
            }
            let (moved, resized) = view.place(rect);
            if let (true, Some(until)) = (moved || resized, until) {
                view.start_transition(until);
            }
            if resized {
                self.hook(slot, ViewHook::Resize);
            }
            if moved {
                self.hook(slot, ViewHook::Reposition);
            }
        }
    }

    fn update_visibility(&mut self, span: Span) {
        let line = span.line_at(self.options.center_line);
        for slot in 0..self.pool.capacity() {
            let Some(index) = self.pool.bound_index(slot) else {
                continue;
            };
            let entry = self.cache.layout().get(index).copied();
            let visible = entry.is_some_and(|e| span.intersects(e.top, e.bottom));
            let centered = visible && entry.is_some_and(|e| e.top <= line && line < e.bottom);
            let Some(view) = self.pool.view_mut(slot) else {
                continue;
            };
            if view.set_visible(visible) {
                self.events.push_back(GridEvent::ItemVisibility {
                    index,
                    slot,
                    visible,
                });
            }
            if view.set_centered(centered) {
                self.events.push_back(if centered {
                    GridEvent::ItemCenterEnter { index, slot }
                } else {
                    GridEvent::ItemCenterExit { index, slot }
                });
            }
        }
    }

    /// Shared tail of layout mutations: reposition, rebind around the viewport, refresh
    /// visibility.
    fn after_layout_change(&mut self, from: usize) {
        self.relayout_from(from);
        self.settle_layout(from);
    }

    fn settle_layout(&mut self, from: usize) {
        self.reposition_from(from, true);
        let span = self.span();
        let (start, end) = self.plan(span, self.direction, self.cache.len());
        self.rebind(start, end, self.direction);
        self.update_visibility(span);
        self.edge_events(None);
        self.reconcile_pending = true;
    }

    fn relayout_at(&mut self, index: usize) {
        if !self.state.begin() {
            return;
        }
        let from = index.min(self.cache.layout().len());
        self.after_layout_change(from);
        self.finish_op(Vec::new(), true);
        self.flush_events();
    }

    fn remove_now(&mut self, index: usize) -> Result<(), GridError> {
        self.check_index(index)?;
        self.state.begin();
        gdebug!(index, len = self.cache.len(), "remove");
        if let Some(slot) = self.pool.slot_of(index) {
            if self.drag.pinned_slot() == Some(slot) {
                self.drag.cancel();
            }
            self.release(slot);
        }
        let Some(record) = self.cache.remove(index) else {
            self.finish_op(Vec::new(), false);
            return Err(GridError::IndexOutOfBounds {
                index,
                len: self.cache.len(),
            });
        };
        self.meta.on_remove(index);
        shift_remove(&mut self.selection, index);
        self.pool.on_remove(index);
        self.after_layout_change(index);
        self.finish_op(vec![GridEvent::ItemDelete { index, record }], true);
        self.flush_events();
        Ok(())
    }

    fn move_now(&mut self, from: usize, to: usize) {
        if !self.cache.move_record(from, to) {
            return;
        }
        self.meta.on_move(from, to);
        shift_move(&mut self.selection, from, to);
        self.pool.on_move(from, to);
        self.after_layout_change(from.min(to));
    }

    /// Recomputes geometry for `width` and relays every record, then asks the host to scroll
    /// so the first visible item stays where it was.
    fn relayout_anchored(&mut self, width: u32, completion: Option<GridEvent<R>>) {
        if !self.state.begin() {
            return;
        }
        let anchor = self.capture_anchor(self.span());
        self.apply_geometry(width);
        self.relayout_from(0);
        self.restore_anchor(anchor);
        self.settle_layout(0);
        self.finish_op(completion.into_iter().collect(), true);
    }

    fn capture_anchor(&self, span: Span) -> Option<(usize, i64)> {
        let layout = self.cache.layout();
        let index = layout.first_visible(span)?;
        let entry = layout.get(index)?;
        Some((index, span.top as i64 - entry.top as i64))
    }

    /// Records the scroll offset that keeps `anchor` in place under the current layout.
    fn restore_anchor(&mut self, anchor: Option<(usize, i64)>) {
        let Some((index, delta)) = anchor else {
            return;
        };
        if let Some(entry) = self.cache.layout().get(index) {
            let top = (entry.top as i64 + delta).max(0) as u64;
            if self.span().top != top {
                self.scroll_request = Some(top);
            }
        }
    }

    fn apply_resize(&mut self) -> Result<(), GridError> {
        match self.state.state() {
            GridState::Building => return self.defer(Deferred::Resize),
            GridState::Disabled => return Ok(()),
            GridState::Normal | GridState::Hidden => {}
        }
        let width = (self.viewport)().container_width();
        if width == 0 {
            if self.state.state() != GridState::Hidden {
                self.hide();
            }
            return Ok(());
        }
        let shown = self.state.state() == GridState::Hidden;
        if shown {
            gdebug!(width, "container shown");
            self.state.settle_to(GridState::Normal);
        }
        let previous = self.geometry;
        if !shown && previous.container_width == width && previous.column_count > 0 {
            // Only the scroller changed: the layout stands, the window may not.
            self.reconcile_pending = true;
            self.after_settled();
            return Ok(());
        }
        let next = self.compute_geometry(width);
        self.relayout_anchored(
            width,
            Some(GridEvent::Resize {
                column_count: next.column_count,
                item_width: next.item_width,
            }),
        );
        if shown && !self.ready && self.state.is_normal() {
            return self.load_window(ScrollDirection::Forward);
        }
        Ok(())
    }

    /// Leaves `Building`, right away or once the settle delay has elapsed when views are
    /// animating. `completion` is delivered after the grid settled.
    fn finish_op(&mut self, completion: Vec<GridEvent<R>>, settle: bool) {
        let animating = self.pool.views().iter().any(ItemView::in_transition);
        if settle && animating && self.options.animation.settle_ms() > 0 {
            self.settle_events = completion;
            self.settle_timer
                .arm(self.now_ms, self.options.animation.settle_ms());
            return;
        }
        self.complete_settle(completion, settle);
    }

    fn complete_settle(&mut self, completion: Vec<GridEvent<R>>, end_transitions: bool) {
        self.settle_timer.cancel();
        if end_transitions {
            for slot in 0..self.pool.capacity() {
                if let Some(view) = self.pool.view_mut(slot) {
                    view.end_transition();
                }
            }
        }
        self.state.finish();
        self.events.extend(completion);
        self.flush_events();
        self.after_settled();
    }

    /// Replays queued operations, then a reconciliation requested while building.
    fn after_settled(&mut self) {
        while self.state.is_normal() {
            let Some(op) = self.deferred.pop_front() else {
                break;
            };
            if let Err(_err) = self.run_deferred(op) {
                gwarn!(error = %_err, "queued operation failed");
            }
        }
        if self.state.is_normal() && self.reconcile_pending {
            if let Err(_err) = self.reconcile(self.direction) {
                gwarn!(error = %_err, "reconcile failed");
            }
        }
    }

    fn run_deferred(&mut self, op: Deferred<R>) -> Result<(), GridError> {
        match op {
            Deferred::Insert(record) => self.insert(record),
            Deferred::Remove(index) => self.remove(index),
            Deferred::Reorder(from, to) => self.reorder(from, to),
            Deferred::Relayout(index) => {
                self.relayout_at(index);
                Ok(())
            }
            Deferred::Load(records) => self.load(records),
            Deferred::Refresh => self.refresh(),
            Deferred::Resize => self.apply_resize(),
            Deferred::Reload => self.reload(),
            Deferred::Rebuild(options) => self.rebuild(*options),
        }
    }

    fn defer(&mut self, op: Deferred<R>) -> Result<(), GridError> {
        gtrace!(state = ?self.state.state(), "operation queued");
        self.deferred.push_back(op);
        self.flush_events();
        Ok(())
    }

    fn try_arm(&mut self, now_ms: u64) {
        let Some((slot, origin)) = self.drag.poll_arm(now_ms) else {
            return;
        };
        let index = self.pool.bound_index(slot);
        let (Some(index), true) = (index, self.state.is_normal()) else {
            self.drag.cancel();
            return;
        };
        let Some(view) = self.pool.view_mut(slot) else {
            self.drag.cancel();
            return;
        };
        let base = view.rect();
        view.set_dragging(true);
        self.drag.arm(slot, origin, base, index);
        gdebug!(index, slot, "drag armed");
        self.emit(GridEvent::SortStart { index, slot });
    }

    fn sync_selection(&mut self) {
        for slot in 0..self.pool.capacity() {
            let selected = self
                .pool
                .bound_index(slot)
                .is_some_and(|index| self.selection.contains_key(&index));
            if let Some(view) = self.pool.view_mut(slot) {
                view.set_selected(selected);
            }
        }
    }

    fn check_index(&self, index: usize) -> Result<(), GridError> {
        let len = self.cache.len();
        if index >= len {
            gwarn!(index, len, "index out of bounds");
            return Err(GridError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    fn bound_slot(&self, slot: usize) -> Result<usize, GridError> {
        let view = self
            .pool
            .view(slot)
            .ok_or(GridError::UnknownSlot { slot })?;
        view.bound_index().ok_or(GridError::UnboundSlot { slot })
    }

    fn hook(&self, slot: usize, hook: ViewHook) {
        if let (Some(on_view), Some(view)) = (&self.options.on_view, self.pool.view(slot)) {
            on_view(view, hook);
        }
    }

    fn emit(&mut self, event: GridEvent<R>) {
        self.events.push_back(event);
    }

    /// Delivers queued notifications unless the grid is building.
    fn flush_events(&mut self) {
        if self.state.is_building() {
            return;
        }
        let Some(on_event) = self.options.on_event.clone() else {
            self.events.clear();
            return;
        };
        while let Some(event) = self.events.pop_front() {
            on_event(self, &event);
        }
    }
}

impl<R> core::fmt::Debug for Grid<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Grid")
            .field("state", &self.state.state())
            .field("geometry", &self.geometry)
            .field("len", &self.cache.len())
            .field("window", &self.pool.window())
            .field("direction", &self.direction)
            .field("fetching", &self.in_flight.is_some())
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}
