use alloc::vec::Vec;

use masonry_grid::{ConfigError, Grid, GridError, GridOptions, ItemRect, Record};

use crate::RectTween;

/// What the host draws for one bound item view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawItem {
    pub slot: usize,
    pub index: usize,
    pub rect: ItemRect,
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct SlotState {
    drawn: Option<ItemRect>,
    tween: Option<RectTween>,
}

impl SlotState {
    fn target(&self) -> Option<ItemRect> {
        self.tween.map(|t| t.to).or(self.drawn)
    }

    fn current(&self, now_ms: u64) -> Option<ItemRect> {
        self.tween.map(|t| t.sample(now_ms)).or(self.drawn)
    }
}

/// A framework-neutral controller that wraps a [`Grid`] and turns its layout changes into
/// per-frame rects.
///
/// The grid only reports where each view should end up and until when it is in transition.
/// The controller remembers what was drawn last and tweens views from there, using the easing
/// configured in the grid's animation options.
///
/// Adapters drive it by calling:
/// - `on_scroll` / `on_resize` when UI events occur
/// - `tick(now_ms)` each frame, then `frame(now_ms)` to draw
#[derive(Debug)]
pub struct Controller<R> {
    grid: Grid<R>,
    slots: Vec<SlotState>,
}

impl<R: Record> Controller<R> {
    pub fn new(options: GridOptions<R>) -> Result<Self, ConfigError> {
        Grid::new(options).map(Self::from_grid)
    }

    pub fn from_grid(grid: Grid<R>) -> Self {
        let mut controller = Self {
            grid,
            slots: Vec::new(),
        };
        controller.sync(0);
        controller
    }

    pub fn grid(&self) -> &Grid<R> {
        &self.grid
    }

    /// Direct access for mutations (insert, remove, drag...). Changes are picked up by the next
    /// [`Controller::tick`] or [`Controller::sync`].
    pub fn grid_mut(&mut self) -> &mut Grid<R> {
        &mut self.grid
    }

    pub fn into_grid(self) -> Grid<R> {
        self.grid
    }

    pub fn is_animating(&self) -> bool {
        self.slots.iter().any(|s| s.tween.is_some())
    }

    /// Call this when the UI reports a scroll offset change.
    pub fn on_scroll(&mut self, now_ms: u64) -> Result<(), GridError> {
        let result = self.grid.on_scroll(now_ms);
        self.sync(now_ms);
        result
    }

    pub fn on_resize(&mut self, now_ms: u64) -> Result<(), GridError> {
        let result = self.grid.on_resize(now_ms);
        self.sync(now_ms);
        result
    }

    /// Advances the grid and the view tweens.
    ///
    /// Returns the scroll offset the host should apply, if the grid asked for one (for example
    /// to keep the first visible item in place after a resize).
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<u64>, GridError> {
        let result = self.grid.tick(now_ms);
        self.sync(now_ms);
        for state in &mut self.slots {
            if let Some(tween) = state.tween {
                if tween.is_done(now_ms) {
                    state.drawn = Some(tween.to);
                    state.tween = None;
                }
            }
        }
        result.map(|()| self.grid.take_scroll_request())
    }

    /// Picks up view rect changes since the last call.
    ///
    /// Views the grid marks as in transition are tweened from where they were last drawn;
    /// everything else snaps.
    pub fn sync(&mut self, now_ms: u64) {
        let easing = self.grid.options().animation.easing;
        let items = self.grid.items();
        self.slots.resize(items.len(), SlotState::default());
        for (state, view) in self.slots.iter_mut().zip(items) {
            if !view.is_bound() {
                *state = SlotState::default();
                continue;
            }
            let target = view.rect();
            if state.target() == Some(target) {
                continue;
            }
            match (state.current(now_ms), view.transition_until()) {
                (Some(current), Some(until)) if until > now_ms => {
                    state.tween = Some(RectTween::new(
                        current,
                        target,
                        now_ms,
                        until - now_ms,
                        easing,
                    ));
                }
                _ => {
                    state.tween = None;
                    state.drawn = Some(target);
                }
            }
        }
    }

    /// Where the view in `slot` should be drawn at `now_ms`.
    pub fn rect(&self, slot: usize, now_ms: u64) -> Option<ItemRect> {
        self.slots.get(slot)?.current(now_ms)
    }

    /// Bound views with their interpolated rects, in slot order.
    pub fn frame(&self, now_ms: u64) -> impl Iterator<Item = DrawItem> + '_ {
        self.grid.items().iter().filter_map(move |view| {
            Some(DrawItem {
                slot: view.slot(),
                index: view.bound_index()?,
                rect: self.rect(view.slot(), now_ms).unwrap_or(view.rect()),
                visible: view.is_visible(),
            })
        })
    }
}
