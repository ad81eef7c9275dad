use alloc::sync::Arc;

use crate::cache::Record;
use crate::error::ConfigError;
use crate::events::{GridEvent, ViewHook};
use crate::geometry::Geometry;
use crate::grid::Grid;
use crate::view::ItemView;
use crate::{Padding, Spacing, Viewport};

/// Populates an item view with the content of the record it was just bound to.
pub type ContentBinder<R> = Arc<dyn Fn(&mut ItemView, &R) + Send + Sync>;

/// Computes an item height for a record under the current column geometry.
pub type HeightResolver<R> = Arc<dyn Fn(&Geometry, &R) -> u32 + Send + Sync>;

/// Reports the current container and scroller rectangles.
pub type ViewportQuery = Arc<dyn Fn() -> Viewport + Send + Sync>;

/// Receives lifecycle notifications once the grid has settled.
pub type OnEventCallback<R> = Arc<dyn Fn(&Grid<R>, &GridEvent<R>) + Send + Sync>;

/// Receives per-view rendering hooks synchronously, while the grid is mutating.
pub type ViewHookCallback = Arc<dyn Fn(&ItemView, ViewHook) + Send + Sync>;

/// Column cap used when [`Columns::Auto`] is configured.
pub const AUTO_COLUMN_CAP: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerHeight {
    /// The container grows with its content; see [`Grid::content_height`].
    #[default]
    Auto,
    Fixed(u32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemHeight {
    /// Resolved per record: layout hints, then the height resolver, then the measured content
    /// height, then the item width.
    #[default]
    Auto,
    Fixed(u32),
    /// Height derived from the item width; `ratio` is width / height.
    AspectRatio(f32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Columns {
    #[default]
    Auto,
    Max(usize),
}

impl Columns {
    pub fn cap(self) -> usize {
        match self {
            Self::Auto => AUTO_COLUMN_CAP,
            Self::Max(n) => n.max(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    SmoothStep,
    EaseInOutCubic,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - (u * u * u) / 2.0
                }
            }
        }
    }
}

/// How repositioned views are animated.
///
/// When enabled, mutating operations keep the grid in `Building` for `duration_ms` after the
/// layout changed, then finalize. When disabled, they finalize immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Animation {
    pub enabled: bool,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Animation {
    pub const DISABLED: Self = Self {
        enabled: false,
        duration_ms: 0,
        easing: Easing::Linear,
    };

    /// Settle delay applied after a layout change.
    pub fn settle_ms(&self) -> u64 {
        if self.enabled { self.duration_ms } else { 0 }
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 300,
            easing: Easing::SmoothStep,
        }
    }
}

/// Configuration for [`crate::Grid`].
///
/// Closures are stored in `Arc`s so options are cheap to clone and can be handed to
/// [`Grid::rebuild`] with a few fields changed.
pub struct GridOptions<R> {
    pub container_height: ContainerHeight,
    pub padding: Padding,
    pub spacing: Spacing,
    pub min_width: u32,
    pub max_width: u32,
    pub item_height: ItemHeight,
    pub columns: Columns,
    pub animation: Animation,

    /// Enables press-and-hold drag reordering.
    pub sortable: bool,
    /// Clicking a view toggles its record in the selection instead of replacing it.
    pub multi_select: bool,
    /// Press-and-hold delay before a drag arms.
    pub drag_start_delay_ms: u64,
    /// Pointer travel (in px) tolerated before a drag arms.
    pub drag_jitter: u32,

    /// Pool size. Defaults to `max(20, columns * 20)`.
    pub items_count: Option<usize>,
    /// Page size requested from the data source. Defaults to `max(100, columns * 40)`.
    pub data_block_size: Option<usize>,

    /// Quiet period before a resize signal is applied.
    pub resize_debounce_ms: u64,
    /// Quiet period after the last scroll signal before `ScrollEnd` fires.
    pub scroll_end_delay_ms: u64,
    /// Position of the "center" line as a fraction of the viewport height.
    pub center_line: f32,

    pub binder: Option<ContentBinder<R>>,
    pub height_resolver: Option<HeightResolver<R>>,
    pub viewport: Option<ViewportQuery>,
    pub on_event: Option<OnEventCallback<R>>,
    pub on_view: Option<ViewHookCallback>,
}

impl<R> Clone for GridOptions<R> {
    fn clone(&self) -> Self {
        Self {
            container_height: self.container_height,
            padding: self.padding,
            spacing: self.spacing,
            min_width: self.min_width,
            max_width: self.max_width,
            item_height: self.item_height,
            columns: self.columns,
            animation: self.animation,
            sortable: self.sortable,
            multi_select: self.multi_select,
            drag_start_delay_ms: self.drag_start_delay_ms,
            drag_jitter: self.drag_jitter,
            items_count: self.items_count,
            data_block_size: self.data_block_size,
            resize_debounce_ms: self.resize_debounce_ms,
            scroll_end_delay_ms: self.scroll_end_delay_ms,
            center_line: self.center_line,
            binder: self.binder.clone(),
            height_resolver: self.height_resolver.clone(),
            viewport: self.viewport.clone(),
            on_event: self.on_event.clone(),
            on_view: self.on_view.clone(),
        }
    }
}

impl<R> Default for GridOptions<R> {
    fn default() -> Self {
        Self {
            container_height: ContainerHeight::Auto,
            padding: Padding::default(),
            spacing: Spacing::default(),
            min_width: 150,
            max_width: 250,
            item_height: ItemHeight::Auto,
            columns: Columns::Auto,
            animation: Animation::default(),
            sortable: false,
            multi_select: false,
            drag_start_delay_ms: 200,
            drag_jitter: 5,
            items_count: None,
            data_block_size: None,
            resize_debounce_ms: 100,
            scroll_end_delay_ms: 150,
            center_line: 0.5,
            binder: None,
            height_resolver: None,
            viewport: None,
            on_event: None,
            on_view: None,
        }
    }
}

impl<R> GridOptions<R> {
    /// Creates options with the two mandatory collaborators set.
    pub fn new(
        viewport: impl Fn() -> Viewport + Send + Sync + 'static,
        binder: impl Fn(&mut ItemView, &R) + Send + Sync + 'static,
    ) -> Self {
        Self {
            viewport: Some(Arc::new(viewport)),
            binder: Some(Arc::new(binder)),
            ..Self::default()
        }
    }

    /// Checks the mandatory collaborators and the width range.
    pub(crate) fn validate(&self) -> Result<(ContentBinder<R>, ViewportQuery), ConfigError> {
        let binder = self.binder.clone().ok_or(ConfigError::MissingBinder)?;
        let viewport = self.viewport.clone().ok_or(ConfigError::MissingViewport)?;
        if self.min_width == 0 || self.min_width > self.max_width {
            return Err(ConfigError::InvalidWidthRange {
                min: self.min_width,
                max: self.max_width,
            });
        }
        Ok((binder, viewport))
    }

    /// Height of `record` under `geometry`.
    ///
    /// Precedence: the record's explicit height, the record's aspect ratio, the configured
    /// item height, the height resolver, the measured content height, and finally the item
    /// width. Never returns 0.
    pub fn resolve_height(&self, geometry: &Geometry, record: &R, measured: Option<u32>) -> u32
    where
        R: Record,
    {
        let width = geometry.item_width;
        if let Some(height) = record.explicit_height() {
            return height.max(1);
        }
        if let Some(ratio) = record.explicit_aspect_ratio() {
            return height_for_ratio(width, ratio);
        }
        let height = match self.item_height {
            ItemHeight::Fixed(height) => height,
            ItemHeight::AspectRatio(ratio) => height_for_ratio(width, ratio),
            ItemHeight::Auto => self
                .height_resolver
                .as_ref()
                .map(|f| f(geometry, record))
                .or(measured)
                .unwrap_or(width),
        };
        height.max(1)
    }

    pub fn items_count_for(&self, columns: usize) -> usize {
        self.items_count
            .unwrap_or_else(|| columns.saturating_mul(20).max(20))
    }

    pub fn data_block_size_for(&self, columns: usize) -> usize {
        self.data_block_size
            .unwrap_or_else(|| columns.saturating_mul(40).max(100))
            .max(1)
    }

    pub fn with_container_height(mut self, container_height: ContainerHeight) -> Self {
        self.container_height = container_height;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_spacing(mut self, cols: u32, rows: u32) -> Self {
        self.spacing = Spacing { cols, rows };
        self
    }

    pub fn with_width_range(mut self, min_width: u32, max_width: u32) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    pub fn with_item_height(mut self, item_height: ItemHeight) -> Self {
        self.item_height = item_height;
        self
    }

    pub fn with_columns(mut self, columns: Columns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = animation;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }

    pub fn with_drag_start_delay_ms(mut self, delay_ms: u64) -> Self {
        self.drag_start_delay_ms = delay_ms;
        self
    }

    pub fn with_drag_jitter(mut self, jitter: u32) -> Self {
        self.drag_jitter = jitter;
        self
    }

    pub fn with_center_line(mut self, ratio: f32) -> Self {
        self.center_line = ratio;
        self
    }

    pub fn with_items_count(mut self, items_count: usize) -> Self {
        self.items_count = Some(items_count);
        self
    }

    pub fn with_data_block_size(mut self, data_block_size: usize) -> Self {
        self.data_block_size = Some(data_block_size);
        self
    }

    pub fn with_resize_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.resize_debounce_ms = delay_ms;
        self
    }

    pub fn with_scroll_end_delay_ms(mut self, delay_ms: u64) -> Self {
        self.scroll_end_delay_ms = delay_ms;
        self
    }

    pub fn with_height_resolver(
        mut self,
        f: Option<impl Fn(&Geometry, &R) -> u32 + Send + Sync + 'static>,
    ) -> Self {
        self.height_resolver = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_event(
        mut self,
        on_event: Option<impl Fn(&Grid<R>, &GridEvent<R>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_event = on_event.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_view(
        mut self,
        on_view: Option<impl Fn(&ItemView, ViewHook) + Send + Sync + 'static>,
    ) -> Self {
        self.on_view = on_view.map(|f| Arc::new(f) as _);
        self
    }
}

fn height_for_ratio(width: u32, ratio: f32) -> u32 {
    if !ratio.is_finite() || ratio <= 0.0 {
        return width.max(1);
    }
    ((width as f32 / ratio + 0.5) as u32).max(1)
}

impl<R> core::fmt::Debug for GridOptions<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridOptions")
            .field("container_height", &self.container_height)
            .field("padding", &self.padding)
            .field("spacing", &self.spacing)
            .field("min_width", &self.min_width)
            .field("max_width", &self.max_width)
            .field("item_height", &self.item_height)
            .field("columns", &self.columns)
            .field("animation", &self.animation)
            .field("sortable", &self.sortable)
            .field("multi_select", &self.multi_select)
            .field("drag_start_delay_ms", &self.drag_start_delay_ms)
            .field("items_count", &self.items_count)
            .field("data_block_size", &self.data_block_size)
            .field("resize_debounce_ms", &self.resize_debounce_ms)
            .field("scroll_end_delay_ms", &self.scroll_end_delay_ms)
            .finish_non_exhaustive()
    }
}
