#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

impl ScrollDirection {
    pub fn from_delta(prev: i64, next: i64) -> Option<Self> {
        match next.cmp(&prev) {
            core::cmp::Ordering::Greater => Some(Self::Forward),
            core::cmp::Ordering::Less => Some(Self::Backward),
            core::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub const fn uniform(v: u32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }
}

/// Space between items: `cols` between neighbouring columns, `rows` between stacked items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spacing {
    pub cols: u32,
    pub rows: u32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self { cols: 10, rows: 10 }
    }
}

/// A rectangle in the host's coordinate space (e.g. client coordinates).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

/// What the host reports about the grid container and the element that scrolls it.
///
/// Both rectangles are expressed in the same coordinate space. The engine never reads ambient
/// state: every reconciliation pass asks the viewport query supplied in the options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub container: Bounds,
    pub scroller: Bounds,
}

impl Viewport {
    /// A viewport whose container starts at the top of the scroller and is scrolled by `offset`.
    pub fn scrolled(container_width: u32, viewport_height: u32, offset: u64) -> Self {
        Self {
            container: Bounds {
                left: 0,
                top: -(offset as i64),
                width: container_width,
                height: 0,
            },
            scroller: Bounds {
                left: 0,
                top: 0,
                width: container_width,
                height: viewport_height,
            },
        }
    }

    /// Scroll position of the container relative to the scroller (container-local y of the
    /// scroller's top edge). Negative while the container starts below the fold.
    pub fn scroll_offset(&self) -> i64 {
        self.scroller.top.saturating_sub(self.container.top)
    }

    pub fn container_width(&self) -> u32 {
        self.container.width
    }

    /// The band of the container (in container-local coordinates) that is inside the scroller.
    pub fn span(&self) -> Span {
        let top = self.scroll_offset();
        let bottom = top.saturating_add(self.scroller.height as i64);
        Span {
            top: top.max(0) as u64,
            bottom: bottom.max(0) as u64,
        }
    }
}

/// A vertical band `[top, bottom)` in container-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub top: u64,
    pub bottom: u64,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.top >= self.bottom
    }

    pub fn height(&self) -> u64 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn intersects(&self, top: u64, bottom: u64) -> bool {
        !self.is_empty() && top < self.bottom && bottom > self.top
    }

    /// Container-local y of the line at `ratio` of the band's height.
    pub fn line_at(&self, ratio: f32) -> u64 {
        let ratio = ratio.clamp(0.0, 1.0);
        self.top
            .saturating_add((self.height() as f64 * ratio as f64) as u64)
    }
}

/// Resolved position and size of one cached record.
///
/// `bottom` is always `top + height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutEntry {
    pub left: u32,
    pub top: u64,
    pub height: u32,
    pub bottom: u64,
    pub column: usize,
}

impl LayoutEntry {
    pub fn new(column: usize, left: u32, top: u64, height: u32) -> Self {
        Self {
            left,
            top,
            height,
            bottom: top.saturating_add(height as u64),
            column,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// On-screen rectangle of an item view, in container-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl ItemRect {
    pub fn from_entry(entry: &LayoutEntry, width: u32) -> Self {
        Self {
            x: entry.left as i64,
            y: entry.top as i64,
            width,
            height: entry.height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width as i64)
    }

    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height as i64)
    }

    pub fn translate(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// Area of the intersection with `other` (0 when disjoint).
    pub fn overlap(&self, other: &ItemRect) -> u64 {
        let w = self.right().min(other.right()).saturating_sub(self.x.max(other.x));
        let h = self.bottom().min(other.bottom()).saturating_sub(self.y.max(other.y));
        if w <= 0 || h <= 0 {
            return 0;
        }
        (w as u64).saturating_mul(h as u64)
    }
}

/// The inclusive range of logical indexes currently assigned to item views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub min_index: usize,
    pub max_index: usize,
}

impl Window {
    /// Number of indexes spanned (never zero).
    pub fn span_len(&self) -> usize {
        self.max_index - self.min_index + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.min_index && index <= self.max_index
    }
}
