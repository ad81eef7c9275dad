use crate::options::Columns;
use crate::{Padding, Spacing};

/// Column geometry derived from the container width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub container_width: u32,
    pub column_count: usize,
    pub item_width: u32,
    /// x of the first column; the row block is centered inside the padded container.
    pub left_offset: u32,
    pub padding: Padding,
    pub spacing: Spacing,
}

impl Geometry {
    /// Derives the column layout for `container_width`.
    ///
    /// Starting at the column cap, the count is lowered until a row of `max_width` items
    /// with one column fewer would no longer cover the available width, then further until
    /// a row of `min_width` items fits. The item width is then the widest value in
    /// `[min_width, max_width]` whose row fits.
    pub fn compute(
        container_width: u32,
        padding: Padding,
        spacing: Spacing,
        min_width: u32,
        max_width: u32,
        columns: Columns,
    ) -> Self {
        let available = container_width.saturating_sub(padding.horizontal()) as u64;
        let gap = spacing.cols as u64;
        let min_width = min_width.max(1);
        let max_width = max_width.max(min_width);

        let mut cols = columns.cap();
        while cols > 1 && row_width(cols - 1, max_width, gap) >= available {
            cols -= 1;
        }
        while cols > 1 && row_width(cols, min_width, gap) > available {
            cols -= 1;
        }

        let gaps = gap * (cols as u64 - 1);
        let fitted = available.saturating_sub(gaps) / cols as u64;
        let item_width = (fitted.min(max_width as u64) as u32).max(min_width);

        let used = row_width(cols, item_width, gap);
        let slack = available.saturating_sub(used) / 2;
        Self {
            container_width,
            column_count: cols,
            item_width,
            left_offset: padding.left.saturating_add(slack as u32),
            padding,
            spacing,
        }
    }

    /// x of the left edge of `column`.
    pub fn column_left(&self, column: usize) -> u32 {
        let stride = self.item_width.saturating_add(self.spacing.cols);
        self.left_offset
            .saturating_add(stride.saturating_mul(column as u32))
    }

    /// Total width of one row of items, spacing included.
    pub fn row_width(&self) -> u64 {
        row_width(self.column_count, self.item_width, self.spacing.cols as u64)
    }
}

fn row_width(cols: usize, width: u32, gap: u64) -> u64 {
    if cols == 0 {
        return 0;
    }
    cols as u64 * width as u64 + (cols as u64 - 1) * gap
}
