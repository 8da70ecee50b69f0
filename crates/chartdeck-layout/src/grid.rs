//! Grid geometry: grid dimensions, pane origins, and spans.
//!
//! All coordinates are 0-indexed cells. A pane occupies the rectangle that
//! starts at its [`PanePosition`] and extends over its [`PaneSpan`].

use serde::{Deserialize, Serialize};

use crate::error::LayoutModelError;

/// Number of rows and columns in the workspace grid. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u16,
    pub cols: u16,
}

impl GridSize {
    /// A one-cell grid.
    pub const UNIT: Self = Self { rows: 1, cols: 1 };

    /// Create a grid size, rejecting zero dimensions.
    pub fn new(rows: u16, cols: u16) -> Result<Self, LayoutModelError> {
        if rows == 0 || cols == 0 {
            return Err(LayoutModelError::ZeroGridDimension { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// True if both dimensions are non-zero.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.rows > 0 && self.cols > 0
    }

    /// The grid one column wider.
    #[must_use]
    pub const fn widened(self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols.saturating_add(1),
        }
    }

    /// True if a pane placed at `position` with `span` lies fully inside the grid.
    #[must_use]
    pub fn contains(self, position: PanePosition, span: PaneSpan) -> bool {
        u32::from(position.row) + u32::from(span.rows) <= u32::from(self.rows)
            && u32::from(position.col) + u32::from(span.cols) <= u32::from(self.cols)
    }

    /// Iterate every cell in row-major order (row outer, column inner).
    pub fn cells(self) -> impl Iterator<Item = PanePosition> {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| PanePosition { row, col }))
    }

    /// Clamp a placement so it fits inside the grid.
    ///
    /// The origin is pulled back onto the last row/column if needed, then the
    /// span is shrunk to the remaining cells (never below 1).
    #[must_use]
    pub fn clamp(self, position: PanePosition, span: PaneSpan) -> (PanePosition, PaneSpan) {
        if !self.is_valid() {
            return (position, span);
        }
        let row = position.row.min(self.rows.saturating_sub(1));
        let col = position.col.min(self.cols.saturating_sub(1));
        let rows = span.rows.clamp(1, self.rows - row);
        let cols = span.cols.clamp(1, self.cols - col);
        (PanePosition { row, col }, PaneSpan { rows, cols })
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Origin cell of a pane.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PanePosition {
    pub row: u16,
    pub col: u16,
}

impl PanePosition {
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

/// Number of cells a pane covers from its origin. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneSpan {
    pub rows: u16,
    pub cols: u16,
}

impl PaneSpan {
    /// A single cell.
    pub const UNIT: Self = Self { rows: 1, cols: 1 };

    /// Create a span, rejecting zero extents.
    pub fn new(rows: u16, cols: u16) -> Result<Self, LayoutModelError> {
        if rows == 0 || cols == 0 {
            return Err(LayoutModelError::ZeroSpan { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    /// True if a pane with this span at `origin` covers `cell`.
    #[must_use]
    pub fn covers(self, origin: PanePosition, cell: PanePosition) -> bool {
        cell.row >= origin.row
            && cell.col >= origin.col
            && u32::from(cell.row) < u32::from(origin.row) + u32::from(self.rows)
            && u32::from(cell.col) < u32::from(origin.col) + u32::from(self.cols)
    }

    /// Iterate the cells covered at `origin`, row-major.
    pub fn cells_from(self, origin: PanePosition) -> impl Iterator<Item = PanePosition> {
        (0..self.rows).flat_map(move |dr| {
            (0..self.cols).map(move |dc| PanePosition {
                row: origin.row.saturating_add(dr),
                col: origin.col.saturating_add(dc),
            })
        })
    }
}

impl Default for PaneSpan {
    fn default() -> Self {
        Self::UNIT
    }
}
