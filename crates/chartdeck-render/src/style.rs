#![forbid(unsafe_code)]

//! CSS grid placement for pane grid mode.
//!
//! The model is 0-indexed; grid lines are 1-indexed. A pane at
//! `{row: 0, col: 1}` spanning `2x1` becomes `grid-row: 1 / span 2;
//! grid-column: 2 / span 1`.

use std::fmt;

use chartdeck_layout::{ChartPaneConfig, GridSize};
use serde::Serialize;

/// Stacking order for panes in their grid cells.
pub const BASE_Z_INDEX: i32 = 1;
/// Stacking order for a maximized pane, above every other pane.
pub const MAXIMIZED_Z_INDEX: i32 = 10;

/// Track geometry for the grid container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridStyle {
    pub rows: u16,
    pub cols: u16,
    pub gap_px: u16,
    /// Height of one row track after subtracting gaps.
    pub row_height_px: u32,
}

impl GridStyle {
    /// `grid-template-rows` value.
    #[must_use]
    pub fn template_rows(&self) -> String {
        format!("repeat({}, 1fr)", self.rows)
    }

    /// `grid-template-columns` value.
    #[must_use]
    pub fn template_columns(&self) -> String {
        format!("repeat({}, 1fr)", self.cols)
    }

    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "display: grid; grid-template-rows: {}; grid-template-columns: {}; gap: {}px;",
            self.template_rows(),
            self.template_columns(),
            self.gap_px
        )
    }
}

/// Equal `1fr` tracks for `grid`, with the row height that fits
/// `container_height_px` once gaps are taken out.
#[must_use]
pub fn calculate_grid_style(grid: GridSize, container_height_px: u32, gap_px: u16) -> GridStyle {
    let rows = u32::from(grid.rows.max(1));
    let gaps = u32::from(gap_px).saturating_mul(rows - 1);
    GridStyle {
        rows: grid.rows,
        cols: grid.cols,
        gap_px,
        row_height_px: container_height_px.saturating_sub(gaps) / rows,
    }
}

/// One axis of a grid placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridLine {
    /// `start / span n`, 1-indexed.
    Span { start: u16, span: u16 },
    /// `1 / -1`: the whole axis.
    Full,
}

impl fmt::Display for GridLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Span { start, span } => write!(f, "{start} / span {span}"),
            Self::Full => f.write_str("1 / -1"),
        }
    }
}

/// Placement of one pane inside the grid container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaneStyle {
    pub grid_row: GridLine,
    pub grid_column: GridLine,
    pub z_index: i32,
    /// Minimized panes keep their cell but render only a header.
    pub collapsed: bool,
}

impl PaneStyle {
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "grid-row: {}; grid-column: {}; z-index: {};",
            self.grid_row, self.grid_column, self.z_index
        )
    }
}

/// Grid placement for `pane`.
#[must_use]
pub fn calculate_pane_style(pane: &ChartPaneConfig) -> PaneStyle {
    if pane.is_maximized {
        return PaneStyle {
            grid_row: GridLine::Full,
            grid_column: GridLine::Full,
            z_index: MAXIMIZED_Z_INDEX,
            collapsed: false,
        };
    }
    PaneStyle {
        grid_row: GridLine::Span {
            start: pane.position.row.saturating_add(1),
            span: pane.size.rows,
        },
        grid_column: GridLine::Span {
            start: pane.position.col.saturating_add(1),
            span: pane.size.cols,
        },
        z_index: BASE_Z_INDEX,
        collapsed: pane.is_minimized,
    }
}
