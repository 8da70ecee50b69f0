#![forbid(unsafe_code)]

//! Placement backends.
//!
//! The same [`LayoutState`] drives two surfaces:
//!
//! - **Pane grid mode** ([`CssGridBackend`]): the host lays panes out with
//!   CSS grid placement directives.
//! - **Widget mode** ([`CellRectBackend`]): the host positions widgets
//!   absolutely, so every pane gets a pixel rectangle.
//!
//! [`plan_frame`] runs one backend over a state and returns placements in
//! paint order, with a maximized pane painted last.

use chartdeck_layout::{ChartPaneConfig, GridSize, LayoutState, PaneId};
use serde::Serialize;
use tracing::trace;

use crate::content::{ContentRequest, render_pane_content};
use crate::style::{
    BASE_Z_INDEX, GridStyle, MAXIMIZED_Z_INDEX, PaneStyle, calculate_grid_style,
    calculate_pane_style,
};

/// Maps panes to surface-specific placements.
pub trait LayoutBackend {
    type Placement: Clone + PartialEq + std::fmt::Debug;

    /// Placement for `pane` in a grid of `grid` cells.
    fn place(&self, grid: GridSize, pane: &ChartPaneConfig) -> Self::Placement;
}

/// Pane grid mode: CSS grid lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CssGridBackend {
    pub container_height_px: u32,
    pub gap_px: u16,
}

impl CssGridBackend {
    #[must_use]
    pub const fn new(container_height_px: u32, gap_px: u16) -> Self {
        Self {
            container_height_px,
            gap_px,
        }
    }

    /// Container geometry for `grid`.
    #[must_use]
    pub fn grid_style(&self, grid: GridSize) -> GridStyle {
        calculate_grid_style(grid, self.container_height_px, self.gap_px)
    }
}

impl LayoutBackend for CssGridBackend {
    type Placement = PaneStyle;

    fn place(&self, _grid: GridSize, pane: &ChartPaneConfig) -> PaneStyle {
        calculate_pane_style(pane)
    }
}

/// Absolute pixel rectangle for widget mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub z_index: i32,
    pub collapsed: bool,
}

/// Widget mode: fixed cell size plus spacing between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRectBackend {
    pub cell_width_px: u32,
    pub cell_height_px: u32,
    pub spacing_px: u32,
}

impl CellRectBackend {
    #[must_use]
    pub const fn new(cell_width_px: u32, cell_height_px: u32, spacing_px: u32) -> Self {
        Self {
            cell_width_px,
            cell_height_px,
            spacing_px,
        }
    }

    /// Pixel extent of `cells` tracks of `cell` pixels.
    fn extent(&self, cell: u32, cells: u16) -> u32 {
        let cells = u32::from(cells);
        cell.saturating_mul(cells)
            .saturating_add(self.spacing_px.saturating_mul(cells.saturating_sub(1)))
    }

    fn offset(&self, cell: u32, index: u16) -> u32 {
        cell.saturating_add(self.spacing_px)
            .saturating_mul(u32::from(index))
    }

    /// Size of the whole grid in pixels.
    #[must_use]
    pub fn surface(&self, grid: GridSize) -> (u32, u32) {
        (
            self.extent(self.cell_width_px, grid.cols),
            self.extent(self.cell_height_px, grid.rows),
        )
    }
}

impl LayoutBackend for CellRectBackend {
    type Placement = CellRect;

    fn place(&self, grid: GridSize, pane: &ChartPaneConfig) -> CellRect {
        if pane.is_maximized {
            let (width, height) = self.surface(grid);
            return CellRect {
                x: 0,
                y: 0,
                width,
                height,
                z_index: MAXIMIZED_Z_INDEX,
                collapsed: false,
            };
        }
        CellRect {
            x: self.offset(self.cell_width_px, pane.position.col),
            y: self.offset(self.cell_height_px, pane.position.row),
            width: self.extent(self.cell_width_px, pane.size.cols),
            height: self.extent(self.cell_height_px, pane.size.rows),
            z_index: BASE_Z_INDEX,
            collapsed: pane.is_minimized,
        }
    }
}

/// One pane's placement and content.
#[derive(Debug, Clone, PartialEq)]
pub struct PanePlacement<P> {
    pub pane_id: PaneId,
    pub placement: P,
    pub content: ContentRequest,
}

/// Everything a surface needs to draw one state.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan<P> {
    pub grid: GridSize,
    /// Paint order: panes in state order, maximized panes last.
    pub placements: Vec<PanePlacement<P>>,
}

impl<P> FramePlan<P> {
    #[must_use]
    pub fn get(&self, pane_id: PaneId) -> Option<&PanePlacement<P>> {
        self.placements.iter().find(|p| p.pane_id == pane_id)
    }
}

/// Place every pane of `state` with `backend`.
pub fn plan_frame<B: LayoutBackend>(state: &LayoutState, backend: &B) -> FramePlan<B::Placement> {
    let (maximized, regular): (Vec<_>, Vec<_>) =
        state.panes.iter().partition(|pane| pane.is_maximized);

    let placements: Vec<_> = regular
        .into_iter()
        .chain(maximized)
        .map(|pane| PanePlacement {
            pane_id: pane.id,
            placement: backend.place(state.grid_size, pane),
            content: render_pane_content(pane),
        })
        .collect();

    trace!(
        target: "chartdeck.render",
        panes = placements.len(),
        rows = state.grid_size.rows,
        cols = state.grid_size.cols,
        "frame planned"
    );

    FramePlan {
        grid: state.grid_size,
        placements,
    }
}
