#![forbid(unsafe_code)]

//! ChartDeck Render
//!
//! Turns a [`LayoutState`](chartdeck_layout::LayoutState) into placements and
//! widget requests. Nothing here draws pixels: the host surface applies the
//! placements and the external chart and order-book widgets draw content.
//!
//! - [`style`] - CSS grid container and pane placement
//! - [`content`] - chart type to widget dispatch
//! - [`backend`] - [`LayoutBackend`] implementations and [`plan_frame`]

pub mod backend;
pub mod content;
pub mod style;

pub use backend::{
    CellRect, CellRectBackend, CssGridBackend, FramePlan, LayoutBackend, PanePlacement, plan_frame,
};
pub use content::{
    ChartRequest, ChartWidget, ContentRequest, IndicatorFlags, OrderBookRequest, OrderBookWidget,
    dispatch_content, render_pane_content,
};
pub use style::{
    BASE_Z_INDEX, GridLine, GridStyle, MAXIMIZED_Z_INDEX, PaneStyle, calculate_grid_style,
    calculate_pane_style,
};
