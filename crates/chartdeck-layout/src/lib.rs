#![forbid(unsafe_code)]

//! ChartDeck Layout
//!
//! Grid layout model for multi-pane charting workspaces.
//!
//! # Key Components
//!
//! - [`LayoutState`] - The workspace aggregate: grid, panes, sync groups
//! - [`TemplateCatalog`] - Named grid templates, built in or loaded from JSON
//! - [`LayoutEngine`] - Template application and pane lifecycle operations
//! - [`SyncController`] - Group and global propagation of symbol, time range,
//!   zoom, and indicators
//! - [`WorkspaceSnapshot`] - Versioned persisted form of a layout
//!
//! # Role in ChartDeck
//! `chartdeck-layout` is pure state. It never renders and never holds
//! callbacks. `chartdeck-runtime` owns the current state and notifies
//! observers; `chartdeck-render` maps a state to grid styles or pixel rects.
//!
//! ```
//! use chartdeck_layout::{LayoutEngine, PaneUpdate};
//!
//! let engine = LayoutEngine::default();
//! let state = engine.initial_state("single", "600519");
//! let outcome = engine.add_pane(&state);
//! let state = outcome.into_state().unwrap();
//! assert_eq!(state.grid_size.cols, 2);
//!
//! let id = state.panes[1].id;
//! let next = engine.update_pane(&state, id, PaneUpdate::symbol("000001"));
//! assert!(next.is_applied());
//! ```

pub mod engine;
pub mod error;
pub mod grid;
pub mod pane;
pub mod state;
pub mod sync;
pub mod template;
pub mod workspace;

pub use engine::{
    LayoutEngine, LayoutOperation, LayoutOperationKind, LayoutOutcome, LayoutTransition,
    NoOpReason, PlacementPolicy,
};
pub use error::LayoutModelError;
pub use grid::{GridSize, PanePosition, PaneSpan};
pub use pane::{
    ChartPaneConfig, ChartType, IndicatorSet, PaneId, PaneUpdate, TimeFrame, TimeRange,
    UnknownTimeFrame, ZoomLevel,
};
pub use state::{
    GlobalSync, LayoutInvariantCode, LayoutInvariantIssue, LayoutInvariantReport,
    LayoutInvariantSeverity, LayoutState, SyncAxis, SyncGroup, SyncGroupId, SyncSettings,
};
pub use sync::SyncController;
pub use template::{
    AuditSeverity, CatalogAuditReport, CatalogError, CatalogFinding, LayoutTemplate,
    PaneBlueprint, TemplateCatalog, TemplateCategory,
};
pub use workspace::{
    MigrationResult, WORKSPACE_SCHEMA_VERSION, WorkspaceMetadata, WorkspaceMigrationError,
    WorkspaceSnapshot, WorkspaceValidationError, migrate_workspace, needs_migration,
};
