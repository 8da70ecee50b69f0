//! Model construction and validation errors.

use thiserror::Error;

use crate::pane::PaneId;
use crate::state::SyncGroupId;

/// Errors raised when building or validating layout model values.
///
/// UI-driven operations never return these; they report
/// [`LayoutOutcome::Unchanged`](crate::engine::LayoutOutcome::Unchanged)
/// instead. These errors surface from constructors, deserialized snapshots,
/// and [`LayoutState::validate`](crate::state::LayoutState::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutModelError {
    #[error("pane id 0 is reserved")]
    ZeroPaneId,
    #[error("sync group id 0 is reserved")]
    ZeroSyncGroupId,
    #[error("pane id overflow after {current}")]
    PaneIdOverflow { current: PaneId },
    #[error("sync group id overflow after {current}")]
    SyncGroupIdOverflow { current: SyncGroupId },
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    ZeroGridDimension { rows: u16, cols: u16 },
    #[error("pane span must cover at least one cell (got {rows}x{cols})")]
    ZeroSpan { rows: u16, cols: u16 },
    #[error("time range ends before it starts ({start_ms} > {end_ms})")]
    InvertedTimeRange { start_ms: i64, end_ms: i64 },
    #[error("duplicate pane id {pane_id}")]
    DuplicatePaneId { pane_id: PaneId },
    #[error(
        "pane {pane_id} at ({row},{col}) spanning {rows}x{cols} exceeds grid {grid_rows}x{grid_cols}"
    )]
    PlacementOutOfBounds {
        pane_id: PaneId,
        row: u16,
        col: u16,
        rows: u16,
        cols: u16,
        grid_rows: u16,
        grid_cols: u16,
    },
    #[error("pane {pane_id} has inverted time range ({start_ms} > {end_ms})")]
    PaneTimeRangeInverted {
        pane_id: PaneId,
        start_ms: i64,
        end_ms: i64,
    },
    #[error("pane {pane_id} is both maximized and minimized")]
    ConflictingDisplayFlags { pane_id: PaneId },
    #[error("sync group {group_id} references missing pane {pane_id}")]
    DanglingSyncMember {
        group_id: SyncGroupId,
        pane_id: PaneId,
    },
    #[error("sync group stored under key {key} carries id {group_id}")]
    SyncGroupKeyMismatch {
        key: SyncGroupId,
        group_id: SyncGroupId,
    },
    #[error("{role} references missing pane {pane_id}")]
    DanglingPaneReference { role: &'static str, pane_id: PaneId },
    #[error("next pane id {next_id} is not greater than existing {max_existing}")]
    NextIdNotGreaterThanExisting {
        next_id: PaneId,
        max_existing: PaneId,
    },
    #[error("next sync group id {next_id} is not greater than existing {max_existing}")]
    NextGroupIdNotGreaterThanExisting {
        next_id: SyncGroupId,
        max_existing: SyncGroupId,
    },
}
