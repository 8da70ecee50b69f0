//! Layout engine: template application and pane lifecycle operations.
//!
//! Every operation reads a published [`LayoutState`], works on a private copy,
//! and returns a [`LayoutOutcome`]. An applied outcome carries the complete
//! next state; an unchanged outcome carries the reason. The input is never
//! mutated, so a failed or ignored operation cannot leave a partial state.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::PanePosition;
use crate::pane::{ChartPaneConfig, PaneId, PaneUpdate};
use crate::state::{GlobalSync, LayoutState, SyncAxis, SyncGroupId, SyncSettings};
use crate::sync::SyncController;
use crate::template::TemplateCatalog;

/// How `add_pane` decides whether a cell is free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// A cell is occupied only if it is some pane's origin. Spans are ignored,
    /// so a new pane may land inside a larger pane's area.
    #[default]
    OriginOnly,
    /// A cell is occupied if any pane's span covers it.
    SpanAware,
}

/// Serializable layout operation.
///
/// This is the single entry point the store dispatches through, and the form
/// operation traces are persisted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LayoutOperation {
    ApplyTemplate {
        template_id: String,
        default_symbol: String,
    },
    AddPane,
    RemovePane {
        pane_id: PaneId,
    },
    UpdatePane {
        pane_id: PaneId,
        update: PaneUpdate,
    },
    TogglePaneMaximize {
        pane_id: PaneId,
    },
    TogglePaneMinimize {
        pane_id: PaneId,
    },
    SelectPane {
        pane_id: Option<PaneId>,
    },
    SetDefaultSymbol {
        symbol: String,
    },
    SyncSymbolToAll {
        symbol: String,
        #[serde(default)]
        origin: Option<PaneId>,
    },
    CreateSyncGroup {
        name: String,
        pane_ids: BTreeSet<PaneId>,
        #[serde(default)]
        settings: SyncSettings,
    },
    RemoveSyncGroup {
        group_id: SyncGroupId,
    },
    JoinSyncGroup {
        group_id: SyncGroupId,
        pane_id: PaneId,
    },
    LeaveSyncGroup {
        group_id: SyncGroupId,
        pane_id: PaneId,
    },
    SetSyncSettings {
        group_id: SyncGroupId,
        settings: SyncSettings,
    },
    TogglePaneSync {
        pane_id: PaneId,
    },
    SetGlobalSync {
        global: GlobalSync,
    },
    SetMasterPane {
        pane_id: Option<PaneId>,
    },
}

impl LayoutOperation {
    #[must_use]
    pub const fn kind(&self) -> LayoutOperationKind {
        match self {
            Self::ApplyTemplate { .. } => LayoutOperationKind::ApplyTemplate,
            Self::AddPane => LayoutOperationKind::AddPane,
            Self::RemovePane { .. } => LayoutOperationKind::RemovePane,
            Self::UpdatePane { .. } => LayoutOperationKind::UpdatePane,
            Self::TogglePaneMaximize { .. } => LayoutOperationKind::TogglePaneMaximize,
            Self::TogglePaneMinimize { .. } => LayoutOperationKind::TogglePaneMinimize,
            Self::SelectPane { .. } => LayoutOperationKind::SelectPane,
            Self::SetDefaultSymbol { .. } => LayoutOperationKind::SetDefaultSymbol,
            Self::SyncSymbolToAll { .. } => LayoutOperationKind::SyncSymbolToAll,
            Self::CreateSyncGroup { .. } => LayoutOperationKind::CreateSyncGroup,
            Self::RemoveSyncGroup { .. } => LayoutOperationKind::RemoveSyncGroup,
            Self::JoinSyncGroup { .. } => LayoutOperationKind::JoinSyncGroup,
            Self::LeaveSyncGroup { .. } => LayoutOperationKind::LeaveSyncGroup,
            Self::SetSyncSettings { .. } => LayoutOperationKind::SetSyncSettings,
            Self::TogglePaneSync { .. } => LayoutOperationKind::TogglePaneSync,
            Self::SetGlobalSync { .. } => LayoutOperationKind::SetGlobalSync,
            Self::SetMasterPane { .. } => LayoutOperationKind::SetMasterPane,
        }
    }
}

/// Stable operation discriminator used in logs and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutOperationKind {
    ApplyTemplate,
    AddPane,
    RemovePane,
    UpdatePane,
    TogglePaneMaximize,
    TogglePaneMinimize,
    SelectPane,
    SetDefaultSymbol,
    SyncSymbolToAll,
    CreateSyncGroup,
    RemoveSyncGroup,
    JoinSyncGroup,
    LeaveSyncGroup,
    SetSyncSettings,
    TogglePaneSync,
    SetGlobalSync,
    SetMasterPane,
}

impl LayoutOperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplyTemplate => "apply_template",
            Self::AddPane => "add_pane",
            Self::RemovePane => "remove_pane",
            Self::UpdatePane => "update_pane",
            Self::TogglePaneMaximize => "toggle_pane_maximize",
            Self::TogglePaneMinimize => "toggle_pane_minimize",
            Self::SelectPane => "select_pane",
            Self::SetDefaultSymbol => "set_default_symbol",
            Self::SyncSymbolToAll => "sync_symbol_to_all",
            Self::CreateSyncGroup => "create_sync_group",
            Self::RemoveSyncGroup => "remove_sync_group",
            Self::JoinSyncGroup => "join_sync_group",
            Self::LeaveSyncGroup => "leave_sync_group",
            Self::SetSyncSettings => "set_sync_settings",
            Self::TogglePaneSync => "toggle_pane_sync",
            Self::SetGlobalSync => "set_global_sync",
            Self::SetMasterPane => "set_master_pane",
        }
    }
}

impl fmt::Display for LayoutOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an operation left the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoOpReason {
    UnknownTemplate { template_id: String },
    UnknownPaneId { pane_id: PaneId },
    UnknownSyncGroup { group_id: SyncGroupId },
    EmptySyncGroup,
    GlobalSyncDisabled { axis: SyncAxis },
    /// The pane id counter cannot advance further.
    PaneIdExhausted,
    /// The sync group id counter cannot advance further.
    SyncGroupIdExhausted,
    InvertedTimeRange { start_ms: i64, end_ms: i64 },
    /// The operation was valid but produced a state equal to the input.
    NothingChanged,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTemplate { template_id } => write!(f, "unknown template '{template_id}'"),
            Self::UnknownPaneId { pane_id } => write!(f, "unknown {pane_id}"),
            Self::UnknownSyncGroup { group_id } => write!(f, "unknown {group_id}"),
            Self::EmptySyncGroup => f.write_str("sync group would have no members"),
            Self::GlobalSyncDisabled { axis } => {
                write!(f, "global sync is off for {}", axis.as_str())
            }
            Self::PaneIdExhausted => f.write_str("no pane ids left"),
            Self::SyncGroupIdExhausted => f.write_str("no sync group ids left"),
            Self::InvertedTimeRange { start_ms, end_ms } => {
                write!(f, "time range ends before it starts ({start_ms} > {end_ms})")
            }
            Self::NothingChanged => f.write_str("nothing changed"),
        }
    }
}

/// A completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTransition {
    pub kind: LayoutOperationKind,
    pub state: LayoutState,
    /// Panes whose configuration, membership, or role changed.
    pub touched: BTreeSet<PaneId>,
    pub created_pane: Option<PaneId>,
    pub created_group: Option<SyncGroupId>,
    pub before_hash: u64,
    pub after_hash: u64,
}

/// Result of one layout operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutOutcome {
    Applied(Box<LayoutTransition>),
    Unchanged {
        kind: LayoutOperationKind,
        reason: NoOpReason,
    },
}

impl LayoutOutcome {
    #[must_use]
    pub const fn kind(&self) -> LayoutOperationKind {
        match self {
            Self::Applied(transition) => transition.kind,
            Self::Unchanged { kind, .. } => *kind,
        }
    }

    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The next state, if the operation applied.
    #[must_use]
    pub fn state(&self) -> Option<&LayoutState> {
        match self {
            Self::Applied(transition) => Some(&transition.state),
            Self::Unchanged { .. } => None,
        }
    }

    #[must_use]
    pub fn into_state(self) -> Option<LayoutState> {
        match self {
            Self::Applied(transition) => Some(transition.state),
            Self::Unchanged { .. } => None,
        }
    }

    #[must_use]
    pub fn transition(&self) -> Option<&LayoutTransition> {
        match self {
            Self::Applied(transition) => Some(transition),
            Self::Unchanged { .. } => None,
        }
    }

    #[must_use]
    pub fn created_pane(&self) -> Option<PaneId> {
        self.transition().and_then(|t| t.created_pane)
    }

    #[must_use]
    pub fn created_group(&self) -> Option<SyncGroupId> {
        self.transition().and_then(|t| t.created_group)
    }

    #[must_use]
    pub fn reason(&self) -> Option<&NoOpReason> {
        match self {
            Self::Applied(_) => None,
            Self::Unchanged { reason, .. } => Some(reason),
        }
    }
}

/// Working copy of a state plus what the operation did to it.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub(crate) state: LayoutState,
    pub(crate) touched: BTreeSet<PaneId>,
    pub(crate) created_pane: Option<PaneId>,
    pub(crate) created_group: Option<SyncGroupId>,
}

impl Draft {
    pub(crate) fn new(state: &LayoutState) -> Self {
        Self {
            state: state.clone(),
            touched: BTreeSet::new(),
            created_pane: None,
            created_group: None,
        }
    }
}

/// Applies layout operations against an injected template catalog.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    catalog: Arc<TemplateCatalog>,
    placement: PlacementPolicy,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(Arc::new(TemplateCatalog::builtin()))
    }
}

impl LayoutEngine {
    #[must_use]
    pub fn new(catalog: Arc<TemplateCatalog>) -> Self {
        Self {
            catalog,
            placement: PlacementPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_placement_policy(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn placement_policy(&self) -> PlacementPolicy {
        self.placement
    }

    /// Build a starting state from a template.
    ///
    /// Falls back to an empty 1x1 workspace when the template is unknown.
    #[must_use]
    pub fn initial_state(&self, template_id: &str, default_symbol: &str) -> LayoutState {
        let empty = LayoutState::new(default_symbol);
        self.apply_template(&empty, template_id, default_symbol)
            .into_state()
            .unwrap_or(empty)
    }

    /// Apply one operation.
    ///
    /// This is the only place outcomes are built and logged; the named
    /// methods below are thin wrappers.
    pub fn apply_operation(&self, state: &LayoutState, operation: &LayoutOperation) -> LayoutOutcome {
        let kind = operation.kind();
        let before_hash = state.state_hash();
        let result = self
            .run(state, operation)
            .and_then(|draft| {
                if draft.state == *state {
                    Err(NoOpReason::NothingChanged)
                } else {
                    Ok(draft)
                }
            });
        match result {
            Ok(draft) => {
                let after_hash = draft.state.state_hash();
                debug!(
                    target: "chartdeck.layout",
                    op = kind.as_str(),
                    touched = draft.touched.len(),
                    before_hash,
                    after_hash,
                    "layout operation applied"
                );
                LayoutOutcome::Applied(Box::new(LayoutTransition {
                    kind,
                    state: draft.state,
                    touched: draft.touched,
                    created_pane: draft.created_pane,
                    created_group: draft.created_group,
                    before_hash,
                    after_hash,
                }))
            }
            Err(reason) => {
                debug!(
                    target: "chartdeck.layout",
                    op = kind.as_str(),
                    reason = %reason,
                    state_hash = before_hash,
                    "layout operation ignored"
                );
                LayoutOutcome::Unchanged { kind, reason }
            }
        }
    }

    fn run(&self, state: &LayoutState, operation: &LayoutOperation) -> Result<Draft, NoOpReason> {
        match operation {
            LayoutOperation::ApplyTemplate {
                template_id,
                default_symbol,
            } => self.run_apply_template(state, template_id, default_symbol),
            LayoutOperation::AddPane => self.run_add_pane(state),
            LayoutOperation::RemovePane { pane_id } => run_remove_pane(state, *pane_id),
            LayoutOperation::UpdatePane { pane_id, update } => {
                run_update_pane(state, *pane_id, update)
            }
            LayoutOperation::TogglePaneMaximize { pane_id } => {
                run_toggle_display(state, *pane_id, |pane| pane.set_maximized(!pane.is_maximized))
            }
            LayoutOperation::TogglePaneMinimize { pane_id } => {
                run_toggle_display(state, *pane_id, |pane| pane.set_minimized(!pane.is_minimized))
            }
            LayoutOperation::SelectPane { pane_id } => run_select_pane(state, *pane_id),
            LayoutOperation::SetDefaultSymbol { symbol } => {
                let mut draft = Draft::new(state);
                draft.state.default_symbol.clone_from(symbol);
                Ok(draft)
            }
            LayoutOperation::SyncSymbolToAll { symbol, origin } => {
                SyncController::sync_symbol_to_all(state, symbol, *origin)
            }
            LayoutOperation::CreateSyncGroup {
                name,
                pane_ids,
                settings,
            } => SyncController::create_sync_group(state, name, pane_ids, *settings),
            LayoutOperation::RemoveSyncGroup { group_id } => {
                SyncController::remove_sync_group(state, *group_id)
            }
            LayoutOperation::JoinSyncGroup { group_id, pane_id } => {
                SyncController::join_sync_group(state, *group_id, *pane_id)
            }
            LayoutOperation::LeaveSyncGroup { group_id, pane_id } => {
                SyncController::leave_sync_group(state, *group_id, *pane_id)
            }
            LayoutOperation::SetSyncSettings { group_id, settings } => {
                SyncController::set_sync_settings(state, *group_id, *settings)
            }
            LayoutOperation::TogglePaneSync { pane_id } => {
                SyncController::toggle_pane_sync(state, *pane_id)
            }
            LayoutOperation::SetGlobalSync { global } => {
                Ok(SyncController::set_global_sync(state, *global))
            }
            LayoutOperation::SetMasterPane { pane_id } => {
                SyncController::set_master_pane(state, *pane_id)
            }
        }
    }

    pub fn apply_template(
        &self,
        state: &LayoutState,
        template_id: &str,
        default_symbol: &str,
    ) -> LayoutOutcome {
        self.apply_operation(
            state,
            &LayoutOperation::ApplyTemplate {
                template_id: template_id.to_owned(),
                default_symbol: default_symbol.to_owned(),
            },
        )
    }

    pub fn add_pane(&self, state: &LayoutState) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::AddPane)
    }

    pub fn remove_pane(&self, state: &LayoutState, pane_id: PaneId) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::RemovePane { pane_id })
    }

    pub fn update_pane(
        &self,
        state: &LayoutState,
        pane_id: PaneId,
        update: PaneUpdate,
    ) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::UpdatePane { pane_id, update })
    }

    pub fn toggle_pane_maximize(&self, state: &LayoutState, pane_id: PaneId) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::TogglePaneMaximize { pane_id })
    }

    pub fn toggle_pane_minimize(&self, state: &LayoutState, pane_id: PaneId) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::TogglePaneMinimize { pane_id })
    }

    pub fn select_pane(&self, state: &LayoutState, pane_id: Option<PaneId>) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::SelectPane { pane_id })
    }

    pub fn set_default_symbol(&self, state: &LayoutState, symbol: &str) -> LayoutOutcome {
        self.apply_operation(
            state,
            &LayoutOperation::SetDefaultSymbol {
                symbol: symbol.to_owned(),
            },
        )
    }

    pub fn sync_symbol_to_all(
        &self,
        state: &LayoutState,
        symbol: &str,
        origin: Option<PaneId>,
    ) -> LayoutOutcome {
        self.apply_operation(
            state,
            &LayoutOperation::SyncSymbolToAll {
                symbol: symbol.to_owned(),
                origin,
            },
        )
    }

    pub fn create_sync_group(
        &self,
        state: &LayoutState,
        name: &str,
        pane_ids: impl IntoIterator<Item = PaneId>,
        settings: SyncSettings,
    ) -> LayoutOutcome {
        self.apply_operation(
            state,
            &LayoutOperation::CreateSyncGroup {
                name: name.to_owned(),
                pane_ids: pane_ids.into_iter().collect(),
                settings,
            },
        )
    }

    pub fn remove_sync_group(&self, state: &LayoutState, group_id: SyncGroupId) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::RemoveSyncGroup { group_id })
    }

    pub fn join_sync_group(
        &self,
        state: &LayoutState,
        group_id: SyncGroupId,
        pane_id: PaneId,
    ) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::JoinSyncGroup { group_id, pane_id })
    }

    pub fn leave_sync_group(
        &self,
        state: &LayoutState,
        group_id: SyncGroupId,
        pane_id: PaneId,
    ) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::LeaveSyncGroup { group_id, pane_id })
    }

    pub fn set_sync_settings(
        &self,
        state: &LayoutState,
        group_id: SyncGroupId,
        settings: SyncSettings,
    ) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::SetSyncSettings { group_id, settings })
    }

    pub fn toggle_pane_sync(&self, state: &LayoutState, pane_id: PaneId) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::TogglePaneSync { pane_id })
    }

    pub fn set_global_sync(&self, state: &LayoutState, global: GlobalSync) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::SetGlobalSync { global })
    }

    pub fn set_master_pane(&self, state: &LayoutState, pane_id: Option<PaneId>) -> LayoutOutcome {
        self.apply_operation(state, &LayoutOperation::SetMasterPane { pane_id })
    }

    /// First free cell in row-major order under this engine's policy.
    #[must_use]
    pub fn find_free_cell(&self, state: &LayoutState) -> Option<PanePosition> {
        let occupied: FxHashSet<PanePosition> = match self.placement {
            PlacementPolicy::OriginOnly => state.panes.iter().map(|pane| pane.position).collect(),
            PlacementPolicy::SpanAware => state
                .panes
                .iter()
                .flat_map(|pane| pane.size.cells_from(pane.position))
                .collect(),
        };
        state.grid_size.cells().find(|cell| !occupied.contains(cell))
    }

    fn run_apply_template(
        &self,
        state: &LayoutState,
        template_id: &str,
        default_symbol: &str,
    ) -> Result<Draft, NoOpReason> {
        let template = self
            .catalog
            .get(template_id)
            .ok_or_else(|| NoOpReason::UnknownTemplate {
                template_id: template_id.to_owned(),
            })?;
        let mut draft = Draft::new(state);
        let next = &mut draft.state;
        let mut panes = Vec::with_capacity(template.panes.len());
        for blueprint in &template.panes {
            let id = next
                .mint_pane_id()
                .map_err(|_| NoOpReason::PaneIdExhausted)?;
            panes.push(blueprint.instantiate(id, default_symbol));
        }
        draft.touched = panes.iter().map(|pane| pane.id).collect();
        next.panes = panes;
        next.grid_size = template.grid_size;
        next.current_template_id = Some(template.id.clone());
        next.default_symbol = default_symbol.to_owned();
        next.sync_groups.clear();
        next.selected_pane = None;
        next.global_sync.master_pane_id = None;
        Ok(draft)
    }

    fn run_add_pane(&self, state: &LayoutState) -> Result<Draft, NoOpReason> {
        let mut draft = Draft::new(state);
        let position = match self.find_free_cell(state) {
            Some(cell) => cell,
            None => {
                let old_cols = state.grid_size.cols;
                draft.state.grid_size = state.grid_size.widened();
                PanePosition::new(0, old_cols)
            }
        };
        let id = draft
            .state
            .mint_pane_id()
            .map_err(|_| NoOpReason::PaneIdExhausted)?;
        let pane = ChartPaneConfig::new(id, state.default_symbol.clone(), position);
        draft.state.panes.push(pane);
        draft.touched.insert(id);
        draft.created_pane = Some(id);
        Ok(draft)
    }
}

fn run_remove_pane(state: &LayoutState, pane_id: PaneId) -> Result<Draft, NoOpReason> {
    if !state.contains_pane(pane_id) {
        return Err(NoOpReason::UnknownPaneId { pane_id });
    }
    let mut draft = Draft::new(state);
    draft.state.panes.retain(|pane| pane.id != pane_id);
    draft.state.forget_pane(pane_id);
    draft.touched.insert(pane_id);
    Ok(draft)
}

fn run_update_pane(
    state: &LayoutState,
    pane_id: PaneId,
    update: &PaneUpdate,
) -> Result<Draft, NoOpReason> {
    if !state.contains_pane(pane_id) {
        return Err(NoOpReason::UnknownPaneId { pane_id });
    }
    if update.is_empty() {
        return Err(NoOpReason::NothingChanged);
    }
    if let Some(range) = update.time_range.filter(|range| !range.is_ordered()) {
        return Err(NoOpReason::InvertedTimeRange {
            start_ms: range.start_ms,
            end_ms: range.end_ms,
        });
    }
    let mut draft = Draft::new(state);
    let grid = draft.state.grid_size;
    let pane = draft
        .state
        .pane_mut(pane_id)
        .ok_or(NoOpReason::UnknownPaneId { pane_id })?;
    if pane.apply(update) {
        draft.touched.insert(pane_id);
    }
    if update.position.is_some() || update.size.is_some() {
        (pane.position, pane.size) = grid.clamp(pane.position, pane.size);
    }
    SyncController::propagate(&mut draft.state, pane_id, update, &mut draft.touched);
    Ok(draft)
}

fn run_toggle_display(
    state: &LayoutState,
    pane_id: PaneId,
    toggle: impl FnOnce(&mut ChartPaneConfig),
) -> Result<Draft, NoOpReason> {
    let mut draft = Draft::new(state);
    let pane = draft
        .state
        .pane_mut(pane_id)
        .ok_or(NoOpReason::UnknownPaneId { pane_id })?;
    toggle(pane);
    draft.touched.insert(pane_id);
    Ok(draft)
}

fn run_select_pane(state: &LayoutState, pane_id: Option<PaneId>) -> Result<Draft, NoOpReason> {
    if let Some(pane_id) = pane_id
        && !state.contains_pane(pane_id)
    {
        return Err(NoOpReason::UnknownPaneId { pane_id });
    }
    let mut draft = Draft::new(state);
    draft.state.selected_pane = pane_id;
    Ok(draft)
}
