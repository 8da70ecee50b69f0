//! Pane synchronization: sync groups, global sync, and axis propagation.
//!
//! Propagation is symmetric. Any member's change reaches every other member
//! of each group it shares with the origin for that axis; `master_pane_id` is
//! display emphasis only.
//!
//! Every function here works on a draft copy of the state and changes all
//! affected panes in one pass. Callers publish the draft as a single new
//! state, so observers never see a half-synchronized layout and a propagated
//! change never re-enters propagation.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::engine::{Draft, NoOpReason};
use crate::pane::{ChartPaneConfig, PaneId, PaneUpdate};
use crate::state::{GlobalSync, LayoutState, SyncAxis, SyncGroup, SyncGroupId, SyncSettings};

/// Stateless synchronization controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncController;

impl SyncController {
    /// Set `symbol` on every pane if global symbol sync is on.
    pub(crate) fn sync_symbol_to_all(
        state: &LayoutState,
        symbol: &str,
        origin: Option<PaneId>,
    ) -> Result<Draft, NoOpReason> {
        if !state.global_sync.shares(SyncAxis::Symbol) {
            return Err(NoOpReason::GlobalSyncDisabled {
                axis: SyncAxis::Symbol,
            });
        }
        if let Some(origin) = origin
            && !state.contains_pane(origin)
        {
            return Err(NoOpReason::UnknownPaneId { pane_id: origin });
        }
        let mut draft = Draft::new(state);
        for pane in &mut draft.state.panes {
            if pane.symbol != symbol {
                pane.symbol = symbol.to_owned();
                draft.touched.insert(pane.id);
            }
        }
        Ok(draft)
    }

    /// Push the axes set in `update` from `origin` to its peers.
    ///
    /// `state` already carries the merged origin pane; values are read back
    /// from it so receivers get exactly what the origin stored.
    pub(crate) fn propagate(
        state: &mut LayoutState,
        origin: PaneId,
        update: &PaneUpdate,
        touched: &mut BTreeSet<PaneId>,
    ) {
        let Some(source) = state.pane(origin).cloned() else {
            return;
        };
        for axis in SyncAxis::ALL {
            if !updates_axis(update, axis) {
                continue;
            }
            let peers = Self::peers(state, &source, axis);
            if peers.is_empty() {
                continue;
            }
            for pane in state.panes.iter_mut().filter(|p| peers.contains(&p.id)) {
                if copy_axis(&source, pane, axis) {
                    touched.insert(pane.id);
                }
            }
        }
    }

    /// Panes other than `source` that follow it on `axis`.
    ///
    /// Global sync reaches every pane. Group sync requires the origin and the
    /// receiver to have `sync_enabled` and the group to share the axis.
    #[must_use]
    pub fn peers(state: &LayoutState, source: &ChartPaneConfig, axis: SyncAxis) -> FxHashSet<PaneId> {
        let mut peers = FxHashSet::default();
        if state.global_sync.shares(axis) {
            peers.extend(state.pane_ids().filter(|id| *id != source.id));
        }
        if source.sync_enabled {
            let enabled: FxHashSet<PaneId> = state
                .panes
                .iter()
                .filter(|pane| pane.sync_enabled)
                .map(|pane| pane.id)
                .collect();
            for group in state
                .groups_of(source.id)
                .filter(|group| group.settings.shares(axis))
            {
                peers.extend(
                    group
                        .pane_ids
                        .iter()
                        .copied()
                        .filter(|id| *id != source.id && enabled.contains(id)),
                );
            }
        }
        peers
    }

    pub(crate) fn create_sync_group(
        state: &LayoutState,
        name: &str,
        pane_ids: &BTreeSet<PaneId>,
        settings: SyncSettings,
    ) -> Result<Draft, NoOpReason> {
        let members: BTreeSet<PaneId> = pane_ids
            .iter()
            .copied()
            .filter(|id| state.contains_pane(*id))
            .collect();
        if members.is_empty() {
            return Err(NoOpReason::EmptySyncGroup);
        }
        let mut draft = Draft::new(state);
        let id = draft
            .state
            .mint_group_id()
            .map_err(|_| NoOpReason::SyncGroupIdExhausted)?;
        for pane in draft
            .state
            .panes
            .iter_mut()
            .filter(|p| members.contains(&p.id))
        {
            pane.sync_enabled = true;
        }
        draft.touched.extend(members.iter().copied());
        draft.state.sync_groups.insert(
            id,
            SyncGroup {
                id,
                name: name.to_owned(),
                pane_ids: members,
                settings,
            },
        );
        draft.created_group = Some(id);
        Ok(draft)
    }

    pub(crate) fn remove_sync_group(
        state: &LayoutState,
        group_id: SyncGroupId,
    ) -> Result<Draft, NoOpReason> {
        let mut draft = Draft::new(state);
        let group = draft
            .state
            .sync_groups
            .remove(&group_id)
            .ok_or(NoOpReason::UnknownSyncGroup { group_id })?;
        draft.touched.extend(group.pane_ids);
        Ok(draft)
    }

    pub(crate) fn join_sync_group(
        state: &LayoutState,
        group_id: SyncGroupId,
        pane_id: PaneId,
    ) -> Result<Draft, NoOpReason> {
        let mut draft = Draft::new(state);
        let pane = draft
            .state
            .pane_mut(pane_id)
            .ok_or(NoOpReason::UnknownPaneId { pane_id })?;
        pane.sync_enabled = true;
        let group = draft
            .state
            .sync_groups
            .get_mut(&group_id)
            .ok_or(NoOpReason::UnknownSyncGroup { group_id })?;
        group.pane_ids.insert(pane_id);
        draft.touched.insert(pane_id);
        Ok(draft)
    }

    pub(crate) fn leave_sync_group(
        state: &LayoutState,
        group_id: SyncGroupId,
        pane_id: PaneId,
    ) -> Result<Draft, NoOpReason> {
        if !state.contains_pane(pane_id) {
            return Err(NoOpReason::UnknownPaneId { pane_id });
        }
        let mut draft = Draft::new(state);
        let group = draft
            .state
            .sync_groups
            .get_mut(&group_id)
            .ok_or(NoOpReason::UnknownSyncGroup { group_id })?;
        if group.pane_ids.remove(&pane_id) {
            draft.touched.insert(pane_id);
        }
        if group.pane_ids.is_empty() {
            draft.state.sync_groups.remove(&group_id);
        }
        Ok(draft)
    }

    pub(crate) fn set_sync_settings(
        state: &LayoutState,
        group_id: SyncGroupId,
        settings: SyncSettings,
    ) -> Result<Draft, NoOpReason> {
        let mut draft = Draft::new(state);
        let group = draft
            .state
            .sync_groups
            .get_mut(&group_id)
            .ok_or(NoOpReason::UnknownSyncGroup { group_id })?;
        group.settings = settings;
        Ok(draft)
    }

    pub(crate) fn toggle_pane_sync(
        state: &LayoutState,
        pane_id: PaneId,
    ) -> Result<Draft, NoOpReason> {
        let mut draft = Draft::new(state);
        let pane = draft
            .state
            .pane_mut(pane_id)
            .ok_or(NoOpReason::UnknownPaneId { pane_id })?;
        pane.sync_enabled = !pane.sync_enabled;
        draft.touched.insert(pane_id);
        Ok(draft)
    }

    /// Replace the global sync switch. A master that is not a live pane is dropped.
    pub(crate) fn set_global_sync(state: &LayoutState, global: GlobalSync) -> Draft {
        let mut draft = Draft::new(state);
        draft.state.global_sync = GlobalSync {
            master_pane_id: global
                .master_pane_id
                .filter(|id| state.contains_pane(*id)),
            ..global
        };
        draft
    }

    pub(crate) fn set_master_pane(
        state: &LayoutState,
        pane_id: Option<PaneId>,
    ) -> Result<Draft, NoOpReason> {
        if let Some(pane_id) = pane_id
            && !state.contains_pane(pane_id)
        {
            return Err(NoOpReason::UnknownPaneId { pane_id });
        }
        let mut draft = Draft::new(state);
        draft.state.global_sync.master_pane_id = pane_id;
        draft.touched.extend(pane_id);
        Ok(draft)
    }
}

fn updates_axis(update: &PaneUpdate, axis: SyncAxis) -> bool {
    match axis {
        SyncAxis::Symbol => update.symbol.is_some(),
        SyncAxis::TimeRange => update.time_range.is_some(),
        SyncAxis::Zoom => update.zoom.is_some(),
        SyncAxis::Indicators => update.indicators.is_some(),
    }
}

/// Copy one axis value from `source` into `target`. Returns true if it changed.
fn copy_axis(source: &ChartPaneConfig, target: &mut ChartPaneConfig, axis: SyncAxis) -> bool {
    match axis {
        SyncAxis::Symbol if target.symbol != source.symbol => {
            target.symbol.clone_from(&source.symbol);
            true
        }
        SyncAxis::TimeRange if target.time_range != source.time_range => {
            target.time_range = source.time_range;
            true
        }
        SyncAxis::Zoom if target.zoom != source.zoom => {
            target.zoom = source.zoom;
            true
        }
        SyncAxis::Indicators if target.indicators != source.indicators => {
            target.indicators.clone_from(&source.indicators);
            true
        }
        _ => false,
    }
}
