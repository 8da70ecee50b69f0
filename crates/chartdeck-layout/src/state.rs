//! The layout aggregate: panes, grid, sync groups, and global sync.
//!
//! [`LayoutState`] is a plain value. The engine and the sync controller never
//! mutate a published state; they clone it, change the clone, and hand the
//! complete next state back to the owner.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::LayoutModelError;
use crate::grid::GridSize;
use crate::pane::{ChartPaneConfig, PaneId};

/// Current layout state schema version.
pub const LAYOUT_STATE_SCHEMA_VERSION: u16 = 1;

/// Stable identifier for a sync group. `0` is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SyncGroupId(u64);

impl SyncGroupId {
    pub const MIN: Self = Self(1);

    pub fn new(raw: u64) -> Result<Self, LayoutModelError> {
        if raw == 0 {
            return Err(LayoutModelError::ZeroSyncGroupId);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, LayoutModelError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(LayoutModelError::SyncGroupIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl TryFrom<u64> for SyncGroupId {
    type Error = LayoutModelError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<SyncGroupId> for u64 {
    fn from(id: SyncGroupId) -> Self {
        id.0
    }
}

impl Default for SyncGroupId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for SyncGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// A dimension along which panes can be synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAxis {
    Symbol,
    TimeRange,
    Zoom,
    Indicators,
}

impl SyncAxis {
    pub const ALL: [SyncAxis; 4] = [
        SyncAxis::Symbol,
        SyncAxis::TimeRange,
        SyncAxis::Zoom,
        SyncAxis::Indicators,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncAxis::Symbol => "symbol",
            SyncAxis::TimeRange => "time_range",
            SyncAxis::Zoom => "zoom",
            SyncAxis::Indicators => "indicators",
        }
    }
}

/// Which axes a sync group shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub time_range: bool,
    pub symbol: bool,
    pub zoom: bool,
    pub indicators: bool,
}

impl SyncSettings {
    /// Share every axis.
    pub const ALL: Self = Self {
        time_range: true,
        symbol: true,
        zoom: true,
        indicators: true,
    };

    /// Share nothing.
    pub const NONE: Self = Self {
        time_range: false,
        symbol: false,
        zoom: false,
        indicators: false,
    };

    #[must_use]
    pub const fn shares(self, axis: SyncAxis) -> bool {
        match axis {
            SyncAxis::Symbol => self.symbol,
            SyncAxis::TimeRange => self.time_range,
            SyncAxis::Zoom => self.zoom,
            SyncAxis::Indicators => self.indicators,
        }
    }

    #[must_use]
    pub const fn with(mut self, axis: SyncAxis, enabled: bool) -> Self {
        match axis {
            SyncAxis::Symbol => self.symbol = enabled,
            SyncAxis::TimeRange => self.time_range = enabled,
            SyncAxis::Zoom => self.zoom = enabled,
            SyncAxis::Indicators => self.indicators = enabled,
        }
        self
    }
}

impl Default for SyncSettings {
    /// Symbol and time range, the common "link" behavior.
    fn default() -> Self {
        Self {
            time_range: true,
            symbol: true,
            zoom: false,
            indicators: false,
        }
    }
}

/// A named set of panes sharing one or more axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncGroup {
    pub id: SyncGroupId,
    pub name: String,
    pub pane_ids: BTreeSet<PaneId>,
    pub settings: SyncSettings,
}

impl SyncGroup {
    #[must_use]
    pub fn contains(&self, pane_id: PaneId) -> bool {
        self.pane_ids.contains(&pane_id)
    }
}

/// Coarse "everything follows everything" switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSync {
    pub enabled: bool,
    /// Display emphasis only; propagation is symmetric.
    pub master_pane_id: Option<PaneId>,
    pub sync_time: bool,
    pub sync_symbol: bool,
    pub sync_zoom: bool,
}

impl GlobalSync {
    /// True if global sync is on and covers `axis`. Indicators are never global.
    #[must_use]
    pub const fn shares(&self, axis: SyncAxis) -> bool {
        if !self.enabled {
            return false;
        }
        match axis {
            SyncAxis::Symbol => self.sync_symbol,
            SyncAxis::TimeRange => self.sync_time,
            SyncAxis::Zoom => self.sync_zoom,
            SyncAxis::Indicators => false,
        }
    }
}

/// The workspace layout aggregate.
///
/// # Invariants
///
/// 1. `panes` holds at most one entry per id.
/// 2. Every non-maximized pane fits inside `grid_size`.
/// 3. Sync groups, `selected_pane`, and `global_sync.master_pane_id` only
///    reference panes present in `panes`.
/// 4. `next_pane_id` is greater than every pane id ever issued; ids are never
///    reused, including across template switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutState {
    #[serde(default)]
    pub current_template_id: Option<String>,
    pub default_symbol: String,
    pub grid_size: GridSize,
    pub panes: Vec<ChartPaneConfig>,
    #[serde(default)]
    pub sync_groups: BTreeMap<SyncGroupId, SyncGroup>,
    #[serde(default)]
    pub global_sync: GlobalSync,
    #[serde(default)]
    pub selected_pane: Option<PaneId>,
    pub next_pane_id: PaneId,
    #[serde(default)]
    pub next_group_id: SyncGroupId,
}

impl LayoutState {
    /// An empty 1x1 workspace.
    #[must_use]
    pub fn new(default_symbol: impl Into<String>) -> Self {
        Self {
            current_template_id: None,
            default_symbol: default_symbol.into(),
            grid_size: GridSize::UNIT,
            panes: Vec::new(),
            sync_groups: BTreeMap::new(),
            global_sync: GlobalSync::default(),
            selected_pane: None,
            next_pane_id: PaneId::MIN,
            next_group_id: SyncGroupId::MIN,
        }
    }

    /// Lookup a pane by id.
    #[must_use]
    pub fn pane(&self, id: PaneId) -> Option<&ChartPaneConfig> {
        self.panes.iter().find(|pane| pane.id == id)
    }

    pub(crate) fn pane_mut(&mut self, id: PaneId) -> Option<&mut ChartPaneConfig> {
        self.panes.iter_mut().find(|pane| pane.id == id)
    }

    #[must_use]
    pub fn contains_pane(&self, id: PaneId) -> bool {
        self.pane(id).is_some()
    }

    /// Ids of all panes in stored order.
    pub fn pane_ids(&self) -> impl Iterator<Item = PaneId> + '_ {
        self.panes.iter().map(|pane| pane.id)
    }

    #[must_use]
    pub fn sync_group(&self, id: SyncGroupId) -> Option<&SyncGroup> {
        self.sync_groups.get(&id)
    }

    /// Groups the pane belongs to, in id order.
    pub fn groups_of(&self, pane_id: PaneId) -> impl Iterator<Item = &SyncGroup> + '_ {
        self.sync_groups
            .values()
            .filter(move |group| group.contains(pane_id))
    }

    /// Mint the next pane id and advance the counter.
    ///
    /// Fails without issuing anything once the counter cannot advance, so an
    /// id is never handed out twice.
    pub(crate) fn mint_pane_id(&mut self) -> Result<PaneId, LayoutModelError> {
        let id = self.next_pane_id;
        self.next_pane_id = id.checked_next()?;
        Ok(id)
    }

    /// Mint the next sync group id and advance the counter.
    pub(crate) fn mint_group_id(&mut self) -> Result<SyncGroupId, LayoutModelError> {
        let id = self.next_group_id;
        self.next_group_id = id.checked_next()?;
        Ok(id)
    }

    /// Drop references to `pane_id` from groups, selection, and master.
    /// Groups left empty are removed.
    pub(crate) fn forget_pane(&mut self, pane_id: PaneId) {
        for group in self.sync_groups.values_mut() {
            group.pane_ids.remove(&pane_id);
        }
        self.sync_groups.retain(|_, group| !group.pane_ids.is_empty());
        if self.selected_pane == Some(pane_id) {
            self.selected_pane = None;
        }
        if self.global_sync.master_pane_id == Some(pane_id) {
            self.global_sync.master_pane_id = None;
        }
    }

    /// Validate all invariants, returning the first violation.
    pub fn validate(&self) -> Result<(), LayoutModelError> {
        if !self.grid_size.is_valid() {
            return Err(LayoutModelError::ZeroGridDimension {
                rows: self.grid_size.rows,
                cols: self.grid_size.cols,
            });
        }
        let mut seen = FxHashSet::default();
        for pane in &self.panes {
            if !seen.insert(pane.id) {
                return Err(LayoutModelError::DuplicatePaneId { pane_id: pane.id });
            }
            if pane.size.rows == 0 || pane.size.cols == 0 {
                return Err(LayoutModelError::ZeroSpan {
                    rows: pane.size.rows,
                    cols: pane.size.cols,
                });
            }
            if pane.is_maximized && pane.is_minimized {
                return Err(LayoutModelError::ConflictingDisplayFlags { pane_id: pane.id });
            }
            if let Some(range) = pane.time_range.filter(|range| !range.is_ordered()) {
                return Err(LayoutModelError::PaneTimeRangeInverted {
                    pane_id: pane.id,
                    start_ms: range.start_ms,
                    end_ms: range.end_ms,
                });
            }
            if !pane.is_maximized && !self.grid_size.contains(pane.position, pane.size) {
                return Err(LayoutModelError::PlacementOutOfBounds {
                    pane_id: pane.id,
                    row: pane.position.row,
                    col: pane.position.col,
                    rows: pane.size.rows,
                    cols: pane.size.cols,
                    grid_rows: self.grid_size.rows,
                    grid_cols: self.grid_size.cols,
                });
            }
        }
        if let Some(max_existing) = self.pane_ids().max()
            && self.next_pane_id <= max_existing
        {
            return Err(LayoutModelError::NextIdNotGreaterThanExisting {
                next_id: self.next_pane_id,
                max_existing,
            });
        }
        if let Some(&max_existing) = self.sync_groups.keys().next_back()
            && self.next_group_id <= max_existing
        {
            return Err(LayoutModelError::NextGroupIdNotGreaterThanExisting {
                next_id: self.next_group_id,
                max_existing,
            });
        }
        for (&key, group) in &self.sync_groups {
            if key != group.id {
                return Err(LayoutModelError::SyncGroupKeyMismatch {
                    key,
                    group_id: group.id,
                });
            }
            if let Some(&pane_id) = group.pane_ids.iter().find(|id| !seen.contains(id)) {
                return Err(LayoutModelError::DanglingSyncMember {
                    group_id: group.id,
                    pane_id,
                });
            }
        }
        for (role, reference) in [
            ("selected pane", self.selected_pane),
            ("master pane", self.global_sync.master_pane_id),
        ] {
            if let Some(pane_id) = reference
                && !seen.contains(&pane_id)
            {
                return Err(LayoutModelError::DanglingPaneReference { role, pane_id });
            }
        }
        Ok(())
    }

    /// Inspect invariants and emit every finding as a structured report.
    #[must_use]
    pub fn invariant_report(&self) -> LayoutInvariantReport {
        build_invariant_report(self)
    }

    /// Deterministic FNV-1a hash of the full state, for diagnostics and logs.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = StateHasher::default();
        hasher.str(self.current_template_id.as_deref().unwrap_or(""));
        hasher.str(&self.default_symbol);
        hasher.u16(self.grid_size.rows);
        hasher.u16(self.grid_size.cols);
        hasher.u64(self.panes.len() as u64);
        for pane in &self.panes {
            hasher.u64(pane.id.get());
            hasher.str(&pane.title);
            hasher.str(&pane.symbol);
            hasher.str(pane.chart_type.as_str());
            hasher.str(pane.time_frame.code());
            for indicator in pane.indicators.iter() {
                hasher.str(indicator);
            }
            hasher.u16(pane.position.row);
            hasher.u16(pane.position.col);
            hasher.u16(pane.size.rows);
            hasher.u16(pane.size.cols);
            hasher.flags(&[pane.is_maximized, pane.is_minimized, pane.sync_enabled]);
            match pane.time_range {
                Some(range) => {
                    hasher.u64(range.start_ms as u64);
                    hasher.u64(range.end_ms as u64);
                }
                None => hasher.u64(u64::MAX),
            }
            hasher.u16(pane.zoom.percent());
        }
        for group in self.sync_groups.values() {
            hasher.u64(group.id.get());
            hasher.str(&group.name);
            for pane_id in &group.pane_ids {
                hasher.u64(pane_id.get());
            }
            let s = group.settings;
            hasher.flags(&[s.symbol, s.time_range, s.zoom, s.indicators]);
        }
        let g = self.global_sync;
        hasher.flags(&[g.enabled, g.sync_symbol, g.sync_time, g.sync_zoom]);
        hasher.u64(g.master_pane_id.map_or(0, PaneId::get));
        hasher.u64(self.selected_pane.map_or(0, PaneId::get));
        hasher.u64(self.next_pane_id.get());
        hasher.u64(self.next_group_id.get());
        hasher.finish()
    }
}

struct StateHasher(u64);

impl Default for StateHasher {
    fn default() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }
}

impl StateHasher {
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn u16(&mut self, value: u16) {
        self.bytes(&value.to_le_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.bytes(&value.to_le_bytes());
    }

    fn str(&mut self, value: &str) {
        self.u64(value.len() as u64);
        self.bytes(value.as_bytes());
    }

    fn flags(&mut self, flags: &[bool]) {
        for flag in flags {
            self.bytes(&[u8::from(*flag)]);
        }
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutInvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutInvariantCode {
    ZeroGridDimension,
    DuplicatePaneId,
    ZeroSpan,
    PlacementOutOfBounds,
    ConflictingDisplayFlags,
    InvertedTimeRange,
    MultipleMaximized,
    DuplicateOrigin,
    DanglingSyncMember,
    EmptySyncGroup,
    SyncGroupKeyMismatch,
    DanglingSelection,
    DanglingMaster,
    NextIdNotGreaterThanExisting,
    NextGroupIdNotGreaterThanExisting,
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInvariantIssue {
    pub code: LayoutInvariantCode,
    pub severity: LayoutInvariantSeverity,
    pub pane_id: Option<PaneId>,
    pub group_id: Option<SyncGroupId>,
    pub message: String,
}

/// Structured invariant report over a layout state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInvariantReport {
    pub state_hash: u64,
    pub issues: Vec<LayoutInvariantIssue>,
}

impl LayoutInvariantReport {
    /// Return true if any error-level finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == LayoutInvariantSeverity::Error)
    }

    /// Findings with the given code.
    pub fn with_code(
        &self,
        code: LayoutInvariantCode,
    ) -> impl Iterator<Item = &LayoutInvariantIssue> + '_ {
        self.issues.iter().filter(move |issue| issue.code == code)
    }
}

fn build_invariant_report(state: &LayoutState) -> LayoutInvariantReport {
    use LayoutInvariantCode as Code;
    use LayoutInvariantSeverity::{Error, Warning};

    let mut issues = Vec::new();
    let mut push = |code, severity, pane_id, group_id, message: String| {
        issues.push(LayoutInvariantIssue {
            code,
            severity,
            pane_id,
            group_id,
            message,
        });
    };

    let grid = state.grid_size;
    if !grid.is_valid() {
        push(
            Code::ZeroGridDimension,
            Error,
            None,
            None,
            format!("grid is {}x{}", grid.rows, grid.cols),
        );
    }

    let mut ids = FxHashSet::default();
    let mut origins = FxHashSet::default();
    let mut maximized = 0usize;
    for pane in &state.panes {
        if !ids.insert(pane.id) {
            push(
                Code::DuplicatePaneId,
                Error,
                Some(pane.id),
                None,
                format!("{} appears more than once", pane.id),
            );
        }
        if pane.size.rows == 0 || pane.size.cols == 0 {
            push(
                Code::ZeroSpan,
                Error,
                Some(pane.id),
                None,
                format!("{} spans {}x{}", pane.id, pane.size.rows, pane.size.cols),
            );
        }
        if pane.is_maximized && pane.is_minimized {
            push(
                Code::ConflictingDisplayFlags,
                Error,
                Some(pane.id),
                None,
                format!("{} is both maximized and minimized", pane.id),
            );
        }
        if let Some(range) = pane.time_range.filter(|range| !range.is_ordered()) {
            push(
                Code::InvertedTimeRange,
                Error,
                Some(pane.id),
                None,
                format!(
                    "{} time range ends before it starts ({} > {})",
                    pane.id, range.start_ms, range.end_ms
                ),
            );
        }
        if pane.is_maximized {
            maximized += 1;
        } else if grid.is_valid() && !grid.contains(pane.position, pane.size) {
            push(
                Code::PlacementOutOfBounds,
                Error,
                Some(pane.id),
                None,
                format!(
                    "{} at ({},{}) spanning {}x{} exceeds grid {}x{}",
                    pane.id,
                    pane.position.row,
                    pane.position.col,
                    pane.size.rows,
                    pane.size.cols,
                    grid.rows,
                    grid.cols
                ),
            );
        }
        if !origins.insert(pane.position) {
            push(
                Code::DuplicateOrigin,
                Warning,
                Some(pane.id),
                None,
                format!(
                    "{} shares origin ({},{}) with another pane",
                    pane.id, pane.position.row, pane.position.col
                ),
            );
        }
    }
    if maximized > 1 {
        push(
            Code::MultipleMaximized,
            Warning,
            None,
            None,
            format!("{maximized} panes are maximized at once"),
        );
    }

    for (&key, group) in &state.sync_groups {
        if key != group.id {
            push(
                Code::SyncGroupKeyMismatch,
                Error,
                None,
                Some(key),
                format!("{} is stored under key {}", group.id, key),
            );
        }
        if group.pane_ids.is_empty() {
            push(
                Code::EmptySyncGroup,
                Warning,
                None,
                Some(group.id),
                format!("{} has no members", group.id),
            );
        }
        for pane_id in group.pane_ids.iter().filter(|id| !ids.contains(id)) {
            push(
                Code::DanglingSyncMember,
                Error,
                Some(*pane_id),
                Some(group.id),
                format!("{} references missing {}", group.id, pane_id),
            );
        }
    }

    if let Some(pane_id) = state.selected_pane.filter(|id| !ids.contains(id)) {
        push(
            Code::DanglingSelection,
            Error,
            Some(pane_id),
            None,
            format!("selection references missing {pane_id}"),
        );
    }
    if let Some(pane_id) = state
        .global_sync
        .master_pane_id
        .filter(|id| !ids.contains(id))
    {
        push(
            Code::DanglingMaster,
            Error,
            Some(pane_id),
            None,
            format!("master references missing {pane_id}"),
        );
    }
    if let Some(max_existing) = state.pane_ids().max()
        && state.next_pane_id <= max_existing
    {
        push(
            Code::NextIdNotGreaterThanExisting,
            Error,
            Some(max_existing),
            None,
            format!(
                "next id {} would collide with existing {}",
                state.next_pane_id, max_existing
            ),
        );
    }
    if let Some(&max_existing) = state.sync_groups.keys().next_back()
        && state.next_group_id <= max_existing
    {
        push(
            Code::NextGroupIdNotGreaterThanExisting,
            Error,
            None,
            Some(max_existing),
            format!(
                "next group id {} would collide with existing {}",
                state.next_group_id, max_existing
            ),
        );
    }

    LayoutInvariantReport {
        state_hash: state.state_hash(),
        issues,
    }
}
