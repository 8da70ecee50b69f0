//! Persisted workspace schema v1 with versioning and migration scaffolding.
//!
//! A [`WorkspaceSnapshot`] wraps a [`LayoutState`] with workspace-level
//! metadata and a forward-compatible extension bag.
//!
//! # Schema Versioning Policy
//!
//! - **Additive fields** may be carried in `extensions` without a version bump.
//! - **Breaking changes** require incrementing [`WORKSPACE_SCHEMA_VERSION`] and
//!   adding a migration path.
//! - Loaders reject unknown versions with actionable diagnostics.
//!
//! # Usage
//!
//! ```
//! use chartdeck_layout::engine::LayoutEngine;
//! use chartdeck_layout::workspace::{WorkspaceMetadata, WorkspaceSnapshot, WORKSPACE_SCHEMA_VERSION};
//!
//! let layout = LayoutEngine::default().initial_state("quad", "600519");
//! let snapshot = WorkspaceSnapshot::new(layout, WorkspaceMetadata::new("desk"));
//! assert_eq!(snapshot.schema_version, WORKSPACE_SCHEMA_VERSION);
//! assert!(snapshot.validate().is_ok());
//!
//! let json = snapshot.to_json().unwrap();
//! let restored = WorkspaceSnapshot::from_json(&json).unwrap();
//! assert_eq!(restored, snapshot);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::LayoutModelError;
use crate::state::{LAYOUT_STATE_SCHEMA_VERSION, LayoutInvariantSeverity, LayoutState};

/// Current workspace schema version.
pub const WORKSPACE_SCHEMA_VERSION: u16 = 1;

/// Persisted workspace: layout plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    #[serde(default = "default_workspace_version")]
    pub schema_version: u16,
    #[serde(default = "default_layout_version")]
    pub layout_schema_version: u16,
    pub layout: LayoutState,
    pub metadata: WorkspaceMetadata,
    /// Forward-compatible extension bag.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_workspace_version() -> u16 {
    WORKSPACE_SCHEMA_VERSION
}

fn default_layout_version() -> u16 {
    LAYOUT_STATE_SCHEMA_VERSION
}

impl WorkspaceSnapshot {
    #[must_use]
    pub fn new(layout: LayoutState, metadata: WorkspaceMetadata) -> Self {
        Self {
            schema_version: WORKSPACE_SCHEMA_VERSION,
            layout_schema_version: LAYOUT_STATE_SCHEMA_VERSION,
            layout,
            metadata,
            extensions: BTreeMap::new(),
        }
    }

    /// Validate schema versions, metadata, and layout invariants.
    pub fn validate(&self) -> Result<(), WorkspaceValidationError> {
        if self.schema_version != WORKSPACE_SCHEMA_VERSION {
            return Err(WorkspaceValidationError::UnsupportedVersion {
                found: self.schema_version,
                expected: WORKSPACE_SCHEMA_VERSION,
            });
        }
        if self.layout_schema_version != LAYOUT_STATE_SCHEMA_VERSION {
            return Err(WorkspaceValidationError::LayoutVersionMismatch {
                found: self.layout_schema_version,
                expected: LAYOUT_STATE_SCHEMA_VERSION,
            });
        }
        if self.metadata.name.trim().is_empty() {
            return Err(WorkspaceValidationError::EmptyWorkspaceName);
        }
        let report = self.layout.invariant_report();
        if report.has_errors() {
            let mut errors = report
                .issues
                .iter()
                .filter(|issue| issue.severity == LayoutInvariantSeverity::Error);
            let first_issue = errors
                .next()
                .map(|issue| issue.message.clone())
                .unwrap_or_default();
            return Err(WorkspaceValidationError::LayoutInvalid {
                issue_count: 1 + errors.count(),
                first_issue,
            });
        }
        self.layout.validate()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, WorkspaceMigrationError> {
        serde_json::to_string_pretty(self).map_err(|err| {
            WorkspaceMigrationError::SerializationFailed {
                reason: err.to_string(),
            }
        })
    }

    /// Parse, migrate to the current schema, and validate.
    pub fn from_json(json: &str) -> Result<Self, WorkspaceMigrationError> {
        let snapshot: Self = serde_json::from_str(json).map_err(|err| {
            WorkspaceMigrationError::DeserializationFailed {
                reason: err.to_string(),
            }
        })?;
        let migrated = migrate_workspace(snapshot)?;
        migrated.snapshot.validate()?;
        debug!(
            target: "chartdeck.layout",
            from_version = migrated.from_version,
            to_version = migrated.to_version,
            panes = migrated.snapshot.layout.panes.len(),
            "workspace loaded"
        );
        Ok(migrated.snapshot)
    }

    /// Deterministic hash for diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.layout.state_hash()
    }
}

/// Workspace metadata for provenance and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMetadata {
    pub name: String,
    /// Incremented on each save.
    #[serde(default)]
    pub saved_generation: u64,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl WorkspaceMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            saved_generation: 0,
            app_version: String::new(),
            tags: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn increment_generation(&mut self) {
        self.saved_generation = self.saved_generation.saturating_add(1);
    }
}

/// Errors from workspace validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceValidationError {
    #[error("unsupported workspace schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("layout schema version {found} does not match expected {expected}")]
    LayoutVersionMismatch { found: u16, expected: u16 },
    #[error("layout has {issue_count} invariant violation(s), first: {first_issue}")]
    LayoutInvalid {
        issue_count: usize,
        first_issue: String,
    },
    #[error("workspace name must not be empty")]
    EmptyWorkspaceName,
    #[error("layout model error: {0}")]
    LayoutModel(#[from] LayoutModelError),
}

/// Result of migrating a snapshot to the current schema.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub snapshot: WorkspaceSnapshot,
    pub from_version: u16,
    pub to_version: u16,
}

/// Errors from workspace loading and migration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceMigrationError {
    #[error("unsupported schema version {version} for migration")]
    UnsupportedVersion { version: u16 },
    #[error("no migration path from v{from} to v{to}")]
    NoMigrationPath { from: u16, to: u16 },
    #[error("deserialization failed during migration: {reason}")]
    DeserializationFailed { reason: String },
    #[error("serialization failed: {reason}")]
    SerializationFailed { reason: String },
    #[error(transparent)]
    Invalid(#[from] WorkspaceValidationError),
}

/// Migrate a snapshot to [`WORKSPACE_SCHEMA_VERSION`].
///
/// v1 is current, so this is the identity. Later versions chain through each
/// intermediate step.
pub fn migrate_workspace(
    snapshot: WorkspaceSnapshot,
) -> Result<MigrationResult, WorkspaceMigrationError> {
    match snapshot.schema_version {
        WORKSPACE_SCHEMA_VERSION => Ok(MigrationResult {
            from_version: WORKSPACE_SCHEMA_VERSION,
            to_version: WORKSPACE_SCHEMA_VERSION,
            snapshot,
        }),
        v if v > WORKSPACE_SCHEMA_VERSION => {
            Err(WorkspaceMigrationError::UnsupportedVersion { version: v })
        }
        v => Err(WorkspaceMigrationError::NoMigrationPath {
            from: v,
            to: WORKSPACE_SCHEMA_VERSION,
        }),
    }
}

#[must_use]
pub fn needs_migration(snapshot: &WorkspaceSnapshot) -> bool {
    snapshot.schema_version != WORKSPACE_SCHEMA_VERSION
}
