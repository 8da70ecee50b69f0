#![forbid(unsafe_code)]

//! Deck configuration loaded from TOML or JSON.
//!
//! ```toml
//! # chartdeck.toml
//! default_symbol = "AAPL"
//! initial_template = "quad"
//! placement_policy = "span_aware"
//! history_depth = 50
//!
//! [telemetry]
//! filter = "chartdeck=debug"
//! ```
//!
//! Every field has a default, so an empty file yields [`DeckConfig::default`].

use std::path::{Path, PathBuf};

use chartdeck_layout::PlacementPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::telemetry::TelemetryConfig;

/// Upper bound for pixel gaps, to catch unit mix-ups.
const MAX_GAP_PX: u16 = 256;

/// Startup configuration for a ChartDeck workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Symbol injected into the initial template and used by `add_pane`.
    pub default_symbol: String,
    /// Template applied when the store starts.
    pub initial_template: String,
    pub placement_policy: PlacementPolicy,
    /// Retained undo states, current included.
    pub history_depth: usize,
    /// Gap between grid tracks in pane grid mode.
    pub grid_gap_px: u16,
    /// Spacing between cells in widget mode.
    pub cell_spacing_px: u16,
    /// External template catalog (JSON). `None` uses the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    pub telemetry: TelemetryConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            default_symbol: "600519".to_owned(),
            initial_template: "single".to_owned(),
            placement_policy: PlacementPolicy::OriginOnly,
            history_depth: DEFAULT_HISTORY_DEPTH,
            grid_gap_px: 4,
            cell_spacing_px: 4,
            catalog_path: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl DeckConfig {
    /// Parse from a TOML string. Does not validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Parse from a JSON string. Does not validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Read, parse, and validate a config file.
    ///
    /// `.json` files are parsed as JSON; anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        config.validated()
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            return Ok(self);
        }
        warn!(
            target: "chartdeck.config",
            problems = problems.len(),
            first = %problems[0],
            "rejected deck configuration"
        );
        Err(ConfigError::Validation(problems))
    }

    /// Check every field. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.default_symbol.trim().is_empty() {
            errors.push("default_symbol must not be empty".into());
        }
        if self.initial_template.trim().is_empty() {
            errors.push("initial_template must not be empty".into());
        }
        if self.history_depth == 0 {
            errors.push("history_depth must be > 0".into());
        }
        if self.grid_gap_px > MAX_GAP_PX {
            errors.push(format!(
                "grid_gap_px must be <= {MAX_GAP_PX}, got {}",
                self.grid_gap_px
            ));
        }
        if self.cell_spacing_px > MAX_GAP_PX {
            errors.push(format!(
                "cell_spacing_px must be <= {MAX_GAP_PX}, got {}",
                self.cell_spacing_px
            ));
        }
        if let Some(path) = &self.catalog_path
            && path.as_os_str().is_empty()
        {
            errors.push("catalog_path must not be empty when set".into());
        }
        if self.telemetry.filter.trim().is_empty() {
            errors.push("telemetry.filter must not be empty".into());
        }

        errors
    }
}

/// Errors from loading a [`DeckConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[source] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates_clean() {
        let errors = DeckConfig::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(DeckConfig::from_toml_str("").unwrap(), DeckConfig::default());
    }

    #[test]
    fn toml_overrides_fields() {
        let config = DeckConfig::from_toml_str(
            r#"
            default_symbol = "AAPL"
            initial_template = "quad"
            placement_policy = "span_aware"
            history_depth = 12

            [telemetry]
            filter = "chartdeck=trace"
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.default_symbol, "AAPL");
        assert_eq!(config.initial_template, "quad");
        assert_eq!(config.placement_policy, PlacementPolicy::SpanAware);
        assert_eq!(config.history_depth, 12);
        assert_eq!(config.grid_gap_px, 4);
        assert!(config.telemetry.json);
    }

    #[test]
    fn json_parses_catalog_path() {
        let config =
            DeckConfig::from_json_str(r#"{"catalog_path": "templates.json", "grid_gap_px": 8}"#)
                .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("templates.json")));
        assert_eq!(config.grid_gap_px, 8);
    }

    #[test]
    fn validate_collects_every_problem() {
        let config = DeckConfig {
            default_symbol: " ".into(),
            history_depth: 0,
            grid_gap_px: 1_000,
            ..DeckConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("history_depth")));
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Validation(list)) if list.len() == 3
        ));
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = DeckConfig::from_toml_str(r#"placement_policy = "diagonal""#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
