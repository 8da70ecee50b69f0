//! Layout template catalog.
//!
//! A [`LayoutTemplate`] is an immutable blueprint for a whole grid of panes.
//! The engine receives a [`TemplateCatalog`] at construction; templates are
//! data, so a host can ship its own catalog as JSON without touching code.
//!
//! Templates are trusted input. The engine does not check them at runtime;
//! [`TemplateCatalog::audit`] exists so catalogs can be validated statically.

use std::collections::BTreeSet;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{GridSize, PanePosition, PaneSpan};
use crate::pane::{ChartPaneConfig, ChartType, IndicatorSet, PaneId, TimeFrame, ZoomLevel};

/// Descriptive grouping shown in the template picker. Has no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Basic,
    Advanced,
    Professional,
    Custom,
}

/// A pane description without id or symbol; both are injected on instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneBlueprint {
    pub title: String,
    pub chart_type: ChartType,
    pub time_frame: TimeFrame,
    #[serde(default)]
    pub indicators: IndicatorSet,
    pub position: PanePosition,
    #[serde(default)]
    pub size: PaneSpan,
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub is_maximized: bool,
    #[serde(default)]
    pub is_minimized: bool,
}

impl PaneBlueprint {
    fn new(
        title: &str,
        chart_type: ChartType,
        time_frame: TimeFrame,
        indicators: &[&str],
        (row, col): (u16, u16),
        (rows, cols): (u16, u16),
    ) -> Self {
        Self {
            title: title.to_owned(),
            chart_type,
            time_frame,
            indicators: indicators.iter().collect(),
            position: PanePosition { row, col },
            size: PaneSpan { rows, cols },
            sync_enabled: false,
            is_maximized: false,
            is_minimized: false,
        }
    }

    fn synced(mut self) -> Self {
        self.sync_enabled = true;
        self
    }

    /// Build a concrete pane. The blueprint's `sync_enabled` is carried through.
    #[must_use]
    pub fn instantiate(&self, id: PaneId, symbol: &str) -> ChartPaneConfig {
        ChartPaneConfig {
            id,
            title: self.title.clone(),
            symbol: symbol.to_owned(),
            chart_type: self.chart_type,
            time_frame: self.time_frame,
            indicators: self.indicators.clone(),
            position: self.position,
            size: self.size,
            is_maximized: self.is_maximized,
            is_minimized: self.is_minimized && !self.is_maximized,
            sync_enabled: self.sync_enabled,
            time_range: None,
            zoom: ZoomLevel::DEFAULT,
        }
    }
}

/// A named, reusable grid of pane blueprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub grid_size: GridSize,
    pub category: TemplateCategory,
    pub panes: Vec<PaneBlueprint>,
}

/// Errors from loading a template catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error reading template catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("template catalog JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("template catalog has {count} authoring error(s), first: {first}")]
    Invalid { count: usize, first: String },
}

/// Read-only, ordered list of templates with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateCatalog {
    templates: Vec<LayoutTemplate>,
}

impl TemplateCatalog {
    /// Wrap a list of templates. Order is preserved.
    #[must_use]
    pub fn new(templates: Vec<LayoutTemplate>) -> Self {
        Self { templates }
    }

    /// Parse a catalog from JSON and reject it if the audit finds errors.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        let report = catalog.audit();
        if let Some(first) = report.errors().next() {
            return Err(CatalogError::Invalid {
                count: report.errors().count(),
                first: first.message.clone(),
            });
        }
        Ok(catalog)
    }

    /// Load a catalog JSON file from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lookup by template id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LayoutTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutTemplate> {
        self.templates.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates in one category, in catalog order.
    pub fn in_category(
        &self,
        category: TemplateCategory,
    ) -> impl Iterator<Item = &LayoutTemplate> + '_ {
        self.templates
            .iter()
            .filter(move |template| template.category == category)
    }

    /// Check authoring rules: unique ids, non-zero grids and spans, blueprints
    /// inside the grid. Overlapping blueprints are reported as warnings since
    /// stacking is allowed.
    #[must_use]
    pub fn audit(&self) -> CatalogAuditReport {
        let mut findings = Vec::new();
        let mut seen_ids = BTreeSet::new();
        for template in &self.templates {
            let mut finding = |severity, blueprint: Option<usize>, message: String| {
                findings.push(CatalogFinding {
                    template_id: template.id.clone(),
                    blueprint,
                    severity,
                    message,
                });
            };
            if !seen_ids.insert(template.id.as_str()) {
                finding(
                    AuditSeverity::Error,
                    None,
                    format!("duplicate template id {:?}", template.id),
                );
            }
            let grid = template.grid_size;
            if !grid.is_valid() {
                finding(
                    AuditSeverity::Error,
                    None,
                    format!("{}: grid is {}x{}", template.id, grid.rows, grid.cols),
                );
                continue;
            }
            if template.panes.is_empty() {
                finding(
                    AuditSeverity::Warning,
                    None,
                    format!("{}: template has no panes", template.id),
                );
            }
            let mut owners: FxHashMap<PanePosition, usize> = FxHashMap::default();
            for (index, blueprint) in template.panes.iter().enumerate() {
                if blueprint.size.rows == 0 || blueprint.size.cols == 0 {
                    finding(
                        AuditSeverity::Error,
                        Some(index),
                        format!("{}[{index}]: zero span", template.id),
                    );
                    continue;
                }
                if !grid.contains(blueprint.position, blueprint.size) {
                    finding(
                        AuditSeverity::Error,
                        Some(index),
                        format!(
                            "{}[{index}]: ({},{}) spanning {}x{} exceeds grid {}x{}",
                            template.id,
                            blueprint.position.row,
                            blueprint.position.col,
                            blueprint.size.rows,
                            blueprint.size.cols,
                            grid.rows,
                            grid.cols
                        ),
                    );
                    continue;
                }
                for cell in blueprint.size.cells_from(blueprint.position) {
                    if let Some(&other) = owners.get(&cell) {
                        finding(
                            AuditSeverity::Warning,
                            Some(index),
                            format!(
                                "{}[{index}]: overlaps blueprint {other} at ({},{})",
                                template.id, cell.row, cell.col
                            ),
                        );
                        break;
                    }
                    owners.insert(cell, index);
                }
            }
        }
        CatalogAuditReport { findings }
    }

    /// The catalog shipped with the dashboard.
    #[must_use]
    pub fn builtin() -> Self {
        use ChartType::{Area, Candlestick, Level2, Line};
        use TemplateCategory::{Advanced, Basic, Professional};
        use TimeFrame::{D1, H1, H4, M1, M5, M15, W1};

        let bp = PaneBlueprint::new;
        let grid = |rows, cols| GridSize { rows, cols };
        let template = |id: &str, name: &str, description: &str, grid_size, category, panes| {
            LayoutTemplate {
                id: id.to_owned(),
                name: name.to_owned(),
                description: description.to_owned(),
                grid_size,
                category,
                panes,
            }
        };

        Self::new(vec![
            template(
                "single",
                "Single Chart",
                "One full-size chart",
                grid(1, 1),
                Basic,
                vec![bp("Main", Candlestick, D1, &["MA", "VOL"], (0, 0), (1, 1))],
            ),
            template(
                "horizontal-split",
                "Side by Side",
                "Two charts next to each other",
                grid(1, 2),
                Basic,
                vec![
                    bp("Daily", Candlestick, D1, &["MA", "VOL"], (0, 0), (1, 1)),
                    bp("Hourly", Line, H1, &["MA"], (0, 1), (1, 1)),
                ],
            ),
            template(
                "vertical-split",
                "Stacked",
                "Two charts on top of each other",
                grid(2, 1),
                Basic,
                vec![
                    bp("Daily", Candlestick, D1, &["MA", "VOL"], (0, 0), (1, 1)),
                    bp("Volume Profile", Area, D1, &["VOL"], (1, 0), (1, 1)),
                ],
            ),
            template(
                "quad",
                "Quad View",
                "Two candlestick charts, order book, and a line chart",
                grid(2, 2),
                Basic,
                vec![
                    bp("Daily", Candlestick, D1, &["MA", "VOL"], (0, 0), (1, 1)),
                    bp("Intraday", Candlestick, M15, &["MA", "MACD"], (0, 1), (1, 1)),
                    bp("Order Book", Level2, M1, &[], (1, 0), (1, 1)),
                    bp("Trend", Line, H1, &["EMA"], (1, 1), (1, 1)),
                ],
            ),
            template(
                "main-plus-two",
                "Main Plus Two",
                "Large main chart with two side panels",
                grid(2, 3),
                Advanced,
                vec![
                    bp("Main", Candlestick, D1, &["MA", "VOL", "BOLL"], (0, 0), (2, 2)),
                    bp("Hourly", Line, H1, &["MA"], (0, 2), (1, 1)),
                    bp("Order Book", Level2, M1, &[], (1, 2), (1, 1)),
                ],
            ),
            template(
                "six-pack",
                "Six Pack",
                "Six equal charts for watchlist scanning",
                grid(2, 3),
                Advanced,
                vec![
                    bp("Chart 1", Candlestick, D1, &["MA", "VOL"], (0, 0), (1, 1)),
                    bp("Chart 2", Candlestick, D1, &["MA", "VOL"], (0, 1), (1, 1)),
                    bp("Chart 3", Candlestick, D1, &["MA", "VOL"], (0, 2), (1, 1)),
                    bp("Chart 4", Line, H1, &["MA"], (1, 0), (1, 1)),
                    bp("Chart 5", Line, H1, &["MA"], (1, 1), (1, 1)),
                    bp("Chart 6", Area, H1, &["VOL"], (1, 2), (1, 1)),
                ],
            ),
            template(
                "nine-grid",
                "Nine Grid",
                "3x3 monitoring wall",
                grid(3, 3),
                Advanced,
                (0..9u16)
                    .map(|i| {
                        let title = format!("Chart {}", i + 1);
                        bp(&title, Candlestick, D1, &["MA"], (i / 3, i % 3), (1, 1))
                    })
                    .collect(),
            ),
            template(
                "multi-timeframe",
                "Multi-Timeframe",
                "One symbol across four intervals, synchronized",
                grid(2, 2),
                Professional,
                vec![
                    bp("5 Minute", Candlestick, M5, &["MA", "VOL"], (0, 0), (1, 1)).synced(),
                    bp("15 Minute", Candlestick, M15, &["MA", "VOL"], (0, 1), (1, 1)).synced(),
                    bp("4 Hour", Candlestick, H4, &["MA", "VOL"], (1, 0), (1, 1)).synced(),
                    bp("Daily", Candlestick, D1, &["MA", "VOL"], (1, 1), (1, 1)).synced(),
                ],
            ),
            template(
                "bloomberg-pro",
                "Terminal Pro",
                "Dominant main chart, full-height book, four context charts",
                grid(3, 4),
                Professional,
                vec![
                    bp("Main", Candlestick, D1, &["MA", "VOL", "MACD"], (0, 0), (2, 3)),
                    bp("Order Book", Level2, M1, &[], (0, 3), (2, 1)),
                    bp("Hourly", Line, H1, &["EMA"], (2, 0), (1, 1)),
                    bp("Daily Area", Area, D1, &["VOL"], (2, 1), (1, 1)),
                    bp("Weekly", Candlestick, W1, &["MA"], (2, 2), (1, 1)),
                    bp("Tick", Line, M1, &[], (2, 3), (1, 1)),
                ],
            ),
        ])
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Severity for one audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Error,
    Warning,
}

/// One catalog authoring finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFinding {
    pub template_id: String,
    pub blueprint: Option<usize>,
    pub severity: AuditSeverity,
    pub message: String,
}

/// Result of [`TemplateCatalog::audit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAuditReport {
    pub findings: Vec<CatalogFinding>,
}

impl CatalogAuditReport {
    pub fn errors(&self) -> impl Iterator<Item = &CatalogFinding> + '_ {
        self.findings
            .iter()
            .filter(|finding| finding.severity == AuditSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CatalogFinding> + '_ {
        self.findings
            .iter()
            .filter(|finding| finding.severity == AuditSeverity::Warning)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}
