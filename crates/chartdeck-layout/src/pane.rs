//! Chart pane configuration.
//!
//! A [`ChartPaneConfig`] is the unit the layout engine places on the grid and
//! the synchronization controller propagates between. Everything here is plain
//! serializable data; no callbacks live inside a pane.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutModelError;
use crate::grid::{PanePosition, PaneSpan};

/// Stable identifier for a chart pane.
///
/// `0` is reserved/invalid so IDs are always non-zero. IDs are minted from a
/// monotonically increasing counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PaneId(u64);

impl PaneId {
    /// Lowest valid pane ID.
    pub const MIN: Self = Self(1);

    /// Create a new pane ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, LayoutModelError> {
        if raw == 0 {
            return Err(LayoutModelError::ZeroPaneId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, LayoutModelError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(LayoutModelError::PaneIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for PaneId {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u64> for PaneId {
    type Error = LayoutModelError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PaneId> for u64 {
    fn from(id: PaneId) -> Self {
        id.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

/// Kind of content a pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Candlestick,
    Line,
    Area,
    /// Level-2 order book, drawn by the order-book widget instead of the chart.
    Level2,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Candlestick,
        ChartType::Line,
        ChartType::Area,
        ChartType::Level2,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ChartType::Candlestick => "candlestick",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Level2 => "level2",
        }
    }

    /// True for types drawn by the charting widget.
    #[must_use]
    pub const fn is_chart(self) -> bool {
        !matches!(self, ChartType::Level2)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar interval of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1D")]
    D1,
    #[serde(rename = "1W")]
    W1,
    #[serde(rename = "1M")]
    MN1,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 9] = [
        TimeFrame::M1,
        TimeFrame::M5,
        TimeFrame::M15,
        TimeFrame::M30,
        TimeFrame::H1,
        TimeFrame::H4,
        TimeFrame::D1,
        TimeFrame::W1,
        TimeFrame::MN1,
    ];

    /// Interval code as shown in the toolbar.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            TimeFrame::M1 => "1m",
            TimeFrame::M5 => "5m",
            TimeFrame::M15 => "15m",
            TimeFrame::M30 => "30m",
            TimeFrame::H1 => "1h",
            TimeFrame::H4 => "4h",
            TimeFrame::D1 => "1D",
            TimeFrame::W1 => "1W",
            TimeFrame::MN1 => "1M",
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown interval code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time frame code {0:?}")]
pub struct UnknownTimeFrame(pub String);

impl FromStr for TimeFrame {
    type Err = UnknownTimeFrame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFrame::ALL
            .into_iter()
            .find(|tf| tf.code() == s)
            .ok_or_else(|| UnknownTimeFrame(s.to_owned()))
    }
}

/// Set of indicator names. Order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSet(BTreeSet<String>);

impl IndicatorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name; surrounding whitespace is dropped and blank names ignored.
    pub fn insert(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return false;
        }
        self.0.insert(name.to_owned())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for IndicatorSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Visible time window of a chart, in epoch milliseconds.
///
/// Deserialization goes through [`TimeRange::new`], so a loaded range is
/// never inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start_ms: i64,
    end_ms: i64,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = LayoutModelError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start_ms, raw.end_ms)
    }
}

impl TimeRange {
    /// Create a range, rejecting `start_ms > end_ms`.
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, LayoutModelError> {
        if start_ms > end_ms {
            return Err(LayoutModelError::InvertedTimeRange { start_ms, end_ms });
        }
        Ok(Self { start_ms, end_ms })
    }

    /// False if the fields were set directly to an inverted window.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        self.start_ms <= self.end_ms
    }

    #[must_use]
    pub const fn duration_ms(self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Horizontal zoom in percent. Always within [`ZoomLevel::MIN`]..=[`ZoomLevel::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct ZoomLevel(u16);

impl ZoomLevel {
    pub const MIN: u16 = 10;
    pub const MAX: u16 = 1_000;
    pub const DEFAULT: Self = Self(100);

    /// Create a zoom level, clamping into the supported range.
    #[must_use]
    pub fn new(percent: u16) -> Self {
        Self(percent.clamp(Self::MIN, Self::MAX))
    }

    #[must_use]
    pub const fn percent(self) -> u16 {
        self.0
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u16> for ZoomLevel {
    fn from(percent: u16) -> Self {
        Self::new(percent)
    }
}

impl From<ZoomLevel> for u16 {
    fn from(zoom: ZoomLevel) -> Self {
        zoom.0
    }
}

/// One chart pane placed on the workspace grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPaneConfig {
    pub id: PaneId,
    pub title: String,
    pub symbol: String,
    pub chart_type: ChartType,
    pub time_frame: TimeFrame,
    #[serde(default)]
    pub indicators: IndicatorSet,
    pub position: PanePosition,
    pub size: PaneSpan,
    #[serde(default)]
    pub is_maximized: bool,
    #[serde(default)]
    pub is_minimized: bool,
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub zoom: ZoomLevel,
}

impl ChartPaneConfig {
    /// Default indicators for panes added outside a template.
    pub const DEFAULT_INDICATORS: [&'static str; 2] = ["MA", "VOL"];

    /// A 1x1 daily candlestick pane with the default indicators.
    #[must_use]
    pub fn new(id: PaneId, symbol: impl Into<String>, position: PanePosition) -> Self {
        Self {
            id,
            title: format!("Chart {}", id.get()),
            symbol: symbol.into(),
            chart_type: ChartType::Candlestick,
            time_frame: TimeFrame::D1,
            indicators: Self::DEFAULT_INDICATORS.into_iter().collect(),
            position,
            size: PaneSpan::UNIT,
            is_maximized: false,
            is_minimized: false,
            sync_enabled: false,
            time_range: None,
            zoom: ZoomLevel::DEFAULT,
        }
    }

    /// Merge a partial update into this pane. Returns true if anything changed.
    ///
    /// Maximized and minimized stay mutually exclusive: turning one on turns
    /// the other off.
    pub fn apply(&mut self, update: &PaneUpdate) -> bool {
        let before = self.clone();
        if let Some(title) = &update.title {
            self.title.clone_from(title);
        }
        if let Some(symbol) = &update.symbol {
            self.symbol.clone_from(symbol);
        }
        if let Some(chart_type) = update.chart_type {
            self.chart_type = chart_type;
        }
        if let Some(time_frame) = update.time_frame {
            self.time_frame = time_frame;
        }
        if let Some(indicators) = &update.indicators {
            self.indicators.clone_from(indicators);
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(size) = update.size {
            self.size = size;
        }
        if let Some(sync_enabled) = update.sync_enabled {
            self.sync_enabled = sync_enabled;
        }
        if let Some(time_range) = update.time_range {
            self.time_range = Some(time_range);
        }
        if let Some(zoom) = update.zoom {
            self.zoom = zoom;
        }
        if let Some(minimized) = update.is_minimized {
            self.set_minimized(minimized);
        }
        if let Some(maximized) = update.is_maximized {
            self.set_maximized(maximized);
        }
        *self != before
    }

    pub fn set_maximized(&mut self, maximized: bool) {
        self.is_maximized = maximized;
        if maximized {
            self.is_minimized = false;
        }
    }

    pub fn set_minimized(&mut self, minimized: bool) {
        self.is_minimized = minimized;
        if minimized {
            self.is_maximized = false;
        }
    }
}

/// Partial update for [`ChartPaneConfig`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneUpdate {
    pub title: Option<String>,
    pub symbol: Option<String>,
    pub chart_type: Option<ChartType>,
    pub time_frame: Option<TimeFrame>,
    pub indicators: Option<IndicatorSet>,
    pub position: Option<PanePosition>,
    pub size: Option<PaneSpan>,
    pub sync_enabled: Option<bool>,
    pub time_range: Option<TimeRange>,
    pub zoom: Option<ZoomLevel>,
    pub is_maximized: Option<bool>,
    pub is_minimized: Option<bool>,
}

impl PaneUpdate {
    #[must_use]
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn time_range(range: TimeRange) -> Self {
        Self {
            time_range: Some(range),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn zoom(zoom: ZoomLevel) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn indicators(indicators: IndicatorSet) -> Self {
        Self {
            indicators: Some(indicators),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    #[must_use]
    pub fn with_time_frame(mut self, time_frame: TimeFrame) -> Self {
        self.time_frame = Some(time_frame);
        self
    }

    #[must_use]
    pub fn with_placement(mut self, position: PanePosition, size: PaneSpan) -> Self {
        self.position = Some(position);
        self.size = Some(size);
        self
    }

    /// True if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
