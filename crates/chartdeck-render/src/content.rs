#![forbid(unsafe_code)]

//! Pane content dispatch.
//!
//! A pane never draws itself. [`render_pane_content`] maps its config to a
//! request for one of two external widgets: the chart widget or the
//! order-book widget. The mapping is a pure table on `chart_type`; the only
//! side effects happen inside the widgets [`dispatch_content`] forwards to.

use chartdeck_layout::{ChartPaneConfig, ChartType, IndicatorSet, PaneId, TimeFrame, TimeRange, ZoomLevel};
use serde::Serialize;

/// Indicator switches understood by the chart widget.
///
/// Names outside the known set are passed through in `other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorFlags {
    pub ma: bool,
    pub ema: bool,
    pub boll: bool,
    pub macd: bool,
    pub volume: bool,
    pub other: Vec<String>,
}

impl IndicatorFlags {
    #[must_use]
    pub fn from_set(set: &IndicatorSet) -> Self {
        let mut flags = Self::default();
        for name in set.iter() {
            match name {
                "MA" => flags.ma = true,
                "EMA" => flags.ema = true,
                "BOLL" => flags.boll = true,
                "MACD" => flags.macd = true,
                "VOL" => flags.volume = true,
                other => flags.other.push(other.to_owned()),
            }
        }
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRequest {
    pub pane_id: PaneId,
    pub symbol: String,
    pub time_frame: TimeFrame,
    pub chart_type: ChartType,
    pub indicators: IndicatorFlags,
    pub time_range: Option<TimeRange>,
    pub zoom: ZoomLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBookRequest {
    pub pane_id: PaneId,
    pub symbol: String,
}

/// What a pane asks its widget to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum ContentRequest {
    Chart(ChartRequest),
    OrderBook(OrderBookRequest),
}

impl ContentRequest {
    #[must_use]
    pub fn pane_id(&self) -> PaneId {
        match self {
            Self::Chart(request) => request.pane_id,
            Self::OrderBook(request) => request.pane_id,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Chart(request) => &request.symbol,
            Self::OrderBook(request) => &request.symbol,
        }
    }
}

/// Map a pane to its content request.
#[must_use]
pub fn render_pane_content(pane: &ChartPaneConfig) -> ContentRequest {
    if !pane.chart_type.is_chart() {
        return ContentRequest::OrderBook(OrderBookRequest {
            pane_id: pane.id,
            symbol: pane.symbol.clone(),
        });
    }
    ContentRequest::Chart(ChartRequest {
        pane_id: pane.id,
        symbol: pane.symbol.clone(),
        time_frame: pane.time_frame,
        chart_type: pane.chart_type,
        indicators: IndicatorFlags::from_set(&pane.indicators),
        time_range: pane.time_range,
        zoom: pane.zoom,
    })
}

/// External charting widget.
pub trait ChartWidget {
    fn show_chart(&mut self, request: &ChartRequest);
}

/// External level-2 order-book widget.
pub trait OrderBookWidget {
    fn show_order_book(&mut self, request: &OrderBookRequest);
}

/// Forward `request` to the widget that handles it.
pub fn dispatch_content(
    request: &ContentRequest,
    charts: &mut dyn ChartWidget,
    books: &mut dyn OrderBookWidget,
) {
    match request {
        ContentRequest::Chart(chart) => charts.show_chart(chart),
        ContentRequest::OrderBook(book) => books.show_order_book(book),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartdeck_layout::PanePosition;

    #[derive(Default)]
    struct Recorder {
        charts: Vec<ChartRequest>,
        books: Vec<OrderBookRequest>,
    }

    impl ChartWidget for Recorder {
        fn show_chart(&mut self, request: &ChartRequest) {
            self.charts.push(request.clone());
        }
    }

    impl OrderBookWidget for Recorder {
        fn show_order_book(&mut self, request: &OrderBookRequest) {
            self.books.push(request.clone());
        }
    }

    fn pane(chart_type: ChartType) -> ChartPaneConfig {
        let mut pane = ChartPaneConfig::new(PaneId::new(3).unwrap(), "600519", PanePosition::default());
        pane.chart_type = chart_type;
        pane
    }

    #[test]
    fn level2_goes_to_the_order_book() {
        let request = render_pane_content(&pane(ChartType::Level2));
        assert_eq!(
            request,
            ContentRequest::OrderBook(OrderBookRequest {
                pane_id: PaneId::new(3).unwrap(),
                symbol: "600519".into(),
            })
        );
    }

    #[test]
    fn chart_types_carry_indicator_flags() {
        let mut p = pane(ChartType::Line);
        p.indicators.insert("BOLL");
        p.indicators.insert("KDJ");
        let ContentRequest::Chart(chart) = render_pane_content(&p) else {
            panic!("line pane should request a chart");
        };
        assert_eq!(chart.chart_type, ChartType::Line);
        assert!(chart.indicators.ma && chart.indicators.volume && chart.indicators.boll);
        assert!(!chart.indicators.macd);
        assert_eq!(chart.indicators.other, vec!["KDJ".to_owned()]);
    }

    #[test]
    fn dispatch_reaches_one_widget() {
        let mut charts = Recorder::default();
        let mut books = Recorder::default();
        for chart_type in ChartType::ALL {
            let request = render_pane_content(&pane(chart_type));
            dispatch_content(&request, &mut charts, &mut books);
        }
        assert_eq!(charts.charts.len(), 3);
        assert_eq!(books.books.len(), 1);
        assert!(charts.books.is_empty() && books.charts.is_empty());
    }
}
