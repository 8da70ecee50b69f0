//! Store behaviour as seen by subscribers: publish counts, deferred
//! re-entrant dispatch, history, persistence, config loading, and the
//! `chartdeck.publish` span.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use chartdeck_layout::{
    LayoutOperation, LayoutOperationKind, NoOpReason, PaneUpdate, PlacementPolicy, SyncSettings,
    WorkspaceMetadata,
};
use chartdeck_runtime::{
    ChangeCause, ConfigError, DeckConfig, DispatchStatus, LayoutStore, StoreChange, StoreError,
    Subscription,
};
use proptest::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

fn quad_store() -> LayoutStore {
    let config = DeckConfig {
        initial_template: "quad".into(),
        ..DeckConfig::default()
    };
    LayoutStore::from_config(&config).unwrap()
}

fn record_changes(store: &LayoutStore) -> (Rc<RefCell<Vec<StoreChange>>>, Subscription) {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    let sub = store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    (changes, sub)
}

#[test]
fn grouped_symbol_change_publishes_once() {
    let store = quad_store();
    let ids: Vec<_> = store.state().pane_ids().collect();
    let status = store.dispatch(LayoutOperation::CreateSyncGroup {
        name: "all".into(),
        pane_ids: ids.iter().copied().collect(),
        settings: SyncSettings::default(),
    });
    assert!(status.created_group().is_some());

    let (changes, _sub) = record_changes(&store);
    store.update_pane(ids[2], PaneUpdate::symbol("000001"));

    let changes = changes.borrow();
    assert_eq!(changes.len(), 1);
    let change = &changes[0];
    assert_eq!(change.cause, ChangeCause::Operation(LayoutOperationKind::UpdatePane));
    assert_eq!(change.touched, ids.iter().copied().collect::<BTreeSet<_>>());
    assert!(change.state.panes.iter().all(|p| p.symbol == "000001"));
}

#[test]
fn subscribers_never_see_partial_propagation() {
    let store = quad_store();
    let ids: Vec<_> = store.state().pane_ids().collect();
    store.dispatch(LayoutOperation::CreateSyncGroup {
        name: "all".into(),
        pane_ids: ids.iter().copied().collect(),
        settings: SyncSettings::default(),
    });
    let observed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    let handle = store.clone();
    let _sub = store.subscribe(move |_| {
        let symbols: BTreeSet<String> = handle.state().panes.iter().map(|p| p.symbol.clone()).collect();
        sink.borrow_mut().push(symbols.len());
    });
    store.update_pane(ids[0], PaneUpdate::symbol("AAPL"));
    assert_eq!(*observed.borrow(), vec![1]);
}

#[test]
fn subscribers_run_in_registration_order() {
    let store = quad_store();
    let order = Rc::new(RefCell::new(Vec::new()));
    let first = Rc::clone(&order);
    let second = Rc::clone(&order);
    let _a = store.subscribe(move |_| first.borrow_mut().push("a"));
    let _b = store.subscribe(move |_| second.borrow_mut().push("b"));
    store.add_pane();
    assert_eq!(*order.borrow(), vec!["a", "b"]);
}

#[test]
fn reentrant_dispatch_runs_after_the_round() {
    let store = quad_store();
    let handle = store.clone();
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _sub = store.subscribe(move |change| {
        sink.borrow_mut().push(change.version);
        if change.version == 1 {
            let status = handle.dispatch(LayoutOperation::SetDefaultSymbol {
                symbol: "TSLA".into(),
            });
            assert_eq!(status, DispatchStatus::Queued);
            // The queued command has not run yet.
            assert_eq!(handle.version(), 1);
        }
    });

    store.add_pane();
    assert_eq!(*log.borrow(), vec![1, 2]);
    assert_eq!(store.state().default_symbol, "TSLA");
}

#[test]
fn undo_and_redo_each_publish_once() {
    let store = quad_store();
    store.add_pane();
    let (changes, _sub) = record_changes(&store);

    store.undo();
    store.redo();
    assert_eq!(store.undo(), DispatchStatus::Applied {
        version: 4,
        created_pane: None,
        created_group: None,
    });
    assert_eq!(store.undo(), DispatchStatus::HistoryExhausted);
    assert_eq!(store.version(), 4);

    let causes: Vec<_> = changes.borrow().iter().map(|c| c.cause).collect();
    assert_eq!(&causes[..3], &[ChangeCause::Undo, ChangeCause::Redo, ChangeCause::Undo]);
}

#[test]
fn unknown_ids_publish_nothing() {
    let store = quad_store();
    let (changes, _sub) = record_changes(&store);
    let ghost = chartdeck_layout::PaneId::new(9_999).unwrap();
    let status = store.dispatch(LayoutOperation::TogglePaneMaximize { pane_id: ghost });
    assert_eq!(
        status,
        DispatchStatus::Unchanged(NoOpReason::UnknownPaneId { pane_id: ghost })
    );
    assert!(changes.borrow().is_empty());
    assert!(!store.can_undo());
}

#[test]
fn snapshot_round_trips_through_json() {
    let store = quad_store();
    store.add_pane();
    let json = store
        .snapshot(WorkspaceMetadata::new("morning desk"))
        .to_json()
        .unwrap();

    let fresh = LayoutStore::from_config(&DeckConfig::default()).unwrap();
    let status = fresh.restore_json(&json).unwrap();
    assert!(status.is_applied());
    assert_eq!(*fresh.state(), *store.state());

    // Ids keep counting from the restored state.
    let added = fresh.add_pane().created_pane().unwrap();
    assert!(store.state().pane_ids().all(|id| id < added));
}

#[test]
fn restoring_the_current_layout_is_unchanged() {
    let store = quad_store();
    let snapshot = store.snapshot(WorkspaceMetadata::new("desk"));
    assert_eq!(
        store.restore(snapshot).unwrap(),
        DispatchStatus::Unchanged(NoOpReason::NothingChanged)
    );
    assert_eq!(store.version(), 0);
}

#[test]
fn garbage_snapshot_is_an_error() {
    let store = quad_store();
    assert!(matches!(
        store.restore_json("{not json"),
        Err(StoreError::Migration(_))
    ));
}

#[test]
fn exhausted_pane_ids_are_never_reissued() {
    let store = LayoutStore::from_config(&DeckConfig::default()).unwrap();
    let mut snapshot = store.snapshot(WorkspaceMetadata::new("edge"));
    snapshot.layout.next_pane_id = chartdeck_layout::PaneId::new(u64::MAX).unwrap();
    let json = snapshot.to_json().unwrap();
    assert!(store.restore_json(&json).unwrap().is_applied());

    for _ in 0..2 {
        assert_eq!(
            store.add_pane(),
            DispatchStatus::Unchanged(NoOpReason::PaneIdExhausted)
        );
    }
    assert!(store.state().validate().is_ok());
    assert_eq!(store.state().panes.len(), 1);
}

#[test]
fn snapshots_with_broken_pane_values_are_rejected() {
    let store = LayoutStore::from_config(&DeckConfig::default()).unwrap();
    let json = store.snapshot(WorkspaceMetadata::new("desk")).to_json().unwrap();
    let base: serde_json::Value = serde_json::from_str(&json).unwrap();

    let mut zero_id = base.clone();
    zero_id["layout"]["panes"][0]["id"] = serde_json::json!(0);
    let mut inverted = base;
    inverted["layout"]["panes"][0]["time_range"] =
        serde_json::json!({"start_ms": 500, "end_ms": 10});

    for broken in [zero_id, inverted] {
        assert!(matches!(
            store.restore_json(&broken.to_string()),
            Err(StoreError::Migration(_))
        ));
    }
    assert_eq!(store.version(), 0);
}

// ============================================================================
// Config-driven construction
// ============================================================================

const WIDE_CATALOG: &str = r#"[{
    "id": "wide",
    "name": "Wide",
    "grid_size": {"rows": 2, "cols": 2},
    "category": "custom",
    "panes": [
        {"title": "Top", "chart_type": "area", "time_frame": "1h",
         "position": {"row": 0, "col": 0}, "size": {"rows": 1, "cols": 2}},
        {"title": "Left", "chart_type": "line", "time_frame": "5m",
         "position": {"row": 1, "col": 0}}
    ]
}]"#;

#[test]
fn config_file_and_catalog_build_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("templates.json");
    std::fs::write(&catalog_path, WIDE_CATALOG).unwrap();
    let config_path = dir.path().join("chartdeck.toml");
    std::fs::write(
        &config_path,
        format!(
            "default_symbol = \"AAPL\"\ninitial_template = \"wide\"\nplacement_policy = \"span_aware\"\ncatalog_path = {:?}\n",
            catalog_path.display().to_string()
        ),
    )
    .unwrap();

    let config = DeckConfig::load(&config_path).unwrap();
    let store = LayoutStore::from_config(&config).unwrap();
    assert_eq!(store.engine().placement_policy(), PlacementPolicy::SpanAware);

    let state = store.state();
    assert_eq!(state.current_template_id.as_deref(), Some("wide"));
    assert_eq!(state.panes.len(), 2);
    assert!(state.panes.iter().all(|p| p.symbol == "AAPL"));

    // Span-aware placement sees (0,1) as covered and takes the free (1,1).
    let pane = store.add_pane().created_pane().unwrap();
    let placed = store.state().pane(pane).unwrap().position;
    assert_eq!((placed.row, placed.col), (1, 1));
}

#[test]
fn json_config_is_detected_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.json");
    std::fs::write(&path, r#"{"initial_template": "horizontal-split", "history_depth": 5}"#).unwrap();
    let config = DeckConfig::load(&path).unwrap();
    assert_eq!(config.history_depth, 5);
    assert!(LayoutStore::from_config(&config).is_ok());
}

#[test]
fn missing_initial_template_is_rejected() {
    let config = DeckConfig {
        initial_template: "does-not-exist".into(),
        ..DeckConfig::default()
    };
    assert!(matches!(
        LayoutStore::from_config(&config),
        Err(StoreError::UnknownTemplate { template_id }) if template_id == "does-not-exist"
    ));
}

#[test]
fn invalid_config_is_rejected_before_building() {
    let config = DeckConfig {
        history_depth: 0,
        ..DeckConfig::default()
    };
    assert!(matches!(
        LayoutStore::from_config(&config),
        Err(StoreError::Config(ConfigError::Validation(_)))
    ));
}

#[test]
fn missing_config_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = DeckConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

// ============================================================================
// Publish span capture
// ============================================================================

#[derive(Debug, Clone, Default)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

struct SpanCapture {
    spans: Arc<Mutex<HashMap<u64, CapturedSpan>>>,
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut span = CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: HashMap::new(),
        };
        attrs.record(&mut FieldVisitor(&mut span.fields));
        self.spans.lock().unwrap().insert(id.into_u64(), span);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = self.spans.lock().unwrap().get_mut(&id.into_u64()) {
            values.record(&mut FieldVisitor(&mut span.fields));
        }
    }
}

#[test]
fn publish_rounds_are_spanned() {
    let spans = Arc::new(Mutex::new(HashMap::new()));
    let layer = SpanCapture {
        spans: Arc::clone(&spans),
    };
    let subscriber = tracing_subscriber::registry().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        let store = quad_store();
        let _a = store.subscribe(|_| {});
        let _b = store.subscribe(|_| {});
        store.add_pane();
        // No-ops open no publish span.
        store.dispatch(LayoutOperation::SelectPane { pane_id: None });
    });

    let spans = spans.lock().unwrap();
    let publish: Vec<_> = spans
        .values()
        .filter(|s| s.name == "chartdeck.publish")
        .collect();
    assert_eq!(publish.len(), 1);
    let span = publish[0];
    assert_eq!(span.fields.get("version").map(String::as_str), Some("1"));
    assert_eq!(span.fields.get("subscribers").map(String::as_str), Some("2"));
    assert!(span.fields.contains_key("duration_us"));
}

// ============================================================================
// Properties
// ============================================================================

fn operation_strategy() -> impl Strategy<Value = u8> {
    0u8..6
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every published version is seen exactly once, in order, and the
    /// subscriber's last view matches the store.
    #[test]
    fn versions_are_contiguous(script in prop::collection::vec(operation_strategy(), 1..40)) {
        let store = quad_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = store.subscribe(move |change| sink.borrow_mut().push(change.version));
        let mut last = 0u64;

        for step in script {
            let first = store.state().panes.first().map(|p| p.id);
            let status = match (step, first) {
                (0, _) => store.add_pane(),
                (1, Some(id)) => store.dispatch(LayoutOperation::RemovePane { pane_id: id }),
                (2, Some(id)) => store.update_pane(id, PaneUpdate::symbol(format!("S{last}"))),
                (3, _) => store.undo(),
                (4, _) => store.redo(),
                _ => store.apply_template("horizontal-split", "600519"),
            };
            if let DispatchStatus::Applied { version, .. } = status {
                last = version;
            }
        }

        let seen = seen.borrow();
        let expected: Vec<u64> = (1..=store.version()).collect();
        prop_assert_eq!(&*seen, &expected);
        prop_assert_eq!(last, store.version());
    }
}
