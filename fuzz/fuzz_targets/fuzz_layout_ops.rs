#![no_main]

use arbitrary::Arbitrary;
use chartdeck_layout::{
    GlobalSync, LayoutEngine, LayoutOperation, PaneId, PanePosition, PaneSpan, PaneUpdate,
    PlacementPolicy, SyncGroupId, SyncSettings,
};
use libfuzzer_sys::fuzz_target;

const TEMPLATES: [&str; 10] = [
    "single",
    "horizontal-split",
    "vertical-split",
    "quad",
    "main-plus-two",
    "six-pack",
    "nine-grid",
    "multi-timeframe",
    "bloomberg-pro",
    "missing",
];

#[derive(Debug, Arbitrary)]
enum Op {
    Template(u8),
    Add,
    Remove(u8),
    Symbol(u8, u8),
    Place(u8, u8, u8, u8, u8),
    Maximize(u8),
    Minimize(u8),
    Group(u8, u8, bool),
    Leave(u8, u8),
    Global(bool, bool),
}

#[derive(Debug, Arbitrary)]
struct Script {
    span_aware: bool,
    ops: Vec<Op>,
}

fn pane(raw: u8) -> PaneId {
    PaneId::new(u64::from(raw) % 48 + 1).unwrap_or(PaneId::MIN)
}

fn group(raw: u8) -> SyncGroupId {
    SyncGroupId::new(u64::from(raw) % 8 + 1).unwrap_or(SyncGroupId::MIN)
}

fn to_operation(op: &Op) -> LayoutOperation {
    match *op {
        Op::Template(t) => LayoutOperation::ApplyTemplate {
            template_id: TEMPLATES[usize::from(t) % TEMPLATES.len()].to_owned(),
            default_symbol: "600519".to_owned(),
        },
        Op::Add => LayoutOperation::AddPane,
        Op::Remove(p) => LayoutOperation::RemovePane { pane_id: pane(p) },
        Op::Symbol(p, s) => LayoutOperation::UpdatePane {
            pane_id: pane(p),
            update: PaneUpdate::symbol(format!("S{}", s % 4)),
        },
        Op::Place(p, row, col, rows, cols) => LayoutOperation::UpdatePane {
            pane_id: pane(p),
            update: PaneUpdate::default().with_placement(
                PanePosition {
                    row: u16::from(row % 6),
                    col: u16::from(col % 6),
                },
                PaneSpan {
                    rows: u16::from(rows % 4).max(1),
                    cols: u16::from(cols % 4).max(1),
                },
            ),
        },
        Op::Maximize(p) => LayoutOperation::TogglePaneMaximize { pane_id: pane(p) },
        Op::Minimize(p) => LayoutOperation::TogglePaneMinimize { pane_id: pane(p) },
        Op::Group(a, b, all) => LayoutOperation::CreateSyncGroup {
            name: "fuzz".to_owned(),
            pane_ids: [pane(a), pane(b)].into_iter().collect(),
            settings: if all {
                SyncSettings::ALL
            } else {
                SyncSettings::default()
            },
        },
        Op::Leave(g, p) => LayoutOperation::LeaveSyncGroup {
            group_id: group(g),
            pane_id: pane(p),
        },
        Op::Global(enabled, symbol) => LayoutOperation::SetGlobalSync {
            global: GlobalSync {
                enabled,
                sync_symbol: symbol,
                ..GlobalSync::default()
            },
        },
    }
}

fuzz_target!(|script: Script| {
    let policy = if script.span_aware {
        PlacementPolicy::SpanAware
    } else {
        PlacementPolicy::OriginOnly
    };
    let engine = LayoutEngine::default().with_placement_policy(policy);
    let mut state = engine.initial_state("single", "600519");

    for op in script.ops.iter().take(256) {
        let operation = to_operation(op);
        let outcome = engine.apply_operation(&state, &operation);
        if let Some(next) = outcome.into_state() {
            assert!(
                next.validate().is_ok(),
                "{operation:?} produced an invalid state"
            );
            assert!(next.next_pane_id >= state.next_pane_id, "pane id counter went backwards");
            state = next;
        }
    }
});
