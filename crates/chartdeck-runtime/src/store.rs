#![forbid(unsafe_code)]

//! Observable layout store with undo history.
//!
//! # Design
//!
//! [`LayoutStore`] owns the current `Arc<LayoutState>` in shared,
//! reference-counted storage (`Rc<RefCell<..>>`). Every command computes the
//! complete next state through the [`LayoutEngine`], swaps it in, and then
//! runs exactly one notification round. Subscribers always observe complete
//! states and never a partially propagated one.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per published state.
//! 2. An unchanged outcome publishes nothing.
//! 3. Subscribers are notified in registration order.
//! 4. A command issued while a notification round is running is queued and
//!    applied after the round ends. Rounds never nest.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: callbacks live as long as their [`Subscription`]
//!   guard. Dead weak references are pruned lazily on the next publish.
//! - **Subscriber panic**: the round finishes for the other subscribers and
//!   the panic is resumed to the caller. The store stays usable afterwards.
//! - **Unbounded feedback**: a subscriber that dispatches on every change
//!   keeps the queue busy forever. Each queued command still publishes once.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use chartdeck_layout::{
    CatalogError, LayoutEngine, LayoutOperation, LayoutOperationKind, LayoutOutcome, LayoutState,
    NoOpReason, PaneId, PaneUpdate, SyncGroupId, TemplateCatalog, WorkspaceMetadata,
    WorkspaceMigrationError, WorkspaceSnapshot, WorkspaceValidationError,
};
use thiserror::Error;
use tracing::{debug, info_span, warn};
use web_time::Instant;

use crate::config::{ConfigError, DeckConfig};
use crate::history::SnapshotHistory;

type CallbackRc = Rc<dyn Fn(&StoreChange)>;
type CallbackWeak = Weak<dyn Fn(&StoreChange)>;

/// What produced a published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Operation(LayoutOperationKind),
    Undo,
    Redo,
    Restore,
}

/// One published state, as seen by subscribers.
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub version: u64,
    pub state: Arc<LayoutState>,
    pub cause: ChangeCause,
    /// Panes the operation touched. Empty for undo, redo, and restore.
    pub touched: BTreeSet<PaneId>,
}

/// Result of a store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Applied {
        version: u64,
        created_pane: Option<PaneId>,
        created_group: Option<SyncGroupId>,
    },
    Unchanged(NoOpReason),
    /// Undo or redo had nothing to step to.
    HistoryExhausted,
    /// Issued during a notification round; runs when the round ends.
    Queued,
}

impl DispatchStatus {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    #[must_use]
    pub const fn created_pane(&self) -> Option<PaneId> {
        match self {
            Self::Applied { created_pane, .. } => *created_pane,
            _ => None,
        }
    }

    #[must_use]
    pub const fn created_group(&self) -> Option<SyncGroupId> {
        match self {
            Self::Applied { created_group, .. } => *created_group,
            _ => None,
        }
    }
}

/// Errors from building or restoring a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("template catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("initial template '{template_id}' is not in the catalog")]
    UnknownTemplate { template_id: String },
    #[error("workspace rejected: {0}")]
    Workspace(#[from] WorkspaceValidationError),
    #[error("workspace could not be loaded: {0}")]
    Migration(#[from] WorkspaceMigrationError),
}

enum Command {
    Dispatch(LayoutOperation),
    Undo,
    Redo,
    Restore(Arc<LayoutState>),
}

struct StoreInner {
    engine: LayoutEngine,
    state: Arc<LayoutState>,
    version: u64,
    subscribers: Vec<CallbackWeak>,
    history: SnapshotHistory<LayoutState>,
    queue: VecDeque<Command>,
    notifying: bool,
    saved_generation: u64,
}

impl StoreInner {
    fn publish_state(
        &mut self,
        state: Arc<LayoutState>,
        cause: ChangeCause,
        touched: BTreeSet<PaneId>,
    ) -> StoreChange {
        self.state = state;
        self.version += 1;
        StoreChange {
            version: self.version,
            state: Arc::clone(&self.state),
            cause,
            touched,
        }
    }

    fn apply(&mut self, command: Command) -> (DispatchStatus, Option<StoreChange>) {
        match command {
            Command::Dispatch(operation) => {
                match self.engine.apply_operation(&self.state, &operation) {
                    LayoutOutcome::Applied(transition) => {
                        let transition = *transition;
                        let state = Arc::new(transition.state);
                        self.history.record(Arc::clone(&state));
                        let change = self.publish_state(
                            state,
                            ChangeCause::Operation(transition.kind),
                            transition.touched,
                        );
                        let status = DispatchStatus::Applied {
                            version: change.version,
                            created_pane: transition.created_pane,
                            created_group: transition.created_group,
                        };
                        (status, Some(change))
                    }
                    LayoutOutcome::Unchanged { reason, .. } => {
                        (DispatchStatus::Unchanged(reason), None)
                    }
                }
            }
            Command::Undo => self.step_history(ChangeCause::Undo),
            Command::Redo => self.step_history(ChangeCause::Redo),
            Command::Restore(state) => {
                if *state == *self.state {
                    return (DispatchStatus::Unchanged(NoOpReason::NothingChanged), None);
                }
                self.history.record(Arc::clone(&state));
                let change = self.publish_state(state, ChangeCause::Restore, BTreeSet::new());
                (applied(change.version), Some(change))
            }
        }
    }

    fn step_history(&mut self, cause: ChangeCause) -> (DispatchStatus, Option<StoreChange>) {
        let step = match cause {
            ChangeCause::Redo => self.history.redo(),
            _ => self.history.undo(),
        };
        let Some(state) = step else {
            return (DispatchStatus::HistoryExhausted, None);
        };
        debug!(target: "chartdeck.store", cause = ?cause, "history step");
        let change = self.publish_state(state, cause, BTreeSet::new());
        (applied(change.version), Some(change))
    }
}

fn applied(version: u64) -> DispatchStatus {
    DispatchStatus::Applied {
        version,
        created_pane: None,
        created_group: None,
    }
}

/// Single-threaded owner of the published layout state.
///
/// Cloning a `LayoutStore` creates a new handle to the **same** store. Hand
/// clones to subscribers that need to dispatch follow-up commands.
pub struct LayoutStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Clone for LayoutStore {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LayoutStore")
            .field("version", &inner.version)
            .field("panes", &inner.state.panes.len())
            .field("subscriber_count", &inner.subscribers.len())
            .field("history", &inner.history)
            .finish()
    }
}

impl LayoutStore {
    /// Create a store at `initial`. The initial state is version 0.
    #[must_use]
    pub fn new(engine: LayoutEngine, initial: LayoutState, history_depth: usize) -> Self {
        let state = Arc::new(initial);
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                engine,
                history: SnapshotHistory::new(Arc::clone(&state), history_depth),
                state,
                version: 0,
                subscribers: Vec::new(),
                queue: VecDeque::new(),
                notifying: false,
                saved_generation: 0,
            })),
        }
    }

    /// Build the catalog, engine, and initial layout described by `config`.
    pub fn from_config(config: &DeckConfig) -> Result<Self, StoreError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Validation(problems).into());
        }
        let catalog = match &config.catalog_path {
            Some(path) => TemplateCatalog::from_json_file(path)?,
            None => TemplateCatalog::builtin(),
        };
        if catalog.get(&config.initial_template).is_none() {
            warn!(
                target: "chartdeck.config",
                template_id = %config.initial_template,
                "initial template missing from catalog"
            );
            return Err(StoreError::UnknownTemplate {
                template_id: config.initial_template.clone(),
            });
        }
        let engine =
            LayoutEngine::new(Arc::new(catalog)).with_placement_policy(config.placement_policy);
        let initial = engine.initial_state(&config.initial_template, &config.default_symbol);
        Ok(Self::new(engine, initial, config.history_depth))
    }

    /// The current published state.
    #[must_use]
    pub fn state(&self) -> Arc<LayoutState> {
        Arc::clone(&self.inner.borrow().state)
    }

    /// Access the current state without cloning the `Arc`.
    pub fn with_state<R>(&self, f: impl FnOnce(&LayoutState) -> R) -> R {
        f(&self.inner.borrow().state)
    }

    /// Number of states published since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    #[must_use]
    pub fn engine(&self) -> LayoutEngine {
        self.inner.borrow().engine.clone()
    }

    /// Subscribe to published states.
    ///
    /// Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&StoreChange) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Registered subscribers, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Apply a layout operation and publish the result.
    pub fn dispatch(&self, operation: LayoutOperation) -> DispatchStatus {
        self.run(Command::Dispatch(operation))
    }

    pub fn apply_template(&self, template_id: &str, default_symbol: &str) -> DispatchStatus {
        self.dispatch(LayoutOperation::ApplyTemplate {
            template_id: template_id.to_owned(),
            default_symbol: default_symbol.to_owned(),
        })
    }

    pub fn add_pane(&self) -> DispatchStatus {
        self.dispatch(LayoutOperation::AddPane)
    }

    pub fn update_pane(&self, pane_id: PaneId, update: PaneUpdate) -> DispatchStatus {
        self.dispatch(LayoutOperation::UpdatePane { pane_id, update })
    }

    pub fn undo(&self) -> DispatchStatus {
        self.run(Command::Undo)
    }

    pub fn redo(&self) -> DispatchStatus {
        self.run(Command::Redo)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.inner.borrow().history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.inner.borrow().history.can_redo()
    }

    /// Capture the current layout for persistence.
    ///
    /// Each capture gets the next save generation, counting on from the
    /// last restored snapshot.
    #[must_use]
    pub fn snapshot(&self, mut metadata: WorkspaceMetadata) -> WorkspaceSnapshot {
        let mut inner = self.inner.borrow_mut();
        metadata.saved_generation = inner.saved_generation;
        metadata.increment_generation();
        inner.saved_generation = metadata.saved_generation;
        WorkspaceSnapshot::new(inner.state.as_ref().clone(), metadata)
    }

    /// Replace the layout with a validated snapshot. Undo returns to the
    /// state before the restore.
    pub fn restore(&self, snapshot: WorkspaceSnapshot) -> Result<DispatchStatus, StoreError> {
        snapshot.validate()?;
        {
            let mut inner = self.inner.borrow_mut();
            inner.saved_generation = inner
                .saved_generation
                .max(snapshot.metadata.saved_generation);
        }
        Ok(self.run(Command::Restore(Arc::new(snapshot.layout))))
    }

    /// Parse, migrate, validate, and restore a JSON snapshot.
    pub fn restore_json(&self, json: &str) -> Result<DispatchStatus, StoreError> {
        let snapshot = WorkspaceSnapshot::from_json(json)?;
        self.restore(snapshot)
    }

    fn run(&self, command: Command) -> DispatchStatus {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.notifying {
                inner.queue.push_back(command);
                debug!(
                    target: "chartdeck.store",
                    queued = inner.queue.len(),
                    "command deferred until notification round ends"
                );
                return DispatchStatus::Queued;
            }
        }
        let status = self.execute(command);
        self.drain_queue();
        status
    }

    fn execute(&self, command: Command) -> DispatchStatus {
        let (status, change) = self.inner.borrow_mut().apply(command);
        if let Some(change) = change {
            self.notify(&change);
        }
        status
    }

    fn drain_queue(&self) {
        loop {
            let next = self.inner.borrow_mut().queue.pop_front();
            let Some(command) = next else {
                break;
            };
            self.execute(command);
        }
    }

    /// Run one notification round.
    ///
    /// A panicking subscriber does not stop the round: the remaining
    /// subscribers still run, then the first panic is resumed.
    fn notify(&self, change: &StoreChange) {
        let callbacks: Vec<CallbackRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let live: Vec<CallbackRc> = inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            live
        };
        let _round = NotifyRound::begin(&self.inner);

        let subscribers = callbacks.len() as u64;
        let started = Instant::now();
        let span = info_span!(
            "chartdeck.publish",
            version = change.version,
            subscribers,
            duration_us = tracing::field::Empty
        );
        let _entered = span.enter();

        let mut first_panic: Option<Box<dyn Any + Send>> = None;
        for callback in &callbacks {
            let result = panic::catch_unwind(AssertUnwindSafe(|| callback(change)));
            if let Err(payload) = result
                && first_panic.is_none()
            {
                first_panic = Some(payload);
            }
        }

        let duration_us = started.elapsed().as_micros() as u64;
        span.record("duration_us", duration_us);

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

/// Marks a notification round for as long as it is alive.
///
/// Dropping it always reopens the store, including while unwinding from a
/// subscriber panic. Commands queued by an aborted round are discarded.
struct NotifyRound<'a> {
    inner: &'a RefCell<StoreInner>,
}

impl<'a> NotifyRound<'a> {
    fn begin(inner: &'a RefCell<StoreInner>) -> Self {
        inner.borrow_mut().notifying = true;
        Self { inner }
    }
}

impl Drop for NotifyRound<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.notifying = false;
        if std::thread::panicking() && !inner.queue.is_empty() {
            warn!(
                target: "chartdeck.store",
                dropped = inner.queue.len(),
                "subscriber panicked; discarding queued commands"
            );
            inner.queue.clear();
        }
    }
}

/// RAII guard for a store subscriber.
///
/// Dropping it releases the callback; the store prunes the dead entry on the
/// next publish.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn store() -> LayoutStore {
        let engine = LayoutEngine::default();
        let initial = engine.initial_state("single", "600519");
        LayoutStore::new(engine, initial, 16)
    }

    #[test]
    fn applied_dispatch_bumps_version_once() {
        let store = store();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let _sub = store.subscribe(move |_| seen.set(seen.get() + 1));
        let status = store.add_pane();
        assert!(status.is_applied());
        assert!(status.created_pane().is_some());
        assert_eq!(store.version(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unchanged_dispatch_publishes_nothing() {
        let store = store();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let _sub = store.subscribe(move |_| seen.set(seen.get() + 1));
        let ghost = PaneId::new(404).unwrap();
        let status = store.dispatch(LayoutOperation::RemovePane { pane_id: ghost });
        assert_eq!(
            status,
            DispatchStatus::Unchanged(NoOpReason::UnknownPaneId { pane_id: ghost })
        );
        assert_eq!(store.version(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn dropped_subscription_stops_callbacks() {
        let store = store();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let sub = store.subscribe(move |_| seen.set(seen.get() + 1));
        store.add_pane();
        drop(sub);
        store.add_pane();
        assert_eq!(calls.get(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn undo_and_redo_restore_prior_states() {
        let store = store();
        let initial = store.state();
        store.add_pane();
        let grown = store.state();
        assert_eq!(store.undo(), applied(2));
        assert_eq!(*store.state(), *initial);
        assert_eq!(store.redo(), applied(3));
        assert_eq!(*store.state(), *grown);
        assert_eq!(store.redo(), DispatchStatus::HistoryExhausted);
    }

    #[test]
    fn new_operation_clears_redo() {
        let store = store();
        store.add_pane();
        store.undo();
        assert!(store.can_redo());
        store.apply_template("quad", "AAPL");
        assert!(!store.can_redo());
        assert!(store.can_undo());
    }

    #[test]
    fn reentrant_dispatch_is_queued() {
        let store = store();
        let handle = store.clone();
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::clone(&statuses);
        let _sub = store.subscribe(move |change| {
            if change.version == 1 {
                record.borrow_mut().push(handle.add_pane());
            }
        });
        store.add_pane();
        assert_eq!(*statuses.borrow(), vec![DispatchStatus::Queued]);
        assert_eq!(store.version(), 2);
        assert_eq!(store.state().panes.len(), 3);
    }

    #[test]
    fn restore_replaces_layout_and_is_undoable() {
        let store = store();
        let engine = store.engine();
        let quad = engine.initial_state("quad", "000001");
        let snapshot = WorkspaceSnapshot::new(quad.clone(), WorkspaceMetadata::new("desk"));
        let status = store.restore(snapshot).unwrap();
        assert!(status.is_applied());
        assert_eq!(*store.state(), quad);
        store.undo();
        assert_eq!(store.state().panes.len(), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_wedge_the_store() {
        let store = store();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let faulty = store.subscribe(|_| panic!("subscriber failed"));
        let _steady = store.subscribe(move |_| seen.set(seen.get() + 1));

        let result = panic::catch_unwind(AssertUnwindSafe(|| store.add_pane()));
        assert!(result.is_err());
        assert_eq!(store.version(), 1);
        // Later subscribers still ran in the failed round.
        assert_eq!(calls.get(), 1);

        drop(faulty);
        let status = store.add_pane();
        assert!(status.is_applied());
        assert_eq!(store.version(), 2);
        assert_eq!(store.state().panes.len(), 3);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn commands_queued_by_a_failed_round_are_dropped() {
        let store = store();
        let handle = store.clone();
        let sub = store.subscribe(move |_| {
            handle.add_pane();
            panic!("subscriber failed after dispatching");
        });
        assert!(panic::catch_unwind(AssertUnwindSafe(|| store.add_pane())).is_err());
        drop(sub);
        assert_eq!(store.version(), 1);
        assert_eq!(store.state().panes.len(), 2);
        assert!(store.add_pane().is_applied());
        assert_eq!(store.state().panes.len(), 3);
    }

    #[test]
    fn snapshots_count_save_generations() {
        let store = store();
        let first = store.snapshot(WorkspaceMetadata::new("desk"));
        let second = store.snapshot(WorkspaceMetadata::new("desk"));
        assert_eq!(first.metadata.saved_generation, 1);
        assert_eq!(second.metadata.saved_generation, 2);

        let other = LayoutStore::new(store.engine(), store.state().as_ref().clone(), 4);
        let mut saved = second.clone();
        saved.metadata.saved_generation = 9;
        other.restore(saved).unwrap();
        assert_eq!(
            other.snapshot(WorkspaceMetadata::new("desk")).metadata.saved_generation,
            10
        );
    }

    #[test]
    fn invalid_snapshot_is_rejected() {
        let store = store();
        let mut snapshot = store.snapshot(WorkspaceMetadata::new("desk"));
        snapshot.metadata.name.clear();
        assert!(matches!(
            store.restore(snapshot),
            Err(StoreError::Workspace(WorkspaceValidationError::EmptyWorkspaceName))
        ));
        assert_eq!(store.version(), 0);
    }
}
