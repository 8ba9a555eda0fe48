//! Editing sessions keyed by panel.
//!
//! Each UI panel owns an [`EditSession`] obtained from a shared
//! [`SessionRegistry`]. Sessions share one executor and one set of
//! per-document locks, so two panels can never replay into the same file
//! at the same time.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use scribe_player::{CancelHandle, CancelSignal, Pacer, TokioPacer};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use uuid::Uuid;

use crate::error::{PlanError, PlanResult};
use crate::executor::{PlanExecutor, PlanReport};
use crate::plan::EditPlan;

/// Identifier of the UI panel a session belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelId(Uuid);

impl PanelId {
    /// A fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DocumentLocks
// ---------------------------------------------------------------------------

type Slot = Arc<tokio::sync::Mutex<()>>;

/// One async mutex per document path.
///
/// A slot lives only while some lease holds or waits for it.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, path: &str) -> Slot {
        self.slots
            .lock()
            .expect("lock poisoned")
            .entry(path.to_string())
            .or_default()
            .clone()
    }

    /// Lock every path, in sorted order so that overlapping sets cannot
    /// deadlock. The locks are released when the lease drops.
    pub async fn acquire(&self, paths: &BTreeSet<String>) -> DocumentLease<'_> {
        let mut lease = DocumentLease {
            locks: self,
            paths: paths.iter().cloned().collect(),
            guards: Vec::with_capacity(paths.len()),
        };
        for path in paths {
            let slot = self.slot(path);
            lease.guards.push(slot.lock_owned().await);
        }
        lease
    }

    /// Remove slots nobody holds or waits for.
    fn prune(&self, paths: &[String]) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        for path in paths {
            if slots.get(path).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                slots.remove(path);
            }
        }
    }

    /// Number of paths currently locked or waited on.
    pub fn len(&self) -> usize {
        self.slots.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held document locks. Dropping it releases them.
#[derive(Debug)]
pub struct DocumentLease<'a> {
    locks: &'a DocumentLocks,
    paths: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl DocumentLease<'_> {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for DocumentLease<'_> {
    fn drop(&mut self) {
        self.guards.clear();
        self.locks.prune(&self.paths);
    }
}

// ---------------------------------------------------------------------------
// EditSession
// ---------------------------------------------------------------------------

/// The state one panel holds: its history and its running plans.
///
/// A session may run several plans at once (on different files, or queued
/// on the same file). Each run registers its own cancel handle, so
/// [`EditSession::cancel`] reaches every run still in flight.
pub struct EditSession<P = TokioPacer> {
    id: PanelId,
    title: String,
    executor: Arc<PlanExecutor<P>>,
    locks: Arc<DocumentLocks>,
    history: RwLock<Vec<PlanReport>>,
    active: Mutex<HashMap<u64, CancelHandle>>,
    next_run: AtomicU64,
}

/// Deregisters a run's cancel handle, including when the run future is
/// dropped before completion.
struct ActiveRun<'a> {
    active: &'a Mutex<HashMap<u64, CancelHandle>>,
    run: u64,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.active.lock().expect("lock poisoned").remove(&self.run);
    }
}

impl<P: Pacer> EditSession<P> {
    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn register(&self) -> (ActiveRun<'_>, CancelSignal) {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        let handle = CancelHandle::new();
        let signal = handle.signal();
        self.active
            .lock()
            .expect("lock poisoned")
            .insert(run, handle);
        (
            ActiveRun {
                active: &self.active,
                run,
            },
            signal,
        )
    }

    /// Run a plan, waiting for any other replay on the same files to finish.
    pub async fn run(&self, plan: &EditPlan) -> PlanResult<PlanReport> {
        let (_active, signal) = self.register();

        let lease = self.locks.acquire(&plan.touched_paths()).await;
        debug!(panel = %self.id, locked = lease.len(), "session running plan");
        let result = self.executor.execute_with_cancel(plan, &signal).await;
        drop(lease);

        if let Ok(report) = &result {
            self.history
                .write()
                .expect("lock poisoned")
                .push(report.clone());
        }
        result
    }

    /// Cut every running plan's animation short. Returns `false` if idle.
    pub fn cancel(&self) -> bool {
        let active = self.active.lock().expect("lock poisoned");
        for handle in active.values() {
            handle.cancel();
        }
        !active.is_empty()
    }

    pub fn is_running(&self) -> bool {
        !self.active.lock().expect("lock poisoned").is_empty()
    }

    /// Number of plans currently running or queued in this session.
    pub fn running(&self) -> usize {
        self.active.lock().expect("lock poisoned").len()
    }

    /// Reports of every completed plan, oldest first.
    pub fn history(&self) -> Vec<PlanReport> {
        self.history.read().expect("lock poisoned").clone()
    }
}

impl<P> fmt::Debug for EditSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Owns every open session. Passed by reference to whoever drives the UI.
pub struct SessionRegistry<P = TokioPacer> {
    executor: Arc<PlanExecutor<P>>,
    locks: Arc<DocumentLocks>,
    sessions: RwLock<HashMap<PanelId, Arc<EditSession<P>>>>,
}

impl<P: Pacer> SessionRegistry<P> {
    pub fn new(executor: PlanExecutor<P>) -> Self {
        Self {
            executor: Arc::new(executor),
            locks: Arc::new(DocumentLocks::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a session for a new panel.
    pub fn open(&self, title: impl Into<String>) -> Arc<EditSession<P>> {
        let session = Arc::new(EditSession {
            id: PanelId::new(),
            title: title.into(),
            executor: Arc::clone(&self.executor),
            locks: Arc::clone(&self.locks),
            history: RwLock::new(Vec::new()),
            active: Mutex::new(HashMap::new()),
            next_run: AtomicU64::new(0),
        });
        self.sessions
            .write()
            .expect("lock poisoned")
            .insert(session.id, Arc::clone(&session));
        debug!(panel = %session.id, "session opened");
        session
    }

    pub fn get(&self, id: PanelId) -> PlanResult<Arc<EditSession<P>>> {
        self.sessions
            .read()
            .expect("lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(PlanError::SessionNotFound(id))
    }

    /// Close a session, cancelling its running plan. Returns `true` if it existed.
    pub fn close(&self, id: PanelId) -> bool {
        let removed = self.sessions.write().expect("lock poisoned").remove(&id);
        match removed {
            Some(session) => {
                session.cancel();
                debug!(panel = %id, "session closed");
                true
            }
            None => false,
        }
    }

    /// Ids of all open sessions, sorted.
    pub fn ids(&self) -> Vec<PanelId> {
        let mut ids: Vec<PanelId> = self
            .sessions
            .read()
            .expect("lock poisoned")
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
