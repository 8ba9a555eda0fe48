//! Applies edit plans to a workspace through the edit player.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scribe_diff::{compute_diff, LineStats};
use scribe_player::{
    CancelSignal, EditPlayer, EditableDocument, InMemoryDocument, Pacer, ReplayOutcome,
    TokioPacer,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::error::{PlanError, PlanResult};
use crate::plan::{EditPlan, FileOperation, OperationKind};
use crate::store::FileStore;

// ---------------------------------------------------------------------------
// DocumentHost
// ---------------------------------------------------------------------------

/// Supplies the live document an animated edit is played into.
///
/// An editor integration returns its open buffer for `path`; headless
/// callers use [`BufferHost`]. The executor persists the final text through
/// its [`FileStore`] either way.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Open `path` as a document holding `content`.
    async fn open(&self, path: &str, content: &str) -> PlanResult<Arc<dyn EditableDocument>>;
}

/// Plays every edit into a private in-memory buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct BufferHost;

#[async_trait]
impl DocumentHost for BufferHost {
    async fn open(&self, _path: &str, content: &str) -> PlanResult<Arc<dyn EditableDocument>> {
        Ok(Arc::new(InMemoryDocument::new(content)))
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationStatus {
    /// `outcome` is `None` for deletions, which are not animated.
    Applied { outcome: Option<ReplayOutcome> },
    Failed { reason: String },
}

/// What happened to one operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub path: String,
    pub kind: OperationKind,
    pub status: OperationStatus,
    /// Lines added, counted line by line.
    pub additions: usize,
    /// Lines removed, counted line by line.
    pub deletions: usize,
}

impl OperationReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, OperationStatus::Applied { .. })
    }
}

/// What happened to a whole plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    pub operations: Vec<OperationReport>,
    /// `true` if a failure stopped the plan early.
    pub aborted: bool,
    pub elapsed: Duration,
}

impl PlanReport {
    pub fn applied(&self) -> usize {
        self.operations.iter().filter(|r| r.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.operations.len() - self.applied()
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed() == 0
    }
}

struct Applied {
    outcome: Option<ReplayOutcome>,
    additions: usize,
    deletions: usize,
}

// ---------------------------------------------------------------------------
// PlanExecutor
// ---------------------------------------------------------------------------

/// Applies [`EditPlan`]s in order, animating content changes.
pub struct PlanExecutor<P = TokioPacer> {
    store: Arc<dyn FileStore>,
    host: Arc<dyn DocumentHost>,
    player: EditPlayer<P>,
    config: ExecutorConfig,
}

impl PlanExecutor<TokioPacer> {
    /// Executor that plays edits into in-memory buffers.
    pub fn new(store: Arc<dyn FileStore>, config: ExecutorConfig) -> Self {
        Self::with_parts(store, Arc::new(BufferHost), EditPlayer::new(), config)
    }
}

impl<P: Pacer> PlanExecutor<P> {
    pub fn with_parts(
        store: Arc<dyn FileStore>,
        host: Arc<dyn DocumentHost>,
        player: EditPlayer<P>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            store,
            host,
            player,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub async fn execute(&self, plan: &EditPlan) -> PlanResult<PlanReport> {
        self.execute_with_cancel(plan, &CancelSignal::never()).await
    }

    /// Execute `plan`, cutting animations short once `cancel` fires.
    ///
    /// The whole plan is validated first; an invalid plan touches nothing.
    /// Failures of individual operations are recorded in the report. A
    /// cancelled plan still completes every operation, without animation
    /// past the cancellation point.
    pub async fn execute_with_cancel(
        &self,
        plan: &EditPlan,
        cancel: &CancelSignal,
    ) -> PlanResult<PlanReport> {
        plan.validate()?;

        let started = Instant::now();
        let mut operations = Vec::with_capacity(plan.len());
        let mut aborted = false;

        info!(operations = plan.len(), "executing edit plan");

        for (index, op) in plan.operations.iter().enumerate() {
            if index > 0 {
                self.pause_between_operations(cancel).await;
            }

            let path = op.path().to_string();
            let kind = op.kind();
            match self.apply(op, cancel).await {
                Ok(applied) => {
                    debug!(%path, %kind, outcome = ?applied.outcome, "operation applied");
                    operations.push(OperationReport {
                        path,
                        kind,
                        status: OperationStatus::Applied {
                            outcome: applied.outcome,
                        },
                        additions: applied.additions,
                        deletions: applied.deletions,
                    });
                }
                Err(err) => {
                    warn!(%path, %kind, error = %err, "operation failed");
                    operations.push(OperationReport {
                        path,
                        kind,
                        status: OperationStatus::Failed {
                            reason: err.to_string(),
                        },
                        additions: 0,
                        deletions: 0,
                    });
                    if !self.config.continue_on_error {
                        aborted = true;
                        break;
                    }
                }
            }
        }

        let report = PlanReport {
            operations,
            aborted,
            elapsed: started.elapsed(),
        };
        info!(
            applied = report.applied(),
            failed = report.failed(),
            aborted,
            "edit plan finished"
        );
        Ok(report)
    }

    /// Pause between two operations; returns early once `cancel` fires.
    async fn pause_between_operations(&self, cancel: &CancelSignal) {
        if cancel.is_cancelled() {
            return;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => debug!("pause between operations cut short"),
            _ = self.player.pacer().pause(self.config.animation.operation_pause()) => {}
        }
    }

    async fn apply(&self, op: &FileOperation, cancel: &CancelSignal) -> PlanResult<Applied> {
        match op {
            FileOperation::Create { path, content } | FileOperation::Update { path, content } => {
                let old = self.store.read(path).await?.unwrap_or_default();
                self.rewrite(path, &old, content, cancel).await
            }
            FileOperation::SearchReplace {
                path,
                search,
                replace,
            } => {
                let old = self
                    .store
                    .read(path)
                    .await?
                    .ok_or_else(|| PlanError::NotFound(path.clone()))?;
                if !old.contains(search.as_str()) {
                    return Err(PlanError::SearchNotFound(path.clone()));
                }
                let new = old.replacen(search.as_str(), replace, 1);
                self.rewrite(path, &old, &new, cancel).await
            }
            FileOperation::Delete { path } => {
                let old = self
                    .store
                    .read(path)
                    .await?
                    .ok_or_else(|| PlanError::NotFound(path.clone()))?;
                self.store.remove(path).await?;
                Ok(Applied {
                    outcome: None,
                    additions: 0,
                    deletions: old.lines().count(),
                })
            }
        }
    }

    async fn rewrite(
        &self,
        path: &str,
        old: &str,
        new: &str,
        cancel: &CancelSignal,
    ) -> PlanResult<Applied> {
        let stats = LineStats::between(old, new);
        let diff = compute_diff(old, new);
        let doc = self.host.open(path, old).await?;

        let report = self
            .player
            .replay_with_cancel(&diff, doc.as_ref(), self.config.animation.timing(), cancel)
            .await?;
        if let Some(reason) = &report.fallback {
            warn!(path, %reason, "edit animation fell back to a full write");
        }

        // A successful replay guarantees the document holds `new`.
        self.store.write(path, new).await?;

        Ok(Applied {
            outcome: Some(report.outcome),
            additions: stats.additions,
            deletions: stats.deletions,
        })
    }
}
