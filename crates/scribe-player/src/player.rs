//! Replays a diff sequence against a live document as single-unit edits.
//!
//! The animation is cosmetic. The contract is the final state: when a
//! replay returns `Ok`, the document holds exactly the diff's target text,
//! either because the animation got there or because a corrective
//! full-content write did.

use std::fmt;
use std::time::Duration;

use scribe_diff::{DiffSequence, OpKind};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cancel::CancelSignal;
use crate::document::EditableDocument;
use crate::error::{DocumentError, ReplayError, ReplayResult};
use crate::timing::{AnimationTiming, Pacer, TokioPacer};

// ---------------------------------------------------------------------------
// Phases and outcomes
// ---------------------------------------------------------------------------

/// Where a replay call is in its lifecycle.
///
/// `Idle -> Animating* -> Verifying -> {Done | FallbackApplied}`. With
/// animation disabled the `Animating` phase is skipped entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReplayPhase {
    Idle,
    Animating,
    Verifying,
    Done,
    FallbackApplied,
}

impl ReplayPhase {
    /// Returns `true` if `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: ReplayPhase) -> bool {
        use ReplayPhase::*;
        matches!(
            (self, next),
            (Idle, Animating)
                | (Idle, Verifying)
                | (Animating, Animating)
                | (Animating, Verifying)
                | (Verifying, Done)
                | (Verifying, FallbackApplied)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::FallbackApplied)
    }
}

/// Terminal result of a successful replay call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReplayOutcome {
    /// The document reached the target without a corrective write.
    Done,
    /// A corrective full-content write produced the target.
    FallbackApplied,
}

/// Why a corrective write was needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FallbackReason {
    /// The document rejected an edit or could not be read.
    Capability(String),
    /// The caller cancelled the replay.
    Cancelled,
    /// Animation finished but the content did not match the target.
    Mismatch,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capability(msg) => write!(f, "capability error ({msg})"),
            Self::Cancelled => f.write_str("cancellation"),
            Self::Mismatch => f.write_str("content mismatch"),
        }
    }
}

impl From<DocumentError> for FallbackReason {
    fn from(err: DocumentError) -> Self {
        Self::Capability(err.to_string())
    }
}

/// What a replay did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub outcome: ReplayOutcome,
    /// Set when `outcome` is `FallbackApplied`.
    pub fallback: Option<FallbackReason>,
    /// Every phase entered, in order, starting with `Idle`.
    pub phases: Vec<ReplayPhase>,
    /// Characters inserted by animated edits.
    pub inserted: usize,
    /// Characters deleted by animated edits.
    pub deleted: usize,
    /// Delete runs whose text could not be located and were not animated.
    pub skipped_deletions: usize,
    pub animated: bool,
}

impl ReplayReport {
    pub fn is_fallback(&self) -> bool {
        self.outcome == ReplayOutcome::FallbackApplied
    }

    pub fn final_phase(&self) -> ReplayPhase {
        self.phases.last().copied().unwrap_or(ReplayPhase::Idle)
    }
}

struct PhaseTrace(Vec<ReplayPhase>);

impl PhaseTrace {
    fn new() -> Self {
        Self(vec![ReplayPhase::Idle])
    }

    fn current(&self) -> ReplayPhase {
        self.0.last().copied().unwrap_or(ReplayPhase::Idle)
    }

    fn advance(&mut self, next: ReplayPhase) {
        debug_assert!(
            self.current().can_advance_to(next),
            "illegal replay transition {:?} -> {next:?}",
            self.current()
        );
        self.0.push(next);
    }
}

#[derive(Default)]
struct ReplayStats {
    inserted: usize,
    deleted: usize,
    skipped_deletions: usize,
}

// ---------------------------------------------------------------------------
// EditPlayer
// ---------------------------------------------------------------------------

/// Replays [`DiffSequence`]s against [`EditableDocument`]s.
///
/// The player holds no per-document state, so one instance can drive any
/// number of concurrent replays on different documents. Callers must not
/// run two replays on the same document at once.
#[derive(Clone, Debug, Default)]
pub struct EditPlayer<P = TokioPacer> {
    pacer: P,
}

impl EditPlayer<TokioPacer> {
    pub fn new() -> Self {
        Self { pacer: TokioPacer }
    }
}

impl<P: Pacer> EditPlayer<P> {
    pub fn with_pacer(pacer: P) -> Self {
        Self { pacer }
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Replay `diff` on `doc`, which is expected to hold the diff's source text.
    pub async fn replay(
        &self,
        diff: &DiffSequence,
        doc: &dyn EditableDocument,
        timing: AnimationTiming,
    ) -> ReplayResult<ReplayReport> {
        self.replay_with_cancel(diff, doc, timing, &CancelSignal::never())
            .await
    }

    /// Like [`Self::replay`], aborting the animation once `cancel` fires.
    ///
    /// An aborted replay still ends with the target text via a full write.
    pub async fn replay_with_cancel(
        &self,
        diff: &DiffSequence,
        doc: &dyn EditableDocument,
        timing: AnimationTiming,
        cancel: &CancelSignal,
    ) -> ReplayResult<ReplayReport> {
        let target = diff.target_text();
        let mut trace = PhaseTrace::new();
        let mut stats = ReplayStats::default();

        debug!(
            ops = diff.len(),
            inserts = diff.inserted_chars(),
            deletes = diff.deleted_chars(),
            animated = timing.enabled,
            "replay started"
        );

        if !timing.enabled {
            trace.advance(ReplayPhase::Verifying);
            doc.replace_all(&target)
                .await
                .map_err(ReplayError::DirectWrite)?;
            confirm(doc, &target).await?;
            trace.advance(ReplayPhase::Done);
            return Ok(finish(ReplayOutcome::Done, None, trace, stats, false));
        }

        let interrupted = self
            .animate(diff, doc, timing, cancel, &mut trace, &mut stats)
            .await
            .err();

        trace.advance(ReplayPhase::Verifying);
        let reason = match interrupted {
            Some(reason) => Some(reason),
            None => match doc.text().await {
                Ok(text) if text == target => None,
                Ok(_) => Some(FallbackReason::Mismatch),
                Err(err) => Some(err.into()),
            },
        };

        let Some(reason) = reason else {
            trace.advance(ReplayPhase::Done);
            return Ok(finish(ReplayOutcome::Done, None, trace, stats, true));
        };

        warn!(%reason, "animated replay fell short of target; writing full content");
        if let Err(source) = doc.replace_all(&target).await {
            return Err(ReplayError::FallbackWrite { reason, source });
        }
        confirm(doc, &target).await?;
        trace.advance(ReplayPhase::FallbackApplied);
        Ok(finish(
            ReplayOutcome::FallbackApplied,
            Some(reason),
            trace,
            stats,
            true,
        ))
    }

    async fn animate(
        &self,
        diff: &DiffSequence,
        doc: &dyn EditableDocument,
        timing: AnimationTiming,
        cancel: &CancelSignal,
        trace: &mut PhaseTrace,
        stats: &mut ReplayStats,
    ) -> Result<(), FallbackReason> {
        let mut cursor = 0usize;

        for op in diff {
            trace.advance(ReplayPhase::Animating);
            match op.kind {
                OpKind::Equal => {
                    cursor += op.char_len();
                    self.pause(timing.equal_pause(), cancel).await?;
                }
                OpKind::Insert => {
                    for unit in op.text.chars() {
                        ensure_live(cancel)?;
                        doc.insert_at(cursor, unit).await?;
                        cursor += 1;
                        stats.inserted += 1;
                        self.pause(timing.per_unit_delay, cancel).await?;
                    }
                }
                OpKind::Delete => {
                    let current = doc.text().await?;
                    let Some(anchor) = find_anchor(&current, &op.text, cursor) else {
                        warn!(
                            cursor,
                            len = op.char_len(),
                            "deletion anchor not found; skipping animated delete"
                        );
                        stats.skipped_deletions += 1;
                        continue;
                    };

                    // Right to left so earlier offsets stay valid.
                    for offset in (anchor..anchor + op.char_len()).rev() {
                        ensure_live(cancel)?;
                        doc.delete_range(offset, offset + 1).await?;
                        stats.deleted += 1;
                        self.pause(timing.per_unit_delay, cancel).await?;
                    }
                    cursor = anchor;
                }
            }
        }

        Ok(())
    }

    async fn pause(&self, delay: Duration, cancel: &CancelSignal) -> Result<(), FallbackReason> {
        ensure_live(cancel)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FallbackReason::Cancelled),
            _ = self.pacer.pause(delay) => Ok(()),
        }
    }
}

fn ensure_live(cancel: &CancelSignal) -> Result<(), FallbackReason> {
    if cancel.is_cancelled() {
        return Err(FallbackReason::Cancelled);
    }
    Ok(())
}

/// Read the document back after a full write.
async fn confirm(doc: &dyn EditableDocument, target: &str) -> ReplayResult<()> {
    let text = doc.text().await.map_err(ReplayError::Unreadable)?;
    if text != target {
        return Err(ReplayError::Unverified);
    }
    Ok(())
}

fn finish(
    outcome: ReplayOutcome,
    fallback: Option<FallbackReason>,
    trace: PhaseTrace,
    stats: ReplayStats,
    animated: bool,
) -> ReplayReport {
    debug!(
        ?outcome,
        inserted = stats.inserted,
        deleted = stats.deleted,
        skipped = stats.skipped_deletions,
        "replay finished"
    );
    ReplayReport {
        outcome,
        fallback,
        phases: trace.0,
        inserted: stats.inserted,
        deleted: stats.deleted,
        skipped_deletions: stats.skipped_deletions,
        animated,
    }
}

/// Char offset of the first occurrence of `needle` at or after char offset
/// `from` in `haystack`.
///
/// Best effort: with duplicate substrings this can pick the wrong one. The
/// final verification corrects any resulting drift.
fn find_anchor(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let start = haystack
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(haystack.len()))
        .nth(from)?;
    let found = haystack[start..].find(needle)?;
    Some(from + haystack[start..start + found].chars().count())
}
