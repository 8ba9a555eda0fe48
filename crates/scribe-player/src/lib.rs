//! Incremental edit player for scribe.
//!
//! Replays a [`scribe_diff::DiffSequence`] against a live document one
//! character at a time so the change appears to be typed. Whatever happens
//! during the animation, a successful replay always leaves the document
//! holding exactly the target text.
//!
//! # Key Types
//!
//! - [`EditableDocument`] -- capability the host editor provides
//! - [`EditPlayer`] -- drives a replay; generic over its [`Pacer`]
//! - [`AnimationSpeed`] / [`AnimationTiming`] -- per-character pacing
//! - [`ReplayReport`] / [`ReplayOutcome`] / [`ReplayPhase`] -- what happened
//! - [`CancelHandle`] / [`CancelSignal`] -- abort between unit steps
//!
//! # Design Rules
//!
//! 1. Units are `char`s; every offset is a char offset.
//! 2. Inserts go left to right, deletes right to left, one unit per call.
//! 3. Capability failures and cancellation are recovered by one full write.
//! 4. Every full write is read back; only a failed or unconfirmed full
//!    write is reported as an error.

pub mod cancel;
pub mod document;
pub mod error;
pub mod player;
pub mod timing;

pub use cancel::{CancelHandle, CancelSignal};
pub use document::{EditableDocument, InMemoryDocument};
pub use error::{DocumentError, DocumentResult, ReplayError, ReplayResult};
pub use player::{EditPlayer, FallbackReason, ReplayOutcome, ReplayPhase, ReplayReport};
pub use timing::{AnimationSpeed, AnimationTiming, Pacer, ParseSpeedError, TokioPacer};
