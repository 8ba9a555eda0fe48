//! Edit plans, workspace persistence and editing sessions for scribe.
//!
//! An upstream planner produces an [`EditPlan`] (or a [`ProjectStructure`]
//! for a brand-new project). The [`PlanExecutor`] validates it, then applies
//! each [`FileOperation`] in order: content changes are diffed and replayed
//! through the edit player into a live document, and the result is
//! persisted through a [`FileStore`].
//!
//! # Key Types
//!
//! - [`EditPlan`] / [`FileOperation`] / [`ProjectStructure`] -- what to change
//! - [`FileStore`] -- [`InMemoryFileStore`] and [`LocalFileStore`]
//! - [`DocumentHost`] -- where animated edits are played ([`BufferHost`] by default)
//! - [`PlanExecutor`] / [`PlanReport`] / [`OperationReport`] -- applying plans
//! - [`ExecutorConfig`] / [`AnimationSettings`] -- TOML-loadable settings
//! - [`SessionRegistry`] / [`EditSession`] / [`PanelId`] -- per-panel state
//! - [`DocumentLocks`] / [`DocumentLease`] -- one replay per document at a time

pub mod config;
pub mod error;
pub mod executor;
pub mod plan;
pub mod session;
pub mod store;

pub use config::{AnimationSettings, ExecutorConfig};
pub use error::{FileStoreError, FileStoreResult, PlanError, PlanResult};
pub use executor::{
    BufferHost, DocumentHost, OperationReport, OperationStatus, PlanExecutor, PlanReport,
};
pub use plan::{EditPlan, FileOperation, OperationKind, ProjectFile, ProjectStructure};
pub use session::{DocumentLease, DocumentLocks, EditSession, PanelId, SessionRegistry};
pub use store::{normalize_path, FileStore, InMemoryFileStore, LocalFileStore};
