//! Edit plans and project scaffolds.
//!
//! These are the values an upstream planner (typically a language model)
//! hands to scribe. Extracting them from free-form model output is the
//! planner's job; this module only parses well-formed JSON.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FileStoreError, PlanError, PlanResult};
use crate::store::normalize_path;

/// What a [`FileOperation`] does, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    SearchReplace,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::SearchReplace => "search_replace",
        })
    }
}

/// A single file mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileOperation {
    /// Create a file. Behaves as an update if the file already exists.
    Create {
        path: String,
        #[serde(default)]
        content: String,
    },
    /// Replace a file's content. Behaves as a create if it is missing.
    Update { path: String, content: String },
    Delete { path: String },
    /// Replace the first occurrence of `search` with `replace`.
    SearchReplace {
        path: String,
        search: String,
        replace: String,
    },
}

impl FileOperation {
    pub fn path(&self) -> &str {
        match self {
            Self::Create { path, .. }
            | Self::Update { path, .. }
            | Self::Delete { path }
            | Self::SearchReplace { path, .. } => path,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
            Self::SearchReplace { .. } => OperationKind::SearchReplace,
        }
    }

    /// Check the operation before anything touches the workspace.
    pub fn validate(&self) -> PlanResult<()> {
        normalize_path(self.path()).map_err(|e| match e {
            FileStoreError::InvalidPath { path, reason } => PlanError::InvalidPath { path, reason },
            other => PlanError::Store(other),
        })?;

        if let Self::SearchReplace { path, search, .. } = self {
            if search.is_empty() {
                return Err(PlanError::InvalidOperation {
                    kind: self.kind().to_string(),
                    path: path.clone(),
                    reason: "search text is empty".into(),
                });
            }
        }
        Ok(())
    }
}

/// An ordered list of file operations with an optional explanation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub operations: Vec<FileOperation>,
}

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Append an operation (builder style).
    pub fn with(mut self, operation: FileOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Validate every operation; the first problem wins.
    pub fn validate(&self) -> PlanResult<()> {
        self.operations.iter().try_for_each(FileOperation::validate)
    }

    /// Distinct normalized paths the plan touches, sorted.
    ///
    /// Invalid paths are left out; [`Self::validate`] reports them.
    pub fn touched_paths(&self) -> BTreeSet<String> {
        self.operations
            .iter()
            .filter_map(|op| normalize_path(op.path()).ok())
            .collect()
    }
}

/// A new project described as a set of files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStructure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

impl ProjectStructure {
    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// One `Create` per file, in order. Directories follow from the paths.
    pub fn into_plan(self) -> EditPlan {
        let explanation = self
            .description
            .unwrap_or_else(|| format!("Scaffold project {}", self.name));
        EditPlan {
            explanation: Some(explanation),
            operations: self
                .files
                .into_iter()
                .map(|file| FileOperation::Create {
                    path: file.path,
                    content: file.content,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_operations() {
        let json = r#"{
            "explanation": "rename greeting",
            "operations": [
                {"type": "create", "path": "src/new.rs", "content": "fn f() {}\n"},
                {"type": "update", "path": "src/lib.rs", "content": "pub mod new;\n"},
                {"type": "delete", "path": "old.txt"},
                {"type": "search_replace", "path": "src/main.rs", "search": "hello", "replace": "hi"}
            ]
        }"#;
        let plan = EditPlan::from_json(json).unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.explanation.as_deref(), Some("rename greeting"));
        let kinds: Vec<_> = plan.operations.iter().map(FileOperation::kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::Create,
                OperationKind::Update,
                OperationKind::Delete,
                OperationKind::SearchReplace,
            ]
        );
        plan.validate().unwrap();
    }

    #[test]
    fn create_content_defaults_to_empty() {
        let plan = EditPlan::from_json(r#"{"operations":[{"type":"create","path":"empty.txt"}]}"#)
            .unwrap();
        assert_eq!(
            plan.operations[0],
            FileOperation::Create {
                path: "empty.txt".into(),
                content: String::new(),
            }
        );
    }

    #[test]
    fn unknown_operation_is_a_parse_error() {
        let err = EditPlan::from_json(r#"{"operations":[{"type":"rename","path":"a"}]}"#)
            .unwrap_err();
        assert!(matches!(err, PlanError::Parse(_)));
    }

    #[test]
    fn validation_rejects_escaping_paths() {
        let plan = EditPlan::new().with(FileOperation::Delete {
            path: "../etc/hosts".into(),
        });
        assert!(matches!(plan.validate(), Err(PlanError::InvalidPath { .. })));
    }

    #[test]
    fn validation_rejects_empty_search() {
        let plan = EditPlan::new().with(FileOperation::SearchReplace {
            path: "a.txt".into(),
            search: String::new(),
            replace: "x".into(),
        });
        assert!(matches!(
            plan.validate(),
            Err(PlanError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn touched_paths_are_normalized_and_distinct() {
        let plan = EditPlan::new()
            .with(FileOperation::Update {
                path: "./src/lib.rs".into(),
                content: "a".into(),
            })
            .with(FileOperation::SearchReplace {
                path: "src/lib.rs".into(),
                search: "a".into(),
                replace: "b".into(),
            })
            .with(FileOperation::Delete {
                path: "README.md".into(),
            });
        let paths: Vec<_> = plan.touched_paths().into_iter().collect();
        assert_eq!(paths, vec!["README.md".to_string(), "src/lib.rs".to_string()]);
    }

    #[test]
    fn project_structure_becomes_create_plan() {
        let json = r#"{
            "name": "hello",
            "files": [
                {"path": "Cargo.toml", "content": "[package]\nname = \"hello\"\n"},
                {"path": "src/main.rs", "content": "fn main() {}\n"}
            ]
        }"#;
        let plan = ProjectStructure::from_json(json).unwrap().into_plan();
        assert_eq!(plan.explanation.as_deref(), Some("Scaffold project hello"));
        assert_eq!(plan.len(), 2);
        assert!(plan
            .operations
            .iter()
            .all(|op| op.kind() == OperationKind::Create));
    }

    #[test]
    fn plan_json_round_trips() {
        let plan = EditPlan::new()
            .with_explanation("tidy")
            .with(FileOperation::Delete { path: "x".into() });
        let back = EditPlan::from_json(&plan.to_json().unwrap()).unwrap();
        assert_eq!(back, plan);
    }
}
