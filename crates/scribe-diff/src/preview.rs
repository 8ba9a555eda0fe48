//! Line-level view of a change, for reporting only.
//!
//! Replay is driven by the character-level [`compute_diff`](crate::compute_diff).
//! The line view here answers "how many lines does this edit touch" for plan
//! reports, and renders unified hunks for the `diff` command.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::op::OpKind;

/// Lines of context kept around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Added and removed line counts for one change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    pub additions: usize,
    pub deletions: usize,
}

impl LineStats {
    pub fn between(old: &str, new: &str) -> Self {
        if old == new {
            return Self::default();
        }
        TextDiff::from_lines(old, new)
            .iter_all_changes()
            .fold(Self::default(), |mut stats, change| {
                match change.tag() {
                    ChangeTag::Insert => stats.additions += 1,
                    ChangeTag::Delete => stats.deletions += 1,
                    ChangeTag::Equal => {}
                }
                stats
            })
    }

    pub fn is_empty(&self) -> bool {
        self.additions == 0 && self.deletions == 0
    }
}

/// One line of a rendered hunk. Reuses [`OpKind`] so that line and
/// character views speak the same vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub kind: OpKind,
    /// Line text without its terminator.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreviewHunk {
    /// Unified header, e.g. `@@ -2,7 +2,7 @@`.
    pub header: String,
    pub lines: Vec<PreviewLine>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangePreview {
    pub stats: LineStats,
    pub hunks: Vec<PreviewHunk>,
}

impl ChangePreview {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

fn op_kind(tag: ChangeTag) -> OpKind {
    match tag {
        ChangeTag::Equal => OpKind::Equal,
        ChangeTag::Delete => OpKind::Delete,
        ChangeTag::Insert => OpKind::Insert,
    }
}

/// Unified hunks between `old` and `new` with [`CONTEXT_LINES`] of context.
pub fn preview_text(old: &str, new: &str) -> ChangePreview {
    if old == new {
        return ChangePreview::default();
    }

    let text_diff = TextDiff::from_lines(old, new);
    let mut unified = text_diff.unified_diff();
    unified.context_radius(CONTEXT_LINES);

    let hunks = unified
        .iter_hunks()
        .map(|hunk| PreviewHunk {
            header: hunk.header().to_string(),
            lines: hunk
                .iter_changes()
                .map(|change| PreviewLine {
                    kind: op_kind(change.tag()),
                    text: change.value().trim_end_matches(['\r', '\n']).to_string(),
                })
                .collect(),
        })
        .collect();

    ChangePreview {
        stats: LineStats::between(old, new),
        hunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_no_stats_or_hunks() {
        assert!(LineStats::between("a\nb\n", "a\nb\n").is_empty());
        assert!(preview_text("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn changed_line_counts_once_each_way() {
        let stats = LineStats::between("hello world\n", "hello there\n");
        assert_eq!(stats, LineStats { additions: 1, deletions: 1 });
    }

    #[test]
    fn new_and_removed_files() {
        assert_eq!(
            LineStats::between("", "one\ntwo\nthree\n"),
            LineStats { additions: 3, deletions: 0 }
        );
        assert_eq!(
            LineStats::between("one\ntwo\n", ""),
            LineStats { additions: 0, deletions: 2 }
        );
    }

    #[test]
    fn hunk_carries_context_and_header() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
        let new = "a\nb\nc\nd\nX\nf\ng\nh\ni\nj\n";
        let preview = preview_text(old, new);

        assert_eq!(preview.hunks.len(), 1);
        let hunk = &preview.hunks[0];
        assert_eq!(hunk.header, "@@ -2,7 +2,7 @@");
        assert_eq!(hunk.lines.len(), 8);
        assert_eq!(
            hunk.lines[3],
            PreviewLine {
                kind: OpKind::Delete,
                text: "e".into()
            }
        );
        assert_eq!(hunk.lines[4].kind, OpKind::Insert);
        assert_eq!(hunk.lines[0].kind, OpKind::Equal);
    }

    #[test]
    fn distant_changes_get_separate_hunks() {
        let old: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 2\n", "LINE 2\n").replace("line 27\n", "LINE 27\n");
        let preview = preview_text(&old, &new);
        assert_eq!(preview.hunks.len(), 2);
        assert_eq!(preview.stats, LineStats { additions: 2, deletions: 2 });
    }
}
