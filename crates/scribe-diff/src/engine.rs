//! Character-level diff computation.
//!
//! The engine strips the longest common prefix and suffix and treats
//! whatever remains as one coarse change: delete all of the old middle,
//! insert all of the new middle. This is not a minimal (LCS) edit script.
//! Callers that need minimal diffs must not rely on this engine for it;
//! the coarse form is what the edit player replays.

use crate::op::{DiffOp, DiffSequence};

/// Compute the diff between `old` and `new`.
///
/// Total over all string pairs. The result satisfies:
/// - `Equal` + `Delete` text, in order, reconstructs `old`;
/// - `Equal` + `Insert` text, in order, reconstructs `new`;
/// - two empty inputs yield an empty sequence.
pub fn compute_diff(old: &str, new: &str) -> DiffSequence {
    if old == new {
        if old.is_empty() {
            return DiffSequence::new();
        }
        return DiffSequence::from_ops(vec![DiffOp::equal(old)]);
    }

    let prefix = common_prefix_len(old, new);
    let (old_rest, new_rest) = (&old[prefix..], &new[prefix..]);

    // Computed on the remainders so it can never overlap the prefix.
    let suffix = common_suffix_len(old_rest, new_rest);
    let old_mid = &old_rest[..old_rest.len() - suffix];
    let new_mid = &new_rest[..new_rest.len() - suffix];

    let mut ops = Vec::with_capacity(4);
    ops.push(DiffOp::equal(&old[..prefix]));
    if !old_mid.is_empty() {
        ops.push(DiffOp::delete(old_mid));
    }
    if !new_mid.is_empty() {
        ops.push(DiffOp::insert(new_mid));
    }
    ops.push(DiffOp::equal(&old_rest[old_rest.len() - suffix..]));

    DiffSequence::from_ops(ops)
}

/// Normalize a list of ops: drop empty ops, then merge adjacent ops of the
/// same kind with a stable left-to-right fold.
///
/// Idempotent: `cleanup(cleanup(x)) == cleanup(x)`.
pub fn cleanup(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut merged: Vec<DiffOp> = Vec::with_capacity(ops.len());
    for op in ops {
        if op.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.kind == op.kind => last.text.push_str(&op.text),
            _ => merged.push(op),
        }
    }
    merged
}

/// Returns `true` if no op is empty and no two neighbours share a kind.
pub fn is_normalized(ops: &[DiffOp]) -> bool {
    ops.iter().all(|op| !op.text.is_empty())
        && ops.windows(2).all(|w| w[0].kind != w[1].kind)
}

/// Byte length of the longest common prefix, always on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte length of the longest common suffix, always on a char boundary.
fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpKind;
    use proptest::prelude::*;

    fn kinds(seq: &DiffSequence) -> Vec<OpKind> {
        seq.iter().map(|op| op.kind).collect()
    }

    #[test]
    fn identical_non_empty_is_single_equal() {
        let diff = compute_diff("abc", "abc");
        assert_eq!(diff.ops(), &[DiffOp::equal("abc")]);
        assert!(diff.is_identity());
    }

    #[test]
    fn both_empty_is_empty() {
        assert!(compute_diff("", "").is_empty());
    }

    #[test]
    fn pure_insert_from_empty() {
        assert_eq!(compute_diff("", "new").ops(), &[DiffOp::insert("new")]);
    }

    #[test]
    fn pure_delete_to_empty() {
        assert_eq!(compute_diff("old", "").ops(), &[DiffOp::delete("old")]);
    }

    #[test]
    fn hello_world_to_hello_there() {
        let diff = compute_diff("hello world", "hello there");
        assert_eq!(
            diff.ops(),
            &[
                DiffOp::equal("hello "),
                DiffOp::delete("world"),
                DiffOp::insert("there"),
            ]
        );
    }

    #[test]
    fn insertion_in_the_middle() {
        let diff = compute_diff("fn main() {}", "fn main() { run(); }");
        assert_eq!(
            kinds(&diff),
            vec![OpKind::Equal, OpKind::Insert, OpKind::Equal]
        );
        assert_eq!(diff.target_text(), "fn main() { run(); }");
    }

    #[test]
    fn deletion_in_the_middle() {
        let diff = compute_diff("a, b, c", "a, c");
        assert_eq!(
            diff.ops(),
            &[DiffOp::equal("a, "), DiffOp::delete("b, "), DiffOp::equal("c")]
        );
    }

    #[test]
    fn suffix_does_not_overlap_prefix() {
        // "aa" -> "aaa": prefix consumes "aa", the suffix search sees "" vs "a".
        let diff = compute_diff("aa", "aaa");
        assert_eq!(diff.ops(), &[DiffOp::equal("aa"), DiffOp::insert("a")]);
        assert_eq!(diff.source_text(), "aa");
    }

    #[test]
    fn multibyte_boundaries_respected() {
        let diff = compute_diff("naïve café", "naïve cafè");
        assert_eq!(diff.source_text(), "naïve café");
        assert_eq!(diff.target_text(), "naïve cafè");
        assert_eq!(diff.deleted_chars(), 1);
        assert_eq!(diff.inserted_chars(), 1);
    }

    #[test]
    fn cleanup_drops_empty_and_merges() {
        let ops = vec![
            DiffOp::delete(""),
            DiffOp::delete("a"),
            DiffOp::delete("b"),
            DiffOp::equal("c"),
            DiffOp::insert(""),
            DiffOp::equal("d"),
        ];
        let cleaned = cleanup(ops);
        assert_eq!(cleaned, vec![DiffOp::delete("ab"), DiffOp::equal("cd")]);
        assert!(is_normalized(&cleaned));
    }

    fn arb_ops() -> impl Strategy<Value = Vec<DiffOp>> {
        let kind = prop_oneof![
            Just(OpKind::Delete),
            Just(OpKind::Equal),
            Just(OpKind::Insert)
        ];
        prop::collection::vec((kind, "[ab]{0,3}"), 0..12).prop_map(|v| {
            v.into_iter()
                .map(|(kind, text)| DiffOp::new(kind, text))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn round_trip_reconstructs_both_sides(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let diff = compute_diff(&a, &b);
            prop_assert_eq!(diff.source_text(), a);
            prop_assert_eq!(diff.target_text(), b);
            prop_assert!(is_normalized(diff.ops()));
        }

        #[test]
        fn cleanup_is_idempotent(ops in arb_ops()) {
            let once = cleanup(ops);
            let twice = cleanup(once.clone());
            prop_assert!(is_normalized(&once));
            prop_assert_eq!(once, twice);
        }
    }
}
