//! Invalidation: which ranges of derived data a reparse made untrustworthy.

use std::ops::Range;

use tree_sitter::Node;
use treesync_core::{Edit, RangeSet};

use crate::parser::edited_tree;
use crate::tree::SyntaxTree;

/// Compute the ranges (post-edit coordinates) whose structure changed between `old` and `new`.
///
/// `edits` are the edits folded into `new` since `old` was parsed, in order. The result covers:
///
/// - the inserted text of every edit, carried forward through later edits;
/// - every range tree-sitter reports as structurally changed;
/// - the span of each ancestor around an edit whose kind, span or child list differs from the
///   corresponding node of the shifted old tree, up to the first unchanged ancestor.
///
/// With no `old` tree the whole buffer is invalid. No-op edits contribute nothing.
pub fn invalidated_ranges(old: Option<&SyntaxTree>, new: &SyntaxTree, edits: &[Edit]) -> RangeSet {
    let Some(old) = old else {
        return RangeSet::single(0..new.len());
    };

    let edits: Vec<Edit> = edits.iter().filter(|e| !e.is_noop()).cloned().collect();
    let mut ranges = RangeSet::new();

    let mut touched = Vec::with_capacity(edits.len());
    for (idx, edit) in edits.iter().enumerate() {
        let mut range = edit.inserted_range();
        for later in &edits[idx + 1..] {
            range = later.map_offset(range.start)..later.map_offset(range.end);
        }
        ranges.insert(range.clone());
        touched.push(range);
    }

    let shifted_old = edited_tree(old.raw(), &edits);
    for changed in shifted_old.changed_ranges(new.raw()) {
        ranges.insert(changed.start_byte..changed.end_byte);
    }

    let old_root = shifted_old.root_node();
    for range in touched {
        let mut candidate = new
            .raw()
            .root_node()
            .descendant_for_byte_range(range.start, range.end);
        while let Some(node) = candidate {
            if is_unchanged(node, old_root) {
                break;
            }
            ranges.insert(node.byte_range());
            candidate = node.parent();
        }
    }

    ranges.clip(new.len());
    ranges
}

fn child_shape(node: Node<'_>) -> Vec<(u16, Range<usize>)> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .map(|child| (child.kind_id(), child.byte_range()))
        .collect()
}

/// Whether `node` (new tree) has a counterpart in the shifted old tree with the same kind,
/// span and child list.
fn is_unchanged(node: Node<'_>, old_root: Node<'_>) -> bool {
    let range = node.byte_range();
    let mut candidate = old_root.descendant_for_byte_range(range.start, range.end);
    while let Some(old) = candidate {
        if old.byte_range() != range {
            return false;
        }
        if old.kind_id() == node.kind_id() {
            return child_shape(old) == child_shape(node);
        }
        candidate = old.parent();
    }
    false
}
