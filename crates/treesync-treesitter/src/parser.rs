//! Incremental parser adapter.

use tree_sitter::{InputEdit, Language, Parser, Point, Tree};
use treesync_core::{Edit, SyncError, TextPoint};

/// How the last [`IncrementalParser::parse`] call produced its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// No previous tree; parsed from scratch.
    Full,
    /// Reused a previous tree after shifting it by the queued edits.
    Incremental,
}

fn point(p: TextPoint) -> Point {
    Point {
        row: p.row,
        column: p.column,
    }
}

/// Convert an [`Edit`] into a tree-sitter [`InputEdit`].
pub fn input_edit(edit: &Edit) -> InputEdit {
    InputEdit {
        start_byte: edit.start,
        old_end_byte: edit.old_end,
        new_end_byte: edit.new_end,
        start_position: point(edit.start_point),
        old_end_position: point(edit.old_end_point),
        new_end_position: point(edit.new_end_point),
    }
}

/// Clone `tree` and shift the clone through `edits`, in order. `tree` itself is untouched.
pub fn edited_tree(tree: &Tree, edits: &[Edit]) -> Tree {
    let mut tree = tree.clone();
    for edit in edits {
        tree.edit(&input_edit(edit));
    }
    tree
}

/// A tree-sitter parser bound to one language.
///
/// `parse` is a function of (previous tree, edits, content): the previous tree is never
/// mutated, and unchanged subtrees are reused when it is supplied.
pub struct IncrementalParser {
    parser: Parser,
    last_mode: Option<ParseMode>,
}

impl IncrementalParser {
    /// Create a parser for `language`.
    pub fn new(language: &Language) -> Result<Self, SyncError> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| SyncError::ParseFailure(e.to_string()))?;
        Ok(Self {
            parser,
            last_mode: None,
        })
    }

    /// The mode of the last successful parse.
    pub fn last_mode(&self) -> Option<ParseMode> {
        self.last_mode
    }

    /// Parse `content`, reusing `previous` after applying `edits` to a copy of it.
    pub fn parse(
        &mut self,
        previous: Option<&Tree>,
        edits: &[Edit],
        content: &str,
    ) -> Result<Tree, SyncError> {
        let old = previous.map(|tree| edited_tree(tree, edits));
        let tree = self
            .parser
            .parse(content, old.as_ref())
            .ok_or_else(|| SyncError::ParseFailure("parser produced no tree".to_string()))?;

        self.last_mode = Some(if old.is_some() {
            ParseMode::Incremental
        } else {
            ParseMode::Full
        });
        Ok(tree)
    }
}
