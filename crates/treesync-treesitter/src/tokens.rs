//! Token projection: tree + highlight query → sorted, non-overlapping tokens.

use std::collections::VecDeque;
use std::ops::Range;

use streaming_iterator::StreamingIterator;
use tree_sitter::QueryCursor;
use treesync_core::{Token, TokenKind};

use crate::config::HighlightQuery;
use crate::tree::SyntaxTree;

#[derive(Debug, Clone)]
struct Capture {
    range: Range<usize>,
    kind: TokenKind,
    pattern: usize,
}

/// Project `tree` through `query`, optionally limited to `limit`.
///
/// Tokens are sorted by start offset and never overlap. When captures nest, the innermost one
/// wins for the bytes it covers and the enclosing capture keeps the rest. When two captures
/// cover exactly the same bytes, the one from the earlier query pattern wins. Tokens crossing
/// `limit` are clipped to it.
///
/// Captures are collected up front: the returned iterator holds no borrow of the tree and can
/// be consumed after the caller has released it. Calling again restarts from scratch.
pub fn tokens(tree: &SyntaxTree, query: &HighlightQuery, limit: Option<Range<usize>>) -> Tokens {
    let limit = match limit {
        Some(limit) => limit.start.min(tree.len())..limit.end.min(tree.len()),
        None => 0..tree.len(),
    };

    let mut captures = Vec::new();
    if limit.start < limit.end {
        let mut cursor = QueryCursor::new();
        cursor.set_byte_range(limit.clone());
        let mut matches = cursor.matches(query.query(), tree.raw().root_node(), tree.text().as_bytes());
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let Some(kind) = query.kind_for_capture(capture.index) else {
                    continue;
                };
                let range = capture.node.byte_range();
                if range.end <= range.start {
                    continue;
                }
                captures.push(Capture {
                    range,
                    kind,
                    pattern: m.pattern_index,
                });
            }
        }
    }

    // Outer captures first, so nesting can be resolved with a stack.
    captures.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
            .then(a.pattern.cmp(&b.pattern))
    });

    Tokens {
        captures: captures.into_iter(),
        stack: Vec::new(),
        pos: 0,
        limit,
        ready: VecDeque::new(),
        done: false,
    }
}

/// Lazy token sequence produced by [`tokens`].
#[derive(Debug)]
pub struct Tokens {
    captures: std::vec::IntoIter<Capture>,
    stack: Vec<Capture>,
    pos: usize,
    limit: Range<usize>,
    ready: VecDeque<Token>,
    done: bool,
}

impl Tokens {
    /// Emit `[pos, end)` for `kind` (clipped to the limit) and advance.
    fn emit_until(&mut self, end: usize, kind: TokenKind) {
        if self.pos >= end {
            return;
        }
        let start = self.pos.max(self.limit.start);
        let clipped = end.min(self.limit.end);
        if start < clipped {
            self.ready.push_back(Token::new(start..clipped, kind));
        }
        self.pos = end;
    }

    fn step(&mut self, capture: Capture) {
        while let Some(top) = self.stack.last() {
            if top.range.end > capture.range.start {
                break;
            }
            let (end, kind) = (top.range.end, top.kind);
            self.stack.pop();
            self.emit_until(end, kind);
        }

        if let Some(top) = self.stack.last() {
            if top.range == capture.range {
                return;
            }
            let kind = top.kind;
            self.emit_until(capture.range.start, kind);
        }

        self.pos = self.pos.max(capture.range.start);
        self.stack.push(capture);
    }

    fn finish(&mut self) {
        while let Some(top) = self.stack.pop() {
            self.emit_until(top.range.end, top.kind);
        }
        self.done = true;
    }
}

impl Iterator for Tokens {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.ready.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            match self.captures.next() {
                Some(capture) => self.step(capture),
                None => self.finish(),
            }
        }
    }
}
