//! Range-based highlight state that is recomputed only where it was invalidated.
//!
//! The [`Highlighter`] never talks to a parser directly. It asks a [`TokenProvider`] for the
//! tokens of specific ranges and records the resulting style intervals. Work per update is
//! proportional to the invalidated ranges, not to the document.

use std::future::Future;
use std::ops::Range;

use crate::intervals::{Interval, IntervalTree};
use crate::ranges::RangeSet;
use crate::token::{StyleMap, Token};

/// Granularity the presentation layer restyles in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestyleUnit {
    /// Restyle exactly the invalidated bytes.
    #[default]
    Exact,
    /// Extend invalidated ranges to whole lines.
    Line,
}

/// Tokens for a range, together with the range they actually cover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBatch {
    /// Covered range: the requested range clipped to the content, possibly extended to whole
    /// restyle units. Empty when the request lies past the end of the content.
    pub range: Range<usize>,
    /// Tokens inside `range`, sorted and non-overlapping.
    pub tokens: Vec<Token>,
}

/// Source of tokens for the highlighter.
pub trait TokenProvider {
    /// The error type returned by [`TokenProvider::tokens`].
    type Error;

    /// Produce the tokens covering `range` in the latest content.
    fn tokens(
        &self,
        range: Range<usize>,
        unit: RestyleUnit,
    ) -> impl Future<Output = Result<TokenBatch, Self::Error>>;
}

/// Configuration for [`Highlighter`].
#[derive(Debug, Clone, Default)]
pub struct HighlighterConfig {
    /// Token kind → style id mapping. Kinds without a style are left unstyled.
    pub styles: StyleMap,
    /// Restyle granularity.
    pub unit: RestyleUnit,
}

impl HighlighterConfig {
    /// Create a config with the given style map.
    pub fn new(styles: StyleMap) -> Self {
        Self {
            styles,
            unit: RestyleUnit::Exact,
        }
    }

    /// Restyle whole lines instead of exact ranges.
    pub fn with_line_restyle(mut self) -> Self {
        self.unit = RestyleUnit::Line;
        self
    }
}

/// Maintains the buffer-range → style mapping.
pub struct Highlighter<P> {
    provider: P,
    config: HighlighterConfig,
    state: IntervalTree,
    pending: RangeSet,
}

impl<P: TokenProvider> Highlighter<P> {
    /// Create a highlighter for a document of `len` bytes. The whole document starts pending.
    pub fn new(provider: P, config: HighlighterConfig, len: usize) -> Self {
        Self {
            provider,
            config,
            state: IntervalTree::new(),
            pending: RangeSet::single(0..len),
        }
    }

    /// The token provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ranges invalidated but not yet restyled.
    pub fn pending(&self) -> &RangeSet {
        &self.pending
    }

    /// The current highlight state.
    pub fn state(&self) -> &IntervalTree {
        &self.state
    }

    /// Mark `ranges` (post-edit coordinates) as needing restyling.
    pub fn invalidate(&mut self, ranges: &RangeSet) {
        if ranges.is_empty() {
            return;
        }
        tracing::trace!(ranges = ranges.len(), "highlighter invalidated");
        self.pending.union(ranges);
    }

    /// Shift state for an edit of `range` (pre-edit coordinates) whose length changed by `delta`.
    ///
    /// Styles after the edit move with the text; the replacement itself becomes pending.
    pub fn did_change_content(&mut self, range: Range<usize>, delta: isize) {
        let new_len = (range.len() as isize + delta).max(0) as usize;
        self.state.update_for_edit(range.start, range.end, new_len);
        self.pending.shift_for_edit(range.clone(), new_len);
        self.pending.insert(range.start..range.start + new_len);
    }

    /// Drop all state after the document was replaced wholesale with `len` bytes.
    pub fn did_replace_content(&mut self, len: usize) {
        self.state.clear();
        self.pending.clear();
        self.pending.insert(0..len);
    }

    /// Restyle every pending range. Returns the ranges that were restyled.
    ///
    /// On error the ranges not yet restyled stay pending for the next call.
    pub async fn update(&mut self) -> Result<RangeSet, P::Error> {
        let mut restyled = RangeSet::new();
        let requests: Vec<_> = self.pending.iter().cloned().collect();

        for range in requests {
            // An earlier batch extended to whole units may already have covered this range.
            if !self.pending.intersects(&range) {
                continue;
            }

            let batch = self.provider.tokens(range.clone(), self.config.unit).await?;
            self.apply_batch(&batch);
            // The provider may clip the request to the document, so the request itself is done
            // even when the batch covers less of it.
            self.pending.remove(range);
            self.pending.remove(batch.range.clone());
            restyled.insert(batch.range);
        }

        tracing::debug!(ranges = restyled.len(), "highlighter updated");
        Ok(restyled)
    }

    fn apply_batch(&mut self, batch: &TokenBatch) {
        let covered = &batch.range;
        self.state.remove_range(covered.start, covered.end);
        for token in &batch.tokens {
            let Some(style_id) = self.config.styles.get(token.kind) else {
                continue;
            };
            let start = token.range.start.max(covered.start);
            let end = token.range.end.min(covered.end);
            self.state.insert(Interval::new(start, end, style_id));
        }
    }

    /// Styles overlapping `range`.
    pub fn attributes(&self, range: Range<usize>) -> Vec<Interval> {
        self.state
            .query_range(range.start, range.end)
            .into_iter()
            .cloned()
            .collect()
    }
}
