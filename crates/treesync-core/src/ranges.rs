//! Sets of disjoint byte ranges.
//!
//! [`RangeSet`] is the invalidation set handed from the parse pipeline to the highlighter, and
//! the highlighter's own record of ranges still waiting to be restyled.

use std::ops::Range;

use crate::edit::Edit;

/// Sorted, disjoint, non-empty byte ranges.
///
/// Overlapping or adjacent ranges are merged on insertion, so no offset is ever covered twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<Range<usize>>,
}

impl RangeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding a single range (empty if `range` is empty).
    pub fn single(range: Range<usize>) -> Self {
        let mut set = Self::new();
        set.insert(range);
        set
    }

    /// Number of disjoint ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the set covers nothing.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Range<usize>> + '_ {
        self.ranges.iter()
    }

    /// The ranges as a slice.
    pub fn as_slice(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Whether `offset` is covered.
    pub fn contains(&self, offset: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= offset);
        self.ranges.get(idx).is_some_and(|r| r.start <= offset)
    }

    /// Whether any range intersects `range`.
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= range.start);
        self.ranges.get(idx).is_some_and(|r| r.start < range.end)
    }

    /// Insert a range, merging with overlapping or adjacent neighbours. Empty ranges are ignored.
    pub fn insert(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }

        // First range that could touch `range` (its end reaches `range.start`).
        let lo = self.ranges.partition_point(|r| r.end < range.start);
        // One past the last range that touches `range` (its start is within reach).
        let hi = self.ranges.partition_point(|r| r.start <= range.end);

        if lo >= hi {
            self.ranges.insert(lo, range);
            return;
        }

        let start = range.start.min(self.ranges[lo].start);
        let end = range.end.max(self.ranges[hi - 1].end);
        self.ranges.splice(lo..hi, std::iter::once(start..end));
    }

    /// Insert every range of `other`.
    pub fn union(&mut self, other: &RangeSet) {
        for range in other.iter() {
            self.insert(range.clone());
        }
    }

    /// Remove `range` from the set, splitting ranges that straddle it.
    pub fn remove(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }

        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        for r in self.ranges.drain(..) {
            if r.end <= range.start || r.start >= range.end {
                out.push(r);
                continue;
            }
            if r.start < range.start {
                out.push(r.start..range.start);
            }
            if r.end > range.end {
                out.push(range.end..r.end);
            }
        }
        self.ranges = out;
    }

    /// Move ranges into post-edit coordinates for a replacement of `edited` by `new_len` bytes.
    ///
    /// Ranges after the edit shift by the length delta. Only the surviving parts of ranges that
    /// overlap the replaced bytes are kept; the replacement itself is not covered.
    pub fn shift_for_edit(&mut self, edited: Range<usize>, new_len: usize) {
        let old_len = edited.end - edited.start;
        let shift = |offset: usize| offset - old_len + new_len;

        let shifted: Vec<_> = self
            .ranges
            .drain(..)
            .map(|r| {
                let start = if r.start < edited.start {
                    r.start
                } else if r.start >= edited.end {
                    shift(r.start)
                } else {
                    edited.start + new_len
                };
                let end = if r.end <= edited.start {
                    r.end
                } else if r.end >= edited.end {
                    shift(r.end)
                } else {
                    edited.start
                };
                start..end
            })
            .collect();
        for range in shifted {
            self.insert(range);
        }
    }

    /// Carry ranges through `edits`, applied in order. See [`RangeSet::shift_for_edit`].
    pub fn shift_for_edits(&mut self, edits: &[Edit]) {
        for edit in edits {
            self.shift_for_edit(edit.old_range(), edit.new_len());
        }
    }

    /// Drop everything at or beyond `len`.
    pub fn clip(&mut self, len: usize) {
        self.ranges.retain_mut(|r| {
            r.end = r.end.min(len);
            r.start < r.end
        });
    }

    /// Remove all ranges.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

impl FromIterator<Range<usize>> for RangeSet {
    fn from_iter<I: IntoIterator<Item = Range<usize>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Range<usize>> for RangeSet {
    fn extend<I: IntoIterator<Item = Range<usize>>>(&mut self, iter: I) {
        for range in iter {
            self.insert(range);
        }
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a Range<usize>;
    type IntoIter = std::slice::Iter<'a, Range<usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
