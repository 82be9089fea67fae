//! Style intervals: the range-to-attribute map behind the highlighter.
//!
//! Intervals live in a vector sorted by `(start, end)` next to a running maximum of their ends.
//! Because that maximum never decreases, the first interval that can reach past an offset is
//! found by binary search, which keeps queries at O(log n + k).

use std::ops::Range;

/// Style ID type. The presentation layer maps these to visual attributes.
pub type StyleId = u32;

/// A styled half-open byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
    /// Style applied to the range.
    pub style_id: StyleId,
}

impl Interval {
    /// Create an interval covering `start..end`.
    pub fn new(start: usize, end: usize, style_id: StyleId) -> Self {
        Self {
            start,
            end,
            style_id,
        }
    }

    /// The covered range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `offset` falls inside the interval.
    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }

    /// Whether the two intervals share at least one byte.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Sorted interval storage with range queries and edit shifting.
#[derive(Debug, Clone, Default)]
pub struct IntervalTree {
    intervals: Vec<Interval>,
    /// `reach[i]` is the largest `end` among `intervals[..=i]`.
    reach: Vec<usize>,
}

impl IntervalTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn reindex(&mut self, from: usize) {
        self.reach.truncate(from);
        let mut max = self.reach.last().copied().unwrap_or(0);
        for interval in &self.intervals[from..] {
            max = max.max(interval.end);
            self.reach.push(max);
        }
    }

    fn resort(&mut self) {
        self.intervals.retain(|i| i.start < i.end);
        self.intervals.sort_by_key(|i| (i.start, i.end));
        self.reindex(0);
    }

    /// Insert an interval. Empty intervals are ignored.
    pub fn insert(&mut self, interval: Interval) {
        if interval.start >= interval.end {
            return;
        }
        let key = (interval.start, interval.end);
        let at = self.intervals.partition_point(|i| (i.start, i.end) <= key);
        self.intervals.insert(at, interval);
        self.reindex(at);
    }

    /// Intervals containing `offset`, in ascending start order.
    pub fn query_point(&self, offset: usize) -> Vec<&Interval> {
        self.query_range(offset, offset.saturating_add(1))
    }

    /// Intervals overlapping `start..end`, in ascending start order.
    pub fn query_range(&self, start: usize, end: usize) -> Vec<&Interval> {
        if start >= end {
            return Vec::new();
        }
        // Everything before `first` ends at or before `start`.
        let first = self.reach.partition_point(|&reach| reach <= start);
        let last = self.intervals.partition_point(|i| i.start < end);
        if first >= last {
            return Vec::new();
        }
        self.intervals[first..last]
            .iter()
            .filter(|i| i.end > start)
            .collect()
    }

    /// Remove coverage of `start..end`.
    ///
    /// Intervals inside the range are dropped; intervals crossing its boundary keep the part
    /// outside it.
    pub fn remove_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let first = self.reach.partition_point(|&reach| reach <= start);
        if first == self.intervals.len() {
            return;
        }

        let tail = self.intervals.split_off(first);
        for interval in tail {
            if interval.end <= start || interval.start >= end {
                self.intervals.push(interval);
                continue;
            }
            let style_id = interval.style_id;
            self.intervals
                .push(Interval::new(interval.start, start.max(interval.start), style_id));
            self.intervals
                .push(Interval::new(end.min(interval.end), interval.end, style_id));
        }
        self.resort();
    }

    /// Remove every interval.
    pub fn clear(&mut self) {
        self.intervals.clear();
        self.reach.clear();
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the tree holds no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterate intervals in ascending start order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> + '_ {
        self.intervals.iter()
    }

    /// Move intervals to post-edit coordinates after `start..old_end` became `new_len` bytes.
    ///
    /// Styling of the replaced bytes is dropped and the inserted bytes are left unstyled, except
    /// where an interval spans the whole edit, in which case it stretches over the insertion.
    pub fn update_for_edit(&mut self, start: usize, old_end: usize, new_len: usize) {
        if old_end == start && new_len == 0 {
            return;
        }
        let shift = |offset: usize| offset - old_end + start + new_len;
        for interval in &mut self.intervals {
            interval.start = if interval.start < start {
                interval.start
            } else if interval.start >= old_end {
                shift(interval.start)
            } else {
                start + new_len
            };
            interval.end = if interval.end <= start {
                interval.end
            } else if interval.end >= old_end {
                shift(interval.end)
            } else {
                start
            };
        }
        self.resort();
    }
}
