//! Structured edit descriptors.
//!
//! An [`Edit`] carries both byte offsets and row/column points so a syntax tree can be shifted
//! to post-edit coordinates without re-reading the old text. Offsets are expressed in **bytes**
//! of UTF-8 content; columns in [`TextPoint`] are bytes as well.

use std::ops::Range;

use crate::error::SyncError;

/// A row/column position. `column` is a byte offset within the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPoint {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based byte column.
    pub column: usize,
}

impl TextPoint {
    /// Create a point from a row and byte column.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Advance this point over `text`, as if `text` had been inserted at it.
    pub fn advance(mut self, text: &str) -> Self {
        let mut parts = text.split('\n');
        let Some(first) = parts.next() else {
            return self;
        };

        self.column = self.column.saturating_add(first.len());
        for part in parts {
            self.row = self.row.saturating_add(1);
            self.column = part.len();
        }

        self
    }
}

/// A single text edit.
///
/// Semantics:
/// - `start..old_end` is the replaced range in the content **at the time this edit is applied**.
/// - `start..new_end` is the range occupied by the replacement after the edit.
/// - Edits in a sequence must be applied **in order**.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset.
    pub start: usize,
    /// Exclusive end byte offset in the pre-edit content.
    pub old_end: usize,
    /// Exclusive end byte offset in the post-edit content.
    pub new_end: usize,
    /// Position of `start`.
    pub start_point: TextPoint,
    /// Position of `old_end` in the pre-edit content.
    pub old_end_point: TextPoint,
    /// Position of `new_end` in the post-edit content.
    pub new_end_point: TextPoint,
    /// Inserted text, when known.
    pub inserted_text: Option<String>,
}

impl Edit {
    /// Build an edit replacing `range` with `text`, deriving the end points from the start ones.
    ///
    /// `len` is the length of the content being edited; ranges that are reversed or run past it
    /// are rejected.
    pub fn new(
        range: Range<usize>,
        text: &str,
        len: usize,
        start_point: TextPoint,
        old_end_point: TextPoint,
    ) -> Result<Self, SyncError> {
        if range.start > range.end || range.end > len {
            return Err(SyncError::out_of_bounds(range, len));
        }
        Ok(Self {
            start: range.start,
            old_end: range.end,
            new_end: range.start + text.len(),
            start_point,
            old_end_point,
            new_end_point: start_point.advance(text),
            inserted_text: Some(text.to_string()),
        })
    }

    /// Length of the removed range in bytes.
    pub fn old_len(&self) -> usize {
        self.old_end - self.start
    }

    /// Length of the inserted text in bytes.
    pub fn new_len(&self) -> usize {
        self.new_end - self.start
    }

    /// Signed change in content length.
    pub fn delta(&self) -> isize {
        self.new_len() as isize - self.old_len() as isize
    }

    /// The replaced range in pre-edit coordinates.
    pub fn old_range(&self) -> Range<usize> {
        self.start..self.old_end
    }

    /// The inserted range in post-edit coordinates.
    pub fn inserted_range(&self) -> Range<usize> {
        self.start..self.new_end
    }

    /// An edit that replaces nothing with nothing.
    pub fn is_noop(&self) -> bool {
        self.old_end == self.start && self.new_end == self.start
    }

    /// Map a pre-edit offset into post-edit coordinates.
    ///
    /// Offsets inside the replaced range collapse onto the end of the inserted text.
    pub fn map_offset(&self, offset: usize) -> usize {
        if offset <= self.start {
            offset
        } else if offset >= self.old_end {
            offset - self.old_len() + self.new_len()
        } else {
            self.new_end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_advance_multiline() {
        let p = TextPoint::new(2, 4).advance("ab\ncde\n");
        assert_eq!(p, TextPoint::new(4, 0));

        let p = TextPoint::new(0, 3).advance("xy");
        assert_eq!(p, TextPoint::new(0, 5));
    }

    #[test]
    fn test_map_offset() {
        let edit = Edit::new(2..5, "x", 8, TextPoint::new(0, 2), TextPoint::new(0, 5)).unwrap();
        assert_eq!(edit.new_end, 3);
        assert_eq!(edit.new_end_point, TextPoint::new(0, 3));
        assert_eq!(edit.delta(), -2);
        assert_eq!(edit.map_offset(1), 1);
        assert_eq!(edit.map_offset(4), 3);
        assert_eq!(edit.map_offset(7), 5);
        assert!(!edit.is_noop());
    }

    #[test]
    fn test_new_rejects_bad_ranges() {
        let (start, end) = (4, 2);
        let err = Edit::new(start..end, "", 8, TextPoint::default(), TextPoint::default());
        assert_eq!(
            err.unwrap_err(),
            SyncError::OutOfBounds {
                start: 4,
                end: 2,
                len: 8
            }
        );
        assert!(Edit::new(6..9, "", 8, TextPoint::default(), TextPoint::default()).is_err());
        assert!(Edit::new(8..8, "", 8, TextPoint::default(), TextPoint::default()).unwrap().is_noop());
    }
}
