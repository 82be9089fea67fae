//! Authoritative buffer content and the queue of edits not yet folded into a parse.
//!
//! The content lives in a [`Rope`], so taking a snapshot for a background parse is a cheap
//! structural clone rather than a text copy.

use std::ops::Range;

use ropey::Rope;

use crate::edit::{Edit, TextPoint};
use crate::error::SyncError;

/// Content plus the edits that produced it, captured atomically for a parse cycle.
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    /// Content version the snapshot was taken at.
    pub version: u64,
    /// Full content at `version`.
    pub content: Rope,
    /// Edits applied since the previous snapshot, in order.
    pub edits: Vec<Edit>,
}

/// The edit log: single writer of buffer content.
///
/// Callers serialize edits before they reach this type; every successful edit bumps
/// [`EditLog::version`] by one.
#[derive(Debug, Clone)]
pub struct EditLog {
    rope: Rope,
    version: u64,
    pending: Vec<Edit>,
    snapshot_pending: bool,
    /// Applied edits not yet released, the first one applied on top of `history_base`.
    history: Vec<Edit>,
    history_base: u64,
    keep_history: bool,
}

impl EditLog {
    /// Create a log holding `text` at version 0.
    ///
    /// The initial content counts as pending, so the first [`EditLog::take_pending`] yields a
    /// snapshot with no edits (a full parse).
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
            pending: Vec::new(),
            snapshot_pending: true,
            history: Vec::new(),
            history_base: 0,
            keep_history: false,
        }
    }

    /// Current content version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Content length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// The current content as a rope (cheap clone).
    pub fn content(&self) -> Rope {
        self.rope.clone()
    }

    /// The current content as a `String`.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Whether edits (or the initial content) are waiting for a parse.
    pub fn has_pending(&self) -> bool {
        self.snapshot_pending
    }

    /// Edits recorded since the last snapshot.
    pub fn pending_edits(&self) -> &[Edit] {
        &self.pending
    }

    /// Row/column point for a byte offset.
    pub fn point_at(&self, byte: usize) -> TextPoint {
        let row = self.rope.byte_to_line(byte);
        TextPoint::new(row, byte - self.rope.line_to_byte(row))
    }

    fn is_char_boundary(&self, byte: usize) -> bool {
        byte <= self.rope.len_bytes() && self.rope.char_to_byte(self.rope.byte_to_char(byte)) == byte
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), SyncError> {
        let len = self.rope.len_bytes();
        if range.start > range.end
            || range.end > len
            || !self.is_char_boundary(range.start)
            || !self.is_char_boundary(range.end)
        {
            return Err(SyncError::out_of_bounds(range.clone(), len));
        }
        Ok(())
    }

    /// Replace `range` (bytes in the current content) with `new_text`.
    ///
    /// Rejects ranges that are not contained in the content; the buffer is unchanged on error.
    pub fn apply_edit(&mut self, range: Range<usize>, new_text: &str) -> Result<Edit, SyncError> {
        self.check_range(&range)?;

        let start_point = self.point_at(range.start);
        let old_end_point = self.point_at(range.end);
        let edit = Edit::new(
            range.clone(),
            new_text,
            self.rope.len_bytes(),
            start_point,
            old_end_point,
        )?;

        let start_char = self.rope.byte_to_char(range.start);
        let end_char = self.rope.byte_to_char(range.end);
        self.rope.remove(start_char..end_char);
        self.rope.insert(start_char, new_text);

        self.version += 1;
        self.pending.push(edit.clone());
        self.snapshot_pending = true;
        if self.keep_history {
            self.history.push(edit.clone());
        } else {
            self.history_base = self.version;
        }
        tracing::trace!(
            version = self.version,
            start = edit.start,
            old_end = edit.old_end,
            new_end = edit.new_end,
            "edit applied"
        );
        Ok(edit)
    }

    /// Apply a change reported by a host editing surface.
    ///
    /// `old_range` is the replaced range in the current content, `delta` the change in length,
    /// and `new_content` the full resulting content. The inserted text is read back from
    /// `new_content`. The report is rejected unless `new_content` agrees with the current content
    /// outside the replaced range.
    pub fn apply_reported_change(
        &mut self,
        old_range: Range<usize>,
        delta: isize,
        new_content: &str,
    ) -> Result<Edit, SyncError> {
        self.check_range(&old_range)?;

        let len = self.rope.len_bytes();
        let inserted_end = usize::try_from(old_range.end as isize + delta)
            .ok()
            .filter(|end| *end >= old_range.start && new_content.len() as isize == len as isize + delta);
        let parts = inserted_end.and_then(|end| {
            Some((
                new_content.get(..old_range.start)?,
                new_content.get(old_range.start..end)?,
                new_content.get(end..)?,
            ))
        });
        let Some((prefix, inserted, suffix)) = parts else {
            return Err(SyncError::out_of_bounds(old_range, len));
        };

        let start_char = self.rope.byte_to_char(old_range.start);
        let end_char = self.rope.byte_to_char(old_range.end);
        if self.rope.slice(..start_char) != prefix || self.rope.slice(end_char..) != suffix {
            tracing::debug!(
                start = old_range.start,
                end = old_range.end,
                "reported content disagrees with the log"
            );
            return Err(SyncError::out_of_bounds(old_range, len));
        }

        self.apply_edit(old_range, inserted)
    }

    /// Replace the whole document.
    pub fn replace_content(&mut self, text: &str) -> Result<Edit, SyncError> {
        self.apply_edit(0..self.rope.len_bytes(), text)
    }

    /// Retain applied edits so ranges taken at an older version can be carried forward.
    ///
    /// Turning retention off releases everything retained so far.
    pub fn set_keep_history(&mut self, keep: bool) {
        self.keep_history = keep;
        if !keep {
            self.history.clear();
            self.history_base = self.version;
        }
    }

    /// Edits applied after content `version`, in order.
    ///
    /// `None` when `version` is in the future or its edits were already released.
    pub fn edits_since(&self, version: u64) -> Option<&[Edit]> {
        if version < self.history_base || version > self.version {
            return None;
        }
        let skip = usize::try_from(version - self.history_base).ok()?;
        self.history.get(skip..)
    }

    /// Release retained edits up to and including the one that produced content `version`.
    pub fn forget_history(&mut self, version: u64) {
        let version = version.min(self.version);
        if version <= self.history_base {
            return;
        }
        let count = usize::try_from(version - self.history_base)
            .unwrap_or(usize::MAX)
            .min(self.history.len());
        self.history.drain(..count);
        self.history_base = version;
    }

    /// Take the pending edits together with the content they produced.
    ///
    /// Returns `None` when nothing changed since the previous snapshot.
    pub fn take_pending(&mut self) -> Option<BufferSnapshot> {
        if !self.snapshot_pending {
            return None;
        }
        self.snapshot_pending = false;
        Some(BufferSnapshot {
            version: self.version,
            content: self.rope.clone(),
            edits: std::mem::take(&mut self.pending),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot_is_full() {
        let mut log = EditLog::new("{}");
        let snap = log.take_pending().expect("initial snapshot");
        assert_eq!(snap.version, 0);
        assert!(snap.edits.is_empty());
        assert_eq!(snap.content.to_string(), "{}");
        assert!(log.take_pending().is_none());
    }

    #[test]
    fn test_edit_points_track_rows() {
        let mut log = EditLog::new("ab\ncd\n");
        let edit = log.apply_edit(4..6, "X\nYZ").unwrap();
        assert_eq!(edit.start_point, TextPoint::new(1, 1));
        assert_eq!(edit.old_end_point, TextPoint::new(2, 0));
        assert_eq!(edit.new_end_point, TextPoint::new(2, 2));
        assert_eq!(log.text(), "ab\ncX\nYZ");
    }

    #[test]
    fn test_rejects_non_char_boundary() {
        let mut log = EditLog::new("héllo");
        let err = log.apply_edit(2..3, "").unwrap_err();
        assert!(matches!(err, SyncError::OutOfBounds { .. }));
        assert_eq!(log.text(), "héllo");
        assert_eq!(log.version(), 0);
    }

    #[test]
    fn test_snapshot_folds_edits_in_order() {
        let mut log = EditLog::new("");
        log.take_pending();
        log.apply_edit(0..0, "ab").unwrap();
        log.apply_edit(1..1, "c").unwrap();
        let snap = log.take_pending().unwrap();
        assert_eq!(snap.version, 2);
        assert_eq!(snap.edits.len(), 2);
        assert_eq!(snap.content.to_string(), "acb");
    }
}
