//! Error taxonomy shared by the edit log, the tree store and the parse pipeline.

use std::ops::Range;

/// Errors produced while synchronizing a buffer with its parse tree.
///
/// Edit-producer errors ([`SyncError::OutOfBounds`]) are returned synchronously from the edit
/// call. Parse-pipeline errors are surfaced through the next tree query instead of being raised
/// into unrelated callers, which is why the type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The edit range is not contained in the current content (or does not fall on character
    /// boundaries). The edit is rejected and the buffer is unchanged.
    #[error("edit range {start}..{end} is out of bounds for content of {len} bytes")]
    OutOfBounds {
        /// Requested range start (bytes).
        start: usize,
        /// Requested range end (bytes, exclusive).
        end: usize,
        /// Content length at the time of the request.
        len: usize,
    },
    /// A parse result was older than the tree already committed.
    #[error("stale commit for content version {version} (current is {current})")]
    StaleCommit {
        /// Content version the rejected tree was parsed from.
        version: u64,
        /// Content version of the tree currently installed.
        current: u64,
    },
    /// Grammar or query loading failed, or the parser could not produce a tree.
    #[error("parse failure: {0}")]
    ParseFailure(String),
    /// A node reference was resolved against a tree it does not belong to.
    #[error("invalid handle: node from generation {handle} resolved against generation {tree}")]
    InvalidHandle {
        /// Generation recorded in the handle.
        handle: u64,
        /// Generation of the tree it was resolved against.
        tree: u64,
    },
    /// The parse worker has shut down.
    #[error("syntax worker has shut down")]
    Closed,
    /// No async runtime was available to host the parse worker.
    #[error("no tokio runtime available to host the parse worker")]
    NoRuntime,
}

impl SyncError {
    /// Build an [`SyncError::OutOfBounds`] for a byte range.
    pub fn out_of_bounds(range: Range<usize>, len: usize) -> Self {
        Self::OutOfBounds {
            start: range.start,
            end: range.end,
            len,
        }
    }
}
