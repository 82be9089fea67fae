#![warn(missing_docs)]
//! `treesync-core` - grammar-agnostic half of the edit → reparse → invalidate → restyle pipeline.
//!
//! # Overview
//!
//! This crate holds the pieces that do not depend on any particular parser:
//!
//! - [`EditLog`]: the authoritative buffer content plus the queue of edits a parser has not
//!   seen yet. Snapshots are cheap rope clones.
//! - [`Edit`]: byte-offset edit descriptors with row/column points.
//! - [`RangeSet`]: disjoint byte ranges, used as invalidation sets.
//! - [`IntervalTree`]: the range → style map.
//! - [`TokenKind`] / [`Token`]: the closed set of highlight classes and plain token values.
//! - [`Highlighter`]: restyles only invalidated ranges, pulling tokens through a
//!   [`TokenProvider`].
//!
//! The tree-sitter backed parser, tree store and token projector live in
//! `treesync-treesitter`.
//!
//! # Quick Start
//!
//! ```rust
//! use treesync_core::{EditLog, RangeSet};
//!
//! let mut log = EditLog::new("{}");
//! let edit = log.apply_edit(1..1, "\"a\":1").unwrap();
//! assert_eq!(log.text(), "{\"a\":1}");
//! assert_eq!(edit.inserted_range(), 1..6);
//!
//! let mut damage = RangeSet::new();
//! damage.insert(edit.inserted_range());
//! damage.insert(0..2);
//! assert_eq!(damage.as_slice(), &[0..6]);
//! ```

pub mod buffer;
pub mod edit;
pub mod error;
pub mod highlighter;
pub mod intervals;
pub mod ranges;
pub mod token;

pub use buffer::{BufferSnapshot, EditLog};
pub use edit::{Edit, TextPoint};
pub use error::SyncError;
pub use highlighter::{Highlighter, HighlighterConfig, RestyleUnit, TokenBatch, TokenProvider};
pub use intervals::{Interval, IntervalTree, StyleId};
pub use ranges::RangeSet;
pub use token::{StyleMap, Token, TokenKind, UnknownTokenKind};
