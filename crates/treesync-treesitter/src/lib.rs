#![warn(missing_docs)]
//! `treesync-treesitter` - Tree-sitter backed parse synchronization for `treesync-core`.
//!
//! A [`SyntaxClient`] owns the edit log of one document and a background worker that keeps a
//! parse tree in step with it:
//!
//! - edits are applied synchronously and never wait for a parse;
//! - parsing runs off the caller's task, one parse at a time, folding edits that arrive
//!   mid-parse into the next cycle;
//! - each commit produces a new [`SyntaxTree`] generation plus an [`Invalidation`] naming the
//!   ranges whose derived data changed;
//! - consumers read nodes through handles that pin their generation, so a node obtained before
//!   a suspension point is still valid after it.
//!
//! [`tokens`] projects a tree through a highlight query into sorted, non-overlapping tokens, and
//! [`TreeTokenProvider`] plugs that into [`treesync_core::Highlighter`].

mod client;
mod config;
mod invalidation;
mod parser;
mod provider;
mod store;
mod tokens;
mod tree;

pub use client::{Invalidation, InvalidationReceiver, SyntaxClient};
pub use config::{HighlightQuery, SyntaxConfig};
pub use invalidation::invalidated_ranges;
pub use parser::{IncrementalParser, ParseMode, edited_tree, input_edit};
pub use provider::TreeTokenProvider;
pub use store::{ParsedTree, TreeStore};
pub use tokens::{Tokens, tokens};
pub use tree::{NodeInfo, NodeRef, SyntaxNode, SyntaxTree, WeakSyntaxTree};
