//! Grammar configuration and highlight query validation.

use std::fmt;

use tree_sitter::{Language, Query};
use treesync_core::{SyncError, TokenKind};

/// Configuration for [`SyntaxClient`](crate::SyntaxClient).
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
    /// Tree-sitter language.
    pub language: Language,
    /// Highlight query (`.scm`). Every non-helper capture must name a [`TokenKind`].
    pub highlights_query: String,
}

impl SyntaxConfig {
    /// Create a config with a language + highlights query.
    pub fn new(language: Language, highlights_query: impl Into<String>) -> Self {
        Self {
            language,
            highlights_query: highlights_query.into(),
        }
    }

    /// Replace the highlights query.
    pub fn with_highlights_query(mut self, highlights_query: impl Into<String>) -> Self {
        self.highlights_query = highlights_query.into();
        self
    }
}

/// A compiled highlight query whose captures have been resolved to [`TokenKind`]s.
///
/// Captures whose names start with `_` are treated as helpers (used only by predicates) and
/// never produce tokens. Any other capture name must resolve, or loading fails.
pub struct HighlightQuery {
    query: Query,
    kinds: Vec<Option<TokenKind>>,
}

impl HighlightQuery {
    /// Compile `source` for `language` and validate its capture names.
    pub fn new(language: &Language, source: &str) -> Result<Self, SyncError> {
        let query =
            Query::new(language, source).map_err(|e| SyncError::ParseFailure(e.to_string()))?;

        let kinds = query
            .capture_names()
            .iter()
            .map(|name| {
                if name.starts_with('_') {
                    return Ok(None);
                }
                name.parse::<TokenKind>()
                    .map(Some)
                    .map_err(|e| SyncError::ParseFailure(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { query, kinds })
    }

    /// The compiled query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The token kind produced by capture `index`, if any.
    pub fn kind_for_capture(&self, index: u32) -> Option<TokenKind> {
        self.kinds.get(index as usize).copied().flatten()
    }
}

impl fmt::Debug for HighlightQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightQuery")
            .field("patterns", &self.query.pattern_count())
            .field("kinds", &self.kinds)
            .finish()
    }
}
