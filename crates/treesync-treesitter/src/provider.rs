//! [`TokenProvider`] over the latest committed tree of a [`SyntaxClient`].

use std::ops::Range;

use treesync_core::{RestyleUnit, SyncError, TokenBatch, TokenProvider};

use crate::client::SyntaxClient;
use crate::tokens::tokens;

/// Feeds a [`Highlighter`](treesync_core::Highlighter) from a [`SyntaxClient`].
///
/// Each request waits for the tree of the current content, so ranges are always interpreted in
/// the same coordinates the caller's invalidations were expressed in.
#[derive(Debug, Clone)]
pub struct TreeTokenProvider {
    client: SyntaxClient,
}

impl TreeTokenProvider {
    /// Wrap a client.
    pub fn new(client: SyntaxClient) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &SyntaxClient {
        &self.client
    }
}

impl TokenProvider for TreeTokenProvider {
    type Error = SyncError;

    async fn tokens(&self, range: Range<usize>, unit: RestyleUnit) -> Result<TokenBatch, SyncError> {
        let tree = self.client.current_tree().await?;
        let end = range.end.min(tree.len());
        let start = range.start.min(end);
        let range = match unit {
            RestyleUnit::Exact => start..end,
            RestyleUnit::Line => tree.line_bounds(start..end),
        };

        let query = self.client.query();
        let tokens = tokens(&tree, &query, Some(range.clone())).collect();
        Ok(TokenBatch { range, tokens })
    }
}
