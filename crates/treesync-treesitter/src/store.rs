//! The tree store: single writer, many readers, atomically swapped current tree.

use tokio::sync::watch;
use tree_sitter::Tree;
use treesync_core::SyncError;

use crate::tree::SyntaxTree;

/// A freshly parsed tree awaiting commit.
pub struct ParsedTree {
    /// Content version the tree was parsed from.
    pub version: u64,
    /// The parsed tree.
    pub tree: Tree,
    /// The content it was parsed from.
    pub text: String,
}

#[derive(Clone, Default)]
struct StoreState {
    current: Option<SyntaxTree>,
    failure: Option<(u64, SyncError)>,
    generation: u64,
    closed: bool,
}

impl StoreState {
    fn tree_at_least(&self, version: u64) -> Option<&SyntaxTree> {
        self.current.as_ref().filter(|tree| tree.version() >= version)
    }

    fn failure_at_least(&self, version: u64) -> Option<&SyncError> {
        self.failure
            .as_ref()
            .filter(|(failed, _)| *failed >= version)
            .map(|(_, err)| err)
    }
}

/// Holds zero or one current [`SyntaxTree`].
///
/// Readers get clones of the current tree; a clone stays valid after newer commits because it
/// pins its own storage. The store itself only ever keeps the latest generation.
pub struct TreeStore {
    state: watch::Sender<StoreState>,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self { state }
    }

    /// Install `parsed` as the current tree and return it with its new generation.
    ///
    /// A tree parsed from an older content version than the current one is rejected with
    /// [`SyncError::StaleCommit`] and never installed.
    pub fn commit(&self, parsed: ParsedTree) -> Result<SyntaxTree, SyncError> {
        let mut result = Err(SyncError::Closed);
        self.state.send_if_modified(|state| {
            if let Some(current) = state.current.as_ref()
                && parsed.version < current.version()
            {
                result = Err(SyncError::StaleCommit {
                    version: parsed.version,
                    current: current.version(),
                });
                return false;
            }

            state.generation += 1;
            let tree = SyntaxTree::new(state.generation, parsed.version, parsed.tree, parsed.text);
            if state
                .failure
                .as_ref()
                .is_some_and(|(failed, _)| *failed <= tree.version())
            {
                state.failure = None;
            }
            state.current = Some(tree.clone());
            result = Ok(tree);
            true
        });
        result
    }

    /// Record that parsing content `version` failed.
    ///
    /// Consumers waiting for that version (or older) receive the error instead of a tree.
    pub fn fail(&self, version: u64, error: SyncError) {
        self.state.send_modify(|state| state.failure = Some((version, error)));
    }

    /// Wake every waiter with [`SyncError::Closed`]; no further trees will be committed.
    pub fn close(&self) {
        self.state.send_modify(|state| state.closed = true);
    }

    /// The current tree, if any. Never suspends.
    pub fn latest(&self) -> Option<SyntaxTree> {
        self.state.borrow().current.clone()
    }

    /// Generation of the last committed tree (0 before the first commit). Diagnostics only.
    pub fn current_generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Wait until a tree parsed from content `version` or newer is committed.
    ///
    /// Dropping the returned future has no effect on the store.
    pub async fn wait_for_version(&self, version: u64) -> Result<SyntaxTree, SyncError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| {
                state.closed
                    || state.tree_at_least(version).is_some()
                    || state.failure_at_least(version).is_some()
            })
            .await
            .map_err(|_| SyncError::Closed)?;

        if let Some(tree) = state.tree_at_least(version) {
            return Ok(tree.clone());
        }
        if let Some(err) = state.failure_at_least(version) {
            return Err(err.clone());
        }
        Err(SyncError::Closed)
    }
}
