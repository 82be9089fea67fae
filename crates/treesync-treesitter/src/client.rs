//! The synchronization client: edit log, background parse worker and tree store wired together.
//!
//! Edits are applied synchronously to the [`EditLog`] and wake a single worker task. The
//! worker parses on the blocking pool, one parse at a time. Edits that arrive while a parse is
//! running are folded into the next cycle; a parse whose content was overtaken by newer edits is
//! never committed, but its tree is kept as the base for the follow-up parse.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tree_sitter::{Language, Tree};
use treesync_core::{BufferSnapshot, Edit, EditLog, RangeSet, SyncError};

use crate::config::{HighlightQuery, SyntaxConfig};
use crate::invalidation::invalidated_ranges;
use crate::parser::IncrementalParser;
use crate::provider::TreeTokenProvider;
use crate::store::{ParsedTree, TreeStore};
use crate::tree::SyntaxTree;

/// Published once per commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    /// Generation of the newly committed tree.
    pub generation: u64,
    /// Content version `ranges` are expressed in.
    ///
    /// The receiver carries ranges through every edit applied after the parse, so this is the
    /// content version at the time the invalidation was received, which may be newer than the
    /// tree's own [`SyntaxTree::version`].
    pub version: u64,
    /// Ranges whose derived data must be recomputed.
    pub ranges: RangeSet,
}

/// Receiving half of the invalidation stream.
///
/// Ranges are handed out in the coordinates of the content at the moment they are received.
/// Consumers that track edits themselves, such as [`Highlighter::did_change_content`], should be
/// told about every edit before receiving, so both sides agree on the coordinates.
///
/// Yields `None` once the worker has shut down and every pending invalidation was received.
///
/// [`Highlighter::did_change_content`]: treesync_core::Highlighter::did_change_content
pub struct InvalidationReceiver {
    rx: mpsc::UnboundedReceiver<Invalidation>,
    shared: Arc<Shared>,
}

impl InvalidationReceiver {
    /// Wait for the next invalidation.
    pub async fn recv(&mut self) -> Option<Invalidation> {
        let inv = self.rx.recv().await?;
        Some(self.to_current(inv))
    }

    /// Take the next invalidation if one is already queued.
    pub fn try_recv(&mut self) -> Option<Invalidation> {
        let inv = self.rx.try_recv().ok()?;
        Some(self.to_current(inv))
    }

    /// Move `inv` from the coordinates it was computed in to those of the current content.
    fn to_current(&self, mut inv: Invalidation) -> Invalidation {
        let mut log = self.shared.log.lock();
        match log.edits_since(inv.version) {
            Some(edits) => inv.ranges.shift_for_edits(edits),
            None => {
                tracing::warn!(
                    version = inv.version,
                    current = log.version(),
                    "edits behind an invalidation were released, invalidating everything"
                );
                inv.ranges = RangeSet::single(0..log.len_bytes());
            }
        }
        log.forget_history(inv.version);
        inv.version = log.version();
        inv
    }
}

impl Drop for InvalidationReceiver {
    fn drop(&mut self) {
        self.shared.log.lock().set_keep_history(false);
    }
}

impl std::fmt::Debug for InvalidationReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationReceiver")
            .field("queued", &self.rx.len())
            .finish()
    }
}

struct Shared {
    log: Mutex<EditLog>,
    store: TreeStore,
    wake: Notify,
    shutdown: AtomicBool,
    query: Arc<HighlightQuery>,
}

/// Signals the worker when the last [`SyntaxClient`] handle goes away.
struct Lifetime {
    shared: Arc<Shared>,
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.wake.notify_one();
    }
}

/// Handle to one synchronized document. Cheap to clone.
#[derive(Clone)]
pub struct SyntaxClient {
    shared: Arc<Shared>,
    _lifetime: Arc<Lifetime>,
}

impl SyntaxClient {
    /// Start synchronizing `initial_text` with the grammar in `config`.
    ///
    /// Must be called from within a tokio runtime; the worker task is spawned onto it. The
    /// initial content is parsed right away.
    pub fn spawn(
        config: SyntaxConfig,
        initial_text: &str,
    ) -> Result<(Self, InvalidationReceiver), SyncError> {
        let handle = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let query = HighlightQuery::new(&config.language, &config.highlights_query)?;
        let parser = IncrementalParser::new(&config.language)?;

        let mut log = EditLog::new(initial_text);
        // Queued invalidations are carried through later edits when they are received.
        log.set_keep_history(true);
        let shared = Arc::new(Shared {
            log: Mutex::new(log),
            store: TreeStore::new(),
            wake: Notify::new(),
            shutdown: AtomicBool::new(false),
            query: Arc::new(query),
        });
        let (tx, rx) = mpsc::unbounded_channel();

        handle.spawn(run_worker(shared.clone(), config.language, parser, tx));
        shared.wake.notify_one();

        let lifetime = Arc::new(Lifetime {
            shared: shared.clone(),
        });
        Ok((
            Self {
                shared: shared.clone(),
                _lifetime: lifetime,
            },
            InvalidationReceiver { rx, shared },
        ))
    }

    fn after_edit(&self, result: Result<Edit, SyncError>) -> Result<Edit, SyncError> {
        if result.is_ok() {
            self.shared.wake.notify_one();
        }
        result
    }

    /// Replace `range` of the current content with `text`.
    pub fn apply_edit(&self, range: Range<usize>, text: &str) -> Result<Edit, SyncError> {
        let result = self.shared.log.lock().apply_edit(range, text);
        self.after_edit(result)
    }

    /// Apply a change reported as (replaced range, length delta, resulting content).
    pub fn apply_reported_change(
        &self,
        old_range: Range<usize>,
        delta: isize,
        new_content: &str,
    ) -> Result<Edit, SyncError> {
        let result = self
            .shared
            .log
            .lock()
            .apply_reported_change(old_range, delta, new_content);
        self.after_edit(result)
    }

    /// Replace the whole content.
    pub fn replace_content(&self, text: &str) -> Result<Edit, SyncError> {
        let result = self.shared.log.lock().replace_content(text);
        self.after_edit(result)
    }

    /// Current content version.
    pub fn version(&self) -> u64 {
        self.shared.log.lock().version()
    }

    /// Current content.
    pub fn text(&self) -> String {
        self.shared.log.lock().text()
    }

    /// The tree for the content as of this call.
    ///
    /// Suspends until a tree parsed from this content version (or a newer one) is committed.
    /// Concurrent callers share the same parse. Dropping the future is harmless.
    pub async fn current_tree(&self) -> Result<SyntaxTree, SyncError> {
        let version = self.version();
        self.shared.store.wait_for_version(version).await
    }

    /// Generation of the most recent commit; 0 before the first one.
    pub fn current_generation(&self) -> u64 {
        self.shared.store.current_generation()
    }

    /// The most recently committed tree, which may lag the content. Never suspends.
    pub fn latest_tree(&self) -> Option<SyntaxTree> {
        self.shared.store.latest()
    }

    /// The compiled highlight query.
    pub fn query(&self) -> Arc<HighlightQuery> {
        self.shared.query.clone()
    }

    /// A [`TokenProvider`](treesync_core::TokenProvider) backed by this client.
    pub fn token_provider(&self) -> TreeTokenProvider {
        TreeTokenProvider::new(self.clone())
    }

    #[cfg(test)]
    fn handle_count(&self) -> usize {
        Arc::strong_count(&self._lifetime)
    }
}

impl std::fmt::Debug for SyntaxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxClient")
            .field("version", &self.version())
            .field("generation", &self.current_generation())
            .finish()
    }
}

/// State carried by the worker between parse cycles.
struct Worker {
    shared: Arc<Shared>,
    language: Language,
    parser: Option<IncrementalParser>,
    /// Tree of the last successful parse, committed or not.
    base: Option<Tree>,
    /// Edits applied since the last committed tree.
    since_commit: Vec<Edit>,
    invalidations: mpsc::UnboundedSender<Invalidation>,
}

async fn run_worker(
    shared: Arc<Shared>,
    language: Language,
    parser: IncrementalParser,
    invalidations: mpsc::UnboundedSender<Invalidation>,
) {
    let mut worker = Worker {
        shared,
        language,
        parser: Some(parser),
        base: None,
        since_commit: Vec::new(),
        invalidations,
    };

    loop {
        if worker.shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        let snapshot = worker.shared.log.lock().take_pending();
        match snapshot {
            Some(snapshot) => worker.cycle(snapshot).await,
            None => worker.shared.wake.notified().await,
        }
    }

    tracing::debug!("syntax worker shutting down");
    worker.shared.store.close();
}

impl Worker {
    async fn cycle(&mut self, snapshot: BufferSnapshot) {
        let BufferSnapshot {
            version,
            content,
            edits,
        } = snapshot;
        self.since_commit.extend(edits.iter().cloned());

        let parser = match self.parser.take() {
            Some(parser) => parser,
            None => match IncrementalParser::new(&self.language) {
                Ok(parser) => parser,
                Err(err) => {
                    self.fail(version, err);
                    return;
                }
            },
        };
        let base = self.base.take();

        let joined = tokio::task::spawn_blocking(move || {
            let mut parser = parser;
            let text = content.to_string();
            let result = parser.parse(base.as_ref(), &edits, &text);
            (parser, result.map(|tree| (tree, text)))
        })
        .await;

        let (tree, text) = match joined {
            Ok((parser, result)) => {
                self.parser = Some(parser);
                match result {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        self.fail(version, err);
                        return;
                    }
                }
            }
            Err(err) => {
                self.fail(version, SyncError::ParseFailure(err.to_string()));
                return;
            }
        };
        self.base = Some(tree.clone());

        // Only this worker commits, so the previous tree cannot change under us.
        let previous = self.shared.store.latest();

        // The version check and the commit must not be split by an edit.
        let log = self.shared.log.lock();
        if log.version() != version {
            tracing::debug!(
                parsed = version,
                current = log.version(),
                "parse overtaken by newer edits, not committing"
            );
            return;
        }

        let committed = match self.shared.store.commit(ParsedTree {
            version,
            tree,
            text,
        }) {
            Ok(committed) => committed,
            Err(err) => {
                tracing::warn!(version, error = %err, "commit rejected");
                return;
            }
        };
        drop(log);

        let edits = std::mem::take(&mut self.since_commit);
        let ranges = invalidated_ranges(previous.as_ref(), &committed, &edits);
        tracing::debug!(
            generation = committed.generation(),
            version,
            edits = edits.len(),
            ranges = ranges.len(),
            "tree committed"
        );

        // The receiver may be gone; commits continue regardless.
        let _ = self.invalidations.send(Invalidation {
            generation: committed.generation(),
            version,
            ranges,
        });
    }

    /// The base tree no longer matches the content, so the next parse starts from scratch.
    fn fail(&mut self, version: u64, err: SyncError) {
        tracing::warn!(version, error = %err, "parse failed");
        self.base = None;
        self.shared.store.fail(version, err);
    }
}
