//! Committed syntax trees and the node handles derived from them.
//!
//! A [`SyntaxTree`] is an immutable, reference-counted value. Every clone pins the parse state
//! of its generation: committing a newer tree never releases storage that a consumer still
//! holds. Nodes borrow the tree they came from ([`SyntaxNode<'tree>`]), so a node cannot be
//! used after its tree handle is gone; to carry a node across a suspension point either keep
//! the `SyntaxTree` alive alongside it or copy it out into a [`NodeInfo`] / [`NodeRef`].

use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Weak};

use tree_sitter::{Node, Tree};
use treesync_core::SyncError;

struct TreeInner {
    generation: u64,
    version: u64,
    tree: Tree,
    text: String,
}

/// One committed parse of one buffer content.
#[derive(Clone)]
pub struct SyntaxTree {
    inner: Arc<TreeInner>,
}

impl SyntaxTree {
    pub(crate) fn new(generation: u64, version: u64, tree: Tree, text: String) -> Self {
        Self {
            inner: Arc::new(TreeInner {
                generation,
                version,
                tree,
                text,
            }),
        }
    }

    /// Generation assigned when this tree was committed.
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    /// Content version this tree was parsed from.
    pub fn version(&self) -> u64 {
        self.inner.version
    }

    /// The content this tree was parsed from.
    pub fn text(&self) -> &str {
        &self.inner.text
    }

    /// Length of the parsed content in bytes.
    pub fn len(&self) -> usize {
        self.inner.text.len()
    }

    /// Whether the parsed content is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.text.is_empty()
    }

    /// The underlying tree-sitter tree.
    pub fn raw(&self) -> &Tree {
        &self.inner.tree
    }

    /// The root node.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: self.inner.tree.root_node(),
            tree: self,
        }
    }

    /// The smallest node spanning `range`.
    pub fn node_for_range(&self, range: Range<usize>) -> Option<SyntaxNode<'_>> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.inner
            .tree
            .root_node()
            .descendant_for_byte_range(start, end)
            .map(|node| SyntaxNode { node, tree: self })
    }

    /// Resolve a node reference taken from this tree.
    ///
    /// Fails with [`SyncError::InvalidHandle`] if the reference was taken from another
    /// generation, or if it does not name a node of this tree.
    pub fn resolve(&self, node_ref: &NodeRef) -> Result<SyntaxNode<'_>, SyncError> {
        let invalid = SyncError::InvalidHandle {
            handle: node_ref.generation,
            tree: self.generation(),
        };
        if node_ref.generation != self.generation() {
            tracing::error!(
                handle = node_ref.generation,
                tree = self.generation(),
                "node reference resolved against the wrong generation"
            );
            return Err(invalid);
        }

        let range = node_ref.byte_range.clone();
        let mut candidate = self
            .inner
            .tree
            .root_node()
            .descendant_for_byte_range(range.start, range.end);
        while let Some(node) = candidate {
            if node.byte_range() != range {
                break;
            }
            if node.kind_id() == node_ref.kind_id {
                return Ok(SyntaxNode { node, tree: self });
            }
            candidate = node.parent();
        }
        Err(invalid)
    }

    /// Whether two handles pin the same committed tree.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of live handles pinning this tree.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// A non-pinning handle, used to observe when a generation has been released.
    pub fn downgrade(&self) -> WeakSyntaxTree {
        WeakSyntaxTree {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Extend `range` to whole lines of this tree's content.
    pub fn line_bounds(&self, range: Range<usize>) -> Range<usize> {
        let text = self.text();
        let end = range.end.min(text.len());
        let start = range.start.min(end);
        let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[end..]
            .find('\n')
            .map_or(text.len(), |i| end + i + 1);
        line_start..line_end
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("generation", &self.generation())
            .field("version", &self.version())
            .field("len", &self.len())
            .finish()
    }
}

/// A handle that observes a [`SyntaxTree`] without pinning it.
#[derive(Clone)]
pub struct WeakSyntaxTree {
    inner: Weak<TreeInner>,
}

impl WeakSyntaxTree {
    /// Pin the tree again if it is still alive.
    pub fn upgrade(&self) -> Option<SyntaxTree> {
        self.inner.upgrade().map(|inner| SyntaxTree { inner })
    }
}

/// A node of a specific [`SyntaxTree`]. Cannot outlive the tree handle it borrows.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'tree> {
    node: Node<'tree>,
    tree: &'tree SyntaxTree,
}

impl<'tree> SyntaxNode<'tree> {
    /// Node kind name.
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Byte span.
    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }

    /// Source text of the node.
    pub fn text(&self) -> &'tree str {
        let text: &'tree str = self.tree.text();
        text.get(self.node.byte_range()).unwrap_or_default()
    }

    /// Generation of the tree this node belongs to.
    pub fn generation(&self) -> u64 {
        self.tree.generation()
    }

    /// The tree this node belongs to.
    pub fn tree(&self) -> &'tree SyntaxTree {
        self.tree
    }

    /// Whether this is an `ERROR` node.
    pub fn is_error(&self) -> bool {
        self.node.is_error()
    }

    /// Whether this is a named node.
    pub fn is_named(&self) -> bool {
        self.node.is_named()
    }

    /// Parent node.
    pub fn parent(&self) -> Option<Self> {
        self.node.parent().map(|node| Self {
            node,
            tree: self.tree,
        })
    }

    /// Direct children, in order.
    pub fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| Self {
                node,
                tree: self.tree,
            })
            .collect()
    }

    /// First child.
    pub fn first_child(&self) -> Option<Self> {
        let mut cursor = self.node.walk();
        let first = self.node.children(&mut cursor).next();
        first.map(|node| Self {
            node,
            tree: self.tree,
        })
    }

    /// The underlying tree-sitter node.
    pub fn raw(&self) -> Node<'tree> {
        self.node
    }

    /// Copy the node's fields into a plain value.
    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            generation: self.generation(),
            kind: self.kind(),
            byte_range: self.byte_range(),
            parent_kind: self.node.parent().map(|p| p.kind()),
            child_count: self.node.child_count(),
            is_error: self.is_error(),
        }
    }

    /// A generation-tagged reference that can be resolved against the same tree later.
    pub fn to_ref(&self) -> NodeRef {
        NodeRef {
            generation: self.generation(),
            kind_id: self.node.kind_id(),
            byte_range: self.byte_range(),
        }
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("generation", &self.generation())
            .field("kind", &self.kind())
            .field("byte_range", &self.byte_range())
            .finish()
    }
}

/// Plain copy of a node's fields. Safe to keep across suspension points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Generation the node was read from.
    pub generation: u64,
    /// Node kind name.
    pub kind: &'static str,
    /// Byte span.
    pub byte_range: Range<usize>,
    /// Parent kind, if the node has a parent.
    pub parent_kind: Option<&'static str>,
    /// Number of children.
    pub child_count: usize,
    /// Whether this is an `ERROR` node.
    pub is_error: bool,
}

/// Generation-tagged plain reference to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    generation: u64,
    kind_id: u16,
    byte_range: Range<usize>,
}

impl NodeRef {
    /// Generation the reference was taken from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Byte span at that generation.
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }
}
