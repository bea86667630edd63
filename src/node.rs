use std::{cmp, ops::Deref};

/// Node corresponds to a single key in an [`Avl`] instance.
///
/// [`Avl`]: crate::Avl
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) key: i64,
    pub(crate) count: usize,              // store: logical insertions of key
    pub(crate) height: usize,             // store: height of this subtree
    pub(crate) left: Option<Box<Node>>,   // store: left child
    pub(crate) right: Option<Box<Node>>,  // store: right child
}

impl Node {
    // CREATE operation
    pub(crate) fn new(key: i64) -> Box<Node> {
        Box::new(Node {
            key,
            count: 1,
            height: 1,
            left: None,
            right: None,
        })
    }

    // clone and detach this node from the tree.
    pub(crate) fn clone_detach(&self) -> Node {
        Node {
            key: self.key,
            count: self.count,
            height: 1,
            left: None,
            right: None,
        }
    }

    /// Return the key held by this node.
    #[inline]
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Return the number of times key is present in the index.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Return the height of the subtree rooted at this node, a leaf
    /// has height 1.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn left(&self) -> Option<&Node> {
        self.left.as_ref().map(Deref::deref)
    }

    #[inline]
    pub fn right(&self) -> Option<&Node> {
        self.right.as_ref().map(Deref::deref)
    }

    #[inline]
    pub(crate) fn balance(&self) -> isize {
        height(self.left()) as isize - height(self.right()) as isize
    }

    #[inline]
    pub(crate) fn update_height(&mut self) {
        self.height = 1 + cmp::max(height(self.left()), height(self.right()));
    }
}

#[inline]
pub(crate) fn height(node: Option<&Node>) -> usize {
    node.map_or(0, |node| node.height)
}
