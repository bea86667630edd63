use std::{
    cmp::{self, Ordering},
    fmt, mem,
    ops::DerefMut,
};

use log::{debug, trace};

use crate::depth::Depth;
use crate::error::AvlError;
use crate::node::{self, Node};

/// How repeated insertions of the same key are laid out in an [`Avl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Duplicates {
    /// Repeated key bumps the count on its node, one node per key.
    Counted,
    /// Repeated key bumps the count on its node and also links a replica
    /// node into its right subtree. Every replica of a key carries the
    /// same count.
    Replicated,
}

impl Default for Duplicates {
    fn default() -> Self {
        Duplicates::Counted
    }
}

/// Outcome of a successful [`Avl::delete`].
#[derive(Clone, Debug, PartialEq)]
pub enum Deleted {
    /// Key is still present, `count` occurrences are left.
    Decremented { key: i64, count: usize },
    /// Last occurrence of the key is gone. Carries a detached copy of the
    /// key and the count it had. When the key's node had two children,
    /// the node physically unlinked is its in-order predecessor, whose
    /// key and count moved into the deleted key's place.
    Removed(Node),
}

/// Avl manage a single instance of in-memory index using an
/// [AVL][avl] tree over integer keys. Inserting a key that is already
/// present counts one more occurrence of that key.
///
/// [avl]: https://en.wikipedia.org/wiki/AVL_tree
#[derive(Clone)]
pub struct Avl {
    name: String,
    duplicates: Duplicates,
    root: Option<Box<Node>>,
    n_count: usize, // number of distinct keys in the tree.
}

/// Different ways to construct a new Avl instance.
impl Avl {
    /// Create an empty instance of Avl, identified by `name`, that counts
    /// repeated keys on a single node.
    pub fn new<S>(name: S) -> Avl
    where
        S: AsRef<str>,
    {
        Avl::with_duplicates(name, Default::default())
    }

    /// Create an empty instance of Avl, laying out repeated keys as
    /// `duplicates` says.
    pub fn with_duplicates<S>(name: S, duplicates: Duplicates) -> Avl
    where
        S: AsRef<str>,
    {
        Avl {
            name: name.as_ref().to_string(),
            duplicates,
            root: Default::default(),
            n_count: Default::default(),
        }
    }

    /// Create a new instance of Avl tree and insert every key from
    /// `iter`, one at a time. Keys need not be unique.
    pub fn load_from<S, I>(name: S, iter: I) -> Avl
    where
        S: AsRef<str>,
        I: IntoIterator<Item = i64>,
    {
        Avl::load_from_with(name, Default::default(), iter)
    }

    /// Same as [`Avl::load_from`], laying out repeated keys as
    /// `duplicates` says.
    pub fn load_from_with<S, I>(name: S, duplicates: Duplicates, iter: I) -> Avl
    where
        S: AsRef<str>,
        I: IntoIterator<Item = i64>,
    {
        let mut avl = Avl::with_duplicates(name, duplicates);
        for key in iter {
            avl.insert(key);
        }
        avl
    }
}

/// Maintenance API.
impl Avl {
    /// Identify this instance. Applications can choose unique names while
    /// creating Avl instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return the layout used for repeated keys.
    #[inline]
    pub fn duplicates(&self) -> Duplicates {
        self.duplicates
    }

    /// Return number of distinct keys in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Return the root node, if any.
    #[inline]
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Return quickly with basic statisics, only entries() and
    /// node_size() are valid with this statisics.
    pub fn stats(&self) -> Stats {
        Stats::new(self.n_count, mem::size_of::<Node>())
    }
}

type Insert = (Box<Node>, bool);

type Delete = (Option<Box<Node>>, Option<Deleted>);

type Delmax = (Option<Box<Node>>, Box<Node>);

/// Write operations on Avl instance.
impl Avl {
    /// Insert `key` into the index. If key is already present its count
    /// goes up by one. Return the node that now holds key.
    pub fn insert(&mut self, key: i64) -> &Node {
        let count = self.occurrences(key) + 1;
        let (root, fresh) = Avl::do_insert(self.root.take(), key, self.duplicates);
        self.root = Some(root);
        if fresh {
            self.n_count += 1;
        } else if self.duplicates == Duplicates::Replicated {
            self.update_count_for_same_keys(key, count);
        }

        match self.find(key) {
            Some(node) => node,
            None => panic!("insert(): key {} lost, call the programmer", key),
        }
    }

    /// Delete one occurrence of `key` from this instance. If key is not
    /// present return [`AvlError::KeyNotFound`] and leave the tree as is.
    ///
    /// When more than one occurrence is present the node stays and only
    /// its count drops, [`Deleted::Decremented`]. Otherwise the key leaves
    /// the tree and is handed back as [`Deleted::Removed`].
    pub fn delete(&mut self, key: i64) -> Result<Deleted, AvlError> {
        if self.find(key).is_none() {
            return Err(AvlError::KeyNotFound(key));
        }

        let (root, deleted) = Avl::do_delete(self.root.take(), key, false);
        self.root = root;
        match deleted {
            Some(Deleted::Decremented { key, count }) => {
                if self.duplicates == Duplicates::Replicated {
                    self.update_count_for_same_keys(key, count);
                }
                Ok(Deleted::Decremented { key, count })
            }
            Some(removed @ Deleted::Removed(_)) => {
                self.n_count -= 1;
                if self.duplicates == Duplicates::Replicated {
                    self.purge_replicas(key);
                }
                Ok(removed)
            }
            None => panic!("delete(): key {} vanished, call the programmer", key),
        }
    }

    /// Validate AVL tree with following rules:
    ///
    /// * Balance factor of every node is -1, 0 or 1.
    /// * Cached height of every node matches its subtree.
    /// * Every node counts at least one occurrence, and replicas of a key
    ///   agree on the count.
    /// * Make sure keys are in sorted order, strictly so unless
    ///   duplicates are [`Duplicates::Replicated`].
    /// * Number of distinct keys matches [`Avl::len`].
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, AvlError> {
        let mut stats = Stats::new(self.n_count, mem::size_of::<Node>());
        let mut depths = Depth::new();
        let (height, nodes) = Avl::validate_tree(self.root(), 0, &mut depths)?;

        let (mut prev, mut found): (Option<(i64, usize)>, usize) = (None, 0);
        for (key, count) in self.iter() {
            match prev {
                Some((pkey, _)) if key < pkey => return Err(AvlError::SortError(pkey, key)),
                Some((pkey, _)) if key == pkey && self.duplicates == Duplicates::Counted => {
                    return Err(AvlError::DuplicateNode(key));
                }
                Some((pkey, pcount)) if key == pkey && count != pcount => {
                    let counts = (pcount, count);
                    return Err(AvlError::CountMismatch { key, counts });
                }
                Some((pkey, _)) if key == pkey => (),
                _ => found += 1,
            }
            prev = Some((key, count));
        }
        if found != self.n_count {
            let entries = self.n_count;
            return Err(AvlError::EntryMismatch { entries, found });
        }

        stats.set_nodes(nodes);
        stats.set_height(height);
        stats.set_depths(depths);
        Ok(stats)
    }
}

/// Read operations on Avl instance.
impl Avl {
    /// Get the node holding key.
    pub fn find(&self, key: i64) -> Option<&Node> {
        let mut node = self.root();
        while let Some(nref) = node {
            node = match nref.key.cmp(&key) {
                Ordering::Less => nref.right(),
                Ordering::Greater => nref.left(),
                Ordering::Equal => return Some(nref),
            };
        }
        None
    }

    /// Return how many times key is present, 0 when absent.
    pub fn occurrences(&self, key: i64) -> usize {
        self.find(key).map_or(0, Node::count)
    }

    /// Get the node holding the smallest key.
    pub fn min(&self) -> Option<&Node> {
        let mut node = self.root()?;
        while let Some(left) = node.left() {
            node = left;
        }
        Some(node)
    }

    /// Get the node holding the largest key.
    pub fn max(&self) -> Option<&Node> {
        let mut node = self.root()?;
        while let Some(right) = node.right() {
            node = right;
        }
        Some(node)
    }

    /// Return the depth of the deepest leaf, root is at depth 0. An empty
    /// tree has depth -1.
    pub fn depth(&self) -> isize {
        node::height(self.root()) as isize - 1
    }

    /// Return the height of subtree rooted at `node`, 0 for no node.
    pub fn height(node: Option<&Node>) -> usize {
        node::height(node)
    }

    /// Return height of left subtree minus height of right subtree,
    /// 0 for no node.
    pub fn balance(node: Option<&Node>) -> isize {
        node.map_or(0, Node::balance)
    }

    /// Return an iterator over all (key, count) entries, in sort order.
    pub fn iter(&self) -> Iter {
        Iter::new(self.root())
    }

    /// Print every (key, count) entry in sort order, on a single line.
    /// Refer to the [`Display`](fmt::Display) implementation for the
    /// format.
    pub fn print(&self) {
        print!("{}", self)
    }
}

impl Avl {
    fn do_insert(node: Option<Box<Node>>, key: i64, duplicates: Duplicates) -> Insert {
        let mut node = match node {
            None => return (Node::new(key), true),
            Some(node) => node,
        };

        let fresh = match key.cmp(&node.key) {
            Ordering::Less => {
                let (left, fresh) = Avl::do_insert(node.left.take(), key, duplicates);
                node.left = Some(left);
                fresh
            }
            Ordering::Greater => {
                let (right, fresh) = Avl::do_insert(node.right.take(), key, duplicates);
                node.right = Some(right);
                fresh
            }
            Ordering::Equal => {
                node.count += 1;
                if duplicates == Duplicates::Replicated {
                    let (right, _) = Avl::do_insert(node.right.take(), key, duplicates);
                    node.right = Some(right);
                }
                false
            }
        };
        (Avl::rebalance(key, node), fresh)
    }

    // With `unlink` the matching node goes irrespective of its count.
    fn do_delete(node: Option<Box<Node>>, key: i64, unlink: bool) -> Delete {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };

        let deleted = match key.cmp(&node.key) {
            Ordering::Less => {
                let (left, deleted) = Avl::do_delete(node.left.take(), key, unlink);
                node.left = left;
                deleted
            }
            Ordering::Greater => {
                let (right, deleted) = Avl::do_delete(node.right.take(), key, unlink);
                node.right = right;
                deleted
            }
            Ordering::Equal if node.count > 1 && !unlink => {
                node.count -= 1;
                Some(Deleted::Decremented {
                    key,
                    count: node.count,
                })
            }
            Ordering::Equal => {
                let removed = Deleted::Removed(node.clone_detach());
                match (node.left.take(), node.right.take()) {
                    (None, None) => return (None, Some(removed)),
                    (Some(child), None) | (None, Some(child)) => {
                        return (Some(child), Some(removed));
                    }
                    (Some(left), Some(right)) => {
                        // predecessor moves up, count and all.
                        let (left, pred) = Avl::delete_max(left);
                        node.key = pred.key;
                        node.count = pred.count;
                        node.left = left;
                        node.right = Some(right);
                        Some(removed)
                    }
                }
            }
        };
        (Some(Avl::rebalance(key, node)), deleted)
    }

    fn delete_max(mut node: Box<Node>) -> Delmax {
        match node.right.take() {
            None => (node.left.take(), node),
            Some(right) => {
                let (right, max) = Avl::delete_max(right);
                node.right = right;
                (Some(Avl::rebalance(max.key, node)), max)
            }
        }
    }

    // Replicas can outlive the last occurrence of their key, unlink them.
    fn purge_replicas(&mut self, key: i64) {
        let mut purged = 0;
        while self.find(key).is_some() {
            let (root, _) = Avl::do_delete(self.root.take(), key, true);
            self.root = root;
            purged += 1;
        }
        if purged > 0 {
            debug!("{}: purged {} replica(s) of key {}", self.name, purged, key);
        }
    }

    // Equal keys are contiguous in sort order, so once the walk meets key
    // the remaining replicas can sit under either child.
    fn update_count_for_same_keys(&mut self, key: i64, count: usize) {
        let mut touched = 0;
        let mut stack: Vec<&mut Node> = vec![];
        stack.extend(self.root.as_mut().map(DerefMut::deref_mut));
        while let Some(nref) = stack.pop() {
            let Node {
                key: nkey,
                count: ncount,
                left,
                right,
                ..
            } = nref;
            match key.cmp(nkey) {
                Ordering::Less => stack.extend(left.as_mut().map(DerefMut::deref_mut)),
                Ordering::Greater => stack.extend(right.as_mut().map(DerefMut::deref_mut)),
                Ordering::Equal => {
                    *ncount = count;
                    touched += 1;
                    stack.extend(left.as_mut().map(DerefMut::deref_mut));
                    stack.extend(right.as_mut().map(DerefMut::deref_mut));
                }
            }
        }
        trace!("{}: key {} count {} on {} node(s)", self.name, key, count, touched);
    }

    fn validate_tree(
        node: Option<&Node>,
        depth: usize,
        depths: &mut Depth,
    ) -> Result<(usize, usize), AvlError> {
        let node = match node {
            None => return Ok((0, 0)),
            Some(node) => node,
        };

        if node.count == 0 {
            return Err(AvlError::ZeroCount(node.key));
        }
        let (lheight, lnodes) = Avl::validate_tree(node.left(), depth + 1, depths)?;
        let (rheight, rnodes) = Avl::validate_tree(node.right(), depth + 1, depths)?;
        let height = 1 + cmp::max(lheight, rheight);
        if height != node.height {
            let (key, cached, actual) = (node.key, node.height, height);
            return Err(AvlError::HeightMismatch {
                key,
                cached,
                actual,
            });
        }
        let balance = lheight as isize - rheight as isize;
        if balance.abs() > 1 {
            let key = node.key;
            return Err(AvlError::Unbalanced { key, balance });
        }
        if lheight == 0 && rheight == 0 {
            depths.sample(depth);
        }
        Ok((height, 1 + lnodes + rnodes))
    }

    //--------- rotation routines ----------------

    fn rebalance(key: i64, mut node: Box<Node>) -> Box<Node> {
        node.update_height();
        let balance = node.balance();
        if balance > 1 {
            if Avl::left_shape(key, &node) == Shape::Inner {
                node.left = node.left.take().map(Avl::rotate_left);
            }
            Avl::rotate_right(node)
        } else if balance < -1 {
            if Avl::right_shape(key, &node) == Shape::Inner {
                node.right = node.right.take().map(Avl::rotate_right);
            }
            Avl::rotate_left(node)
        } else {
            node
        }
    }

    // Shape of a left-heavy node, routed by the key that went in or out
    // beneath it.
    fn left_shape(key: i64, node: &Node) -> Shape {
        match node.left() {
            Some(pivot) => {
                let routed = if key < pivot.key || key == node.key {
                    Shape::Outer
                } else {
                    Shape::Inner
                };
                let inner = pivot.right().map(Node::balance);
                Avl::settle(key, routed, pivot.balance(), inner)
            }
            None => Shape::Outer,
        }
    }

    fn right_shape(key: i64, node: &Node) -> Shape {
        match node.right() {
            Some(pivot) => {
                let routed = if key > pivot.key || key == node.key {
                    Shape::Outer
                } else {
                    Shape::Inner
                };
                let inner = pivot.left().map(|grand| -grand.balance());
                Avl::settle(key, routed, -pivot.balance(), inner)
            }
            None => Shape::Outer,
        }
    }

    // Keep the routed shape unless its rotation would leave the subtree
    // out of balance. `lean` is the pivot's balance factor and `inner` the
    // inner grandchild's, both measured towards the outer side.
    //
    // * Outer needs a pivot that does not lean inward.
    // * Inner needs a pivot that leans inward, or a level pivot whose
    //   inner grandchild does not lean inward, since that grandchild's
    //   outer half ends up next to the pivot's taller outer child.
    fn settle(key: i64, routed: Shape, lean: isize, inner: Option<isize>) -> Shape {
        let shape = match routed {
            Shape::Outer if lean >= 0 => Shape::Outer,
            Shape::Outer => Shape::Inner,
            Shape::Inner if lean < 0 => Shape::Inner,
            Shape::Inner if lean == 0 && inner.map_or(false, |g| g >= 0) => Shape::Inner,
            Shape::Inner => Shape::Outer,
        };
        if shape != routed {
            debug!(
                "rebalance(): key {} routed {:?}, pivot leans {}, taking {:?}",
                key, routed, lean, shape
            );
        }
        shape
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    \                    /   \
    //           left    x                node    xr
    //                  / \               /  \
    //                xl   xr          left   xl
    //
    fn rotate_left(mut node: Box<Node>) -> Box<Node> {
        let mut x = match node.right.take() {
            Some(x) => x,
            None => panic!("rotate_left(): no right child ? Call the programmer"),
        };
        trace!("rotate_left(): {} over {}", x.key, node.key);
        node.right = x.left.take();
        node.update_height();
        x.left = Some(node);
        x.update_height();
        x
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    \                    /   \
    //            x    right               xl    node
    //           / \                             /  \
    //         xl   xr                          xr  right
    //
    fn rotate_right(mut node: Box<Node>) -> Box<Node> {
        let mut x = match node.left.take() {
            Some(x) => x,
            None => panic!("rotate_right(): no left child ? Call the programmer"),
        };
        trace!("rotate_right(): {} over {}", x.key, node.key);
        node.left = x.right.take();
        node.update_height();
        x.right = Some(node);
        x.update_height();
        x
    }
}

/// Which side of the pivot child an imbalance sits on.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Shape {
    Outer, // left-left or right-right, single rotation.
    Inner, // left-right or right-left, double rotation.
}

/// Render each entry as `<key>,<count>` followed by two spaces, and end
/// the line with a newline. An empty tree renders as a bare newline.
impl fmt::Display for Avl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (key, count) in self.iter() {
            write!(f, "{},{}  ", key, count)?;
        }
        writeln!(f)
    }
}

/// In-order iterator over (key, count) entries of an [`Avl`] instance.
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn new(root: Option<&'a Node>) -> Iter<'a> {
        let mut iter = Iter { stack: vec![] };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut node: Option<&'a Node>) {
        while let Some(nref) = node {
            self.stack.push(nref);
            node = nref.left();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (i64, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right());
        Some((node.key, node.count))
    }
}

/// Statistics on [`Avl`] tree. Serves two purpose:
///
/// * To get partial but quick statistics via [`Avl::stats`] method.
/// * To get full statisics via [`Avl::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of distinct keys in the tree.
    node_size: usize,
    nodes: Option<usize>,
    height: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            nodes: Default::default(),
            height: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_nodes(&mut self, nodes: usize) {
        self.nodes = Some(nodes)
    }

    #[inline]
    fn set_height(&mut self, height: usize) {
        self.height = Some(height)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number of distinct keys in [`Avl`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including over-head for `Avl`. EG:
    ///
    /// ```
    /// use avl_index::Avl;
    /// let avl = Avl::new("myinstance");
    ///
    /// // key, count and height: 24 bytes
    /// // left and right child: 16 bytes
    /// assert_eq!(avl.stats().node_size(), 40);
    /// ```
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return number of physical nodes in the tree. Differs from
    /// entries() only with [`Duplicates::Replicated`].
    #[inline]
    pub fn nodes(&self) -> Option<usize> {
        self.nodes
    }

    /// Return height of the tree, 0 for an empty tree.
    #[inline]
    pub fn height(&self) -> Option<usize> {
        self.height
    }

    /// Return [`Depth`] statistics.
    pub fn depths(&self) -> Option<Depth> {
        self.depths.as_ref().filter(|d| d.samples() > 0).cloned()
    }
}
