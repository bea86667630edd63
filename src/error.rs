use thiserror::Error;

/// AvlError enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, PartialEq, Error)]
pub enum AvlError {
    /// Returned by delete() API when key is not present.
    #[error("key {0} not found")]
    KeyNotFound(i64),
    /// Fatal case, a node's balance factor is outside {-1, 0, 1}.
    #[error("node {key} out of balance, balance factor {balance}")]
    Unbalanced { key: i64, balance: isize },
    /// Fatal case, cached height disagrees with the subtree.
    #[error("node {key} caches height {cached}, subtree height is {actual}")]
    HeightMismatch {
        key: i64,
        cached: usize,
        actual: usize,
    },
    /// Fatal case, index entries are not in sort-order.
    #[error("keys out of order, {0} before {1}")]
    SortError(i64, i64),
    /// Fatal case, key held by more than one node in a counted index.
    #[error("key {0} held by more than one node")]
    DuplicateNode(i64),
    /// Fatal case, two replicas of a key disagree on its count.
    #[error("replicas of key {key} count {counts:?}")]
    CountMismatch { key: i64, counts: (usize, usize) },
    /// Fatal case, node left behind with nothing to count.
    #[error("node {0} has zero count")]
    ZeroCount(i64),
    /// Fatal case, distinct-key count does not match the tree.
    #[error("index counts {entries} distinct keys, tree holds {found}")]
    EntryMismatch { entries: usize, found: usize },
}
