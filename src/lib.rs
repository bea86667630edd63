mod avl;
mod depth;
mod error;
mod node;

pub use crate::avl::{Avl, Deleted, Duplicates, Iter, Stats};
pub use crate::depth::Depth;
pub use crate::error::AvlError;
pub use crate::node::Node;
