//! Ordered secondary indexes.

mod avl;

pub use avl::{AvlIndex, Bucket, Iter};
