use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use tracing::trace;

use crate::error::{DbError, Result};
use crate::model::SlotId;

/// Slot ids sharing one key, in insertion order. Never empty inside a tree.
pub type Bucket = SmallVec<[SlotId; 2]>;

type Link<K> = Option<Box<AvlNode<K>>>;

#[derive(Debug, Clone)]
struct AvlNode<K> {
    key: K,
    bucket: Bucket,
    height: u32,
    left: Link<K>,
    right: Link<K>,
}

fn height<K>(link: &Link<K>) -> u32 {
    link.as_ref().map_or(0, |node| node.height)
}

impl<K> AvlNode<K> {
    fn leaf(key: K, id: SlotId) -> Box<Self> {
        let mut bucket = Bucket::new();
        bucket.push(id);
        Box::new(Self {
            key,
            bucket,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

fn rotate_right<K>(mut node: Box<AvlNode<K>>) -> Box<AvlNode<K>> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update_height();
            pivot.right = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rotate_left<K>(mut node: Box<AvlNode<K>>) -> Box<AvlNode<K>> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update_height();
            pivot.left = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

/// Restores the height and balance of `node`, whose subtrees are already
/// valid AVL trees differing in height by at most two.
fn rebalance<K>(mut node: Box<AvlNode<K>>) -> Box<AvlNode<K>> {
    node.update_height();
    let balance = node.balance_factor();
    if balance > 1 {
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            trace!("avl left-right rotation");
            node.left = node.left.take().map(rotate_left);
        } else {
            trace!("avl left-left rotation");
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|right| right.balance_factor() > 0) {
            trace!("avl right-left rotation");
            node.right = node.right.take().map(rotate_right);
        } else {
            trace!("avl right-right rotation");
        }
        return rotate_left(node);
    }
    node
}

fn insert_node<K: Ord>(link: Link<K>, key: K, id: SlotId, outcome: &mut Insertion) -> Box<AvlNode<K>> {
    let mut node = match link {
        Some(node) => node,
        None => {
            *outcome = Insertion::NewKey;
            return AvlNode::leaf(key, id);
        }
    };
    match key.cmp(&node.key) {
        Ordering::Less => node.left = Some(insert_node(node.left.take(), key, id, outcome)),
        Ordering::Greater => node.right = Some(insert_node(node.right.take(), key, id, outcome)),
        Ordering::Equal => {
            if !node.bucket.contains(&id) {
                node.bucket.push(id);
                *outcome = Insertion::Appended;
            }
            return node;
        }
    }
    rebalance(node)
}

/// Detaches the minimum node of a subtree, returning the rebalanced rest.
fn take_min<K>(mut node: Box<AvlNode<K>>) -> (Link<K>, Box<AvlNode<K>>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn delete_node<K: Ord>(link: Link<K>, key: &K, id: SlotId, outcome: &mut Removal) -> Link<K> {
    let mut node = link?;
    match key.cmp(&node.key) {
        Ordering::Less => node.left = delete_node(node.left.take(), key, id, outcome),
        Ordering::Greater => node.right = delete_node(node.right.take(), key, id, outcome),
        Ordering::Equal => {
            let Some(pos) = node.bucket.iter().position(|&slot| slot == id) else {
                return Some(node);
            };
            node.bucket.remove(pos);
            if !node.bucket.is_empty() {
                *outcome = Removal::IdRemoved;
                return Some(node);
            }
            *outcome = Removal::KeyRemoved;
            return match (node.left.take(), node.right.take()) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    let (rest, mut successor) = take_min(right);
                    successor.left = Some(left);
                    successor.right = rest;
                    Some(rebalance(successor))
                }
            };
        }
    }
    Some(rebalance(node))
}

fn collect_range<K: Ord>(link: &Link<K>, low: &K, high: &K, out: &mut Vec<SlotId>) {
    let Some(node) = link else {
        return;
    };
    if node.key > *low {
        collect_range(&node.left, low, high, out);
    }
    if node.key >= *low && node.key <= *high {
        out.extend_from_slice(&node.bucket);
    }
    if node.key < *high {
        collect_range(&node.right, low, high, out);
    }
}

fn verify_node<K: Ord + fmt::Debug>(
    node: &AvlNode<K>,
    lower: Option<&K>,
    upper: Option<&K>,
) -> Result<u32> {
    if node.bucket.is_empty() {
        return Err(DbError::InvariantViolation(format!(
            "empty bucket for key {:?}",
            node.key
        )));
    }
    if lower.is_some_and(|lower| node.key <= *lower) || upper.is_some_and(|upper| node.key >= *upper) {
        return Err(DbError::InvariantViolation(format!(
            "key {:?} is out of order",
            node.key
        )));
    }
    let left = match &node.left {
        Some(child) => verify_node(child, lower, Some(&node.key))?,
        None => 0,
    };
    let right = match &node.right {
        Some(child) => verify_node(child, Some(&node.key), upper)?,
        None => 0,
    };
    if left.abs_diff(right) > 1 {
        return Err(DbError::InvariantViolation(format!(
            "key {:?} has balance factor {}",
            node.key,
            i64::from(left) - i64::from(right)
        )));
    }
    let expected = 1 + left.max(right);
    if node.height != expected {
        return Err(DbError::InvariantViolation(format!(
            "key {:?} stores height {} but has height {}",
            node.key, node.height, expected
        )));
    }
    Ok(expected)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Insertion {
    Duplicate,
    Appended,
    NewKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Missing,
    IdRemoved,
    KeyRemoved,
}

/// AVL tree mapping one attribute's values to the slots holding them.
///
/// Each key owns a non-empty bucket of slot ids; a key's node is destroyed as
/// soon as its last id is deleted.
#[derive(Debug, Clone)]
pub struct AvlIndex<K> {
    root: Link<K>,
    keys: usize,
    entries: usize,
}

impl<K: Ord> AvlIndex<K> {
    /// Empty tree.
    pub fn new() -> Self {
        Self {
            root: None,
            keys: 0,
            entries: 0,
        }
    }

    /// Ids stored under `key`, empty if the key is absent.
    pub fn search(&self, key: &K) -> &[SlotId] {
        let mut current = &self.root;
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Less => current = &node.left,
                Ordering::Greater => current = &node.right,
                Ordering::Equal => return &node.bucket,
            }
        }
        &[]
    }

    /// Whether `key` has at least one id.
    pub fn contains_key(&self, key: &K) -> bool {
        !self.search(key).is_empty()
    }

    /// Adds `id` under `key`. Returns false if the pair was already present.
    pub fn insert(&mut self, key: K, id: SlotId) -> bool {
        let mut outcome = Insertion::Duplicate;
        self.root = Some(insert_node(self.root.take(), key, id, &mut outcome));
        match outcome {
            Insertion::Duplicate => false,
            Insertion::Appended => {
                self.entries += 1;
                true
            }
            Insertion::NewKey => {
                self.keys += 1;
                self.entries += 1;
                true
            }
        }
    }

    /// Removes `id` from `key`'s bucket, dropping the key when the bucket
    /// empties. Returns false if the pair was not present.
    pub fn delete(&mut self, key: &K, id: SlotId) -> bool {
        let mut outcome = Removal::Missing;
        self.root = delete_node(self.root.take(), key, id, &mut outcome);
        match outcome {
            Removal::Missing => false,
            Removal::IdRemoved => {
                self.entries -= 1;
                true
            }
            Removal::KeyRemoved => {
                self.keys -= 1;
                self.entries -= 1;
                true
            }
        }
    }

    /// Ids for every key in `[low, high]`, in ascending key order.
    /// An inverted range yields nothing; callers validate bounds first.
    pub fn range(&self, low: &K, high: &K) -> Vec<SlotId> {
        let mut out = Vec::new();
        if low <= high {
            collect_range(&self.root, low, high, &mut out);
        }
        out
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys
    }

    /// Number of (key, id) pairs across all buckets.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// True when no key is stored.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the root, `0` for an empty tree.
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    /// Smallest key.
    pub fn min_key(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.key)
    }

    /// Largest key.
    pub fn max_key(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.key)
    }

    /// In-order iteration over `(key, bucket)` pairs.
    pub fn iter(&self) -> Iter<'_, K> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Drops every key and id.
    pub fn clear(&mut self) {
        self.root = None;
        self.keys = 0;
        self.entries = 0;
    }
}

impl<K: Ord + fmt::Debug> AvlIndex<K> {
    /// Checks balance, stored heights, strict key order, bucket
    /// non-emptiness and the cached counters.
    pub fn verify(&self) -> Result<()> {
        if let Some(root) = &self.root {
            verify_node(root, None, None)?;
        }
        let (keys, entries) = self
            .iter()
            .fold((0, 0), |(keys, entries), (_, bucket)| (keys + 1, entries + bucket.len()));
        if keys != self.keys || entries != self.entries {
            return Err(DbError::InvariantViolation(format!(
                "counters report {} keys / {} entries, tree holds {keys} / {entries}",
                self.keys, self.entries
            )));
        }
        Ok(())
    }
}

impl<K: Ord> Default for AvlIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator returned by [`AvlIndex::iter`].
pub struct Iter<'a, K> {
    stack: Vec<&'a AvlNode<K>>,
}

impl<'a, K> Iter<'a, K> {
    fn push_left(&mut self, mut node: Option<&'a AvlNode<K>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (&'a K, &'a [SlotId]);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, node.bucket.as_slice()))
    }
}
