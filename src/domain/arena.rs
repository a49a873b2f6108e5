use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

use crate::domain::entities::Cell;

/// Clade node in the arena-based lineage structure.
#[derive(Debug)]
pub struct CladeNode {
    /// Clade name, also the key used to join cell metadata
    pub name: String,
    /// Cell associated with this clade, None if no metadata was found
    pub cell: Option<Cell>,
    /// Indices of child clades in declared order
    pub children: Vec<Index>,
}

impl fmt::Display for CladeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Arena-based tree structure holding one phylogeny.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Once built the arena is never mutated, so any number of traversals may run
/// over it at the same time.
#[derive(Debug)]
pub struct LineageArena {
    /// Arena storage for all clade nodes
    arena: Arena<CladeNode>,
    /// Index of the root clade, None for empty trees
    root: Option<Index>,
}

impl Default for LineageArena {
    fn default() -> Self {
        Self::new()
    }
}

impl LineageArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self, cell))]
    pub fn insert_clade(&mut self, name: &str, cell: Option<Cell>, parent: Option<Index>) -> Index {
        let node = CladeNode {
            name: name.to_string(),
            cell,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_clade(&self, idx: Index) -> Option<&CladeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Depth-first traversal of the whole tree, starting at the root.
    pub fn iter(&self) -> LineageIter<'_> {
        LineageIter::new(self, self.root)
    }

    /// Depth-first traversal of the subtree rooted at `start`, `start` first.
    pub fn iter_from(&self, start: Index) -> LineageIter<'_> {
        LineageIter::new(self, Some(start))
    }
}

/// Pre-order depth-first iterator over clades.
///
/// Holds only an explicit stack of indices, so deep skewed lineages do not
/// recurse and every call to [`LineageArena::iter`] starts a fresh walk.
pub struct LineageIter<'a> {
    arena: &'a LineageArena,
    stack: Vec<Index>,
}

impl<'a> LineageIter<'a> {
    fn new(arena: &'a LineageArena, start: Option<Index>) -> Self {
        let mut stack = Vec::new();
        if let Some(start) = start {
            stack.push(start);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for LineageIter<'a> {
    type Item = (Index, &'a CladeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_clade(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
