//! Domain entities: core data structures

use std::collections::BTreeMap;

use generational_arena::Index;

use crate::domain::arena::{CladeNode, LineageArena};

/// Unit of analysis: one measured cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    /// Cell identifier, matches the name of the clade it belongs to
    pub id: String,
    /// Fluorescence intensity per channel name (e.g. "yfp", "cfp")
    pub fluorescences: BTreeMap<String, f64>,
    /// Cell length
    pub length: Option<f64>,
    /// Cell area
    pub area: Option<f64>,
    /// Time point of the measurement
    pub time: Option<f64>,
}

impl Cell {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_fluorescence(mut self, channel: impl Into<String>, intensity: f64) -> Self {
        self.fluorescences.insert(channel.into(), intensity);
        self
    }

    /// Intensity for `channel` by exact name. An absent channel is `None`, never zero.
    pub fn fluorescence(&self, channel: &str) -> Option<f64> {
        self.fluorescences.get(channel).copied()
    }
}

/// Structural description of a clade and its descendants, before cells are joined in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CladeSpec {
    pub name: String,
    pub children: Vec<CladeSpec>,
}

impl CladeSpec {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<CladeSpec>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

/// One lineage tree.
#[derive(Debug, Default)]
pub struct Phylogeny {
    pub name: String,
    lineage: LineageArena,
}

impl Phylogeny {
    pub fn new(name: impl Into<String>, lineage: LineageArena) -> Self {
        Self {
            name: name.into(),
            lineage,
        }
    }

    pub fn lineage(&self) -> &LineageArena {
        &self.lineage
    }

    /// Handle to the root clade, None for a phylogeny without one.
    pub fn root(&self) -> Option<CladeRef<'_>> {
        self.lineage.root().map(|idx| CladeRef {
            phylogeny: self,
            idx,
        })
    }
}

/// Top-level collection of all lineage trees of one experiment.
#[derive(Debug, Default)]
pub struct Forest {
    /// Phylogenies in load order
    phylogenies: Vec<Phylogeny>,
    /// Channel names declared by the metadata
    channels: Vec<String>,
}

impl Forest {
    pub fn new(phylogenies: Vec<Phylogeny>, channels: Vec<String>) -> Self {
        Self {
            phylogenies,
            channels,
        }
    }

    pub fn phylogenies(&self) -> &[Phylogeny] {
        &self.phylogenies
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.phylogenies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phylogenies.is_empty()
    }
}

/// Borrowed handle to a clade inside a phylogeny.
#[derive(Debug, Clone, Copy)]
pub struct CladeRef<'a> {
    pub(crate) phylogeny: &'a Phylogeny,
    pub(crate) idx: Index,
}

impl<'a> CladeRef<'a> {
    pub fn phylogeny(&self) -> &'a Phylogeny {
        self.phylogeny
    }

    pub fn index(&self) -> Index {
        self.idx
    }

    pub(crate) fn node(&self) -> Option<&'a CladeNode> {
        self.phylogeny.lineage.get_clade(self.idx)
    }
}

/// Borrowed handle to a cell together with the clade that carries it.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    pub(crate) clade: CladeRef<'a>,
    pub(crate) cell: &'a Cell,
}

impl<'a> CellRef<'a> {
    pub fn cell(&self) -> &'a Cell {
        self.cell
    }

    pub fn clade(&self) -> CladeRef<'a> {
        self.clade
    }
}
