//! Read-only model boundary consumed by the intensity counter
//!
//! The counter depends only on these traits, so any tree/metadata source can
//! be plugged in. The arena model in this crate is one implementation.

use crate::domain::entities::{CellRef, CladeRef, Forest, Phylogeny};
use crate::domain::error::{DomainError, DomainResult};

/// A measured cell that can walk its own lineage.
pub trait CellView: Sized {
    /// Cell identifier.
    fn id(&self) -> &str;

    /// Intensity for `channel`, `None` if the cell has no such channel.
    fn fluorescence(&self, channel: &str) -> Option<f64>;

    /// Depth-first walk yielding this cell first, then all descendants.
    ///
    /// Finite, and every call starts a new walk. A descendant clade without a
    /// cell yields an error item.
    fn lineage(&self) -> impl Iterator<Item = DomainResult<Self>>;
}

/// A structural tree node.
pub trait CladeView {
    type Cell: CellView;

    fn name(&self) -> &str;

    /// Cell associated with this clade.
    fn cell_object(&self) -> Option<Self::Cell>;
}

/// One rooted tree.
pub trait PhylogenyView {
    type Clade<'a>: CladeView
    where
        Self: 'a;

    fn name(&self) -> &str;

    fn root_clade(&self) -> Option<Self::Clade<'_>>;
}

/// Ordered collection of phylogenies.
pub trait ForestView {
    type Phylogeny: PhylogenyView;

    /// Phylogenies in load order.
    fn phylogenies(&self) -> &[Self::Phylogeny];

    /// Channel names declared by the data source, empty if unknown.
    fn channels(&self) -> &[String] {
        &[]
    }
}

// ============================================================
// ARENA MODEL IMPLEMENTATIONS
// ============================================================

impl<'a> CellView for CellRef<'a> {
    fn id(&self) -> &str {
        &self.cell.id
    }

    fn fluorescence(&self, channel: &str) -> Option<f64> {
        self.cell.fluorescence(channel)
    }

    fn lineage(&self) -> impl Iterator<Item = DomainResult<Self>> {
        let phylogeny = self.clade.phylogeny;
        phylogeny
            .lineage()
            .iter_from(self.clade.idx)
            .map(move |(idx, node)| {
                let clade = CladeRef { phylogeny, idx };
                node.cell
                    .as_ref()
                    .map(|cell| CellRef { clade, cell })
                    .ok_or_else(|| DomainError::MissingCell {
                        phylogeny: phylogeny.name.clone(),
                        clade: node.name.clone(),
                    })
            })
    }
}

impl<'a> CladeView for CladeRef<'a> {
    type Cell = CellRef<'a>;

    fn name(&self) -> &str {
        self.node().map(|node| node.name.as_str()).unwrap_or_default()
    }

    fn cell_object(&self) -> Option<CellRef<'a>> {
        let clade = *self;
        self.node()
            .and_then(|node| node.cell.as_ref())
            .map(|cell| CellRef { clade, cell })
    }
}

impl PhylogenyView for Phylogeny {
    type Clade<'a>
        = CladeRef<'a>
    where
        Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn root_clade(&self) -> Option<CladeRef<'_>> {
        self.root()
    }
}

impl ForestView for Forest {
    type Phylogeny = Phylogeny;

    fn phylogenies(&self) -> &[Phylogeny] {
        Forest::phylogenies(self)
    }

    fn channels(&self) -> &[String] {
        Forest::channels(self)
    }
}
