//! Forest builder: joins clade structure with cell metadata.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::LineageArena;
use crate::domain::entities::{Cell, CladeSpec, Forest, Phylogeny};
use crate::domain::error::{DomainError, DomainResult};

/// Constructs an immutable [`Forest`] from clade structures and cell metadata.
///
/// Cells are registered first, then each phylogeny is added; every clade
/// takes the cell whose id equals the clade name. A clade without metadata
/// is kept without a cell.
#[derive(Debug, Default)]
pub struct ForestBuilder {
    cells: HashMap<String, Cell>,
    seen_clades: HashSet<String>,
    channels: Vec<String>,
    phylogenies: Vec<Phylogeny>,
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    /// Register a cell. Must happen before the phylogeny referencing it is added.
    pub fn add_cell(&mut self, cell: Cell) -> DomainResult<()> {
        if self.cells.contains_key(&cell.id) {
            return Err(DomainError::DuplicateCell(cell.id));
        }
        self.cells.insert(cell.id.clone(), cell);
        Ok(())
    }

    pub fn add_cells(&mut self, cells: impl IntoIterator<Item = Cell>) -> DomainResult<()> {
        for cell in cells {
            self.add_cell(cell)?;
        }
        Ok(())
    }

    /// Build the arena for one phylogeny. `root` is None for a tree without a root clade.
    pub fn add_phylogeny(&mut self, name: &str, root: Option<&CladeSpec>) -> DomainResult<()> {
        let mut links = Vec::new();
        if let Some(root) = root {
            let mut stack = vec![(root, None)];
            while let Some((clade, parent)) = stack.pop() {
                links.push((clade.name.as_str(), parent));
                for child in clade.children.iter().rev() {
                    stack.push((child, Some(clade.name.as_str())));
                }
            }
        }
        self.add_lineage(name, links)
    }

    /// Build the arena for one phylogeny from `(clade, parent)` links.
    ///
    /// Exactly one clade has no parent; children keep the order in which
    /// they are listed. An empty list gives a phylogeny without a root clade.
    #[instrument(level = "debug", skip(self, links))]
    pub fn add_lineage<'a>(
        &mut self,
        name: &str,
        links: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> DomainResult<()> {
        let links: Vec<_> = links.into_iter().collect();
        let malformed = |message: String| DomainError::MalformedLineage {
            phylogeny: name.to_string(),
            message,
        };

        let mut listed = HashSet::new();
        for &(clade, _) in &links {
            if !listed.insert(clade) {
                return Err(DomainError::DuplicateClade(clade.to_string()));
            }
        }

        let mut roots = Vec::new();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for &(clade, parent) in &links {
            match parent {
                None => roots.push(clade),
                Some(parent) if listed.contains(parent) => {
                    children.entry(parent).or_default().push(clade)
                }
                Some(parent) => {
                    return Err(malformed(format!(
                        "clade {} names unknown parent {}",
                        clade, parent
                    )))
                }
            }
        }

        let mut lineage = LineageArena::new();
        match roots.as_slice() {
            [] if links.is_empty() => {}
            [] => return Err(malformed("no root clade, parents form a cycle".to_string())),
            [root] => {
                let mut stack = vec![(*root, None)];
                while let Some((clade, parent_idx)) = stack.pop() {
                    if !self.seen_clades.insert(clade.to_string()) {
                        return Err(DomainError::DuplicateClade(clade.to_string()));
                    }
                    let cell = self.cells.remove(clade);
                    if cell.is_none() {
                        debug!("clade without cell metadata: {}", clade);
                    }
                    let current_idx = lineage.insert_clade(clade, cell, parent_idx);

                    // Reverse so children keep listed order in the arena
                    for &child in children.get(clade).into_iter().flatten().rev() {
                        stack.push((child, Some(current_idx)));
                    }
                }
            }
            _ => return Err(malformed(format!("{} root clades", roots.len()))),
        }

        if lineage.len() < links.len() {
            return Err(malformed(format!(
                "{} clades unreachable from root {}, parents form a cycle",
                links.len() - lineage.len(),
                roots[0]
            )));
        }

        debug!("phylogeny {}: {} clades", name, lineage.len());
        self.phylogenies.push(Phylogeny::new(name, lineage));
        Ok(())
    }

    pub fn build(self) -> Forest {
        if !self.cells.is_empty() {
            debug!("{} cells not attached to any clade", self.cells.len());
        }
        Forest::new(self.phylogenies, self.channels)
    }
}
