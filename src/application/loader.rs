//! Forest loader
//!
//! Reads a tree document (lineage structure) and a metadata document (per-cell
//! measurements) and joins them into a [`Forest`]. Clades are matched to cells
//! by name.
//!
//! Tree document, one flat clade list per phylogeny with parent references:
//! ```json
//! {"phylogenies": [{"name": "colony-1", "clades": [{"name": "1"}, {"name": "2", "parent": "1"}]}]}
//! ```
//!
//! Metadata document:
//! ```json
//! {"channels": ["yfp"], "cells": [{"id": "1", "fluorescences": {"yfp": 3.0}}]}
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, JsonResultExt};
use crate::domain::{Cell, DomainResult, Forest, ForestBuilder};
use crate::infrastructure::traits::FileSystem;

/// Lineage structure of all phylogenies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub phylogenies: Vec<PhylogenyDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhylogenyDocument {
    /// Defaults to `phylogeny-<n>` (1-based position) when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Clades in any order; siblings keep their listed order
    #[serde(default)]
    pub clades: Vec<CladeDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CladeDocument {
    pub name: String,
    /// None for the root clade
    #[serde(default)]
    pub parent: Option<String>,
}

/// Per-cell measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDocument {
    /// Fluorescence channel names recorded in the experiment
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub cells: Vec<CellDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellDocument {
    pub id: String,
    #[serde(default)]
    pub fluorescences: BTreeMap<String, f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub time: Option<f64>,
}

impl From<CellDocument> for Cell {
    fn from(doc: CellDocument) -> Self {
        Cell {
            id: doc.id,
            fluorescences: doc.fluorescences,
            length: doc.length,
            area: doc.area,
            time: doc.time,
        }
    }
}

/// Join parsed documents into a forest, phylogenies in document order.
pub fn assemble(tree: TreeDocument, meta: MetaDocument) -> DomainResult<Forest> {
    let mut builder = ForestBuilder::new().with_channels(meta.channels);
    builder.add_cells(meta.cells.into_iter().map(Cell::from))?;

    for (i, phylogeny) in tree.phylogenies.into_iter().enumerate() {
        let name = phylogeny
            .name
            .unwrap_or_else(|| format!("phylogeny-{}", i + 1));
        let links = phylogeny
            .clades
            .iter()
            .map(|clade| (clade.name.as_str(), clade.parent.as_deref()));
        builder.add_lineage(&name, links)?;
    }

    Ok(builder.build())
}

/// Loads forests from the filesystem.
pub struct ForestLoader {
    fs: Arc<dyn FileSystem>,
}

impl ForestLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, tree_path: &Path, meta_path: &Path) -> ApplicationResult<Forest> {
        let tree: TreeDocument = self.read_document(tree_path)?;
        let meta: MetaDocument = self.read_document(meta_path)?;
        debug!(
            "load: {} phylogenies, {} cells, channels={:?}",
            tree.phylogenies.len(),
            meta.cells.len(),
            meta.channels
        );
        Ok(assemble(tree, meta)?)
    }

    /// Read only the metadata document.
    pub fn load_meta(&self, meta_path: &Path) -> ApplicationResult<MetaDocument> {
        self.read_document(meta_path)
    }

    fn read_document<T: DeserializeOwned>(&self, path: &Path) -> ApplicationResult<T> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::ForestUnavailable(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        serde_json::from_str(&content).with_document_path(path)
    }
}
