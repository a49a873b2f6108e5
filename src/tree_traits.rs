//! Rendering lineages as text trees.

use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{CladeNode, CountOptions, Forest, Phylogeny};

pub trait LineageTreeConvert {
    /// Text tree labelled with each cell's intensity for the configured channel.
    fn to_tree_string(&self, options: &CountOptions) -> Tree<String>;
}

fn label(node: &CladeNode, options: &CountOptions) -> String {
    match &node.cell {
        None => format!("{} (no cell)", node.name),
        Some(cell) => match cell.fluorescence(options.channel()) {
            Some(v) if v > options.threshold() => {
                format!("{} ({}={:?} *)", node.name, options.channel(), v)
            }
            Some(v) => format!("{} ({}={:?})", node.name, options.channel(), v),
            None => format!("{} ({}=n/a)", node.name, options.channel()),
        },
    }
}

impl LineageTreeConvert for Phylogeny {
    #[instrument(level = "debug", skip_all, fields(phylogeny = %self.name))]
    fn to_tree_string(&self, options: &CountOptions) -> Tree<String> {
        let lineage = self.lineage();
        let Some(root_idx) = lineage.root() else {
            return Tree::new(format!("{}: empty", self.name));
        };

        // Assemble bottom-up: in reverse pre-order every child is done before its parent
        let order: Vec<_> = lineage.iter().collect();
        let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(order.len());
        for (idx, node) in order.into_iter().rev() {
            let text = if idx == root_idx {
                format!("{}: {}", self.name, label(node, options))
            } else {
                label(node, options)
            };
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(idx, Tree::new(text).with_leaves(leaves));
        }

        built
            .remove(&root_idx)
            .unwrap_or_else(|| Tree::new(format!("{}: empty", self.name)))
    }
}

impl LineageTreeConvert for Forest {
    fn to_tree_string(&self, options: &CountOptions) -> Tree<String> {
        let leaves: Vec<_> = self
            .phylogenies()
            .iter()
            .map(|p| p.to_tree_string(options))
            .collect();
        Tree::new(format!("forest ({} phylogenies)", self.len())).with_leaves(leaves)
    }
}
