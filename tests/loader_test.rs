//! Tests for ForestLoader

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use lineage_fluor::application::loader::{CellDocument, CladeDocument, PhylogenyDocument};
use lineage_fluor::application::{ApplicationError, ForestLoader, MetaDocument, TreeDocument};
use lineage_fluor::domain::{
    count_cells_above, CellView, CladeView, CountOptions, DomainError, PhylogenyView,
};
use lineage_fluor::infrastructure::traits::RealFileSystem;

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/long_term_sos")
        .join(name)
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write document");
    path
}

fn loader() -> ForestLoader {
    ForestLoader::new(Arc::new(RealFileSystem))
}

#[test]
fn given_fixture_documents_when_loading_then_builds_all_phylogenies() {
    // Act
    let forest = loader()
        .load(&resource("tree.json"), &resource("meta.json"))
        .unwrap();

    // Assert
    assert_eq!(forest.len(), 2);
    assert_eq!(forest.channels(), &["yfp".to_string(), "crimson".to_string()]);
    let names: Vec<_> = forest.phylogenies().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["colony-1", "colony-2"]);
    assert_eq!(forest.phylogenies()[0].lineage().len(), 7);
    let order: Vec<_> = forest.phylogenies()[1]
        .lineage()
        .iter()
        .map(|(_, node)| node.name.as_str())
        .collect();
    assert_eq!(order, vec!["10", "11", "12"]);
}

#[test]
fn given_fixture_documents_when_loading_then_joins_measurements() {
    let forest = loader()
        .load(&resource("tree.json"), &resource("meta.json"))
        .unwrap();

    let root = forest.phylogenies()[0]
        .root_clade()
        .and_then(|c| c.cell_object())
        .unwrap();

    assert_eq!(root.id(), "1");
    assert_eq!(root.fluorescence("yfp"), Some(2.1));
    assert_eq!(root.cell().length, Some(2.3));
    assert_eq!(root.cell().time, Some(0.0));

    let six = root
        .lineage()
        .map(|c| c.unwrap())
        .find(|c| c.id() == "6")
        .unwrap();
    assert_eq!(six.fluorescence("yfp"), None);
    assert_eq!(six.fluorescence("crimson"), Some(0.9));
}

#[test]
fn given_missing_tree_file_when_loading_then_forest_unavailable() {
    let result = loader().load(Path::new("/nonexistent/tree.json"), &resource("meta.json"));

    assert!(matches!(result, Err(ApplicationError::ForestUnavailable(p)) if p.ends_with("tree.json")));
}

#[test]
fn given_malformed_json_when_loading_then_invalid_document_names_the_file() {
    let temp = TempDir::new().unwrap();
    let tree = write_file(&temp, "tree.json", r#"{"phylogenies": [ {"clade": "#);
    let meta = write_file(&temp, "meta.json", r#"{"cells": []}"#);

    let result = loader().load(&tree, &meta);

    match result {
        Err(ApplicationError::InvalidDocument { path, message }) => {
            assert_eq!(path, tree);
            assert!(!message.is_empty());
        }
        other => panic!("expected InvalidDocument, got {:?}", other.map(|f| f.len())),
    }
}

#[test]
fn given_string_intensity_when_loading_then_invalid_document() {
    let temp = TempDir::new().unwrap();
    let tree = write_file(&temp, "tree.json", r#"{"phylogenies": []}"#);
    let meta = write_file(
        &temp,
        "meta.json",
        r#"{"cells": [{"id": "1", "fluorescences": {"yfp": "bright"}}]}"#,
    );

    let result = loader().load(&tree, &meta);

    assert!(matches!(result, Err(ApplicationError::InvalidDocument { .. })));
}

#[test]
fn given_clade_listed_twice_when_loading_then_domain_error() {
    let temp = TempDir::new().unwrap();
    let tree = write_file(
        &temp,
        "tree.json",
        r#"{"phylogenies": [
            {"name": "a", "clades": [{"name": "1"}]},
            {"name": "b", "clades": [{"name": "1"}]}
        ]}"#,
    );
    let meta = write_file(&temp, "meta.json", r#"{"cells": [{"id": "1"}]}"#);

    let result = loader().load(&tree, &meta);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::DuplicateClade(name))) if name == "1"
    ));
}

#[test]
fn given_empty_documents_when_loading_then_forest_is_empty() {
    let temp = TempDir::new().unwrap();
    let tree = write_file(&temp, "tree.json", "{}");
    let meta = write_file(&temp, "meta.json", "{}");

    let forest = loader().load(&tree, &meta).unwrap();

    assert!(forest.is_empty());
    assert!(forest.channels().is_empty());
}

#[test]
fn given_metadata_document_when_loading_meta_only_then_lists_channels() {
    let meta = loader().load_meta(&resource("meta.json")).unwrap();

    assert_eq!(meta.channels, vec!["yfp", "crimson"]);
    assert_eq!(meta.cells.len(), 10);
}

#[test]
fn given_clades_listed_before_parents_when_loading_then_keeps_sibling_order() {
    let forest = loader()
        .load(&resource("tree.json"), &resource("meta.json"))
        .unwrap();

    let order: Vec<_> = forest.phylogenies()[0]
        .lineage()
        .iter()
        .map(|(_, node)| node.name.as_str())
        .collect();

    assert_eq!(order, vec!["1", "2", "4", "5", "3", "6", "7"]);
}

#[test]
fn given_deep_skewed_tree_document_when_loading_then_counts_every_generation() {
    // Arrange: one cell per generation, every other one above the threshold
    let generations = 2_000;
    let temp = TempDir::new().unwrap();
    let clades = (0..generations)
        .map(|i| CladeDocument {
            name: format!("g{i}"),
            parent: (i > 0).then(|| format!("g{}", i - 1)),
        })
        .collect();
    let cells = (0..generations)
        .map(|i| CellDocument {
            id: format!("g{i}"),
            fluorescences: [("yfp".to_string(), if i % 2 == 0 { 7.0 } else { 3.0 })].into(),
            ..CellDocument::default()
        })
        .collect();
    let tree = TreeDocument {
        phylogenies: vec![PhylogenyDocument {
            name: Some("deep".to_string()),
            clades,
        }],
    };
    let meta = MetaDocument {
        channels: vec!["yfp".to_string()],
        cells,
    };
    let tree_path = write_file(&temp, "tree.json", &serde_json::to_string(&tree).unwrap());
    let meta_path = write_file(&temp, "meta.json", &serde_json::to_string(&meta).unwrap());

    // Act
    let forest = loader().load(&tree_path, &meta_path).unwrap();
    let report = count_cells_above(&forest, &CountOptions::default()).unwrap();

    // Assert
    assert_eq!(report.cells_visited(), generations);
    assert_eq!(report.total(), generations / 2);
}

#[rstest]
#[case::unknown_parent(r#"[{"name": "1"}, {"name": "2", "parent": "9"}]"#)]
#[case::two_roots(r#"[{"name": "1"}, {"name": "2"}]"#)]
#[case::cycle(r#"[{"name": "1"}, {"name": "2", "parent": "3"}, {"name": "3", "parent": "2"}]"#)]
#[case::no_root(r#"[{"name": "2", "parent": "3"}, {"name": "3", "parent": "2"}]"#)]
fn given_malformed_clade_links_when_loading_then_malformed_lineage(#[case] clades: &str) {
    let temp = TempDir::new().unwrap();
    let tree = write_file(
        &temp,
        "tree.json",
        &format!(r#"{{"phylogenies": [{{"name": "bad", "clades": {clades}}}]}}"#),
    );
    let meta = write_file(&temp, "meta.json", "{}");

    let result = loader().load(&tree, &meta);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MalformedLineage { phylogeny, .. })) if phylogeny == "bad"
    ));
}
