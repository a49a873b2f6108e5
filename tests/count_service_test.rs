//! Tests for CountService

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::rstest;

use lineage_fluor::application::services::CountService;
use lineage_fluor::application::ApplicationError;
use lineage_fluor::config::Settings;
use lineage_fluor::domain::DomainError;
use lineage_fluor::infrastructure::traits::RealFileSystem;
use lineage_fluor::infrastructure::ServiceContainer;

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/long_term_sos")
        .join(name)
}

fn service(settings: Settings) -> CountService {
    CountService::new(Arc::new(RealFileSystem), Arc::new(settings))
}

#[test]
fn given_fixture_when_counting_with_defaults_then_reports_four_cells() {
    // Arrange
    let service = service(Settings::default());
    let options = service.options(None, None).unwrap();

    // Act
    let report = service
        .count(&resource("tree.json"), &resource("meta.json"), &options, false)
        .unwrap();

    // Assert
    assert_eq!(report.total(), 4);
    assert_eq!(report.cells_visited(), 10);
    assert_eq!(report.missing_channel(), 1);
    assert_eq!(
        report.to_string(),
        "4 cells have a fluorescence intensity over 5.0"
    );
}

#[test]
fn given_fixture_when_counting_then_reports_per_phylogeny() {
    let service = service(Settings::default());
    let options = service.options(None, None).unwrap();

    let report = service
        .count(&resource("tree.json"), &resource("meta.json"), &options, false)
        .unwrap();

    let per_tree: Vec<_> = report
        .phylogenies
        .iter()
        .map(|p| (p.name.as_str(), p.visited, p.above_threshold, p.missing_channel))
        .collect();
    assert_eq!(per_tree, vec![("colony-1", 7, 2, 1), ("colony-2", 3, 2, 0)]);
}

#[rstest]
#[case(Some(5.0), None, 4)]
#[case(Some(5.5), None, 3)]
#[case(Some(0.0), None, 9)]
#[case(Some(100.0), None, 0)]
#[case(Some(0.5), Some("crimson"), 3)]
#[case(None, Some("gfp"), 0)]
fn given_overrides_when_counting_then_uses_them(
    #[case] threshold: Option<f64>,
    #[case] channel: Option<&str>,
    #[case] expected: usize,
) {
    let service = service(Settings::default());
    let options = service.options(threshold, channel).unwrap();

    let report = service
        .count(&resource("tree.json"), &resource("meta.json"), &options, false)
        .unwrap();

    assert_eq!(report.total(), expected);
}

#[test]
fn given_settings_when_no_override_then_settings_win_over_defaults() {
    let settings = Settings {
        threshold: 0.5,
        channel: "crimson".to_string(),
        ..Settings::default()
    };
    let service = service(settings);

    let options = service.options(None, None).unwrap();

    assert_eq!(options.threshold(), 0.5);
    assert_eq!(options.channel(), "crimson");
}

#[test]
fn given_fixture_when_counting_in_parallel_then_matches_sequential() {
    let service = service(Settings::default());
    let options = service.options(None, None).unwrap();
    let forest = service
        .load(&resource("tree.json"), &resource("meta.json"))
        .unwrap();

    let sequential = service.count_forest(&forest, &options, false).unwrap();
    let parallel = service.count_forest(&forest, &options, true).unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn given_nan_threshold_when_resolving_options_then_errors() {
    let service = service(Settings::default());

    let result = service.options(Some(f64::NAN), None);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidThreshold(_)))
    ));
}

#[test]
fn given_blank_channel_when_resolving_options_then_errors() {
    let service = service(Settings::default());

    let result = service.options(None, Some("  "));

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidChannel))
    ));
}

#[test]
fn given_configured_inputs_when_resolving_without_args_then_uses_settings() {
    let settings = Settings {
        tree_file: Some(resource("tree.json")),
        meta_file: Some(resource("meta.json")),
        ..Settings::default()
    };
    let service = service(settings);

    let (tree, meta) = service.resolve_inputs(None, None).unwrap();

    assert_eq!(tree, resource("tree.json"));
    assert_eq!(meta, resource("meta.json"));
}

#[test]
fn given_explicit_inputs_when_resolving_then_arguments_win() {
    let settings = Settings {
        tree_file: Some(PathBuf::from("/configured/tree.json")),
        meta_file: Some(PathBuf::from("/configured/meta.json")),
        ..Settings::default()
    };
    let service = service(settings);

    let (tree, meta) = service
        .resolve_inputs(Some(Path::new("a.json")), None)
        .unwrap();

    assert_eq!(tree, PathBuf::from("a.json"));
    assert_eq!(meta, PathBuf::from("/configured/meta.json"));
}

#[test]
fn given_no_inputs_anywhere_when_resolving_then_config_error() {
    let service = service(Settings::default());

    let result = service.resolve_inputs(None, None);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_documents_when_counting_then_forest_unavailable() {
    let container = ServiceContainer::with_deps(Settings::default(), Arc::new(RealFileSystem));
    let service = container.count_service();
    let options = service.options(None, None).unwrap();

    let result = service.count(
        Path::new("/nonexistent/tree.json"),
        Path::new("/nonexistent/meta.json"),
        &options,
        false,
    );

    assert!(matches!(result, Err(ApplicationError::ForestUnavailable(_))));
}
