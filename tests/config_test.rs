//! Integration tests for Settings loading.
//!
//! Precedence: defaults → global file → project `.lineage-fluor.toml` → env vars.
//!
//! Note: These tests only write temp directories, a global config on the
//! host or LINEAGE_FLUOR_* variables in the environment would leak in.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use lineage_fluor::application::ApplicationError;
use lineage_fluor::config::{local_config_path, Settings};

#[test]
fn given_project_config_when_load_then_overrides_defaults() {
    // Arrange
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join(".lineage-fluor.toml"),
        r#"
threshold = 2.5
channel = "crimson"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(project.path())).expect("load settings");

    // Assert
    assert_eq!(settings.threshold, 2.5);
    assert_eq!(settings.channel, "crimson");
    assert!(!settings.parallel, "unspecified keys keep defaults");
}

#[test]
fn given_project_without_config_when_load_then_defaults() {
    let project = TempDir::new().unwrap();

    let settings = Settings::load(Some(project.path())).expect("load settings");

    assert_eq!(settings.threshold, 5.0);
    assert_eq!(settings.channel, "yfp");
}

#[test]
fn given_malformed_project_config_when_load_then_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "threshold = \"high\"").unwrap();

    let result = Settings::load(Some(project.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_explicit_file_when_load_file_then_reads_inputs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
parallel = true
tree_file = "/data/tree.json"
meta_file = "/data/meta.json"
"#,
    )
    .unwrap();

    let settings = Settings::load_file(&path).unwrap();

    assert!(settings.parallel);
    assert_eq!(settings.tree_file, Some(PathBuf::from("/data/tree.json")));
    assert_eq!(settings.meta_file, Some(PathBuf::from("/data/meta.json")));
    assert_eq!(settings.threshold, 5.0);
}

#[test]
fn given_template_when_written_then_loads_as_defaults() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), Settings::template()).unwrap();

    let settings = Settings::load_file(&local_config_path(project.path())).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_settings_when_shown_then_toml_lists_keys() {
    let toml = Settings::default().to_toml().unwrap();

    assert!(toml.contains("threshold = 5.0"));
    assert!(toml.contains("channel = \"yfp\""));
}
