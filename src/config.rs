//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/lineage-fluor/lineage-fluor.toml`
//! 3. Local config: `<project_dir>/.lineage-fluor.toml`
//! 4. Environment variables: `LINEAGE_FLUOR_*` prefix
//!
//! Command line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DEFAULT_CHANNEL, DEFAULT_THRESHOLD};

const APP_NAME: &str = "lineage-fluor";
const ENV_PREFIX: &str = "LINEAGE_FLUOR";

/// Raw settings for intermediate parsing (all fields optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub threshold: Option<f64>,
    pub channel: Option<String>,
    pub parallel: Option<bool>,
    pub tree_file: Option<PathBuf>,
    pub meta_file: Option<PathBuf>,
}

/// Unified configuration for lineage-fluor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Intensities strictly above this value are counted (default: 5.0)
    pub threshold: f64,
    /// Fluorescence channel to read (default: "yfp")
    pub channel: String,
    /// Count phylogenies in parallel (default: false)
    pub parallel: bool,
    /// Default tree document when none is given on the command line
    pub tree_file: Option<PathBuf>,
    /// Default metadata document when none is given on the command line
    pub meta_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            channel: DEFAULT_CHANNEL.to_string(),
            parallel: false,
            tree_file: None,
            meta_file: None,
        }
    }
}

/// Expand environment variables and `~` in a path string.
///
/// Falls back to the unexpanded input if a variable is undefined.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for lineage-fluor.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(format!("{APP_NAME}.toml")))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(format!(".{APP_NAME}.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expand = |p: &PathBuf| PathBuf::from(expand_env_vars(p.to_string_lossy().as_ref()));
        self.tree_file = self.tree_file.as_ref().map(expand);
        self.meta_file = self.meta_file.as_ref().map(expand);
    }

    /// Merge overlay config onto self (base): overlay wins where specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            threshold: overlay.threshold.unwrap_or(self.threshold),
            channel: overlay
                .channel
                .clone()
                .unwrap_or_else(|| self.channel.clone()),
            parallel: overlay.parallel.unwrap_or(self.parallel),
            tree_file: overlay
                .tree_file
                .clone()
                .or_else(|| self.tree_file.clone()),
            meta_file: overlay
                .meta_file
                .clone()
                .or_else(|| self.meta_file.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.lineage-fluor.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load settings from one explicit file on top of the defaults.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut settings = Self::default().merge_with(&raw);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply LINEAGE_FLUOR_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(config.get_float("threshold"))? {
            settings.threshold = val;
        }
        if let Some(val) = env_value(config.get_string("channel"))? {
            settings.channel = val;
        }
        if let Some(val) = env_value(config.get_bool("parallel"))? {
            settings.parallel = val;
        }
        if let Some(val) = env_value(config.get_string("tree_file"))? {
            settings.tree_file = Some(PathBuf::from(val));
        }
        if let Some(val) = env_value(config.get_string("meta_file"))? {
            settings.meta_file = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Serialize to TOML for `config show`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }

    /// Commented template for `config init`.
    pub fn template() -> String {
        format!(
            r#"# lineage-fluor configuration
#
# Values here override the compiled defaults. Environment variables
# ({ENV_PREFIX}_THRESHOLD, {ENV_PREFIX}_CHANNEL, ...) override this file.

# Intensities strictly above this value are counted
threshold = {DEFAULT_THRESHOLD:.1}

# Fluorescence channel name as declared in the metadata
channel = "{DEFAULT_CHANNEL}"

# Count phylogenies on all cores
parallel = false

# Default inputs when none are given on the command line
# tree_file = "~/experiments/long_term_sos/tree.json"
# meta_file = "~/experiments/long_term_sos/meta.json"
"#
        )
    }
}

/// An unset variable is no override; a value of the wrong type is an error.
fn env_value<T>(lookup: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match lookup {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
