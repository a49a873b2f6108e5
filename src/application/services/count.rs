//! Fluorescence counting service
//!
//! Loads a forest from disk and runs the intensity counter with options
//! resolved from settings and per-call overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, ForestLoader};
use crate::config::Settings;
use crate::domain::{CountOptions, CountReport, Forest, IntensityCounter};
use crate::infrastructure::traits::FileSystem;

/// Service counting cells above a fluorescence threshold.
pub struct CountService {
    settings: Arc<Settings>,
    loader: ForestLoader,
}

impl CountService {
    /// Create a new count service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self {
            settings,
            loader: ForestLoader::new(fs),
        }
    }

    /// Counting options from settings, with explicit overrides taking precedence.
    pub fn options(
        &self,
        threshold: Option<f64>,
        channel: Option<&str>,
    ) -> ApplicationResult<CountOptions> {
        let threshold = threshold.unwrap_or(self.settings.threshold);
        let channel = channel.unwrap_or(self.settings.channel.as_str());
        Ok(CountOptions::new(threshold, channel)?)
    }

    /// Input paths: explicit arguments first, then `tree_file`/`meta_file` from settings.
    pub fn resolve_inputs(
        &self,
        tree: Option<&Path>,
        meta: Option<&Path>,
    ) -> ApplicationResult<(PathBuf, PathBuf)> {
        let tree = tree
            .map(Path::to_path_buf)
            .or_else(|| self.settings.tree_file.clone())
            .ok_or_else(|| ApplicationError::Config {
                message: "no tree document given and no tree_file configured".to_string(),
            })?;
        let meta = meta
            .map(Path::to_path_buf)
            .or_else(|| self.settings.meta_file.clone())
            .ok_or_else(|| ApplicationError::Config {
                message: "no metadata document given and no meta_file configured".to_string(),
            })?;
        Ok((tree, meta))
    }

    pub fn load(&self, tree: &Path, meta: &Path) -> ApplicationResult<Forest> {
        self.loader.load(tree, meta)
    }

    /// Load the forest and count it.
    #[instrument(level = "debug", skip(self, options))]
    pub fn count(
        &self,
        tree: &Path,
        meta: &Path,
        options: &CountOptions,
        parallel: bool,
    ) -> ApplicationResult<CountReport> {
        let forest = self.load(tree, meta)?;
        self.count_forest(&forest, options, parallel)
    }

    /// Count an already loaded forest.
    pub fn count_forest(
        &self,
        forest: &Forest,
        options: &CountOptions,
        parallel: bool,
    ) -> ApplicationResult<CountReport> {
        debug!(
            "count_forest: {} phylogenies, parallel={}",
            forest.len(),
            parallel
        );
        let mut counter = IntensityCounter::with_options(forest, options.clone());
        let report = if parallel {
            counter.process_parallel()?
        } else {
            counter.process()?
        };
        info!(
            "{} of {} cells above {} on {}",
            report.total(),
            report.cells_visited(),
            report.threshold,
            report.channel
        );
        Ok(report.clone())
    }
}
