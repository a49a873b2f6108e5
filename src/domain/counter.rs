//! Intensity counter: cells whose fluorescence exceeds a threshold.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, instrument, trace, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::model::{CellView, CladeView, ForestView, PhylogenyView};

pub const DEFAULT_THRESHOLD: f64 = 5.0;
pub const DEFAULT_CHANNEL: &str = "yfp";

/// What to count: intensities of `channel` strictly greater than `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountOptions {
    threshold: f64,
    channel: String,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl CountOptions {
    pub fn new(threshold: f64, channel: impl Into<String>) -> DomainResult<Self> {
        let channel = channel.into();
        validate_threshold(threshold)?;
        validate_channel(&channel)?;
        Ok(Self { threshold, channel })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn exceeds(&self, intensity: f64) -> bool {
        intensity > self.threshold
    }
}

fn validate_threshold(threshold: f64) -> DomainResult<()> {
    if threshold.is_finite() {
        Ok(())
    } else {
        Err(DomainError::InvalidThreshold(threshold))
    }
}

fn validate_channel(channel: &str) -> DomainResult<()> {
    if channel.trim().is_empty() {
        Err(DomainError::InvalidChannel)
    } else {
        Ok(())
    }
}

/// Tally for a single phylogeny.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhylogenyCount {
    pub name: String,
    /// Cells visited by the traversal
    pub visited: usize,
    /// Cells with the channel strictly above the threshold
    pub above_threshold: usize,
    /// Cells lacking the channel, excluded from the count
    pub missing_channel: usize,
}

/// Result of one counting pass over a forest.
#[derive(Debug, Clone, PartialEq)]
pub struct CountReport {
    pub channel: String,
    pub threshold: f64,
    /// Per-phylogeny tallies in forest order
    pub phylogenies: Vec<PhylogenyCount>,
}

impl CountReport {
    pub fn total(&self) -> usize {
        self.phylogenies.iter().map(|p| p.above_threshold).sum()
    }

    pub fn cells_visited(&self) -> usize {
        self.phylogenies.iter().map(|p| p.visited).sum()
    }

    pub fn missing_channel(&self) -> usize {
        self.phylogenies.iter().map(|p| p.missing_channel).sum()
    }
}

impl fmt::Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells have a fluorescence intensity over {:.1}",
            self.total(),
            self.threshold
        )
    }
}

/// Count the cells of one phylogeny, walking the root cell's lineage depth-first.
#[instrument(level = "debug", skip_all, fields(phylogeny = phylogeny.name()))]
pub fn count_phylogeny<P: PhylogenyView>(
    phylogeny: &P,
    options: &CountOptions,
) -> DomainResult<PhylogenyCount> {
    let root_clade = phylogeny
        .root_clade()
        .ok_or_else(|| DomainError::MissingRootClade(phylogeny.name().to_string()))?;
    let root_cell = root_clade
        .cell_object()
        .ok_or_else(|| DomainError::MissingCell {
            phylogeny: phylogeny.name().to_string(),
            clade: root_clade.name().to_string(),
        })?;

    let mut tally = PhylogenyCount {
        name: phylogeny.name().to_string(),
        ..PhylogenyCount::default()
    };
    for cell in root_cell.lineage() {
        let cell = cell?;
        tally.visited += 1;
        match cell.fluorescence(&options.channel) {
            Some(intensity) if options.exceeds(intensity) => tally.above_threshold += 1,
            Some(_) => {}
            None => {
                trace!("cell {} has no {} channel", cell.id(), options.channel);
                tally.missing_channel += 1;
            }
        }
    }

    debug!(
        "visited={} above={} missing={}",
        tally.visited, tally.above_threshold, tally.missing_channel
    );
    Ok(tally)
}

/// Count cells above the threshold over all phylogenies, in forest order.
pub fn count_cells_above<F: ForestView>(forest: &F, options: &CountOptions) -> DomainResult<CountReport> {
    warn_if_undeclared(forest, options);
    let phylogenies = forest
        .phylogenies()
        .iter()
        .map(|phylogeny| count_phylogeny(phylogeny, options))
        .collect::<DomainResult<Vec<_>>>()?;
    Ok(CountReport {
        channel: options.channel.clone(),
        threshold: options.threshold,
        phylogenies,
    })
}

/// Same as [`count_cells_above`], with phylogenies counted on the rayon pool.
///
/// Trees are disjoint and immutable; tallies are collected in forest order
/// and the total is a plain sum.
pub fn count_cells_above_parallel<F>(forest: &F, options: &CountOptions) -> DomainResult<CountReport>
where
    F: ForestView,
    F::Phylogeny: Sync,
{
    warn_if_undeclared(forest, options);
    let phylogenies = forest
        .phylogenies()
        .par_iter()
        .map(|phylogeny| count_phylogeny(phylogeny, options))
        .collect::<DomainResult<Vec<_>>>()?;
    Ok(CountReport {
        channel: options.channel.clone(),
        threshold: options.threshold,
        phylogenies,
    })
}

fn warn_if_undeclared<F: ForestView>(forest: &F, options: &CountOptions) {
    let declared = forest.channels();
    if !declared.is_empty() && !declared.iter().any(|c| c == &options.channel) {
        warn!(
            "channel '{}' is not declared by the metadata (declared: {})",
            options.channel,
            declared.join(", ")
        );
    }
}

/// Counts cells with increased fluorescence intensity in a forest.
///
/// Holds the forest by reference and the counting options. Every call to
/// [`process`](Self::process) starts from zero, so repeated calls on the same
/// forest give the same count.
#[derive(Debug)]
pub struct IntensityCounter<'f, F> {
    forest: &'f F,
    options: CountOptions,
    report: Option<CountReport>,
}

impl<'f, F: ForestView> IntensityCounter<'f, F> {
    /// Counter with the default threshold (5.0) and channel ("yfp").
    pub fn new(forest: &'f F) -> Self {
        Self {
            forest,
            options: CountOptions::default(),
            report: None,
        }
    }

    pub fn with_options(forest: &'f F, options: CountOptions) -> Self {
        Self {
            forest,
            options,
            report: None,
        }
    }

    pub fn set_threshold(&mut self, threshold: f64) -> DomainResult<()> {
        validate_threshold(threshold)?;
        self.options.threshold = threshold;
        Ok(())
    }

    pub fn set_channel(&mut self, channel: impl Into<String>) -> DomainResult<()> {
        let channel = channel.into();
        validate_channel(&channel)?;
        self.options.channel = channel;
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(channel = %self.options.channel, threshold = self.options.threshold))]
    pub fn process(&mut self) -> DomainResult<&CountReport> {
        self.report = None;
        let report = count_cells_above(self.forest, &self.options)?;
        Ok(&*self.report.insert(report))
    }

    #[instrument(level = "debug", skip(self), fields(channel = %self.options.channel, threshold = self.options.threshold))]
    pub fn process_parallel(&mut self) -> DomainResult<&CountReport>
    where
        F::Phylogeny: Sync,
    {
        self.report = None;
        let report = count_cells_above_parallel(self.forest, &self.options)?;
        Ok(&*self.report.insert(report))
    }

    /// Number of cells over the threshold from the last successful pass, 0 before any.
    pub fn count(&self) -> usize {
        self.report.as_ref().map(CountReport::total).unwrap_or(0)
    }

    pub fn threshold(&self) -> f64 {
        self.options.threshold
    }

    pub fn channel(&self) -> &str {
        &self.options.channel
    }

    pub fn options(&self) -> &CountOptions {
        &self.options
    }

    pub fn report(&self) -> Option<&CountReport> {
        self.report.as_ref()
    }
}
