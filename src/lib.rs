//! Count cells in single-cell lineage trees whose fluorescence intensity
//! exceeds a threshold.
//!
//! ```ignore
//! use lineage_fluor::domain::{IntensityCounter, ForestBuilder};
//!
//! let forest = ForestBuilder::new().build();
//! let mut counter = IntensityCounter::new(&forest);
//! let report = counter.process()?;
//! println!("{report}");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
