//! Domain layer: lineage model and the intensity counter
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod counter;
pub mod entities;
pub mod error;
pub mod model;

pub use arena::{CladeNode, LineageArena, LineageIter};
pub use builder::ForestBuilder;
pub use counter::{
    count_cells_above, count_cells_above_parallel, count_phylogeny, CountOptions, CountReport,
    IntensityCounter, PhylogenyCount, DEFAULT_CHANNEL, DEFAULT_THRESHOLD,
};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use model::{CellView, CladeView, ForestView, PhylogenyView};
