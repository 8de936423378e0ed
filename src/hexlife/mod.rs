//! HexLife engine internals and public API.

mod engine;
mod error;
mod kernel;
mod mask;
mod parse;
mod plane;
mod rules;

pub use engine::{CellGrid, HexLifeConfig, OutOfBoundsPolicy, SeedCell, initialize_grid};
pub use error::{HexLifeError, Result};
pub use kernel::{
    KernelBackend, NeighborCounter, SPARSE_OCCUPANCY_THRESHOLD, count_dense, count_sparse,
};
pub use mask::{Mask, MaskCache, build_mask};
pub use parse::{
    parse_and_rule, parse_rule_line, parse_rules, parse_seed, parse_seeds, read_rules_file,
    read_seeds_file,
};
pub use plane::{GenePlanes, Plane};
pub use rules::{AndRule, RuleSet, RuleTarget};
