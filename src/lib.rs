//! Hexagonal-grid cellular automaton with rule-driven gene diffusion.

pub mod hexlife;
pub use hexlife::{CellGrid, HexLifeConfig, HexLifeError, KernelBackend, RuleSet, SeedCell};
