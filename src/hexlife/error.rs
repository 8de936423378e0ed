//! Error types for hexgene-life.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or constructing a grid.
#[derive(Debug, Error)]
pub enum HexLifeError {
    /// A rule or seed file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An AND-rule did not have the `[tokens]radius` shape.
    #[error("line {line}: malformed rule `{rule}` (expected `[tokens]radius`)")]
    MalformedRule { line: usize, rule: String },

    /// A token inside an AND-rule's brackets was not recognised.
    #[error("line {line}: invalid token `{token}` in rule `{rule}`")]
    InvalidToken {
        line: usize,
        token: String,
        rule: String,
    },

    /// A seed line did not have the `x;y;[genes]` shape.
    #[error("line {line}: malformed seed `{text}`: {reason}")]
    MalformedSeed {
        line: usize,
        text: String,
        reason: &'static str,
    },

    /// Width or height was zero.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    /// The grid was asked to carry no gene channels.
    #[error("gene count must be positive")]
    NoGenes,

    /// A rule, seed or query referenced a gene the grid does not carry.
    #[error("gene {gene} is out of range for a grid with {genes} genes")]
    GeneOutOfRange { gene: usize, genes: usize },

    /// Replacement gene names did not match the gene count.
    #[error("expected {expected} gene names, got {got}")]
    GeneNamesLength { expected: usize, got: usize },

    /// A seed fell outside the grid under `OutOfBoundsPolicy::Reject`.
    #[error("seed ({x}, {y}) is outside the {width}x{height} grid")]
    SeedOutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    /// The dense-kernel thread pool could not be built.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, HexLifeError>;
