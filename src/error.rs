//! Error type shared by all split-construction algorithms.

use phylotree::tree::TreeError;
use thiserror::Error;

/// Errors that can occur while building split systems, trees or networks.
#[derive(Error, Debug)]
pub enum SplitsError {
    /// Input data does not fit the algorithm (dimensions, negative distances, too few taxa, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// One side of a split would be empty
    #[error("Invalid split: side of size {size} over {ntax} taxa leaves the other side empty")]
    InvalidSplit { size: usize, ntax: usize },
    /// The progress listener asked for the computation to stop
    #[error("Computation cancelled")]
    Cancelled,
    /// There was a [`TreeError`] when converting to or from a `phylotree` tree
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
    /// There was a [`std::io::Error`] reading input or writing results
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An internal invariant was broken
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, SplitsError>;
