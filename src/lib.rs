//! Crate root: module orchestration and public re-exports.
//!
//! Modules:
//! - `bitset`, `split`, `splits`: taxon sets, weighted splits and split systems.
//! - `compatibility`, `cycle`: tree-likeness class and circular ordering of a split system.
//! - `distances`, `characters`, `taxa`: the inputs (distance matrix, alignment, labels).
//! - `decomposition`: split decomposition and Buneman tree.
//! - `parsimony`: parsimony splits of an alignment.
//! - `neighbor_joining`, `min_spanning_network`, `graph`: tree and network constructions.
//! - `tree_splits`: splits of a `phylotree` tree.
//! - `progress`, `error`: progress/cancellation and the shared error type.
//! - `io`: TSV, FASTA and Newick input/output.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod characters;
pub mod compatibility;
pub mod cycle;
pub mod decomposition;
pub mod distances;
pub mod error;
pub mod graph;
mod incremental;
pub mod io;
pub mod min_spanning_network;
pub mod neighbor_joining;
pub mod parsimony;
pub mod progress;
pub mod split;
pub mod splits;
pub mod taxa;
pub mod tree_splits;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::TaxonSet;
pub use characters::CharacterMatrix;
pub use compatibility::Compatibility;
pub use cycle::compute_cycle;
pub use decomposition::{buneman_tree, split_buneman_index, split_decomposition, split_isolation_index};
pub use distances::DistanceMatrix;
pub use error::{Result, SplitsError};
pub use graph::{GraphEdge, GraphNode, PhyloGraph};
pub use min_spanning_network::{MinSpanningConfig, min_spanning_network};
pub use neighbor_joining::neighbor_joining;
pub use parsimony::{ParsimonyConfig, parsimony_splits};
pub use progress::{NoProgress, ProgressListener, ProgressLog};
pub use split::Split;
pub use splits::SplitSystem;
pub use taxa::Taxa;
pub use tree_splits::splits_from_tree;
