//! Minimum spanning network and minimum spanning tree.
//!
//! # Overview
//! Every taxon becomes a node; taxon pairs are visited by increasing distance,
//! pairs at the same distance together as one group.
//!
//! - **Tree**: an edge is added only between different components, and the
//!   construction stops once everything is connected (a minimum spanning tree
//!   with exactly `ntax - 1` edges).
//! - **Network** (Bandelt et al. 1999): every pair of a group is added, so
//!   equally good alternatives appear as cycles. Once the graph is connected at
//!   distance `v`, groups up to `v + epsilon` are still added, then it stops.
//!
//! Components are tracked with `petgraph`'s union-find.

use crate::distances::DistanceMatrix;
use crate::error::{Result, SplitsError};
use crate::graph::PhyloGraph;
use crate::progress::ProgressListener;
use crate::taxa::Taxa;
use itertools::Itertools;
use log::info;
use petgraph::unionfind::UnionFind;

/// Options for [`min_spanning_network`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinSpanningConfig {
    /// Build a strict spanning tree instead of the network.
    pub minimum_spanning_tree: bool,
    /// Extra distance range added after the network becomes connected.
    pub epsilon: f64,
}

impl Default for MinSpanningConfig {
    fn default() -> Self {
        MinSpanningConfig {
            minimum_spanning_tree: false,
            epsilon: 0.0,
        }
    }
}

/// Builds the minimum spanning network (or tree) of `distances`.
///
/// Node `t - 1` is the leaf of taxon `t`; edge weights are the distances.
///
/// # Errors
/// `InvalidInput` for an empty matrix or if `taxa` does not match it,
/// `Cancelled` from `progress`.
///
/// # Example
/// ```
/// # use splitsnet::{min_spanning_network, DistanceMatrix, MinSpanningConfig, NoProgress, Taxa};
/// let d = DistanceMatrix::from_rows(&[
///     vec![0.0, 1.0, 1.0],
///     vec![1.0, 0.0, 1.0],
///     vec![1.0, 1.0, 0.0],
/// ]).unwrap();
/// let network = min_spanning_network(&d, &Taxa::numbered(3), &MinSpanningConfig::default(), &mut NoProgress).unwrap();
/// assert_eq!(network.edge_count(), 3);
/// ```
pub fn min_spanning_network(
    distances: &DistanceMatrix,
    taxa: &Taxa,
    config: &MinSpanningConfig,
    progress: &mut dyn ProgressListener,
) -> Result<PhyloGraph> {
    let ntax = distances.ntax();
    if ntax == 0 {
        return Err(SplitsError::InvalidInput("no taxa".to_string()));
    }
    taxa.check_ntax(ntax)?;

    let mut graph = PhyloGraph::new();
    for t in 1..=ntax {
        graph.add_taxon_node(t, taxa.label(t));
    }

    let mut pairs: Vec<(f64, usize, usize)> = (1..=ntax)
        .tuple_combinations()
        .map(|(i, j)| (distances.get(i, j), i, j))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let groups = pairs.iter().chunk_by(|pair| pair.0);
    progress.set_maximum(pairs.iter().dedup_by(|a, b| a.0 == b.0).count());

    let mut union_find = UnionFind::<usize>::new(ntax);
    let mut components = ntax;
    let mut max_value: Option<f64> = None;

    for (value, group) in &groups {
        if max_value.is_some_and(|max| value > max) {
            break;
        }
        progress.increment_progress()?;
        for &(_, i, j) in group {
            let joined = union_find.union(i - 1, j - 1);
            if joined {
                components -= 1;
            }
            if joined || !config.minimum_spanning_tree {
                graph.add_edge(i - 1, j - 1, value);
            }
        }
        if components == 1 {
            if config.minimum_spanning_tree {
                break;
            }
            max_value.get_or_insert(value + config.epsilon);
        }
    }

    info!(
        "Minimum spanning {}: {} nodes, {} edges",
        if config.minimum_spanning_tree { "tree" } else { "network" },
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}
