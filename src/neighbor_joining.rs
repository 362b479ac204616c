//! Neighbor joining (Saitou & Nei 1987).
//!
//! # Algorithm
//! While more than two clusters are active:
//! 1. compute the divergences `r_i = Σ_k d(i, k)` over active `k`,
//! 2. join the active pair minimizing `Q(i, j) = d(i, j) - (r_i + r_j) / (n - 2)`
//!    under a new internal node, with branch lengths
//!    `l_i = d(i, j) / 2 + (r_i - r_j) / (2 (n - 2))` and `l_j = d(i, j) - l_i`,
//! 3. replace `i` by the new node, `d(u, k) = (d(i, k) + d(j, k) - d(i, j)) / 2`,
//!    and retire `j`.
//!
//! The last two clusters are joined by a single edge. Negative branch lengths
//! are clamped to 0.

use crate::distances::DistanceMatrix;
use crate::error::{Result, SplitsError};
use crate::graph::PhyloGraph;
use crate::progress::ProgressListener;
use crate::taxa::Taxa;
use log::{info, warn};

/// Builds the unrooted neighbor-joining tree of `distances`.
///
/// The result has one leaf per taxon, labelled from `taxa`, and `2n - 3`
/// edges for `n >= 3` taxa; two taxa give a single edge and one taxon a lone
/// leaf.
///
/// # Errors
/// `InvalidInput` for an empty matrix or if `taxa` does not match it,
/// `Cancelled` from `progress`.
///
/// # Example
/// ```
/// # use splitsnet::{neighbor_joining, DistanceMatrix, NoProgress, Taxa};
/// let d = DistanceMatrix::from_rows(&[
///     vec![0.0, 2.0, 3.0],
///     vec![2.0, 0.0, 3.0],
///     vec![3.0, 3.0, 0.0],
/// ]).unwrap();
/// let tree = neighbor_joining(&d, &Taxa::numbered(3), &mut NoProgress).unwrap();
/// assert_eq!(tree.edge_count(), 3);
/// ```
pub fn neighbor_joining(
    distances: &DistanceMatrix,
    taxa: &Taxa,
    progress: &mut dyn ProgressListener,
) -> Result<PhyloGraph> {
    let ntax = distances.ntax();
    if ntax == 0 {
        return Err(SplitsError::InvalidInput("no taxa".to_string()));
    }
    taxa.check_ntax(ntax)?;
    progress.set_maximum(ntax.saturating_sub(2));

    let mut graph = PhyloGraph::new();
    // graph node currently standing for each matrix row
    let mut node_of = vec![0; ntax + 1];
    for t in 1..=ntax {
        node_of[t] = graph.add_taxon_node(t, taxa.label(t));
    }

    let mut d = distances.clone();
    let mut active = vec![true; ntax + 1];
    active[0] = false;
    let mut n_active = ntax;

    while n_active > 2 {
        let divergences = divergences(&d, &active);
        let (i, j) = closest_pair(&d, &active, &divergences, n_active)
            .ok_or(SplitsError::Internal("no pair of active taxa to join"))?;

        let d_ij = d.get(i, j);
        let scale = 2.0 * (n_active as f64 - 2.0);
        let l_i = 0.5 * d_ij + (divergences[i] - divergences[j]) / scale;
        let l_j = d_ij - l_i;

        let u = graph.add_internal_node();
        graph.add_edge(u, node_of[i], l_i.max(0.0));
        graph.add_edge(u, node_of[j], l_j.max(0.0));

        for k in (1..=ntax).filter(|&k| active[k] && k != i && k != j) {
            let reduced = 0.5 * (d.get(i, k) + d.get(j, k) - d_ij);
            d.set(i, k, reduced);
        }
        active[j] = false;
        node_of[i] = u;
        n_active -= 1;

        progress.increment_progress()?;
    }

    let mut last = (1..=ntax).filter(|&k| active[k]);
    if let (Some(i), Some(j)) = (last.next(), last.next()) {
        graph.add_edge(node_of[i], node_of[j], d.get(i, j).max(0.0));
    }

    info!(
        "Neighbor joining: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// `r_i = Σ_k d(i, k)` over the active rows; index 0 unused.
fn divergences(d: &DistanceMatrix, active: &[bool]) -> Vec<f64> {
    let ntax = d.ntax();
    let mut r = vec![0.0; ntax + 1];
    for i in (1..=ntax).filter(|&i| active[i]) {
        r[i] = (1..=ntax)
            .filter(|&k| active[k] && k != i)
            .map(|k| d.get(i, k))
            .sum();
    }
    r
}

/// Active pair `i < j` with the smallest Q; the first one found wins ties.
fn closest_pair(
    d: &DistanceMatrix,
    active: &[bool],
    divergences: &[f64],
    n_active: usize,
) -> Option<(usize, usize)> {
    let ntax = d.ntax();
    let denominator = n_active as f64 - 2.0;
    let mut best: Option<(usize, usize, f64)> = None;

    for i in (1..=ntax).filter(|&i| active[i]) {
        for j in (i + 1..=ntax).filter(|&j| active[j]) {
            let mut q = d.get(i, j) - (divergences[i] + divergences[j]) / denominator;
            if !q.is_finite() {
                warn!("Neighbor joining: non-finite criterion for taxa {i} and {j}");
                q = f64::INFINITY;
            }
            if best.is_none_or(|(_, _, best_q)| q < best_q) {
                best = Some((i, j, q));
            }
        }
    }
    best.map(|(i, j, _)| (i, j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, ProgressLog};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn three_taxa() -> DistanceMatrix {
        DistanceMatrix::from_rows(&[
            vec![0.0, 2.0, 3.0],
            vec![2.0, 0.0, 3.0],
            vec![3.0, 3.0, 0.0],
        ])
        .unwrap()
    }

    fn edge_to(graph: &PhyloGraph, taxon: usize) -> f64 {
        let leaf = graph.taxon_node(taxon).unwrap();
        let edges: Vec<_> = graph
            .edges()
            .filter(|e| e.source == leaf || e.target == leaf)
            .collect();
        assert_eq!(edges.len(), 1, "leaf {taxon} is not pendant");
        edges[0].weight
    }

    #[test]
    fn test_three_taxa() {
        let graph = neighbor_joining(&three_taxa(), &Taxa::numbered(3), &mut NoProgress).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(edge_to(&graph, 1), 1.0);
        assert_eq!(edge_to(&graph, 2), 1.0);
        assert_eq!(edge_to(&graph, 3), 2.0);
        assert_eq!(graph.degree(3), 3);
    }

    #[test]
    fn test_labels_from_taxa() {
        let taxa = Taxa::new(["human", "chimp", "gorilla"]).unwrap();
        let graph = neighbor_joining(&three_taxa(), &taxa, &mut NoProgress).unwrap();
        let leaf = graph.taxon_node(3).unwrap();
        assert_eq!(graph.node(leaf).label.as_deref(), Some("gorilla"));
    }

    #[test]
    fn test_degenerate_sizes() {
        let one = DistanceMatrix::from_rows(&[vec![0.0]]).unwrap();
        let graph = neighbor_joining(&one, &Taxa::numbered(1), &mut NoProgress).unwrap();
        assert_eq!((graph.node_count(), graph.edge_count()), (1, 0));

        let two = DistanceMatrix::from_rows(&[vec![0.0, 4.0], vec![4.0, 0.0]]).unwrap();
        let graph = neighbor_joining(&two, &Taxa::numbered(2), &mut NoProgress).unwrap();
        assert_eq!((graph.node_count(), graph.edge_count()), (2, 1));
        assert_eq!(graph.edges().next().unwrap().weight, 4.0);

        assert!(neighbor_joining(&DistanceMatrix::new(0), &Taxa::numbered(0), &mut NoProgress).is_err());
    }

    #[test]
    fn test_taxa_mismatch() {
        assert!(matches!(
            neighbor_joining(&three_taxa(), &Taxa::numbered(4), &mut NoProgress),
            Err(SplitsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_additive_tree_is_recovered() {
        // ((1:2,2:3):4,3:1,(4:2,5:5):1)
        let d = DistanceMatrix::from_rows(&[
            vec![0.0, 5.0, 7.0, 9.0, 12.0],
            vec![5.0, 0.0, 8.0, 10.0, 13.0],
            vec![7.0, 8.0, 0.0, 4.0, 7.0],
            vec![9.0, 10.0, 4.0, 0.0, 7.0],
            vec![12.0, 13.0, 7.0, 7.0, 0.0],
        ])
        .unwrap();
        let graph = neighbor_joining(&d, &Taxa::numbered(5), &mut NoProgress).unwrap();
        for (taxon, length) in [(1, 2.0), (2, 3.0), (3, 1.0), (4, 2.0), (5, 5.0)] {
            assert!((edge_to(&graph, taxon) - length).abs() < 1e-9, "pendant edge of {taxon}");
        }
        let total: f64 = graph.edges().map(|e| e.weight).sum();
        assert!((total - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut progress = ProgressLog::new("nj").with_cancel_flag(flag);
        assert!(matches!(
            neighbor_joining(&three_taxa(), &Taxa::numbered(3), &mut progress),
            Err(SplitsError::Cancelled)
        ));
    }

    fn random_matrix() -> impl Strategy<Value = DistanceMatrix> {
        (3usize..10).prop_flat_map(|n| {
            prop::collection::vec(0.0f64..10.0, n * (n - 1) / 2).prop_map(move |upper| {
                let mut d = DistanceMatrix::new(n);
                let mut values = upper.into_iter();
                for i in 1..=n {
                    for j in i + 1..=n {
                        d.set(i, j, values.next().unwrap_or(0.0));
                    }
                }
                d
            })
        })
    }

    proptest! {
        #[test]
        fn prop_tree_shape(d in random_matrix()) {
            let n = d.ntax();
            let graph = neighbor_joining(&d, &Taxa::numbered(n), &mut NoProgress).unwrap();

            prop_assert_eq!(graph.edge_count(), 2 * n - 3);
            prop_assert_eq!(graph.node_count(), 2 * n - 2);
            prop_assert!(graph.is_connected());
            prop_assert!(graph.edges().all(|e| e.weight >= 0.0));

            let taxa: HashSet<usize> = graph.leaves().filter_map(|id| graph.node(id).taxon).collect();
            prop_assert_eq!(taxa.len(), n);
            for leaf in graph.leaves() {
                prop_assert_eq!(graph.degree(leaf), 1);
            }
            for internal in n..graph.node_count() {
                prop_assert_eq!(graph.degree(internal), 3);
            }
        }
    }
}
