//! Split decomposition and Buneman tree from a distance matrix.
//!
//! # Overview
//! Both methods weight a bipartition `A | B` by a minimum over quartets
//! `i, j ∈ A`, `k, l ∈ B` of a four-point term:
//!
//! - **isolation index** (split decomposition, Bandelt & Dress 1992):
//!   `½ (max(d(i,k) + d(j,l), d(i,l) + d(j,k)) - d(i,j) - d(k,l))`
//! - **Buneman index**:
//!   `½ (min(d(i,k) + d(j,l), d(i,l) + d(j,k)) - d(i,j) - d(k,l))`
//!
//! Splits with a positive index are kept. The Buneman splits are pairwise
//! compatible and form a tree; the split decomposition yields a weakly
//! compatible system that represents `d` exactly when `d` is totally
//! decomposable.
//!
//! # Example
//! ```
//! # use splitsnet::{split_decomposition, DistanceMatrix, NoProgress};
//! let d = DistanceMatrix::from_rows(&[
//!     vec![0.0, 2.0, 5.0, 5.0],
//!     vec![2.0, 0.0, 5.0, 5.0],
//!     vec![5.0, 5.0, 0.0, 2.0],
//!     vec![5.0, 5.0, 2.0, 0.0],
//! ]).unwrap();
//! let splits = split_decomposition(&d, &mut NoProgress).unwrap();
//! assert_eq!(splits.len(), 5);
//! ```

use crate::bitset::TaxonSet;
use crate::distances::DistanceMatrix;
use crate::error::Result;
use crate::incremental::{EPSILON, build_incrementally, quartet_index};
use crate::progress::ProgressListener;
use crate::split::Split;
use crate::splits::SplitSystem;
use log::info;
use rayon::prelude::*;

/// Split decomposition: all d-splits weighted by their isolation index.
///
/// # Errors
/// `InvalidInput` for an empty matrix, `Cancelled` from `progress`.
pub fn split_decomposition(
    distances: &DistanceMatrix,
    progress: &mut dyn ProgressListener,
) -> Result<SplitSystem> {
    let splits = build_incrementally(distances.ntax(), progress, |t, near, far| {
        isolation_index(distances, t, near, far)
    })?;
    info!(
        "Split decomposition: {} splits over {} taxa ({})",
        splits.len(),
        distances.ntax(),
        splits.compatibility()
    );
    Ok(splits)
}

/// Buneman tree: all splits with a positive Buneman index.
///
/// # Errors
/// `InvalidInput` for an empty matrix, `Cancelled` from `progress`.
pub fn buneman_tree(
    distances: &DistanceMatrix,
    progress: &mut dyn ProgressListener,
) -> Result<SplitSystem> {
    let splits = build_incrementally(distances.ntax(), progress, |t, near, far| {
        buneman_index(distances, t, near, far)
    })?;
    info!(
        "Buneman tree: {} splits over {} taxa ({})",
        splits.len(),
        distances.ntax(),
        splits.compatibility()
    );
    Ok(splits)
}

/// Isolation index of `split` over all of its quartets.
pub fn split_isolation_index(split: &Split, distances: &DistanceMatrix) -> f64 {
    full_index(split, distances, f64::max)
}

/// Buneman index of `split` over all of its quartets.
pub fn split_buneman_index(split: &Split, distances: &DistanceMatrix) -> f64 {
    full_index(split, distances, f64::min)
}

/// Isolation index restricted to the quartets containing the new taxon `t`.
fn isolation_index(d: &DistanceMatrix, t: usize, near: &TaxonSet, far: &TaxonSet) -> f64 {
    quartet_index(near, far, |i, j, k| {
        0.5 * ((d.get(t, j) + d.get(i, k)).max(d.get(t, k) + d.get(i, j))
            - d.get(t, i)
            - d.get(j, k))
    })
}

/// Buneman index restricted to the quartets containing the new taxon `t`.
fn buneman_index(d: &DistanceMatrix, t: usize, near: &TaxonSet, far: &TaxonSet) -> f64 {
    quartet_index(near, far, |i, j, k| {
        0.5 * ((d.get(t, j) + d.get(i, k)).min(d.get(t, k) + d.get(i, j))
            - d.get(t, i)
            - d.get(j, k))
    })
}

fn full_index(split: &Split, d: &DistanceMatrix, pick: fn(f64, f64) -> f64) -> f64 {
    let a: Vec<usize> = split.a().iter().collect();
    let b: Vec<usize> = split.b().iter().collect();

    let min = a
        .par_iter()
        .enumerate()
        .map(|(pos, &i)| {
            let mut best = f64::INFINITY;
            for &j in &a[pos..] {
                for (kpos, &k) in b.iter().enumerate() {
                    for &l in &b[kpos..] {
                        let value = 0.5
                            * (pick(d.get(i, k) + d.get(j, l), d.get(i, l) + d.get(j, k))
                                - d.get(i, j)
                                - d.get(k, l));
                        best = best.min(value);
                    }
                }
            }
            best
        })
        .reduce(|| f64::INFINITY, f64::min);

    if min.is_finite() && min > EPSILON { min } else { 0.0 }
}
