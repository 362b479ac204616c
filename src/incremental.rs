//! Incremental split construction shared by the Buneman tree, split
//! decomposition and parsimony splits.
//!
//! # Algorithm
//! Taxa are added one at a time. After taxon `t - 1` the candidates are the
//! weighted bipartitions of the processed taxa `1..t`. Adding `t`:
//! 1. the new pendant candidate `{t} | 1..t`,
//! 2. every previous candidate `A | B` extended to `(A ∪ {t}) | B` and to
//!    `A | (B ∪ {t})`, keeping the smaller of the previous weight and the new
//!    index.
//!
//! Candidates whose weight drops to zero are discarded; an index never grows
//! when taxa are added, so they could not come back.

use crate::bitset::TaxonSet;
use crate::error::{Result, SplitsError};
use crate::progress::ProgressListener;
use crate::split::Split;
use crate::splits::SplitSystem;
use log::debug;
use rayon::prelude::*;

/// Quartet terms at or below this value count as zero.
pub const EPSILON: f64 = 1e-7;

/// Fewer quartet terms than this are evaluated on the calling thread.
pub(crate) const PARALLEL_MIN_TERMS: usize = 4096;

/// A bipartition of the taxa processed so far.
#[derive(Clone, Debug)]
struct Candidate {
    a: TaxonSet,
    b: TaxonSet,
    weight: f64,
}

/// Runs the incremental construction over `1..=ntax` with the given index.
///
/// `index(t, side_with_t, other)` scores the candidate bipartition of the taxa
/// `1..=t` after placing `t` in `side_with_t`. The returned system is finalized.
///
/// # Errors
/// `InvalidInput` for zero taxa, `Cancelled` from `progress`.
pub(crate) fn build_incrementally<F>(
    ntax: usize,
    progress: &mut dyn ProgressListener,
    index: F,
) -> Result<SplitSystem>
where
    F: Fn(usize, &TaxonSet, &TaxonSet) -> f64,
{
    if ntax == 0 {
        return Err(SplitsError::InvalidInput("no taxa".to_string()));
    }
    progress.set_maximum(ntax.saturating_sub(1));

    let mut processed = TaxonSet::singleton(ntax, 1);
    let mut candidates: Vec<Candidate> = Vec::new();

    for t in 2..=ntax {
        let mut next = Vec::with_capacity(2 * candidates.len() + 1);

        let single = TaxonSet::singleton(ntax, t);
        let weight = index(t, &single, &processed);
        if weight > 0.0 {
            next.push(Candidate {
                a: single,
                b: processed.clone(),
                weight,
            });
        }

        for previous in &candidates {
            let a_with_t = previous.a.with(t);
            let weight = previous.weight.min(index(t, &a_with_t, &previous.b));
            if weight > 0.0 {
                next.push(Candidate {
                    a: a_with_t,
                    b: previous.b.clone(),
                    weight,
                });
            }

            let b_with_t = previous.b.with(t);
            let weight = previous.weight.min(index(t, &b_with_t, &previous.a));
            if weight > 0.0 {
                next.push(Candidate {
                    a: previous.a.clone(),
                    b: b_with_t,
                    weight,
                });
            }
        }

        candidates = next;
        processed.set(t);
        debug!("Taxon {t}: {} candidate splits", candidates.len());
        progress.increment_progress()?;
    }

    let mut splits = SplitSystem::new(ntax);
    for candidate in candidates {
        debug_assert_eq!(candidate.a.union(&candidate.b), TaxonSet::full(ntax));
        splits.add_split(Split::new(candidate.a, ntax, candidate.weight)?);
    }
    splits.finalize();
    Ok(splits)
}

/// Minimum of `term(i, j, k)` over `i ∈ near`, `j <= k` in `far`, or 0 as soon
/// as one term is at most [`EPSILON`].
///
/// # Algorithm
/// For each `i` an inner loop returns `None` on a vanishing term. When there
/// are at least [`PARALLEL_MIN_TERMS`] terms the loop over `i` runs as a rayon
/// reduction, which `try_reduce` short-circuits; smaller quartet sets are
/// scanned sequentially.
pub(crate) fn quartet_index<Q>(near: &TaxonSet, far: &TaxonSet, term: Q) -> f64
where
    Q: Fn(usize, usize, usize) -> f64 + Sync,
{
    let far: Vec<usize> = far.iter().collect();
    let row_min = |i: usize| -> Option<f64> {
        let mut best = f64::INFINITY;
        for (pos, &j) in far.iter().enumerate() {
            for &k in &far[pos..] {
                let value = term(i, j, k);
                if value <= EPSILON {
                    return None;
                }
                best = best.min(value);
            }
        }
        Some(best)
    };

    let terms = near.cardinality() * far.len() * (far.len() + 1) / 2;
    let min = if terms < PARALLEL_MIN_TERMS {
        near.iter()
            .try_fold(f64::INFINITY, |best, i| Some(best.min(row_min(i)?)))
    } else {
        let near: Vec<usize> = near.iter().collect();
        near.par_iter()
            .map(|&i| row_min(i))
            .try_reduce(|| f64::INFINITY, |a, b| Some(a.min(b)))
    };

    match min {
        Some(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, ProgressLog};
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_constant_index_enumerates_all_splits() {
        // every bipartition of n taxa survives: 2^(n-1) - 1 of them
        let splits = build_incrementally(5, &mut NoProgress, |_, _, _| 1.0).unwrap();
        assert_eq!(splits.len(), 15);
        assert!(splits.iter().all(|s| s.weight() == 1.0));
    }

    #[test]
    fn test_zero_index_gives_no_splits() {
        let splits = build_incrementally(4, &mut NoProgress, |_, _, _| 0.0).unwrap();
        assert!(splits.is_empty());
    }

    #[test]
    fn test_weight_is_minimum_over_steps() {
        // the index of the pendant split of the last taxon is 2, everything else 5
        let splits = build_incrementally(3, &mut NoProgress, |t, side, _| {
            if t == 3 && side.cardinality() == 1 { 2.0 } else { 5.0 }
        })
        .unwrap();
        assert_eq!(splits.len(), 3);
        for split in &splits {
            let expected = if split.part_containing(3).cardinality() == 1 { 2.0 } else { 5.0 };
            assert_eq!(split.weight(), expected, "{split}");
        }
    }

    #[test]
    fn test_single_taxon() {
        let splits = build_incrementally(1, &mut NoProgress, |_, _, _| 1.0).unwrap();
        assert!(splits.is_empty());
        assert!(matches!(
            build_incrementally(0, &mut NoProgress, |_, _, _| 1.0),
            Err(SplitsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cancellation() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut progress = ProgressLog::new("cancel").with_cancel_flag(flag);
        assert!(matches!(
            build_incrementally(4, &mut progress, |_, _, _| 1.0),
            Err(SplitsError::Cancelled)
        ));
    }

    fn brute_force(near: &TaxonSet, far: &TaxonSet, term: impl Fn(usize, usize, usize) -> f64) -> f64 {
        let mut best = f64::INFINITY;
        for i in near.iter() {
            for j in far.iter() {
                for k in far.iter().filter(|&k| k >= j) {
                    best = best.min(term(i, j, k));
                }
            }
        }
        best
    }

    #[test]
    fn test_quartet_index_sequential_and_parallel() {
        let term = |i: usize, j: usize, k: usize| ((i * 7 + j * 3 + k) % 11) as f64 + 0.5;

        // 2 * 3 terms: scanned on the calling thread
        let small_near = TaxonSet::from_taxa(4, [1, 2]);
        let small_far = TaxonSet::from_taxa(4, [3, 4]);
        assert_eq!(
            quartet_index(&small_near, &small_far, term),
            brute_force(&small_near, &small_far, term)
        );

        // 20 * 210 terms: rayon reduction
        let near = TaxonSet::from_taxa(40, 1..=20);
        let far = TaxonSet::from_taxa(40, 21..=40);
        assert!(near.cardinality() * far.cardinality() * (far.cardinality() + 1) / 2 >= PARALLEL_MIN_TERMS);
        assert_eq!(quartet_index(&near, &far, term), brute_force(&near, &far, term));
    }

    #[test]
    fn test_quartet_index_vanishing_term() {
        let term = |i: usize, j: usize, k: usize| if (i, j, k) == (17, 33, 38) { 0.0 } else { 4.0 };
        let near = TaxonSet::from_taxa(40, 1..=20);
        let far = TaxonSet::from_taxa(40, 21..=40);
        assert_eq!(quartet_index(&near, &far, term), 0.0);

        let small = TaxonSet::from_taxa(4, [1, 2]);
        let rest = TaxonSet::from_taxa(4, [3, 4]);
        assert_eq!(quartet_index(&small, &rest, |_, _, _| EPSILON / 2.0), 0.0);
        assert_eq!(quartet_index(&small, &rest, |_, _, _| 4.0), 4.0);
    }
}
