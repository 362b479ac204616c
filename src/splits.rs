//! A collection of distinct splits over a common set of taxa.
//!
//! # Overview
//! `SplitSystem` is the output of the split-construction algorithms. It keeps
//! the splits in insertion order and caches two derived properties that are
//! expensive to compute: the circular ordering of the taxa (see [`crate::cycle`])
//! and the [`Compatibility`] class. Both are filled in by [`SplitSystem::finalize`]
//! and dropped again whenever a split is added.
//!
//! # Example
//! ```
//! # use splitsnet::{Compatibility, Split, SplitSystem, TaxonSet};
//! let mut splits = SplitSystem::new(4);
//! splits.add_split(Split::new(TaxonSet::from_taxa(4, [1, 2]), 4, 2.0).unwrap());
//! splits.add_split(Split::new(TaxonSet::from_taxa(4, [3, 4]), 4, 2.0).unwrap()); // same split
//! splits.finalize();
//! assert_eq!(splits.len(), 1);
//! assert_eq!(splits.compatibility(), Compatibility::Compatible);
//! ```

use crate::bitset::TaxonSet;
use crate::compatibility::{self, Compatibility};
use crate::cycle;
use crate::split::Split;
use log::debug;
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct SplitSystem {
    ntax: usize,
    splits: Vec<Split>,
    /// Canonical sides of `splits`
    index: HashSet<TaxonSet>,
    compatibility: Compatibility,
    cycle: Option<Vec<usize>>,
    threshold: f64,
}

impl SplitSystem {
    /// Empty system over the taxa `1..=ntax`.
    pub fn new(ntax: usize) -> Self {
        SplitSystem {
            ntax,
            ..Default::default()
        }
    }

    pub fn ntax(&self) -> usize {
        self.ntax
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// The `i`-th split in insertion order (0-based).
    pub fn get(&self, i: usize) -> Option<&Split> {
        self.splits.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Split> + '_ {
        self.splits.iter()
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn into_splits(self) -> Vec<Split> {
        self.splits
    }

    /// True if a split with the same bipartition is present.
    pub fn contains(&self, split: &Split) -> bool {
        self.index.contains(split.canonical())
    }

    /// Appends `split` unless an equal bipartition is already present.
    ///
    /// Returns whether the split was added. Adding invalidates the cached
    /// cycle and compatibility.
    ///
    /// # Panics
    /// If `split` is over a different number of taxa.
    pub fn add_split(&mut self, split: Split) -> bool {
        assert_eq!(
            split.ntax(),
            self.ntax,
            "split {split} does not cover {} taxa",
            self.ntax
        );
        if !self.index.insert(split.canonical().clone()) {
            return false;
        }
        self.splits.push(split);
        self.compatibility = Compatibility::Unknown;
        self.cycle = None;
        true
    }

    /// Computes the circular ordering and then the compatibility class.
    pub fn finalize(&mut self) {
        let cycle = cycle::compute_cycle(self.ntax, &self.splits);
        self.compatibility = compatibility::compute(self.ntax, &self.splits, &cycle);
        debug!(
            "Finalized {} splits over {} taxa: {}",
            self.splits.len(),
            self.ntax,
            self.compatibility
        );
        self.cycle = Some(cycle);
    }

    pub fn compatibility(&self) -> Compatibility {
        self.compatibility
    }

    /// Circular ordering of the taxa, `None` until finalized.
    pub fn cycle(&self) -> Option<&[usize]> {
        self.cycle.as_deref()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Minimum weight used by [`SplitSystem::filter_by_threshold`].
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn total_weight(&self) -> f64 {
        self.splits.iter().map(Split::weight).sum()
    }

    /// New finalized system with the splits of weight `>= threshold()`.
    pub fn filter_by_threshold(&self) -> SplitSystem {
        let mut filtered = SplitSystem::new(self.ntax);
        filtered.threshold = self.threshold;
        for split in self.splits.iter().filter(|s| s.weight() >= self.threshold) {
            filtered.add_split(split.clone());
        }
        filtered.finalize();
        filtered
    }

    /// New finalized system holding a maximal compatible subset, chosen
    /// greedily from the heaviest split down. Ties keep insertion order.
    pub fn greedy_compatible(&self) -> SplitSystem {
        let mut order: Vec<&Split> = self.splits.iter().collect();
        order.sort_by(|a, b| b.weight().total_cmp(&a.weight()));

        let mut tree = SplitSystem::new(self.ntax);
        tree.threshold = self.threshold;
        for split in order {
            if tree.iter().all(|kept| kept.is_compatible(split)) {
                tree.add_split(split.clone());
            }
        }
        tree.finalize();
        tree
    }
}

impl<'a> IntoIterator for &'a SplitSystem {
    type Item = &'a Split;
    type IntoIter = std::slice::Iter<'a, Split>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits.iter()
    }
}
