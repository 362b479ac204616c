//! Compact bitset representation for sets of taxa.
//!
//! # Overview
//! Taxa are numbered `1..=ntax`; bit `t` of the set marks taxon `t` as present,
//! bit 0 is never used. One side of a split is a `TaxonSet`, the other side is
//! its complement with respect to `ntax`.
//!
//! # Example
//! For taxa [A, B, C, D] numbered [1, 2, 3, 4]:
//! - Side {A, C} → bits 1 and 3 set → `0b01010`
//! - Side {B, C, D} → bits 2, 3, 4 set → `0b11100`
//!
//! Sets are values: the combinators below return new sets instead of
//! mutating and reverting a shared instance, so they can be handed to
//! parallel workers freely.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A compact set of taxon indices.
///
/// Internally stores bits in `Vec<u64>` words; each word holds 64 taxa.
/// Equality and hashing ignore trailing zero words, so two sets built with
/// different capacities compare equal when they hold the same taxa.
#[derive(Clone, Debug, Default)]
pub struct TaxonSet(Vec<u64>);

impl TaxonSet {
    /// Creates an empty set with room for taxa `1..=ntax`.
    ///
    /// # Example
    /// ```
    /// # use splitsnet::bitset::TaxonSet;
    /// // 100 taxa plus the unused bit 0 need 2 words
    /// let set = TaxonSet::with_capacity(100);
    /// assert!(set.is_empty());
    /// ```
    pub fn with_capacity(ntax: usize) -> Self {
        TaxonSet(vec![0u64; (ntax + 1).div_ceil(64)])
    }

    /// Creates the set holding exactly `taxon`.
    pub fn singleton(ntax: usize, taxon: usize) -> Self {
        let mut set = Self::with_capacity(ntax);
        set.set(taxon);
        set
    }

    /// Creates the full taxon set `{1..ntax}`.
    pub fn full(ntax: usize) -> Self {
        Self::from_taxa(ntax, 1..=ntax)
    }

    /// Creates a set from an iterator of taxon indices.
    ///
    /// # Example
    /// ```
    /// # use splitsnet::bitset::TaxonSet;
    /// let set = TaxonSet::from_taxa(4, [1, 3]);
    /// assert!(set.contains(3));
    /// assert_eq!(set.cardinality(), 2);
    /// ```
    pub fn from_taxa<I: IntoIterator<Item = usize>>(ntax: usize, taxa: I) -> Self {
        let mut set = Self::with_capacity(ntax);
        for t in taxa {
            set.set(t);
        }
        set
    }

    /// Adds `taxon` to the set, growing the storage when needed.
    ///
    /// # Panics
    /// Taxon 0 is not a valid taxon index.
    #[inline]
    pub fn set(&mut self, taxon: usize) {
        assert!(taxon > 0, "taxon indices start at 1");
        let word = taxon >> 6; // Equivalent to taxon / 64
        let bit = taxon & 63; // Equivalent to taxon % 64
        if word >= self.0.len() {
            self.0.resize(word + 1, 0);
        }
        self.0[word] |= 1u64 << bit;
    }

    /// Removes `taxon` from the set.
    #[inline]
    pub fn clear(&mut self, taxon: usize) {
        let word = taxon >> 6;
        if word < self.0.len() {
            self.0[word] &= !(1u64 << (taxon & 63));
        }
    }

    #[inline]
    pub fn contains(&self, taxon: usize) -> bool {
        let word = taxon >> 6;
        word < self.0.len() && (self.0[word] >> (taxon & 63)) & 1 == 1
    }

    /// Returns a copy of this set with `taxon` added.
    pub fn with(&self, taxon: usize) -> Self {
        let mut set = self.clone();
        set.set(taxon);
        set
    }

    /// Returns a copy of this set with `taxon` removed.
    pub fn without(&self, taxon: usize) -> Self {
        let mut set = self.clone();
        set.clear(taxon);
        set
    }

    /// Performs bitwise OR with another set: `self` becomes `self ∪ other`.
    #[inline]
    pub fn or_assign(&mut self, other: &TaxonSet) {
        if other.0.len() > self.0.len() {
            self.0.resize(other.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    pub fn union(&self, other: &TaxonSet) -> Self {
        let mut set = self.clone();
        set.or_assign(other);
        set
    }

    pub fn intersection(&self, other: &TaxonSet) -> Self {
        TaxonSet(self.0.iter().zip(&other.0).map(|(a, b)| a & b).collect())
    }

    /// Taxa of `self` that are not in `other`.
    pub fn difference(&self, other: &TaxonSet) -> Self {
        TaxonSet(
            self.0
                .iter()
                .enumerate()
                .map(|(w, a)| a & !other.0.get(w).copied().unwrap_or(0))
                .collect(),
        )
    }

    /// The complement of this set within `{1..ntax}`.
    ///
    /// # Example
    /// ```
    /// # use splitsnet::bitset::TaxonSet;
    /// let side = TaxonSet::from_taxa(4, [1, 2]);
    /// assert_eq!(side.complement(4), TaxonSet::from_taxa(4, [3, 4]));
    /// ```
    pub fn complement(&self, ntax: usize) -> Self {
        TaxonSet::full(ntax).difference(self)
    }

    /// True if the two sets share at least one taxon.
    #[inline]
    pub fn intersects(&self, other: &TaxonSet) -> bool {
        self.0.iter().zip(&other.0).any(|(a, b)| a & b != 0)
    }

    /// True if all three sets share at least one taxon.
    #[inline]
    pub fn intersects_both(&self, second: &TaxonSet, third: &TaxonSet) -> bool {
        self.0
            .iter()
            .zip(&second.0)
            .zip(&third.0)
            .any(|((a, b), c)| a & b & c != 0)
    }

    pub fn is_subset(&self, other: &TaxonSet) -> bool {
        self.0
            .iter()
            .enumerate()
            .all(|(w, a)| a & !other.0.get(w).copied().unwrap_or(0) == 0)
    }

    /// Counts the number of taxa in the set (population count).
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Smallest taxon in the set.
    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    /// Largest taxon in the set.
    pub fn last(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 64 + 63 - w.leading_zeros() as usize)
    }

    /// Iterates over the taxa in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(i, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(i * 64 + bit)
            })
        })
    }

    /// Words up to the last non-zero one.
    fn trimmed(&self) -> &[u64] {
        let len = self.0.iter().rposition(|&w| w != 0).map_or(0, |p| p + 1);
        &self.0[..len]
    }
}

impl PartialEq for TaxonSet {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for TaxonSet {}

impl Hash for TaxonSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl fmt::Display for TaxonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, t) in self.iter().enumerate() {
            if k > 0 {
                write!(f, " ")?;
            }
            write!(f, "{t}")?;
        }
        Ok(())
    }
}
