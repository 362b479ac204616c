//! A single weighted bipartition of the taxon set.
//!
//! A split `A | B` divides the taxa `1..=ntax` into two non-empty parts, the
//! second being the complement of the first. Trivial splits (one side holds a
//! single taxon) represent pendant edges of a network.
//!
//! ```text
//!   1 --\            /-- 3
//!        >--------- <
//!   2 --/            \-- 4
//!
//!   edge in the middle = split {1,2} | {3,4}
//! ```

use crate::bitset::TaxonSet;
use crate::error::{Result, SplitsError};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A weighted bipartition `A | B` of the taxa `1..=ntax`.
///
/// # Fields
/// - `a`: the side the split was created from
/// - `b`: cached complement of `a`
/// - `weight`: non-negative support of the split
/// - `confidence`: optional confidence value (unset by default)
/// - `label`: optional free text
#[derive(Clone, Debug)]
pub struct Split {
    a: TaxonSet,
    b: TaxonSet,
    weight: f64,
    confidence: Option<f64>,
    label: Option<String>,
}

impl Split {
    /// Creates the split `a | complement(a)` over `ntax` taxa.
    ///
    /// # Errors
    /// Returns `SplitsError::InvalidSplit` if `a` is empty or holds every taxon.
    ///
    /// # Panics
    /// If `a` contains a taxon above `ntax`.
    ///
    /// # Example
    /// ```
    /// # use splitsnet::{Split, TaxonSet};
    /// let split = Split::new(TaxonSet::from_taxa(4, [1, 2]), 4, 1.5).unwrap();
    /// assert_eq!(split.b(), &TaxonSet::from_taxa(4, [3, 4]));
    /// assert!(Split::new(TaxonSet::with_capacity(4), 4, 1.0).is_err());
    /// ```
    pub fn new(a: TaxonSet, ntax: usize, weight: f64) -> Result<Self> {
        assert!(
            a.last().is_none_or(|t| t <= ntax),
            "split side {a} has taxa outside 1..={ntax}"
        );
        let size = a.cardinality();
        if size == 0 || size == ntax {
            return Err(SplitsError::InvalidSplit { size, ntax });
        }
        let b = a.complement(ntax);
        Ok(Split {
            a,
            b,
            weight,
            confidence: None,
            label: None,
        })
    }

    pub fn a(&self) -> &TaxonSet {
        &self.a
    }

    pub fn b(&self) -> &TaxonSet {
        &self.b
    }

    pub fn ntax(&self) -> usize {
        self.a.cardinality() + self.b.cardinality()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = Some(confidence);
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// The side that contains `taxon`.
    pub fn part_containing(&self, taxon: usize) -> &TaxonSet {
        if self.a.contains(taxon) { &self.a } else { &self.b }
    }

    /// The side that does not contain `taxon`.
    pub fn part_not_containing(&self, taxon: usize) -> &TaxonSet {
        if self.a.contains(taxon) { &self.b } else { &self.a }
    }

    /// The side without taxon 1, used to identify the split regardless of orientation.
    pub fn canonical(&self) -> &TaxonSet {
        self.part_not_containing(1)
    }

    /// Cardinality of the smaller side.
    pub fn size(&self) -> usize {
        self.a.cardinality().min(self.b.cardinality())
    }

    /// True for pendant splits separating a single taxon.
    pub fn is_trivial(&self) -> bool {
        self.size() == 1
    }

    /// True if taxa `i` and `j` lie on different sides.
    pub fn separates(&self, i: usize, j: usize) -> bool {
        self.a.contains(i) != self.a.contains(j)
    }

    /// Two splits `A|B` and `C|D` are compatible iff one of `A∩C`, `A∩D`,
    /// `B∩C`, `B∩D` is empty.
    pub fn is_compatible(&self, other: &Split) -> bool {
        !self.a.intersects(&other.a)
            || !self.a.intersects(&other.b)
            || !self.b.intersects(&other.a)
            || !self.b.intersects(&other.b)
    }

    /// True if one side forms a contiguous arc of the circular ordering `cycle`.
    ///
    /// The side not containing `cycle[0]` must be a contiguous run of the
    /// remaining positions.
    pub fn is_circular(&self, cycle: &[usize]) -> bool {
        let Some(&first) = cycle.first() else {
            return false;
        };
        let side = self.part_not_containing(first);
        let mut runs = 0;
        let mut inside = false;
        for &t in &cycle[1..] {
            let member = side.contains(t);
            if member && !inside {
                runs += 1;
            }
            inside = member;
        }
        runs == 1
    }
}

impl PartialEq for Split {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl Eq for Split {}

impl Hash for Split {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} | {{{}}} ({})", self.a, self.b, self.weight)
    }
}
