//! Classification of a split system by how tree-like it is.
//!
//! The classes are nested: compatible ⊂ cyclic ⊂ weakly compatible ⊂ all
//! (Bandelt & Dress 1992). A system is reported in the strongest class it
//! belongs to.

use crate::split::Split;
use itertools::Itertools;
use std::fmt;

/// How tree-like a split system is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub enum Compatibility {
    /// All splits are pairwise compatible: the system is a tree.
    Compatible,
    /// Every split is a contiguous arc of one circular ordering.
    Cyclic,
    /// No three splits show a forbidden pattern.
    WeaklyCompatible,
    Incompatible,
    /// Not computed yet.
    #[default]
    Unknown,
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compatibility::Compatible => "compatible",
            Compatibility::Cyclic => "cyclic",
            Compatibility::WeaklyCompatible => "weakly compatible",
            Compatibility::Incompatible => "incompatible",
            Compatibility::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Classify `splits` given the circular ordering `cycle` of their taxa.
pub fn compute(ntax: usize, splits: &[Split], cycle: &[usize]) -> Compatibility {
    debug_assert!(cycle.is_empty() || cycle.len() == ntax);
    if is_compatible(splits) {
        Compatibility::Compatible
    } else if is_cyclic(splits, cycle) {
        Compatibility::Cyclic
    } else if is_weakly_compatible(splits) {
        Compatibility::WeaklyCompatible
    } else {
        Compatibility::Incompatible
    }
}

/// True if all pairs of splits are compatible.
pub fn is_compatible(splits: &[Split]) -> bool {
    splits
        .iter()
        .tuple_combinations()
        .all(|(s1, s2)| s1.is_compatible(s2))
}

/// True if every split is a contiguous arc of `cycle`.
pub fn is_cyclic(splits: &[Split], cycle: &[usize]) -> bool {
    !cycle.is_empty() && splits.iter().all(|split| split.is_circular(cycle))
}

/// True if no triple of splits exhibits either forbidden pattern.
///
/// Splits `A1|B1`, `A2|B2`, `A3|B3` violate weak compatibility if
/// `A1∩A2∩A3`, `A1∩B2∩B3`, `B1∩A2∩B3` and `B1∩B2∩A3` are all non-empty, or if
/// the same holds with every side swapped.
pub fn is_weakly_compatible(splits: &[Split]) -> bool {
    splits
        .iter()
        .tuple_combinations()
        .all(|(s1, s2, s3)| !violates_weak_compatibility(s1, s2, s3))
}

fn violates_weak_compatibility(s1: &Split, s2: &Split, s3: &Split) -> bool {
    let (a1, b1) = (s1.a(), s1.b());
    let (a2, b2) = (s2.a(), s2.b());
    let (a3, b3) = (s3.a(), s3.b());

    let forward = a1.intersects_both(a2, a3)
        && a1.intersects_both(b2, b3)
        && b1.intersects_both(a2, b3)
        && b1.intersects_both(b2, a3);
    let backward = b1.intersects_both(b2, b3)
        && b1.intersects_both(a2, a3)
        && a1.intersects_both(b2, a3)
        && a1.intersects_both(a2, b3);
    forward || backward
}
