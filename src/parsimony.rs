//! Parsimony splits (p-splits) from a character matrix.
//!
//! # Overview
//! For a quartet `a1 a2 | b1 b2` every usable character column shows one of
//! three two-pair patterns (or none): `a1a2|b1b2`, `a1b1|a2b2` or `a1b2|a2b1`.
//! The p-score of the quartet is the number of columns supporting the first
//! pattern minus the smaller of the two others, floored at 0. The p-index of a
//! bipartition is the smallest p-score over its quartets, and splits with a
//! positive p-index are built taxon by taxon exactly like the split
//! decomposition.
//!
//! Reference: Bandelt & Dress (1992), "A canonical decomposition theory for
//! metrics on a finite set".

use crate::bitset::TaxonSet;
use crate::characters::CharacterMatrix;
use crate::error::Result;
use crate::incremental::{build_incrementally, quartet_index};
use crate::progress::ProgressListener;
use crate::splits::SplitSystem;
use log::info;

/// Options for [`parsimony_splits`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsimonyConfig {
    /// Skip columns where a quartet taxon has a gap (or, for nucleotides,
    /// an ambiguity code), as is done for missing data.
    pub gaps_as_missing: bool,
}

impl Default for ParsimonyConfig {
    fn default() -> Self {
        ParsimonyConfig {
            gaps_as_missing: true,
        }
    }
}

/// Builds the parsimony splits of `chars`.
///
/// # Errors
/// `InvalidInput` for an empty matrix, `Cancelled` from `progress`.
///
/// # Example
/// ```
/// # use splitsnet::{parsimony_splits, CharacterMatrix, NoProgress, ParsimonyConfig};
/// let chars = CharacterMatrix::from_sequences(&["AAAA", "AAAA", "CCAA", "CCAA"], true).unwrap();
/// let splits = parsimony_splits(&chars, &ParsimonyConfig::default(), &mut NoProgress).unwrap();
/// assert_eq!(splits.len(), 1);
/// assert_eq!(splits.get(0).unwrap().weight(), 2.0);
/// ```
pub fn parsimony_splits(
    chars: &CharacterMatrix,
    config: &ParsimonyConfig,
    progress: &mut dyn ProgressListener,
) -> Result<SplitSystem> {
    let scorer = ParsimonyScorer::new(chars, config);
    let splits = build_incrementally(chars.ntax(), progress, |t, near, far| {
        scorer.p_index(t, near, far)
    })?;
    info!(
        "Parsimony splits: {} splits from {} characters ({})",
        splits.len(),
        chars.nchar(),
        splits.compatibility()
    );
    Ok(splits)
}

/// Quartet scoring over a character matrix, with the rows and the per-cell
/// "skip" flags fetched once up front.
pub struct ParsimonyScorer<'a> {
    chars: &'a CharacterMatrix,
    /// `skip[t - 1][c]`: cell is missing (or gap/ambiguous when those count as missing)
    skip: Vec<Vec<bool>>,
}

impl<'a> ParsimonyScorer<'a> {
    pub fn new(chars: &'a CharacterMatrix, config: &ParsimonyConfig) -> Self {
        let skip = (1..=chars.ntax())
            .map(|t| {
                chars
                    .row(t)
                    .iter()
                    .map(|&symbol| {
                        chars.is_missing(symbol)
                            || (config.gaps_as_missing
                                && (chars.is_gap(symbol) || chars.is_ambiguous(symbol)))
                    })
                    .collect()
            })
            .collect();
        ParsimonyScorer { chars, skip }
    }

    /// p-score of the quartet `a1 a2 | b1 b2`.
    pub fn p_score(&self, a1: usize, a2: usize, b1: usize, b2: usize) -> usize {
        let taxa = [a1, a2, b1, b2];
        let rows = taxa.map(|t| self.chars.row(t));
        let skip = taxa.map(|t| &self.skip[t - 1]);

        let (mut same_sides, mut cross1, mut cross2) = (0usize, 0usize, 0usize);
        for c in 0..self.chars.nchar() {
            if skip.iter().any(|row| row[c]) {
                continue;
            }
            let [x1, x2, y1, y2] = rows.map(|row| symbol(row[c], self.chars.is_nucleotides()));
            if x1 == x2 && y1 == y2 && x1 != y1 {
                same_sides += 1;
            } else if x1 == y1 && x2 == y2 && x1 != x2 {
                cross1 += 1;
            } else if x1 == y2 && x2 == y1 && x1 != x2 {
                cross2 += 1;
            }
        }
        same_sides.saturating_sub(cross1.min(cross2))
    }

    /// p-index of the bipartition `near | far` of the taxa processed so far,
    /// over the quartets `t a2 | b1 b2` with `a2 ∈ near` and `b1 <= b2` in `far`.
    pub fn p_index(&self, t: usize, near: &TaxonSet, far: &TaxonSet) -> f64 {
        quartet_index(near, far, |a2, b1, b2| self.p_score(t, a2, b1, b2) as f64)
    }
}

#[inline]
fn symbol(byte: u8, nucleotides: bool) -> u8 {
    if nucleotides { byte.to_ascii_uppercase() } else { byte }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::Compatibility;
    use crate::error::SplitsError;
    use crate::progress::{NoProgress, ProgressLog};
    use crate::split::Split;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn chars(rows: &[&str]) -> CharacterMatrix {
        CharacterMatrix::from_sequences(rows, true).unwrap()
    }

    #[test]
    fn test_two_supporting_sites() {
        let m = chars(&["AAAAAA", "AAAAAA", "AAAAAA", "CCAAAA", "CCAAAA"]);
        let splits = parsimony_splits(&m, &ParsimonyConfig::default(), &mut NoProgress).unwrap();
        let expected = Split::new(TaxonSet::from_taxa(5, [4, 5]), 5, 0.0).unwrap();

        assert_eq!(splits.len(), 1);
        let split = splits.get(0).unwrap();
        assert_eq!(split, &expected);
        assert_eq!(split.weight(), 2.0);
        assert_eq!(splits.compatibility(), Compatibility::Compatible);
    }

    #[test]
    fn test_p_score_patterns() {
        // columns: supports 12|34 twice, 13|24 once, 14|23 once
        let m = chars(&["AAAC", "AACA", "CCAA", "CCCC"]);
        let scorer = ParsimonyScorer::new(&m, &ParsimonyConfig::default());
        assert_eq!(scorer.p_score(1, 2, 3, 4), 1);
        // the same quartet seen as 13|24 has one supporting column against two and one
        assert_eq!(scorer.p_score(1, 3, 2, 4), 0);
    }

    #[test]
    fn test_gaps_as_missing() {
        let m = chars(&["A-", "A-", "CA", "CA"]);
        let gap_state = ParsimonyScorer::new(&m, &ParsimonyConfig { gaps_as_missing: false });
        let gap_missing = ParsimonyScorer::new(&m, &ParsimonyConfig::default());
        // column 2 reads --|AA: a supporting column only when the gap is a state
        assert_eq!(gap_state.p_score(1, 2, 3, 4), 2);
        assert_eq!(gap_missing.p_score(1, 2, 3, 4), 1);
    }

    #[test]
    fn test_ambiguity_and_missing() {
        let m = chars(&["AN", "AN", "CC", "CC"]);
        let ambiguity_state = ParsimonyScorer::new(&m, &ParsimonyConfig { gaps_as_missing: false });
        let ambiguity_missing = ParsimonyScorer::new(&m, &ParsimonyConfig::default());
        assert_eq!(ambiguity_state.p_score(1, 2, 3, 4), 2);
        assert_eq!(ambiguity_missing.p_score(1, 2, 3, 4), 1);

        // missing data is skipped either way
        let m = chars(&["A?", "A?", "CC", "CC"]);
        for gaps_as_missing in [false, true] {
            let scorer = ParsimonyScorer::new(&m, &ParsimonyConfig { gaps_as_missing });
            assert_eq!(scorer.p_score(1, 2, 3, 4), 1);
        }
    }

    #[test]
    fn test_case_insensitive_nucleotides() {
        let m = chars(&["a", "A", "c", "C"]);
        let scorer = ParsimonyScorer::new(&m, &ParsimonyConfig::default());
        assert_eq!(scorer.p_score(1, 2, 3, 4), 1);
    }

    #[test]
    fn test_conflicting_sites_cancel() {
        // 12|34 and 13|24 each supported by two columns, 14|23 by none
        let m = chars(&["AAAA", "AACC", "CCAA", "CCCC"]);
        let scorer = ParsimonyScorer::new(&m, &ParsimonyConfig::default());
        assert_eq!(scorer.p_score(1, 2, 3, 4), 2);
        assert_eq!(scorer.p_score(1, 3, 2, 4), 2);
        assert_eq!(scorer.p_score(1, 4, 2, 3), 0);
    }

    #[test]
    fn test_weights_positive() {
        let m = chars(&["ACGTAC", "ACGTTC", "AGGAAC", "TGCAAG", "TGCAAC", "TGGTAG"]);
        let splits = parsimony_splits(&m, &ParsimonyConfig::default(), &mut NoProgress).unwrap();
        assert!(splits.iter().all(|s| s.weight() > 0.0));
        assert!(splits.cycle().is_some());
    }

    #[test]
    fn test_cancelled() {
        let m = chars(&["AAAA", "AAAA", "CCAA", "CCAA"]);
        let flag = Arc::new(AtomicBool::new(true));
        let mut progress = ProgressLog::new("parsimony").with_cancel_flag(flag);
        assert!(matches!(
            parsimony_splits(&m, &ParsimonyConfig::default(), &mut progress),
            Err(SplitsError::Cancelled)
        ));
    }

    fn alignment() -> impl Strategy<Value = Vec<String>> {
        (4usize..8, 1usize..12).prop_flat_map(|(ntax, nchar)| {
            prop::collection::vec(
                prop::collection::vec(prop::sample::select(b"ACGT-?N".to_vec()), nchar)
                    .prop_map(|row| row.into_iter().map(char::from).collect::<String>()),
                ntax,
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_weights_are_positive(rows in alignment()) {
            let m = CharacterMatrix::from_sequences(&rows, true).unwrap();
            for gaps_as_missing in [true, false] {
                let config = ParsimonyConfig { gaps_as_missing };
                let splits = parsimony_splits(&m, &config, &mut NoProgress).unwrap();
                for split in &splits {
                    prop_assert!(split.weight() > 0.0, "{} with gaps_as_missing={}", split, gaps_as_missing);
                }
                prop_assert_ne!(splits.compatibility(), Compatibility::Unknown);
            }
        }
    }
}
