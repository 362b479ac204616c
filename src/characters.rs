//! Discrete character data (aligned sequences) for parsimony-based splits.

use crate::error::{Result, SplitsError};

pub const DEFAULT_MISSING: u8 = b'?';
pub const DEFAULT_GAP: u8 = b'-';

/// `ntax × nchar` matrix of single-byte symbols, indexed from 1 in both
/// dimensions.
///
/// Two symbols are reserved: `missing` (unknown state) and `gap`
/// (alignment gap). For nucleotide data every other symbol outside
/// `ACGTU` is an ambiguity code.
#[derive(Clone, Debug)]
pub struct CharacterMatrix {
    rows: Vec<Vec<u8>>,
    nchar: usize,
    missing: u8,
    gap: u8,
    nucleotides: bool,
}

impl CharacterMatrix {
    /// Builds a matrix from one row of symbols per taxon.
    ///
    /// # Errors
    /// `SplitsError::InvalidInput` if the rows differ in length.
    ///
    /// # Example
    /// ```
    /// # use splitsnet::CharacterMatrix;
    /// let chars = CharacterMatrix::new(vec![b"AC-".to_vec(), b"AG?".to_vec()], b'?', b'-', true).unwrap();
    /// assert_eq!(chars.ntax(), 2);
    /// assert_eq!(chars.get(2, 2), b'G');
    /// assert!(chars.is_missing(chars.get(2, 3)));
    /// ```
    pub fn new(rows: Vec<Vec<u8>>, missing: u8, gap: u8, nucleotides: bool) -> Result<Self> {
        let nchar = rows.first().map_or(0, Vec::len);
        if let Some((t, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != nchar) {
            return Err(SplitsError::InvalidInput(format!(
                "taxon {} has {} characters, expected {nchar}",
                t + 1,
                row.len()
            )));
        }
        Ok(CharacterMatrix {
            rows,
            nchar,
            missing,
            gap,
            nucleotides,
        })
    }

    /// Builds a matrix from sequence strings with the default `?` and `-` symbols.
    pub fn from_sequences<S: AsRef<str>>(sequences: &[S], nucleotides: bool) -> Result<Self> {
        let rows = sequences
            .iter()
            .map(|s| s.as_ref().as_bytes().to_vec())
            .collect();
        Self::new(rows, DEFAULT_MISSING, DEFAULT_GAP, nucleotides)
    }

    pub fn ntax(&self) -> usize {
        self.rows.len()
    }

    pub fn nchar(&self) -> usize {
        self.nchar
    }

    pub fn missing(&self) -> u8 {
        self.missing
    }

    pub fn gap(&self) -> u8 {
        self.gap
    }

    pub fn is_nucleotides(&self) -> bool {
        self.nucleotides
    }

    /// Symbol of taxon `t` at character `c`.
    ///
    /// # Panics
    /// If `t` or `c` is out of range.
    #[inline]
    pub fn get(&self, t: usize, c: usize) -> u8 {
        assert!(t >= 1 && c >= 1, "taxon and character indices start at 1");
        self.rows[t - 1][c - 1]
    }

    /// All symbols of taxon `t`.
    #[inline]
    pub fn row(&self, t: usize) -> &[u8] {
        assert!(t >= 1, "taxon indices start at 1");
        &self.rows[t - 1]
    }

    #[inline]
    pub fn is_missing(&self, symbol: u8) -> bool {
        symbol == self.missing
    }

    #[inline]
    pub fn is_gap(&self, symbol: u8) -> bool {
        symbol == self.gap
    }

    /// True for nucleotide symbols other than `ACGTU`, gap and missing.
    #[inline]
    pub fn is_ambiguous(&self, symbol: u8) -> bool {
        self.nucleotides
            && !self.is_gap(symbol)
            && !self.is_missing(symbol)
            && !matches!(symbol.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'U')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_rows() {
        let err = CharacterMatrix::from_sequences(&["ACGT", "ACG"], true).unwrap_err();
        assert!(matches!(err, SplitsError::InvalidInput(_)));
    }

    #[test]
    fn test_ambiguity_only_for_nucleotides() {
        let dna = CharacterMatrix::from_sequences(&["ANRt"], true).unwrap();
        assert!(!dna.is_ambiguous(b'A'));
        assert!(dna.is_ambiguous(b'N'));
        assert!(dna.is_ambiguous(b'R'));
        assert!(!dna.is_ambiguous(b't'));
        assert!(!dna.is_ambiguous(b'-'));

        let protein = CharacterMatrix::from_sequences(&["NR"], false).unwrap();
        assert!(!protein.is_ambiguous(b'N'));
    }

    #[test]
    fn test_dimensions() {
        let chars = CharacterMatrix::from_sequences(&["AC", "GT", "A-"], true).unwrap();
        assert_eq!(chars.ntax(), 3);
        assert_eq!(chars.nchar(), 2);
        assert_eq!(chars.row(3), b"A-");
        assert!(chars.is_gap(chars.get(3, 2)));
    }
}
