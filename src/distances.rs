//! Pairwise distances between taxa.
//!
//! # Overview
//! `DistanceMatrix` is the input of every distance-based algorithm in this
//! crate. It is indexed `1..=ntax` in both dimensions; row and column 0 exist
//! only so taxon indices can be used directly.
//!
//! A split system also induces a metric: the distance between two taxa is
//! the total weight of the splits separating them (`DistanceMatrix::from_splits`).

use crate::error::{Result, SplitsError};
use crate::split::Split;

/// Symmetric, non-negative `ntax × ntax` distance matrix with 1-based indices.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    ntax: usize,
    /// Row-major `(ntax + 1) × (ntax + 1)` values
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Creates an all-zero matrix for `ntax` taxa.
    pub fn new(ntax: usize) -> Self {
        DistanceMatrix {
            ntax,
            values: vec![0.0; (ntax + 1) * (ntax + 1)],
        }
    }

    /// Builds a matrix from square 0-based rows (`rows[i][j]` = d(i+1, j+1)).
    ///
    /// # Errors
    /// `SplitsError::InvalidInput` if the rows are not square or contain a
    /// negative or non-finite value off the diagonal.
    ///
    /// # Example
    /// ```
    /// # use splitsnet::DistanceMatrix;
    /// let d = DistanceMatrix::from_rows(&[
    ///     vec![0.0, 2.0, 3.0],
    ///     vec![2.0, 0.0, 3.0],
    ///     vec![3.0, 3.0, 0.0],
    /// ]).unwrap();
    /// assert_eq!(d.ntax(), 3);
    /// assert_eq!(d.get(1, 3), 3.0);
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let ntax = rows.len();
        let mut matrix = DistanceMatrix::new(ntax);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ntax {
                return Err(SplitsError::InvalidInput(format!(
                    "distance matrix row {} has {} entries, expected {ntax}",
                    i + 1,
                    row.len()
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if i == j {
                    continue;
                }
                if !value.is_finite() || value < 0.0 {
                    return Err(SplitsError::InvalidInput(format!(
                        "distance d({}, {}) = {value} is not a non-negative number",
                        i + 1,
                        j + 1
                    )));
                }
                matrix.values[(i + 1) * (ntax + 1) + j + 1] = value;
            }
        }
        Ok(matrix)
    }

    /// The split-induced metric: d(i, j) is the summed weight of all splits
    /// that separate `i` and `j`.
    pub fn from_splits(ntax: usize, splits: &[Split]) -> Self {
        let mut matrix = DistanceMatrix::new(ntax);
        for split in splits {
            for i in split.a().iter() {
                for j in split.b().iter() {
                    let value = matrix.get(i, j) + split.weight();
                    matrix.set(i, j, value);
                }
            }
        }
        matrix
    }

    pub fn ntax(&self) -> usize {
        self.ntax
    }

    /// Distance between taxa `i` and `j`.
    ///
    /// # Panics
    /// If `i` or `j` is not in `1..=ntax`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.index(i, j)]
    }

    /// Sets d(i, j) and d(j, i).
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let ij = self.index(i, j);
        let ji = self.index(j, i);
        self.values[ij] = value;
        self.values[ji] = value;
    }

    /// Fails with `InvalidInput` unless the matrix covers exactly `ntax` taxa.
    pub fn check_ntax(&self, ntax: usize) -> Result<()> {
        if self.ntax != ntax {
            return Err(SplitsError::InvalidInput(format!(
                "distance matrix has {} taxa, expected {ntax}",
                self.ntax
            )));
        }
        Ok(())
    }

    /// 0-based rows, the inverse of `from_rows`.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (1..=self.ntax)
            .map(|i| (1..=self.ntax).map(|j| self.get(i, j)).collect())
            .collect()
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        assert!(
            (1..=self.ntax).contains(&i) && (1..=self.ntax).contains(&j),
            "taxon pair ({i}, {j}) outside 1..={}",
            self.ntax
        );
        i * (self.ntax + 1) + j
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::TaxonSet;
    use itertools::Itertools;

    #[test]
    fn test_from_rows_is_one_based() {
        let d = DistanceMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        assert_eq!(d.get(1, 2), 1.0);
        assert_eq!(d.get(2, 1), 1.0);
        assert_eq!(d.to_rows(), vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let rows = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(matches!(
            DistanceMatrix::from_rows(&rows),
            Err(SplitsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(DistanceMatrix::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(&[vec![0.0, f64::NAN], vec![f64::NAN, 0.0]]).is_err());
    }

    #[test]
    fn test_check_ntax() {
        let d = DistanceMatrix::new(3);
        assert!(d.check_ntax(3).is_ok());
        assert!(d.check_ntax(4).is_err());
    }

    #[test]
    #[should_panic]
    fn test_taxon_zero_panics() {
        DistanceMatrix::new(3).get(0, 1);
    }

    #[test]
    fn test_split_metric() {
        // tree ((1,2),(3,4)) with pendant weights 1 and internal weight 3
        let ntax = 4;
        let mut splits: Vec<Split> = (1..=ntax)
            .map(|t| Split::new(TaxonSet::singleton(ntax, t), ntax, 1.0).unwrap())
            .collect();
        splits.push(Split::new(TaxonSet::from_taxa(ntax, [1, 2]), ntax, 3.0).unwrap());

        let d = DistanceMatrix::from_splits(ntax, &splits);
        for (i, j) in (1..=ntax).tuple_combinations() {
            let expected = if (i <= 2) == (j <= 2) { 2.0 } else { 5.0 };
            assert_eq!(d.get(i, j), expected, "d({i},{j})");
        }
    }
}
