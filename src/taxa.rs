//! Taxon labels, indexed `1..=ntax`.

use crate::error::{Result, SplitsError};
use std::collections::HashMap;

/// Label provider for the taxa of one computation.
///
/// Labels are only attached to graph leaves and output; no algorithm reads
/// them for its numbers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Taxa {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Taxa {
    /// # Errors
    /// `SplitsError::InvalidInput` on an empty or duplicate label.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut taxa = Taxa::default();
        for label in labels {
            let label = label.into();
            if label.is_empty() {
                return Err(SplitsError::InvalidInput(format!(
                    "taxon {} has an empty label",
                    taxa.labels.len() + 1
                )));
            }
            if taxa.index.contains_key(&label) {
                return Err(SplitsError::InvalidInput(format!("duplicate taxon label '{label}'")));
            }
            taxa.labels.push(label.clone());
            taxa.index.insert(label, taxa.labels.len());
        }
        Ok(taxa)
    }

    /// Taxa labelled `t1`, `t2`, ..., `tn`.
    pub fn numbered(ntax: usize) -> Self {
        let labels = (1..=ntax).map(|t| format!("t{t}")).collect::<Vec<_>>();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i + 1))
            .collect();
        Taxa { labels, index }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of taxon `t`.
    ///
    /// # Panics
    /// If `t` is not in `1..=len()`.
    pub fn label(&self, t: usize) -> &str {
        assert!(t >= 1, "taxon indices start at 1");
        &self.labels[t - 1]
    }

    /// Taxon index of `label`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Fails with `InvalidInput` unless there are exactly `ntax` taxa.
    pub fn check_ntax(&self, ntax: usize) -> Result<()> {
        if self.len() != ntax {
            return Err(SplitsError::InvalidInput(format!(
                "{} taxon labels given for {ntax} taxa",
                self.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_one_based() {
        let taxa = Taxa::new(["A", "B", "C"]).unwrap();
        assert_eq!(taxa.label(1), "A");
        assert_eq!(taxa.index_of("C"), Some(3));
        assert_eq!(taxa.index_of("D"), None);
    }

    #[test]
    fn test_rejects_duplicates() {
        assert!(Taxa::new(["A", "A"]).is_err());
        assert!(Taxa::new([""]).is_err());
    }

    #[test]
    fn test_numbered() {
        let taxa = Taxa::numbered(3);
        assert_eq!(taxa.labels(), &["t1", "t2", "t3"]);
        assert_eq!(taxa.index_of("t2"), Some(2));
        assert!(taxa.check_ntax(3).is_ok());
        assert!(taxa.check_ntax(2).is_err());
    }
}
