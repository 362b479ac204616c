//! Python binding layer for the split, tree and network constructions.
//!
//! Inputs are plain lists (distance matrices as lists of rows, alignments as
//! lists of strings) and taxa are numbered from 1 as in the Rust API.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::characters::CharacterMatrix;
use crate::distances::DistanceMatrix;
use crate::error::SplitsError;
use crate::min_spanning_network::MinSpanningConfig;
use crate::parsimony::ParsimonyConfig;
use crate::progress::NoProgress;
use crate::splits::SplitSystem;
use crate::taxa::Taxa;

/// A split as (taxa on the side without taxon 1, weight).
type PySplit = (Vec<usize>, f64);

/// Compute the split decomposition of a distance matrix.
///
/// Args:
///     distances: Symmetric matrix as a list of rows
///
/// Returns:
///     A tuple of (splits, compatibility, cycle) where:
///     - splits is a list of (taxa, weight), taxa being the side without taxon 1
///     - compatibility is one of "compatible", "cyclic", "weakly compatible", "incompatible"
///     - cycle is the circular ordering of the taxa
///
/// Raises:
///     ValueError: If the matrix is not square or holds negative values
#[pyfunction]
#[pyo3(name = "split_decomposition")]
fn py_split_decomposition(distances: Vec<Vec<f64>>) -> PyResult<(Vec<PySplit>, String, Vec<usize>)> {
    let d = DistanceMatrix::from_rows(&distances).map_err(to_py_err)?;
    let splits = crate::decomposition::split_decomposition(&d, &mut NoProgress).map_err(to_py_err)?;
    Ok(describe(&splits))
}

/// Compute the Buneman tree of a distance matrix.
///
/// Args:
///     distances: Symmetric matrix as a list of rows
///
/// Returns:
///     A tuple of (splits, compatibility, cycle), as for `split_decomposition`
///
/// Raises:
///     ValueError: If the matrix is not square or holds negative values
#[pyfunction]
#[pyo3(name = "buneman_tree")]
fn py_buneman_tree(distances: Vec<Vec<f64>>) -> PyResult<(Vec<PySplit>, String, Vec<usize>)> {
    let d = DistanceMatrix::from_rows(&distances).map_err(to_py_err)?;
    let splits = crate::decomposition::buneman_tree(&d, &mut NoProgress).map_err(to_py_err)?;
    Ok(describe(&splits))
}

/// Compute the parsimony splits of an alignment.
///
/// Args:
///     sequences: One aligned sequence per taxon ('?' missing, '-' gap)
///     gaps_as_missing: Skip gap columns like missing data (default: True)
///     nucleotides: Treat IUPAC ambiguity codes as unknown (default: False)
///
/// Returns:
///     A tuple of (splits, compatibility, cycle), as for `split_decomposition`
///
/// Raises:
///     ValueError: If the sequences differ in length or there are none
#[pyfunction]
#[pyo3(name = "parsimony_splits", signature = (sequences, gaps_as_missing=true, nucleotides=false))]
fn py_parsimony_splits(
    sequences: Vec<String>,
    gaps_as_missing: bool,
    nucleotides: bool,
) -> PyResult<(Vec<PySplit>, String, Vec<usize>)> {
    let chars = CharacterMatrix::from_sequences(&sequences, nucleotides).map_err(to_py_err)?;
    let config = ParsimonyConfig { gaps_as_missing };
    let splits = crate::parsimony::parsimony_splits(&chars, &config, &mut NoProgress).map_err(to_py_err)?;
    Ok(describe(&splits))
}

/// Build the neighbor-joining tree of a distance matrix.
///
/// Args:
///     distances: Symmetric matrix as a list of rows
///     labels: Taxon names (default: t1, t2, ...)
///
/// Returns:
///     The tree in Newick format
///
/// Raises:
///     ValueError: If the matrix is malformed or the labels do not match it
#[pyfunction]
#[pyo3(name = "neighbor_joining", signature = (distances, labels=None))]
fn py_neighbor_joining(distances: Vec<Vec<f64>>, labels: Option<Vec<String>>) -> PyResult<String> {
    let d = DistanceMatrix::from_rows(&distances).map_err(to_py_err)?;
    let taxa = taxa_for(labels, d.ntax())?;
    let tree = crate::neighbor_joining::neighbor_joining(&d, &taxa, &mut NoProgress).map_err(to_py_err)?;
    tree.to_newick().map_err(to_py_err)
}

/// Build the minimum spanning network (or tree) of a distance matrix.
///
/// Args:
///     distances: Symmetric matrix as a list of rows
///     labels: Taxon names (default: t1, t2, ...)
///     epsilon: Extra distance range added once the network is connected (default: 0.0)
///     spanning_tree: Build a minimum spanning tree instead (default: False)
///
/// Returns:
///     The edges as a list of (label, label, distance)
///
/// Raises:
///     ValueError: If the matrix is malformed or the labels do not match it
#[pyfunction]
#[pyo3(name = "min_spanning_network", signature = (distances, labels=None, epsilon=0.0, spanning_tree=false))]
fn py_min_spanning_network(
    distances: Vec<Vec<f64>>,
    labels: Option<Vec<String>>,
    epsilon: f64,
    spanning_tree: bool,
) -> PyResult<Vec<(String, String, f64)>> {
    let d = DistanceMatrix::from_rows(&distances).map_err(to_py_err)?;
    let taxa = taxa_for(labels, d.ntax())?;
    let config = MinSpanningConfig {
        minimum_spanning_tree: spanning_tree,
        epsilon,
    };
    let graph = crate::min_spanning_network::min_spanning_network(&d, &taxa, &config, &mut NoProgress)
        .map_err(to_py_err)?;

    let label = |id: usize| graph.node(id).label.clone().unwrap_or_default();
    Ok(graph
        .edges()
        .map(|e| (label(e.source), label(e.target), e.weight))
        .collect())
}

/// Helper function to turn a split system into Python values
fn describe(splits: &SplitSystem) -> (Vec<PySplit>, String, Vec<usize>) {
    let list = splits
        .iter()
        .map(|s| (s.part_not_containing(1).iter().collect(), s.weight()))
        .collect();
    let cycle = splits.cycle().map(<[usize]>::to_vec).unwrap_or_default();
    (list, splits.compatibility().to_string(), cycle)
}

fn taxa_for(labels: Option<Vec<String>>, ntax: usize) -> PyResult<Taxa> {
    let taxa = match labels {
        Some(labels) => Taxa::new(labels).map_err(to_py_err)?,
        None => Taxa::numbered(ntax),
    };
    taxa.check_ntax(ntax).map_err(to_py_err)?;
    Ok(taxa)
}

fn to_py_err(e: SplitsError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python module definition
#[pymodule]
fn splitsnet(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_split_decomposition, m)?)?;
    m.add_function(wrap_pyfunction!(py_buneman_tree, m)?)?;
    m.add_function(wrap_pyfunction!(py_parsimony_splits, m)?)?;
    m.add_function(wrap_pyfunction!(py_neighbor_joining, m)?)?;
    m.add_function(wrap_pyfunction!(py_min_spanning_network, m)?)?;
    Ok(())
}
