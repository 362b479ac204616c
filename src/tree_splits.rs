//! Splits of a phylogenetic tree.
//!
//! # Overview
//! Every edge of a tree divides the leaves into two groups, the leaves below
//! it and all others:
//! ```text
//!      root
//!     /    \
//!   {A,B}  {C,D}  ← this edge gives the split {A,B} | {C,D}
//! ```
//! The split is weighted by the edge length (0 when missing). Leaves are
//! matched to taxa by name, so the same tree file always yields the same
//! taxon indices whatever order the leaves were parsed in.
//!
//! In a rooted tree both root edges induce the same split; such duplicates
//! are merged and their lengths summed.

use crate::bitset::TaxonSet;
use crate::error::{Result, SplitsError};
use crate::split::Split;
use crate::splits::SplitSystem;
use crate::taxa::Taxa;
use phylotree::tree::Tree;
use std::collections::HashMap;

/// One split per edge of `tree`, over the taxa in `taxa`.
///
/// # Algorithm
/// 1. DFS from the root, building the set of taxa below each node bottom-up
///    (leaf: its own taxon; internal node: union of its children).
/// 2. Every non-root node contributes the split "taxa below | the rest",
///    weighted by its parent edge.
/// 3. Equal bipartitions are merged, keeping the first-seen order.
///
/// # Errors
/// `InvalidInput` if a leaf is unnamed or not in `taxa`, if a taxon occurs on
/// more than one leaf or on none; `Tree` if the tree has no root.
///
/// # Example
/// ```
/// # use splitsnet::{splits_from_tree, Taxa};
/// # use phylotree::tree::Tree;
/// let tree = Tree::from_newick("((A:1,B:1):2,(C:1,D:1):3);").unwrap();
/// let taxa = Taxa::new(["A", "B", "C", "D"]).unwrap();
/// let splits = splits_from_tree(&tree, &taxa).unwrap();
/// // four pendant edges and one internal edge made of the two root edges
/// assert_eq!(splits.len(), 5);
/// ```
pub fn splits_from_tree(tree: &Tree, taxa: &Taxa) -> Result<SplitSystem> {
    let ntax = taxa.len();
    let root = tree.get_root()?;

    let mut below: HashMap<usize, TaxonSet> = HashMap::new();
    let all = taxa_below(root, tree, taxa, &mut below)?;
    if all.cardinality() != ntax {
        return Err(SplitsError::InvalidInput(format!(
            "tree has {} of {ntax} taxa",
            all.cardinality()
        )));
    }

    // canonical side → (split side, summed length), first-seen order
    let mut order: Vec<TaxonSet> = Vec::new();
    let mut lengths: HashMap<TaxonSet, (TaxonSet, f64)> = HashMap::new();
    let mut stack = vec![root];
    while let Some(node_id) = stack.pop() {
        let node = tree.get(&node_id)?;
        stack.extend(node.children.iter().rev());
        if node_id == root {
            continue;
        }
        let side = &below[&node_id];
        if side.is_empty() || side.cardinality() == ntax {
            continue;
        }
        let canonical = if side.contains(1) { side.complement(ntax) } else { side.clone() };
        let length = node.parent_edge.unwrap_or(0.0);
        match lengths.get_mut(&canonical) {
            Some((_, total)) => *total += length,
            None => {
                order.push(canonical.clone());
                lengths.insert(canonical, (side.clone(), length));
            }
        }
    }

    let mut splits = SplitSystem::new(ntax);
    for canonical in order {
        if let Some((side, length)) = lengths.remove(&canonical) {
            splits.add_split(Split::new(side, ntax, length)?);
        }
    }
    splits.finalize();
    Ok(splits)
}

/// Taxa below `node_id`, memoized in `cache`.
fn taxa_below(
    node_id: usize,
    tree: &Tree,
    taxa: &Taxa,
    cache: &mut HashMap<usize, TaxonSet>,
) -> Result<TaxonSet> {
    if let Some(set) = cache.get(&node_id) {
        return Ok(set.clone());
    }

    let node = tree.get(&node_id)?;
    let ntax = taxa.len();
    let set = if node.children.is_empty() {
        let name = node
            .name
            .as_deref()
            .ok_or_else(|| SplitsError::InvalidInput(format!("leaf {node_id} has no name")))?;
        let taxon = taxa
            .index_of(name)
            .ok_or_else(|| SplitsError::InvalidInput(format!("leaf '{name}' is not a known taxon")))?;
        TaxonSet::singleton(ntax, taxon)
    } else {
        let mut set = TaxonSet::with_capacity(ntax);
        for &child in &node.children {
            let child_set = taxa_below(child, tree, taxa, cache)?;
            if set.intersects(&child_set) {
                return Err(SplitsError::InvalidInput(format!(
                    "taxa {} occur on more than one leaf",
                    set.intersection(&child_set)
                )));
            }
            set.or_assign(&child_set);
        }
        set
    };

    cache.insert(node_id, set.clone());
    Ok(set)
}
