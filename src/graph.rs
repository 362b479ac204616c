//! Weighted graphs produced by neighbor joining and the minimum spanning network.
//!
//! # Overview
//! A `PhyloGraph` is an undirected graph whose leaves carry a taxon index and
//! label and whose internal nodes carry nothing. Edges carry a non-negative
//! weight. A graph that is a tree can be handed over to `phylotree` with
//! [`PhyloGraph::to_phylo_tree`], e.g. to print it as Newick.

use crate::error::{Result, SplitsError};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use phylotree::tree::{Node, Tree};
use std::collections::HashMap;

/// A node of a [`PhyloGraph`]: a taxon leaf or an unlabelled internal node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphNode {
    pub taxon: Option<usize>,
    pub label: Option<String>,
}

/// An undirected edge between two node indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl GraphEdge {
    /// The endpoint opposite `node`.
    pub fn opposite(&self, node: usize) -> usize {
        if self.source == node { self.target } else { self.source }
    }
}

/// Node indices are `petgraph` node indices; nodes are never removed, so
/// they stay dense and in insertion order.
#[derive(Clone, Debug, Default)]
pub struct PhyloGraph {
    graph: UnGraph<GraphNode, f64>,
    /// taxon → node index
    taxon_nodes: HashMap<usize, usize>,
}

impl PhyloGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the leaf of `taxon`; returns its node index.
    ///
    /// # Panics
    /// If the taxon already has a node.
    pub fn add_taxon_node(&mut self, taxon: usize, label: impl Into<String>) -> usize {
        let id = self.graph.add_node(GraphNode {
            taxon: Some(taxon),
            label: Some(label.into()),
        });
        let previous = self.taxon_nodes.insert(taxon, id.index());
        assert!(previous.is_none(), "taxon {taxon} already has a node");
        id.index()
    }

    /// Adds an unlabelled internal node; returns its node index.
    pub fn add_internal_node(&mut self) -> usize {
        self.graph.add_node(GraphNode::default()).index()
    }

    /// Connects `source` and `target`; returns the edge index.
    ///
    /// # Panics
    /// If either node does not exist.
    pub fn add_edge(&mut self, source: usize, target: usize, weight: f64) -> usize {
        assert!(
            source < self.graph.node_count() && target < self.graph.node_count(),
            "edge ({source}, {target}) between unknown nodes"
        );
        self.graph
            .add_edge(NodeIndex::new(source), NodeIndex::new(target), weight)
            .index()
    }

    /// The node with index `id`.
    ///
    /// # Panics
    /// If there is no such node.
    pub fn node(&self, id: usize) -> &GraphNode {
        &self.graph[NodeIndex::new(id)]
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.graph.edge_references().map(|e| GraphEdge {
            source: e.source().index(),
            target: e.target().index(),
            weight: *e.weight(),
        })
    }

    /// The underlying `petgraph` graph.
    pub fn graph(&self) -> &UnGraph<GraphNode, f64> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node index of the leaf carrying `taxon`.
    pub fn taxon_node(&self, taxon: usize) -> Option<usize> {
        self.taxon_nodes.get(&taxon).copied()
    }

    /// Node indices of the taxon leaves, in insertion order.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .node_indices()
            .filter(|&id| self.graph[id].taxon.is_some())
            .map(|id| id.index())
    }

    pub fn degree(&self, node: usize) -> usize {
        self.graph.edges(NodeIndex::new(node)).count()
    }

    /// True if an edge joins `a` and `b` (in either direction).
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// True if the graph has at most one connected component.
    pub fn is_connected(&self) -> bool {
        connected_components(&self.graph) <= 1
    }

    /// Converts a tree-shaped graph into a `phylotree` tree.
    ///
    /// The tree hangs from the first internal node (or from node 0 when
    /// there is none); leaves keep their labels and edges their weights.
    ///
    /// # Errors
    /// `InvalidInput` if the graph is empty or not a tree.
    pub fn to_phylo_tree(&self) -> Result<Tree> {
        if self.graph.node_count() == 0 {
            return Err(SplitsError::InvalidInput("empty graph".to_string()));
        }
        if self.graph.edge_count() + 1 != self.graph.node_count()
            || connected_components(&self.graph) != 1
        {
            return Err(SplitsError::InvalidInput(format!(
                "graph with {} nodes and {} edges is not a tree",
                self.graph.node_count(),
                self.graph.edge_count()
            )));
        }

        let root = self
            .graph
            .node_indices()
            .find(|&id| self.graph[id].taxon.is_none())
            .unwrap_or(NodeIndex::new(0));

        let mut tree = Tree::new();
        let root_id = tree.add(self.tree_node(root));
        let mut stack = vec![(root, None, root_id)];
        while let Some((node, parent, tree_id)) = stack.pop() {
            for edge in self.graph.edges(node) {
                let next = if edge.source() == node { edge.target() } else { edge.source() };
                if Some(next) == parent {
                    continue;
                }
                let child = tree.add_child(self.tree_node(next), tree_id, Some(*edge.weight()))?;
                stack.push((next, Some(node), child));
            }
        }
        Ok(tree)
    }

    /// Newick representation of a tree-shaped graph.
    pub fn to_newick(&self) -> Result<String> {
        Ok(self.to_phylo_tree()?.to_newick()?)
    }

    fn tree_node(&self, node: NodeIndex) -> Node {
        match &self.graph[node].label {
            Some(label) => Node::new_named(label),
            None => Node::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> PhyloGraph {
        let mut graph = PhyloGraph::new();
        let leaves: Vec<usize> = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, label)| graph.add_taxon_node(i + 1, *label))
            .collect();
        let center = graph.add_internal_node();
        for (leaf, w) in leaves.into_iter().zip([1.5, 2.5, 3.5]) {
            graph.add_edge(center, leaf, w);
        }
        graph
    }

    #[test]
    fn test_structure() {
        let graph = star();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.leaves().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(graph.degree(3), 3);
        assert_eq!(graph.taxon_node(2), Some(1));
        assert!(graph.has_edge(1, 3));
        assert!(!graph.has_edge(0, 1));
        assert_eq!(graph.edges().next().unwrap().opposite(3), 0);
        assert!(graph.is_connected());
        assert_eq!(connected_components(graph.graph()), 1);
    }

    #[test]
    fn test_disconnected() {
        let mut graph = PhyloGraph::new();
        graph.add_taxon_node(1, "A");
        graph.add_taxon_node(2, "B");
        assert!(!graph.is_connected());
        assert!(graph.to_phylo_tree().is_err());
    }

    #[test]
    #[should_panic]
    fn test_duplicate_taxon_panics() {
        let mut graph = PhyloGraph::new();
        graph.add_taxon_node(1, "A");
        graph.add_taxon_node(1, "B");
    }

    #[test]
    fn test_to_phylo_tree() {
        let tree = star().to_phylo_tree().unwrap();
        assert_eq!(tree.n_leaves(), 3);
        let root = tree.get_root().unwrap();
        assert_eq!(tree.get(&root).unwrap().children.len(), 3);

        let newick = star().to_newick().unwrap();
        for leaf in ["A:1.5", "B:2.5", "C:3.5"] {
            assert!(newick.contains(leaf), "{newick} lacks {leaf}");
        }
    }

    #[test]
    fn test_cycle_is_not_a_tree() {
        let mut graph = star();
        graph.add_edge(0, 1, 1.0);
        assert!(matches!(graph.to_phylo_tree(), Err(SplitsError::InvalidInput(_))));
    }
}
