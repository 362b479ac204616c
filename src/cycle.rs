//! Circular ordering of the taxa for a split system.
//!
//! # Overview
//! The splits are turned into their induced metric (d(i, j) = weight of the
//! splits separating i and j) and the NeighborNet agglomeration of Bryant &
//! Huson is run on it. For a circular split system the resulting ordering puts
//! every split on a contiguous arc, which is what circular network layouts
//! need; for other systems it is a good compromise.
//!
//! # Algorithm
//! 1. Agglomerate: clusters hold one or two nodes. Repeatedly pick the two
//!    closest clusters (Q-criterion on averaged cluster distances), then the
//!    closest nodes inside them, and merge them 2-, 3- or 4-way. A 3-way merge
//!    of x, y, z replaces them by two new linked nodes u = {x, y}, v = {y, z}.
//! 2. Expand: starting from the last three active nodes arranged in a ring,
//!    undo the 3-way merges in reverse order, splicing x, y, z in place of u, v.
//! 3. Read the ring starting at taxon 1, heading towards the smaller neighbour.

use crate::distances::DistanceMatrix;
use crate::error::{Result, SplitsError};
use crate::split::Split;
use log::warn;

const EPSILON: f64 = 1e-12;
const HEAD: usize = 0;

/// Circular ordering of `1..=ntax` for `splits`, starting with taxon 1.
///
/// Deterministic for a given split list. Falls back to the identity ordering
/// for three or fewer taxa, or if the agglomeration breaks an invariant.
pub fn compute_cycle(ntax: usize, splits: &[Split]) -> Vec<usize> {
    if ntax <= 3 {
        return (1..=ntax).collect();
    }
    let distances = DistanceMatrix::from_splits(ntax, splits);
    match neighbor_net_ordering(&distances) {
        Ok(cycle) => cycle,
        Err(e) => {
            warn!("Circular ordering failed ({e}); using identity ordering");
            (1..=ntax).collect()
        }
    }
}

/// NeighborNet circular ordering of the taxa of `distances`, starting with taxon 1.
pub fn neighbor_net_ordering(distances: &DistanceMatrix) -> Result<Vec<usize>> {
    let ntax = distances.ntax();
    if ntax <= 3 {
        return Ok((1..=ntax).collect());
    }
    let mut net = Agglomeration::new(distances);
    net.join_nodes()?;
    net.expand_nodes()
}

#[derive(Clone, Debug, Default)]
struct NetNode {
    /// Active list links
    next: Option<usize>,
    prev: Option<usize>,
    /// Cluster partner
    nbr: Option<usize>,
    /// Children of a 3-way merge
    ch1: Option<usize>,
    ch2: Option<usize>,
    sx: f64,
    rx: f64,
}

/// Working state of the agglomeration. Node ids double as indices into
/// `nodes` and `mat`; 0 is the head of the active list, `1..=ntax` the taxa.
struct Agglomeration {
    ntax: usize,
    mat: Vec<Vec<f64>>,
    nodes: Vec<NetNode>,
    joins: Vec<usize>,
    num_nodes: usize,
}

impl Agglomeration {
    fn new(distances: &DistanceMatrix) -> Self {
        let ntax = distances.ntax();
        // every 3-way merge adds two nodes, and there are ntax - 3 of them
        let max_nodes = 3 * ntax - 5;
        let mut mat = vec![vec![0.0; max_nodes]; max_nodes];
        for i in 1..=ntax {
            for j in 1..=ntax {
                if i != j {
                    mat[i][j] = distances.get(i, j);
                }
            }
        }
        let mut nodes = vec![NetNode::default(); max_nodes];
        for id in 0..=ntax {
            nodes[id].next = (id < ntax).then_some(id + 1);
            nodes[id].prev = id.checked_sub(1);
        }
        Agglomeration {
            ntax,
            mat,
            nodes,
            joins: Vec::new(),
            num_nodes: ntax,
        }
    }

    fn join_nodes(&mut self) -> Result<()> {
        let mut num_active = self.ntax;
        let mut num_clusters = self.ntax;

        while num_active > 3 {
            if num_active == 4 && num_clusters == 2 {
                let active = self.active_nodes();
                let p = active[0];
                let q = if Some(active[1]) != self.nodes[p].nbr { active[1] } else { active[2] };
                let pn = self.partner(p)?;
                let qn = self.partner(q)?;
                if self.mat[p][q] + self.mat[pn][qn] < self.mat[p][qn] + self.mat[pn][q] {
                    self.join3way(p, q, qn)?;
                } else {
                    self.join3way(p, qn, q)?;
                }
                break;
            }

            self.compute_sx();
            let (cx, cy) = self.closest_clusters(num_clusters)?;

            if self.nodes[cx].nbr.is_some() || self.nodes[cy].nbr.is_some() {
                for z in [Some(cx), self.nodes[cx].nbr, Some(cy), self.nodes[cy].nbr]
                    .into_iter()
                    .flatten()
                {
                    self.nodes[z].rx = self.compute_rx(z, cx, cy);
                }
            }

            let (x, y) = self.closest_nodes(cx, cy, num_clusters);

            match (self.nodes[x].nbr, self.nodes[y].nbr) {
                (None, None) => {
                    self.nodes[x].nbr = Some(y);
                    self.nodes[y].nbr = Some(x);
                    num_clusters -= 1;
                }
                (None, Some(yb)) => {
                    self.join3way(x, y, yb)?;
                    num_active -= 1;
                    num_clusters -= 1;
                }
                (Some(xb), yb) => {
                    if yb.is_none() || num_active == 4 {
                        self.join3way(y, x, xb)?;
                        num_active -= 1;
                    } else {
                        let yb = self.partner(y)?;
                        let u = self.join3way(xb, x, y)?;
                        let v = self.partner(u)?;
                        self.join3way(u, v, yb)?;
                        num_active -= 2;
                    }
                    num_clusters -= 1;
                }
            }
        }
        Ok(())
    }

    /// Sx: summed averaged distance from each cluster to all other clusters.
    fn compute_sx(&mut self) {
        let active = self.active_nodes();
        for &p in &active {
            self.nodes[p].sx = 0.0;
        }
        for (pos, &p) in active.iter().enumerate() {
            if self.nodes[p].nbr.is_some_and(|nb| nb < p) {
                continue;
            }
            for &q in &active[pos + 1..] {
                let counted = match self.nodes[q].nbr {
                    None => true,
                    Some(nb) => nb > q && nb != p,
                };
                if !counted {
                    continue;
                }
                let dpq = self.cluster_distance(p, q);
                for z in [Some(p), self.nodes[p].nbr, Some(q), self.nodes[q].nbr]
                    .into_iter()
                    .flatten()
                {
                    self.nodes[z].sx += dpq;
                }
            }
        }
    }

    /// Pair of cluster representatives minimizing the Q-criterion; ties go to
    /// the lexicographically smallest pair of ids.
    fn closest_clusters(&self, num_clusters: usize) -> Result<(usize, usize)> {
        let active = self.active_nodes();
        let mut best: Option<(usize, usize, f64)> = None;
        for &p in &active {
            if self.nodes[p].nbr.is_some_and(|nb| nb < p) {
                continue;
            }
            for &q in &active {
                if q == p {
                    break;
                }
                if self.nodes[q].nbr.is_some_and(|nb| nb < q) || self.nodes[q].nbr == Some(p) {
                    continue;
                }
                let qpq = (num_clusters as f64 - 2.0) * self.cluster_distance(p, q)
                    - self.nodes[p].sx
                    - self.nodes[q].sx;
                let better = match best {
                    None => true,
                    Some((bx, by, bq)) => {
                        qpq - bq < -EPSILON
                            || ((qpq - bq).abs() <= EPSILON && pair_key(p, q) < pair_key(bx, by))
                    }
                };
                if better {
                    best = Some((p, q, qpq));
                }
            }
        }
        best.map(|(p, q, _)| (p, q))
            .ok_or(SplitsError::Internal("no pair of clusters to join"))
    }

    /// Pick the two nodes to merge from the clusters of `cx` and `cy`.
    fn closest_nodes(&self, cx: usize, cy: usize, num_clusters: usize) -> (usize, usize) {
        let mut m = num_clusters;
        if self.nodes[cx].nbr.is_some() {
            m += 1;
        }
        if self.nodes[cy].nbr.is_some() {
            m += 1;
        }
        let m = m as f64 - 2.0;
        let q = |a: usize, b: usize| m * self.mat[a][b] - self.nodes[a].rx - self.nodes[b].rx;

        let mut best = (cx, cy, q(cx, cy));
        let candidates = [
            self.nodes[cx].nbr.map(|xb| (xb, cy)),
            self.nodes[cy].nbr.map(|yb| (cx, yb)),
            self.nodes[cx].nbr.zip(self.nodes[cy].nbr),
        ];
        for (a, b) in candidates.into_iter().flatten() {
            let value = q(a, b);
            if value - best.2 < -EPSILON {
                best = (a, b, value);
            }
        }
        (best.0, best.1)
    }

    fn compute_rx(&self, z: usize, cx: usize, cy: usize) -> f64 {
        self.active_nodes()
            .into_iter()
            .map(|p| {
                let term = self.mat[z][p];
                let whole = p == cx
                    || self.nodes[cx].nbr == Some(p)
                    || p == cy
                    || self.nodes[cy].nbr == Some(p)
                    || self.nodes[p].nbr.is_none();
                if whole { term } else { term / 2.0 }
            })
            .sum()
    }

    fn cluster_distance(&self, p: usize, q: usize) -> f64 {
        let d = &self.mat;
        match (self.nodes[p].nbr, self.nodes[q].nbr) {
            (None, None) => d[p][q],
            (Some(pb), None) => 0.5 * (d[p][q] + d[pb][q]),
            (None, Some(qb)) => 0.5 * (d[p][q] + d[p][qb]),
            (Some(pb), Some(qb)) => 0.25 * (d[p][q] + d[p][qb] + d[pb][q] + d[pb][qb]),
        }
    }

    /// Replace x, y, z by the linked pair u = {x, y}, v = {y, z}; returns u.
    fn join3way(&mut self, x: usize, y: usize, z: usize) -> Result<usize> {
        let u = self.num_nodes + 1;
        let v = self.num_nodes + 2;
        if v >= self.nodes.len() {
            return Err(SplitsError::Internal("node capacity exceeded"));
        }
        self.num_nodes += 2;

        self.nodes[u] = NetNode {
            ch1: Some(x),
            ch2: Some(y),
            nbr: Some(v),
            ..NetNode::default()
        };
        self.nodes[v] = NetNode {
            ch1: Some(y),
            ch2: Some(z),
            nbr: Some(u),
            ..NetNode::default()
        };

        self.replace_in_list(x, u);
        self.replace_in_list(z, v);
        let (ny, py) = (self.nodes[y].next, self.nodes[y].prev);
        if let Some(ny) = ny {
            self.nodes[ny].prev = py;
        }
        if let Some(py) = py {
            self.nodes[py].next = ny;
        }

        for p in self.active_nodes() {
            let du = (2.0 / 3.0) * self.mat[x][p] + self.mat[y][p] / 3.0;
            let dv = (2.0 / 3.0) * self.mat[z][p] + self.mat[y][p] / 3.0;
            self.mat[u][p] = du;
            self.mat[p][u] = du;
            self.mat[v][p] = dv;
            self.mat[p][v] = dv;
        }
        self.mat[u][u] = 0.0;
        self.mat[v][v] = 0.0;

        self.joins.push(u);
        Ok(u)
    }

    fn replace_in_list(&mut self, old: usize, new: usize) {
        let (next, prev) = (self.nodes[old].next, self.nodes[old].prev);
        self.nodes[new].next = next;
        self.nodes[new].prev = prev;
        if let Some(next) = next {
            self.nodes[next].prev = Some(new);
        }
        if let Some(prev) = prev {
            self.nodes[prev].next = Some(new);
        }
    }

    fn expand_nodes(&mut self) -> Result<Vec<usize>> {
        let x = self.next(HEAD)?;
        let y = self.next(x)?;
        let z = self.next(y)?;
        self.nodes[z].next = Some(x);
        self.nodes[x].prev = Some(z);

        while let Some(joined) = self.joins.pop() {
            let mut u = joined;
            let mut v = self.partner(u)?;
            let mut x = self.nodes[u].ch1.ok_or(SplitsError::Internal("merged node without children"))?;
            let y = self.nodes[u].ch2.ok_or(SplitsError::Internal("merged node without children"))?;
            let mut z = self.nodes[v].ch2.ok_or(SplitsError::Internal("merged node without children"))?;

            if self.nodes[u].next == Some(v) {
                // already in ring order
            } else if self.nodes[v].next == Some(u) {
                std::mem::swap(&mut u, &mut v);
                std::mem::swap(&mut x, &mut z);
            } else {
                return Err(SplitsError::Internal("merged nodes are not adjacent in the ring"));
            }

            let before = self.prev(u)?;
            let after = self.next(v)?;
            self.link(before, x);
            self.link(x, y);
            self.link(y, z);
            self.link(z, after);
        }

        let forward = self.next(1)? <= self.prev(1)?;
        let mut cycle = Vec::with_capacity(self.ntax);
        let mut current = 1;
        for _ in 0..self.ntax {
            if current == HEAD || current > self.ntax || cycle.contains(&current) {
                return Err(SplitsError::Internal("ring does not consist of the taxa"));
            }
            cycle.push(current);
            current = if forward { self.next(current)? } else { self.prev(current)? };
        }
        Ok(cycle)
    }

    fn link(&mut self, a: usize, b: usize) {
        self.nodes[a].next = Some(b);
        self.nodes[b].prev = Some(a);
    }

    fn next(&self, node: usize) -> Result<usize> {
        self.nodes[node].next.ok_or(SplitsError::Internal("broken active list"))
    }

    fn prev(&self, node: usize) -> Result<usize> {
        self.nodes[node].prev.ok_or(SplitsError::Internal("broken active list"))
    }

    fn partner(&self, node: usize) -> Result<usize> {
        self.nodes[node].nbr.ok_or(SplitsError::Internal("expected a cluster partner"))
    }

    fn active_nodes(&self) -> Vec<usize> {
        let mut active = Vec::new();
        let mut current = self.nodes[HEAD].next;
        while let Some(p) = current {
            active.push(p);
            current = self.nodes[p].next;
        }
        active
    }
}

#[inline]
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::TaxonSet;
    use crate::compatibility::is_cyclic;

    fn arc_splits(order: &[usize]) -> Vec<Split> {
        let ntax = order.len();
        let mut splits: Vec<Split> = (1..=ntax)
            .map(|t| Split::new(TaxonSet::singleton(ntax, t), ntax, 1.0).unwrap())
            .collect();
        for k in 0..ntax {
            let side = TaxonSet::from_taxa(ntax, [order[k], order[(k + 1) % ntax]]);
            splits.push(Split::new(side, ntax, 2.0).unwrap());
        }
        splits
    }

    fn assert_permutation(cycle: &[usize], ntax: usize) {
        let mut sorted = cycle.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=ntax).collect::<Vec<_>>());
        assert_eq!(cycle[0], 1);
    }

    #[test]
    fn test_small_sets_are_identity() {
        assert_eq!(compute_cycle(3, &[]), vec![1, 2, 3]);
        assert_eq!(compute_cycle(1, &[]), vec![1]);
        assert!(compute_cycle(0, &[]).is_empty());
    }

    #[test]
    fn test_recovers_circular_system() {
        let order = [1, 4, 2, 6, 3, 5];
        let splits = arc_splits(&order);
        let cycle = compute_cycle(6, &splits);
        assert_permutation(&cycle, 6);
        assert!(is_cyclic(&splits, &cycle), "cycle {cycle:?} breaks an arc");
    }

    #[test]
    fn test_tree_splits_are_arcs() {
        // (((1,3),5),(2,(4,6)))
        let ntax = 6;
        let mut splits: Vec<Split> = (1..=ntax)
            .map(|t| Split::new(TaxonSet::singleton(ntax, t), ntax, 1.0).unwrap())
            .collect();
        for side in [vec![1, 3], vec![1, 3, 5], vec![4, 6]] {
            splits.push(Split::new(TaxonSet::from_taxa(ntax, side), ntax, 1.5).unwrap());
        }
        let cycle = compute_cycle(ntax, &splits);
        assert_permutation(&cycle, ntax);
        assert!(is_cyclic(&splits, &cycle), "cycle {cycle:?} breaks a tree split");
    }

    #[test]
    fn test_deterministic() {
        let splits = arc_splits(&[1, 5, 3, 7, 2, 4, 6]);
        assert_eq!(compute_cycle(7, &splits), compute_cycle(7, &splits));
    }

    #[test]
    fn test_ordering_on_distances() {
        let d = DistanceMatrix::from_rows(&[
            vec![0.0, 5.0, 9.0, 9.0, 8.0],
            vec![5.0, 0.0, 10.0, 10.0, 9.0],
            vec![9.0, 10.0, 0.0, 8.0, 7.0],
            vec![9.0, 10.0, 8.0, 0.0, 3.0],
            vec![8.0, 9.0, 7.0, 3.0, 0.0],
        ])
        .unwrap();
        let cycle = neighbor_net_ordering(&d).unwrap();
        assert!(
            cycle == vec![1, 2, 5, 4, 3] || cycle == vec![1, 3, 4, 5, 2],
            "unexpected ordering {cycle:?}"
        );
    }

    #[test]
    fn test_zero_weights_still_permutation() {
        let cycle = compute_cycle(5, &[]);
        assert_permutation(&cycle, 5);
    }
}
