//! 帧图
//!
//! Undirected graph over frame indices, adjacency only, no self loops.

use std::collections::BTreeSet;

use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl FrameGraph {
    pub fn new(num_vertices: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); num_vertices],
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Self loops are ignored.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }

    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[v].iter().copied()
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    /// Every vertex is in `set` or adjacent to a member of it.
    pub fn is_dominating_set(&self, set: &[usize]) -> bool {
        let mut dominated = vec![false; self.num_vertices()];
        for &v in set {
            dominated[v] = true;
            for u in self.neighbors(v) {
                dominated[u] = true;
            }
        }
        dominated.into_iter().all(|d| d)
    }

    /// 贪心支配集
    ///
    /// Repeatedly picks the vertex whose closed neighbourhood contains the
    /// most not yet dominated vertices; ties go to the smallest index.
    /// Returns the chosen vertices in ascending order.
    pub fn greedy_dominating_set(&self) -> Vec<usize> {
        let n = self.num_vertices();
        let mut dominated = vec![false; n];
        let mut chosen = vec![false; n];
        // gain[v] = number of undominated vertices in N[v]
        let mut gain: Vec<usize> = (0..n).map(|v| self.degree(v) + 1).collect();
        let mut remaining = n;
        while remaining > 0 {
            // 只在单次迭代内部并行
            let best = gain
                .par_iter()
                .enumerate()
                .filter(|(v, _)| !chosen[*v])
                .map(|(v, &g)| (g, std::cmp::Reverse(v)))
                .max();
            let Some((g, std::cmp::Reverse(v))) = best else {
                break;
            };
            if g == 0 {
                break;
            }
            chosen[v] = true;
            for u in std::iter::once(v).chain(self.neighbors(v)) {
                if dominated[u] {
                    continue;
                }
                dominated[u] = true;
                remaining -= 1;
                // u 被支配后, N[u] 中每个顶点的收益减一
                for w in std::iter::once(u).chain(self.neighbors(u)) {
                    gain[w] -= 1;
                }
            }
            log::trace!("dominating set: picked {v} (gain {g}), {remaining} left");
        }
        (0..n).filter(|&v| chosen[v]).collect()
    }
}
