//! Undirected weighted character graph built from interaction counts

use std::collections::HashMap;

// petgraph via rustworkx-core keeps one petgraph version in the tree
use rustworkx_core::petgraph::graph::{NodeIndex, UnGraph};
use rustworkx_core::petgraph::visit::EdgeRef;

use crate::roster::Roster;
use crate::scanner::InteractionCounts;

/// Node weight = character id, edge weight = interaction count
pub struct InteractionGraph {
    graph: UnGraph<String, usize>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl Default for InteractionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            id_to_index: HashMap::new(),
        }
    }

    /// One node per roster character (isolated ones included) plus any id
    /// that only appears in `counts`
    pub fn from_counts(counts: &InteractionCounts, roster: &Roster) -> Self {
        let mut graph = Self::new();
        for id in roster.ids() {
            graph.ensure_node(id);
        }
        graph.add_counts(counts);
        graph
    }

    pub fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.id_to_index.insert(id.to_string(), idx);
        idx
    }

    /// Add weights onto existing edges, creating nodes and edges as needed
    pub fn add_counts(&mut self, counts: &InteractionCounts) {
        for (a, b, weight) in counts.iter() {
            let ai = self.ensure_node(a);
            let bi = self.ensure_node(b);
            match self.graph.find_edge(ai, bi) {
                Some(edge) => {
                    if let Some(w) = self.graph.edge_weight_mut(edge) {
                        *w += weight;
                    }
                }
                None => {
                    self.graph.add_edge(ai, bi, weight);
                }
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    /// Edge weight, 0 when the pair never interacted
    pub fn weight(&self, a: &str, b: &str) -> usize {
        let (Some(&ai), Some(&bi)) = (self.id_to_index.get(a), self.id_to_index.get(b)) else {
            return 0;
        };
        self.graph
            .find_edge(ai, bi)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
            .unwrap_or(0)
    }

    /// Neighbor ids, sorted
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.id_to_index.get(id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Sum of incident edge weights
    pub fn weighted_degree(&self, id: &str) -> usize {
        self.id_to_index
            .get(id)
            .map(|&idx| self.graph.edges(idx).map(|e| *e.weight()).sum())
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Raw petgraph reference for further analysis
    pub fn raw_graph(&self) -> &UnGraph<String, usize> {
        &self.graph
    }
}
