//! `depends_on` graph for eager initialization.
//!
//! Nodes are canonical builder names, edges point from a builder to the
//! builders it declares in `depends_on`. [`DependsOnGraph::init_order`] returns
//! dependencies before their dependents and reports a cycle with its full path.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::core::error_builders::cycle_path;
use crate::core::{Result, WireError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Directed graph of builder names.
#[derive(Debug, Default)]
pub struct DependsOnGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependsOnGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without edges. Adding a name twice is a no-op.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), index);
        index
    }

    /// Record that `from` must be initialized after `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Fail with the first cycle found.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CircularDependency`] naming every node of the cycle,
    /// with the first node repeated at the end.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if colors.get(&node) != Some(&Color::White) {
                continue;
            }
            if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                return Err(WireError::CircularDependency {
                    path: cycle_path(cycle),
                });
            }
        }
        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|n| self.graph[*n].clone()).collect();
                    cycle.push(self.graph[neighbor].clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Every node, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CircularDependency`] when the graph has a cycle.
    pub fn init_order(&self) -> Result<Vec<String>> {
        self.detect_cycles()?;
        let sorted = toposort(&self.graph, None).map_err(|cycle| WireError::CircularDependency {
            path: self.graph[cycle.node_id()].clone(),
        })?;
        Ok(sorted.into_iter().rev().map(|index| self.graph[index].clone()).collect())
    }
}
