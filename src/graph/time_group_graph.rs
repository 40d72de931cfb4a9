use crate::profile::Profile;
use crate::time_group::TimeGroupLayoutTarget;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Time groups as nodes, one edge per layout cell pointing at another group.
pub struct TimeGroupGraph {
    pub graph: DiGraph<String, usize>,
    pub id_to_index: HashMap<String, NodeIndex>,
}

impl TimeGroupGraph {
    pub fn build(profile: &Profile) -> Self {
        let mut graph: DiGraph<String, usize> = DiGraph::new();
        let mut id_to_index: HashMap<String, NodeIndex> = HashMap::new();

        for id in profile.time_groups.keys() {
            let node_ix = graph.add_node(id.clone());
            id_to_index.insert(id.clone(), node_ix);
        }

        // Edge weight is the layout index of the cell.
        for (id, time_group) in &profile.time_groups {
            for (cell, target) in time_group.layout.iter().enumerate() {
                if let TimeGroupLayoutTarget::ToTimeGroup { id: child, .. } = target {
                    if let (Some(&u), Some(&v)) = (id_to_index.get(id), id_to_index.get(child)) {
                        graph.add_edge(u, v, cell);
                    }
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// Groups of time groups that can reach each other, each sorted by id.
    /// A group referencing itself counts as a cycle of one.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| self.graph.contains_edge(node, node))
            })
            .map(|component| {
                let mut ids: Vec<String> = component
                    .into_iter()
                    .map(|node| self.graph[node].clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Ids of the groups directly referenced by `id`, in layout order.
    pub fn children(&self, id: &str) -> Vec<&str> {
        let Some(&node) = self.id_to_index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(usize, &str)> = self
            .graph
            .edges(node)
            .map(|edge| (*edge.weight(), self.graph[edge.target()].as_str()))
            .collect();
        edges.sort();
        edges.into_iter().map(|(_, child)| child).collect()
    }
}
