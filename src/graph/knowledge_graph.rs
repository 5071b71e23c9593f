use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::export::{ExportedGraph, ExportedLink, ExportedNode};
use super::relationship::{LabeledEdge, Triple};

/// Directed multigraph of entity names connected by labeled relations.
///
/// All mutation goes through `&self` methods guarded by a single mutex, so one
/// instance can be shared between pipeline workers behind an `Arc`. Callers
/// never see the underlying petgraph structure.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    inner: Mutex<GraphInner>,
}

#[derive(Debug, Default, Clone)]
struct GraphInner {
    graph: DiGraph<String, String>,
    index: HashMap<String, NodeIndex>,
}

impl GraphInner {
    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn push_edge(&mut self, source: &str, target: &str, label: &str) {
        let from = self.ensure_node(source);
        let to = self.ensure_node(target);
        // DiGraph keeps parallel edges, which is what makes this a multigraph
        self.graph.add_edge(from, to, label.to_string());
    }
}

impl Clone for KnowledgeGraph {
    fn clone(&self) -> Self {
        Self {
            inner: Mutex::new(self.lock().clone()),
        }
    }
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the graph consistent, so a poisoned
    // lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, GraphInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a node; no-op if it already exists
    pub fn add_node(&self, id: &str) {
        self.lock().ensure_node(id);
    }

    /// Add a labeled edge, creating missing endpoints first
    pub fn add_edge(&self, source: &str, target: &str, label: &str) {
        self.lock().push_edge(source, target, label);
    }

    /// Merge all triples of one passage under a single lock acquisition.
    /// Returns the number of edges added.
    pub fn merge_triples(&self, triples: &[Triple]) -> usize {
        if triples.is_empty() {
            return 0;
        }
        let mut inner = self.lock();
        for triple in triples {
            inner.push_edge(&triple.subject, &triple.object, &triple.relation);
        }
        triples.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.lock().index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.lock().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.lock().graph.edge_count()
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> Vec<String> {
        let inner = self.lock();
        inner
            .graph
            .node_indices()
            .map(|idx| inner.graph[idx].clone())
            .collect()
    }

    /// Snapshot of all edges
    pub fn edges(&self) -> Vec<LabeledEdge> {
        let inner = self.lock();
        inner
            .graph
            .edge_references()
            .map(|edge| LabeledEdge {
                source: inner.graph[edge.source()].clone(),
                target: inner.graph[edge.target()].clone(),
                label: edge.weight().clone(),
            })
            .collect()
    }

    /// Convert to the node/link wire representation.
    ///
    /// Nodes follow the store's insertion order. That order depends on
    /// which worker finished first and is not a stability guarantee.
    pub fn export(&self) -> ExportedGraph {
        let inner = self.lock();
        let nodes = inner
            .graph
            .node_indices()
            .map(|idx| ExportedNode {
                id: inner.graph[idx].clone(),
            })
            .collect();
        let links = inner
            .graph
            .edge_references()
            .map(|edge| ExportedLink {
                source: inner.graph[edge.source()].clone(),
                target: inner.graph[edge.target()].clone(),
                label: edge.weight().clone(),
            })
            .collect();
        ExportedGraph { nodes, links }
    }
}
