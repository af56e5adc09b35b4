//! Directed transaction graph model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Dense index of an account vertex.
pub type NodeId = usize;

/// Attributes carried by a directed edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAttrs {
    /// Transferred amount.
    pub amount: f64,
    /// Settlement instant.
    pub timestamp: DateTime<Utc>,
}

/// A simple directed graph over account vertices.
///
/// Account-id strings are interned to dense [`NodeId`] indices. Parallel
/// (sender, receiver) records collapse onto one edge whose attributes are
/// the last record's. Self-loops are permitted. Vertex and edge orders are
/// first-appearance, which keeps report output stable across runs.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    /// Account id per vertex, in first-appearance order.
    accounts: Vec<String>,
    /// Account id -> vertex index.
    index: HashMap<String, NodeId>,
    /// Out-neighbours per vertex, in edge first-appearance order.
    adjacency: Vec<Vec<NodeId>>,
    /// In-neighbours per vertex, in edge first-appearance order.
    reverse_adjacency: Vec<Vec<NodeId>>,
    /// Edge attributes keyed by (source, target).
    edges: HashMap<(NodeId, NodeId), EdgeAttrs>,
    /// Edge keys in first-appearance order.
    edge_order: Vec<(NodeId, NodeId)>,
}

impl TransactionGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the vertex for an account id, creating it if needed.
    pub fn intern(&mut self, account: &str) -> NodeId {
        if let Some(&id) = self.index.get(account) {
            return id;
        }

        let id = self.accounts.len();
        self.accounts.push(account.to_string());
        self.index.insert(account.to_string(), id);
        self.adjacency.push(Vec::new());
        self.reverse_adjacency.push(Vec::new());
        id
    }

    /// Inserts or replaces the (sender, receiver) edge.
    ///
    /// A repeated pair keeps its adjacency position but takes the new
    /// attributes, collapsing the multigraph to a simple digraph.
    pub fn upsert_edge(&mut self, sender: &str, receiver: &str, attrs: EdgeAttrs) {
        let source = self.intern(sender);
        let target = self.intern(receiver);

        if self.edges.insert((source, target), attrs).is_none() {
            self.adjacency[source].push(target);
            self.reverse_adjacency[target].push(source);
            self.edge_order.push((source, target));
        }
    }

    /// Number of vertices.
    pub fn node_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of distinct directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Account id of a vertex.
    pub fn account(&self, node: NodeId) -> &str {
        &self.accounts[node]
    }

    /// Vertex index of an account id, if present.
    pub fn node_id(&self, account: &str) -> Option<NodeId> {
        self.index.get(account).copied()
    }

    /// All vertices in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.node_count()
    }

    /// All vertices sorted by ascending account id.
    pub fn nodes_by_account(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = (0..self.node_count()).collect();
        nodes.sort_by(|&a, &b| self.accounts[a].cmp(&self.accounts[b]));
        nodes
    }

    /// Out-neighbours of a vertex.
    pub fn out_neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// In-neighbours of a vertex.
    pub fn in_neighbors(&self, node: NodeId) -> &[NodeId] {
        self.reverse_adjacency
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Out-degree of a vertex.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_neighbors(node).len()
    }

    /// In-degree of a vertex.
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.in_neighbors(node).len()
    }

    /// Total degree of a vertex.
    pub fn degree(&self, node: NodeId) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    /// Attributes of the (source, target) edge, if present.
    pub fn edge(&self, source: NodeId, target: NodeId) -> Option<&EdgeAttrs> {
        self.edges.get(&(source, target))
    }

    /// Whether the (source, target) edge exists.
    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.edges.contains_key(&(source, target))
    }

    /// Outgoing edges of a vertex as (target, attributes) pairs.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &EdgeAttrs)> {
        self.out_neighbors(node)
            .iter()
            .filter_map(move |&target| self.edges.get(&(node, target)).map(|a| (target, a)))
    }

    /// Incoming edges of a vertex as (source, attributes) pairs.
    pub fn in_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &EdgeAttrs)> {
        self.in_neighbors(node)
            .iter()
            .filter_map(move |&source| self.edges.get(&(source, node)).map(|a| (source, a)))
    }

    /// All edges in first-appearance order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &EdgeAttrs)> {
        self.edge_order
            .iter()
            .filter_map(move |&(source, target)| {
                self.edges.get(&(source, target)).map(|a| (source, target, a))
            })
    }
}
