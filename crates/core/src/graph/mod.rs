//! The property graph: AST structure, analysis edges, and the scope arena.

pub mod edges;
pub mod nodes;
pub mod query;

pub use edges::{Edge, EdgeKind, EdgeProperties};
pub use nodes::{
    FunctionInfo, LiteralValue, Node, NodeData, NodeKind, PhysicalLocation, Region,
};
pub use query::{GraphQuery, QueryError};

use crate::scope::{Scope, ScopeId, ScopeKind, GLOBAL_SCOPE};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identity of a node. Identity is by allocation: two syntactically
/// equal literals are distinct nodes.
pub type NodeId = petgraph::stable_graph::NodeIndex;

/// The unified graph a build produces: one connected structure holding
/// every translation unit, its scopes, and the edges the passes add.
///
/// Backed by a stable graph so that [`disconnect_from_graph`] can sever a
/// node's edges while every `NodeId` held elsewhere stays valid.
///
/// [`disconnect_from_graph`]: PropertyGraph::disconnect_from_graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyGraph {
    graph: StableDiGraph<Node, Edge>,
    scopes: Vec<Scope>,
}

impl PropertyGraph {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            scopes: vec![Scope::new(ScopeKind::Global, None, None)],
        }
    }

    // ── Nodes ────────────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.graph.add_node(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.graph.node_weight_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.graph
            .node_indices()
            .filter_map(move |id| self.graph.node_weight(id).map(|n| (id, n)))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // ── Edges ────────────────────────────────────────────────────────────

    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, edge: Edge) {
        self.graph.add_edge(src, dst, edge);
    }

    /// Add an ordered child edge; the index is the number of same-kind
    /// children the parent already has.
    pub fn add_child(&mut self, parent: NodeId, kind: EdgeKind, child: NodeId) {
        let index = self
            .graph
            .edges(parent)
            .filter(|e| e.weight().kind() == kind)
            .count();
        self.graph.add_edge(parent, child, Edge::ordered(kind, index));
    }

    /// Whether an edge of `kind` already connects `src` to `dst`.
    pub fn has_edge(&self, src: NodeId, dst: NodeId, kind: EdgeKind) -> bool {
        self.graph
            .edges(src)
            .any(|e| e.target() == dst && e.weight().kind() == kind)
    }

    pub fn edges_from(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
    }

    pub fn edges_to(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
    }

    /// Out-neighbors over `kind` edges, sorted by child index where present.
    pub fn children(&self, node: NodeId, kind: EdgeKind) -> Vec<NodeId> {
        let mut out: Vec<(usize, NodeId)> = self
            .graph
            .edges(node)
            .filter(|e| e.weight().kind() == kind)
            .map(|e| (e.weight().index().unwrap_or(usize::MAX), e.target()))
            .collect();
        out.sort_by_key(|&(index, _)| index);
        out.into_iter().map(|(_, id)| id).collect()
    }

    /// The single `kind` child, if present.
    pub fn child(&self, node: NodeId, kind: EdgeKind) -> Option<NodeId> {
        self.children(node, kind).into_iter().next()
    }

    /// In-neighbors over `kind` edges.
    pub fn parents(&self, node: NodeId, kind: EdgeKind) -> Vec<NodeId> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.weight().kind() == kind)
            .map(|e| e.source())
            .collect()
    }

    /// All out-neighbors over syntax-tree edges, ordered children first.
    pub fn ast_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out: Vec<(usize, NodeId)> = self
            .graph
            .edges(node)
            .filter(|e| e.weight().kind().is_ast())
            .map(|e| (e.weight().index().unwrap_or(usize::MAX), e.target()))
            .collect();
        out.sort_by_key(|&(index, _)| index);
        out.into_iter().map(|(_, id)| id).collect()
    }

    /// The syntax-tree parent, if the node is attached.
    pub fn ast_parent(&self, node: NodeId) -> Option<NodeId> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|e| e.weight().kind().is_ast())
            .map(|e| e.source())
    }

    /// The record owning a member (field, method, constructor, nested
    /// record). Out-of-line definitions are children of both their unit
    /// and their record, so every syntax parent is considered.
    pub fn record_of(&self, member: NodeId) -> Option<NodeId> {
        self.graph
            .edges_directed(member, Direction::Incoming)
            .filter(|e| e.weight().kind().is_ast())
            .map(|e| e.source())
            .find(|&p| self.node(p).map(|n| n.kind()) == Some(NodeKind::Record))
    }

    /// Sever every incoming and outgoing edge of `node`. The node stays
    /// allocated, so ids held elsewhere remain valid.
    pub fn disconnect_from_graph(&mut self, node: NodeId) {
        let incident: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .chain(self.graph.edges_directed(node, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for edge in incident {
            self.graph.remove_edge(edge);
        }
    }

    /// Rewrite every incoming edge of `old` to point at `new`, preserving
    /// edge kinds and properties. Half of the reparenting step: the caller
    /// disconnects `old` afterwards.
    pub fn redirect_incoming(&mut self, old: NodeId, new: NodeId) {
        let incoming: Vec<(NodeId, Edge)> = self
            .graph
            .edges_directed(old, Direction::Incoming)
            .map(|e| (e.source(), e.weight().clone()))
            .collect();
        let ids: Vec<_> = self
            .graph
            .edges_directed(old, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        for id in ids {
            self.graph.remove_edge(id);
        }
        for (src, edge) in incoming {
            self.graph.add_edge(src, new, edge);
        }
    }

    /// Replace `old` with `new` in the edge structure: incoming edges are
    /// redirected, outgoing edges copied, and `old` is disconnected (but
    /// stays allocated). The promotion step for record members uses this.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        let outgoing: Vec<(NodeId, Edge)> = self
            .graph
            .edges_directed(old, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().clone()))
            .collect();
        self.redirect_incoming(old, new);
        for (dst, edge) in outgoing {
            self.graph.add_edge(new, dst, edge);
        }
        self.disconnect_from_graph(old);
    }

    // ── Scopes ───────────────────────────────────────────────────────────

    pub fn global_scope(&self) -> ScopeId {
        GLOBAL_SCOPE
    }

    pub fn new_scope(&mut self, scope: Scope) -> ScopeId {
        self.scopes.push(scope);
        self.scopes.len() - 1
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// The scope chain from `from` up to and including the global scope.
    pub fn scope_chain(&self, from: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![from];
        let mut current = from;
        while let Some(parent) = self.scopes[current].parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The scope created for `node`, if one was.
    pub fn scope_of_node(&self, node: NodeId) -> Option<ScopeId> {
        self.scopes
            .iter()
            .position(|s| s.ast_node() == Some(node))
    }

    // ── Merge ────────────────────────────────────────────────────────────

    /// Fold another graph (typically one file's parse result) into this
    /// one. Returns the node id remapping; scope ids are remapped
    /// internally, with `other`'s global scope folded into ours.
    pub fn merge(&mut self, other: PropertyGraph) -> HashMap<NodeId, NodeId> {
        let PropertyGraph {
            graph: other_graph,
            scopes: other_scopes,
        } = other;

        // Scope id mapping: other's global folds into ours, the rest append
        let mut scope_map: HashMap<ScopeId, ScopeId> = HashMap::new();
        scope_map.insert(GLOBAL_SCOPE, GLOBAL_SCOPE);
        let base = self.scopes.len();
        for (i, _) in other_scopes.iter().enumerate().skip(1) {
            scope_map.insert(i, base + i - 1);
        }

        // Nodes, with their scope references remapped
        let mut node_map: HashMap<NodeId, NodeId> = HashMap::new();
        let indices: Vec<NodeId> = other_graph.node_indices().collect();
        for old_id in &indices {
            let mut node = other_graph[*old_id].clone();
            if let Some(scope) = node.scope() {
                node.set_scope(scope_map[&scope]);
            }
            let new_id = self.graph.add_node(node);
            node_map.insert(*old_id, new_id);
        }

        // Edges
        for edge in other_graph.edge_indices() {
            if let Some((a, b)) = other_graph.edge_endpoints(edge) {
                let weight = other_graph[edge].clone();
                self.graph.add_edge(node_map[&a], node_map[&b], weight);
            }
        }

        // Record links carried inside types still use the old ids
        for &new_id in node_map.values() {
            if let Some(node) = self.graph.node_weight_mut(new_id) {
                node.remap_record_links(&node_map);
            }
        }

        // Scopes: append non-global ones, then fold the other global scope
        // into ours (both maps must be complete before remapping contents)
        let mut iter = other_scopes.into_iter();
        let other_global = iter.next().expect("graph always has a global scope");
        for mut scope in iter {
            scope.remap(&scope_map, &node_map);
            self.scopes.push(scope);
        }
        let mut other_global = other_global;
        other_global.remap(&scope_map, &node_map);
        for &child in other_global.children() {
            self.scopes[GLOBAL_SCOPE].add_child(child);
        }
        let decls: Vec<NodeId> = other_global.declarations().to_vec();
        for decl in decls {
            let name = self
                .node(decl)
                .map(|n| n.name().to_string())
                .unwrap_or_default();
            self.scopes[GLOBAL_SCOPE].add_declaration(&name, decl);
        }

        node_map
    }

    /// Get a query interface over the finished graph.
    pub fn query(&self) -> GraphQuery<'_> {
        GraphQuery::new(self)
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}
