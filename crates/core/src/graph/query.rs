//! Read-only query operations over a finished property graph

use super::{EdgeKind, NodeId, NodeKind, PropertyGraph};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("statement {index} is {found:?}, not the requested {expected:?}")]
    TypeMismatch {
        index: usize,
        expected: NodeKind,
        found: Option<NodeKind>,
    },
}

/// A query interface over a finished graph
pub struct GraphQuery<'a> {
    graph: &'a PropertyGraph,
}

impl<'a> GraphQuery<'a> {
    pub fn new(graph: &'a PropertyGraph) -> Self {
        Self { graph }
    }

    /// Every node reachable from `root` over syntax-tree edges, breadth
    /// first, `root` included.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(root);
        visited.insert(root);
        while let Some(current) = queue.pop_front() {
            result.push(current);
            for child in self.graph.ast_children(current) {
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        result
    }

    /// Declarations below `unit` whose simple name matches `name` exactly
    /// and whose kind is in `kinds` (empty set: any declaration kind).
    pub fn declarations_by_name(
        &self,
        unit: NodeId,
        name: &str,
        kinds: &[NodeKind],
    ) -> Vec<NodeId> {
        self.subtree(unit)
            .into_iter()
            .filter(|&id| {
                let Some(node) = self.graph.node(id) else {
                    return false;
                };
                node.kind().is_declaration()
                    && node.name() == name
                    && (kinds.is_empty() || kinds.contains(&node.kind()))
            })
            .collect()
    }

    /// The i-th statement of a function body, checked against the
    /// requested kind.
    pub fn body_statement_as(
        &self,
        function: NodeId,
        index: usize,
        kind: NodeKind,
    ) -> Result<NodeId, QueryError> {
        let body = self.graph.child(function, EdgeKind::Body);
        let statement = body
            .map(|b| self.graph.children(b, EdgeKind::Ast))
            .and_then(|stmts| stmts.get(index).copied());
        let found = statement.and_then(|s| self.graph.node(s)).map(|n| n.kind());
        match (statement, found) {
            (Some(id), Some(k)) if k == kind => Ok(id),
            _ => Err(QueryError::TypeMismatch {
                index,
                expected: kind,
                found,
            }),
        }
    }

    /// Candidate callees recorded on a call by the call resolver.
    pub fn invokes(&self, call: NodeId) -> Vec<NodeId> {
        self.targets(call, EdgeKind::Invokes)
    }

    /// Declarations a reference resolved to.
    pub fn refers_to(&self, reference: NodeId) -> Vec<NodeId> {
        self.targets(reference, EdgeKind::RefersTo)
    }

    pub fn eog_successors(&self, node: NodeId) -> Vec<NodeId> {
        self.targets(node, EdgeKind::Eog)
    }

    pub fn eog_predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.graph
            .edges_to(node)
            .filter(|(_, e)| e.kind() == EdgeKind::Eog)
            .map(|(src, _)| src)
            .collect()
    }

    pub fn dfg_predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.graph
            .edges_to(node)
            .filter(|(_, e)| e.kind() == EdgeKind::Dfg)
            .map(|(src, _)| src)
            .collect()
    }

    pub fn fields_of(&self, record: NodeId) -> Vec<NodeId> {
        self.members_of(record, NodeKind::Field)
    }

    pub fn methods_of(&self, record: NodeId) -> Vec<NodeId> {
        self.members_of(record, NodeKind::Method)
    }

    pub fn constructors_of(&self, record: NodeId) -> Vec<NodeId> {
        self.members_of(record, NodeKind::Constructor)
    }

    /// A record's field with the given name, if declared.
    pub fn field(&self, record: NodeId, name: &str) -> Option<NodeId> {
        self.fields_of(record)
            .into_iter()
            .find(|&f| self.graph.node(f).map(|n| n.name()) == Some(name))
    }

    pub fn super_classes_of(&self, record: NodeId) -> Vec<NodeId> {
        self.targets(record, EdgeKind::SuperClass)
    }

    /// The parameter list of a callable, in declaration order.
    pub fn parameters_of(&self, function: NodeId) -> Vec<NodeId> {
        self.graph.children(function, EdgeKind::Parameters)
    }

    fn members_of(&self, record: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.graph
            .children(record, EdgeKind::Ast)
            .into_iter()
            .filter(|&m| self.graph.node(m).map(|n| n.kind()) == Some(kind))
            .collect()
    }

    fn targets(&self, node: NodeId, kind: EdgeKind) -> Vec<NodeId> {
        self.graph
            .edges_from(node)
            .filter(|(_, e)| e.kind() == kind)
            .map(|(dst, _)| dst)
            .collect()
    }
}
