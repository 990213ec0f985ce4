//! Resolves `DeclaredReference` and `MemberExpression` nodes to the value
//! declarations they name.

use super::{Pass, PassError, FIXPOINT_CAP};
use crate::graph::{Edge, EdgeKind, LiteralValue, NodeData, NodeId, NodeKind, PropertyGraph};
use crate::scope::{self, GLOBAL_SCOPE};
use crate::types::Type;
use std::collections::HashSet;

/// Monotonic fix point: fills `refersTo` edges. Resolution order for a
/// plain reference is its scope chain (local block, enclosing function,
/// enclosing record, namespace, global); for methods the inherited
/// members of the record's super classes are consulted as a fallback.
/// Member expressions resolve the base's type to a record, then look the
/// member up in that record's own and inherited fields.
///
/// References still empty after the final sweep get the `unresolved`
/// flag, never an error.
pub struct VariableUsageResolver;

impl Pass for VariableUsageResolver {
    fn name(&self) -> &'static str {
        "VariableUsageResolver"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        for iteration in 0..FIXPOINT_CAP {
            let mut new_edges: Vec<(NodeId, NodeId)> = Vec::new();

            for func in callables(graph, units) {
                for id in graph.query().subtree(func) {
                    let Some(node) = graph.node(id) else { continue };
                    match node.kind() {
                        NodeKind::DeclaredReference => {
                            if !graph.query().refers_to(id).is_empty() {
                                continue;
                            }
                            let name = node.name().to_string();
                            if name == "this" {
                                continue;
                            }
                            let from = node.scope().unwrap_or(GLOBAL_SCOPE);
                            let mut targets = if name.contains("::") {
                                scope::resolve_qualified(graph, &name, "::", |n| {
                                    n.kind().is_value_declaration()
                                })
                            } else {
                                scope::resolve(graph, &name, from, |n| {
                                    n.kind().is_value_declaration()
                                })
                            };
                            if targets.is_empty() {
                                if let Some(record) = graph.record_of(func) {
                                    targets = inherited_members(graph, record, &name);
                                }
                            }
                            for target in targets {
                                if !graph.has_edge(id, target, EdgeKind::RefersTo) {
                                    new_edges.push((id, target));
                                }
                            }
                        }
                        NodeKind::MemberExpression => {
                            if !graph.query().refers_to(id).is_empty() {
                                continue;
                            }
                            let member = node.name().to_string();
                            let Some(base) = graph.child(id, EdgeKind::Base) else {
                                continue;
                            };
                            let Some(record) = base_record(graph, base, func) else {
                                continue;
                            };
                            for target in member_lookup(graph, record, &member) {
                                if !graph.has_edge(id, target, EdgeKind::RefersTo) {
                                    new_edges.push((id, target));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }

            let added = new_edges.len();
            for (src, dst) in new_edges {
                if !graph.has_edge(src, dst, EdgeKind::RefersTo) {
                    graph.add_edge(src, dst, Edge::new(EdgeKind::RefersTo));
                }
            }
            if added == 0 {
                break;
            }
            if iteration + 1 == FIXPOINT_CAP {
                tracing::warn!(
                    cap = FIXPOINT_CAP,
                    "usage resolution did not reach a fix point, keeping partial result"
                );
            }
        }

        // Final sweep: flag what stayed unresolved
        let mut unresolved: Vec<NodeId> = Vec::new();
        for &unit in units {
            for id in graph.query().subtree(unit) {
                let Some(node) = graph.node(id) else { continue };
                if matches!(
                    node.kind(),
                    NodeKind::DeclaredReference | NodeKind::MemberExpression
                ) && node.name() != "this"
                    && graph.query().refers_to(id).is_empty()
                {
                    unresolved.push(id);
                }
            }
        }
        for id in unresolved {
            if let Some(node) = graph.node_mut(id) {
                node.set_unresolved(true);
            }
        }
        Ok(())
    }
}

/// Every function, method, and constructor below the given units.
pub(crate) fn callables(graph: &PropertyGraph, units: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for &unit in units {
        for id in graph.query().subtree(unit) {
            if seen.insert(id)
                && graph
                    .node(id)
                    .map(|n| n.kind().is_callable())
                    .unwrap_or(false)
            {
                out.push(id);
            }
        }
    }
    out
}

/// Fields and methods named `name` in the super class chain of `record`.
pub(crate) fn inherited_members(
    graph: &PropertyGraph,
    record: NodeId,
    name: &str,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = graph.query().super_classes_of(record);
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        for member in member_lookup_own(graph, current, name) {
            out.push(member);
        }
        stack.extend(graph.query().super_classes_of(current));
    }
    out
}

/// Members named `name` declared by `record` itself.
fn member_lookup_own(graph: &PropertyGraph, record: NodeId, name: &str) -> Vec<NodeId> {
    graph
        .children(record, EdgeKind::Ast)
        .into_iter()
        .filter(|&m| {
            graph
                .node(m)
                .map(|n| {
                    matches!(
                        n.kind(),
                        NodeKind::Field | NodeKind::Method | NodeKind::Constructor
                    ) && n.name() == name
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Members named `name` in `record` or, failing that, its super classes.
pub(crate) fn member_lookup(graph: &PropertyGraph, record: NodeId, name: &str) -> Vec<NodeId> {
    let own = member_lookup_own(graph, record, name);
    if !own.is_empty() {
        return own;
    }
    inherited_members(graph, record, name)
}

/// The record a member access base evaluates to, if it can be told from
/// the graph built so far. `context` is the enclosing callable (`this`
/// resolves against its record).
pub(crate) fn base_record(
    graph: &PropertyGraph,
    base: NodeId,
    context: NodeId,
) -> Option<NodeId> {
    let node = graph.node(base)?;
    match node.kind() {
        NodeKind::DeclaredReference => {
            if node.name() == "this" {
                return graph.record_of(context);
            }
            let decl = graph.query().refers_to(base).into_iter().next()?;
            let ty = graph.node(decl)?.ty()?.clone();
            type_record(graph, &ty)
        }
        NodeKind::MemberExpression => {
            let field = graph.query().refers_to(base).into_iter().next()?;
            let ty = graph.node(field)?.ty()?.clone();
            type_record(graph, &ty)
        }
        NodeKind::CallExpression | NodeKind::MemberCall => {
            let target = graph.query().invokes(base).into_iter().next()?;
            let ty = graph.node(target)?.ty()?.clone();
            type_record(graph, &ty)
        }
        NodeKind::ConstructExpression | NodeKind::NewExpression | NodeKind::Cast => {
            let ty = node.ty()?.clone();
            type_record(graph, &ty)
        }
        _ => None,
    }
}

fn type_record(graph: &PropertyGraph, ty: &Type) -> Option<NodeId> {
    ty.record().or_else(|| {
        graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Record && n.name() == ty.name())
            .map(|(id, _)| id)
    })
}

/// Best-effort static type of an expression, for argument compatibility.
pub(crate) fn inferred_type(graph: &PropertyGraph, expr: NodeId) -> Type {
    let Some(node) = graph.node(expr) else {
        return Type::unknown();
    };
    match node.data() {
        NodeData::Literal { value } => match value {
            LiteralValue::Int(_) => Type::parse("int"),
            LiteralValue::Float(_) => Type::parse("double"),
            LiteralValue::Str(_) => Type::parse("const char*"),
            LiteralValue::Char(_) => Type::parse("char"),
            LiteralValue::Bool(_) => Type::parse("bool"),
            LiteralValue::Null => Type::unknown(),
        },
        _ => match node.kind() {
            NodeKind::DeclaredReference | NodeKind::MemberExpression => graph
                .query()
                .refers_to(expr)
                .into_iter()
                .next()
                .and_then(|d| graph.node(d))
                .and_then(|n| n.ty().cloned())
                .unwrap_or_else(Type::unknown),
            NodeKind::CallExpression | NodeKind::MemberCall => graph
                .query()
                .invokes(expr)
                .into_iter()
                .next()
                .and_then(|d| graph.node(d))
                .and_then(|n| n.ty().cloned())
                .unwrap_or_else(Type::unknown),
            NodeKind::Cast | NodeKind::ConstructExpression | NodeKind::NewExpression => {
                node.ty().cloned().unwrap_or_else(Type::unknown)
            }
            NodeKind::BinaryOperator => graph
                .child(expr, EdgeKind::Lhs)
                .map(|l| inferred_type(graph, l))
                .unwrap_or_else(Type::unknown),
            NodeKind::UnaryOperator => graph
                .child(expr, EdgeKind::Operand)
                .map(|o| inferred_type(graph, o))
                .unwrap_or_else(Type::unknown),
            _ => Type::unknown(),
        },
    }
}
