//! Resolves calls to their candidate callee declarations.

use super::variable_usage::{base_record, inferred_type, inherited_members, member_lookup};
use super::{Pass, PassError};
use crate::graph::{Edge, EdgeKind, NodeData, NodeId, NodeKind, PropertyGraph};
use crate::scope::{self, GLOBAL_SCOPE};
use crate::types::{is_subclass_of, Type};
use std::collections::HashSet;

/// Monotonic: fills the `invokes` set of every call.
///
/// Plain calls resolve their (simple or qualified) callee name through the
/// call's scope chain, then filter candidates by arity and argument type
/// compatibility (modulo variadics). Member calls restrict the search to
/// the base type's record, its super classes, and every override further
/// down the hierarchy (virtual dispatch is modeled by keeping all of
/// them). A member call whose base type stayed unknown falls back to every
/// known record carrying the member; over-approximating is preferred over
/// silently losing call edges.
pub struct CallResolver;

impl Pass for CallResolver {
    fn name(&self) -> &'static str {
        "CallResolver"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        let mut calls: Vec<(NodeId, NodeId)> = Vec::new();
        let mut seen = HashSet::new();
        for &unit in units {
            for id in graph.query().subtree(unit) {
                if !seen.insert(id) {
                    continue;
                }
                let Some(node) = graph.node(id) else { continue };
                if matches!(
                    node.kind(),
                    NodeKind::CallExpression | NodeKind::MemberCall | NodeKind::ConstructExpression
                ) {
                    let context = enclosing_callable(graph, id).unwrap_or(unit);
                    calls.push((id, context));
                }
            }
        }

        let mut new_edges: Vec<(NodeId, NodeId)> = Vec::new();
        let mut unresolved: Vec<NodeId> = Vec::new();

        for (call, context) in calls {
            if !graph.query().invokes(call).is_empty() {
                continue;
            }
            let candidates = match graph.node(call).map(|n| n.data().clone()) {
                Some(NodeData::CallExpression { callee_name }) => {
                    resolve_plain_call(graph, call, &callee_name)
                }
                Some(NodeData::MemberCall { member }) => {
                    resolve_member_call(graph, call, context, &member)
                }
                Some(NodeData::ConstructExpression { ty }) => {
                    resolve_construct(graph, &ty)
                }
                _ => Vec::new(),
            };

            let compatible: Vec<NodeId> = candidates
                .into_iter()
                .filter(|&target| signature_matches(graph, call, target))
                .collect();

            if compatible.is_empty() {
                unresolved.push(call);
            }
            for target in compatible {
                new_edges.push((call, target));
            }
        }

        for (call, target) in new_edges {
            if !graph.has_edge(call, target, EdgeKind::Invokes) {
                graph.add_edge(call, target, Edge::new(EdgeKind::Invokes));
            }
        }
        for call in unresolved {
            if let Some(node) = graph.node_mut(call) {
                node.set_unresolved(true);
            }
        }
        Ok(())
    }
}

fn enclosing_callable(graph: &PropertyGraph, mut node: NodeId) -> Option<NodeId> {
    loop {
        let parent = graph.ast_parent(node)?;
        if graph.node(parent)?.kind().is_callable() {
            return Some(parent);
        }
        node = parent;
    }
}

fn resolve_plain_call(graph: &PropertyGraph, call: NodeId, callee_name: &str) -> Vec<NodeId> {
    let from = graph
        .node(call)
        .and_then(|n| n.scope())
        .unwrap_or(GLOBAL_SCOPE);
    let targets = if callee_name.contains("::") {
        scope::resolve_qualified(graph, callee_name, "::", |n| n.kind().is_callable())
    } else {
        scope::resolve(graph, callee_name, from, |n| n.kind().is_callable())
    };
    if !targets.is_empty() {
        return targets;
    }
    // Cross-unit calls reach declarations the scope chain cannot see;
    // fall back to a name match over every callable in the graph
    graph
        .nodes()
        .filter(|(_, n)| n.kind().is_callable() && n.name() == callee_name)
        .map(|(id, _)| id)
        .collect()
}

fn resolve_member_call(
    graph: &PropertyGraph,
    call: NodeId,
    context: NodeId,
    member: &str,
) -> Vec<NodeId> {
    let base = graph.child(call, EdgeKind::Base);
    let record = base.and_then(|b| base_record(graph, b, context));

    match record {
        Some(record) => {
            let mut targets = member_lookup(graph, record, member);
            if targets.is_empty() {
                targets = inherited_members(graph, record, member);
            }
            // Virtual dispatch: every override below the static type stays
            // a candidate
            let overrides: Vec<NodeId> = graph
                .nodes()
                .filter(|(id, n)| {
                    n.kind() == NodeKind::Method
                        && n.name() == member
                        && graph
                            .record_of(*id)
                            .map(|r| r != record && is_subclass_of(graph, r, record))
                            .unwrap_or(false)
                })
                .map(|(id, _)| id)
                .collect();
            targets.extend(overrides);
            targets
        }
        // Unknown base type: over-approximate across all known records
        None => graph
            .nodes()
            .filter(|(id, n)| {
                n.kind() == NodeKind::Method
                    && n.name() == member
                    && graph.record_of(*id).is_some()
            })
            .map(|(id, _)| id)
            .collect(),
    }
}

fn resolve_construct(graph: &PropertyGraph, ty: &Type) -> Vec<NodeId> {
    let record = ty.record().or_else(|| {
        graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Record && n.name() == ty.name())
            .map(|(id, _)| id)
    });
    match record {
        Some(record) => graph.query().constructors_of(record),
        None => Vec::new(),
    }
}

/// Arity and argument type compatibility, modulo variadics.
fn signature_matches(graph: &PropertyGraph, call: NodeId, target: NodeId) -> bool {
    let Some(target_node) = graph.node(target) else {
        return false;
    };
    if !target_node.kind().is_callable() {
        return false;
    }
    let is_variadic = match target_node.data() {
        NodeData::Function(info) | NodeData::Method(info) | NodeData::Constructor(info) => {
            info.is_variadic
        }
        _ => false,
    };

    let args = graph.children(call, EdgeKind::Arguments);
    let params: Vec<NodeId> = graph
        .query()
        .parameters_of(target)
        .into_iter()
        .filter(|&p| {
            !matches!(
                graph.node(p).map(|n| n.data().clone()),
                Some(NodeData::Parameter { variadic: true, .. })
            )
        })
        .collect();

    if is_variadic {
        if params.len() > args.len() {
            return false;
        }
    } else if params.len() != args.len() {
        return false;
    }

    for (arg, param) in args.iter().zip(params.iter()) {
        let arg_ty = inferred_type(graph, *arg);
        let Some(param_ty) = graph.node(*param).and_then(|n| n.ty().cloned()) else {
            continue;
        };
        if !arg_ty.is_compatible(&param_ty, graph) {
            return false;
        }
    }
    true
}
