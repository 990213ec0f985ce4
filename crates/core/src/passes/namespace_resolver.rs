//! Merges same-named namespaces across translation units and attaches
//! declarations to their home namespace.

use super::{Pass, PassError};
use crate::graph::{Edge, EdgeKind, NodeId, NodeKind, PropertyGraph};
use std::collections::HashMap;

/// Monotonic: the first namespace node seen with a given name becomes
/// canonical; declarations of every same-named namespace are linked to it
/// (as children of the canonical node and via `InNamespace` edges).
pub struct NamespaceResolver;

impl Pass for NamespaceResolver {
    fn name(&self) -> &'static str {
        "NamespaceResolver"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        let mut canonical: HashMap<String, NodeId> = HashMap::new();
        let mut namespaces: Vec<NodeId> = Vec::new();

        for &unit in units {
            for id in graph.query().subtree(unit) {
                let Some(node) = graph.node(id) else { continue };
                if node.kind() == NodeKind::Namespace && !node.name().is_empty() {
                    canonical.entry(node.name().to_string()).or_insert(id);
                    namespaces.push(id);
                }
            }
        }

        for ns in namespaces {
            let Some(name) = graph.node(ns).map(|n| n.name().to_string()) else {
                continue;
            };
            let home = canonical[&name];
            let members: Vec<NodeId> = graph
                .children(ns, EdgeKind::Ast)
                .into_iter()
                .filter(|&m| {
                    graph
                        .node(m)
                        .map(|n| {
                            matches!(
                                n.kind(),
                                NodeKind::Record
                                    | NodeKind::Function
                                    | NodeKind::Method
                                    | NodeKind::Variable
                                    | NodeKind::Namespace
                            )
                        })
                        .unwrap_or(false)
                })
                .collect();
            for member in members {
                if !graph.has_edge(member, home, EdgeKind::InNamespace) {
                    graph.add_edge(member, home, Edge::new(EdgeKind::InNamespace));
                }
                // Fold duplicate namespaces into the canonical node
                if home != ns && !graph.has_edge(home, member, EdgeKind::Ast) {
                    graph.add_child(home, EdgeKind::Ast, member);
                }
            }
        }
        Ok(())
    }
}
