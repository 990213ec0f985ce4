//! Function-level call graph with transitive closure. Optional; not part
//! of the default pipeline.

use super::{Pass, PassError};
use crate::graph::{Edge, EdgeKind, NodeId, NodeKind, PropertyGraph};
use std::collections::HashSet;

/// Monotonic: derives direct `Calls` edges between callables from the
/// `invokes` sets, then closes them transitively.
pub struct CallGraphClosure;

impl Pass for CallGraphClosure {
    fn name(&self) -> &'static str {
        "CallGraphClosure"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        let functions = super::variable_usage::callables(graph, units);

        let mut direct: Vec<(NodeId, NodeId)> = Vec::new();
        for &func in &functions {
            for id in graph.query().subtree(func) {
                let Some(node) = graph.node(id) else { continue };
                if !matches!(
                    node.kind(),
                    NodeKind::CallExpression | NodeKind::MemberCall | NodeKind::ConstructExpression
                ) {
                    continue;
                }
                for target in graph.query().invokes(id) {
                    direct.push((func, target));
                }
            }
        }
        for (src, dst) in direct {
            if !graph.has_edge(src, dst, EdgeKind::Calls) {
                graph.add_edge(src, dst, Edge::new(EdgeKind::Calls));
            }
        }

        // Transitive closure per callable
        for &func in &functions {
            let mut reachable = HashSet::new();
            let mut stack: Vec<NodeId> = graph
                .edges_from(func)
                .filter(|(_, e)| e.kind() == EdgeKind::Calls)
                .map(|(dst, _)| dst)
                .collect();
            while let Some(current) = stack.pop() {
                if !reachable.insert(current) {
                    continue;
                }
                stack.extend(
                    graph
                        .edges_from(current)
                        .filter(|(_, e)| e.kind() == EdgeKind::Calls)
                        .map(|(dst, _)| dst),
                );
            }
            for target in reachable {
                if !graph.has_edge(func, target, EdgeKind::Calls) {
                    graph.add_edge(func, target, Edge::new(EdgeKind::Calls));
                }
            }
        }
        Ok(())
    }
}
