//! Resolves parsed type texts against the records and typedefs the merged
//! graph actually contains.

use super::{Pass, PassError, FIXPOINT_CAP};
use crate::graph::{Edge, EdgeKind, NodeData, NodeId, PropertyGraph};
use crate::types::Type;

/// Monotonic fix point: links object types to their record declarations,
/// substitutes typedef aliases, and materializes `SuperClass` edges from
/// the super class texts records were parsed with.
///
/// Iterates until an entire sweep changes nothing, bounded by
/// [`FIXPOINT_CAP`]; hitting the cap is reported as a warning and the
/// partial result kept.
pub struct TypeResolver;

impl Pass for TypeResolver {
    fn name(&self) -> &'static str {
        "TypeResolver"
    }

    fn run(&self, graph: &mut PropertyGraph, _units: &[NodeId]) -> Result<(), PassError> {
        for iteration in 0..FIXPOINT_CAP {
            let mut type_updates: Vec<(NodeId, Type)> = Vec::new();
            let mut super_updates: Vec<(NodeId, Vec<Type>)> = Vec::new();
            let mut super_edges: Vec<(NodeId, NodeId)> = Vec::new();

            for (id, node) in graph.nodes() {
                if let Some(ty) = node.ty() {
                    let mut refreshed = ty.clone();
                    if refreshed.refresh(graph) {
                        type_updates.push((id, refreshed));
                    }
                }
                if let NodeData::Record { super_classes, .. } = node.data() {
                    let mut refreshed = super_classes.clone();
                    let mut changed = false;
                    for sup in &mut refreshed {
                        if sup.refresh(graph) {
                            changed = true;
                        }
                        if let Some(record) = sup.record() {
                            if !graph.has_edge(id, record, EdgeKind::SuperClass) {
                                super_edges.push((id, record));
                            }
                        }
                    }
                    if changed {
                        super_updates.push((id, refreshed));
                    }
                }
            }

            let changed =
                !type_updates.is_empty() || !super_updates.is_empty() || !super_edges.is_empty();

            for (id, ty) in type_updates {
                if let Some(node) = graph.node_mut(id) {
                    node.set_ty(ty);
                }
            }
            for (id, supers) in super_updates {
                if let Some(node) = graph.node_mut(id) {
                    if let NodeData::Record { super_classes, .. } = node.data_mut() {
                        *super_classes = supers;
                    }
                }
            }
            for (record, sup) in super_edges {
                if !graph.has_edge(record, sup, EdgeKind::SuperClass) {
                    graph.add_edge(record, sup, Edge::new(EdgeKind::SuperClass));
                }
            }

            if !changed {
                return Ok(());
            }
            if iteration + 1 == FIXPOINT_CAP {
                tracing::warn!(
                    cap = FIXPOINT_CAP,
                    "type resolution did not reach a fix point, keeping partial result"
                );
            }
        }
        Ok(())
    }
}
