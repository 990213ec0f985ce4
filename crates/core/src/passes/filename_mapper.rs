//! Stamps every node with the file it originates from.

use super::{Pass, PassError};
use crate::graph::{NodeId, PropertyGraph};

/// Monotonic: fills the `file` attribute, touches nothing else.
///
/// Nodes parsed out of an inlined header keep the header as their file
/// (taken from their location); everything else inherits the unit's.
pub struct FilenameMapper;

impl Pass for FilenameMapper {
    fn name(&self) -> &'static str {
        "FilenameMapper"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        for &unit in units {
            let unit_file = graph
                .node(unit)
                .and_then(|n| n.file().cloned())
                .or_else(|| {
                    graph
                        .node(unit)
                        .and_then(|n| n.location().map(|l| l.file.clone()))
                });
            let members = graph.query().subtree(unit);
            for id in members {
                let Some(node) = graph.node_mut(id) else {
                    continue;
                };
                if node.file().is_some() {
                    continue;
                }
                if let Some(from_location) = node.location().map(|l| l.file.clone()) {
                    node.set_file(from_location);
                } else if let Some(ref file) = unit_file {
                    node.set_file(file.clone());
                }
            }
        }
        Ok(())
    }
}
