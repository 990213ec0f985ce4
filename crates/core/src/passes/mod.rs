//! The analysis pass pipeline: graph-to-graph enrichment steps that turn
//! the raw syntax graph into a property graph.
//!
//! Passes run in a fixed order, each consuming what its predecessors
//! added. A failing pass is logged and the remaining passes still run;
//! the graph stays usable with partial information.

pub mod call_graph;
pub mod call_resolver;
pub mod dfg;
pub mod eog;
pub mod filename_mapper;
pub mod namespace_resolver;
pub mod type_resolver;
pub mod variable_usage;

pub use call_graph::CallGraphClosure;
pub use call_resolver::CallResolver;
pub use dfg::DfgPass;
pub use eog::EogPass;
pub use filename_mapper::FilenameMapper;
pub use namespace_resolver::NamespaceResolver;
pub use type_resolver::TypeResolver;
pub use variable_usage::VariableUsageResolver;

use crate::graph::{NodeId, PropertyGraph};
use thiserror::Error;

/// Iteration cap for the fix-point passes; hitting it is reported as a
/// warning and the partial result kept.
pub const FIXPOINT_CAP: usize = 10;

#[derive(Error, Debug)]
#[error("pass failed: {0}")]
pub struct PassError(pub String);

/// A graph-to-graph transformation over the merged translation units.
///
/// A pass is either *monotonic* (only adds edges or flags, composes
/// freely) or *mutating* (rewrites structure, depends on its position in
/// the total order); each implementation documents which.
pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError>;
}

/// The canonical pipeline, in dependency order.
pub fn default_passes() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(FilenameMapper),
        Box::new(TypeResolver),
        Box::new(NamespaceResolver),
        Box::new(VariableUsageResolver),
        Box::new(CallResolver),
        Box::new(EogPass),
        Box::new(DfgPass),
    ]
}

/// Run the pipeline to completion. A pass failure is logged and the
/// remaining passes still run (best-effort enrichment).
pub fn run_pipeline(graph: &mut PropertyGraph, units: &[NodeId], passes: &[Box<dyn Pass>]) {
    for pass in passes {
        tracing::debug!(pass = pass.name(), "running pass");
        if let Err(e) = pass.run(graph, units) {
            tracing::error!(pass = pass.name(), error = %e, "pass failed, continuing");
        }
    }
}
