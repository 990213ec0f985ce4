//! Builds data-flow edges: writes feed declarations, reads are fed by
//! every write that reaches them along the EOG.

use super::{Pass, PassError};
use crate::graph::{Edge, EdgeKind, NodeData, NodeId, NodeKind, PropertyGraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// Reaching definitions per declaration: def sites that may have written
/// it last.
type DefState = HashMap<NodeId, HashSet<NodeId>>;

/// Monotonic: adds `Dfg` edges only.
///
/// A write (assignment, initializer, parameter binding) gets an edge from
/// the written value to the declaration. A read gets one edge from every
/// def site that reaches it, computed by a worklist over the function's
/// EOG; several reaching writes mean several incoming edges. Arguments of
/// resolved calls flow into the callee's parameters.
pub struct DfgPass;

impl Pass for DfgPass {
    fn name(&self) -> &'static str {
        "DfgPass"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        let functions = super::variable_usage::callables(graph, units);
        for func in functions {
            analyze_function(graph, func);
        }

        // Resolved calls bind their arguments to the callee's parameters
        let mut bindings: Vec<(NodeId, NodeId)> = Vec::new();
        let mut seen = HashSet::new();
        for &unit in units {
            for id in graph.query().subtree(unit) {
                if !seen.insert(id) {
                    continue;
                }
                let Some(node) = graph.node(id) else { continue };
                if !matches!(
                    node.kind(),
                    NodeKind::CallExpression | NodeKind::MemberCall | NodeKind::ConstructExpression
                ) {
                    continue;
                }
                let args = graph.children(id, EdgeKind::Arguments);
                for target in graph.query().invokes(id) {
                    let params = graph.query().parameters_of(target);
                    let variadic = params.iter().copied().find(|&p| {
                        matches!(
                            graph.node(p).map(|n| n.data().clone()),
                            Some(NodeData::Parameter { variadic: true, .. })
                        )
                    });
                    for (i, &arg) in args.iter().enumerate() {
                        let param = params
                            .get(i)
                            .copied()
                            .filter(|&p| Some(p) != variadic)
                            .or(variadic);
                        if let Some(param) = param {
                            bindings.push((arg, param));
                        }
                    }
                }
            }
        }
        for (arg, param) in bindings {
            if !graph.has_edge(arg, param, EdgeKind::Dfg) {
                graph.add_edge(arg, param, Edge::new(EdgeKind::Dfg));
            }
        }
        Ok(())
    }
}

fn analyze_function(graph: &mut PropertyGraph, func: NodeId) {
    if graph.child(func, EdgeKind::Body).is_none() {
        return;
    }
    let members: HashSet<NodeId> = graph.query().subtree(func).into_iter().collect();

    // EOG shape restricted to this function
    let mut preds: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut succs: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for &node in &members {
        for succ in graph.query().eog_successors(node) {
            if members.contains(&succ) {
                succs.entry(node).or_default().push(succ);
                preds.entry(succ).or_default().push(node);
            }
        }
    }

    // Write and read events per EOG node
    let mut writes: HashMap<NodeId, Vec<(NodeId, NodeId)>> = HashMap::new();
    let mut reads: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut value_edges: Vec<(NodeId, NodeId)> = Vec::new();
    // References sitting on the left of a plain assignment only write
    let mut write_only: HashSet<NodeId> = HashSet::new();

    for &id in &members {
        let Some(node) = graph.node(id) else { continue };
        match node.kind() {
            NodeKind::Variable | NodeKind::Field | NodeKind::Parameter => {
                if let Some(init) = graph.child(id, EdgeKind::Initializer) {
                    value_edges.push((init, id));
                    writes.entry(id).or_default().push((id, id));
                }
            }
            NodeKind::BinaryOperator => {
                let op = match node.data() {
                    NodeData::BinaryOperator { op } => op.clone(),
                    _ => continue,
                };
                if !op.ends_with('=') || matches!(op.as_str(), "==" | "!=" | "<=" | ">=") {
                    continue;
                }
                let Some(lhs) = graph.child(id, EdgeKind::Lhs) else {
                    continue;
                };
                let targets = graph.query().refers_to(lhs);
                if op == "=" {
                    write_only.insert(lhs);
                }
                if let Some(rhs) = graph.child(id, EdgeKind::Rhs) {
                    for &decl in &targets {
                        value_edges.push((rhs, decl));
                    }
                }
                for decl in targets {
                    writes.entry(id).or_default().push((decl, id));
                }
            }
            _ => {}
        }
    }
    for &id in &members {
        let Some(node) = graph.node(id) else { continue };
        if !matches!(
            node.kind(),
            NodeKind::DeclaredReference | NodeKind::MemberExpression
        ) || write_only.contains(&id)
        {
            continue;
        }
        for decl in graph.query().refers_to(id) {
            reads.entry(id).or_default().push(decl);
        }
    }

    // Parameters are written at function entry
    let mut entry_state: DefState = DefState::new();
    for param in graph.query().parameters_of(func) {
        entry_state.insert(param, HashSet::from([param]));
    }

    // Worklist until the states stop changing
    let mut out_states: HashMap<NodeId, DefState> = HashMap::new();
    let mut in_states: HashMap<NodeId, DefState> = HashMap::new();
    out_states.insert(func, entry_state);

    let mut worklist: VecDeque<NodeId> = preds.keys().copied().collect();
    while let Some(node) = worklist.pop_front() {
        let mut in_state = DefState::new();
        for pred in preds.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(out) = out_states.get(pred) {
                for (decl, sites) in out {
                    in_state.entry(*decl).or_default().extend(sites.iter().copied());
                }
            }
        }
        let mut out_state = in_state.clone();
        for (decl, site) in writes.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
            out_state.insert(*decl, HashSet::from([*site]));
        }
        in_states.insert(node, in_state);
        if out_states.get(&node) != Some(&out_state) {
            out_states.insert(node, out_state);
            for succ in succs.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                worklist.push_back(*succ);
            }
        }
    }

    // Emit: reaching writes feed each read
    let mut read_edges: Vec<(NodeId, NodeId)> = Vec::new();
    for (node, decls) in &reads {
        let Some(in_state) = in_states.get(node) else {
            continue;
        };
        for decl in decls {
            if let Some(sites) = in_state.get(decl) {
                for &site in sites {
                    read_edges.push((site, *node));
                }
            }
        }
    }

    for (src, dst) in value_edges.into_iter().chain(read_edges) {
        if !graph.has_edge(src, dst, EdgeKind::Dfg) {
            graph.add_edge(src, dst, Edge::new(EdgeKind::Dfg));
        }
    }
}
