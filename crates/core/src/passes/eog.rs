//! Builds the intra-procedural evaluation-order graph.
//!
//! Operands are connected left to right, then the expression itself.
//! Statements chain sequentially within blocks; control statements wire
//! header, body, and continuation, with back-edges for loops. For a
//! short-circuit operator the left operand's exits split in two: the
//! right operand's entry and the post-expression join (drained into the
//! false/true continuation by the enclosing branch construct).

use super::{Pass, PassError};
use crate::graph::{Edge, EdgeKind, NodeData, NodeId, NodeKind, PropertyGraph};

/// Runs once and only adds `Eog` edges, but its traversal must see the
/// final AST, so it sits after the resolvers in the total order.
pub struct EogPass;

impl Pass for EogPass {
    fn name(&self) -> &'static str {
        "EogPass"
    }

    fn run(&self, graph: &mut PropertyGraph, units: &[NodeId]) -> Result<(), PassError> {
        let functions = super::variable_usage::callables(graph, units);
        for func in functions {
            let Some(body) = graph.child(func, EdgeKind::Body) else {
                continue;
            };
            let mut builder = EogBuilder {
                graph: &mut *graph,
                current: vec![(func, None)],
                sc_true: Vec::new(),
                sc_false: Vec::new(),
                breaks: Vec::new(),
                continues: Vec::new(),
                capture_armed: false,
                captured: None,
            };
            builder.visit(body);
        }
        Ok(())
    }
}

/// A frontier entry: a node whose evaluation the next node follows, plus
/// the branch outcome that edge represents (if it leaves a branch).
type Frontier = Vec<(NodeId, Option<bool>)>;

struct EogBuilder<'g> {
    graph: &'g mut PropertyGraph,
    current: Frontier,
    /// Short-circuit exits waiting for the enclosing branch construct
    sc_true: Vec<NodeId>,
    sc_false: Vec<NodeId>,
    /// Break exits per enclosing breakable construct
    breaks: Vec<Vec<NodeId>>,
    /// Continue nodes per enclosing loop, wired once the target is known
    continues: Vec<Vec<NodeId>>,
    capture_armed: bool,
    captured: Option<NodeId>,
}

impl<'g> EogBuilder<'g> {
    /// Connect the frontier to `node` and make it the new frontier.
    fn push(&mut self, node: NodeId) {
        if self.capture_armed {
            self.captured = Some(node);
            self.capture_armed = false;
        }
        let preds = std::mem::take(&mut self.current);
        for (pred, branch) in preds {
            if !self.graph.has_edge(pred, node, EdgeKind::Eog) {
                let edge = match branch {
                    Some(value) => Edge::branch(value),
                    None => Edge::new(EdgeKind::Eog),
                };
                self.graph.add_edge(pred, node, edge);
            }
        }
        self.current = vec![(node, None)];
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        if !self.graph.has_edge(from, to, EdgeKind::Eog) {
            self.graph.add_edge(from, to, Edge::new(EdgeKind::Eog));
        }
    }

    /// Replace the frontier by `nodes`, each labeled with `branch`.
    fn seed(&mut self, nodes: &[NodeId], branch: Option<bool>) {
        self.current = nodes.iter().map(|&n| (n, branch)).collect();
    }

    fn take_frontier(&mut self) -> Frontier {
        std::mem::take(&mut self.current)
    }

    /// Strip labels off the frontier, for constructs that need the plain
    /// exit set (conditions, loop tails).
    fn take_exits(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.current)
            .into_iter()
            .map(|(n, _)| n)
            .collect()
    }

    /// Visit `node` and report the first EOG node pushed inside it (the
    /// construct's entry, needed for loop back-edges).
    fn visit_captured(&mut self, node: NodeId) -> Option<NodeId> {
        self.capture_armed = true;
        self.visit(node);
        self.capture_armed = false;
        self.captured.take()
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.graph.node(node).map(|n| n.kind())
    }

    fn child(&self, node: NodeId, kind: EdgeKind) -> Option<NodeId> {
        self.graph.child(node, kind)
    }

    fn visit(&mut self, id: NodeId) {
        let Some(kind) = self.kind(id) else { return };
        match kind {
            NodeKind::Block => {
                for child in self.graph.children(id, EdgeKind::Ast) {
                    self.visit(child);
                }
                self.push(id);
            }
            NodeKind::DeclarationStmt => {
                for decl in self.graph.children(id, EdgeKind::Ast) {
                    self.visit(decl);
                }
                self.push(id);
            }
            NodeKind::Variable | NodeKind::Field | NodeKind::Parameter => {
                if let Some(init) = self.child(id, EdgeKind::Initializer) {
                    self.visit(init);
                }
                self.push(id);
            }
            NodeKind::If => {
                self.push(id);
                if let Some(cond) = self.child(id, EdgeKind::Condition) {
                    self.visit(cond);
                }
                let cond_exits = self.take_exits();
                let sc_t = std::mem::take(&mut self.sc_true);
                let sc_f = std::mem::take(&mut self.sc_false);

                let mut true_entry = cond_exits.clone();
                true_entry.extend(sc_t);
                self.seed(&true_entry, Some(true));
                if let Some(then) = self.child(id, EdgeKind::Then) {
                    self.visit(then);
                }
                let then_exits = self.take_frontier();

                let mut false_entry = cond_exits;
                false_entry.extend(sc_f);
                self.seed(&false_entry, Some(false));
                if let Some(els) = self.child(id, EdgeKind::Else) {
                    self.visit(els);
                }
                let else_exits = self.take_frontier();

                self.current = merged(then_exits, else_exits);
            }
            NodeKind::While => {
                self.push(id);
                let cond_entry = match self.child(id, EdgeKind::Condition) {
                    Some(cond) => self.visit_captured(cond),
                    None => None,
                };
                let cond_exits = self.take_exits();
                let sc_t = std::mem::take(&mut self.sc_true);
                let sc_f = std::mem::take(&mut self.sc_false);

                self.breaks.push(Vec::new());
                self.continues.push(Vec::new());
                let mut body_entry_set = cond_exits.clone();
                body_entry_set.extend(sc_t);
                self.seed(&body_entry_set, Some(true));
                let body_entry = match self.child(id, EdgeKind::Body) {
                    Some(body) => self.visit_captured(body),
                    None => None,
                };

                let back = cond_entry.or(body_entry).unwrap_or(id);
                for (exit, _) in self.take_frontier() {
                    self.connect(exit, back);
                }
                for cont in self.continues.pop().unwrap_or_default() {
                    self.connect(cont, back);
                }
                self.current = cond_exits.into_iter().map(|n| (n, Some(false))).collect();
                self.current
                    .extend(sc_f.into_iter().map(|n| (n, Some(false))));
                self.current.extend(
                    self.breaks
                        .pop()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|n| (n, None)),
                );
            }
            NodeKind::For => {
                self.push(id);
                if let Some(init) = self.child(id, EdgeKind::LoopInit) {
                    self.visit(init);
                }
                let has_condition = self.child(id, EdgeKind::Condition).is_some();
                let cond_entry = match self.child(id, EdgeKind::Condition) {
                    Some(cond) => self.visit_captured(cond),
                    None => None,
                };
                let cond_exits = self.take_exits();
                let sc_t = std::mem::take(&mut self.sc_true);
                let sc_f = std::mem::take(&mut self.sc_false);

                self.breaks.push(Vec::new());
                self.continues.push(Vec::new());
                let mut body_entry_set = cond_exits.clone();
                body_entry_set.extend(sc_t);
                self.seed(&body_entry_set, if has_condition { Some(true) } else { None });
                let body_entry = match self.child(id, EdgeKind::Body) {
                    Some(body) => self.visit_captured(body),
                    None => None,
                };
                let update_entry = match self.child(id, EdgeKind::LoopUpdate) {
                    Some(update) => self.visit_captured(update),
                    None => None,
                };

                let back = cond_entry.or(body_entry).unwrap_or(id);
                for (exit, _) in self.take_frontier() {
                    self.connect(exit, back);
                }
                let continue_target = update_entry.or(cond_entry).or(body_entry).unwrap_or(id);
                for cont in self.continues.pop().unwrap_or_default() {
                    self.connect(cont, continue_target);
                }

                self.current = if has_condition {
                    let mut out: Frontier =
                        cond_exits.into_iter().map(|n| (n, Some(false))).collect();
                    out.extend(sc_f.into_iter().map(|n| (n, Some(false))));
                    out
                } else {
                    Vec::new()
                };
                self.current.extend(
                    self.breaks
                        .pop()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|n| (n, None)),
                );
            }
            NodeKind::ForEach => {
                self.push(id);
                if let Some(iterable) = self.child(id, EdgeKind::Iterable) {
                    self.visit(iterable);
                }
                let var = self.child(id, EdgeKind::IterVariable);
                if let Some(var) = var {
                    self.push(var);
                }
                let loop_head = var.unwrap_or(id);
                self.breaks.push(Vec::new());
                self.continues.push(Vec::new());
                if let Some(body) = self.child(id, EdgeKind::Body) {
                    self.visit(body);
                }
                for (exit, _) in self.take_frontier() {
                    self.connect(exit, loop_head);
                }
                for cont in self.continues.pop().unwrap_or_default() {
                    self.connect(cont, loop_head);
                }
                self.current = vec![(loop_head, None)];
                self.current.extend(
                    self.breaks
                        .pop()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|n| (n, None)),
                );
            }
            NodeKind::Switch => {
                self.push(id);
                if let Some(cond) = self.child(id, EdgeKind::Condition) {
                    self.visit(cond);
                }
                let cond_exits = self.take_exits();
                self.breaks.push(Vec::new());
                self.current = Vec::new();
                let mut saw_default = false;
                if let Some(body) = self.child(id, EdgeKind::Body) {
                    for child in self.graph.children(body, EdgeKind::Ast) {
                        match self.kind(child) {
                            Some(NodeKind::Case) | Some(NodeKind::Default) => {
                                if self.kind(child) == Some(NodeKind::Default) {
                                    saw_default = true;
                                }
                                // Dispatch edge plus fall-through from the
                                // previous case body
                                self.current
                                    .extend(cond_exits.iter().map(|&n| (n, None)));
                                self.visit(child);
                            }
                            _ => self.visit(child),
                        }
                    }
                }
                let mut exits = self.take_frontier();
                exits.extend(
                    self.breaks
                        .pop()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|n| (n, None)),
                );
                if !saw_default {
                    exits.extend(cond_exits.into_iter().map(|n| (n, None)));
                }
                self.current = dedup(exits);
            }
            NodeKind::Case => {
                if let Some(value) = self.child(id, EdgeKind::Condition) {
                    self.visit(value);
                }
                self.push(id);
                for child in self.graph.children(id, EdgeKind::Ast) {
                    self.visit(child);
                }
            }
            NodeKind::Default => {
                self.push(id);
                for child in self.graph.children(id, EdgeKind::Ast) {
                    self.visit(child);
                }
            }
            NodeKind::Return => {
                if let Some(value) = self.child(id, EdgeKind::ReturnValue) {
                    self.visit(value);
                }
                self.push(id);
                // A return is a function exit: nothing follows it
                self.current.clear();
            }
            NodeKind::Break => {
                self.push(id);
                if let Some(frame) = self.breaks.last_mut() {
                    frame.push(id);
                }
                self.current.clear();
            }
            NodeKind::Continue => {
                self.push(id);
                if let Some(frame) = self.continues.last_mut() {
                    frame.push(id);
                }
                self.current.clear();
            }
            NodeKind::Try => {
                self.push(id);
                if let Some(body) = self.child(id, EdgeKind::Body) {
                    self.visit(body);
                }
                let body_exits = self.take_frontier();
                let mut all_exits = body_exits.clone();
                for catch in self.graph.children(id, EdgeKind::Ast) {
                    if self.kind(catch) != Some(NodeKind::Catch) {
                        continue;
                    }
                    self.current = body_exits.clone();
                    self.push(catch);
                    if let Some(cbody) = self.child(catch, EdgeKind::Body) {
                        self.visit(cbody);
                    }
                    all_exits.extend(self.take_frontier());
                }
                self.current = dedup(all_exits);
            }
            NodeKind::BinaryOperator => {
                let op = match self.graph.node(id).map(|n| n.data().clone()) {
                    Some(NodeData::BinaryOperator { op }) => op,
                    _ => String::new(),
                };
                match op.as_str() {
                    "&&" | "and" => {
                        if let Some(lhs) = self.child(id, EdgeKind::Lhs) {
                            self.visit(lhs);
                        }
                        let short_circuit: Vec<NodeId> =
                            self.current.iter().map(|&(n, _)| n).collect();
                        if let Some(rhs) = self.child(id, EdgeKind::Rhs) {
                            self.visit(rhs);
                        }
                        self.push(id);
                        self.sc_false.extend(short_circuit);
                    }
                    "||" | "or" => {
                        if let Some(lhs) = self.child(id, EdgeKind::Lhs) {
                            self.visit(lhs);
                        }
                        let short_circuit: Vec<NodeId> =
                            self.current.iter().map(|&(n, _)| n).collect();
                        if let Some(rhs) = self.child(id, EdgeKind::Rhs) {
                            self.visit(rhs);
                        }
                        self.push(id);
                        self.sc_true.extend(short_circuit);
                    }
                    _ => {
                        if let Some(lhs) = self.child(id, EdgeKind::Lhs) {
                            self.visit(lhs);
                        }
                        if let Some(rhs) = self.child(id, EdgeKind::Rhs) {
                            self.visit(rhs);
                        }
                        self.push(id);
                    }
                }
            }
            NodeKind::Conditional => {
                if let Some(cond) = self.child(id, EdgeKind::Condition) {
                    self.visit(cond);
                }
                let cond_exits = self.take_exits();
                let sc_t = std::mem::take(&mut self.sc_true);
                let sc_f = std::mem::take(&mut self.sc_false);

                let mut true_entry = cond_exits.clone();
                true_entry.extend(sc_t);
                self.seed(&true_entry, Some(true));
                if let Some(then) = self.child(id, EdgeKind::Then) {
                    self.visit(then);
                }
                let then_exits = self.take_frontier();

                let mut false_entry = cond_exits;
                false_entry.extend(sc_f);
                self.seed(&false_entry, Some(false));
                if let Some(els) = self.child(id, EdgeKind::Else) {
                    self.visit(els);
                }
                let else_exits = self.take_frontier();

                self.current = merged(then_exits, else_exits);
                self.push(id);
            }
            NodeKind::UnaryOperator | NodeKind::Cast => {
                if let Some(operand) = self.child(id, EdgeKind::Operand) {
                    self.visit(operand);
                }
                self.push(id);
            }
            NodeKind::ArraySubscript => {
                if let Some(operand) = self.child(id, EdgeKind::Operand) {
                    self.visit(operand);
                }
                if let Some(index) = self.child(id, EdgeKind::Index) {
                    self.visit(index);
                }
                self.push(id);
            }
            NodeKind::MemberExpression => {
                if let Some(base) = self.child(id, EdgeKind::Base) {
                    self.visit(base);
                }
                self.push(id);
            }
            NodeKind::CallExpression => {
                if let Some(callee) = self.child(id, EdgeKind::Callee) {
                    self.visit(callee);
                }
                for arg in self.graph.children(id, EdgeKind::Arguments) {
                    self.visit(arg);
                }
                self.push(id);
            }
            NodeKind::MemberCall => {
                if let Some(base) = self.child(id, EdgeKind::Base) {
                    self.visit(base);
                }
                for arg in self.graph.children(id, EdgeKind::Arguments) {
                    self.visit(arg);
                }
                self.push(id);
            }
            NodeKind::ConstructExpression | NodeKind::NewExpression => {
                for arg in self.graph.children(id, EdgeKind::Arguments) {
                    self.visit(arg);
                }
                self.push(id);
            }
            NodeKind::InitializerList => {
                for entry in self.graph.children(id, EdgeKind::Ast) {
                    self.visit(entry);
                }
                self.push(id);
            }
            // Leaves and anything unmodeled take a single EOG slot
            _ => self.push(id),
        }
    }
}

fn merged(mut a: Frontier, b: Frontier) -> Frontier {
    a.extend(b);
    dedup(a)
}

fn dedup(mut v: Frontier) -> Frontier {
    let mut seen = std::collections::HashSet::new();
    v.retain(|entry| seen.insert(*entry));
    v
}
