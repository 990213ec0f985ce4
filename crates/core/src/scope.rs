//! Lexical scopes and the scope stack driven by frontends during parsing.
//!
//! Scopes form a tree rooted at the global scope. The tree itself is stored
//! in the [`PropertyGraph`] (so a per-file graph merge can remap scope ids
//! together with node ids); [`ScopeManager`] is the parse-time stack that
//! builds it.

use crate::graph::{NodeId, PropertyGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Index into the graph's scope arena.
pub type ScopeId = usize;

/// The global scope is always the first entry of the arena.
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Error, Debug)]
pub enum ScopeError {
    /// Enter/leave mismatch. Indicates a broken handler; the build aborts.
    #[error("scope imbalance: tried to leave scope of node {found:?}, but the innermost scope belongs to {expected:?} (stack depth {depth})")]
    Imbalance {
        expected: Option<NodeId>,
        found: NodeId,
        depth: usize,
    },
}

/// What kind of syntactic construct a scope belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Namespace,
    Record,
    Function,
    Block,
    TryCatch,
    Loop,
}

/// A lexical container holding declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    /// The CPG node this scope was created for (None for the global scope)
    ast_node: Option<NodeId>,
    /// Name of the namespace/record this scope belongs to
    name: Option<String>,
    /// Declarations in insertion order
    declarations: Vec<NodeId>,
    /// Simple name → declarations with that name, in insertion order
    symbols: HashMap<String, Vec<NodeId>>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>, ast_node: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            ast_node,
            name: None,
            declarations: Vec::new(),
            symbols: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: ScopeId) {
        self.children.push(child);
    }

    pub fn ast_node(&self) -> Option<NodeId> {
        self.ast_node
    }

    /// Rebind the owning node, used when a declaration is promoted and the
    /// scope must follow the replacement node.
    pub fn set_ast_node(&mut self, node: NodeId) {
        self.ast_node = Some(node);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn declarations(&self) -> &[NodeId] {
        &self.declarations
    }

    pub fn add_declaration(&mut self, name: &str, decl: NodeId) {
        self.declarations.push(decl);
        self.symbols.entry(name.to_string()).or_default().push(decl);
    }

    /// Replace `old` by `new` in the declaration list and symbol table,
    /// keeping positions. Used by the reparenting step.
    pub fn replace_declaration(&mut self, old: NodeId, new: NodeId) {
        for d in &mut self.declarations {
            if *d == old {
                *d = new;
            }
        }
        for decls in self.symbols.values_mut() {
            for d in decls.iter_mut() {
                if *d == old {
                    *d = new;
                }
            }
        }
    }

    /// Declarations with the given simple name, in insertion order.
    pub fn lookup(&self, name: &str) -> &[NodeId] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn remap(&mut self, scope_map: &HashMap<ScopeId, ScopeId>, node_map: &HashMap<NodeId, NodeId>) {
        if let Some(p) = self.parent {
            self.parent = Some(scope_map[&p]);
        }
        for c in &mut self.children {
            *c = scope_map[c];
        }
        if let Some(n) = self.ast_node {
            if let Some(&mapped) = node_map.get(&n) {
                self.ast_node = Some(mapped);
            }
        }
        for d in &mut self.declarations {
            if let Some(&mapped) = node_map.get(d) {
                *d = mapped;
            }
        }
        for decls in self.symbols.values_mut() {
            for d in decls.iter_mut() {
                if let Some(&mapped) = node_map.get(d) {
                    *d = mapped;
                }
            }
        }
    }
}

/// The stack of active scopes a frontend pushes and pops while walking a
/// raw syntax tree.
#[derive(Debug)]
pub struct ScopeManager {
    stack: Vec<ScopeId>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self {
            stack: vec![GLOBAL_SCOPE],
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        *self.stack.last().expect("scope stack never empties below global")
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Push a new scope of `kind` for `ast_node` and link it to its parent.
    pub fn enter_scope(
        &mut self,
        graph: &mut PropertyGraph,
        ast_node: NodeId,
        kind: ScopeKind,
    ) -> ScopeId {
        let parent = self.current_scope();
        let mut scope = Scope::new(kind, Some(parent), Some(ast_node));
        if matches!(kind, ScopeKind::Namespace | ScopeKind::Record) {
            if let Some(node) = graph.node(ast_node) {
                scope.set_name(node.name().to_string());
            }
        }
        let id = graph.new_scope(scope);
        graph.scope_mut(parent).add_child(id);
        self.stack.push(id);
        id
    }

    /// Re-enter the scope previously created for `node` (out-of-line
    /// method bodies evaluate inside their record's scope).
    pub fn enter_scope_of(&mut self, graph: &PropertyGraph, node: NodeId) -> Option<ScopeId> {
        let id = graph.scope_of_node(node)?;
        self.stack.push(id);
        Some(id)
    }

    /// Pop the innermost scope, which must belong to `ast_node`.
    pub fn leave_scope(
        &mut self,
        graph: &PropertyGraph,
        ast_node: NodeId,
    ) -> Result<(), ScopeError> {
        let top = self.current_scope();
        let expected = graph.scope(top).ast_node();
        if top == GLOBAL_SCOPE || expected != Some(ast_node) {
            return Err(ScopeError::Imbalance {
                expected,
                found: ast_node,
                depth: self.stack.len(),
            });
        }
        self.stack.pop();
        Ok(())
    }

    /// Register `decl` in the innermost scope its kind permits and stamp
    /// the declaration's scope reference.
    pub fn add_declaration(&mut self, graph: &mut PropertyGraph, decl: NodeId) {
        use crate::graph::NodeKind;

        let kind = graph.node(decl).map(|n| n.kind());
        let target = match kind {
            Some(NodeKind::Field) => self
                .first_scope_of_kind(graph, ScopeKind::Record)
                .unwrap_or_else(|| self.current_scope()),
            Some(NodeKind::Parameter) => self
                .first_scope_of_kind(graph, ScopeKind::Function)
                .unwrap_or_else(|| self.current_scope()),
            Some(NodeKind::Variable) => self
                .stack
                .iter()
                .rev()
                .copied()
                .find(|&s| {
                    matches!(
                        graph.scope(s).kind(),
                        ScopeKind::Block
                            | ScopeKind::Function
                            | ScopeKind::Loop
                            | ScopeKind::TryCatch
                    )
                })
                .unwrap_or_else(|| self.current_scope()),
            _ => self.current_scope(),
        };

        let name = graph
            .node(decl)
            .map(|n| n.name().to_string())
            .unwrap_or_default();
        graph.scope_mut(target).add_declaration(&name, decl);
        if let Some(node) = graph.node_mut(decl) {
            node.set_scope(target);
        }
    }

    /// Innermost scope of the given kind on the stack, if any.
    pub fn first_scope_of_kind(&self, graph: &PropertyGraph, kind: ScopeKind) -> Option<ScopeId> {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|&s| graph.scope(s).kind() == kind)
    }

    /// The function or method whose scope encloses the current position.
    pub fn current_function(&self, graph: &PropertyGraph) -> Option<NodeId> {
        self.first_scope_of_kind(graph, ScopeKind::Function)
            .and_then(|s| graph.scope(s).ast_node())
    }

    /// The record whose scope encloses the current position.
    pub fn current_record(&self, graph: &PropertyGraph) -> Option<NodeId> {
        self.first_scope_of_kind(graph, ScopeKind::Record)
            .and_then(|s| graph.scope(s).ast_node())
    }

    /// Concatenation of the enclosing namespace/record names, each followed
    /// by `delimiter`. Used to qualify freshly created declarations.
    pub fn current_name_prefix(&self, graph: &PropertyGraph, delimiter: &str) -> String {
        let mut prefix = String::new();
        for &scope_id in &self.stack {
            let scope = graph.scope(scope_id);
            if matches!(scope.kind(), ScopeKind::Namespace | ScopeKind::Record) {
                if let Some(name) = scope.name() {
                    prefix.push_str(name);
                    prefix.push_str(delimiter);
                }
            }
        }
        prefix
    }
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk from `from` outward to the global scope, returning all declarations
/// named `name` that satisfy `filter`.
///
/// Inner scopes shadow outer ones: the first scope with any match wins.
/// Within that scope, matches come back in insertion order, so the most
/// recently added declaration is last.
pub fn resolve<F>(graph: &PropertyGraph, name: &str, from: ScopeId, filter: F) -> Vec<NodeId>
where
    F: Fn(&crate::graph::Node) -> bool,
{
    let mut current = Some(from);
    while let Some(scope_id) = current {
        let scope = graph.scope(scope_id);
        let matches: Vec<NodeId> = scope
            .lookup(name)
            .iter()
            .copied()
            .filter(|&id| graph.node(id).map(&filter).unwrap_or(false))
            .collect();
        if !matches.is_empty() {
            return matches;
        }
        current = scope.parent();
    }
    Vec::new()
}

/// Resolve a qualified name (`A::B::f` split on `delimiter`): first locate
/// the `A::B` scope chain from the global scope, then search only within it.
pub fn resolve_qualified<F>(
    graph: &PropertyGraph,
    qualified: &str,
    delimiter: &str,
    filter: F,
) -> Vec<NodeId>
where
    F: Fn(&crate::graph::Node) -> bool,
{
    let parts: Vec<&str> = qualified.split(delimiter).collect();
    let Some((last, qualifiers)) = parts.split_last() else {
        return Vec::new();
    };
    if qualifiers.is_empty() {
        return resolve(graph, last, GLOBAL_SCOPE, filter);
    }

    let mut scope_id = GLOBAL_SCOPE;
    for part in qualifiers {
        let Some(next) = named_child_scope(graph, scope_id, part) else {
            return Vec::new();
        };
        scope_id = next;
    }

    graph
        .scope(scope_id)
        .lookup(last)
        .iter()
        .copied()
        .filter(|&id| graph.node(id).map(&filter).unwrap_or(false))
        .collect()
}

fn named_child_scope(graph: &PropertyGraph, parent: ScopeId, name: &str) -> Option<ScopeId> {
    graph
        .scope(parent)
        .children()
        .iter()
        .copied()
        .find(|&c| {
            let scope = graph.scope(c);
            matches!(scope.kind(), ScopeKind::Namespace | ScopeKind::Record)
                && scope.name() == Some(name)
        })
}
