//! Python frontend using Tree-sitter.
//!
//! Classes become records (with `__init__` promoted to the constructor),
//! first assignments introduce variable declarations, and `*args` turns
//! into the synthetic variadic marker.

use super::{attach_comment, raw_location, LanguageFrontend, TranslationError};
use crate::graph::{
    Edge, EdgeKind, LiteralValue, Node, NodeId, NodeKind, PropertyGraph,
};
use crate::scope::{self, ScopeKind, ScopeManager};
use crate::types::Type;
use std::path::Path;
use tree_sitter::Parser;

/// Python language frontend
pub struct PythonFrontend {
    language: tree_sitter::Language,
}

impl PythonFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn parse_tree(&self, source: &str) -> Result<tree_sitter::Tree, TranslationError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| TranslationError::TreeSitter(e.to_string()))?;
        parser.parse(source, None).ok_or_else(|| {
            TranslationError::ParseFailed("failed to parse Python source".to_string())
        })
    }
}

impl Default for PythonFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageFrontend for PythonFrontend {
    fn language_name(&self) -> &str {
        "python"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".py", ".pyi"]
    }

    fn namespace_delimiter(&self) -> &str {
        "."
    }

    fn parse_source(
        &self,
        source: &str,
        file_path: &Path,
        graph: &mut PropertyGraph,
    ) -> Result<NodeId, TranslationError> {
        let tree = self.parse_tree(source)?;
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let global = graph.global_scope();
        let mut tu_node = Node::translation_unit(name);
        tu_node.set_location(raw_location(&tree.root_node(), file_path));
        tu_node.set_file(file_path.to_path_buf());
        let tu = graph.add_node(tu_node);
        if let Some(n) = graph.node_mut(tu) {
            n.set_scope(global);
        }

        let mut translator = PyTranslator {
            graph,
            scopes: ScopeManager::new(),
            tu,
            source,
            path: file_path,
        };
        translator.translate(tree.root_node())?;
        Ok(tu)
    }
}

struct PyTranslator<'g, 's> {
    graph: &'g mut PropertyGraph,
    scopes: ScopeManager,
    tu: NodeId,
    source: &'s str,
    path: &'s Path,
}

impl<'g, 's> PyTranslator<'g, 's> {
    fn translate(&mut self, root: tree_sitter::Node) -> Result<(), TranslationError> {
        let mut cursor = root.walk();
        let children: Vec<tree_sitter::Node> = root.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "function_definition" => {
                    let id = self.handle_function(child)?;
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    attach_comment(self.graph, id, &child, self.source);
                }
                "class_definition" => {
                    let id = self.handle_class(child)?;
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    attach_comment(self.graph, id, &child, self.source);
                }
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition") {
                        match def.kind() {
                            "function_definition" => {
                                let id = self.handle_function(def)?;
                                self.graph.add_child(self.tu, EdgeKind::Ast, id);
                            }
                            "class_definition" => {
                                let id = self.handle_class(def)?;
                                self.graph.add_child(self.tu, EdgeKind::Ast, id);
                            }
                            _ => {}
                        }
                    }
                }
                "import_statement" | "import_from_statement" | "comment" => {}
                _ => {
                    if let Some(s) = self.handle_statement(child)? {
                        self.graph.add_child(self.tu, EdgeKind::Ast, s);
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_function(&mut self, node: tree_sitter::Node) -> Result<NodeId, TranslationError> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("return_type")
            .map(|r| Type::parse(&self.text(r)))
            .unwrap_or_else(Type::unknown);

        let id = self.graph.add_node(Node::function(name, return_type));
        self.stamp(id, node);
        self.scopes.add_declaration(self.graph, id);

        self.scopes.enter_scope(self.graph, id, ScopeKind::Function);
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut index = 0;
            let mut cursor = params.walk();
            let decls: Vec<tree_sitter::Node> = params.named_children(&mut cursor).collect();
            for decl in decls {
                match decl.kind() {
                    "identifier" => {
                        let p = self.graph.add_node(Node::parameter(
                            self.text(decl),
                            Type::unknown(),
                            index,
                        ));
                        self.stamp(p, decl);
                        self.scopes.add_declaration(self.graph, p);
                        self.graph.add_child(id, EdgeKind::Parameters, p);
                        index += 1;
                    }
                    "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
                        let pname = decl
                            .child_by_field_name("name")
                            .or_else(|| decl.named_child(0))
                            .map(|n| self.text(n))
                            .unwrap_or_default();
                        let ty = decl
                            .child_by_field_name("type")
                            .map(|t| Type::parse(&self.text(t)))
                            .unwrap_or_else(Type::unknown);
                        let p = self.graph.add_node(Node::parameter(pname, ty, index));
                        self.stamp(p, decl);
                        self.scopes.add_declaration(self.graph, p);
                        self.graph.add_child(id, EdgeKind::Parameters, p);
                        if let Some(value) = decl.child_by_field_name("value") {
                            let v = self.handle_expression(value)?;
                            self.graph.add_edge(p, v, Edge::new(EdgeKind::Initializer));
                        }
                        index += 1;
                    }
                    "list_splat_pattern" | "dictionary_splat_pattern" => {
                        let p = self.graph.add_node(Node::variadic_parameter(index));
                        self.scopes.add_declaration(self.graph, p);
                        self.graph.add_child(id, EdgeKind::Parameters, p);
                        if let Some(n) = self.graph.node_mut(id) {
                            if let crate::graph::NodeData::Function(info) = n.data_mut() {
                                info.is_variadic = true;
                            }
                        }
                        index += 1;
                    }
                    _ => {}
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            if let Some(b) = self.handle_block(body)? {
                self.graph.add_edge(id, b, Edge::new(EdgeKind::Body));
            }
        }
        self.scopes.leave_scope(self.graph, id)?;
        Ok(id)
    }

    fn handle_class(&mut self, node: tree_sitter::Node) -> Result<NodeId, TranslationError> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let mut record = Node::record(name.clone(), "class");
        if let crate::graph::NodeData::Record { super_classes, .. } = record.data_mut() {
            if let Some(supers) = node.child_by_field_name("superclasses") {
                let mut sc = supers.walk();
                for base in supers.named_children(&mut sc) {
                    super_classes.push(Type::parse(&self.text(base)));
                }
            }
        }
        let id = self.graph.add_node(record);
        self.stamp(id, node);
        self.scopes.add_declaration(self.graph, id);

        self.scopes.enter_scope(self.graph, id, ScopeKind::Record);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            let members: Vec<tree_sitter::Node> = body.named_children(&mut cursor).collect();
            for member in members {
                match member.kind() {
                    "function_definition" => {
                        let func = self.handle_function(member)?;
                        self.promote_member(id, func);
                    }
                    "expression_statement" => {
                        if let Some(s) = self.handle_statement(member)? {
                            // First assignments at class level declare fields
                            let promoted = self.promote_assigned_variables(id, s);
                            if !promoted {
                                self.graph.add_child(id, EdgeKind::Ast, s);
                            }
                        }
                    }
                    "comment" | "pass_statement" => {}
                    _ => {
                        if let Some(s) = self.handle_statement(member)? {
                            self.graph.add_child(id, EdgeKind::Ast, s);
                        }
                    }
                }
            }
        }

        if self.graph.query().constructors_of(id).is_empty() {
            let mut info = crate::graph::FunctionInfo::new(Type::object(name.clone()));
            info.return_type.set_record(id);
            let mut ctor = Node::constructor(name, info);
            ctor.set_implicit(true);
            let ctor_id = self.graph.add_node(ctor);
            self.scopes.add_declaration(self.graph, ctor_id);
            self.graph.add_child(id, EdgeKind::Ast, ctor_id);
        }

        self.scopes.leave_scope(self.graph, id)?;
        Ok(id)
    }

    /// Promote a class-body function to a method, or to the constructor
    /// when it is `__init__`. The record's name doubles as the
    /// constructor's, matching how construct calls resolve.
    fn promote_member(&mut self, record: NodeId, func: NodeId) {
        let Some(old) = self.graph.node(func).cloned() else {
            return;
        };
        let record_name = self
            .graph
            .node(record)
            .map(|n| n.name().to_string())
            .unwrap_or_default();
        let replacement = if old.name() == "__init__" {
            let mut ty = Type::object(record_name.clone());
            ty.set_record(record);
            let mut ctor = old.as_constructor(ty);
            ctor.set_name(record_name);
            ctor
        } else {
            old.as_method()
        };
        let new_id = self.graph.add_node(replacement);
        self.graph.replace_node(func, new_id);
        self.graph.add_child(record, EdgeKind::Ast, new_id);
        if let Some(scope) = self.graph.scope_of_node(func) {
            self.graph.scope_mut(scope).set_ast_node(new_id);
        }
        if let Some(defining) = self.graph.node(new_id).and_then(|n| n.scope()) {
            self.graph.scope_mut(defining).replace_declaration(func, new_id);
        }
    }

    /// Rewrite variables declared by a class-level assignment into fields.
    /// Returns whether anything was promoted.
    fn promote_assigned_variables(&mut self, record: NodeId, stmt: NodeId) -> bool {
        let Some(node) = self.graph.node(stmt) else {
            return false;
        };
        if node.kind() != NodeKind::DeclarationStmt {
            return false;
        }
        let vars: Vec<NodeId> = self
            .graph
            .children(stmt, EdgeKind::Ast)
            .into_iter()
            .filter(|&v| self.graph.node(v).map(|n| n.kind()) == Some(NodeKind::Variable))
            .collect();
        if vars.is_empty() {
            return false;
        }
        for var in vars {
            let Some(old) = self.graph.node(var).cloned() else {
                continue;
            };
            let field = old.as_field();
            let new_id = self.graph.add_node(field);
            self.graph.replace_node(var, new_id);
            self.graph.add_child(record, EdgeKind::Ast, new_id);
            if let Some(defining) = self.graph.node(new_id).and_then(|n| n.scope()) {
                self.graph.scope_mut(defining).replace_declaration(var, new_id);
            }
        }
        // The wrapper statement has served its purpose; the fields hang
        // off the record now
        self.graph.disconnect_from_graph(stmt);
        true
    }

    fn handle_block(
        &mut self,
        node: tree_sitter::Node,
    ) -> Result<Option<NodeId>, TranslationError> {
        let block = self.graph.add_node(Node::block());
        self.stamp(block, node);
        self.scopes.enter_scope(self.graph, block, ScopeKind::Block);
        let mut cursor = node.walk();
        let children: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
        for child in children {
            if let Some(s) = self.handle_statement(child)? {
                self.graph.add_child(block, EdgeKind::Ast, s);
            }
        }
        self.scopes.leave_scope(self.graph, block)?;
        Ok(Some(block))
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn handle_statement(
        &mut self,
        node: tree_sitter::Node,
    ) -> Result<Option<NodeId>, TranslationError> {
        let id = match node.kind() {
            "block" => self.handle_block(node)?,
            "function_definition" => Some(self.handle_function(node)?),
            "class_definition" => Some(self.handle_class(node)?),
            "if_statement" => {
                let if_id = self.graph.add_node(Node::if_stmt());
                self.stamp(if_id, node);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_expression(cond)?;
                    self.graph.add_edge(if_id, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(then) = node.child_by_field_name("consequence") {
                    if let Some(t) = self.handle_block(then)? {
                        self.graph.add_edge(if_id, t, Edge::new(EdgeKind::Then));
                    }
                }
                let mut cursor = node.walk();
                let alts: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for alt in alts {
                    match alt.kind() {
                        "elif_clause" | "else_clause" => {
                            if let Some(body) = alt
                                .child_by_field_name("body")
                                .or_else(|| alt.child_by_field_name("consequence"))
                            {
                                if let Some(e) = self.handle_block(body)? {
                                    self.graph.add_edge(if_id, e, Edge::new(EdgeKind::Else));
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Some(if_id)
            }
            "while_statement" => {
                let w = self.graph.add_node(Node::while_stmt());
                self.stamp(w, node);
                self.scopes.enter_scope(self.graph, w, ScopeKind::Loop);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_expression(cond)?;
                    self.graph.add_edge(w, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_block(body)? {
                        self.graph.add_edge(w, b, Edge::new(EdgeKind::Body));
                    }
                }
                self.scopes.leave_scope(self.graph, w)?;
                Some(w)
            }
            "for_statement" => {
                let f = self.graph.add_node(Node::for_each_stmt());
                self.stamp(f, node);
                self.scopes.enter_scope(self.graph, f, ScopeKind::Loop);
                if let Some(left) = node.child_by_field_name("left") {
                    let var = self
                        .graph
                        .add_node(Node::variable(self.text(left), Type::unknown()));
                    self.stamp(var, left);
                    self.scopes.add_declaration(self.graph, var);
                    self.graph.add_edge(f, var, Edge::new(EdgeKind::IterVariable));
                }
                if let Some(right) = node.child_by_field_name("right") {
                    let r = self.handle_expression(right)?;
                    self.graph.add_edge(f, r, Edge::new(EdgeKind::Iterable));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_block(body)? {
                        self.graph.add_edge(f, b, Edge::new(EdgeKind::Body));
                    }
                }
                self.scopes.leave_scope(self.graph, f)?;
                Some(f)
            }
            "try_statement" => {
                let t = self.graph.add_node(Node::try_stmt());
                self.stamp(t, node);
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_block(body)? {
                        self.graph.add_edge(t, b, Edge::new(EdgeKind::Body));
                    }
                }
                let mut cursor = node.walk();
                let clauses: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for clause in clauses {
                    if matches!(clause.kind(), "except_clause" | "finally_clause") {
                        let catch = self.graph.add_node(Node::catch_clause(""));
                        self.stamp(catch, clause);
                        self.scopes.enter_scope(self.graph, catch, ScopeKind::TryCatch);
                        if let Some(body) = clause
                            .child_by_field_name("body")
                            .or_else(|| clause.named_child(clause.named_child_count().saturating_sub(1)))
                        {
                            if body.kind() == "block" {
                                if let Some(b) = self.handle_block(body)? {
                                    self.graph.add_edge(catch, b, Edge::new(EdgeKind::Body));
                                }
                            }
                        }
                        self.scopes.leave_scope(self.graph, catch)?;
                        self.graph.add_child(t, EdgeKind::Ast, catch);
                    }
                }
                Some(t)
            }
            "return_statement" => {
                let r = self.graph.add_node(Node::return_stmt());
                self.stamp(r, node);
                if let Some(value) = node.named_child(0) {
                    let v = self.handle_expression(value)?;
                    self.graph.add_edge(r, v, Edge::new(EdgeKind::ReturnValue));
                }
                Some(r)
            }
            "break_statement" => {
                let b = self.graph.add_node(Node::break_stmt());
                self.stamp(b, node);
                Some(b)
            }
            "continue_statement" => {
                let c = self.graph.add_node(Node::continue_stmt());
                self.stamp(c, node);
                Some(c)
            }
            "expression_statement" => {
                let Some(expr) = node.named_child(0) else {
                    return Ok(None);
                };
                if expr.kind() == "assignment" {
                    self.handle_assignment(expr)?
                } else {
                    Some(self.handle_expression(expr)?)
                }
            }
            "pass_statement" | "comment" => None,
            _ => {
                let text = self.text(node);
                let p = self.graph.add_node(Node::problem(text));
                self.stamp(p, node);
                Some(p)
            }
        };
        Ok(id)
    }

    /// A first assignment to a plain name declares a variable; later
    /// assignments are ordinary writes.
    fn handle_assignment(
        &mut self,
        node: tree_sitter::Node,
    ) -> Result<Option<NodeId>, TranslationError> {
        let left = node.child_by_field_name("left");
        let right = node.child_by_field_name("right");

        if let Some(left) = left.filter(|l| l.kind() == "identifier") {
            let name = self.text(left);
            let known = !scope::resolve(self.graph, &name, self.scopes.current_scope(), |n| {
                n.kind().is_value_declaration()
            })
            .is_empty();
            if !known {
                let stmt = self.graph.add_node(Node::declaration_stmt());
                self.stamp(stmt, node);
                let var = self.graph.add_node(Node::variable(name, Type::unknown()));
                self.stamp(var, left);
                self.scopes.add_declaration(self.graph, var);
                self.graph.add_child(stmt, EdgeKind::Ast, var);
                if let Some(right) = right {
                    let r = self.handle_expression(right)?;
                    self.graph.add_edge(var, r, Edge::new(EdgeKind::Initializer));
                }
                return Ok(Some(stmt));
            }
        }

        let b = self.graph.add_node(Node::binary_operator("="));
        self.stamp(b, node);
        if let Some(left) = left {
            let l = self.handle_expression(left)?;
            self.graph.add_edge(b, l, Edge::new(EdgeKind::Lhs));
        }
        if let Some(right) = right {
            let r = self.handle_expression(right)?;
            self.graph.add_edge(b, r, Edge::new(EdgeKind::Rhs));
        }
        Ok(Some(b))
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn handle_expression(&mut self, node: tree_sitter::Node) -> Result<NodeId, TranslationError> {
        let id = match node.kind() {
            "integer" => {
                let value = self
                    .text(node)
                    .parse::<i64>()
                    .map(LiteralValue::Int)
                    .unwrap_or(LiteralValue::Null);
                let lit = self.graph.add_node(Node::literal(value));
                self.stamp(lit, node);
                lit
            }
            "float" => {
                let value = self
                    .text(node)
                    .parse::<f64>()
                    .map(LiteralValue::Float)
                    .unwrap_or(LiteralValue::Null);
                let lit = self.graph.add_node(Node::literal(value));
                self.stamp(lit, node);
                lit
            }
            "string" => {
                let text = self.text(node);
                let value = text.trim_matches(|c| c == '"' || c == '\'').to_string();
                let lit = self.graph.add_node(Node::literal(LiteralValue::Str(value)));
                self.stamp(lit, node);
                lit
            }
            "true" | "false" => {
                let lit = self
                    .graph
                    .add_node(Node::literal(LiteralValue::Bool(node.kind() == "true")));
                self.stamp(lit, node);
                lit
            }
            "none" => {
                let lit = self.graph.add_node(Node::literal(LiteralValue::Null));
                self.stamp(lit, node);
                lit
            }
            "identifier" => {
                let r = self.graph.add_node(Node::declared_reference(self.text(node)));
                self.stamp(r, node);
                r
            }
            "attribute" => {
                let member = node
                    .child_by_field_name("attribute")
                    .map(|a| self.text(a))
                    .unwrap_or_default();
                let m = self.graph.add_node(Node::member_expression(member, false));
                self.stamp(m, node);
                if let Some(base) = node.child_by_field_name("object") {
                    let b = self.handle_expression(base)?;
                    self.graph.add_edge(m, b, Edge::new(EdgeKind::Base));
                }
                m
            }
            "call" => {
                let func = node.child_by_field_name("function");
                let call = match func.map(|f| f.kind()) {
                    Some("attribute") => {
                        let func = func.expect("checked above");
                        let member = func
                            .child_by_field_name("attribute")
                            .map(|a| self.text(a))
                            .unwrap_or_default();
                        let call = self.graph.add_node(Node::member_call(member));
                        self.stamp(call, node);
                        if let Some(base) = func.child_by_field_name("object") {
                            let b = self.handle_expression(base)?;
                            self.graph.add_edge(call, b, Edge::new(EdgeKind::Base));
                        }
                        call
                    }
                    _ => {
                        let name = func.map(|f| self.text(f)).unwrap_or_default();
                        let call = self.graph.add_node(Node::call_expression(name));
                        self.stamp(call, node);
                        call
                    }
                };
                if let Some(args) = node.child_by_field_name("arguments") {
                    let mut ac = args.walk();
                    let arg_nodes: Vec<tree_sitter::Node> = args.named_children(&mut ac).collect();
                    for arg in arg_nodes {
                        let a = self.handle_expression(arg)?;
                        self.graph.add_child(call, EdgeKind::Arguments, a);
                    }
                }
                call
            }
            "binary_operator" | "boolean_operator" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_default();
                let b = self.graph.add_node(Node::binary_operator(op));
                self.stamp(b, node);
                if let Some(left) = node.child_by_field_name("left") {
                    let l = self.handle_expression(left)?;
                    self.graph.add_edge(b, l, Edge::new(EdgeKind::Lhs));
                }
                if let Some(right) = node.child_by_field_name("right") {
                    let r = self.handle_expression(right)?;
                    self.graph.add_edge(b, r, Edge::new(EdgeKind::Rhs));
                }
                b
            }
            "comparison_operator" => {
                let b = self.graph.add_node(Node::binary_operator("=="));
                self.stamp(b, node);
                if let Some(left) = node.named_child(0) {
                    let l = self.handle_expression(left)?;
                    self.graph.add_edge(b, l, Edge::new(EdgeKind::Lhs));
                }
                if let Some(right) = node.named_child(1) {
                    let r = self.handle_expression(right)?;
                    self.graph.add_edge(b, r, Edge::new(EdgeKind::Rhs));
                }
                b
            }
            "unary_operator" | "not_operator" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_else(|| "not".to_string());
                let u = self.graph.add_node(Node::unary_operator(op, false));
                self.stamp(u, node);
                if let Some(arg) = node.child_by_field_name("argument") {
                    let a = self.handle_expression(arg)?;
                    self.graph.add_edge(u, a, Edge::new(EdgeKind::Operand));
                }
                u
            }
            "subscript" => {
                let s = self.graph.add_node(Node::array_subscript());
                self.stamp(s, node);
                if let Some(value) = node.child_by_field_name("value") {
                    let v = self.handle_expression(value)?;
                    self.graph.add_edge(s, v, Edge::new(EdgeKind::Operand));
                }
                if let Some(index) = node.child_by_field_name("subscript") {
                    let i = self.handle_expression(index)?;
                    self.graph.add_edge(s, i, Edge::new(EdgeKind::Index));
                }
                s
            }
            "conditional_expression" => {
                let c = self.graph.add_node(Node::conditional());
                self.stamp(c, node);
                // shape: consequence `if` condition `else` alternative
                if let Some(then) = node.named_child(0) {
                    let t = self.handle_expression(then)?;
                    self.graph.add_edge(c, t, Edge::new(EdgeKind::Then));
                }
                if let Some(cond) = node.named_child(1) {
                    let x = self.handle_expression(cond)?;
                    self.graph.add_edge(c, x, Edge::new(EdgeKind::Condition));
                }
                if let Some(alt) = node.named_child(2) {
                    let e = self.handle_expression(alt)?;
                    self.graph.add_edge(c, e, Edge::new(EdgeKind::Else));
                }
                c
            }
            "list" | "tuple" | "dictionary" | "set" => {
                let list = self.graph.add_node(Node::initializer_list());
                self.stamp(list, node);
                let mut cursor = node.walk();
                let entries: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for entry in entries {
                    let e = self.handle_expression(entry)?;
                    self.graph.add_child(list, EdgeKind::Ast, e);
                }
                list
            }
            "parenthesized_expression" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| TranslationError::ParseFailed("empty parentheses".into()))?;
                self.handle_expression(inner)?
            }
            _ => {
                let text = self.text(node);
                let p = self.graph.add_node(Node::problem(text));
                self.stamp(p, node);
                p
            }
        };
        Ok(id)
    }

    fn text(&self, node: tree_sitter::Node) -> String {
        node.utf8_text(self.source.as_bytes())
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn stamp(&mut self, id: NodeId, raw: tree_sitter::Node) {
        let scope = self.scopes.current_scope();
        let location = raw_location(&raw, self.path);
        let code = raw
            .utf8_text(self.source.as_bytes())
            .map(str::to_string)
            .unwrap_or_default();
        if let Some(node) = self.graph.node_mut(id) {
            node.set_code(code);
            node.set_location(location);
            if node.scope().is_none() {
                node.set_scope(scope);
            }
        }
    }
}
