//! Go frontend using Tree-sitter.
//!
//! Covers the declaration surface the graph model understands: package
//! clauses become namespaces, struct types records, methods attach to the
//! record their receiver names.

use super::{attach_comment, raw_location, LanguageFrontend, TranslationError};
use crate::graph::{
    Edge, EdgeKind, FunctionInfo, LiteralValue, Node, NodeId, PropertyGraph,
};
use crate::scope::{ScopeKind, ScopeManager};
use crate::types::Type;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Parser;

/// Go language frontend
pub struct GoFrontend {
    language: tree_sitter::Language,
}

impl GoFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    fn parse_tree(&self, source: &str) -> Result<tree_sitter::Tree, TranslationError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| TranslationError::TreeSitter(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| TranslationError::ParseFailed("failed to parse Go source".to_string()))
    }
}

impl Default for GoFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageFrontend for GoFrontend {
    fn language_name(&self) -> &str {
        "go"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".go"]
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

        let mut translator = GoTranslator {
            graph,
            scopes: ScopeManager::new(),
            tu,
            records: HashMap::new(),
            source,
            path: file_path,
        };
        translator.translate(tree.root_node())?;
        Ok(tu)
    }
}

struct GoTranslator<'g, 's> {
    graph: &'g mut PropertyGraph,
    scopes: ScopeManager,
    tu: NodeId,
    records: HashMap<String, NodeId>,
    source: &'s str,
    path: &'s Path,
}

/// Go writes pointers and slices as prefixes (`*Server`, `[]int`); turn
/// them into the postfix wrapper form the type parser reads.
fn parse_go_type(text: &str) -> Type {
    let trimmed = text.trim();
    let pointers = trimmed.chars().take_while(|&c| c == '*').count();
    let mut base = &trimmed[pointers..];
    let mut slices = 0;
    while let Some(rest) = base.strip_prefix("[]") {
        base = rest;
        slices += 1;
    }
    let mut normalized = base.trim().to_string();
    for _ in 0..pointers {
        normalized.push('*');
    }
    for _ in 0..slices {
        normalized.push_str("[]");
    }
    Type::parse(&normalized)
}

impl<'g, 's> GoTranslator<'g, 's> {
    fn translate(&mut self, root: tree_sitter::Node) -> Result<(), TranslationError> {
        let mut cursor = root.walk();
        let children: Vec<tree_sitter::Node> = root.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "package_clause" => {
                    let name = child
                        .named_child(0)
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    let ns = self.graph.add_node(Node::namespace(name));
                    self.stamp(ns, child);
                    self.scopes.add_declaration(self.graph, ns);
                    self.graph.add_child(self.tu, EdgeKind::Ast, ns);
                }
                "type_declaration" => {
                    let mut tc = child.walk();
                    let specs: Vec<tree_sitter::Node> = child.named_children(&mut tc).collect();
                    for spec in specs {
                        if spec.kind() == "type_spec" {
                            let id = self.handle_type_spec(spec)?;
                            self.graph.add_child(self.tu, EdgeKind::Ast, id);
                            attach_comment(self.graph, id, &child, self.source);
                        }
                    }
                }
                "function_declaration" => {
                    let id = self.handle_function(child, None)?;
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    attach_comment(self.graph, id, &child, self.source);
                }
                "method_declaration" => {
                    let receiver = self.receiver_record(child);
                    let id = self.handle_function(child, receiver)?;
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    attach_comment(self.graph, id, &child, self.source);
                }
                "var_declaration" | "const_declaration" => {
                    for id in self.handle_var_declaration(child)? {
                        self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    }
                }
                "import_declaration" | "comment" | "\n" | ";" => {}
                _ => {
                    let id = self.problem(child);
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                }
            }
        }
        Ok(())
    }

    /// `type X struct { ... }` becomes a record with one field per member;
    /// other type specs become typedefs.
    fn handle_type_spec(&mut self, spec: tree_sitter::Node) -> Result<NodeId, TranslationError> {
        let name = spec
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let ty_node = spec.child_by_field_name("type");

        if let Some(ty) = ty_node.filter(|t| t.kind() == "struct_type") {
            let record = self.graph.add_node(Node::record(name.clone(), "struct"));
            self.stamp(record, spec);
            self.records.insert(name.clone(), record);
            self.scopes.add_declaration(self.graph, record);

            self.scopes.enter_scope(self.graph, record, ScopeKind::Record);
            if let Some(list) = ty.named_child(0) {
                let mut cursor = list.walk();
                let fields: Vec<tree_sitter::Node> = list.named_children(&mut cursor).collect();
                for field in fields {
                    if field.kind() != "field_declaration" {
                        continue;
                    }
                    let field_ty = field
                        .child_by_field_name("type")
                        .map(|t| parse_go_type(&self.text(t)))
                        .unwrap_or_else(Type::unknown);
                    let mut nc = field.walk();
                    let names: Vec<tree_sitter::Node> = field
                        .children_by_field_name("name", &mut nc)
                        .collect();
                    for fname in names {
                        let f = self
                            .graph
                            .add_node(Node::field(self.text(fname), field_ty.clone()));
                        self.stamp(f, field);
                        self.scopes.add_declaration(self.graph, f);
                        self.graph.add_child(record, EdgeKind::Ast, f);
                    }
                }
            }
            self.scopes.leave_scope(self.graph, record)?;
            return Ok(record);
        }

        let target = ty_node.map(|t| self.text(t)).unwrap_or_default();
        let id = self.graph.add_node(Node::typedef(name, Type::parse(&target)));
        self.stamp(id, spec);
        self.scopes.add_declaration(self.graph, id);
        Ok(id)
    }

    /// The record a method's receiver names, if it is known.
    fn receiver_record(&mut self, node: tree_sitter::Node) -> Option<NodeId> {
        let receiver = node.child_by_field_name("receiver")?;
        let param = receiver.named_child(0)?;
        let ty = param.child_by_field_name("type")?;
        let type_name = match ty.kind() {
            "pointer_type" => ty.named_child(0).map(|t| self.text(t))?,
            _ => self.text(ty),
        };
        self.records.get(type_name.as_str()).copied()
    }

    fn handle_function(
        &mut self,
        node: tree_sitter::Node,
        receiver: Option<NodeId>,
    ) -> Result<NodeId, TranslationError> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("result")
            .map(|r| parse_go_type(&self.text(r)))
            .unwrap_or_else(Type::incomplete);

        let id = match receiver {
            Some(record) => {
                let method =
                    Node::method(name.clone(), FunctionInfo::new(return_type));
                let id = self.graph.add_node(method);
                let record_name = self
                    .graph
                    .node(record)
                    .map(|n| n.name().to_string())
                    .unwrap_or_default();
                let delimiter = self.delimiter();
                if let Some(n) = self.graph.node_mut(id) {
                    n.set_qualified_name(format!(
                        "{}{}{}",
                        record_name,
                        delimiter,
                        name
                    ));
                }
                self.graph.add_child(record, EdgeKind::Ast, id);
                id
            }
            None => self.graph.add_node(Node::function(name, return_type)),
        };
        self.stamp(id, node);
        self.scopes.add_declaration(self.graph, id);

        self.scopes.enter_scope(self.graph, id, ScopeKind::Function);
        // The receiver variable is visible inside the body
        if receiver.is_some() {
            if let Some(recv) = node.child_by_field_name("receiver") {
                if let Some(param) = recv.named_child(0) {
                    if let Some(pname) = param.child_by_field_name("name") {
                        let ty = param
                            .child_by_field_name("type")
                            .map(|t| parse_go_type(&self.text(t)))
                            .unwrap_or_else(Type::unknown);
                        let p = self
                            .graph
                            .add_node(Node::parameter(self.text(pname), ty, 0));
                        self.stamp(p, param);
                        self.scopes.add_declaration(self.graph, p);
                    }
                }
            }
        }
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut index = 0;
            let mut cursor = params.walk();
            let decls: Vec<tree_sitter::Node> = params.named_children(&mut cursor).collect();
            for decl in decls {
                if decl.kind() != "parameter_declaration"
                    && decl.kind() != "variadic_parameter_declaration"
                {
                    continue;
                }
                let ty = decl
                    .child_by_field_name("type")
                    .map(|t| parse_go_type(&self.text(t)))
                    .unwrap_or_else(Type::unknown);
                let mut nc = decl.walk();
                let names: Vec<tree_sitter::Node> =
                    decl.children_by_field_name("name", &mut nc).collect();
                if names.is_empty() {
                    let p = self.graph.add_node(Node::parameter("", ty, index));
                    self.stamp(p, decl);
                    self.graph.add_child(id, EdgeKind::Parameters, p);
                    index += 1;
                } else {
                    for pname in names {
                        let p = self
                            .graph
                            .add_node(Node::parameter(self.text(pname), ty.clone(), index));
                        self.stamp(p, decl);
                        self.scopes.add_declaration(self.graph, p);
                        self.graph.add_child(id, EdgeKind::Parameters, p);
                        index += 1;
                    }
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            if let Some(b) = self.handle_statement(body)? {
                self.graph.add_edge(id, b, Edge::new(EdgeKind::Body));
            }
        }
        self.scopes.leave_scope(self.graph, id)?;
        Ok(id)
    }

    fn handle_var_declaration(
        &mut self,
        node: tree_sitter::Node,
    ) -> Result<Vec<NodeId>, TranslationError> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        let specs: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
        for spec in specs {
            if !matches!(spec.kind(), "var_spec" | "const_spec") {
                continue;
            }
            let ty = spec
                .child_by_field_name("type")
                .map(|t| parse_go_type(&self.text(t)))
                .unwrap_or_else(Type::unknown);
            let values: Vec<tree_sitter::Node> = spec
                .child_by_field_name("value")
                .map(|v| {
                    let mut vc = v.walk();
                    v.named_children(&mut vc).collect()
                })
                .unwrap_or_default();
            let mut nc = spec.walk();
            let names: Vec<tree_sitter::Node> =
                spec.children_by_field_name("name", &mut nc).collect();
            for (i, name) in names.into_iter().enumerate() {
                let v = self
                    .graph
                    .add_node(Node::variable(self.text(name), ty.clone()));
                self.stamp(v, spec);
                self.scopes.add_declaration(self.graph, v);
                if let Some(value) = values.get(i) {
                    let init = self.handle_expression(*value)?;
                    self.graph.add_edge(v, init, Edge::new(EdgeKind::Initializer));
                }
                out.push(v);
            }
        }
        Ok(out)
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn handle_statement(
        &mut self,
        node: tree_sitter::Node,
    ) -> Result<Option<NodeId>, TranslationError> {
        let id = match node.kind() {
            "block" => {
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
                Some(block)
            }
            "if_statement" => {
                let if_id = self.graph.add_node(Node::if_stmt());
                self.stamp(if_id, node);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_expression(cond)?;
                    self.graph.add_edge(if_id, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(then) = node.child_by_field_name("consequence") {
                    if let Some(t) = self.handle_statement(then)? {
                        self.graph.add_edge(if_id, t, Edge::new(EdgeKind::Then));
                    }
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    if let Some(e) = self.handle_statement(alt)? {
                        self.graph.add_edge(if_id, e, Edge::new(EdgeKind::Else));
                    }
                }
                Some(if_id)
            }
            "for_statement" => {
                let f = self.graph.add_node(Node::for_stmt());
                self.stamp(f, node);
                self.scopes.enter_scope(self.graph, f, ScopeKind::Loop);
                let mut cursor = node.walk();
                let children: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    match child.kind() {
                        "for_clause" => {
                            if let Some(init) = child.child_by_field_name("initializer") {
                                if let Some(i) = self.handle_statement(init)? {
                                    self.graph.add_edge(f, i, Edge::new(EdgeKind::LoopInit));
                                }
                            }
                            if let Some(cond) = child.child_by_field_name("condition") {
                                let c = self.handle_expression(cond)?;
                                self.graph.add_edge(f, c, Edge::new(EdgeKind::Condition));
                            }
                            if let Some(update) = child.child_by_field_name("update") {
                                if let Some(u) = self.handle_statement(update)? {
                                    self.graph.add_edge(f, u, Edge::new(EdgeKind::LoopUpdate));
                                }
                            }
                        }
                        "range_clause" => {
                            if let Some(right) = child.child_by_field_name("right") {
                                let r = self.handle_expression(right)?;
                                self.graph.add_edge(f, r, Edge::new(EdgeKind::Iterable));
                            }
                        }
                        "block" => {
                            if let Some(b) = self.handle_statement(child)? {
                                self.graph.add_edge(f, b, Edge::new(EdgeKind::Body));
                            }
                        }
                        _ => {
                            // Bare `for cond { }` loops carry the condition directly
                            if child.kind().ends_with("expression")
                                || child.kind() == "identifier"
                                || child.kind() == "true"
                                || child.kind() == "false"
                            {
                                let c = self.handle_expression(child)?;
                                self.graph.add_edge(f, c, Edge::new(EdgeKind::Condition));
                            }
                        }
                    }
                }
                self.scopes.leave_scope(self.graph, f)?;
                Some(f)
            }
            "return_statement" => {
                let r = self.graph.add_node(Node::return_stmt());
                self.stamp(r, node);
                if let Some(values) = node.named_child(0) {
                    let first = if values.kind() == "expression_list" {
                        values.named_child(0)
                    } else {
                        Some(values)
                    };
                    if let Some(value) = first {
                        let v = self.handle_expression(value)?;
                        self.graph.add_edge(r, v, Edge::new(EdgeKind::ReturnValue));
                    }
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
            "short_var_declaration" => {
                let stmt = self.graph.add_node(Node::declaration_stmt());
                self.stamp(stmt, node);
                let names: Vec<tree_sitter::Node> = node
                    .child_by_field_name("left")
                    .map(|l| {
                        let mut lc = l.walk();
                        l.named_children(&mut lc).collect()
                    })
                    .unwrap_or_default();
                let values: Vec<tree_sitter::Node> = node
                    .child_by_field_name("right")
                    .map(|r| {
                        let mut rc = r.walk();
                        r.named_children(&mut rc).collect()
                    })
                    .unwrap_or_default();
                for (i, name) in names.into_iter().enumerate() {
                    let v = self
                        .graph
                        .add_node(Node::variable(self.text(name), Type::unknown()));
                    self.stamp(v, node);
                    self.scopes.add_declaration(self.graph, v);
                    self.graph.add_child(stmt, EdgeKind::Ast, v);
                    if let Some(value) = values.get(i) {
                        let init = self.handle_expression(*value)?;
                        self.graph.add_edge(v, init, Edge::new(EdgeKind::Initializer));
                    }
                }
                Some(stmt)
            }
            "var_declaration" | "const_declaration" => {
                let stmt = self.graph.add_node(Node::declaration_stmt());
                self.stamp(stmt, node);
                for decl in self.handle_var_declaration(node)? {
                    self.graph.add_child(stmt, EdgeKind::Ast, decl);
                }
                Some(stmt)
            }
            "assignment_statement" => {
                let b = self.graph.add_node(Node::binary_operator("="));
                self.stamp(b, node);
                if let Some(left) = node.child_by_field_name("left").and_then(|l| l.named_child(0))
                {
                    let l = self.handle_expression(left)?;
                    self.graph.add_edge(b, l, Edge::new(EdgeKind::Lhs));
                }
                if let Some(right) =
                    node.child_by_field_name("right").and_then(|r| r.named_child(0))
                {
                    let r = self.handle_expression(right)?;
                    self.graph.add_edge(b, r, Edge::new(EdgeKind::Rhs));
                }
                Some(b)
            }
            "inc_statement" | "dec_statement" => {
                let op = if node.kind() == "inc_statement" { "++" } else { "--" };
                let u = self.graph.add_node(Node::unary_operator(op, true));
                self.stamp(u, node);
                if let Some(expr) = node.named_child(0) {
                    let e = self.handle_expression(expr)?;
                    self.graph.add_edge(u, e, Edge::new(EdgeKind::Operand));
                }
                Some(u)
            }
            "expression_statement" => match node.named_child(0) {
                Some(expr) => Some(self.handle_expression(expr)?),
                None => None,
            },
            "comment" => None,
            _ => Some(self.problem(node)),
        };
        Ok(id)
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn handle_expression(&mut self, node: tree_sitter::Node) -> Result<NodeId, TranslationError> {
        let id = match node.kind() {
            "int_literal" => {
                let value = self
                    .text(node)
                    .parse::<i64>()
                    .map(LiteralValue::Int)
                    .unwrap_or(LiteralValue::Null);
                let lit = self.graph.add_node(Node::literal(value));
                self.stamp(lit, node);
                lit
            }
            "float_literal" => {
                let value = self
                    .text(node)
                    .parse::<f64>()
                    .map(LiteralValue::Float)
                    .unwrap_or(LiteralValue::Null);
                let lit = self.graph.add_node(Node::literal(value));
                self.stamp(lit, node);
                lit
            }
            "interpreted_string_literal" | "raw_string_literal" => {
                let text = self.text(node);
                let value = text.trim_matches('"').trim_matches('`').to_string();
                let lit = self.graph.add_node(Node::literal(LiteralValue::Str(value)));
                self.stamp(lit, node);
                lit
            }
            "rune_literal" => {
                let c = self.text(node).trim_matches('\'').chars().next().unwrap_or('\0');
                let lit = self.graph.add_node(Node::literal(LiteralValue::Char(c)));
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
            "nil" => {
                let lit = self.graph.add_node(Node::literal(LiteralValue::Null));
                self.stamp(lit, node);
                lit
            }
            "identifier" | "field_identifier" => {
                let r = self.graph.add_node(Node::declared_reference(self.text(node)));
                self.stamp(r, node);
                r
            }
            "selector_expression" => {
                let member = node
                    .child_by_field_name("field")
                    .map(|f| self.text(f))
                    .unwrap_or_default();
                let m = self.graph.add_node(Node::member_expression(member, false));
                self.stamp(m, node);
                if let Some(base) = node.child_by_field_name("operand") {
                    let b = self.handle_expression(base)?;
                    self.graph.add_edge(m, b, Edge::new(EdgeKind::Base));
                }
                m
            }
            "call_expression" => {
                let func = node.child_by_field_name("function");
                let call = match func.map(|f| f.kind()) {
                    Some("selector_expression") => {
                        let func = func.expect("checked above");
                        let member = func
                            .child_by_field_name("field")
                            .map(|f| self.text(f))
                            .unwrap_or_default();
                        let call = self.graph.add_node(Node::member_call(member));
                        self.stamp(call, node);
                        if let Some(base) = func.child_by_field_name("operand") {
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
            "binary_expression" => {
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
            "unary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_default();
                let u = self.graph.add_node(Node::unary_operator(op, false));
                self.stamp(u, node);
                if let Some(operand) = node.child_by_field_name("operand") {
                    let o = self.handle_expression(operand)?;
                    self.graph.add_edge(u, o, Edge::new(EdgeKind::Operand));
                }
                u
            }
            "index_expression" => {
                let s = self.graph.add_node(Node::array_subscript());
                self.stamp(s, node);
                if let Some(operand) = node.child_by_field_name("operand") {
                    let o = self.handle_expression(operand)?;
                    self.graph.add_edge(s, o, Edge::new(EdgeKind::Operand));
                }
                if let Some(index) = node.child_by_field_name("index") {
                    let i = self.handle_expression(index)?;
                    self.graph.add_edge(s, i, Edge::new(EdgeKind::Index));
                }
                s
            }
            "parenthesized_expression" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| TranslationError::ParseFailed("empty parentheses".into()))?;
                self.handle_expression(inner)?
            }
            "composite_literal" => {
                let ty = node
                    .child_by_field_name("type")
                    .map(|t| parse_go_type(&self.text(t)))
                    .unwrap_or_else(Type::unknown);
                let c = self.graph.add_node(Node::construct_expression(ty));
                self.stamp(c, node);
                c
            }
            _ => self.problem(node),
        };
        Ok(id)
    }

    fn delimiter(&self) -> &'static str {
        "."
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

    fn problem(&mut self, node: tree_sitter::Node) -> NodeId {
        let text = self.text(node);
        let id = self.graph.add_node(Node::problem(text));
        self.stamp(id, node);
        id
    }
}
