//! C and C++ frontend using Tree-sitter.
//!
//! Uses `tree-sitter-cpp` for `.cpp`, `.cc`, `.cxx`, `.hpp`, `.hxx` files
//! and `tree-sitter-c` for `.c` and `.h` files. Quoted includes are
//! resolved against the including file's directory and the configured
//! include roots, and their declarations are parsed into the same
//! translation unit with locations pointing at the header.

use super::{attach_comment, raw_location, LanguageFrontend, TranslationError};
use crate::graph::{
    Edge, EdgeKind, FunctionInfo, LiteralValue, Node, NodeData, NodeId, NodeKind, PropertyGraph,
};
use crate::scope::{ScopeKind, ScopeManager};
use crate::types::Type;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tree_sitter::Parser;

/// C and C++ language frontend.
pub struct CppFrontend {
    c_language: tree_sitter::Language,
    cpp_language: tree_sitter::Language,
    include_paths: Vec<PathBuf>,
}

impl CppFrontend {
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        Self {
            c_language: tree_sitter_c::LANGUAGE.into(),
            cpp_language: tree_sitter_cpp::LANGUAGE.into(),
            include_paths,
        }
    }

    fn is_cpp(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "cpp" | "cc" | "cxx" | "hpp" | "hxx"))
            .unwrap_or(false)
    }

    fn parse_tree(&self, source: &str, is_cpp: bool) -> Result<tree_sitter::Tree, TranslationError> {
        let mut parser = Parser::new();
        let lang = if is_cpp {
            &self.cpp_language
        } else {
            &self.c_language
        };
        parser
            .set_language(lang)
            .map_err(|e| TranslationError::TreeSitter(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| TranslationError::ParseFailed("failed to parse C/C++ source".to_string()))
    }
}

impl Default for CppFrontend {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LanguageFrontend for CppFrontend {
    fn language_name(&self) -> &str {
        "c/cpp"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".c", ".h", ".cpp", ".cc", ".cxx", ".hpp", ".hxx"]
    }

    fn namespace_delimiter(&self) -> &str {
        "::"
    }

    fn parse_source(
        &self,
        source: &str,
        file_path: &Path,
        graph: &mut PropertyGraph,
    ) -> Result<NodeId, TranslationError> {
        let is_cpp = self.is_cpp(file_path);
        let tree = self.parse_tree(source, is_cpp)?;

        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut tu_node = Node::translation_unit(name);
        tu_node.set_location(raw_location(&tree.root_node(), file_path));
        tu_node.set_file(file_path.to_path_buf());
        let global = graph.global_scope();
        let tu = graph.add_node(tu_node);
        if let Some(n) = graph.node_mut(tu) {
            n.set_scope(global);
        }

        let mut translator = Translator {
            frontend: self,
            graph,
            scopes: ScopeManager::new(),
            tu,
            records: HashMap::new(),
            included: HashSet::new(),
            is_cpp,
        };
        let ctx = FileCtx { source, path: file_path };
        translator.translate_children(tree.root_node(), &ctx)?;
        Ok(tu)
    }
}

/// Per-file source context; include inlining swaps in the header's.
struct FileCtx<'s> {
    source: &'s str,
    path: &'s Path,
}

/// State for one `parse_source` call.
struct Translator<'f, 'g> {
    frontend: &'f CppFrontend,
    graph: &'g mut PropertyGraph,
    scopes: ScopeManager,
    tu: NodeId,
    /// Record name → node, for out-of-line definitions and construct calls
    records: HashMap<String, NodeId>,
    /// Headers already inlined, to break include cycles
    included: HashSet<PathBuf>,
    is_cpp: bool,
}

impl<'f, 'g> Translator<'f, 'g> {
    // ── Top level ────────────────────────────────────────────────────────

    fn translate_children(
        &mut self,
        root: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<(), TranslationError> {
        let mut cursor = root.walk();
        let children: Vec<tree_sitter::Node> = root.children(&mut cursor).collect();
        for child in children {
            self.handle_top_level(child, ctx)?;
        }
        Ok(())
    }

    fn handle_top_level(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<(), TranslationError> {
        match node.kind() {
            "function_definition" => {
                let id = self.handle_function_definition(node, ctx)?;
                self.graph.add_child(self.tu, EdgeKind::Ast, id);
                attach_comment(self.graph, id, &node, ctx.source);
            }
            "declaration" | "field_declaration" => {
                for id in self.handle_declaration(node, ctx)? {
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    attach_comment(self.graph, id, &node, ctx.source);
                }
            }
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                if node.child_by_field_name("body").is_some() {
                    let id = self.handle_record(node, ctx)?;
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                    attach_comment(self.graph, id, &node, ctx.source);
                }
            }
            "namespace_definition" => {
                let id = self.handle_namespace(node, ctx)?;
                self.graph.add_child(self.tu, EdgeKind::Ast, id);
            }
            "enum_specifier" => {
                if node.child_by_field_name("body").is_some() {
                    let id = self.handle_enum(node, ctx)?;
                    self.graph.add_child(self.tu, EdgeKind::Ast, id);
                }
            }
            "type_definition" => {
                let id = self.handle_typedef(node, ctx);
                self.graph.add_child(self.tu, EdgeKind::Ast, id);
            }
            "preproc_include" => {
                self.handle_include(node, ctx)?;
            }
            "template_declaration" => {
                // Unwrap the template and translate the inner definition
                let mut tc = node.walk();
                let inner: Vec<tree_sitter::Node> = node.children(&mut tc).collect();
                for child in inner {
                    if matches!(
                        child.kind(),
                        "function_definition" | "class_specifier" | "struct_specifier"
                    ) {
                        self.handle_top_level(child, ctx)?;
                        break;
                    }
                }
            }
            ";" | "comment" | "preproc_def" | "preproc_function_def" | "preproc_ifdef"
            | "preproc_if" | "preproc_call" => {}
            "ERROR" => {}
            _ => {
                let id = self.problem(node, ctx);
                self.graph.add_child(self.tu, EdgeKind::Ast, id);
            }
        }
        Ok(())
    }

    // ── Declarations ─────────────────────────────────────────────────────

    /// Handle a `declaration` node: variables (possibly several
    /// declarators), function prototypes, or function pointers.
    fn handle_declaration(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<Vec<NodeId>, TranslationError> {
        let mut out = Vec::new();
        let base_type = self.specifier_text(node, ctx);

        // `struct X { ... } x;` declares the record too
        if let Some(type_node) = node.child_by_field_name("type") {
            if matches!(
                type_node.kind(),
                "class_specifier" | "struct_specifier" | "union_specifier"
            ) && type_node.child_by_field_name("body").is_some()
            {
                out.push(self.handle_record(type_node, ctx)?);
            }
        }

        let mut cursor = node.walk();
        let declarators: Vec<tree_sitter::Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            if let Some(id) = self.handle_declarator(declarator, &base_type, node, ctx)? {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// One declarator out of a declaration. Returns the declaration node
    /// produced, if the declarator shape is recognized.
    fn handle_declarator(
        &mut self,
        declarator: tree_sitter::Node,
        base_type: &str,
        declaration: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<Option<NodeId>, TranslationError> {
        let (inner, init_value, init_args) = split_init_declarator(declarator);

        if let Some((fn_declarator, pointer_depth)) = unwrap_to_function_declarator(inner) {
            let name_node = fn_declarator.child_by_field_name("declarator");
            let is_pointer = name_node
                .map(|n| n.kind() == "parenthesized_declarator")
                .unwrap_or(true);
            if is_pointer {
                // A function declarator with no direct name is a function
                // pointer; whether it is a field or a variable depends on
                // where we are (record scope members are promoted later)
                let code = self.text(declaration, ctx);
                let name = function_pointer_name(&code);
                let ty = Type::parse(&code);
                let mut var = Node::variable(name, ty);
                var.set_code(code);
                var.set_location(raw_location(&declaration, ctx.path));
                let id = self.graph.add_node(var);
                self.scopes.add_declaration(self.graph, id);
                if let Some(value) = init_value {
                    let init = self.handle_expression(value, ctx)?;
                    self.graph.add_edge(id, init, Edge::new(EdgeKind::Initializer));
                }
                return Ok(Some(id));
            }
            // A named function declarator: a prototype
            let id = self.build_callable(fn_declarator, base_type, pointer_depth, None, declaration, ctx)?;
            return Ok(Some(id));
        }

        // Plain (possibly wrapped) variable declarator
        let Some((name, wrappers)) = declarator_name(inner, ctx.source) else {
            return Ok(None);
        };
        let ty = Type::parse(&format!("{}{}", base_type, wrappers));
        let mut var = Node::variable(name, ty);
        var.set_code(self.text(declaration, ctx));
        var.set_location(raw_location(&declaration, ctx.path));
        let id = self.graph.add_node(var);
        self.stamp_scope(id);
        self.scopes.add_declaration(self.graph, id);

        if let Some(value) = init_value {
            let init = self.handle_expression(value, ctx)?;
            self.graph.add_edge(id, init, Edge::new(EdgeKind::Initializer));
        } else if let Some(args) = init_args {
            // `SomeClass s(1);` constructs in place
            let ty = self
                .graph
                .node(id)
                .and_then(|n| n.ty().cloned())
                .unwrap_or_else(Type::unknown);
            let construct = self.graph.add_node(Node::construct_expression(ty));
            self.stamp(construct, declaration, ctx);
            let mut ac = args.walk();
            let arg_nodes: Vec<tree_sitter::Node> = args.named_children(&mut ac).collect();
            for arg in arg_nodes {
                let a = self.handle_expression(arg, ctx)?;
                self.graph.add_child(construct, EdgeKind::Arguments, a);
            }
            self.graph
                .add_edge(id, construct, Edge::new(EdgeKind::Initializer));
        }
        Ok(Some(id))
    }

    /// Build a function, method, or constructor from a function declarator.
    /// `body` carries the defining `function_definition` node when present.
    fn build_callable(
        &mut self,
        fn_declarator: tree_sitter::Node,
        base_type: &str,
        pointer_depth: usize,
        body: Option<tree_sitter::Node>,
        raw: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let name_node = fn_declarator
            .child_by_field_name("declarator")
            .ok_or_else(|| TranslationError::ParseFailed("function declarator without a name".into()))?;
        let raw_name = self.text(name_node, ctx);

        let mut return_text = base_type.to_string();
        for _ in 0..pointer_depth {
            return_text.push('*');
        }
        let return_type = Type::parse(&return_text);

        // `A::f` definitions are methods (or constructors) of record `A`
        let (record, simple_name) = if name_node.kind() == "qualified_identifier" {
            let parts: Vec<&str> = raw_name.split("::").collect();
            let record_name = parts[..parts.len() - 1].join("::");
            let simple = parts[parts.len() - 1].to_string();
            let record = self
                .records
                .get(record_name.rsplit("::").next().unwrap_or(&record_name))
                .copied();
            (record, simple)
        } else {
            (None, raw_name.clone())
        };

        let out_of_line = record.is_some();
        let record_name = record
            .and_then(|r| self.graph.node(r))
            .map(|n| n.name().to_string());

        let node = if out_of_line {
            let is_ctor = record_name.as_deref() == Some(simple_name.as_str());
            let mut info = FunctionInfo::new(return_type);
            if is_ctor {
                info.return_type = Type::object(record_name.clone().unwrap_or_default());
            }
            if is_ctor {
                Node::constructor(simple_name.clone(), info)
            } else {
                Node::method(simple_name.clone(), info)
            }
        } else {
            Node::function(simple_name.clone(), return_type)
        };

        let id = self.graph.add_node(node);
        self.stamp(id, raw, ctx);

        // Everything inside an out-of-line method sits in its record's scope
        let entered_record = record
            .and_then(|rec| self.scopes.enter_scope_of(self.graph, rec).map(|_| rec));

        let prefix = self
            .scopes
            .current_name_prefix(self.graph, self.frontend.namespace_delimiter());
        if !prefix.is_empty() {
            if let Some(n) = self.graph.node_mut(id) {
                n.set_qualified_name(format!("{}{}", prefix, simple_name));
            }
        }

        self.scopes.add_declaration(self.graph, id);
        if let Some(rec) = record {
            // Member edge next to the unit-level one
            self.graph.add_child(rec, EdgeKind::Ast, id);
        }

        self.scopes.enter_scope(self.graph, id, ScopeKind::Function);
        self.handle_parameters(fn_declarator, id, ctx)?;
        if let Some(body_node) = body {
            if let Some(block) = self.handle_statement(body_node, ctx)? {
                self.graph.add_edge(id, block, Edge::new(EdgeKind::Body));
            }
        }
        self.scopes.leave_scope(self.graph, id)?;

        if let Some(rec) = entered_record {
            self.scopes.leave_scope(self.graph, rec)?;
        }
        Ok(id)
    }

    fn handle_function_definition(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let base_type = self.specifier_text(node, ctx);
        let declarator = node
            .child_by_field_name("declarator")
            .ok_or_else(|| TranslationError::ParseFailed("function definition without declarator".into()))?;
        let (fn_declarator, pointer_depth) = unwrap_to_function_declarator(declarator)
            .ok_or_else(|| TranslationError::ParseFailed("no function declarator found".into()))?;
        let body = node.child_by_field_name("body");
        self.build_callable(fn_declarator, &base_type, pointer_depth, body, node, ctx)
    }

    /// Handle a parameter list: fixed parameters in order, then the
    /// synthetic variadic marker when `...` is present.
    fn handle_parameters(
        &mut self,
        fn_declarator: tree_sitter::Node,
        function: NodeId,
        ctx: &FileCtx,
    ) -> Result<(), TranslationError> {
        let Some(params) = fn_declarator.child_by_field_name("parameters") else {
            return Ok(());
        };
        let mut index = 0;
        let mut cursor = params.walk();
        let children: Vec<tree_sitter::Node> = params.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "parameter_declaration" | "optional_parameter_declaration" => {
                    let base = self.specifier_text(child, ctx);
                    let (name, wrappers) = child
                        .child_by_field_name("declarator")
                        .and_then(|d| declarator_name(d, ctx.source))
                        .unwrap_or_default();
                    let ty = Type::parse(&format!("{}{}", base, wrappers));
                    let mut param = Node::parameter(name, ty, index);
                    param.set_code(self.text(child, ctx));
                    param.set_location(raw_location(&child, ctx.path));
                    let id = self.graph.add_node(param);
                    self.scopes.add_declaration(self.graph, id);
                    self.graph.add_child(function, EdgeKind::Parameters, id);
                    if let Some(default) = child.child_by_field_name("default_value") {
                        let d = self.handle_expression(default, ctx)?;
                        self.graph.add_edge(id, d, Edge::new(EdgeKind::Initializer));
                    }
                    index += 1;
                }
                "variadic_parameter" | "..." => {
                    let id = self.graph.add_node(Node::variadic_parameter(index));
                    self.scopes.add_declaration(self.graph, id);
                    self.graph.add_child(function, EdgeKind::Parameters, id);
                    if let Some(n) = self.graph.node_mut(function) {
                        match n.data_mut() {
                            NodeData::Function(info)
                            | NodeData::Method(info)
                            | NodeData::Constructor(info) => info.is_variadic = true,
                            _ => {}
                        }
                    }
                    index += 1;
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ── Records ──────────────────────────────────────────────────────────

    fn handle_record(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let record_kind = match node.kind() {
            "class_specifier" => "class",
            "union_specifier" => "union",
            _ => "struct",
        };
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n, ctx))
            .unwrap_or_default();

        let prefix = self
            .scopes
            .current_name_prefix(self.graph, self.frontend.namespace_delimiter());
        let mut record = Node::record(name.clone(), record_kind);
        if !prefix.is_empty() {
            record.set_qualified_name(format!("{}{}", prefix, name));
        }
        if let NodeData::Record { super_classes, .. } = record.data_mut() {
            *super_classes = base_class_types(node, ctx.source);
        }
        let id = self.graph.add_node(record);
        self.stamp(id, node, ctx);
        if !name.is_empty() {
            self.records.insert(name.clone(), id);
        }
        self.scopes.add_declaration(self.graph, id);

        self.scopes.enter_scope(self.graph, id, ScopeKind::Record);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            let members: Vec<tree_sitter::Node> = body.children(&mut cursor).collect();
            for member in members {
                self.handle_member(id, &name, member, ctx)?;
            }
        }

        // Synthesize the default constructor when none was declared
        if self.graph.query().constructors_of(id).is_empty() {
            let mut info = FunctionInfo::new(Type::object(name.clone()));
            info.return_type.set_record(id);
            let mut ctor = Node::constructor(name.clone(), info);
            ctor.set_implicit(true);
            let ctor_id = self.graph.add_node(ctor);
            self.scopes.add_declaration(self.graph, ctor_id);
            self.graph.add_child(id, EdgeKind::Ast, ctor_id);
        }

        self.scopes.leave_scope(self.graph, id)?;
        Ok(id)
    }

    /// Process one member of a record body, promoting functions to
    /// methods/constructors and variables to fields.
    fn handle_member(
        &mut self,
        record: NodeId,
        record_name: &str,
        member: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<(), TranslationError> {
        match member.kind() {
            "function_definition" => {
                let func = self.handle_function_definition(member, ctx)?;
                let promoted = self.promote_member(record, record_name, func);
                attach_comment(self.graph, promoted, &member, ctx.source);
            }
            "field_declaration" | "declaration" => {
                for decl in self.handle_declaration(member, ctx)? {
                    let promoted = self.promote_member(record, record_name, decl);
                    attach_comment(self.graph, promoted, &member, ctx.source);
                }
            }
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                if member.child_by_field_name("body").is_some() {
                    let nested = self.handle_record(member, ctx)?;
                    self.graph.add_child(record, EdgeKind::Ast, nested);
                }
            }
            "enum_specifier" => {
                if member.child_by_field_name("body").is_some() {
                    let nested = self.handle_enum(member, ctx)?;
                    self.graph.add_child(record, EdgeKind::Ast, nested);
                }
            }
            // TODO parse access specifiers into member visibility
            "access_specifier" | "comment" | ";" | "{" | "}" => {}
            _ => {
                let id = self.problem(member, ctx);
                self.graph.add_child(record, EdgeKind::Ast, id);
            }
        }
        Ok(())
    }

    /// The reparenting step: replace a freshly parsed function or variable
    /// by the member variant it actually is. The old node is disconnected
    /// and retired; the scope it defined follows the replacement.
    fn promote_member(&mut self, record: NodeId, record_name: &str, decl: NodeId) -> NodeId {
        let Some(old) = self.graph.node(decl).cloned() else {
            return decl;
        };
        let replacement = match old.kind() {
            NodeKind::Function => {
                if old.name() == record_name {
                    let mut ty = Type::object(record_name);
                    ty.set_record(record);
                    old.as_constructor(ty)
                } else {
                    old.as_method()
                }
            }
            NodeKind::Variable => old.as_field(),
            // Already the right shape (e.g. nested records, constructors
            // built from out-of-line handling)
            _ => {
                if !self.graph.has_edge(record, decl, EdgeKind::Ast) {
                    self.graph.add_child(record, EdgeKind::Ast, decl);
                }
                return decl;
            }
        };

        let new_id = self.graph.add_node(replacement);
        self.graph.replace_node(decl, new_id);
        self.graph.add_child(record, EdgeKind::Ast, new_id);

        // The scope created for the old node (function scopes) and its
        // entry in the defining scope both follow the replacement
        if let Some(scope) = self.graph.scope_of_node(decl) {
            self.graph.scope_mut(scope).set_ast_node(new_id);
        }
        if let Some(defining) = self.graph.node(new_id).and_then(|n| n.scope()) {
            self.graph.scope_mut(defining).replace_declaration(decl, new_id);
        }
        new_id
    }

    // ── Namespaces, enums, typedefs, includes ────────────────────────────

    fn handle_namespace(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n, ctx))
            .unwrap_or_default();
        let ns = self.graph.add_node(Node::namespace(name));
        self.stamp(ns, node, ctx);
        self.scopes.add_declaration(self.graph, ns);

        self.scopes.enter_scope(self.graph, ns, ScopeKind::Namespace);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            let children: Vec<tree_sitter::Node> = body.children(&mut cursor).collect();
            for child in children {
                match child.kind() {
                    "function_definition" => {
                        let id = self.handle_function_definition(child, ctx)?;
                        self.graph.add_child(ns, EdgeKind::Ast, id);
                    }
                    "declaration" => {
                        for id in self.handle_declaration(child, ctx)? {
                            self.graph.add_child(ns, EdgeKind::Ast, id);
                        }
                    }
                    "class_specifier" | "struct_specifier" | "union_specifier" => {
                        if child.child_by_field_name("body").is_some() {
                            let id = self.handle_record(child, ctx)?;
                            self.graph.add_child(ns, EdgeKind::Ast, id);
                        }
                    }
                    "namespace_definition" => {
                        let id = self.handle_namespace(child, ctx)?;
                        self.graph.add_child(ns, EdgeKind::Ast, id);
                    }
                    _ => {}
                }
            }
        }
        self.scopes.leave_scope(self.graph, ns)?;
        Ok(ns)
    }

    fn handle_enum(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n, ctx))
            .unwrap_or_default();
        let id = self.graph.add_node(Node::enum_decl(name));
        self.stamp(id, node, ctx);
        self.scopes.add_declaration(self.graph, id);

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            let entries: Vec<tree_sitter::Node> = body.named_children(&mut cursor).collect();
            for entry in entries {
                if entry.kind() == "enumerator" {
                    let cname = entry
                        .child_by_field_name("name")
                        .map(|n| self.text(n, ctx))
                        .unwrap_or_default();
                    let constant = self.graph.add_node(Node::enum_constant(cname));
                    self.stamp(constant, entry, ctx);
                    self.scopes.add_declaration(self.graph, constant);
                    self.graph.add_child(id, EdgeKind::Ast, constant);
                    if let Some(value) = entry.child_by_field_name("value") {
                        let v = self.handle_expression(value, ctx)?;
                        self.graph
                            .add_edge(constant, v, Edge::new(EdgeKind::Initializer));
                    }
                }
            }
        }
        Ok(id)
    }

    fn handle_typedef(&mut self, node: tree_sitter::Node, ctx: &FileCtx) -> NodeId {
        let target = node
            .child_by_field_name("type")
            .map(|n| self.text(n, ctx))
            .unwrap_or_default();
        let (alias, wrappers) = node
            .child_by_field_name("declarator")
            .and_then(|d| declarator_name(d, ctx.source))
            .unwrap_or_default();
        let ty = Type::parse(&format!("{}{}", target, wrappers));
        let id = self.graph.add_node(Node::typedef(alias, ty));
        self.stamp(id, node, ctx);
        self.scopes.add_declaration(self.graph, id);
        id
    }

    /// Inline a quoted include: resolve the path, parse the header with
    /// the current grammar, and translate its declarations into the same
    /// unit with locations pointing at the header file.
    fn handle_include(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<(), TranslationError> {
        let Some(path_node) = node.child_by_field_name("path") else {
            return Ok(());
        };
        if path_node.kind() != "string_literal" {
            // System includes are outside the analyzed tree
            return Ok(());
        }
        let raw_path = self.text(path_node, ctx);
        let rel = raw_path.trim_matches('"');

        let mut candidates = Vec::new();
        if let Some(dir) = ctx.path.parent() {
            candidates.push(dir.join(rel));
        }
        for root in &self.frontend.include_paths {
            candidates.push(root.join(rel));
        }
        let Some(resolved) = candidates.into_iter().find(|p| p.is_file()) else {
            tracing::warn!(include = rel, from = %ctx.path.display(), "include not found, skipping");
            return Ok(());
        };
        let canonical = resolved.canonicalize().unwrap_or(resolved.clone());
        if !self.included.insert(canonical) {
            return Ok(());
        }

        let header_source = std::fs::read_to_string(&resolved)?;
        let tree = self.frontend.parse_tree(&header_source, self.is_cpp)?;
        let header_ctx = FileCtx {
            source: &header_source,
            path: &resolved,
        };
        self.translate_children(tree.root_node(), &header_ctx)
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn handle_statement(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<Option<NodeId>, TranslationError> {
        let id = match node.kind() {
            "compound_statement" => {
                let block = self.graph.add_node(Node::block());
                self.stamp(block, node, ctx);
                self.scopes.enter_scope(self.graph, block, ScopeKind::Block);
                let mut cursor = node.walk();
                let children: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    if let Some(s) = self.handle_statement(child, ctx)? {
                        self.graph.add_child(block, EdgeKind::Ast, s);
                    }
                }
                self.scopes.leave_scope(self.graph, block)?;
                Some(block)
            }
            "if_statement" => {
                let if_id = self.graph.add_node(Node::if_stmt());
                self.stamp(if_id, node, ctx);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_condition(cond, ctx)?;
                    self.graph.add_edge(if_id, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(then) = node.child_by_field_name("consequence") {
                    if let Some(t) = self.handle_statement(then, ctx)? {
                        self.graph.add_edge(if_id, t, Edge::new(EdgeKind::Then));
                    }
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    let stmt = if alt.kind() == "else_clause" {
                        alt.named_child(0)
                    } else {
                        Some(alt)
                    };
                    if let Some(stmt) = stmt {
                        if let Some(e) = self.handle_statement(stmt, ctx)? {
                            self.graph.add_edge(if_id, e, Edge::new(EdgeKind::Else));
                        }
                    }
                }
                Some(if_id)
            }
            "while_statement" | "do_statement" => {
                let w = self.graph.add_node(Node::while_stmt());
                self.stamp(w, node, ctx);
                self.scopes.enter_scope(self.graph, w, ScopeKind::Loop);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_condition(cond, ctx)?;
                    self.graph.add_edge(w, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_statement(body, ctx)? {
                        self.graph.add_edge(w, b, Edge::new(EdgeKind::Body));
                    }
                }
                self.scopes.leave_scope(self.graph, w)?;
                Some(w)
            }
            "for_statement" => {
                let f = self.graph.add_node(Node::for_stmt());
                self.stamp(f, node, ctx);
                self.scopes.enter_scope(self.graph, f, ScopeKind::Loop);
                if let Some(init) = node.child_by_field_name("initializer") {
                    if let Some(i) = self.handle_statement(init, ctx)? {
                        self.graph.add_edge(f, i, Edge::new(EdgeKind::LoopInit));
                    }
                }
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_expression(cond, ctx)?;
                    self.graph.add_edge(f, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(update) = node.child_by_field_name("update") {
                    let u = self.handle_expression(update, ctx)?;
                    self.graph.add_edge(f, u, Edge::new(EdgeKind::LoopUpdate));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_statement(body, ctx)? {
                        self.graph.add_edge(f, b, Edge::new(EdgeKind::Body));
                    }
                }
                self.scopes.leave_scope(self.graph, f)?;
                Some(f)
            }
            "for_range_loop" => {
                let f = self.graph.add_node(Node::for_each_stmt());
                self.stamp(f, node, ctx);
                self.scopes.enter_scope(self.graph, f, ScopeKind::Loop);
                let base = node
                    .child_by_field_name("type")
                    .map(|t| self.text(t, ctx))
                    .unwrap_or_default();
                if let Some(declarator) = node.child_by_field_name("declarator") {
                    if let Some((name, wrappers)) = declarator_name(declarator, ctx.source) {
                        let ty = Type::parse(&format!("{}{}", base, wrappers));
                        let var = self.graph.add_node(Node::variable(name, ty));
                        self.stamp(var, declarator, ctx);
                        self.scopes.add_declaration(self.graph, var);
                        self.graph.add_edge(f, var, Edge::new(EdgeKind::IterVariable));
                    }
                }
                if let Some(right) = node.child_by_field_name("right") {
                    let r = self.handle_expression(right, ctx)?;
                    self.graph.add_edge(f, r, Edge::new(EdgeKind::Iterable));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_statement(body, ctx)? {
                        self.graph.add_edge(f, b, Edge::new(EdgeKind::Body));
                    }
                }
                self.scopes.leave_scope(self.graph, f)?;
                Some(f)
            }
            "switch_statement" => {
                let s = self.graph.add_node(Node::switch_stmt());
                self.stamp(s, node, ctx);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let c = self.handle_condition(cond, ctx)?;
                    self.graph.add_edge(s, c, Edge::new(EdgeKind::Condition));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_statement(body, ctx)? {
                        self.graph.add_edge(s, b, Edge::new(EdgeKind::Body));
                    }
                }
                Some(s)
            }
            "case_statement" => {
                let value = node.child_by_field_name("value");
                let case = if let Some(v) = value {
                    let case = self.graph.add_node(Node::case_stmt());
                    self.stamp(case, node, ctx);
                    let c = self.handle_expression(v, ctx)?;
                    self.graph.add_edge(case, c, Edge::new(EdgeKind::Condition));
                    case
                } else {
                    let d = self.graph.add_node(Node::default_stmt());
                    self.stamp(d, node, ctx);
                    d
                };
                let mut cursor = node.walk();
                let children: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    if Some(child) == value {
                        continue;
                    }
                    if let Some(stmt) = self.handle_statement(child, ctx)? {
                        self.graph.add_child(case, EdgeKind::Ast, stmt);
                    }
                }
                Some(case)
            }
            "return_statement" => {
                let r = self.graph.add_node(Node::return_stmt());
                self.stamp(r, node, ctx);
                if let Some(value) = node.named_child(0) {
                    let v = self.handle_expression(value, ctx)?;
                    self.graph.add_edge(r, v, Edge::new(EdgeKind::ReturnValue));
                }
                Some(r)
            }
            "break_statement" => {
                let b = self.graph.add_node(Node::break_stmt());
                self.stamp(b, node, ctx);
                Some(b)
            }
            "continue_statement" => {
                let c = self.graph.add_node(Node::continue_stmt());
                self.stamp(c, node, ctx);
                Some(c)
            }
            "try_statement" => {
                let t = self.graph.add_node(Node::try_stmt());
                self.stamp(t, node, ctx);
                if let Some(body) = node.child_by_field_name("body") {
                    if let Some(b) = self.handle_statement(body, ctx)? {
                        self.graph.add_edge(t, b, Edge::new(EdgeKind::Body));
                    }
                }
                let mut cursor = node.walk();
                let clauses: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for clause in clauses {
                    if clause.kind() == "catch_clause" {
                        let catch = self.graph.add_node(Node::catch_clause(""));
                        self.stamp(catch, clause, ctx);
                        self.scopes.enter_scope(self.graph, catch, ScopeKind::TryCatch);
                        if let Some(params) = clause.child_by_field_name("parameters") {
                            let mut pc = params.walk();
                            let decls: Vec<tree_sitter::Node> =
                                params.named_children(&mut pc).collect();
                            for decl in decls {
                                if decl.kind() == "parameter_declaration" {
                                    let base = self.specifier_text(decl, ctx);
                                    if let Some((name, wrappers)) = decl
                                        .child_by_field_name("declarator")
                                        .and_then(|d| declarator_name(d, ctx.source))
                                    {
                                        let ty =
                                            Type::parse(&format!("{}{}", base, wrappers));
                                        let v =
                                            self.graph.add_node(Node::variable(name, ty));
                                        self.stamp(v, decl, ctx);
                                        self.scopes.add_declaration(self.graph, v);
                                        self.graph.add_child(catch, EdgeKind::Ast, v);
                                    }
                                }
                            }
                        }
                        if let Some(cbody) = clause.child_by_field_name("body") {
                            if let Some(b) = self.handle_statement(cbody, ctx)? {
                                self.graph.add_edge(catch, b, Edge::new(EdgeKind::Body));
                            }
                        }
                        self.scopes.leave_scope(self.graph, catch)?;
                        self.graph.add_child(t, EdgeKind::Ast, catch);
                    }
                }
                Some(t)
            }
            "labeled_statement" => node
                .named_child(node.named_child_count().saturating_sub(1))
                .map(|inner| self.handle_statement(inner, ctx))
                .transpose()?
                .flatten(),
            "declaration" => {
                let stmt = self.graph.add_node(Node::declaration_stmt());
                self.stamp(stmt, node, ctx);
                for decl in self.handle_declaration(node, ctx)? {
                    self.graph.add_child(stmt, EdgeKind::Ast, decl);
                }
                Some(stmt)
            }
            "expression_statement" => match node.named_child(0) {
                Some(expr) => Some(self.handle_expression(expr, ctx)?),
                None => None,
            },
            "comment" | ";" => None,
            _ => Some(self.problem(node, ctx)),
        };
        Ok(id)
    }

    /// Unwrap an `if`/`while`/`switch` condition to the tested expression.
    fn handle_condition(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        match node.kind() {
            "parenthesized_expression" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| TranslationError::ParseFailed("empty condition".into()))?;
                self.handle_expression(inner, ctx)
            }
            "condition_clause" => {
                let inner = node
                    .child_by_field_name("value")
                    .or_else(|| node.named_child(0))
                    .ok_or_else(|| TranslationError::ParseFailed("empty condition".into()))?;
                self.handle_expression(inner, ctx)
            }
            _ => self.handle_expression(node, ctx),
        }
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn handle_expression(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let id = match node.kind() {
            "number_literal" => {
                let text = self.text(node, ctx);
                let value = parse_number(&text);
                let lit = self.graph.add_node(Node::literal(value));
                self.stamp(lit, node, ctx);
                lit
            }
            "string_literal" | "concatenated_string" | "raw_string_literal" => {
                let text = self.text(node, ctx);
                let value = text.trim_matches('"').to_string();
                let lit = self.graph.add_node(Node::literal(LiteralValue::Str(value)));
                self.stamp(lit, node, ctx);
                lit
            }
            "char_literal" => {
                let text = self.text(node, ctx);
                let c = text.trim_matches('\'').chars().next().unwrap_or('\0');
                let lit = self.graph.add_node(Node::literal(LiteralValue::Char(c)));
                self.stamp(lit, node, ctx);
                lit
            }
            "true" | "false" => {
                let lit = self
                    .graph
                    .add_node(Node::literal(LiteralValue::Bool(node.kind() == "true")));
                self.stamp(lit, node, ctx);
                lit
            }
            "null" | "nullptr" => {
                let lit = self.graph.add_node(Node::literal(LiteralValue::Null));
                self.stamp(lit, node, ctx);
                lit
            }
            "identifier" | "field_identifier" | "type_identifier" | "this"
            | "qualified_identifier" => {
                let r = self
                    .graph
                    .add_node(Node::declared_reference(self.text(node, ctx)));
                self.stamp(r, node, ctx);
                r
            }
            "call_expression" => self.handle_call(node, ctx)?,
            "field_expression" => {
                let member = node
                    .child_by_field_name("field")
                    .map(|f| self.text(f, ctx))
                    .unwrap_or_default();
                let arrow = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o, ctx) == "->")
                    .unwrap_or(false);
                let m = self.graph.add_node(Node::member_expression(member, arrow));
                self.stamp(m, node, ctx);
                if let Some(base) = node.child_by_field_name("argument") {
                    let b = self.handle_expression(base, ctx)?;
                    self.graph.add_edge(m, b, Edge::new(EdgeKind::Base));
                }
                m
            }
            "assignment_expression" | "binary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o, ctx))
                    .unwrap_or_default();
                let b = self.graph.add_node(Node::binary_operator(op));
                self.stamp(b, node, ctx);
                if let Some(left) = node.child_by_field_name("left") {
                    let l = self.handle_expression(left, ctx)?;
                    self.graph.add_edge(b, l, Edge::new(EdgeKind::Lhs));
                }
                if let Some(right) = node.child_by_field_name("right") {
                    let r = self.handle_expression(right, ctx)?;
                    self.graph.add_edge(b, r, Edge::new(EdgeKind::Rhs));
                }
                b
            }
            "unary_expression" | "pointer_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o, ctx))
                    .unwrap_or_default();
                let u = self.graph.add_node(Node::unary_operator(op, false));
                self.stamp(u, node, ctx);
                if let Some(arg) = node.child_by_field_name("argument") {
                    let a = self.handle_expression(arg, ctx)?;
                    self.graph.add_edge(u, a, Edge::new(EdgeKind::Operand));
                }
                u
            }
            "update_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o, ctx))
                    .unwrap_or_default();
                let postfix = node
                    .child(0)
                    .zip(node.child_by_field_name("argument"))
                    .map(|(first, arg)| first == arg)
                    .unwrap_or(false);
                let u = self.graph.add_node(Node::unary_operator(op, postfix));
                self.stamp(u, node, ctx);
                if let Some(arg) = node.child_by_field_name("argument") {
                    let a = self.handle_expression(arg, ctx)?;
                    self.graph.add_edge(u, a, Edge::new(EdgeKind::Operand));
                }
                u
            }
            "cast_expression" => {
                let ty = node
                    .child_by_field_name("type")
                    .map(|t| Type::parse(&self.text(t, ctx)))
                    .unwrap_or_else(Type::unknown);
                let c = self.graph.add_node(Node::cast(ty));
                self.stamp(c, node, ctx);
                if let Some(value) = node.child_by_field_name("value") {
                    let v = self.handle_expression(value, ctx)?;
                    self.graph.add_edge(c, v, Edge::new(EdgeKind::Operand));
                }
                c
            }
            "subscript_expression" => {
                let s = self.graph.add_node(Node::array_subscript());
                self.stamp(s, node, ctx);
                if let Some(base) = node.child_by_field_name("argument") {
                    let b = self.handle_expression(base, ctx)?;
                    self.graph.add_edge(s, b, Edge::new(EdgeKind::Operand));
                }
                let index = node
                    .child_by_field_name("index")
                    .or_else(|| {
                        node.child_by_field_name("indices")
                            .and_then(|i| i.named_child(0))
                    });
                if let Some(index) = index {
                    let i = self.handle_expression(index, ctx)?;
                    self.graph.add_edge(s, i, Edge::new(EdgeKind::Index));
                }
                s
            }
            "conditional_expression" => {
                let c = self.graph.add_node(Node::conditional());
                self.stamp(c, node, ctx);
                if let Some(cond) = node.child_by_field_name("condition") {
                    let x = self.handle_expression(cond, ctx)?;
                    self.graph.add_edge(c, x, Edge::new(EdgeKind::Condition));
                }
                if let Some(then) = node.child_by_field_name("consequence") {
                    let t = self.handle_expression(then, ctx)?;
                    self.graph.add_edge(c, t, Edge::new(EdgeKind::Then));
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    let e = self.handle_expression(alt, ctx)?;
                    self.graph.add_edge(c, e, Edge::new(EdgeKind::Else));
                }
                c
            }
            "initializer_list" => {
                let list = self.graph.add_node(Node::initializer_list());
                self.stamp(list, node, ctx);
                let mut cursor = node.walk();
                let entries: Vec<tree_sitter::Node> = node.named_children(&mut cursor).collect();
                for entry in entries {
                    let e = self.handle_expression(entry, ctx)?;
                    self.graph.add_child(list, EdgeKind::Ast, e);
                }
                list
            }
            "new_expression" => {
                let ty = node
                    .child_by_field_name("type")
                    .map(|t| Type::parse(&self.text(t, ctx)))
                    .unwrap_or_else(Type::unknown);
                let n = self.graph.add_node(Node::new_expression(ty));
                self.stamp(n, node, ctx);
                if let Some(args) = node.child_by_field_name("arguments") {
                    let mut ac = args.walk();
                    let arg_nodes: Vec<tree_sitter::Node> = args.named_children(&mut ac).collect();
                    for arg in arg_nodes {
                        let a = self.handle_expression(arg, ctx)?;
                        self.graph.add_child(n, EdgeKind::Arguments, a);
                    }
                }
                n
            }
            "parenthesized_expression" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| TranslationError::ParseFailed("empty parentheses".into()))?;
                self.handle_expression(inner, ctx)?
            }
            "sizeof_expression" => {
                let u = self.graph.add_node(Node::unary_operator("sizeof", false));
                self.stamp(u, node, ctx);
                if let Some(value) = node.child_by_field_name("value") {
                    let v = self.handle_expression(value, ctx)?;
                    self.graph.add_edge(u, v, Edge::new(EdgeKind::Operand));
                }
                u
            }
            "comma_expression" => {
                let b = self.graph.add_node(Node::binary_operator(","));
                self.stamp(b, node, ctx);
                if let Some(left) = node.child_by_field_name("left") {
                    let l = self.handle_expression(left, ctx)?;
                    self.graph.add_edge(b, l, Edge::new(EdgeKind::Lhs));
                }
                if let Some(right) = node.child_by_field_name("right") {
                    let r = self.handle_expression(right, ctx)?;
                    self.graph.add_edge(b, r, Edge::new(EdgeKind::Rhs));
                }
                b
            }
            _ => self.problem(node, ctx),
        };
        Ok(id)
    }

    fn handle_call(
        &mut self,
        node: tree_sitter::Node,
        ctx: &FileCtx,
    ) -> Result<NodeId, TranslationError> {
        let func = node
            .child_by_field_name("function")
            .ok_or_else(|| TranslationError::ParseFailed("call without callee".into()))?;

        let call = match func.kind() {
            "field_expression" => {
                let member = func
                    .child_by_field_name("field")
                    .map(|f| self.text(f, ctx))
                    .unwrap_or_default();
                let call = self.graph.add_node(Node::member_call(member));
                self.stamp(call, node, ctx);
                if let Some(base) = func.child_by_field_name("argument") {
                    let b = self.handle_expression(base, ctx)?;
                    self.graph.add_edge(call, b, Edge::new(EdgeKind::Base));
                }
                call
            }
            "identifier" | "qualified_identifier" => {
                let name = self.text(func, ctx);
                let simple = name.rsplit("::").next().unwrap_or(&name);
                if self.records.contains_key(simple) {
                    let mut ty = Type::parse(simple);
                    if let Some(&rec) = self.records.get(simple) {
                        ty.set_record(rec);
                    }
                    let construct = self.graph.add_node(Node::construct_expression(ty));
                    self.stamp(construct, node, ctx);
                    construct
                } else {
                    let call = self.graph.add_node(Node::call_expression(name));
                    self.stamp(call, node, ctx);
                    call
                }
            }
            _ => {
                // Function pointers and other computed callees keep the
                // callee expression attached
                let name = self.text(func, ctx);
                let call = self.graph.add_node(Node::call_expression(name));
                self.stamp(call, node, ctx);
                let callee = self.handle_expression(func, ctx)?;
                self.graph.add_edge(call, callee, Edge::new(EdgeKind::Callee));
                call
            }
        };

        if let Some(args) = node.child_by_field_name("arguments") {
            let mut ac = args.walk();
            let arg_nodes: Vec<tree_sitter::Node> = args.named_children(&mut ac).collect();
            for arg in arg_nodes {
                let a = self.handle_expression(arg, ctx)?;
                self.graph.add_child(call, EdgeKind::Arguments, a);
            }
        }
        Ok(call)
    }

    // ── Shared helpers ───────────────────────────────────────────────────

    fn text(&self, node: tree_sitter::Node, ctx: &FileCtx) -> String {
        node.utf8_text(ctx.source.as_bytes())
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Collect the declared type text: storage class and type qualifiers
    /// followed by the type specifier.
    fn specifier_text(&self, node: tree_sitter::Node, ctx: &FileCtx) -> String {
        let mut parts = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "storage_class_specifier" | "type_qualifier" => {
                    parts.push(self.text(child, ctx));
                }
                _ => {}
            }
        }
        if let Some(ty) = node.child_by_field_name("type") {
            parts.push(self.text(ty, ctx));
        }
        parts.join(" ")
    }

    fn stamp(&mut self, id: NodeId, raw: tree_sitter::Node, ctx: &FileCtx) {
        let scope = self.scopes.current_scope();
        if let Some(node) = self.graph.node_mut(id) {
            node.set_code(
                raw.utf8_text(ctx.source.as_bytes())
                    .map(str::to_string)
                    .unwrap_or_default(),
            );
            node.set_location(raw_location(&raw, ctx.path));
            if node.scope().is_none() {
                node.set_scope(scope);
            }
        }
    }

    fn stamp_scope(&mut self, id: NodeId) {
        let scope = self.scopes.current_scope();
        if let Some(node) = self.graph.node_mut(id) {
            if node.scope().is_none() {
                node.set_scope(scope);
            }
        }
    }

    fn problem(&mut self, node: tree_sitter::Node, ctx: &FileCtx) -> NodeId {
        let id = self.graph.add_node(Node::problem(self.text(node, ctx)));
        self.stamp(id, node, ctx);
        id
    }
}

// ── Declarator plumbing ──────────────────────────────────────────────────

/// Split an `init_declarator` into (inner declarator, `= value`,
/// `(args)` constructor arguments).
fn split_init_declarator(
    declarator: tree_sitter::Node,
) -> (
    tree_sitter::Node,
    Option<tree_sitter::Node>,
    Option<tree_sitter::Node>,
) {
    if declarator.kind() == "init_declarator" {
        let inner = declarator
            .child_by_field_name("declarator")
            .unwrap_or(declarator);
        let value = declarator.child_by_field_name("value");
        let args = value.filter(|v| v.kind() == "argument_list");
        let value = value.filter(|v| v.kind() != "argument_list");
        (inner, value, args)
    } else {
        (declarator, None, None)
    }
}

/// Iteratively unwrap pointer/reference layers until a
/// `function_declarator` appears. Returns it plus the pointer depth
/// collected on the way (part of the return type).
fn unwrap_to_function_declarator(
    mut node: tree_sitter::Node,
) -> Option<(tree_sitter::Node, usize)> {
    let mut depth = 0;
    loop {
        match node.kind() {
            "function_declarator" => return Some((node, depth)),
            "pointer_declarator" => {
                depth += 1;
                node = declarator_child(node)?;
            }
            "reference_declarator" => {
                node = declarator_child(node)?;
            }
            _ => return None,
        }
    }
}

fn declarator_child(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    node.child_by_field_name("declarator")
        .or_else(|| node.named_child(node.named_child_count().saturating_sub(1)))
}

/// Extract the declared name and the postfix wrapper text (`*`, `&`,
/// `[N]`) from a variable declarator.
fn declarator_name(node: tree_sitter::Node, source: &str) -> Option<(String, String)> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" => Some((
            node.utf8_text(source.as_bytes()).ok()?.to_string(),
            String::new(),
        )),
        "pointer_declarator" => {
            let (name, wrappers) = declarator_name(declarator_child(node)?, source)?;
            Some((name, format!("*{}", wrappers)))
        }
        "reference_declarator" => {
            let (name, wrappers) = declarator_name(declarator_child(node)?, source)?;
            Some((name, format!("&{}", wrappers)))
        }
        "array_declarator" => {
            let (name, wrappers) = declarator_name(declarator_child(node)?, source)?;
            let size = node
                .child_by_field_name("size")
                .and_then(|s| s.utf8_text(source.as_bytes()).ok())
                .unwrap_or("");
            Some((name, format!("{}[{}]", wrappers, size)))
        }
        "init_declarator" => declarator_name(declarator_child(node)?, source),
        "parenthesized_declarator" => declarator_name(node.named_child(0)?, source),
        // Abstract declarators (unnamed parameters) still carry wrappers
        "abstract_pointer_declarator" => {
            let (name, wrappers) = node
                .child_by_field_name("declarator")
                .and_then(|d| declarator_name(d, source))
                .unwrap_or_default();
            Some((name, format!("*{}", wrappers)))
        }
        "abstract_reference_declarator" => {
            let (name, wrappers) = node
                .child_by_field_name("declarator")
                .and_then(|d| declarator_name(d, source))
                .unwrap_or_default();
            Some((name, format!("&{}", wrappers)))
        }
        "abstract_array_declarator" => {
            let (name, wrappers) = node
                .child_by_field_name("declarator")
                .and_then(|d| declarator_name(d, source))
                .unwrap_or_default();
            Some((name, format!("{}[]", wrappers)))
        }
        _ => None,
    }
}

/// The declared name inside a `(*name)(args)` function-pointer shape.
fn function_pointer_name(code: &str) -> String {
    let pattern = Regex::new(r"\((\*|.+\*)(?P<name>[^)]*)").expect("pattern is valid");
    pattern
        .captures(code)
        .and_then(|c| c.name("name"))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn base_class_types(node: tree_sitter::Node, source: &str) -> Vec<Type> {
    let mut bases = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "base_class_clause" {
            let mut bc = child.walk();
            for base in child.children(&mut bc) {
                if matches!(base.kind(), "type_identifier" | "qualified_identifier") {
                    if let Ok(name) = base.utf8_text(source.as_bytes()) {
                        bases.push(Type::parse(name));
                    }
                }
            }
        }
    }
    bases
}

fn parse_number(text: &str) -> LiteralValue {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let digits = hex.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
        return i64::from_str_radix(digits, 16)
            .map(LiteralValue::Int)
            .unwrap_or_else(|_| LiteralValue::Str(text.to_string()));
    }
    let cleaned = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if cleaned.contains('.') || cleaned.contains('e') || cleaned.contains('E') {
        cleaned
            .parse::<f64>()
            .map(LiteralValue::Float)
            .unwrap_or_else(|_| LiteralValue::Str(text.to_string()))
    } else {
        cleaned
            .parse::<i64>()
            .map(LiteralValue::Int)
            .unwrap_or_else(|_| LiteralValue::Str(text.to_string()))
    }
}
