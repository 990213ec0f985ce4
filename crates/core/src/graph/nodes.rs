//! Node types for the property graph

use crate::scope::ScopeId;
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source region with 1-based, inclusive line/column coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Region {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// Where a node came from: the file it was parsed out of plus its region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhysicalLocation {
    pub file: PathBuf,
    pub region: Region,
}

impl PhysicalLocation {
    pub fn new(file: PathBuf, region: Region) -> Self {
        Self { file, region }
    }
}

/// A node in the property graph.
///
/// Shared attributes (name, source text, location, scope) live on this
/// envelope; everything specific to a variant lives in [`NodeData`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// The kind of entity this node represents
    kind: NodeKind,

    /// Simple (unqualified) name; empty for anonymous nodes
    name: String,

    /// Fully qualified name, when the enclosing namespace/record chain is known
    qualified_name: Option<String>,

    /// The source code substring this node was parsed from
    code: Option<String>,

    /// Physical location in the originating file
    location: Option<PhysicalLocation>,

    /// The scope this node was declared or evaluated in
    scope: Option<ScopeId>,

    /// Originating file, stamped by the filename mapper pass
    file: Option<PathBuf>,

    /// Set when a resolver pass found no target for this node
    unresolved: bool,

    /// Set on nodes synthesized by a pass rather than parsed from source
    implicit: bool,

    /// Comment attached by the frontend, if any
    comment: Option<String>,

    /// Variant-specific payload
    data: NodeData,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>, data: NodeData) -> Self {
        Self {
            kind,
            name: name.into(),
            qualified_name: None,
            code: None,
            location: None,
            scope: None,
            file: None,
            unresolved: false,
            implicit: false,
            comment: None,
            data,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.qualified_name.as_deref()
    }

    pub fn set_qualified_name(&mut self, name: impl Into<String>) {
        self.qualified_name = Some(name.into());
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = Some(code.into());
    }

    pub fn location(&self) -> Option<&PhysicalLocation> {
        self.location.as_ref()
    }

    pub fn set_location(&mut self, location: PhysicalLocation) {
        self.location = Some(location);
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    pub fn set_scope(&mut self, scope: ScopeId) {
        self.scope = Some(scope);
    }

    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn set_file(&mut self, file: PathBuf) {
        self.file = Some(file);
    }

    pub fn is_unresolved(&self) -> bool {
        self.unresolved
    }

    pub fn set_unresolved(&mut self, unresolved: bool) {
        self.unresolved = unresolved;
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn set_implicit(&mut self, implicit: bool) {
        self.implicit = implicit;
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    /// The declared or produced type of this node, if it carries one.
    ///
    /// For callables this is the return type.
    pub fn ty(&self) -> Option<&Type> {
        match &self.data {
            NodeData::Function(info) | NodeData::Method(info) | NodeData::Constructor(info) => {
                Some(&info.return_type)
            }
            NodeData::Field { ty }
            | NodeData::Variable { ty }
            | NodeData::Typedef { ty }
            | NodeData::NewExpression { ty }
            | NodeData::ConstructExpression { ty }
            | NodeData::Cast { ty }
            | NodeData::Parameter { ty, .. } => Some(ty),
            _ => None,
        }
    }

    pub fn set_ty(&mut self, new_ty: Type) {
        match &mut self.data {
            NodeData::Function(info) | NodeData::Method(info) | NodeData::Constructor(info) => {
                info.return_type = new_ty;
            }
            NodeData::Field { ty }
            | NodeData::Variable { ty }
            | NodeData::Typedef { ty }
            | NodeData::NewExpression { ty }
            | NodeData::ConstructExpression { ty }
            | NodeData::Cast { ty }
            | NodeData::Parameter { ty, .. } => *ty = new_ty,
            _ => {}
        }
    }

    // ── Variant factories ────────────────────────────────────────────────

    pub fn translation_unit(name: impl Into<String>) -> Self {
        Self::new(NodeKind::TranslationUnit, name, NodeData::TranslationUnit)
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Namespace, name, NodeData::Namespace)
    }

    pub fn record(name: impl Into<String>, record_kind: impl Into<String>) -> Self {
        Self::new(
            NodeKind::Record,
            name,
            NodeData::Record {
                record_kind: record_kind.into(),
                super_classes: Vec::new(),
            },
        )
    }

    pub fn function(name: impl Into<String>, return_type: Type) -> Self {
        Self::new(
            NodeKind::Function,
            name,
            NodeData::Function(FunctionInfo::new(return_type)),
        )
    }

    pub fn method(name: impl Into<String>, info: FunctionInfo) -> Self {
        Self::new(NodeKind::Method, name, NodeData::Method(info))
    }

    pub fn constructor(name: impl Into<String>, info: FunctionInfo) -> Self {
        Self::new(NodeKind::Constructor, name, NodeData::Constructor(info))
    }

    pub fn field(name: impl Into<String>, ty: Type) -> Self {
        Self::new(NodeKind::Field, name, NodeData::Field { ty })
    }

    pub fn variable(name: impl Into<String>, ty: Type) -> Self {
        Self::new(NodeKind::Variable, name, NodeData::Variable { ty })
    }

    pub fn parameter(name: impl Into<String>, ty: Type, index: usize) -> Self {
        Self::new(
            NodeKind::Parameter,
            name,
            NodeData::Parameter {
                ty,
                index,
                variadic: false,
            },
        )
    }

    /// The synthetic trailing parameter marking a variadic signature.
    pub fn variadic_parameter(index: usize) -> Self {
        let mut node = Self::new(
            NodeKind::Parameter,
            "va_args",
            NodeData::Parameter {
                ty: Type::unknown(),
                index,
                variadic: true,
            },
        );
        node.implicit = true;
        node
    }

    pub fn enum_decl(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Enum, name, NodeData::Enum)
    }

    pub fn enum_constant(name: impl Into<String>) -> Self {
        Self::new(NodeKind::EnumConstant, name, NodeData::EnumConstant)
    }

    pub fn typedef(alias: impl Into<String>, ty: Type) -> Self {
        Self::new(NodeKind::Typedef, alias, NodeData::Typedef { ty })
    }

    pub fn block() -> Self {
        Self::new(NodeKind::Block, "", NodeData::Block)
    }

    pub fn if_stmt() -> Self {
        Self::new(NodeKind::If, "", NodeData::If)
    }

    pub fn while_stmt() -> Self {
        Self::new(NodeKind::While, "", NodeData::While)
    }

    pub fn for_stmt() -> Self {
        Self::new(NodeKind::For, "", NodeData::For)
    }

    pub fn for_each_stmt() -> Self {
        Self::new(NodeKind::ForEach, "", NodeData::ForEach)
    }

    pub fn switch_stmt() -> Self {
        Self::new(NodeKind::Switch, "", NodeData::Switch)
    }

    pub fn case_stmt() -> Self {
        Self::new(NodeKind::Case, "", NodeData::Case)
    }

    pub fn default_stmt() -> Self {
        Self::new(NodeKind::Default, "", NodeData::Default)
    }

    pub fn return_stmt() -> Self {
        Self::new(NodeKind::Return, "", NodeData::Return)
    }

    pub fn break_stmt() -> Self {
        Self::new(NodeKind::Break, "", NodeData::Break)
    }

    pub fn continue_stmt() -> Self {
        Self::new(NodeKind::Continue, "", NodeData::Continue)
    }

    pub fn try_stmt() -> Self {
        Self::new(NodeKind::Try, "", NodeData::Try)
    }

    pub fn catch_clause(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Catch, name, NodeData::Catch)
    }

    pub fn declaration_stmt() -> Self {
        Self::new(NodeKind::DeclarationStmt, "", NodeData::DeclarationStmt)
    }

    pub fn literal(value: LiteralValue) -> Self {
        Self::new(NodeKind::Literal, "", NodeData::Literal { value })
    }

    pub fn declared_reference(name: impl Into<String>) -> Self {
        Self::new(NodeKind::DeclaredReference, name, NodeData::DeclaredReference)
    }

    pub fn member_expression(member: impl Into<String>, arrow: bool) -> Self {
        let member = member.into();
        Self::new(
            NodeKind::MemberExpression,
            member.clone(),
            NodeData::MemberExpression { member, arrow },
        )
    }

    pub fn call_expression(callee_name: impl Into<String>) -> Self {
        let callee_name = callee_name.into();
        Self::new(
            NodeKind::CallExpression,
            callee_name.clone(),
            NodeData::CallExpression { callee_name },
        )
    }

    pub fn member_call(member: impl Into<String>) -> Self {
        let member = member.into();
        Self::new(
            NodeKind::MemberCall,
            member.clone(),
            NodeData::MemberCall { member },
        )
    }

    pub fn new_expression(ty: Type) -> Self {
        Self::new(NodeKind::NewExpression, "", NodeData::NewExpression { ty })
    }

    pub fn construct_expression(ty: Type) -> Self {
        Self::new(
            NodeKind::ConstructExpression,
            "",
            NodeData::ConstructExpression { ty },
        )
    }

    pub fn binary_operator(op: impl Into<String>) -> Self {
        Self::new(
            NodeKind::BinaryOperator,
            "",
            NodeData::BinaryOperator { op: op.into() },
        )
    }

    pub fn unary_operator(op: impl Into<String>, postfix: bool) -> Self {
        Self::new(
            NodeKind::UnaryOperator,
            "",
            NodeData::UnaryOperator {
                op: op.into(),
                postfix,
            },
        )
    }

    pub fn cast(ty: Type) -> Self {
        Self::new(NodeKind::Cast, "", NodeData::Cast { ty })
    }

    pub fn array_subscript() -> Self {
        Self::new(NodeKind::ArraySubscript, "", NodeData::ArraySubscript)
    }

    pub fn conditional() -> Self {
        Self::new(NodeKind::Conditional, "", NodeData::Conditional)
    }

    pub fn initializer_list() -> Self {
        Self::new(NodeKind::InitializerList, "", NodeData::InitializerList)
    }

    /// Stub for a raw-AST variant no handler recognized; the raw source
    /// text is preserved in `code`.
    pub fn problem(raw: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Problem, "", NodeData::Problem);
        node.code = Some(raw.into());
        node
    }

    // ── Promotions ───────────────────────────────────────────────────────
    //
    // Promotion allocates a fresh node of the target variant carrying the
    // same envelope; the caller rewires edges and retires the old node.

    /// A method carrying this function's envelope and signature.
    pub fn as_method(&self) -> Self {
        let info = self.function_info();
        let mut node = self.clone();
        node.kind = NodeKind::Method;
        node.data = NodeData::Method(info);
        node
    }

    /// A constructor carrying this function's envelope, typed with the
    /// enclosing record's type.
    pub fn as_constructor(&self, record_type: Type) -> Self {
        let mut info = self.function_info();
        info.return_type = record_type;
        let mut node = self.clone();
        node.kind = NodeKind::Constructor;
        node.data = NodeData::Constructor(info);
        node
    }

    /// A field carrying this variable's envelope and type.
    pub fn as_field(&self) -> Self {
        let ty = self.ty().cloned().unwrap_or_else(Type::unknown);
        let mut node = self.clone();
        node.kind = NodeKind::Field;
        node.data = NodeData::Field { ty };
        node
    }

    fn function_info(&self) -> FunctionInfo {
        match &self.data {
            NodeData::Function(info) | NodeData::Method(info) | NodeData::Constructor(info) => {
                info.clone()
            }
            _ => FunctionInfo::new(Type::unknown()),
        }
    }

    /// Rewrite record links inside carried types after a merge remapped
    /// node ids.
    pub(crate) fn remap_record_links(
        &mut self,
        map: &std::collections::HashMap<crate::graph::NodeId, crate::graph::NodeId>,
    ) {
        match &mut self.data {
            NodeData::Function(info) | NodeData::Method(info) | NodeData::Constructor(info) => {
                info.return_type.remap_records(map);
            }
            NodeData::Field { ty }
            | NodeData::Variable { ty }
            | NodeData::Typedef { ty }
            | NodeData::NewExpression { ty }
            | NodeData::ConstructExpression { ty }
            | NodeData::Cast { ty }
            | NodeData::Parameter { ty, .. } => ty.remap_records(map),
            NodeData::Record { super_classes, .. } => {
                for sup in super_classes {
                    sup.remap_records(map);
                }
            }
            _ => {}
        }
    }
}

/// The kind of entity a node represents. Closed set, one tag per variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Declarations
    TranslationUnit,
    Namespace,
    Record,
    Function,
    Method,
    Constructor,
    Field,
    Variable,
    Parameter,
    Enum,
    EnumConstant,
    Typedef,
    // Statements
    Block,
    If,
    While,
    For,
    ForEach,
    Switch,
    Case,
    Default,
    Return,
    Break,
    Continue,
    Try,
    Catch,
    DeclarationStmt,
    // Expressions
    Literal,
    DeclaredReference,
    MemberExpression,
    CallExpression,
    MemberCall,
    NewExpression,
    ConstructExpression,
    BinaryOperator,
    UnaryOperator,
    Cast,
    ArraySubscript,
    Conditional,
    InitializerList,
    /// A raw-AST variant no handler recognized
    Problem,
}

impl NodeKind {
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::TranslationUnit
                | NodeKind::Namespace
                | NodeKind::Record
                | NodeKind::Function
                | NodeKind::Method
                | NodeKind::Constructor
                | NodeKind::Field
                | NodeKind::Variable
                | NodeKind::Parameter
                | NodeKind::Enum
                | NodeKind::EnumConstant
                | NodeKind::Typedef
        )
    }

    /// Declarations that introduce a usable value (resolution targets).
    pub fn is_value_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::Function
                | NodeKind::Method
                | NodeKind::Constructor
                | NodeKind::Field
                | NodeKind::Variable
                | NodeKind::Parameter
                | NodeKind::EnumConstant
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            NodeKind::Function | NodeKind::Method | NodeKind::Constructor
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::If
                | NodeKind::While
                | NodeKind::For
                | NodeKind::ForEach
                | NodeKind::Switch
                | NodeKind::Case
                | NodeKind::Default
                | NodeKind::Return
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Try
                | NodeKind::Catch
                | NodeKind::DeclarationStmt
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Literal
                | NodeKind::DeclaredReference
                | NodeKind::MemberExpression
                | NodeKind::CallExpression
                | NodeKind::MemberCall
                | NodeKind::NewExpression
                | NodeKind::ConstructExpression
                | NodeKind::BinaryOperator
                | NodeKind::UnaryOperator
                | NodeKind::Cast
                | NodeKind::ArraySubscript
                | NodeKind::Conditional
                | NodeKind::InitializerList
        )
    }
}

/// Signature information shared by functions, methods, and constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionInfo {
    pub return_type: Type,
    pub is_variadic: bool,
}

impl FunctionInfo {
    pub fn new(return_type: Type) -> Self {
        Self {
            return_type,
            is_variadic: false,
        }
    }
}

/// Variant-specific payload for each node kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NodeData {
    TranslationUnit,
    Namespace,
    Record {
        /// `struct`, `class`, or `union`
        record_kind: String,
        /// Super class types as parsed; linked to records by the type resolver
        super_classes: Vec<Type>,
    },
    Function(FunctionInfo),
    Method(FunctionInfo),
    Constructor(FunctionInfo),
    Field {
        ty: Type,
    },
    Variable {
        ty: Type,
    },
    Parameter {
        ty: Type,
        index: usize,
        variadic: bool,
    },
    Enum,
    EnumConstant,
    Typedef {
        /// The aliased target type; the alias name is the node's name
        ty: Type,
    },
    Block,
    If,
    While,
    For,
    ForEach,
    Switch,
    Case,
    Default,
    Return,
    Break,
    Continue,
    Try,
    Catch,
    DeclarationStmt,
    Literal {
        value: LiteralValue,
    },
    DeclaredReference,
    MemberExpression {
        member: String,
        /// `->` access rather than `.`
        arrow: bool,
    },
    CallExpression {
        callee_name: String,
    },
    MemberCall {
        member: String,
    },
    NewExpression {
        ty: Type,
    },
    ConstructExpression {
        ty: Type,
    },
    BinaryOperator {
        op: String,
    },
    UnaryOperator {
        op: String,
        postfix: bool,
    },
    Cast {
        ty: Type,
    },
    ArraySubscript,
    Conditional,
    InitializerList,
    Problem,
}

/// A parsed literal value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Null,
}
