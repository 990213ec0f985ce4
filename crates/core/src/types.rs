//! Parsed types: qualifiers, pointer/reference/array wrappers, function
//! pointers, and the compatibility rules the resolver passes rely on.
//!
//! Types are values, not graph nodes. An [`ObjectType`](TypeKind::Object)
//! may carry a link to the record declaration it resolved to; the type
//! resolver pass fills those links in once the records are known.

use crate::graph::{EdgeKind, NodeId, NodeKind, PropertyGraph};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type qualifiers and storage classes collected during parsing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_static: bool,
    pub is_extern: bool,
}

/// Postfix type wrappers, kept in source order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TypeModifier {
    Pointer,
    Reference,
    /// `[N]`; `None` for an unsized `[]`
    Array(Option<usize>),
}

/// What the base of the type is
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TypeKind {
    /// A named type; `record` is filled by the type resolver once the
    /// record declaration is known
    Object { record: Option<NodeId> },
    /// A function (pointer) signature
    Function {
        parameters: Vec<Type>,
        return_type: Box<Type>,
    },
    /// `void`
    Incomplete,
    /// Text that could not be parsed as a type
    Unknown,
}

/// A parsed type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    qualifiers: Qualifiers,
    name: String,
    modifiers: Vec<TypeModifier>,
    kind: TypeKind,
}

const QUALIFIER_TOKENS: [&str; 4] = ["const", "volatile", "static", "extern"];

/// Builtin numeric types ordered by widening rank. Unsigned variants share
/// the rank of their signed counterpart.
const NUMERIC_RANKS: [(&str, u8); 11] = [
    ("bool", 0),
    ("char", 1),
    ("short", 2),
    ("int", 3),
    ("unsigned", 3),
    ("unsigned int", 3),
    ("long", 4),
    ("unsigned long", 4),
    ("long long", 5),
    ("float", 6),
    ("double", 7),
];

impl Type {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            qualifiers: Qualifiers::default(),
            name: name.into(),
            modifiers: Vec::new(),
            kind: TypeKind::Object { record: None },
        }
    }

    pub fn unknown() -> Self {
        Self {
            qualifiers: Qualifiers::default(),
            name: String::new(),
            modifiers: Vec::new(),
            kind: TypeKind::Unknown,
        }
    }

    pub fn incomplete() -> Self {
        Self {
            qualifiers: Qualifiers::default(),
            name: "void".to_string(),
            modifiers: Vec::new(),
            kind: TypeKind::Incomplete,
        }
    }

    /// Parse a source text fragment into a type.
    ///
    /// Qualifiers are collected, the base identifier extracted, and postfix
    /// `*`, `&`, `[N]` wrappers stacked in source order. A `(*name)(args)`
    /// shape is recognized structurally as a function pointer.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim().trim_end_matches(';').trim();
        if trimmed.is_empty() {
            return Self::unknown();
        }

        if let Some(ty) = Self::parse_function_pointer(trimmed) {
            return ty;
        }

        let mut qualifiers = Qualifiers::default();
        let mut rest = trimmed;
        loop {
            let mut stripped = false;
            for q in QUALIFIER_TOKENS {
                if let Some(tail) = rest.strip_prefix(q) {
                    if tail.starts_with(char::is_whitespace) {
                        match q {
                            "const" => qualifiers.is_const = true,
                            "volatile" => qualifiers.is_volatile = true,
                            "static" => qualifiers.is_static = true,
                            "extern" => qualifiers.is_extern = true,
                            _ => unreachable!(),
                        }
                        rest = tail.trim_start();
                        stripped = true;
                    }
                }
            }
            if !stripped {
                break;
            }
        }

        // Base identifier runs until the first wrapper character. Multi-word
        // builtins ("unsigned int", "long long") stay part of the base.
        let base_end = rest
            .find(|c| matches!(c, '*' | '&' | '['))
            .unwrap_or(rest.len());
        let (base, tail) = rest.split_at(base_end);
        let mut name = base.trim().to_string();

        // A trailing `const` binds to the base, not the wrappers
        if let Some(stripped) = name.strip_suffix(" const") {
            qualifiers.is_const = true;
            name = stripped.trim().to_string();
        }

        // Elaborated type keywords are not part of the name
        for keyword in ["struct ", "class ", "union ", "enum "] {
            if let Some(stripped) = name.strip_prefix(keyword) {
                name = stripped.trim().to_string();
                break;
            }
        }

        let mut modifiers = Vec::new();
        let mut chars = tail.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '*' => modifiers.push(TypeModifier::Pointer),
                '&' => modifiers.push(TypeModifier::Reference),
                '[' => {
                    let close = tail[i..].find(']').map(|off| i + off);
                    let size = close
                        .and_then(|end| tail[i + 1..end].trim().parse::<usize>().ok());
                    modifiers.push(TypeModifier::Array(size));
                    if let Some(end) = close {
                        while chars.peek().is_some_and(|&(j, _)| j <= end) {
                            chars.next();
                        }
                    }
                }
                _ if c.is_whitespace() => {}
                _ => {}
            }
        }

        if name.is_empty() {
            return Self::unknown();
        }

        let kind = if name == "void" && modifiers.is_empty() {
            TypeKind::Incomplete
        } else {
            TypeKind::Object { record: None }
        };

        Self {
            qualifiers,
            name,
            modifiers,
            kind,
        }
    }

    /// Recognize `ret (*name)(params)` by structural scan.
    fn parse_function_pointer(text: &str) -> Option<Self> {
        let open = text.find("(*")?;
        let close = text[open..].find(')')? + open;
        let args_open = text[close..].find('(')? + close;
        let args_close = text.rfind(')')?;
        if args_close <= args_open {
            return None;
        }

        let return_type = Type::parse(text[..open].trim());
        let params_text = &text[args_open + 1..args_close];
        let parameters: Vec<Type> = params_text
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != "void")
            .map(Type::parse)
            .collect();

        Some(Self {
            qualifiers: Qualifiers::default(),
            name: text[..open].trim().to_string(),
            modifiers: vec![TypeModifier::Pointer],
            kind: TypeKind::Function {
                parameters,
                return_type: Box::new(return_type),
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    pub fn modifiers(&self) -> &[TypeModifier] {
        &self.modifiers
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TypeKind::Unknown)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function { .. })
    }

    /// The record declaration this type resolved to, if any.
    pub fn record(&self) -> Option<NodeId> {
        match self.kind {
            TypeKind::Object { record } => record,
            _ => None,
        }
    }

    pub fn set_record(&mut self, id: NodeId) {
        if let TypeKind::Object { ref mut record } = self.kind {
            *record = Some(id);
        }
    }

    pub fn pointer_depth(&self) -> usize {
        self.modifiers
            .iter()
            .filter(|m| matches!(m, TypeModifier::Pointer))
            .count()
    }

    fn numeric_rank(&self) -> Option<u8> {
        if !self.modifiers.is_empty() {
            return None;
        }
        let name = self.name.strip_prefix("unsigned ").unwrap_or(&self.name);
        NUMERIC_RANKS
            .iter()
            .find(|(n, _)| *n == name || *n == self.name)
            .map(|&(_, r)| r)
    }

    /// Whether a value of type `self` may flow into a slot of type `to`.
    ///
    /// Permits exact matches, widening among numeric builtins, pointer to
    /// `void*`, and derived-to-base conversion once the type resolver has
    /// populated super class edges.
    pub fn is_compatible(&self, to: &Type, graph: &PropertyGraph) -> bool {
        // References are transparent for compatibility
        let strip = |t: &Type| {
            let mut t = t.clone();
            t.modifiers.retain(|m| !matches!(m, TypeModifier::Reference));
            t
        };
        let from = strip(self);
        let to = strip(to);

        if from == to || from.is_unknown() || to.is_unknown() {
            return true;
        }

        if let (Some(a), Some(b)) = (from.numeric_rank(), to.numeric_rank()) {
            return a <= b;
        }

        // Any pointer converts to void*
        if to.name == "void" && to.pointer_depth() == 1 && from.pointer_depth() >= 1 {
            return true;
        }

        // Derived-to-base, with matching wrapper stacks
        if from.modifiers == to.modifiers {
            if let (Some(sub), Some(sup)) = (from.record(), to.record()) {
                return is_subclass_of(graph, sub, sup);
            }
        }

        false
    }

    /// Rewrite the resolved record links after a graph merge remapped node
    /// ids. Function signatures are walked recursively.
    pub(crate) fn remap_records(
        &mut self,
        map: &std::collections::HashMap<NodeId, NodeId>,
    ) {
        match &mut self.kind {
            TypeKind::Object { record: Some(old) } => {
                if let Some(&new) = map.get(old) {
                    *old = new;
                }
            }
            TypeKind::Function {
                parameters,
                return_type,
            } => {
                for p in parameters {
                    p.remap_records(map);
                }
                return_type.remap_records(map);
            }
            _ => {}
        }
    }

    /// Re-resolve the base name against typedef and record declarations now
    /// known in the graph. Returns true when anything changed.
    pub fn refresh(&mut self, graph: &PropertyGraph) -> bool {
        let mut changed = false;

        // Alias substitution
        if let Some(target) = lookup_typedef(graph, &self.name) {
            let mut resolved = target.clone();
            resolved.qualifiers.is_const |= self.qualifiers.is_const;
            resolved.qualifiers.is_volatile |= self.qualifiers.is_volatile;
            resolved.qualifiers.is_static |= self.qualifiers.is_static;
            resolved.qualifiers.is_extern |= self.qualifiers.is_extern;
            resolved.modifiers = [resolved.modifiers, self.modifiers.clone()].concat();
            *self = resolved;
            changed = true;
        }

        // Record linking
        if self.record().is_none() {
            if let Some(record) = lookup_record(graph, &self.name) {
                self.set_record(record);
                changed = true;
            }
        }

        changed
    }
}

/// Structural equality: canonicalized qualifier set, base name, and wrapper
/// stack. The resolved record link is deliberately ignored.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if self.qualifiers != other.qualifiers
            || self.name != other.name
            || self.modifiers != other.modifiers
        {
            return false;
        }
        match (&self.kind, &other.kind) {
            (
                TypeKind::Function {
                    parameters: p1,
                    return_type: r1,
                },
                TypeKind::Function {
                    parameters: p2,
                    return_type: r2,
                },
            ) => p1 == p2 && r1 == r2,
            (TypeKind::Function { .. }, _) | (_, TypeKind::Function { .. }) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifiers.is_const {
            write!(f, "const ")?;
        }
        if self.qualifiers.is_volatile {
            write!(f, "volatile ")?;
        }
        write!(f, "{}", self.name)?;
        for m in &self.modifiers {
            match m {
                TypeModifier::Pointer => write!(f, "*")?,
                TypeModifier::Reference => write!(f, "&")?,
                TypeModifier::Array(Some(n)) => write!(f, "[{}]", n)?,
                TypeModifier::Array(None) => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

fn lookup_typedef(graph: &PropertyGraph, name: &str) -> Option<Type> {
    graph
        .nodes()
        .find(|(_, n)| n.kind() == NodeKind::Typedef && n.name() == name)
        .and_then(|(_, n)| n.ty().cloned())
}

fn lookup_record(graph: &PropertyGraph, name: &str) -> Option<NodeId> {
    graph
        .nodes()
        .find(|(_, n)| {
            n.kind() == NodeKind::Record
                && (n.name() == name || n.qualified_name() == Some(name))
        })
        .map(|(id, _)| id)
}

/// Walk `SuperClass` edges upward from `sub` looking for `sup`.
pub fn is_subclass_of(graph: &PropertyGraph, sub: NodeId, sup: NodeId) -> bool {
    let mut stack = vec![sub];
    let mut seen = std::collections::HashSet::new();
    while let Some(current) = stack.pop() {
        if current == sup {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        for (target, edge) in graph.edges_from(current) {
            if edge.kind() == EdgeKind::SuperClass {
                stack.push(target);
            }
        }
    }
    false
}
