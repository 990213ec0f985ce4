//! Edge types for the property graph

use serde::{Deserialize, Serialize};

/// An edge in the property graph.
///
/// Edges that order children (statement sequences, parameter and argument
/// lists) carry an index; EOG branch edges carry the branch outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// The relationship this edge represents
    kind: EdgeKind,

    /// Optional secondary properties
    properties: Option<EdgeProperties>,
}

impl Edge {
    pub fn new(kind: EdgeKind) -> Self {
        Self {
            kind,
            properties: None,
        }
    }

    pub fn ordered(kind: EdgeKind, index: usize) -> Self {
        Self {
            kind,
            properties: Some(EdgeProperties::Order { index }),
        }
    }

    pub fn branch(value: bool) -> Self {
        Self {
            kind: EdgeKind::Eog,
            properties: Some(EdgeProperties::Branch { value }),
        }
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn properties(&self) -> Option<&EdgeProperties> {
        self.properties.as_ref()
    }

    /// Child ordering index, if this edge carries one.
    pub fn index(&self) -> Option<usize> {
        match self.properties {
            Some(EdgeProperties::Order { index }) => Some(index),
            _ => None,
        }
    }

    /// Branch outcome, for EOG edges leaving a branching node.
    pub fn branch_value(&self) -> Option<bool> {
        match self.properties {
            Some(EdgeProperties::Branch { value }) => Some(value),
            _ => None,
        }
    }
}

/// The relationship an edge represents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    // ── AST structure ────────────────────────────────────────────────────
    /// Generic ordered child: unit → declarations, block → statements,
    /// record → members, initializer list → entries
    Ast,
    /// Function → parameter declarations (ordered)
    Parameters,
    /// Function or loop → body, try → guarded block, catch → handler block
    Body,
    /// Variable or field → initializer expression
    Initializer,
    /// Branching statement or conditional expression → condition
    Condition,
    /// If/conditional → true branch
    Then,
    /// If/conditional → false branch
    Else,
    /// For → init statement
    LoopInit,
    /// For → update expression
    LoopUpdate,
    /// ForEach → iteration variable declaration
    IterVariable,
    /// ForEach → iterated expression
    Iterable,
    /// Call/construct/new → arguments (ordered)
    Arguments,
    /// Member call → base expression chain
    Callee,
    /// Member expression → base expression
    Base,
    /// Binary operator → left operand
    Lhs,
    /// Binary operator → right operand
    Rhs,
    /// Unary operator / cast / subscript → operand
    Operand,
    /// Subscript → index expression
    Index,
    /// Return → returned expression
    ReturnValue,
    // ── Analysis results ─────────────────────────────────────────────────
    /// Reference → the declarations it resolved to
    RefersTo,
    /// Call → candidate callee declarations
    Invokes,
    /// Evaluation-order successor
    Eog,
    /// Data flow from a write (or written value) to a read
    Dfg,
    /// Record → resolved super class record
    SuperClass,
    /// Declaration → its home namespace
    InNamespace,
    /// Function-level call graph (transitive closure pass)
    Calls,
}

impl EdgeKind {
    /// True for edges that make up the syntax tree itself. Reachability
    /// from a translation unit is defined over these.
    pub fn is_ast(self) -> bool {
        !matches!(
            self,
            EdgeKind::RefersTo
                | EdgeKind::Invokes
                | EdgeKind::Eog
                | EdgeKind::Dfg
                | EdgeKind::SuperClass
                | EdgeKind::InNamespace
                | EdgeKind::Calls
        )
    }
}

/// Secondary properties carried by some edges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeProperties {
    /// Position among same-kind siblings (argument index, statement order)
    Order { index: usize },
    /// Outcome of the branch this EOG edge follows
    Branch { value: bool },
}
