//! Code property graph construction.
//!
//! This crate turns source files into one unified in-memory graph
//! capturing syntax, types, declarations, scopes, name resolution,
//! control flow, and data flow:
//! - Tree-sitter frontends per language (C/C++, Go, Python) produce one
//!   translation-unit subtree per file
//! - The translation manager parses files in parallel and merges the
//!   per-file graphs
//! - An ordered pass pipeline enriches the merged graph: type and usage
//!   resolution, call resolution, evaluation-order and data-flow edges

pub mod discovery;
pub mod frontend;
pub mod graph;
pub mod passes;
pub mod scope;
pub mod translation;
pub mod types;

pub use discovery::discover_source_files;
pub use frontend::{FrontendRegistry, LanguageFrontend, TranslationError};
pub use graph::{
    Edge, EdgeKind, GraphQuery, LiteralValue, Node, NodeData, NodeId, NodeKind, PhysicalLocation,
    PropertyGraph, QueryError, Region,
};
pub use passes::{default_passes, run_pipeline, Pass, PassError};
pub use scope::{Scope, ScopeError, ScopeId, ScopeKind, ScopeManager};
pub use translation::{TranslationConfig, TranslationManager, TranslationResult};
pub use types::{Type, TypeKind, TypeModifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
