//! Language frontends: adapters that turn source text into the initial
//! property graph subtree for one translation unit.

pub mod cpp;
pub mod go;
pub mod python;

use crate::graph::{NodeId, PhysicalLocation, PropertyGraph, Region};
use crate::scope::ScopeError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for the translation stage
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse file: {0}")]
    ParseFailed(String),

    #[error("no frontend registered for extension: {0}")]
    UnsupportedLanguage(String),

    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    /// Scope imbalance is an implementation bug, not an input problem;
    /// the translation manager aborts the build on it.
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl TranslationError {
    /// Whether this error may be tolerated by skipping the file.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TranslationError::Scope(_))
    }
}

/// Trait for language-specific frontends.
///
/// A frontend parses one file into a [`NodeKind::TranslationUnit`] subtree:
/// nodes connected by syntax edges, scopes populated, type strings parsed.
///
/// [`NodeKind::TranslationUnit`]: crate::graph::NodeKind::TranslationUnit
pub trait LanguageFrontend: Send + Sync {
    fn language_name(&self) -> &str;

    /// Extensions this frontend handles, with leading dot (e.g. [".go"])
    fn file_extensions(&self) -> &[&str];

    /// The delimiter separating namespace parts in qualified names
    fn namespace_delimiter(&self) -> &str;

    /// Parse a file into a translation unit rooted in `graph`.
    fn parse_file(
        &self,
        file_path: &Path,
        graph: &mut PropertyGraph,
    ) -> Result<NodeId, TranslationError> {
        let source = std::fs::read_to_string(file_path)?;
        self.parse_source(&source, file_path, graph)
    }

    /// Parse source text directly; the testing entry point.
    fn parse_source(
        &self,
        source: &str,
        file_path: &Path,
        graph: &mut PropertyGraph,
    ) -> Result<NodeId, TranslationError>;

    /// The source text a raw parser node covers.
    fn code_of(&self, raw: &tree_sitter::Node, source: &str) -> Option<String> {
        raw.utf8_text(source.as_bytes()).ok().map(str::to_string)
    }

    /// Physical location of a raw parser node, 1-based inclusive.
    fn location_of(&self, raw: &tree_sitter::Node, file_path: &Path) -> Option<PhysicalLocation> {
        Some(raw_location(raw, file_path))
    }

    /// Attach the comment preceding `raw` to the produced node.
    fn attach_comment(
        &self,
        graph: &mut PropertyGraph,
        node: NodeId,
        raw: &tree_sitter::Node,
        source: &str,
    ) {
        attach_comment(graph, node, raw, source);
    }
}

/// Convert a tree-sitter range (0-based, exclusive end column) into the
/// 1-based inclusive region downstream consumers expect.
pub(crate) fn raw_location(raw: &tree_sitter::Node, file_path: &Path) -> PhysicalLocation {
    let start = raw.start_position();
    let end = raw.end_position();
    PhysicalLocation::new(
        file_path.to_path_buf(),
        Region::new(
            start.row + 1,
            start.column + 1,
            end.row + 1,
            end.column.max(1),
        ),
    )
}

/// Attach the comment immediately preceding `raw` to the node, if one sits
/// on the line above or on the same line.
pub(crate) fn attach_comment(
    graph: &mut PropertyGraph,
    node: NodeId,
    raw: &tree_sitter::Node,
    source: &str,
) {
    let Some(prev) = raw.prev_sibling() else {
        return;
    };
    if prev.kind() != "comment" {
        return;
    }
    if prev.end_position().row + 1 < raw.start_position().row {
        return;
    }
    if let Ok(text) = prev.utf8_text(source.as_bytes()) {
        if let Some(n) = graph.node_mut(node) {
            n.set_comment(text.trim().to_string());
        }
    }
}

/// Routes files to the frontend registered for their extension.
pub struct FrontendRegistry {
    frontends: Vec<Box<dyn LanguageFrontend>>,
}

impl FrontendRegistry {
    /// Registry with the default frontends.
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        Self {
            frontends: vec![
                Box::new(cpp::CppFrontend::new(include_paths)),
                Box::new(go::GoFrontend::new()),
                Box::new(python::PythonFrontend::new()),
            ],
        }
    }

    /// Registry with custom frontends, for language integrations.
    pub fn with_frontends(frontends: Vec<Box<dyn LanguageFrontend>>) -> Self {
        Self { frontends }
    }

    /// Find the frontend for a file path based on its extension.
    pub fn find(&self, file_path: &Path) -> Option<&dyn LanguageFrontend> {
        let extension = file_path.extension()?.to_str()?;
        let with_dot = format!(".{}", extension);
        self.frontends
            .iter()
            .find(|f| f.file_extensions().contains(&with_dot.as_str()))
            .map(|boxed| &**boxed)
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.frontends
            .iter()
            .flat_map(|f| f.file_extensions().iter().copied())
            .collect()
    }
}

impl Default for FrontendRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
