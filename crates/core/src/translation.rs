//! Orchestrates frontends over a set of input files and runs the pass
//! pipeline over the merged result.

use crate::frontend::{FrontendRegistry, TranslationError};
use crate::graph::{NodeId, PropertyGraph};
use crate::passes::{self, Pass};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to translate and how strictly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Absolute paths of the files to parse
    pub source_files: Vec<PathBuf>,
    /// Root directory used as an include search root
    pub top_level: Option<PathBuf>,
    /// Strict mode: any file failure aborts the build instead of being
    /// skipped
    pub fail_fast: bool,
}

impl TranslationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_files(mut self, files: Vec<PathBuf>) -> Self {
        self.source_files = files;
        self
    }

    pub fn top_level(mut self, root: PathBuf) -> Self {
        self.top_level = Some(root);
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// The outcome of a build: one merged graph, the translation unit roots,
/// and the files that were skipped.
pub struct TranslationResult {
    pub graph: PropertyGraph,
    pub units: Vec<NodeId>,
    /// Files whose frontend failed, with the reported reason
    pub failures: Vec<(PathBuf, String)>,
}

impl TranslationResult {
    pub fn first_unit(&self) -> Option<NodeId> {
        self.units.first().copied()
    }
}

/// Drives the build: selects a frontend per file, parses files in
/// parallel into private graphs, merges them, then runs the passes.
pub struct TranslationManager {
    config: TranslationConfig,
    registry: FrontendRegistry,
    passes: Vec<Box<dyn Pass>>,
}

impl TranslationManager {
    pub fn new(config: TranslationConfig) -> Self {
        let include_paths = config.top_level.iter().cloned().collect();
        Self {
            config,
            registry: FrontendRegistry::new(include_paths),
            passes: passes::default_passes(),
        }
    }

    /// Swap in custom frontends (e.g. a new language integration).
    pub fn with_registry(mut self, registry: FrontendRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override the pass list.
    pub fn with_passes(mut self, passes: Vec<Box<dyn Pass>>) -> Self {
        self.passes = passes;
        self
    }

    /// Run the build to completion.
    ///
    /// Files that fail to parse are recorded and skipped; the build only
    /// errors when no unit was produced at all, when strict mode is on,
    /// or on a scope imbalance (an implementation bug, never tolerated).
    pub fn analyze(&self) -> Result<TranslationResult, TranslationError> {
        // ── Phase 1: parallel parse, one private graph per file ──────────
        let per_file: Vec<(PathBuf, Result<(PropertyGraph, NodeId), TranslationError>)> = self
            .config
            .source_files
            .par_iter()
            .map(|file| {
                let mut local = PropertyGraph::new();
                let outcome = match self.registry.find(file) {
                    Some(frontend) => {
                        tracing::debug!(file = %file.display(), "parsing");
                        frontend.parse_file(file, &mut local).map(|tu| (local, tu))
                    }
                    None => Err(TranslationError::UnsupportedLanguage(
                        file.extension()
                            .and_then(|e| e.to_str())
                            .unwrap_or("unknown")
                            .to_string(),
                    )),
                };
                (file.clone(), outcome)
            })
            .collect();

        // ── Phase 2: sequential merge with id remapping ──────────────────
        let mut graph = PropertyGraph::new();
        let mut units = Vec::new();
        let mut failures = Vec::new();

        for (file, outcome) in per_file {
            match outcome {
                Ok((local, tu)) => {
                    let id_map = graph.merge(local);
                    units.push(id_map[&tu]);
                }
                Err(e) if e.is_recoverable() && !self.config.fail_fast => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping file");
                    failures.push((file, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if units.is_empty() {
            return Err(TranslationError::ParseFailed(
                "no translation units produced".to_string(),
            ));
        }

        // ── Phase 3: pass pipeline over the merged graph ─────────────────
        passes::run_pipeline(&mut graph, &units, &self.passes);

        Ok(TranslationResult {
            graph,
            units,
            failures,
        })
    }
}
