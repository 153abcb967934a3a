use crate::core::io::artifacts::ArtifactKind;
use crate::core::models::component::Component;
use crate::core::models::seed::Seed;
use crate::core::models::structure::Structure;
use std::path::PathBuf;
use thiserror::Error;

/// Opaque failure reported by the external folding model.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ModelError {
    pub message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(source: std::io::Error) -> Self {
        Self::new(source.to_string())
    }
}

/// Opaque failure reported by an external search tool.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SearchError {
    pub message: String,
}

impl SearchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SearchError {
    fn from(source: std::io::Error) -> Self {
        Self::new(source.to_string())
    }
}

/// One resolved alignment/template artifact feeding the feature set.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub component: String,
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub from_cache: bool,
    pub alignment_depth: Option<usize>,
}

/// Everything the folding model needs for one job, independent of seed and
/// recycled input. Built once per job and shared across all grid cells.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub assembly_sequence: String,
    pub chain_lengths: Vec<usize>,
    pub alignments: Vec<ResolvedArtifact>,
    pub retained_templates: usize,
}

/// Seam to the external black-box folding model.
///
/// One call covers one recycle iteration; from the second iteration onward the
/// previous iteration's structure estimate is handed back as recycling input.
pub trait FoldingModel: Sync {
    /// Stable model identifier, e.g. `model_1` or `model_1_ptm`.
    fn id(&self) -> &str;

    /// Whether this model emits a pTM estimate (complex-capable).
    fn supports_ptm(&self) -> bool;

    fn predict(
        &self,
        features: &FeatureSet,
        recycled: Option<&Structure>,
        seed: Seed,
    ) -> Result<Structure, ModelError>;
}

/// Seam to the external genetic-search tools, invoked only on a cache miss.
pub trait AlignmentSearch: Sync {
    /// Runs the search for one component and artifact kind, returning the raw
    /// artifact text. `hit_cap` bounds how many hits the tool should consider.
    fn search(
        &self,
        component: &Component,
        kind: ArtifactKind,
        hit_cap: usize,
    ) -> Result<String, SearchError>;
}
