use thiserror::Error;

use crate::core::io::artifacts::ArtifactKind;
use crate::core::io::fasta::FastaError;
use crate::core::io::summary::SummaryError;
use crate::core::models::job::{Composition, JobError};
use crate::core::models::seed::SeedError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input error: {source}")]
    Input {
        #[from]
        source: JobError,
    },

    #[error("Seed set error: {source}")]
    Seeds {
        #[from]
        source: SeedError,
    },

    #[error("Failed to read input records: {source}")]
    Fasta {
        #[from]
        source: FastaError,
    },

    #[error("No {expected} models available for a {composition:?} job")]
    NoSuitableModels {
        composition: Composition,
        expected: &'static str,
    },

    #[error("Search for component '{component}' ({kind:?}) failed: {message}")]
    Search {
        component: String,
        kind: ArtifactKind,
        message: String,
    },

    #[error("Failed to publish artifact for component '{component}' ({kind:?}): {source}")]
    CachePublish {
        component: String,
        kind: ArtifactKind,
        #[source]
        source: std::io::Error,
    },

    #[error("No candidates produced: all {cells} grid cells failed")]
    NoCandidates { cells: usize },

    #[error("Output versioning failed for '{}': {source}", path.display())]
    Versioning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write run summary: {source}")]
    Summary {
        #[from]
        source: SummaryError,
    },

    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
