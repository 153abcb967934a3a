use crate::core::io::artifacts::ArtifactKind;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The MSA library: a directory searched by component identity for
/// pre-existing alignment/template artifacts.
///
/// Lookups never invalidate or delete entries; a malformed file is reported as
/// a miss and left in place. New artifacts enter the namespace through
/// [`publish`](Self::publish), which stages to a temporary file and renames it
/// into place so a concurrent reader never observes a partial entry.
#[derive(Debug, Clone)]
pub struct MsaLibrary {
    root: PathBuf,
}

impl MsaLibrary {
    /// Opens a library rooted at `root`. The directory is created lazily on
    /// first publish; a missing directory simply yields misses.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Looks up the artifact of `kind` for a component, returning its path on
    /// a structurally valid hit.
    pub fn resolve(&self, description: &str, kind: ArtifactKind) -> Option<PathBuf> {
        let path = self.root.join(kind.file_name(description));
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                debug!(component = description, ?kind, "Cache miss: no artifact on disk.");
                return None;
            }
        };

        if !kind.is_well_formed(&content) {
            warn!(
                component = description,
                ?kind,
                path = %path.display(),
                "Cached artifact is malformed; treating as a miss."
            );
            return None;
        }

        debug!(component = description, ?kind, "Cache hit.");
        Some(path)
    }

    /// Atomically publishes a freshly computed artifact into the namespace.
    pub fn publish(
        &self,
        description: &str,
        kind: ArtifactKind,
        content: &str,
    ) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.root)?;

        let final_path = self.root.join(kind.file_name(description));
        let staging_path = self.root.join(format!(
            ".{}.{}.tmp",
            kind.file_name(description),
            std::process::id()
        ));

        fs::write(&staging_path, content)?;
        fs::rename(&staging_path, &final_path)?;
        Ok(final_path)
    }
}
