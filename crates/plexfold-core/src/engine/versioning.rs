use super::error::EngineError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Prefix of the versioned subfolders holding prior run output.
const VERSION_PREFIX: &str = "result_";

/// Makes re-execution into `output_dir` safe.
///
/// If the directory already holds a prior run's output, every pre-existing
/// top-level entry (including older version folders) is moved into a fresh
/// `result_<n>` subfolder, where `n` is one past the highest index present.
/// Returns the new index, or `None` when the directory was empty or absent.
///
/// A move failure aborts the whole run: a partially relocated tree must not
/// receive new output on top of old.
pub fn version_existing_output(output_dir: &Path) -> Result<Option<u32>, EngineError> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir).map_err(|source| EngineError::Versioning {
            path: output_dir.to_path_buf(),
            source,
        })?;
        return Ok(None);
    }

    let entries: Vec<_> = fs::read_dir(output_dir)
        .map_err(|source| EngineError::Versioning {
            path: output_dir.to_path_buf(),
            source,
        })?
        .collect::<Result<_, _>>()
        .map_err(|source| EngineError::Versioning {
            path: output_dir.to_path_buf(),
            source,
        })?;

    if entries.is_empty() {
        return Ok(None);
    }

    let next_index = entries
        .iter()
        .filter_map(|entry| parse_version_index(&entry.file_name().to_string_lossy()))
        .max()
        .map_or(1, |max| max + 1);

    let target = output_dir.join(format!("{VERSION_PREFIX}{next_index}"));
    if target.exists() {
        return Err(EngineError::Versioning {
            path: target,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "versioned subfolder already exists",
            ),
        });
    }
    fs::create_dir(&target).map_err(|source| EngineError::Versioning {
        path: target.clone(),
        source,
    })?;

    for entry in &entries {
        let destination = target.join(entry.file_name());
        fs::rename(entry.path(), &destination).map_err(|source| EngineError::Versioning {
            path: entry.path(),
            source,
        })?;
    }

    info!(
        run_index = next_index,
        moved = entries.len(),
        output_dir = %output_dir.display(),
        "Relocated prior run output."
    );
    Ok(Some(next_index))
}

fn parse_version_index(name: &str) -> Option<u32> {
    name.strip_prefix(VERSION_PREFIX)?.parse().ok()
}
