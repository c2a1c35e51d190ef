//! Writes the bundle and metadata into an output directory

use super::{ModelBundle, ModelMetadata, BUNDLE_FILE_NAME, METADATA_FILE_NAME};
use crate::error::{AdvisorError, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations of the written artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub bundle: PathBuf,
    pub metadata: PathBuf,
}

/// Persists a trained bundle. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            bundle: self.output_dir.join(BUNDLE_FILE_NAME),
            metadata: self.output_dir.join(METADATA_FILE_NAME),
        }
    }

    /// Serialize both artifacts in memory, then create the directory and
    /// write them. Any failure is a `SerializationError`.
    pub fn write(&self, bundle: &ModelBundle, trained_at: DateTime<Local>) -> Result<ArtifactPaths> {
        let bundle_bytes = bundle.to_bytes()?;
        let metadata = ModelMetadata::from_bundle(bundle, trained_at);
        let metadata_json = metadata.to_json()?;

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            AdvisorError::SerializationError(format!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let paths = self.paths();
        write_file(&paths.bundle, &bundle_bytes)?;
        write_file(&paths.metadata, metadata_json.as_bytes())?;

        info!(
            bundle = %paths.bundle.display(),
            metadata = %paths.metadata.display(),
            bytes = bundle_bytes.len(),
            "Artifacts written"
        );

        Ok(paths)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| {
        AdvisorError::SerializationError(format!("Failed to write {}: {}", path.display(), e))
    })
}
