//! Artifact bookkeeping between generations.
//!
//! Each generation's images are written to a population directory. When a
//! generation ends its best image is archived and the rest are purged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::BoxError;

/// Keeps winning artifacts and discards the rest.
pub trait ArtifactStore {
    /// Move `artifact` into long-term storage.
    ///
    /// # Errors
    ///
    /// Implementations report failures moving the artifact.
    fn archive(&mut self, artifact: &Path) -> Result<(), BoxError>;

    /// Delete the remaining artifacts of `generation`.
    ///
    /// # Errors
    ///
    /// Implementations report failures deleting artifacts.
    fn purge_generation(&mut self, generation: u32) -> Result<(), BoxError>;
}

/// Filesystem store: archives by moving into `archive_dir`, purges
/// `<generation>_*` files from `population_dir`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    population_dir: PathBuf,
    archive_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(population_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            population_dir: population_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn population_dir(&self) -> &Path {
        &self.population_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }
}

impl ArtifactStore for FsArtifactStore {
    fn archive(&mut self, artifact: &Path) -> Result<(), BoxError> {
        let name = artifact.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact path has no file name: {}", artifact.display()),
            )
        })?;
        fs::create_dir_all(&self.archive_dir)?;
        let destination = self.archive_dir.join(name);
        if fs::rename(artifact, &destination).is_err() {
            // rename fails across filesystems
            fs::copy(artifact, &destination)?;
            fs::remove_file(artifact)?;
        }
        Ok(())
    }

    fn purge_generation(&mut self, generation: u32) -> Result<(), BoxError> {
        let entries = match fs::read_dir(&self.population_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let prefix = format!("{generation}_");
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
