//! Local path package source.

use std::path::Path;

use brix_core::manifest::Manifest;
use brix_core::MANIFEST_FILENAME;

use crate::{source_error, Candidate};

/// Package source for dependencies living in a local directory.
pub struct PathSource;

impl PathSource {
    /// A path requirement always yields exactly one candidate: whatever
    /// manifest the directory holds right now.
    pub fn lookup(&self, name: &str, path: &Path) -> miette::Result<Vec<Candidate>> {
        if !path.join(MANIFEST_FILENAME).is_file() {
            return Err(source_error(format!(
                "Path dependency \"{name}\" has no {MANIFEST_FILENAME} at {}",
                path.display()
            ))
            .into());
        }
        let manifest = Manifest::from_dir(path)?;
        Ok(vec![Candidate {
            version: manifest.version.clone(),
            manifest,
        }])
    }
}
