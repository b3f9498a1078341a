//! High-level operations wiring CLI commands to the resolver, sources, and
//! build subsystems.

pub mod ops_build;
pub mod ops_resolve;
pub mod ops_tree;
pub mod package;

use std::path::{Path, PathBuf};

use brix_core::MANIFEST_FILENAME;
use brix_util::errors::BrixError;
use brix_util::fs::find_ancestor_with;

/// Locate the project root by walking up from `start` to the nearest
/// directory containing a manifest file.
pub fn locate_project(start: &Path) -> miette::Result<PathBuf> {
    match find_ancestor_with(start, MANIFEST_FILENAME) {
        Some(dir) => Ok(dir),
        None => Err(BrixError::Manifest {
            message: format!(
                "No {MANIFEST_FILENAME} found in {} or any parent directory",
                start.display()
            ),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_from_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), "[project]\nname = \"x\"\n").unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = locate_project(&nested).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn fails_outside_any_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_project(dir.path()).is_err());
    }
}
