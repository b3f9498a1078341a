//! Project-local source cache layout.

use std::path::{Path, PathBuf};

use brix_util::errors::BrixError;
use brix_util::hash::sha256_bytes;

/// Project-local cache at `<project>/.brix/cache/`.
///
/// Registry listings, per-version manifests, downloaded archives, unpacked
/// package sources, and git checkouts all live underneath this root.
#[derive(Debug, Clone)]
pub struct SourceCache {
    root: PathBuf,
}

impl SourceCache {
    /// Create a cache rooted at `project_root/.brix/cache/`.
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.join(".brix").join("cache"),
        }
    }

    /// The root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the cached registry version listing for a package.
    pub fn listing_path(&self, name: &str) -> PathBuf {
        self.root.join("registry").join("listings").join(format!("{name}.json"))
    }

    /// Path to a cached registry manifest for one package version.
    pub fn manifest_path(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join("registry")
            .join("manifests")
            .join(format!("{name}-{version}.toml"))
    }

    /// Path to a cached package archive.
    pub fn archive_path(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join("registry")
            .join("archives")
            .join(format!("{name}-{version}.zip"))
    }

    /// Directory a package archive is unpacked into.
    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join("registry")
            .join("src")
            .join(format!("{name}-{version}"))
    }

    /// Checkout directory for a git source.
    ///
    /// The directory name keeps the repository's final path segment for
    /// readability, disambiguated by a hash of the full URL.
    pub fn git_dir(&self, url: &str) -> PathBuf {
        let stem = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("repo")
            .trim_end_matches(".git");
        let digest = sha256_bytes(url.as_bytes());
        self.root.join("git").join(format!("{stem}-{}", &digest[..8]))
    }

    /// Read a cached file if present.
    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        std::fs::read(path).ok()
    }

    /// Store a file in the cache, creating parent directories as needed.
    pub fn write(&self, path: &Path, data: &[u8]) -> miette::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(BrixError::Io)?;
        }
        std::fs::write(path, data).map_err(BrixError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let cache = SourceCache::new(Path::new("/proj"));
        assert_eq!(
            cache.listing_path("dictionary"),
            Path::new("/proj/.brix/cache/registry/listings/dictionary.json")
        );
        assert_eq!(
            cache.manifest_path("dictionary", "1.4.1"),
            Path::new("/proj/.brix/cache/registry/manifests/dictionary-1.4.1.toml")
        );
        assert_eq!(
            cache.package_dir("dictionary", "1.4.1"),
            Path::new("/proj/.brix/cache/registry/src/dictionary-1.4.1")
        );
    }

    #[test]
    fn git_dir_keeps_repo_stem() {
        let cache = SourceCache::new(Path::new("/proj"));
        let dir = cache.git_dir("https://example.com/tools/web.git");
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("web-"));

        // Different URLs with the same stem stay distinct.
        let other = cache.git_dir("https://example.com/forks/web.git");
        assert_ne!(dir, other);
    }

    #[test]
    fn write_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SourceCache::new(dir.path());
        let path = cache.listing_path("pkg");
        cache.write(&path, b"{}").unwrap();
        assert_eq!(cache.read(&path).unwrap(), b"{}");
        assert!(cache.read(&cache.listing_path("missing")).is_none());
    }
}
