//! Package source providers: registry, git, and local path.
//!
//! Each provider answers one narrow question, `lookup`: which (version,
//! manifest) candidates can satisfy a dependency requirement? Registry
//! requirements yield every published version matching the declared range;
//! git and path requirements always yield exactly one candidate. No
//! resolution logic lives here.

pub mod cache;
pub mod download;
pub mod git;
pub mod path;
pub mod registry;

use std::path::Path;

use semver::Version;

use brix_core::dependency::{Dependency, DependencySource};
use brix_core::manifest::Manifest;
use brix_util::errors::BrixError;

use crate::cache::SourceCache;
use crate::git::GitSource;
use crate::path::PathSource;
use crate::registry::RegistrySource;

/// One (version, manifest) pair a provider can supply for a requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub version: Version,
    pub manifest: Manifest,
}

/// The single capability a package source exposes to the resolution engine.
#[allow(async_fn_in_trait)]
pub trait PackageSource {
    /// All candidates able to satisfy `dependency`, in no particular order.
    async fn lookup(&self, dependency: &Dependency) -> miette::Result<Vec<Candidate>>;
}

/// The full provider set for one project, dispatching by source descriptor.
pub struct SourceSet {
    registry: RegistrySource,
    git: GitSource,
    path: PathSource,
}

impl SourceSet {
    /// Build the provider set rooted at a project directory.
    pub fn new(project_root: &Path, offline: bool) -> miette::Result<Self> {
        let cache = SourceCache::new(project_root);
        Ok(Self {
            registry: RegistrySource::with_default_registry(cache.clone(), offline)?,
            git: GitSource::new(cache),
            path: PathSource,
        })
    }

    /// Materialize a resolved package's full contents on disk and reload its
    /// manifest from there, so downstream component loads see real paths.
    pub async fn materialize(
        &self,
        name: &str,
        version: &Version,
        source: &DependencySource,
    ) -> miette::Result<Manifest> {
        match source {
            DependencySource::Registry { .. } => {
                let dir = self.registry.fetch_package(name, version).await?;
                Manifest::from_dir(&dir)
            }
            DependencySource::Git { url, reference } => {
                let dir = self.git.checkout(url, reference)?;
                Manifest::from_dir(&dir)
            }
            DependencySource::Path { path } => Manifest::from_dir(path),
        }
    }
}

impl PackageSource for SourceSet {
    async fn lookup(&self, dependency: &Dependency) -> miette::Result<Vec<Candidate>> {
        match &dependency.source {
            DependencySource::Registry { range } => {
                self.registry.lookup(&dependency.name, range).await
            }
            DependencySource::Git { url, reference } => {
                self.git.lookup(&dependency.name, url, reference)
            }
            DependencySource::Path { path } => self.path.lookup(&dependency.name, path),
        }
    }
}

pub(crate) fn source_error(message: impl Into<String>) -> BrixError {
    BrixError::Source {
        message: message.into(),
    }
}
