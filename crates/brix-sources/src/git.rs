//! Git package source: checkouts driven through the `git` binary.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use brix_core::dependency::GitReference;
use brix_core::manifest::Manifest;
use brix_util::fs::ensure_dir;
use brix_util::process::CommandBuilder;
use brix_util::progress::status_warn;

use crate::cache::SourceCache;
use crate::{source_error, Candidate};

/// Package source backed by git repositories.
///
/// Each URL gets one cached checkout; within a single invocation a
/// repository is synced from the remote at most once.
pub struct GitSource {
    cache: SourceCache,
    synced: Mutex<HashSet<String>>,
}

impl GitSource {
    pub fn new(cache: SourceCache) -> Self {
        Self {
            cache,
            synced: Mutex::new(HashSet::new()),
        }
    }

    /// A git requirement always yields exactly one candidate: the manifest
    /// at the requested branch/tag/revision (or the default branch).
    pub fn lookup(
        &self,
        name: &str,
        url: &str,
        reference: &GitReference,
    ) -> miette::Result<Vec<Candidate>> {
        let dir = self.checkout(url, reference)?;
        let manifest = Manifest::from_dir(&dir)?;
        if manifest.name != name {
            status_warn(
                "Warning",
                &format!(
                    "git dependency \"{name}\" resolves to a manifest named \"{}\" ({url})",
                    manifest.name
                ),
            );
        }
        Ok(vec![Candidate {
            version: manifest.version.clone(),
            manifest,
        }])
    }

    /// Clone or update the cached checkout for `url` and move it to the
    /// requested reference. Returns the checkout directory.
    pub fn checkout(&self, url: &str, reference: &GitReference) -> miette::Result<PathBuf> {
        let dir = self.cache.git_dir(url);
        let dir_str = dir.display().to_string();

        let already_synced = {
            let mut synced = self.synced.lock().expect("git sync set poisoned");
            !synced.insert(url.to_string())
        };

        if !already_synced {
            if dir.is_dir() {
                tracing::debug!(url, "fetching git source");
                git(["fetch", "--quiet", "--tags", "origin"], Some(&dir_str), url)?;
            } else {
                if let Some(parent) = dir.parent() {
                    ensure_dir(parent).map_err(brix_util::errors::BrixError::Io)?;
                }
                tracing::debug!(url, "cloning git source");
                git(["clone", "--quiet", url, &dir_str], None, url)?;
            }
        }

        let spec = match reference {
            GitReference::DefaultBranch => None,
            GitReference::Branch(branch) => Some(branch.as_str()),
            GitReference::Tag(tag) => Some(tag.as_str()),
            GitReference::Rev(rev) => Some(rev.as_str()),
        };
        if let Some(spec) = spec {
            git(["checkout", "--quiet", spec], Some(&dir_str), url)?;
        }

        Ok(dir)
    }
}

fn git<'a>(
    args: impl IntoIterator<Item = &'a str>,
    cwd: Option<&str>,
    url: &str,
) -> miette::Result<String> {
    let mut builder = CommandBuilder::new("git").args(args);
    if let Some(cwd) = cwd {
        builder = builder.cwd(cwd);
    }
    builder
        .exec_checked()
        .map_err(|e| source_error(format!("git operation failed for {url}: {e}")).into())
}
