//! Dependency requirements and their source descriptors.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use brix_util::errors::BrixError;

use crate::version::Range;

/// A single declared dependency requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub name: String,
    pub source: DependencySource,
}

/// Where a dependency's manifest and files come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencySource {
    /// A published package, constrained by a version range.
    Registry { range: Range },
    /// A git repository, optionally pinned to a branch, tag, or revision.
    Git { url: String, reference: GitReference },
    /// A local directory.
    Path { path: PathBuf },
}

/// What to check out from a git source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitReference {
    DefaultBranch,
    Branch(String),
    Tag(String),
    Rev(String),
}

/// A dependency specification in brix.toml.
///
/// Supports both shorthand (`name = "^1.4.1"`) and detailed table forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDependency {
    Range(String),
    Detailed(RawDetailedDependency),
}

/// The detailed table form of a dependency entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetailedDependency {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
}

impl Dependency {
    /// Convert a raw manifest entry into a typed requirement.
    ///
    /// `dir` anchors relative path dependencies.
    pub fn from_raw(name: &str, raw: &RawDependency, dir: &Path) -> Result<Self, BrixError> {
        let source = match raw {
            RawDependency::Range(spec) => DependencySource::Registry {
                range: Range::parse(spec)?,
            },
            RawDependency::Detailed(detail) => Self::source_from_detail(name, detail, dir)?,
        };
        Ok(Self {
            name: name.to_string(),
            source,
        })
    }

    fn source_from_detail(
        name: &str,
        detail: &RawDetailedDependency,
        dir: &Path,
    ) -> Result<DependencySource, BrixError> {
        let kinds =
            [detail.version.is_some(), detail.path.is_some(), detail.git.is_some()]
                .iter()
                .filter(|set| **set)
                .count();
        if kinds != 1 {
            return Err(BrixError::Manifest {
                message: format!(
                    "Dependency \"{name}\" must declare exactly one of \"version\", \"path\", or \"git\""
                ),
            });
        }

        if let Some(ref url) = detail.git {
            let pins = [&detail.branch, &detail.tag, &detail.rev]
                .iter()
                .filter(|pin| pin.is_some())
                .count();
            if pins > 1 {
                return Err(BrixError::Manifest {
                    message: format!(
                        "Dependency \"{name}\" may pin at most one of \"branch\", \"tag\", or \"rev\""
                    ),
                });
            }
            let reference = if let Some(branch) = detail.branch.clone() {
                GitReference::Branch(branch)
            } else if let Some(tag) = detail.tag.clone() {
                GitReference::Tag(tag)
            } else if let Some(rev) = detail.rev.clone() {
                GitReference::Rev(rev)
            } else {
                GitReference::DefaultBranch
            };
            return Ok(DependencySource::Git {
                url: url.clone(),
                reference,
            });
        }

        if let Some(ref path) = detail.path {
            return Ok(DependencySource::Path {
                path: dir.join(path),
            });
        }

        // Only `version` is left at this point.
        let spec = detail.version.as_deref().unwrap_or_default();
        Ok(DependencySource::Registry {
            range: Range::parse(spec)?,
        })
    }
}

impl DependencySource {
    /// Short label for log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry { .. } => "registry",
            Self::Git { .. } => "git",
            Self::Path { .. } => "path",
        }
    }

    /// The declared range for registry requirements.
    ///
    /// Git and path requirements carry no range; they always resolve to
    /// exactly one candidate.
    pub fn range(&self) -> Option<&Range> {
        match self {
            Self::Registry { range } => Some(range),
            _ => None,
        }
    }
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry { range } => write!(f, "{range}"),
            Self::Git { url, reference } => match reference {
                GitReference::DefaultBranch => write!(f, "git {url}"),
                GitReference::Branch(b) => write!(f, "git {url} (branch {b})"),
                GitReference::Tag(t) => write!(f, "git {url} (tag {t})"),
                GitReference::Rev(r) => write!(f, "git {url} (rev {r})"),
            },
            Self::Path { path } => write!(f, "path {}", path.display()),
        }
    }
}
