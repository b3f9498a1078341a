//! brix.toml parsing and validation.
//!
//! A manifest describes either a package (a shareable library of components)
//! or a project (an end artifact such as a workbook or add-in). Projects are
//! never published and default their version to `0.0.0`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;

use brix_util::errors::BrixError;

use crate::dependency::{Dependency, RawDependency};
use crate::reference::{RawReference, Reference};
use crate::target::{RawTarget, Target};
use crate::version::parse_version;
use crate::MANIFEST_FILENAME;

/// The parsed representation of a `brix.toml` file.
///
/// ```toml
/// [package]
/// name = "my-package"
/// version = "1.0.0-rc.1"
/// authors = ["Dev <dev@example.com>"]
///
/// [src]
/// A = "src/a.bas"
/// B = { path = "src/b.cls" }
/// C = { path = "src/c.frm", binary = "src/c.frx", optional = true }
///
/// [dependencies]
/// dictionary = "^1.4.1"
/// with-properties = { version = "1.0.0" }
/// from-path = { path = "packages/from-path" }
/// from-git = { git = "https://example.com/web.git", branch = "beta" }
///
/// [references.Scripting]
/// version = "1.0"
/// guid = "{420B2830-E718-11CF-893D-00A0C9054228}"
///
/// [targets]
/// xlsm = "targets/xlsm"
///
/// [targets.xlam]
/// name = "custom-name"
/// path = "targets/xlam"
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub name: String,
    pub version: Version,
    pub kind: ManifestKind,
    pub metadata: Metadata,
    pub src: Vec<SourceEntry>,
    pub dependencies: Vec<Dependency>,
    pub references: Vec<Reference>,
    pub targets: Vec<Target>,
    /// Directory anchoring all relative paths this manifest declares.
    pub dir: PathBuf,
}

/// Whether the manifest declared `[package]` or `[project]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Package,
    Project,
}

/// Identity metadata shared by packages and projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub authors: Vec<String>,
    pub publish: bool,
}

/// One named source component declaration from `[src]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub path: PathBuf,
    /// Binary companion file (e.g. a form's `.frx`).
    pub binary: Option<PathBuf>,
    pub optional: bool,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    package: Option<RawMetadata>,
    project: Option<RawMetadata>,
    #[serde(default)]
    src: BTreeMap<String, RawSource>,
    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
    #[serde(default)]
    references: BTreeMap<String, RawReference>,
    #[serde(default)]
    targets: BTreeMap<String, RawTarget>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    name: Option<String>,
    version: Option<String>,
    authors: Option<Vec<String>>,
    #[serde(default)]
    publish: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSource {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        binary: Option<String>,
        #[serde(default)]
        optional: bool,
    },
}

impl Manifest {
    /// Load and parse the manifest in the given directory.
    pub fn from_dir(dir: &Path) -> miette::Result<Self> {
        Self::from_path(&dir.join(MANIFEST_FILENAME))
    }

    /// Load and parse a manifest file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BrixError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let dir = path.parent().unwrap_or(Path::new("."));
        Self::parse(&content, dir)
    }

    /// Parse a manifest from a string, anchoring relative paths at `dir`.
    pub fn parse(content: &str, dir: &Path) -> miette::Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| BrixError::Manifest {
            message: format!("Failed to parse {MANIFEST_FILENAME}: {e}"),
        })?;

        let (kind, meta) = match (raw.package, raw.project) {
            (Some(_), Some(_)) => {
                return Err(BrixError::Manifest {
                    message: "A manifest may declare [package] or [project], not both"
                        .to_string(),
                }
                .into())
            }
            (Some(package), None) => (ManifestKind::Package, package),
            (None, Some(project)) => (ManifestKind::Project, project),
            (None, None) => {
                return Err(BrixError::Manifest {
                    message: "[package] or [project] is required, with name, version, and authors"
                        .to_string(),
                }
                .into())
            }
        };

        let section = match kind {
            ManifestKind::Package => "package",
            ManifestKind::Project => "project",
        };
        let name = meta.name.ok_or_else(|| BrixError::Manifest {
            message: format!("[{section}] name is a required field"),
        })?;

        let (version, metadata) = match kind {
            ManifestKind::Package => {
                let version = meta.version.ok_or_else(|| BrixError::Manifest {
                    message: "[package] version is a required field".to_string(),
                })?;
                let authors = meta.authors.ok_or_else(|| BrixError::Manifest {
                    message: "[package] authors is a required field".to_string(),
                })?;
                (
                    parse_version(&version)?,
                    Metadata {
                        authors,
                        publish: meta.publish,
                    },
                )
            }
            ManifestKind::Project => {
                let version = match meta.version {
                    Some(v) => parse_version(&v)?,
                    None => Version::new(0, 0, 0),
                };
                // Projects are end artifacts and are never published.
                (
                    version,
                    Metadata {
                        authors: meta.authors.unwrap_or_default(),
                        publish: false,
                    },
                )
            }
        };

        let src = raw
            .src
            .into_iter()
            .map(|(entry_name, entry)| match entry {
                RawSource::Path(path) => SourceEntry {
                    name: entry_name,
                    path: dir.join(path),
                    binary: None,
                    optional: false,
                },
                RawSource::Detailed {
                    path,
                    binary,
                    optional,
                } => SourceEntry {
                    name: entry_name,
                    path: dir.join(path),
                    binary: binary.map(|b| dir.join(b)),
                    optional,
                },
            })
            .collect();

        let dependencies = raw
            .dependencies
            .iter()
            .map(|(dep_name, dep)| Dependency::from_raw(dep_name, dep, dir))
            .collect::<Result<Vec<_>, _>>()?;

        let references = raw
            .references
            .iter()
            .map(|(ref_name, reference)| Reference::from_raw(ref_name, reference))
            .collect::<Result<Vec<_>, _>>()?;

        let targets = raw
            .targets
            .iter()
            .map(|(type_key, target)| Target::from_raw(type_key, target, &name, dir))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            version,
            kind,
            metadata,
            src,
            dependencies,
            references,
            targets,
            dir: dir.to_path_buf(),
        })
    }

    /// `name vX.Y.Z` identifier for status lines and diagnostics.
    pub fn id(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }
}
