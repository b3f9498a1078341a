//! Build target declarations.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use brix_util::errors::BrixError;
use brix_util::fs::sanitize_filename;

/// Supported output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Xlsx,
    Xlsm,
    Xlam,
}

impl TargetType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            "xlam" => Some(Self::Xlam),
            _ => None,
        }
    }

    /// The output file extension for this container format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xlsm => "xlsm",
            Self::Xlam => "xlam",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A named build output: a container format plus where its template lives
/// and what the output file is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub kind: TargetType,
    pub path: PathBuf,
    pub filename: String,
}

/// A `[targets]` entry: either a template path string or a detailed table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTarget {
    Path(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        path: Option<String>,
    },
}

impl Target {
    /// Convert a raw `[targets]` entry into a typed target.
    ///
    /// The table key is the container format; the target name defaults to
    /// the declaring package's name and the template path to `target`.
    pub fn from_raw(
        type_key: &str,
        raw: &RawTarget,
        package_name: &str,
        dir: &Path,
    ) -> Result<Self, BrixError> {
        let kind = TargetType::parse(type_key).ok_or_else(|| BrixError::Manifest {
            message: format!(
                "Unsupported target type \"{type_key}\". Only \"xlsx\", \"xlsm\", and \"xlam\" are supported"
            ),
        })?;

        let (name, relative) = match raw {
            RawTarget::Path(path) => (package_name.to_string(), path.as_str()),
            RawTarget::Detailed { name, path } => (
                name.clone().unwrap_or_else(|| package_name.to_string()),
                path.as_deref().unwrap_or("target"),
            ),
        };

        let filename = format!("{}.{}", sanitize_filename(&name), kind.extension());
        Ok(Self {
            name,
            kind,
            path: dir.join(relative),
            filename,
        })
    }
}
