//! Loaded source components.

use std::path::{Path, PathBuf};

use brix_core::manifest::SourceEntry;
use brix_util::errors::BrixError;

use crate::graph::Origin;

/// The kind of a source component, detected from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A standard code module (`.bas`).
    Standard,
    /// A class module (`.cls`).
    Class,
    /// A form module (`.frm`), optionally with a binary companion (`.frx`).
    Form,
}

impl ComponentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "bas" => Some(Self::Standard),
            "cls" => Some(Self::Class),
            "frm" => Some(Self::Form),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Standard => "bas",
            Self::Class => "cls",
            Self::Form => "frm",
        }
    }
}

/// One loaded source unit contributed by a manifest's `[src]` declarations.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    pub path: PathBuf,
    pub code: String,
    /// Binary companion contents, when the declaration names one.
    pub binary: Option<Vec<u8>>,
    /// Which manifest contributed this component.
    pub origin: Origin,
}

impl Component {
    /// Load a declared source entry from disk.
    pub async fn load(entry: SourceEntry, origin: Origin) -> miette::Result<Self> {
        let kind = ComponentKind::from_path(&entry.path).ok_or_else(|| BrixError::Component {
            message: format!(
                "\"{}\" has unsupported extension (expected .bas, .cls, or .frm): {}",
                entry.name,
                entry.path.display()
            ),
        })?;

        let code = tokio::fs::read_to_string(&entry.path)
            .await
            .map_err(|e| BrixError::Component {
                message: format!("\"{}\" at {}: {e}", entry.name, entry.path.display()),
            })?;

        let binary = match entry.binary {
            Some(ref binary_path) => Some(tokio::fs::read(binary_path).await.map_err(|e| {
                BrixError::Component {
                    message: format!(
                        "\"{}\" binary companion at {}: {e}",
                        entry.name,
                        binary_path.display()
                    ),
                }
            })?),
            None => None,
        };

        Ok(Self {
            name: entry.name,
            kind,
            path: entry.path,
            code,
            binary,
            origin,
        })
    }
}
