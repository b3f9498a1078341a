//! Unresolvable-conflict reporting.

use std::fmt;

use brix_core::version::Range;
use brix_util::errors::BrixError;

/// One requirement that participated in a conflict: which manifest asked,
/// and for what range.
#[derive(Debug, Clone)]
pub struct Requirer {
    pub manifest: String,
    pub range: Range,
}

/// No version of a package satisfies all accumulated requirements.
///
/// Carries every requirer so a single failure names the whole conflict,
/// not just the requirement that happened to arrive last.
#[derive(Debug, Clone)]
pub struct UnresolvableConflict {
    pub name: String,
    pub requirers: Vec<Requirer>,
}

impl UnresolvableConflict {
    pub fn new(name: String, requirers: Vec<Requirer>) -> Self {
        Self { name, requirers }
    }

    pub fn into_error(self) -> BrixError {
        BrixError::Resolution {
            message: self.to_string(),
        }
    }
}

impl fmt::Display for UnresolvableConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "No version of \"{}\" satisfies all requirements:",
            self.name
        )?;
        for requirer in &self.requirers {
            writeln!(
                f,
                "  \"{}\" requires {} {}",
                requirer.manifest, self.name, requirer.range
            )?;
        }
        Ok(())
    }
}
