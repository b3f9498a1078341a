//! COM-style type library references.

use std::fmt;

use serde::Deserialize;

use brix_util::errors::BrixError;

/// A reference to an external, pre-registered type library.
///
/// Identified by name plus globally unique id; `major.minor` selects the
/// library version the host should bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub name: String,
    pub guid: String,
    pub major: u16,
    pub minor: u16,
}

/// A `[references.<Name>]` table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReference {
    pub version: String,
    pub guid: String,
}

impl Reference {
    /// Convert a raw manifest entry into a typed reference.
    pub fn from_raw(name: &str, raw: &RawReference) -> Result<Self, BrixError> {
        if !is_guid(&raw.guid) {
            return Err(BrixError::Manifest {
                message: format!(
                    "Reference \"{name}\" has invalid guid \"{}\" (expected {{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}})",
                    raw.guid
                ),
            });
        }

        let (major, minor) = parse_reference_version(&raw.version).ok_or_else(|| {
            BrixError::Manifest {
                message: format!(
                    "Reference \"{name}\" has invalid version \"{}\" (expected \"major.minor\")",
                    raw.version
                ),
            }
        })?;

        Ok(Self {
            name: name.to_string(),
            guid: raw.guid.to_uppercase(),
            major,
            minor,
        })
    }

    /// The `major.minor` version string.
    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.version(), self.guid)
    }
}

fn parse_reference_version(version: &str) -> Option<(u16, u16)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Check the `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}` shape.
fn is_guid(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 38 || bytes[0] != b'{' || bytes[37] != b'}' {
        return false;
    }
    for (i, &b) in bytes[1..37].iter().enumerate() {
        let expected_hyphen = matches!(i, 8 | 13 | 18 | 23);
        if expected_hyphen {
            if b != b'-' {
                return false;
            }
        } else if !b.is_ascii_hexdigit() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPTING_GUID: &str = "{420B2830-E718-11CF-893D-00A0C9054228}";

    #[test]
    fn parses_reference() {
        let raw = RawReference {
            version: "1.0".to_string(),
            guid: SCRIPTING_GUID.to_string(),
        };
        let reference = Reference::from_raw("Scripting", &raw).unwrap();
        assert_eq!(reference.major, 1);
        assert_eq!(reference.minor, 0);
        assert_eq!(reference.version(), "1.0");
        assert_eq!(reference.guid, SCRIPTING_GUID);
    }

    #[test]
    fn guid_is_normalized_to_uppercase() {
        let raw = RawReference {
            version: "2.5".to_string(),
            guid: SCRIPTING_GUID.to_lowercase(),
        };
        let reference = Reference::from_raw("Scripting", &raw).unwrap();
        assert_eq!(reference.guid, SCRIPTING_GUID);
    }

    #[test]
    fn rejects_bad_guid() {
        let raw = RawReference {
            version: "1.0".to_string(),
            guid: "420B2830-E718-11CF-893D-00A0C9054228".to_string(),
        };
        assert!(Reference::from_raw("Scripting", &raw).is_err());
    }

    #[test]
    fn rejects_bad_version() {
        let raw = RawReference {
            version: "1".to_string(),
            guid: SCRIPTING_GUID.to_string(),
        };
        assert!(Reference::from_raw("Scripting", &raw).is_err());
    }
}
