//! Version requirement ranges with intersection.
//!
//! Versions are plain semver values. Ranges are kept as an explicit
//! lower/upper bound pair so that requirements from several requirers can be
//! intersected during resolution; `semver::VersionReq` has no intersection,
//! which is why ranges are a local type.
//!
//! Supported forms: `*`, `^1.4.1`, `~1.2`, `1.2.3` / `=1.2.3` / `v1.2.3`
//! (exact), partial versions (`1.2` matches `1.2.x`), and comma-separated
//! comparator lists (`>=1.2, <2.0`).

use std::cmp::Ordering;
use std::fmt;

use semver::{Prerelease, Version};

use brix_util::errors::BrixError;

/// One end of a version interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// A requirement range over package versions.
///
/// `lower`/`upper` of `None` mean unbounded on that side. An empty range
/// satisfies no version at all; intersecting disjoint ranges produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    raw: String,
    lower: Option<Bound>,
    upper: Option<Bound>,
    empty: bool,
}

impl Range {
    /// The range matching every version.
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            lower: None,
            upper: None,
            empty: false,
        }
    }

    /// The range matching exactly one version.
    pub fn exact(version: &Version) -> Self {
        Self {
            raw: format!("={version}"),
            lower: Some(Bound {
                version: version.clone(),
                inclusive: true,
            }),
            upper: Some(Bound {
                version: version.clone(),
                inclusive: true,
            }),
            empty: false,
        }
    }

    /// Parse a requirement string.
    pub fn parse(spec: &str) -> Result<Self, BrixError> {
        let raw = spec.trim().to_string();
        if raw.is_empty() || raw == "*" {
            return Ok(Self::any());
        }

        let mut result = Self::any();
        for comparator in raw.split(',') {
            let part = parse_comparator(comparator.trim())
                .ok_or_else(|| BrixError::Manifest {
                    message: format!("Invalid version requirement \"{spec}\""),
                })?;
            result = result.intersect(&part);
        }
        result.raw = raw;
        Ok(result)
    }

    /// Check whether a version lies within this range.
    pub fn contains(&self, version: &Version) -> bool {
        if self.empty {
            return false;
        }
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }

    /// Intersect two ranges. Disjoint inputs yield an empty range.
    pub fn intersect(&self, other: &Range) -> Range {
        if self.empty || other.empty {
            return Range {
                raw: self.raw.clone(),
                lower: None,
                upper: None,
                empty: true,
            };
        }

        let lower = tighter_bound(&self.lower, &other.lower, true);
        let upper = tighter_bound(&self.upper, &other.upper, false);

        let empty = match (&lower, &upper) {
            (Some(lo), Some(hi)) => match lo.version.cmp(&hi.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(lo.inclusive && hi.inclusive),
                Ordering::Less => false,
            },
            _ => false,
        };

        let mut range = Range {
            raw: String::new(),
            lower,
            upper,
            empty,
        };
        range.raw = range.render();
        range
    }

    /// Whether no version can satisfy this range.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    fn render(&self) -> String {
        if self.empty {
            return "<empty>".to_string();
        }
        match (&self.lower, &self.upper) {
            (None, None) => "*".to_string(),
            (Some(lo), None) => {
                format!("{}{}", if lo.inclusive { ">=" } else { ">" }, lo.version)
            }
            (None, Some(hi)) => {
                format!("{}{}", if hi.inclusive { "<=" } else { "<" }, hi.version)
            }
            (Some(lo), Some(hi)) => {
                if lo.inclusive && hi.inclusive && lo.version == hi.version {
                    format!("={}", lo.version)
                } else {
                    format!(
                        "{}{}, {}{}",
                        if lo.inclusive { ">=" } else { ">" },
                        lo.version,
                        if hi.inclusive { "<=" } else { "<" },
                        hi.version
                    )
                }
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Pick the tighter of two optional bounds.
///
/// For lower bounds the greater version is tighter; for upper bounds the
/// lesser. On equal versions an exclusive bound beats an inclusive one.
fn tighter_bound(a: &Option<Bound>, b: &Option<Bound>, is_lower: bool) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (Some(x), Some(y)) => {
            let pick_x = match x.version.cmp(&y.version) {
                Ordering::Equal => !x.inclusive || y.inclusive,
                Ordering::Greater => is_lower,
                Ordering::Less => !is_lower,
            };
            Some(if pick_x { x.clone() } else { y.clone() })
        }
    }
}

/// Parse a single comparator into a range.
fn parse_comparator(token: &str) -> Option<Range> {
    if token.is_empty() {
        return None;
    }
    if token == "*" {
        return Some(Range::any());
    }

    if let Some(rest) = token.strip_prefix('^') {
        let (version, specified) = parse_partial(rest)?;
        return Some(between(version.clone(), caret_upper(&version, specified)));
    }
    if let Some(rest) = token.strip_prefix('~') {
        let (version, specified) = parse_partial(rest)?;
        return Some(between(version.clone(), tilde_upper(&version, specified)));
    }
    if let Some(rest) = token.strip_prefix(">=") {
        let (version, _) = parse_partial(rest)?;
        return Some(Range {
            raw: token.to_string(),
            lower: Some(Bound {
                version,
                inclusive: true,
            }),
            upper: None,
            empty: false,
        });
    }
    if let Some(rest) = token.strip_prefix("<=") {
        let (version, _) = parse_partial(rest)?;
        return Some(Range {
            raw: token.to_string(),
            lower: None,
            upper: Some(Bound {
                version,
                inclusive: true,
            }),
            empty: false,
        });
    }
    if let Some(rest) = token.strip_prefix('>') {
        let (version, _) = parse_partial(rest)?;
        return Some(Range {
            raw: token.to_string(),
            lower: Some(Bound {
                version,
                inclusive: false,
            }),
            upper: None,
            empty: false,
        });
    }
    if let Some(rest) = token.strip_prefix('<') {
        let (version, _) = parse_partial(rest)?;
        return Some(Range {
            raw: token.to_string(),
            lower: None,
            upper: Some(Bound {
                version,
                inclusive: false,
            }),
            empty: false,
        });
    }

    // Exact pin, with or without a leading `=`. A partial version such as
    // `1.2` matches the whole `1.2.x` series.
    let rest = token.strip_prefix('=').unwrap_or(token);
    let (version, specified) = parse_partial(rest)?;
    if specified == 3 {
        Some(Range::exact(&version))
    } else {
        Some(between(version.clone(), tilde_upper(&version, specified)))
    }
}

/// Half-open `[lower, upper)` range.
fn between(lower: Version, upper: Version) -> Range {
    let mut range = Range {
        raw: String::new(),
        lower: Some(Bound {
            version: lower,
            inclusive: true,
        }),
        upper: Some(Bound {
            version: upper,
            inclusive: false,
        }),
        empty: false,
    };
    range.raw = range.render();
    range
}

fn caret_upper(version: &Version, specified: u8) -> Version {
    if version.major > 0 {
        Version::new(version.major + 1, 0, 0)
    } else if specified >= 2 && version.minor > 0 {
        Version::new(0, version.minor + 1, 0)
    } else if specified == 3 {
        Version::new(0, version.minor, version.patch + 1)
    } else if specified == 2 {
        Version::new(0, 1, 0)
    } else {
        Version::new(1, 0, 0)
    }
}

fn tilde_upper(version: &Version, specified: u8) -> Version {
    if specified >= 2 {
        Version::new(version.major, version.minor + 1, 0)
    } else {
        Version::new(version.major + 1, 0, 0)
    }
}

/// Parse a possibly-partial version, returning how many numeric components
/// were written (`1` -> 1, `1.2` -> 2, `1.2.3-rc.1` -> 3).
pub fn parse_partial(input: &str) -> Option<(Version, u8)> {
    let s = input.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    if s.is_empty() {
        return None;
    }

    let (numbers, pre) = match s.split_once('-') {
        Some((n, p)) => (n, Some(p)),
        None => (s, None),
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let major: u64 = parts[0].parse().ok()?;
    let minor: u64 = match parts.get(1) {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    let patch: u64 = match parts.get(2) {
        Some(p) => p.parse().ok()?,
        None => 0,
    };

    let mut version = Version::new(major, minor, patch);
    if let Some(pre) = pre {
        version.pre = Prerelease::new(pre).ok()?;
    }
    Some((version, parts.len() as u8))
}

/// Parse a full version string, tolerating a leading `v`.
pub fn parse_version(input: &str) -> Result<Version, BrixError> {
    parse_partial(input)
        .map(|(v, _)| v)
        .ok_or_else(|| BrixError::Manifest {
            message: format!("Invalid version \"{input}\""),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    #[test]
    fn caret_range() {
        let range = Range::parse("^1.4.1").unwrap();
        assert!(range.contains(&v("1.4.1")));
        assert!(range.contains(&v("1.9.0")));
        assert!(!range.contains(&v("2.0.0")));
        assert!(!range.contains(&v("1.4.0")));
    }

    #[test]
    fn caret_zero_major() {
        let range = Range::parse("^0.2.3").unwrap();
        assert!(range.contains(&v("0.2.9")));
        assert!(!range.contains(&v("0.3.0")));

        let range = Range::parse("^0.0.3").unwrap();
        assert!(range.contains(&v("0.0.3")));
        assert!(!range.contains(&v("0.0.4")));
    }

    #[test]
    fn tilde_range() {
        let range = Range::parse("~1.2.3").unwrap();
        assert!(range.contains(&v("1.2.9")));
        assert!(!range.contains(&v("1.3.0")));

        let range = Range::parse("~1").unwrap();
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.0.0")));
    }

    #[test]
    fn exact_pin() {
        for spec in ["1.2.3", "=1.2.3", "v1.2.3"] {
            let range = Range::parse(spec).unwrap();
            assert!(range.contains(&v("1.2.3")), "{spec}");
            assert!(!range.contains(&v("1.2.4")), "{spec}");
        }
    }

    #[test]
    fn partial_version_matches_series() {
        let range = Range::parse("1.2").unwrap();
        assert!(range.contains(&v("1.2.0")));
        assert!(range.contains(&v("1.2.7")));
        assert!(!range.contains(&v("1.3.0")));
    }

    #[test]
    fn comparator_list() {
        let range = Range::parse(">=1.2, <2.0").unwrap();
        assert!(range.contains(&v("1.2.0")));
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.0.0")));
        assert!(!range.contains(&v("1.1.9")));
    }

    #[test]
    fn wildcard_matches_everything() {
        let range = Range::parse("*").unwrap();
        assert!(range.contains(&v("0.0.1")));
        assert!(range.contains(&v("99.0.0")));
    }

    #[test]
    fn intersect_narrows() {
        let a = Range::parse("^1.0.0").unwrap();
        let b = Range::parse("^1.4.0").unwrap();
        let both = a.intersect(&b);
        assert!(both.contains(&v("1.4.2")));
        assert!(!both.contains(&v("1.3.0")));
        assert!(!both.contains(&v("2.0.0")));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = Range::parse("^1.0.0").unwrap();
        let b = Range::parse("^2.0.0").unwrap();
        let both = a.intersect(&b);
        assert!(both.is_empty());
        assert!(!both.contains(&v("1.5.0")));
        assert!(!both.contains(&v("2.5.0")));
    }

    #[test]
    fn intersect_exact_within_caret() {
        let a = Range::parse("^1.0.0").unwrap();
        let b = Range::parse("=1.2.3").unwrap();
        let both = a.intersect(&b);
        assert!(both.contains(&v("1.2.3")));
        assert!(!both.contains(&v("1.2.4")));
    }

    #[test]
    fn pre_release_ordering() {
        let range = Range::parse(">=1.0.0-alpha, <1.0.0").unwrap();
        assert!(range.contains(&v("1.0.0-beta")));
        assert!(!range.contains(&v("1.0.0")));
    }

    #[test]
    fn invalid_requirement() {
        assert!(Range::parse("not-a-version").is_err());
        assert!(Range::parse("^x.y").is_err());
    }

    #[test]
    fn display_round_trip() {
        let range = Range::parse("^1.4.1").unwrap();
        assert_eq!(range.to_string(), "^1.4.1");
        let merged = range.intersect(&Range::parse("<1.9.0").unwrap());
        assert_eq!(merged.to_string(), ">=1.4.1, <1.9.0");
    }

    #[test]
    fn lenient_version_parse() {
        assert_eq!(v("v1.4.1"), Version::new(1, 4, 1));
        assert_eq!(v("2"), Version::new(2, 0, 0));
        assert!(parse_version("one.two").is_err());
    }
}
