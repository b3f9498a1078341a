//! Registry package source: version listings, per-version manifests, and
//! archive download with checksum verification.

use std::path::PathBuf;

use reqwest::Client;
use semver::Version;
use serde::Deserialize;

use brix_core::manifest::Manifest;
use brix_core::version::{parse_version, Range};
use brix_util::hash::sha256_file;

use crate::cache::SourceCache;
use crate::download::{build_client, download_bytes};
use crate::{source_error, Candidate};

/// Default public registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.brix.dev";

/// HTTP client for one registry, with a cache-first fetch policy.
pub struct RegistrySource {
    pub name: String,
    pub url: String,
    client: Client,
    cache: SourceCache,
    offline: bool,
}

/// The registry's version listing payload for one package.
#[derive(Debug, Deserialize)]
struct VersionListing {
    #[allow(dead_code)]
    name: String,
    versions: Vec<ListedVersion>,
}

#[derive(Debug, Deserialize)]
struct ListedVersion {
    vers: String,
    #[serde(default)]
    cksum: Option<String>,
    #[serde(default)]
    yanked: bool,
}

impl RegistrySource {
    pub fn new(
        name: &str,
        url: &str,
        cache: SourceCache,
        offline: bool,
    ) -> miette::Result<Self> {
        Ok(Self {
            name: name.to_string(),
            url: url.trim_end_matches('/').to_string(),
            client: build_client()?,
            cache,
            offline,
        })
    }

    pub fn with_default_registry(cache: SourceCache, offline: bool) -> miette::Result<Self> {
        Self::new("brix-registry", DEFAULT_REGISTRY_URL, cache, offline)
    }

    fn listing_url(&self, package: &str) -> String {
        format!("{}/api/v1/packages/{package}", self.url)
    }

    fn manifest_url(&self, package: &str, version: &Version) -> String {
        format!("{}/api/v1/packages/{package}/{version}/manifest", self.url)
    }

    fn archive_url(&self, package: &str, version: &Version) -> String {
        format!("{}/api/v1/packages/{package}/{version}/download", self.url)
    }

    /// All published candidates for `package` whose version lies in `range`.
    pub async fn lookup(&self, package: &str, range: &Range) -> miette::Result<Vec<Candidate>> {
        let listing = self.fetch_listing(package).await?;

        let mut candidates = Vec::new();
        for listed in &listing.versions {
            if listed.yanked {
                continue;
            }
            let version = parse_version(&listed.vers).map_err(|_| {
                source_error(format!(
                    "Registry \"{}\" listed invalid version \"{}\" for package \"{package}\"",
                    self.name, listed.vers
                ))
            })?;
            if !range.contains(&version) {
                continue;
            }
            let manifest = self.fetch_manifest(package, &version).await?;
            candidates.push(Candidate { version, manifest });
        }

        tracing::debug!(
            package,
            %range,
            count = candidates.len(),
            "registry lookup"
        );
        Ok(candidates)
    }

    /// Download, verify, and unpack one package version; returns the
    /// directory holding its full contents.
    pub async fn fetch_package(&self, package: &str, version: &Version) -> miette::Result<PathBuf> {
        let dir = self.cache.package_dir(package, &version.to_string());
        if dir.join(brix_core::MANIFEST_FILENAME).is_file() {
            tracing::debug!(package, %version, "package already unpacked");
            return Ok(dir);
        }

        let archive = self.fetch_archive(package, version).await?;

        let listing = self.fetch_listing(package).await?;
        let expected = listing
            .versions
            .iter()
            .find(|listed| listed.vers == version.to_string())
            .and_then(|listed| listed.cksum.clone());
        if let Some(expected) = expected {
            let actual = sha256_file(&archive).map_err(brix_util::errors::BrixError::Io)?;
            if actual != expected {
                return Err(source_error(format!(
                    "Checksum mismatch for {package} v{version}: expected {expected}, got {actual}"
                ))
                .into());
            }
        }

        unpack_archive(&archive, &dir)?;
        Ok(dir)
    }

    async fn fetch_listing(&self, package: &str) -> miette::Result<VersionListing> {
        let path = self.cache.listing_path(package);
        let bytes = match self.cache.read(&path) {
            Some(bytes) => bytes,
            None => {
                let url = self.listing_url(package);
                let bytes = self.fetch_required(&url, package).await?;
                self.cache.write(&path, &bytes)?;
                bytes
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            source_error(format!(
                "Registry \"{}\" returned an invalid listing for \"{package}\": {e}",
                self.name
            ))
            .into()
        })
    }

    async fn fetch_manifest(&self, package: &str, version: &Version) -> miette::Result<Manifest> {
        let path = self.cache.manifest_path(package, &version.to_string());
        let bytes = match self.cache.read(&path) {
            Some(bytes) => bytes,
            None => {
                let url = self.manifest_url(package, version);
                let bytes = self.fetch_required(&url, package).await?;
                self.cache.write(&path, &bytes)?;
                bytes
            }
        };
        let content = String::from_utf8(bytes).map_err(|e| {
            source_error(format!(
                "Registry manifest for {package} v{version} is not valid UTF-8: {e}"
            ))
        })?;
        // Relative paths inside a registry manifest are anchored where the
        // archive will be unpacked.
        Manifest::parse(
            &content,
            &self.cache.package_dir(package, &version.to_string()),
        )
    }

    async fn fetch_archive(&self, package: &str, version: &Version) -> miette::Result<PathBuf> {
        let path = self.cache.archive_path(package, &version.to_string());
        if path.is_file() {
            return Ok(path);
        }
        let url = self.archive_url(package, version);
        let bytes = self.fetch_required(&url, package).await?;
        self.cache.write(&path, &bytes)?;
        Ok(path)
    }

    /// Fetch a URL that must exist for resolution to continue.
    ///
    /// Offline mode turns any cache miss into a source error without
    /// touching the network.
    async fn fetch_required(&self, url: &str, package: &str) -> miette::Result<Vec<u8>> {
        if self.offline {
            return Err(source_error(format!(
                "Package \"{package}\" is not cached and --offline is set"
            ))
            .into());
        }
        match download_bytes(&self.client, url).await? {
            Some(bytes) => Ok(bytes),
            None => Err(source_error(format!(
                "Package \"{package}\" not found in registry \"{}\"",
                self.name
            ))
            .into()),
        }
    }
}

/// Unpack a zip archive into `dest`.
fn unpack_archive(archive: &std::path::Path, dest: &std::path::Path) -> miette::Result<()> {
    let file = std::fs::File::open(archive).map_err(brix_util::errors::BrixError::Io)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        source_error(format!("Invalid package archive {}: {e}", archive.display()))
    })?;
    zip.extract(dest).map_err(|e| {
        source_error(format!(
            "Failed to unpack {} into {}: {e}",
            archive.display(),
            dest.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_deserializes() {
        let json = r#"{
            "name": "dictionary",
            "versions": [
                { "vers": "1.4.0", "cksum": "abc" },
                { "vers": "1.4.1", "yanked": true }
            ]
        }"#;
        let listing: VersionListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.versions.len(), 2);
        assert!(listing.versions[1].yanked);
        assert_eq!(listing.versions[0].cksum.as_deref(), Some("abc"));
    }

    #[test]
    fn url_layout() {
        let dir = tempfile::tempdir().unwrap();
        let registry = RegistrySource::new(
            "test",
            "https://registry.example.com/",
            SourceCache::new(dir.path()),
            false,
        )
        .unwrap();
        let version = Version::new(1, 4, 1);
        assert_eq!(
            registry.listing_url("dictionary"),
            "https://registry.example.com/api/v1/packages/dictionary"
        );
        assert_eq!(
            registry.manifest_url("dictionary", &version),
            "https://registry.example.com/api/v1/packages/dictionary/1.4.1/manifest"
        );
        assert_eq!(
            registry.archive_url("dictionary", &version),
            "https://registry.example.com/api/v1/packages/dictionary/1.4.1/download"
        );
    }

    #[tokio::test]
    async fn offline_miss_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = RegistrySource::new(
            "test",
            "https://registry.example.com",
            SourceCache::new(dir.path()),
            true,
        )
        .unwrap();
        let result = registry.lookup("missing", &Range::any()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cached_listing_is_used_when_offline() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SourceCache::new(dir.path());
        cache
            .write(
                &cache.listing_path("dictionary"),
                br#"{ "name": "dictionary", "versions": [] }"#,
            )
            .unwrap();
        let registry =
            RegistrySource::new("test", "https://registry.example.com", cache, true).unwrap();
        let candidates = registry
            .lookup("dictionary", &Range::any())
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }
}
