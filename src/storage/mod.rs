//! Object storage abstraction for the output artifact.
//!
//! Provides a unified interface over Azure Blob Storage (the production
//! destination) and the local filesystem (development and tests).

mod azure;
mod local;

use bytes::Bytes;
use futures::StreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use regex::Regex;
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::error::{InvalidUrlSnafu, IoSnafu, ObjectStoreSnafu, StorageError};

pub use azure::AzureConfig;
pub use local::LocalConfig;

/// A reference-counted storage provider.
pub type StorageProviderRef = Arc<StorageProvider>;

// URL patterns for the supported backends
const AZURE_URL: &str = r"^az://(?P<container>[a-z0-9\-]+)/?$";
const AZURE_HTTPS: &str =
    r"^https://(?P<account>[a-z0-9]+)\.blob\.core\.windows\.net/(?P<container>[a-z0-9\-]+)/?$";
const FILE_URI: &str = r"^file://(?P<path>/.*)$";
const FILE_PATH: &str = r"^(?P<path>/.*)$";

/// Backend configuration parsed from a sink URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Azure(AzureConfig),
    Local(LocalConfig),
}

static MATCHERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("azure", AZURE_URL),
        ("azure", AZURE_HTTPS),
        ("local", FILE_URI),
        ("local", FILE_PATH),
    ]
    .into_iter()
    .map(|(backend, pattern)| (backend, Regex::new(pattern).unwrap()))
    .collect()
});

impl BackendConfig {
    /// Parse a sink URL into a backend configuration.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        for (backend, regex) in MATCHERS.iter() {
            let Some(captures) = regex.captures(url) else {
                continue;
            };
            return Ok(match *backend {
                "azure" => BackendConfig::Azure(AzureConfig {
                    account: captures.name("account").map(|m| m.as_str().to_string()),
                    container: captures["container"].to_string(),
                }),
                _ => BackendConfig::Local(LocalConfig {
                    path: captures["path"].to_string(),
                }),
            });
        }

        InvalidUrlSnafu {
            url: url.to_string(),
        }
        .fail()
    }
}

/// Storage provider holding the destination container for the artifact.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

impl StorageProvider {
    /// Create a storage provider for the given sink URL with storage options.
    pub async fn for_url_with_options(
        url: &str,
        options: &HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        match BackendConfig::parse_url(url)? {
            BackendConfig::Azure(config) => Self::construct_azure(config, options),
            BackendConfig::Local(config) => Self::construct_local(config).await,
        }
    }

    /// Ensure the destination container exists. Idempotent.
    ///
    /// The local backend creates the directory if absent. Azure containers
    /// are provisioned externally; here the container is probed with a
    /// single list request so that a missing or unreachable container fails
    /// the run before anything is fetched.
    pub async fn ensure_container(&self) -> Result<(), StorageError> {
        match &self.config {
            BackendConfig::Local(local) => {
                tokio::fs::create_dir_all(&local.path).await.context(IoSnafu)
            }
            BackendConfig::Azure(_) => {
                let mut listing = self.object_store.list(None);
                match listing.next().await {
                    None | Some(Ok(_)) => Ok(()),
                    Some(Err(source)) => Err(source).context(ObjectStoreSnafu),
                }
            }
        }
    }

    /// Upload the full artifact contents, replacing any previous version.
    pub async fn put(&self, path: &Path, bytes: Bytes) -> Result<(), StorageError> {
        let size = bytes.len();
        self.object_store
            .put(path, PutPayload::from(bytes))
            .await
            .context(ObjectStoreSnafu)?;
        debug!("Put {} bytes to {}/{}", size, self.canonical_url, path);
        Ok(())
    }

    /// Get the contents of an artifact.
    pub async fn get(&self, path: &Path) -> Result<Bytes, StorageError> {
        self.object_store
            .get(path)
            .await
            .context(ObjectStoreSnafu)?
            .bytes()
            .await
            .context(ObjectStoreSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_az_url_parsing() {
        let config = BackendConfig::parse_url("az://minimaler").unwrap();
        assert_eq!(
            config,
            BackendConfig::Azure(AzureConfig {
                account: None,
                container: "minimaler".to_string(),
            })
        );
    }

    #[test]
    fn test_azure_https_url_parsing() {
        let config =
            BackendConfig::parse_url("https://myaccount.blob.core.windows.net/minimaler").unwrap();
        assert_eq!(
            config,
            BackendConfig::Azure(AzureConfig {
                account: Some("myaccount".to_string()),
                container: "minimaler".to_string(),
            })
        );
    }

    #[test]
    fn test_local_url_parsing() {
        let config = BackendConfig::parse_url("/var/lib/brreg-export/out").unwrap();
        match config {
            BackendConfig::Local(local) => assert_eq!(local.path, "/var/lib/brreg-export/out"),
            _ => panic!("Expected Local config"),
        }
    }

    #[test]
    fn test_file_uri_parsing() {
        let config = BackendConfig::parse_url("file:///data/out").unwrap();
        match config {
            BackendConfig::Local(local) => assert_eq!(local.path, "/data/out"),
            _ => panic!("Expected Local config"),
        }
    }

    #[test]
    fn test_invalid_url() {
        assert!(BackendConfig::parse_url("gs://bucket/key").is_err());
        assert!(BackendConfig::parse_url("relative/path").is_err());
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let url = temp_dir.path().to_str().unwrap();
        let storage = StorageProvider::for_url_with_options(url, &HashMap::new())
            .await
            .unwrap();

        let path = Path::from("mainunits2.tsv");
        storage
            .put(&path, Bytes::from_static(b"123\tACME\n"))
            .await
            .unwrap();
        let content = storage.get(&path).await.unwrap();
        assert_eq!(content.as_ref(), b"123\tACME\n");

        // A second put replaces, not appends
        storage
            .put(&path, Bytes::from_static(b"456\tFOO\n"))
            .await
            .unwrap();
        let content = storage.get(&path).await.unwrap();
        assert_eq!(content.as_ref(), b"456\tFOO\n");
    }

    #[tokio::test]
    async fn test_ensure_container_creates_local_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("not/yet/created");
        let url = nested.to_str().unwrap().to_string();

        let storage = StorageProvider::for_url_with_options(&url, &HashMap::new())
            .await
            .unwrap();
        storage.ensure_container().await.unwrap();
        assert!(nested.is_dir());
    }
}
