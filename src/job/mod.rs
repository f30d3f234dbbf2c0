//! The export job: one fetch-extract-upload pass per run.
//!
//! Ensures the destination container, streams the registry download
//! through the extractor on the blocking thread pool, then replaces the
//! artifact with a single upload. The destination is only touched after
//! the entire input has been consumed, so a failed run leaves the previous
//! artifact in place.

use bytes::Bytes;
use object_store::path::Path;
use snafu::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::io::SyncIoBridge;
use tracing::info;

use crate::config::Config;
use crate::error::{
    ContainerSetupSnafu, DecodeSnafu, ExportError, ExtractJoinSnafu, FetchSnafu, StorageError,
    UploadSnafu,
};
use crate::extract::extract_tsv;
use crate::source::RegistryClient;
use crate::storage::{StorageProvider, StorageProviderRef};

/// Statistics about a completed export run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Number of register units written.
    pub records: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl ExportReport {
    /// Throughput over the whole run.
    pub fn records_per_sec(&self) -> f64 {
        self.records as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }
}

/// The export job, shared by both trigger adapters.
#[derive(Debug)]
pub struct ExportJob {
    client: RegistryClient,
    storage: StorageProviderRef,
    artifact: Path,
    progress_every: usize,
}

impl ExportJob {
    /// Create a job with explicitly constructed dependencies.
    pub fn new(
        client: RegistryClient,
        storage: StorageProviderRef,
        artifact: &str,
        progress_every: usize,
    ) -> Self {
        Self {
            client,
            storage,
            artifact: Path::from(artifact),
            progress_every,
        }
    }

    /// Build the job from configuration, constructing the HTTP client and
    /// storage provider.
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        let storage = Arc::new(
            StorageProvider::for_url_with_options(&config.sink.path, &config.sink.storage_options)
                .await?,
        );
        Ok(Self::new(
            RegistryClient::new(&config.source.url),
            storage,
            &config.sink.artifact,
            config.source.progress_every,
        ))
    }

    /// Perform one export run.
    pub async fn run(&self) -> Result<ExportReport, ExportError> {
        let start = Instant::now();

        self.storage
            .ensure_container()
            .await
            .context(ContainerSetupSnafu)?;

        let body = self.client.open().await.context(FetchSnafu)?;
        info!("Headers received, starting parse ...");

        // Decompression and parsing are CPU bound; bridge the response body
        // into a synchronous reader and run them on the blocking pool.
        let bridge = SyncIoBridge::new(body);
        let progress_every = self.progress_every;
        let extraction = tokio::task::spawn_blocking(move || extract_tsv(bridge, progress_every))
            .await
            .context(ExtractJoinSnafu)?
            .context(DecodeSnafu)?;

        info!("Uploading artifact ...");
        self.storage
            .put(&self.artifact, Bytes::from(extraction.buffer))
            .await
            .context(UploadSnafu)?;
        info!("Upload complete");

        let report = ExportReport {
            records: extraction.records,
            elapsed: start.elapsed(),
        };
        info!(
            "Wrote {} units in {:.1}s ({:.0} units/sec)",
            report.records,
            report.elapsed.as_secs_f64(),
            report.records_per_sec()
        );
        Ok(report)
    }
}
