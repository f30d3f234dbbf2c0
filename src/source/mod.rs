//! HTTP client for the registry dataset.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use snafu::prelude::*;
use tokio_util::io::StreamReader;

use crate::error::{FetchError, RequestSnafu, StatusSnafu};

/// The streamed response body as an async reader.
pub type RegistryStream = StreamReader<BoxStream<'static, std::io::Result<Bytes>>, Bytes>;

/// Client for the registry download endpoint.
///
/// Holds the shared HTTP client and the dataset URL; one `open` call per
/// export run.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    url: String,
}

impl RegistryClient {
    /// Create a client for the given dataset URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// The configured dataset URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open a streaming GET to the dataset URL.
    ///
    /// Only the response headers are awaited here; the body is returned as
    /// an async reader so the caller can consume it incrementally instead
    /// of buffering the whole response.
    pub async fn open(&self) -> Result<RegistryStream, FetchError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .context(RequestSnafu)?;

        let status = response.status();
        ensure!(status.is_success(), StatusSnafu { status });

        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();
        Ok(StreamReader::new(body))
    }
}
