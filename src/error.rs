//! Error types for brreg-export using snafu.
//!
//! This module defines structured error types with context selectors for
//! all error conditions in the codebase.

use snafu::prelude::*;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Sink URL did not match any supported backend.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed"))]
    ObjectStore { source: object_store::Error },

    /// IO error during storage operations.
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },

    /// Azure configuration error.
    #[snafu(display("Azure configuration error"))]
    AzureConfig { source: object_store::Error },
}

impl StorageError {
    /// Check if this error represents a "not found" condition (404, NoSuchKey, etc.)
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::ObjectStore { source } => {
                matches!(source, object_store::Error::NotFound { .. })
            }
            _ => false,
        }
    }
}

// ============ Fetch Errors ============

/// Errors that can occur while fetching the registry dataset.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// The HTTP request itself failed (DNS, TLS, connection refused, ...).
    #[snafu(display("Request to registry failed"))]
    Request { source: reqwest::Error },

    /// The registry answered with a non-success status.
    #[snafu(display("Registry returned HTTP {status}"))]
    Status { status: reqwest::StatusCode },
}

// ============ Decode Errors ============

/// Errors that can occur while decoding the gzip-compressed JSON stream.
///
/// Note: gzip corruption surfaces through the JSON reader as an IO-category
/// serde error, so malformed gzip and malformed JSON (including a record
/// missing a required field) both land here.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DecodeError {
    /// The byte stream is not valid gzip-compressed JSON of the expected shape.
    #[snafu(display("Failed to decode registry stream"))]
    Json { source: serde_json::Error },
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Source URL is empty.
    #[snafu(display("Source URL cannot be empty"))]
    EmptySourceUrl,

    /// Sink path is empty.
    #[snafu(display("Sink path cannot be empty"))]
    EmptySinkPath,

    /// Artifact name is empty.
    #[snafu(display("Artifact name cannot be empty"))]
    EmptyArtifact,

    /// Environment variable interpolation failed.
    #[snafu(display("Environment variable interpolation failed:\n{message}"))]
    EnvInterpolation { message: String },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },

    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file"))]
    ReadFile { source: std::io::Error },
}

// ============ Export Error (one run) ============

/// Errors that abort a single export run.
///
/// All variants are terminal for the current run; nothing is retried
/// internally. A failed run leaves the previous artifact untouched,
/// since the destination is only written after the whole input stream
/// has been consumed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExportError {
    /// Destination container could not be verified or created.
    #[snafu(display("Container setup failed"))]
    ContainerSetup { source: StorageError },

    /// The dataset could not be fetched.
    #[snafu(display("Fetch failed"))]
    Fetch { source: FetchError },

    /// The dataset could not be decoded.
    #[snafu(display("Decode failed"))]
    Decode { source: DecodeError },

    /// The artifact could not be uploaded.
    #[snafu(display("Upload failed"))]
    Upload { source: StorageError },

    /// The blocking extraction task died before returning.
    #[snafu(display("Extraction task failed"))]
    ExtractJoin { source: tokio::task::JoinError },
}

// ============ App Error (top-level) ============

/// Top-level errors that aggregate all error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AppError {
    /// Configuration error.
    #[snafu(display("Configuration error"))]
    Config { source: ConfigError },

    /// Storage error outside a run (provider construction).
    #[snafu(display("Storage error"))]
    AppStorage { source: StorageError },

    /// Export run failed.
    #[snafu(display("Export failed"))]
    Export { source: ExportError },

    /// Address parsing error.
    #[snafu(display("Failed to parse address"))]
    AddressParse { source: std::net::AddrParseError },

    /// Failed to bind the trigger endpoint.
    #[snafu(display("Failed to bind HTTP trigger to {address}"))]
    HttpBind {
        address: String,
        source: std::io::Error,
    },

    /// The trigger endpoint stopped serving.
    #[snafu(display("HTTP trigger server error"))]
    HttpServe { source: std::io::Error },

    /// Task join error.
    #[snafu(display("Task join error"))]
    TaskJoin { source: tokio::task::JoinError },
}
