//! brreg-export: mirrors the Norwegian business registry to a TSV artifact.
//!
//! Downloads the gzip-compressed full dataset of registered units
//! (Enhetsregisteret), extracts the organization number and name of each
//! unit in a single streaming pass, and replaces a tab-separated artifact
//! in object storage. Runs on a schedule, on demand over HTTP, or once.
//!
//! # Example
//!
//! ```ignore
//! use brreg_export::{Config, ExportJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.yaml")?;
//!     let job = ExportJob::from_config(&config).await?;
//!     let report = job.run().await?;
//!     println!("Wrote {} units", report.records);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod job;
pub mod signal;
pub mod source;
pub mod storage;
pub mod trigger;

// Re-export main types
pub use config::Config;
pub use job::{ExportJob, ExportReport};
pub use source::RegistryClient;
pub use storage::{StorageProvider, StorageProviderRef};
