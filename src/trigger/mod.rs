//! Trigger adapters for the export job.
//!
//! Two thin shells over the same `ExportJob::run()`: a recurring schedule
//! and an on-demand HTTP endpoint. Neither serializes overlapping runs;
//! concurrent refreshes race to overwrite the artifact (last writer wins).

pub mod http;
pub mod schedule;
