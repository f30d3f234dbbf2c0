//! Scheduled trigger: run the export at a fixed interval.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::job::ExportJob;

/// Run the export on a fixed interval until shutdown.
///
/// The first run starts immediately. A failed run is logged and does not
/// stop the schedule; surfacing the failure is the operator's concern.
pub async fn run_schedule(job: Arc<ExportJob>, interval: Duration, shutdown: CancellationToken) {
    loop {
        info!("Scheduled refresh starting");
        match job.run().await {
            Ok(report) => info!(
                "Scheduled refresh complete: {} units in {} ms",
                report.records,
                report.elapsed.as_millis()
            ),
            Err(e) => error!("Scheduled refresh failed: {}", snafu::Report::from_error(e)),
        }

        info!(
            "Next scheduled refresh in {}s",
            interval.as_secs()
        );
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested during schedule wait");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
