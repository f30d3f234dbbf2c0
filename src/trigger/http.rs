//! On-demand trigger: run the export in response to an HTTP request.
//!
//! Exposes `GET /refresh`. When an auth token is configured the request
//! must carry it as a bearer token. A successful run answers with a
//! plain-text "Done!"; a failed run answers 500 with the error chain
//! rather than conflating "ran" with "succeeded".

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Router, routing::get};
use snafu::prelude::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::HttpTriggerConfig;
use crate::error::{AddressParseSnafu, AppError, HttpBindSnafu, HttpServeSnafu};
use crate::job::ExportJob;

struct TriggerState {
    job: Arc<ExportJob>,
    auth_token: Option<String>,
}

/// Build the trigger router.
pub fn router(job: Arc<ExportJob>, auth_token: Option<String>) -> Router {
    let state = Arc::new(TriggerState { job, auth_token });
    Router::new()
        .route("/refresh", get(refresh_handler))
        .layer(Extension(state))
}

/// Serve the on-demand trigger endpoint until shutdown.
pub async fn serve(
    job: Arc<ExportJob>,
    config: HttpTriggerConfig,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let addr: SocketAddr = config.address.parse().context(AddressParseSnafu)?;
    let app = router(job, config.auth_token);

    let listener = TcpListener::bind(addr).await.context(HttpBindSnafu {
        address: config.address.clone(),
    })?;
    info!("On-demand trigger listening on http://{}/refresh", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context(HttpServeSnafu)
}

/// Handler for `GET /refresh`.
async fn refresh_handler(
    Extension(state): Extension<Arc<TriggerState>>,
    headers: HeaderMap,
) -> Response {
    if let Some(expected) = &state.auth_token {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, "Unauthorized\n").into_response();
        }
    }

    info!("Manual refresh requested");
    match state.job.run().await {
        Ok(report) => {
            info!(
                "Manual refresh complete: {} units in {} ms",
                report.records,
                report.elapsed.as_millis()
            );
            (StatusCode::OK, "Done!").into_response()
        }
        Err(e) => {
            let report = snafu::Report::from_error(e);
            error!("Manual refresh failed: {}", report);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Refresh failed: {report}"),
            )
                .into_response()
        }
    }
}
