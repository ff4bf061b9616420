//! Trellis JSON API Healthcheck Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::State;

/// Overall service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Ok,
    Unavailable,
}

/// Database reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Ok,
    Unreachable,
    NotConfigured,
}

/// Background email campaign delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CampaignsStatus {
    Accepting,
    Stopped,
    NotConfigured,
}

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `unavailable` when the database cannot be reached
    pub status: ServiceStatus,

    pub database: DatabaseStatus,

    pub campaigns: CampaignsStatus,

    /// Seconds since this process started serving
    pub uptime_seconds: i64,

    /// Running service version
    pub version: String,
}

async fn database_status(state: &State) -> DatabaseStatus {
    let Some(db) = state.app.db.as_ref() else {
        return DatabaseStatus::NotConfigured;
    };

    match db.ping().await {
        Ok(()) => DatabaseStatus::Ok,
        Err(source) => {
            warn!("healthcheck could not reach the database: {source}");

            DatabaseStatus::Unreachable
        }
    }
}

fn campaigns_status(state: &State) -> CampaignsStatus {
    match state.app.campaigns.as_ref() {
        Some(runner) if runner.is_accepting() => CampaignsStatus::Accepting,
        Some(_) => CampaignsStatus::Stopped,
        None => CampaignsStatus::NotConfigured,
    }
}

/// Healthcheck handler
///
/// Reports database reachability and whether email campaigns are still
/// accepted. Responds `503` when the database cannot be reached.
#[endpoint(
    tags("health"),
    summary = "Health check endpoint",
    responses(
        (status_code = StatusCode::OK, description = "Service is healthy"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Database unreachable"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot, res: &mut Response) -> Json<HealthResponse> {
    let (database, campaigns, uptime_seconds) = match depot.obtain::<Arc<State>>() {
        Ok(state) => (
            database_status(state).await,
            campaigns_status(state),
            state.uptime_seconds(Timestamp::now()),
        ),
        Err(_ignored) => (
            DatabaseStatus::NotConfigured,
            CampaignsStatus::NotConfigured,
            0,
        ),
    };

    let status = if database == DatabaseStatus::Unreachable {
        res.status_code(StatusCode::SERVICE_UNAVAILABLE);

        ServiceStatus::Unavailable
    } else {
        ServiceStatus::Ok
    };

    Json(HealthResponse {
        status,
        database,
        campaigns,
        uptime_seconds,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
