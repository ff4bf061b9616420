//! Trellis JSON API Server

use std::process;

use salvo::prelude::*;
use tracing::{error, info, warn};

use trellis_app::context::AppContext;

use crate::{
    config::ServerConfig, observability::Observability, router::app_router, state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config;
mod email_promotions;
mod extensions;
mod healthcheck;
mod identity;
mod observability;
mod olive_branches;
mod orders;
mod payments;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;
mod unsubscribe;

/// Trellis JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    let observability = Observability::init(&config).unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {e}");
        }

        process::exit(1);
    });

    let app_config = match config.app_config() {
        Ok(app_config) => app_config,
        Err(config_error) => {
            error!("invalid configuration: {config_error}");

            process::exit(1);
        }
    };

    let app = match AppContext::from_database_url(&config.database.database_url, app_config).await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let campaigns = app.campaigns.clone();

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    let listener = TcpListener::new(addr).bind().await;
    let server = Server::new(listener);
    let handle = server.handle();
    let shutdown_timeout = config.server.shutdown_timeout();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, shutdown_timeout).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(app_router(State::from_app_context(app))).await;

    if let Some(campaigns) = campaigns {
        let grace = config.promotions.shutdown_grace();

        if campaigns.shutdown(grace).await {
            info!("email campaigns drained");
        } else {
            warn!(
                grace_seconds = grace.as_secs(),
                "email campaigns still running at shutdown; they will be marked failed on next start"
            );
        }
    }

    observability.shutdown();
}
