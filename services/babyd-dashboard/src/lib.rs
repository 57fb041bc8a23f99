//! Register dashboard service
//!
//! Polls a detector control adapter for register bank snapshots, serves an
//! editable register view over HTTP, and writes confirmed edits back.

pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod io;
pub mod state;

pub use config::{load_config, Config};
pub use error::{DashboardError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use register_view::{RegisterDefinitions, RegisterStore};
use tokio_util::sync::CancellationToken;

use crate::commands::{command_queue, join_command_worker, run_command_worker, CommandWriter};
use crate::feed::{poll_loop, SnapshotFeed};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::state::SharedState;

/// Run the register dashboard with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let cancel = CancellationToken::new();

    let definitions = match &config.register_definitions {
        Some(path) => {
            tracing::info!("Loading register definitions from {:?}", path);
            RegisterDefinitions::load(path)?
        }
        None => RegisterDefinitions::default(),
    };

    // Build shared state
    let (queue, rx) = command_queue();
    let state = state::new_state_handle(SharedState::new(
        RegisterStore::with_definitions(definitions),
        queue,
        config.adapter.banks.clone(),
        config.display.register_columns,
        config.display.words_per_row,
    ));

    let registers_url = config.adapter.registers_url();
    tracing::info!(
        "Polling {} bank(s) from {} every {:?}",
        config.adapter.banks.len(),
        registers_url,
        config.adapter.poll_interval
    );

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    // Start command worker
    let worker = tokio::spawn(run_command_worker(
        CommandWriter::new(registers_url.clone(), Arc::clone(&http)),
        rx,
        Arc::clone(&state),
        cancel.clone(),
    ));

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_state = Arc::clone(&state);
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    // Poll until cancelled
    let feed = SnapshotFeed::new(registers_url, http);
    poll_loop(
        feed,
        config.adapter.banks.clone(),
        Arc::clone(&state),
        config.adapter.poll_interval,
        cancel,
    )
    .await;

    join_command_worker(worker).await;
    tracing::info!("Register dashboard stopped");

    Ok(())
}
