//! registry-core server entry point.
//!
//! Starts the Axum HTTP server exposing the poll-message queue and
//! transfer lifecycle endpoints.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use registry_core::api;
use registry_core::app_state::AppState;
use registry_core::clock::{Clock, SystemClock};
use registry_core::config::RegistryConfig;
use registry_core::domain::EventBus;
use registry_core::service::{AckHandler, PollQueue, TransferEngine};
use registry_core::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RegistryConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting registry-core");

    // Shared collaborators
    let store = Arc::new(MemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Service layer
    let poll_queue = PollQueue::new(Arc::clone(&store), Arc::clone(&clock));
    let ack_handler = AckHandler::new(Arc::clone(&store), Arc::clone(&clock), event_bus.clone());
    let transfer_engine = TransferEngine::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        event_bus.clone(),
        config.transfer_policy(),
    );

    // Application state
    let app_state = AppState {
        store,
        clock,
        poll_queue,
        ack_handler,
        transfer_engine,
        event_bus,
    };

    // Router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
