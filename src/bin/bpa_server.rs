//! bpa_server: REST front for the BPA engine plus the workflow event worker.
//!
//! Configuration: see `bpa_starter::config` (env vars prefixed `BPA_`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bpa_starter::api::build_router;
use bpa_starter::bpa::{AuthToken, EventPublishingClient, HttpBpaClient};
use bpa_starter::workflow::{
    EventWorker, NoopHooks, WorkflowEventBus, WorkflowEventDispatcher, WorkflowService,
};
use bpa_starter::ServiceConfig;
use tokio::net::TcpListener;
use tokio::sync::watch;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bpa_starter=debug,bpa_server=debug".into()),
        )
        .init();

    let config = ServiceConfig::load().context("Loading configuration")?;

    // Lifecycle events: Before runs inline, After/Abort go through the bus.
    let dispatcher = WorkflowEventDispatcher::new(Arc::new(NoopHooks));
    let (bus, receiver) = WorkflowEventBus::new(config.event_buffer);
    let worker = EventWorker::new(dispatcher.clone(), receiver, config.event_workers);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut worker_handle = tokio::spawn(worker.run(shutdown_rx));
    tracing::info!(
        "Workflow event worker spawned (buffer={}, workers={})",
        config.event_buffer,
        config.event_workers
    );

    let engine = HttpBpaClient::new(config.base_url()?, config.request_timeout())?;
    tracing::info!("BPA engine at {}", engine.base_url());
    let client = EventPublishingClient::new(engine, dispatcher, bus);

    let workflows = Arc::new(WorkflowService::new(
        Arc::new(client),
        config.module_name.clone(),
        AuthToken::new(config.service_token.clone()),
    ));

    let app = build_router(workflows);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("bpa_server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("server error")?;

    // The router (and with it the last bus handle) is gone; give queued events a
    // moment to drain before forcing the worker down.
    let joined = match tokio::time::timeout(DRAIN_TIMEOUT, &mut worker_handle).await {
        Ok(joined) => joined,
        Err(_) => {
            tracing::warn!("Event worker still busy after {:?}, stopping it", DRAIN_TIMEOUT);
            let _ = shutdown_tx.send(true);
            worker_handle.await
        }
    };
    match joined {
        Ok(stats) => tracing::info!(
            processed = stats.processed,
            failed = stats.failed,
            dropped = stats.dropped,
            "Event worker drained"
        ),
        Err(e) => tracing::error!(error = %e, "Event worker task failed"),
    }

    Ok(())
}
