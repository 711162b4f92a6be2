//! # heraldd — herald daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Build the event catalog, event bus and worker pool
//! - Construct the rule engine with console senders
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use herald_adapter_console::ConsoleSender;
use herald_adapter_http_axum::state::AppState;
use herald_adapter_storage_sqlite_sqlx::{
    SqliteLogStore, SqliteRuleRepository, SqliteTemplateRepository,
};
use herald_app::dispatcher::ActionDispatcher;
use herald_app::event_bus::EventBus;
use herald_app::execution_logger::ExecutionLogger;
use herald_app::rule_cache::RuleCache;
use herald_app::rule_engine::RuleEngine;
use herald_app::services::log_service::LogService;
use herald_app::services::rule_service::RuleService;
use herald_app::services::template_service::TemplateService;
use herald_app::worker;
use herald_domain::catalog::EventCatalog;
use herald_domain::template::Renderer;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config.logging.filter);

    // Catalog
    let catalog = Arc::new(
        EventCatalog::builtin_with(config.events.iter().cloned())
            .context("registering configured event types")?,
    );
    tracing::info!(event_types = catalog.len(), "event catalog ready");

    // Database
    let db = herald_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
        max_connections: config.database.max_connections,
    }
    .build()
    .await
    .context("opening database")?;
    let pool = db.pool().clone();

    // Repositories
    let rules = Arc::new(RuleCache::new(SqliteRuleRepository::new(pool.clone())));
    let templates = SqliteTemplateRepository::new(pool.clone());
    let logs = SqliteLogStore::new(pool);

    // Engine
    let senders = ConsoleSender::new();
    let dispatcher = ActionDispatcher::new(
        templates.clone(),
        senders.channels(),
        Renderer::new(config.render_globals()),
    )
    .with_send_timeout(config.engine.send_timeout());
    let engine = RuleEngine::new(
        Arc::clone(&rules),
        dispatcher,
        ExecutionLogger::new(logs.clone()),
    );

    // Event bus
    let (bus, receiver) = EventBus::new(Arc::clone(&catalog), config.engine.queue_capacity);
    let pool_handle = worker::spawn(receiver, Arc::new(engine), config.engine.max_concurrency);

    // HTTP
    let state = AppState::new(
        RuleService::new(rules, Arc::clone(&catalog)),
        TemplateService::new(templates),
        LogService::new(logs),
        bus,
        catalog,
    );
    let app = herald_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "heraldd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    // The router owned the last bus handle, so the queue is now closed.
    let grace = config.engine.shutdown_grace();
    match tokio::time::timeout(grace, pool_handle).await {
        Ok(Ok(())) => tracing::info!("worker pool drained"),
        Ok(Err(err)) => tracing::error!(error = %err, "worker pool failed"),
        Err(_) => tracing::warn!(?grace, "worker pool still busy, abandoning in-flight events"),
    }

    db.close().await;
    tracing::info!(delivered = senders.delivered(), "heraldd stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
