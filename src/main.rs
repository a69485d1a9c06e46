// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::application::dashboard_service::DashboardService;
use crate::application::data_pipeline::DataPipeline;
use crate::infrastructure::config::load_engine_config;
use crate::infrastructure::http_fetcher::HttpSourceFetcher;
use crate::infrastructure::memory_query::MemoryQueryEngine;
use crate::infrastructure::script_executor::ScriptExecutor;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_component, fetch_component_data, get_component, get_component_data, get_dashboard,
    get_grid_info, health_check, refresh_all_components, remove_component, set_grid_layout,
    update_component,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_engine_config()?;

    // Create source adapters (infrastructure layer)
    let fetcher = Arc::new(HttpSourceFetcher::new(
        config.olap.clone(),
        config.relational.as_ref().map(|r| r.endpoint.clone()),
        config.graphql.as_ref().map(|g| g.endpoint.clone()),
    ));

    // Create services (application layer)
    let pipeline = DataPipeline::new(
        fetcher,
        Arc::new(ScriptExecutor::default()),
        Arc::new(MemoryQueryEngine),
    );
    let dashboard_service = Arc::new(DashboardService::new(pipeline));

    // Create application state
    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/grid", put(set_grid_layout).get(get_grid_info))
        .route("/components", post(create_component))
        .route("/components/refresh", post(refresh_all_components))
        .route(
            "/components/:id",
            get(get_component)
                .patch(update_component)
                .delete(remove_component),
        )
        .route("/components/:id/fetch", post(fetch_component_data))
        .route("/components/:id/data", get(get_component_data))
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    println!("Starting dashboard-engine service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
