// HTTP request handlers
//
// Every dashboard route answers 200 with an OpResponse envelope;
// operation failures are reported in the body, not the status code.
use crate::application::dashboard_service::{
    CreateComponentParams, GridLayoutParams, UpdateComponentParams,
};
use crate::application::response::OpResponse;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<OpResponse> {
    Json(state.dashboard_service.get_dashboard().await)
}

pub async fn set_grid_layout(
    State(state): State<Arc<AppState>>,
    Json(params): Json<GridLayoutParams>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.set_grid_layout(params).await)
}

pub async fn get_grid_info(State(state): State<Arc<AppState>>) -> Json<OpResponse> {
    Json(state.dashboard_service.get_grid_info().await)
}

pub async fn create_component(
    State(state): State<Arc<AppState>>,
    Json(params): Json<CreateComponentParams>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.create_component(params).await)
}

pub async fn get_component(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.get_component(&id).await)
}

pub async fn update_component(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(params): Json<UpdateComponentParams>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.update_component(&id, params).await)
}

pub async fn remove_component(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.remove_component(&id).await)
}

pub async fn fetch_component_data(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.fetch_component_data(&id).await)
}

pub async fn get_component_data(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<OpResponse> {
    Json(state.dashboard_service.get_component_data(&id).await)
}

pub async fn refresh_all_components(State(state): State<Arc<AppState>>) -> Json<OpResponse> {
    Json(state.dashboard_service.refresh_all_components().await)
}
