// Dashboard store and the fetch-and-apply cycle
//
// Every public operation returns an OpResponse; validation problems
// and fetch failures come back as values, never as Err. Writes go
// through a single RwLock so each operation sees a consistent state.
use crate::application::data_pipeline::DataPipeline;
use crate::application::normalizer::normalize;
use crate::application::path::{self, PathOp};
use crate::application::response::OpResponse;
use crate::application::transform_chain::ChainOutcome;
use crate::domain::component::{
    ComponentMetadata, ComponentRecord, ComponentType, FetchStatus, default_stat_card_data,
    default_style,
};
use crate::domain::dashboard::DashboardState;
use crate::domain::data_config::{DataConfig, QueryShorthand};
use crate::domain::grid::{GridSpec, normalize_template_row, validate};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayoutParams {
    pub columns: String,
    pub rows: String,
    #[serde(default = "default_gap")]
    pub gap: String,
    pub template_areas: Vec<String>,
}

fn default_gap() -> String {
    "16px".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponentParams {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub grid_area: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub data: Value,
    pub data_config: Option<DataConfig>,
    pub query: Option<QueryShorthand>,
    pub style: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Set,
    Push,
    Splice,
    Merge,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Push => "push",
            Operation::Splice => "splice",
            Operation::Merge => "merge",
        }
    }
}

/// Either a path-addressed mutation (`path` + `operation`, with
/// `updates` as the operand) or a shallow root merge (`updates` as an
/// object, no path). Splice takes its bounds from `operationParams`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComponentParams {
    pub path: Option<String>,
    pub updates: Option<Value>,
    #[serde(default)]
    pub operation: Operation,
    pub operation_params: Option<SpliceParams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpliceParams {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub delete_count: usize,
    #[serde(default)]
    pub items: Vec<Value>,
}

enum CycleResult {
    Missing,
    Skipped,
    Done { info: Value, errored: bool },
}

pub struct DashboardService {
    state: RwLock<DashboardState>,
    pipeline: DataPipeline,
}

impl DashboardService {
    pub fn new(pipeline: DataPipeline) -> Self {
        Self {
            state: RwLock::new(DashboardState::default()),
            pipeline,
        }
    }

    pub async fn get_dashboard(&self) -> OpResponse {
        let state = self.state.read().await;
        OpResponse::ok("Dashboard state retrieved successfully", json!(&*state))
    }

    pub async fn set_grid_layout(&self, params: GridLayoutParams) -> OpResponse {
        let template_areas: Vec<String> = params
            .template_areas
            .iter()
            .map(|row| normalize_template_row(row))
            .collect();
        let candidate = GridSpec::new(params.columns, params.rows, params.gap, template_areas);

        let report = validate(&candidate);
        if !report.valid {
            return OpResponse::fail(format!(
                "Invalid grid layout: {}",
                report.errors.join(", ")
            ));
        }

        let mut state = self.state.write().await;
        let orphaned = state.orphaned_by(&candidate.template_areas);
        if !orphaned.is_empty() {
            let orphaned_areas: Vec<String> =
                orphaned.iter().map(|c| c.grid_area.clone()).collect();
            return OpResponse::fail(format!(
                "Cannot update grid layout: {} component(s) would be orphaned. \
                 Components in areas: {} which are not in new grid areas: {}",
                orphaned.len(),
                orphaned_areas.join(", "),
                candidate.areas().join(", ")
            ));
        }

        state.grid = candidate;
        tracing::info!("grid layout replaced: {} areas", state.grid.areas().len());

        OpResponse::ok(
            "Grid layout configured successfully",
            json!({
                "grid": state.grid,
                "gridAreas": state.grid.areas(),
                "stats": state.grid_stats(),
            }),
        )
    }

    pub async fn create_component(&self, params: CreateComponentParams) -> OpResponse {
        let id = params.id.clone();
        let grid_area = params.grid_area.clone();
        let has_query = params.query.is_some();
        let data_config = params
            .data_config
            .or_else(|| params.query.map(QueryShorthand::into_data_config));

        {
            let mut state = self.state.write().await;

            // Placement checks, in order: duplicate id, unknown area,
            // occupied area.
            if state.components.contains_key(&id) {
                return OpResponse::fail(format!(
                    "Component with ID \"{id}\" already exists. Use update_component to modify it."
                ));
            }
            let areas = state.grid.areas();
            if !areas.iter().any(|a| *a == grid_area) {
                return OpResponse::fail(format!(
                    "Grid area \"{grid_area}\" not found in template areas. Available areas: {}",
                    areas.join(", ")
                ));
            }
            if let Some(occupant) = state.occupant_of(&grid_area) {
                return OpResponse::fail(format!(
                    "Grid area \"{grid_area}\" is already occupied by component \"{}\". \
                     Remove it first or choose a different grid area.",
                    occupant.id
                ));
            }

            let mut style = default_style(params.component_type);
            if let Some(overrides) = params.style {
                for (key, value) in overrides {
                    style.insert(key, value);
                }
            }
            let data = match params.component_type {
                ComponentType::StatCard => default_stat_card_data(params.data),
                // Inline chart data arrives in arbitrary tabular shape;
                // charts fed by a query get normalized after the fetch.
                ComponentType::Chart if !has_query && !params.data.is_null() => {
                    normalize(params.data)
                }
                _ => params.data,
            };

            let record = ComponentRecord {
                id: id.clone(),
                component_type: params.component_type,
                grid_area: grid_area.clone(),
                title: params.title,
                description: params.description,
                data,
                data_config: data_config.clone(),
                style: Some(style),
                metadata: ComponentMetadata::new(now_iso()),
            };
            state.components.insert(id.clone(), record);
            tracing::info!("created component {} in area {}", id, grid_area);
        }

        let fetch_info = if data_config.is_some() {
            match self.run_fetch_cycle(&id).await {
                CycleResult::Done { info, .. } => Some(info),
                _ => None,
            }
        } else {
            None
        };

        let state = self.state.read().await;
        let stats = state.grid_stats();
        let suggestion = if stats.available_areas > 0 {
            format!(
                "{} grid area(s) still available: {}",
                stats.available_areas,
                stats.available_area_names.join(", ")
            )
        } else {
            "All grid areas are now occupied".to_string()
        };
        let suffix = if fetch_info.is_some() {
            " (data fetch attempted)"
        } else {
            ""
        };

        OpResponse::ok(
            format!(
                "Component \"{id}\" created successfully in grid area \"{grid_area}\"{suffix}"
            ),
            json!({
                "component": state.components.get(&id),
                "gridStats": stats,
                "suggestion": suggestion,
                "fetch": fetch_info,
            }),
        )
    }

    pub async fn get_component(&self, id: &str) -> OpResponse {
        let state = self.state.read().await;
        match state.components.get(id) {
            Some(component) => OpResponse::ok(
                format!("Component \"{id}\" retrieved successfully"),
                json!(component),
            ),
            None => OpResponse::fail(format!("Component \"{id}\" not found")),
        }
    }

    pub async fn update_component(&self, id: &str, params: UpdateComponentParams) -> OpResponse {
        let operation_name = params.operation.name();
        {
            let mut state = self.state.write().await;
            let Some(component) = state.components.get(id) else {
                return OpResponse::fail(format!("Component \"{id}\" not found"));
            };
            let old_area = component.grid_area.clone();
            let document = match serde_json::to_value(component) {
                Ok(value) => value,
                Err(e) => return OpResponse::fail(e.to_string()),
            };

            let updated_doc = if let Some(target) = &params.path {
                let op = match params.operation {
                    Operation::Set => PathOp::Set {
                        value: params.updates.unwrap_or(Value::Null),
                    },
                    Operation::Push => PathOp::Push {
                        items: params.updates.unwrap_or(Value::Null),
                    },
                    Operation::Splice => {
                        let bounds = params.operation_params.unwrap_or_default();
                        PathOp::Splice {
                            start: bounds.start,
                            delete_count: bounds.delete_count,
                            items: bounds.items,
                        }
                    }
                    Operation::Merge => PathOp::Merge {
                        value: params.updates.unwrap_or(Value::Null),
                    },
                };
                match path::apply(&document, target, op) {
                    Ok(value) => value,
                    Err(e) => return OpResponse::fail(e.to_string()),
                }
            } else if let Some(updates) = params.updates {
                let Value::Object(updates) = updates else {
                    return OpResponse::fail("Root updates must be an object");
                };
                // Root shallow merge. The id and metadata are owned by
                // the store and cannot be replaced from outside.
                let mut merged = document.as_object().cloned().unwrap_or_default();
                for (key, value) in updates {
                    merged.insert(key, value);
                }
                merged.insert("id".to_string(), json!(id));
                if let Some(metadata) = document.get("metadata") {
                    merged.insert("metadata".to_string(), metadata.clone());
                }
                Value::Object(merged)
            } else {
                return OpResponse::fail("Update requires either a path or an updates object");
            };

            let mut updated: ComponentRecord = match serde_json::from_value(updated_doc) {
                Ok(record) => record,
                Err(e) => {
                    return OpResponse::fail(format!("Update produced an invalid component: {e}"));
                }
            };
            updated.id = id.to_string();
            updated.metadata.updated_at = Some(now_iso());

            if updated.grid_area != old_area {
                let areas = state.grid.areas();
                if !areas.iter().any(|a| *a == updated.grid_area) {
                    return OpResponse::fail(format!(
                        "Grid area \"{}\" not found in template areas. Available areas: {}",
                        updated.grid_area,
                        areas.join(", ")
                    ));
                }
                if let Some(occupant) = state.occupant_of(&updated.grid_area)
                    && occupant.id != id
                {
                    return OpResponse::fail(format!(
                        "Grid area \"{}\" is already occupied by component \"{}\". \
                         Remove it first or choose a different grid area.",
                        updated.grid_area, occupant.id
                    ));
                }
            }

            state.components.insert(id.to_string(), updated);
        }

        let has_config = {
            let state = self.state.read().await;
            state
                .components
                .get(id)
                .is_some_and(|c| c.data_config.is_some())
        };
        let fetch_info = if has_config {
            match self.run_fetch_cycle(id).await {
                CycleResult::Done { info, .. } => Some(info),
                _ => None,
            }
        } else {
            None
        };

        let state = self.state.read().await;
        let suffix = if fetch_info.is_some() {
            " (data fetch attempted)"
        } else {
            ""
        };
        OpResponse::ok(
            format!(
                "Component \"{id}\" updated successfully using {operation_name} operation{suffix}"
            ),
            json!({
                "component": state.components.get(id),
                "fetch": fetch_info,
            }),
        )
    }

    pub async fn remove_component(&self, id: &str) -> OpResponse {
        let mut state = self.state.write().await;
        match state.components.remove(id) {
            Some(removed) => {
                self.pipeline.clear_cache(Some(id));
                tracing::info!("removed component {} from area {}", id, removed.grid_area);
                OpResponse::ok(
                    format!("Component \"{id}\" removed successfully"),
                    json!({"gridArea": removed.grid_area}),
                )
            }
            None => OpResponse::fail(format!("Component \"{id}\" not found")),
        }
    }

    pub async fn fetch_component_data(&self, id: &str) -> OpResponse {
        // Checked before the status flips to loading, so a component
        // without a config never gets stuck in the loading state.
        {
            let state = self.state.read().await;
            let Some(component) = state.components.get(id) else {
                return OpResponse::fail(format!("Component \"{id}\" not found"));
            };
            if component.data_config.is_none() {
                return OpResponse::fail(format!(
                    "Component \"{id}\" has no dataConfig to fetch from"
                ));
            }
        }

        match self.run_fetch_cycle(id).await {
            CycleResult::Missing => OpResponse::fail(format!("Component \"{id}\" not found")),
            CycleResult::Skipped => OpResponse::fail(format!(
                "Component \"{id}\" has no dataConfig to fetch from"
            )),
            CycleResult::Done { info, errored } => {
                if errored {
                    let error = info
                        .get("error")
                        .map(error_text)
                        .unwrap_or_else(|| "Unknown error".to_string());
                    OpResponse {
                        success: false,
                        message: None,
                        error: Some(error),
                        data: Some(info),
                    }
                } else {
                    OpResponse::ok(
                        format!("Data fetched successfully for component \"{id}\""),
                        info,
                    )
                }
            }
        }
    }

    /// Cached read path used by renderers polling for data. Serves
    /// from the result cache when the component opted in; a component
    /// without a data config just returns its stored data.
    pub async fn get_component_data(&self, id: &str) -> OpResponse {
        let config = {
            let state = self.state.read().await;
            let Some(component) = state.components.get(id) else {
                return OpResponse::fail(format!("Component \"{id}\" not found"));
            };
            match component.data_config.clone() {
                Some(config) => config,
                None => {
                    return OpResponse::ok(
                        format!("Stored data for component \"{id}\""),
                        component.data.clone(),
                    );
                }
            }
        };

        match self.pipeline.fetch_data(id, &config).await {
            Ok(value) => OpResponse::ok(
                format!("Data retrieved for component \"{id}\""),
                value,
            ),
            Err(e) => OpResponse::fail(e.to_string()),
        }
    }

    pub async fn refresh_all_components(&self) -> OpResponse {
        let ids: Vec<String> = {
            let state = self.state.read().await;
            state.components.keys().cloned().collect()
        };

        let results =
            futures::future::join_all(ids.iter().map(|id| self.run_fetch_cycle(id))).await;

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skipped_count = 0;
        for result in &results {
            match result {
                CycleResult::Skipped | CycleResult::Missing => skipped_count += 1,
                CycleResult::Done { errored: true, .. } => error_count += 1,
                CycleResult::Done { .. } => success_count += 1,
            }
        }
        tracing::info!(
            "refreshed {} components: {} ok, {} failed, {} skipped",
            ids.len(),
            success_count,
            error_count,
            skipped_count
        );

        OpResponse::ok(
            format!("Refreshed {} components", ids.len()),
            json!({
                "total": ids.len(),
                "successCount": success_count,
                "errorCount": error_count,
                "skippedCount": skipped_count,
            }),
        )
    }

    pub async fn get_grid_info(&self) -> OpResponse {
        let state = self.state.read().await;
        let components: Vec<Value> = state
            .components
            .values()
            .map(|c| {
                json!({
                    "id": c.id,
                    "type": c.component_type,
                    "gridArea": c.grid_area,
                    "title": c.title,
                })
            })
            .collect();

        OpResponse::ok(
            "Grid information retrieved successfully",
            json!({
                "grid": state.grid,
                "stats": state.grid_stats(),
                "components": components,
            }),
        )
    }

    /// One fetch-and-apply cycle: flip to loading, fetch and transform
    /// off-lock, then commit. A failed cycle records the error but
    /// keeps the component's previous data.
    async fn run_fetch_cycle(&self, id: &str) -> CycleResult {
        let (config, component_type) = {
            let mut state = self.state.write().await;
            let Some(component) = state.components.get_mut(id) else {
                return CycleResult::Missing;
            };
            let Some(config) = component.data_config.clone() else {
                return CycleResult::Skipped;
            };
            component.metadata.fetch_status = FetchStatus::Loading;
            (config, component.component_type)
        };

        let outcome = self.pipeline.fetch_with_trace(id, &config).await;
        let ChainOutcome {
            final_value,
            trace,
            error,
        } = outcome;

        let mut state = self.state.write().await;
        let Some(component) = state.components.get_mut(id) else {
            // Removed while the fetch was in flight
            return CycleResult::Missing;
        };

        let final_data = match (&error, final_value) {
            (None, Some(value)) => Some(match component_type {
                ComponentType::Chart => normalize(value),
                _ => value,
            }),
            _ => None,
        };
        let errored = final_data.is_none();

        match &final_data {
            Some(value) => {
                component.data = value.clone();
                component.metadata.fetch_status = FetchStatus::Success;
                component.metadata.error = None;
                component.metadata.last_fetched_at = Some(now_iso());
            }
            None => {
                component.metadata.fetch_status = FetchStatus::Error;
                let detail = error.clone().unwrap_or_else(|| json!("Unknown error"));
                tracing::warn!("fetch failed for component {}: {}", id, error_text(&detail));
                component.metadata.error = Some(detail);
            }
        }

        let info = json!({
            "queryResponse": trace.raw,
            "finalData": final_data,
            "transform": {
                "afterJs": trace.after_js,
                "afterSql": trace.after_sql,
                "afterNormalize": final_data,
            },
            "jsExecutionTime": trace.js_execution_time,
            "error": error,
        });

        CycleResult::Done { info, errored }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
