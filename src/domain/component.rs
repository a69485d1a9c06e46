// Widget component domain model
use crate::domain::data_config::DataConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Closed set of widget kinds. Adding a variant is a compile error
/// until the normalizer and creation defaults handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    Chart,
    Table,
    StatCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub fetch_status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fetched_at: Option<String>,
}

impl ComponentMetadata {
    pub fn new(created_at: String) -> Self {
        Self {
            created_at,
            updated_at: None,
            fetch_status: FetchStatus::Idle,
            error: None,
            last_fetched_at: None,
        }
    }
}

/// One widget record. `grid_area` must name an area of the current
/// grid and at most one record may occupy an area at a time; the
/// store enforces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub grid_area: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_config: Option<DataConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    pub metadata: ComponentMetadata,
}

/// Default card styling applied on creation. Caller-provided entries
/// override these; stat cards get more padding, charts a minimum height.
pub fn default_style(component_type: ComponentType) -> Map<String, Value> {
    let mut style = Map::new();
    style.insert("backgroundColor".to_string(), json!("#17181C"));
    style.insert("borderColor".to_string(), json!("#2A2C33"));
    style.insert("borderRadius".to_string(), json!("12px"));
    let padding = match component_type {
        ComponentType::StatCard => "20px",
        _ => "16px",
    };
    style.insert("padding".to_string(), json!(padding));
    if component_type == ComponentType::Chart {
        style.insert("minHeight".to_string(), json!("250px"));
    }
    style
}

/// Fill stat-card display defaults under whatever the caller provided.
pub fn default_stat_card_data(data: Value) -> Value {
    let mut map = match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return other,
    };
    map.entry("color".to_string()).or_insert(json!("#FFFFFF"));
    map.entry("icon".to_string())
        .or_insert(json!("lucide:sparkles"));
    Value::Object(map)
}
