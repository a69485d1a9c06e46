// Data source and transform configuration for a component
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a component's data comes from. The union is closed: an
/// unknown source kind cannot exist past deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSource {
    #[serde(rename_all = "camelCase")]
    SqlOlap {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_rows: Option<u64>,
        /// Execution budget in milliseconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    SqlRelational {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<Map<String, Value>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Graphql {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        variables: Option<Map<String, Value>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
    Static { data: Value },
}

impl DataSource {
    /// Tag name used in fetch traces.
    pub fn kind(&self) -> &'static str {
        match self {
            DataSource::SqlOlap { .. } => "sql_olap",
            DataSource::SqlRelational { .. } => "sql_relational",
            DataSource::Graphql { .. } => "graphql",
            DataSource::Static { .. } => "static",
        }
    }
}

/// User code run against the fetched payload. The code receives the
/// payload as `data` and its final expression is the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsTransform {
    pub code: String,
}

/// SQL-over-arrays re-query applied after the code stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlTransform {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePolicy {
    pub enabled: bool,
    /// Time to live in milliseconds. Defaults to 60 000 when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_transform: Option<JsTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_transform: Option<SqlTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CachePolicy>,
}

impl DataConfig {
    pub fn cache_enabled(&self) -> bool {
        self.cache.as_ref().is_some_and(|c| c.enabled)
    }

    pub fn cache_ttl_ms(&self) -> u64 {
        self.cache
            .as_ref()
            .and_then(|c| c.ttl)
            .unwrap_or(DEFAULT_CACHE_TTL_MS)
    }
}

/// Convenience shorthand accepted by component creation: a bare OLAP
/// query plus optional transforms, expanded into a full DataConfig.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryShorthand {
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_transform: Option<String>,
}

impl QueryShorthand {
    pub fn into_data_config(self) -> DataConfig {
        DataConfig {
            source: DataSource::SqlOlap {
                query: self.sql,
                max_rows: None,
                timeout: None,
            },
            js_transform: self.js_code.map(|code| JsTransform { code }),
            sql_transform: self.sql_transform.map(|query| SqlTransform {
                query,
                params: None,
            }),
            cache: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_source_tagged_parsing() {
        let source: DataSource = serde_json::from_value(json!({
            "type": "sql_olap",
            "query": "SELECT 1",
            "maxRows": 100
        }))
        .unwrap();
        match source {
            DataSource::SqlOlap { query, max_rows, timeout } => {
                assert_eq!(query, "SELECT 1");
                assert_eq!(max_rows, Some(100));
                assert!(timeout.is_none());
            }
            other => panic!("unexpected source: {:?}", other),
        }

        let source: DataSource =
            serde_json::from_value(json!({"type": "static", "data": [1, 2, 3]})).unwrap();
        assert_eq!(source.kind(), "static");

        assert!(serde_json::from_value::<DataSource>(json!({"type": "mystery"})).is_err());
    }

    #[test]
    fn test_cache_ttl_default() {
        let config: DataConfig = serde_json::from_value(json!({
            "source": {"type": "static", "data": null},
            "cache": {"enabled": true}
        }))
        .unwrap();
        assert!(config.cache_enabled());
        assert_eq!(config.cache_ttl_ms(), DEFAULT_CACHE_TTL_MS);

        let config: DataConfig = serde_json::from_value(json!({
            "source": {"type": "static", "data": null}
        }))
        .unwrap();
        assert!(!config.cache_enabled());
    }

    #[test]
    fn test_query_shorthand_expansion() {
        let shorthand: QueryShorthand = serde_json::from_value(json!({
            "sql": "SELECT region, total FROM sales",
            "jsCode": "data"
        }))
        .unwrap();
        let config = shorthand.into_data_config();
        assert_eq!(config.source.kind(), "sql_olap");
        assert!(config.js_transform.is_some());
        assert!(config.sql_transform.is_none());
    }
}
