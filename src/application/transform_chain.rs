// Ordered transform stages between fetch and normalize
//
// Stage order is fixed: user code first, SQL re-query second. A
// failing stage stops the chain; later stages never run against a
// partial result.
use crate::application::code_executor::CodeExecutor;
use crate::application::query_engine::TabularQueryEngine;
use crate::domain::data_config::DataConfig;
use serde::Serialize;
use serde_json::Value;

/// Per-stage record of intermediate values from one fetch. Stages
/// that did not run are omitted entirely, which distinguishes
/// "skipped" from "ran and produced nothing". Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTrace {
    pub source: String,
    pub raw: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_js: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_sql: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_execution_time: Option<f64>,
}

#[derive(Debug)]
pub struct ChainOutcome {
    pub final_value: Option<Value>,
    pub trace: FetchTrace,
    pub error: Option<Value>,
}

pub struct TransformChain<'a> {
    executor: &'a dyn CodeExecutor,
    query_engine: &'a dyn TabularQueryEngine,
}

impl<'a> TransformChain<'a> {
    pub fn new(executor: &'a dyn CodeExecutor, query_engine: &'a dyn TabularQueryEngine) -> Self {
        Self {
            executor,
            query_engine,
        }
    }

    pub fn run(&self, source_kind: &str, raw: Value, config: &DataConfig) -> ChainOutcome {
        // Source envelopes carry the payload under `data`; bare
        // payloads are transformed as-is.
        let mut payload = match &raw {
            Value::Object(map) if map.contains_key("data") => map["data"].clone(),
            other => other.clone(),
        };

        let mut trace = FetchTrace {
            source: source_kind.to_string(),
            raw,
            after_js: None,
            after_sql: None,
            js_execution_time: None,
        };

        if let Some(js) = &config.js_transform {
            let report = self.executor.execute(&js.code, &payload);
            trace.js_execution_time = Some(report.execution_time_ms);
            match report.result {
                Ok(value) => {
                    payload = value;
                    trace.after_js = Some(payload.clone());
                }
                Err(e) => {
                    return ChainOutcome {
                        final_value: None,
                        trace,
                        error: Some(Value::String(e.to_string())),
                    };
                }
            }
        }

        if let Some(sql) = &config.sql_transform {
            let rows = match &payload {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            match self
                .query_engine
                .evaluate(&sql.query, &rows, sql.params.as_ref())
            {
                Ok(value) => {
                    payload = value;
                    trace.after_sql = Some(payload.clone());
                }
                Err(e) => {
                    return ChainOutcome {
                        final_value: None,
                        trace,
                        error: Some(Value::String(e.to_string())),
                    };
                }
            }
        }

        // A source-level failure rides along in the raw envelope even
        // when the transform stages themselves succeeded.
        let source_error = trace.raw.get("error").filter(|e| !e.is_null()).cloned();

        ChainOutcome {
            final_value: Some(payload),
            trace,
            error: source_error,
        }
    }
}
