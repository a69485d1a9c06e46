// Seam for the SQL-over-arrays re-query stage
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query parse error: {0}")]
    Parse(String),
    #[error("unbound query parameter `{0}`")]
    UnboundParam(String),
}

/// Evaluates a SQL-like query against in-memory rows, with `?` bound
/// to the row set and named `:key` placeholders bound to `params`.
pub trait TabularQueryEngine: Send + Sync {
    fn evaluate(
        &self,
        query: &str,
        rows: &[Value],
        params: Option<&Map<String, Value>>,
    ) -> Result<Value, QueryError>;
}
