// Seam for sandboxed user-code execution in the transform chain
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("syntax error in transform code: {0}")]
    Syntax(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("transform exceeded its {0} ms execution budget")]
    Timeout(u64),
}

/// Outcome of one execution, timed even on failure so traces can
/// report how long a failing transform ran.
#[derive(Debug)]
pub struct ExecReport {
    pub result: Result<Value, ExecError>,
    pub execution_time_ms: f64,
}

/// Executes agent-supplied transform code against a payload under a
/// bounded wall-clock budget. The payload is exposed to the code as
/// `data`; exceeding the budget must surface as an error, not hang.
pub trait CodeExecutor: Send + Sync {
    fn execute(&self, code: &str, input: &Value) -> ExecReport;
}
