// Sandboxed transform execution on an embedded Rhai engine
use crate::application::code_executor::{CodeExecutor, ExecError, ExecReport};
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use serde_json::Value;
use std::time::Instant;

const DEFAULT_BUDGET_MS: u64 = 2_000;

/// Runs user transform code in a fresh engine per call, so scripts
/// cannot leak state into each other. The engine has no filesystem,
/// network, or process access; the only input is the `data` variable.
pub struct ScriptExecutor {
    budget_ms: u64,
}

impl ScriptExecutor {
    pub fn new(budget_ms: u64) -> Self {
        Self { budget_ms }
    }

    fn run(&self, code: &str, input: &Value) -> Result<Value, ExecError> {
        let mut engine = Engine::new();

        let deadline = Instant::now() + std::time::Duration::from_millis(self.budget_ms);
        engine.on_progress(move |_| {
            if Instant::now() >= deadline {
                Some(Dynamic::UNIT)
            } else {
                None
            }
        });

        let ast = engine
            .compile(code)
            .map_err(|e| ExecError::Syntax(e.to_string()))?;

        let data = rhai::serde::to_dynamic(input)
            .map_err(|e| ExecError::Runtime(e.to_string()))?;
        let mut scope = Scope::new();
        scope.push_dynamic("data", data);

        let result = engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|e| match *e {
                EvalAltResult::ErrorTerminated(..) => ExecError::Timeout(self.budget_ms),
                other => ExecError::Runtime(other.to_string()),
            })?;

        rhai::serde::from_dynamic::<Value>(&result)
            .map_err(|e| ExecError::Runtime(e.to_string()))
    }
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_MS)
    }
}

impl CodeExecutor for ScriptExecutor {
    fn execute(&self, code: &str, input: &Value) -> ExecReport {
        let started = Instant::now();
        let result = self.run(code, input);
        let execution_time_ms = started.elapsed().as_secs_f64() * 1_000.0;

        if let Err(e) = &result {
            tracing::warn!("transform execution failed: {}", e);
        }

        ExecReport {
            result,
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expression_over_input() {
        let report = ScriptExecutor::default().execute("data.len()", &json!([1, 2, 3]));
        assert_eq!(report.result.unwrap(), json!(3));
        assert!(report.execution_time_ms >= 0.0);
    }

    #[test]
    fn test_object_field_access() {
        let report = ScriptExecutor::default().execute("data.total + 1", &json!({"total": 41}));
        assert_eq!(report.result.unwrap(), json!(42));
    }

    #[test]
    fn test_reshaping_script() {
        let code = r#"
            let out = [];
            for row in data {
                out.push(#{ name: row.city, value: row.count * 2 });
            }
            out
        "#;
        let input = json!([{"city": "Oslo", "count": 3}, {"city": "Bergen", "count": 5}]);
        let report = ScriptExecutor::default().execute(code, &input);
        assert_eq!(
            report.result.unwrap(),
            json!([{"name": "Oslo", "value": 6}, {"name": "Bergen", "value": 10}])
        );
    }

    #[test]
    fn test_syntax_error() {
        let report = ScriptExecutor::default().execute("let = ;", &Value::Null);
        assert!(matches!(report.result, Err(ExecError::Syntax(_))));
    }

    #[test]
    fn test_runtime_error() {
        let report = ScriptExecutor::default().execute("no_such_fn()", &Value::Null);
        assert!(matches!(report.result, Err(ExecError::Runtime(_))));
    }

    #[test]
    fn test_infinite_loop_hits_budget() {
        let report = ScriptExecutor::new(50).execute("loop { }", &Value::Null);
        assert!(matches!(report.result, Err(ExecError::Timeout(50))));
        assert!(report.execution_time_ms >= 50.0);
    }
}
