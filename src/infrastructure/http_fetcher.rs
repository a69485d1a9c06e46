// HTTP-backed source fetcher: OLAP store, relational proxy, GraphQL
use crate::application::source_fetcher::SourceFetcher;
use crate::domain::data_config::DataSource;
use crate::infrastructure::config::OlapSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::time::Instant;

pub struct HttpSourceFetcher {
    client: reqwest::Client,
    olap: OlapSettings,
    relational_endpoint: Option<String>,
    graphql_endpoint: Option<String>,
}

impl HttpSourceFetcher {
    pub fn new(
        olap: OlapSettings,
        relational_endpoint: Option<String>,
        graphql_endpoint: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            olap: OlapSettings {
                host: olap.host.trim_end_matches('/').to_string(),
                ..olap
            },
            relational_endpoint,
            graphql_endpoint,
        }
    }

    async fn fetch_olap(&self, query: &str, max_rows: Option<u64>, timeout: Option<u64>) -> Value {
        let started = Instant::now();

        let mut final_query = query.trim().to_string();
        if let Some(max) = max_rows
            && max > 0
            && !has_limit_clause(&final_query)
        {
            final_query.push_str(&format!(" LIMIT {}", max));
        }

        match self.execute_olap_query(&final_query, timeout).await {
            Ok(rows) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::debug!(
                    "OLAP query executed in {}ms, returned {} rows",
                    duration_ms,
                    rows.len()
                );
                json!({
                    "success": true,
                    "data": rows,
                    "rowCount": rows.len(),
                    "meta": {"durationMs": duration_ms},
                })
            }
            Err(e) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::error!("OLAP query failed after {}ms: {:#}", duration_ms, e);
                json!({
                    "success": false,
                    "data": [],
                    "rowCount": 0,
                    "error": format!("{:#}", e),
                    "meta": {"durationMs": duration_ms},
                })
            }
        }
    }

    async fn execute_olap_query(&self, query: &str, timeout: Option<u64>) -> Result<Vec<Value>> {
        let mut url = format!(
            "{}/?database={}&default_format=JSONEachRow",
            self.olap.host,
            urlencoding::encode(&self.olap.database)
        );
        if let Some(timeout_ms) = timeout {
            // The store takes a whole-second server-side execution budget
            url.push_str(&format!("&max_execution_time={}", timeout_ms / 1000));
        }

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "text/plain")
            .body(query.to_string());
        if !self.olap.user.is_empty() {
            let password = (!self.olap.password.is_empty()).then_some(self.olap.password.as_str());
            request = request.basic_auth(&self.olap.user, password);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to OLAP store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OLAP query failed with status {}: {}", status, body);
        }

        let text = response
            .text()
            .await
            .context("Failed to read OLAP response body")?;

        // One JSON object per line
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str::<Value>(line).context("Failed to parse OLAP response row")
            })
            .collect()
    }

    async fn fetch_relational(
        &self,
        query: &str,
        params: Option<&Map<String, Value>>,
        schema: Option<&str>,
    ) -> Value {
        let Some(endpoint) = &self.relational_endpoint else {
            return json!({"error": "Relational query endpoint not configured"});
        };

        let body = json!({"query": query, "params": params, "schema": schema});
        let response = match self.client.post(endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return json!({"error": e.to_string()}),
        };

        let status = response.status();
        let result: Value = match response.json().await {
            Ok(value) => value,
            Err(e) => return json!({"error": e.to_string()}),
        };

        if !status.is_success() {
            // Keep whatever partial body the proxy sent alongside the error
            let reason = result
                .get("error")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .unwrap_or_else(|| status.to_string());
            let mut merged = match result {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            merged.insert("error".to_string(), Value::String(reason));
            return Value::Object(merged);
        }

        result
    }

    async fn fetch_graphql(
        &self,
        query: &str,
        variables: Option<&Map<String, Value>>,
        endpoint: Option<&str>,
    ) -> Value {
        let Some(endpoint) = endpoint.or(self.graphql_endpoint.as_deref()) else {
            return json!({"error": "GraphQL endpoint not configured"});
        };

        let body = json!({"query": query, "variables": variables});
        let response = match self.client.post(endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return json!({"error": e.to_string()}),
        };

        if !response.status().is_success() {
            tracing::warn!("GraphQL query failed: {}", response.status());
            return json!({"error": response.status().to_string()});
        }

        let result: Value = match response.json().await {
            Ok(value) => value,
            Err(e) => return json!({"error": e.to_string()}),
        };

        // GraphQL-level errors mean failure regardless of HTTP status
        if let Some(errors) = result.get("errors")
            && !errors.is_null()
        {
            tracing::warn!("GraphQL errors: {}", errors);
            return json!({"error": errors});
        }

        result.get("data").cloned().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch_raw(&self, source: &DataSource) -> Value {
        match source {
            DataSource::SqlOlap {
                query,
                max_rows,
                timeout,
            } => self.fetch_olap(query, *max_rows, *timeout).await,
            DataSource::SqlRelational {
                query,
                params,
                schema,
            } => {
                self.fetch_relational(query, params.as_ref(), schema.as_deref())
                    .await
            }
            DataSource::Graphql {
                query,
                variables,
                endpoint,
            } => {
                self.fetch_graphql(query, variables.as_ref(), endpoint.as_deref())
                    .await
            }
            DataSource::Static { data } => data.clone(),
        }
    }
}

/// Case-insensitive check for an existing `LIMIT <n>` clause.
fn has_limit_clause(query: &str) -> bool {
    let mut tokens = query.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("limit")
            && tokens
                .peek()
                .is_some_and(|next| next.chars().next().is_some_and(|c| c.is_ascii_digit()))
        {
            return true;
        }
    }
    false
}
