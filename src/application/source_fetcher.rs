// Seam for raw data retrieval from a component's source
use crate::domain::data_config::DataSource;
use async_trait::async_trait;
use serde_json::Value;

/// Retrieves raw data for one source. Caller-detectable failures
/// (network, HTTP status, malformed bodies) come back as `{error}`
/// values inside the returned JSON, never as a panic or Err; the
/// `DataSource` enum is closed, so there is no unknown-kind case.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_raw(&self, source: &DataSource) -> Value;
}
