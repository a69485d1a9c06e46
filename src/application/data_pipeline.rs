// Fetch + transform + cache write-through for one component
use crate::application::code_executor::CodeExecutor;
use crate::application::query_engine::TabularQueryEngine;
use crate::application::source_fetcher::SourceFetcher;
use crate::application::transform_chain::{ChainOutcome, TransformChain};
use crate::domain::data_config::DataConfig;
use crate::infrastructure::cache::ResultCache;
use serde_json::Value;
use std::sync::Arc;

pub struct DataPipeline {
    fetcher: Arc<dyn SourceFetcher>,
    executor: Arc<dyn CodeExecutor>,
    query_engine: Arc<dyn TabularQueryEngine>,
    cache: ResultCache,
}

impl DataPipeline {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        executor: Arc<dyn CodeExecutor>,
        query_engine: Arc<dyn TabularQueryEngine>,
    ) -> Self {
        Self {
            fetcher,
            executor,
            query_engine,
            cache: ResultCache::new(),
        }
    }

    /// Traced fetch used by the fetch-and-apply cycle. Always fetches
    /// fresh; on success the final value is written through to the
    /// cache when the component opted in.
    pub async fn fetch_with_trace(&self, component_id: &str, config: &DataConfig) -> ChainOutcome {
        let raw = self.fetcher.fetch_raw(&config.source).await;
        let chain = TransformChain::new(&*self.executor, &*self.query_engine);
        let outcome = chain.run(config.source.kind(), raw, config);

        if outcome.error.is_none()
            && config.cache_enabled()
            && let Some(final_value) = &outcome.final_value
        {
            self.cache.set(component_id, final_value.clone());
        }

        outcome
    }

    /// Plain fetch used by render-side polling: the only entry point
    /// that consults the cache before going to the source.
    pub async fn fetch_data(&self, component_id: &str, config: &DataConfig) -> anyhow::Result<Value> {
        if config.cache_enabled()
            && let Some(hit) = self.cache.get(component_id, config.cache_ttl_ms())
        {
            tracing::debug!("cache hit for component {}", component_id);
            return Ok(hit);
        }

        let outcome = self.fetch_with_trace(component_id, config).await;
        if let Some(error) = outcome.error {
            anyhow::bail!("Error fetching data for component {}: {}", component_id, error);
        }
        outcome
            .final_value
            .ok_or_else(|| anyhow::anyhow!("fetch produced no data for component {}", component_id))
    }

    pub fn clear_cache(&self, component_id: Option<&str>) {
        self.cache.clear(component_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_query::MemoryQueryEngine;
    use crate::infrastructure::script_executor::ScriptExecutor;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        payload: Value,
    }

    #[async_trait]
    impl SourceFetcher for CountingFetcher {
        async fn fetch_raw(&self, _source: &crate::domain::data_config::DataSource) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload.clone()
        }
    }

    fn pipeline_with(payload: Value) -> (DataPipeline, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            payload,
        });
        let pipeline = DataPipeline::new(
            fetcher.clone(),
            Arc::new(ScriptExecutor::default()),
            Arc::new(MemoryQueryEngine),
        );
        (pipeline, fetcher)
    }

    fn cached_config() -> DataConfig {
        serde_json::from_value(json!({
            "source": {"type": "static", "data": [1, 2]},
            "cache": {"enabled": true, "ttl": 60000}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_plain_fetch_consults_cache() {
        let (pipeline, fetcher) = pipeline_with(json!([1, 2]));
        let config = cached_config();

        let first = pipeline.fetch_data("c1", &config).await.unwrap();
        assert_eq!(first, json!([1, 2]));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let second = pipeline.fetch_data("c1", &config).await.unwrap();
        assert_eq!(second, json!([1, 2]));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1, "second read must hit cache");
    }

    #[tokio::test]
    async fn test_traced_fetch_always_goes_to_source() {
        let (pipeline, fetcher) = pipeline_with(json!([1, 2]));
        let config = cached_config();

        pipeline.fetch_with_trace("c1", &config).await;
        pipeline.fetch_with_trace("c1", &config).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        // but it wrote through, so the plain path now hits the cache
        pipeline.fetch_data("c1", &config).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let (pipeline, _) = pipeline_with(json!({"error": "down"}));
        let config = cached_config();

        let outcome = pipeline.fetch_with_trace("c1", &config).await;
        assert!(outcome.error.is_some());
        assert!(pipeline.fetch_data("c1", &config).await.is_err());
    }
}
