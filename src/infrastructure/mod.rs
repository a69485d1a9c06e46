// Infrastructure layer - External dependencies and adapters
pub mod cache;
pub mod config;
pub mod http_fetcher;
pub mod memory_query;
pub mod script_executor;
