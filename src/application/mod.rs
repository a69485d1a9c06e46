// Application layer - Orchestration and business rules
pub mod code_executor;
pub mod dashboard_service;
pub mod data_pipeline;
pub mod normalizer;
pub mod path;
pub mod query_engine;
pub mod response;
pub mod source_fetcher;
pub mod transform_chain;
