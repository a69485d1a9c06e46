// Domain layer - Core dashboard model and invariants
pub mod component;
pub mod dashboard;
pub mod data_config;
pub mod grid;
