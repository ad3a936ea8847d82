//! Configuration management: defaults, validation, loading from the environment.

pub mod defaults;
pub mod engine_config;
pub mod validation;

pub use engine_config::EngineConfig;
