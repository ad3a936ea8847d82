//! Chat overlay engine.
//!
//! Consumes parsed chat events, resolves display names, counts posts and
//! keeps emoji images warm for a render surface.

pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod events;
pub mod surface;

pub use config::EngineConfig;
pub use engine::ChatEngine;
pub use events::{ChatEvent, ConfigEvent, EmojiDefinition, EngineInput};
pub use surface::{JsonLinesSurface, RenderSurface};
