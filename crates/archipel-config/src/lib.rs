//! Configuration system for the archipel terrain generator.
//!
//! Provides runtime-configurable settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    ChunkConfig, Config, DebugConfig, DecorationConfig, SchedulerConfig, TerrainConfig,
    WorldConfig,
};
pub use error::ConfigError;
