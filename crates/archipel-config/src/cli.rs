//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Generator command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "archipel", about = "Procedural island terrain generator")]
pub struct CliArgs {
    /// World seed (0 picks one at startup).
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i32>,

    /// Maximum number of worker threads.
    #[arg(long)]
    pub max_workers: Option<u32>,

    /// Chunk width in voxels.
    #[arg(long)]
    pub chunk_width: Option<u32>,

    /// Chunk height in voxels.
    #[arg(long)]
    pub chunk_height: Option<u32>,

    /// Isosurface threshold.
    #[arg(long)]
    pub iso_level: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(workers) = args.max_workers {
            self.scheduler.max_workers = workers;
        }
        if let Some(w) = args.chunk_width {
            self.chunk.width = w;
        }
        if let Some(h) = args.chunk_height {
            self.chunk.height = h;
        }
        if let Some(iso) = args.iso_level {
            self.world.iso_level = iso;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(99),
            chunk_width: Some(16),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.seed, 99);
        assert_eq!(config.chunk.width, 16);
        // Non-overridden fields retain defaults
        assert_eq!(config.chunk.height, 40);
        assert_eq!(config.scheduler.max_workers, 4);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "archipel",
            "--seed=-5",
            "--max-workers",
            "2",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.seed, Some(-5));
        assert_eq!(args.max_workers, Some(2));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}
