//! Headless fly-through of a generated archipelago.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p archipel-demo -- --seed 42 --ticks 1200` to fly
//! east for twenty simulated seconds while islands generate around the viewer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use archipel_config::{CliArgs, Config};
use archipel_terrain::{Region, SurfaceKind, TerrainPreset};
use archipel_world::{World, WorldEvent};
use clap::Parser;
use glam::Vec3;
use tracing::{error, info};

const TICK_SECONDS: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "archipel-demo", about = "Fly through a procedurally generated archipelago")]
struct DemoArgs {
    #[command(flatten)]
    cli: CliArgs,

    /// Number of simulated frames.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Viewer speed in units per second.
    #[arg(long, default_value_t = 40.0)]
    speed: f32,

    /// Spawn a custom island of this preset in front of the viewer.
    #[arg(long)]
    preset: Option<TerrainPreset>,
}

#[derive(Default)]
struct Tally {
    spawned: usize,
    ready: usize,
    discarded: usize,
    completed: usize,
    triangles: usize,
    decorations: usize,
    /// Ready chunks per surface material.
    surfaces: HashMap<SurfaceKind, usize>,
}

impl Tally {
    fn record(&mut self, event: &WorldEvent) {
        match event {
            WorldEvent::IslandSpawned { .. } => self.spawned += 1,
            WorldEvent::ChunkReady {
                surface,
                triangles,
                decorations,
                ..
            } => {
                self.ready += 1;
                *self.surfaces.entry(*surface).or_default() += 1;
                self.triangles += triangles;
                self.decorations += decorations;
            }
            WorldEvent::ChunkDiscarded { .. } => self.discarded += 1,
            WorldEvent::IslandCompleted { .. } => self.completed += 1,
        }
    }
}

fn main() {
    let args = DemoArgs::parse();

    // Resolve config directory
    let config_dir = args
        .cli
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from(".archipel"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args.cli);

    let log_dir = config_dir.join("logs");
    archipel_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let mut world = match World::new(&config) {
        Ok(world) => world,
        Err(e) => {
            error!("Failed to create world: {e}");
            return;
        }
    };

    let mut position = Vec3::ZERO;
    world.set_viewer_position(position);

    if let Some(preset) = args.preset {
        let site = position + Vec3::new(config.world.cell_size / 4.0, 0.0, 0.0);
        match world.spawn_island(site, Region::Green, Some(preset)) {
            Ok(id) => info!("Spawned custom {preset} island {id} at {site}"),
            Err(e) => error!("Failed to spawn custom island: {e}"),
        }
    }

    let mut tally = Tally::default();
    for tick in 0..args.ticks {
        position.x += args.speed * TICK_SECONDS;
        position = world.altitude_correction(position, TICK_SECONDS);
        world.set_viewer_position(position);

        for event in world.tick() {
            tally.record(&event);
        }

        if tick % 120 == 0 {
            let stats = world.stats();
            let current = world
                .current_island()
                .map(|island| {
                    let (done, total) = island.progress();
                    format!("{} ({done}/{total})", island.label())
                })
                .unwrap_or_else(|| "open sky".to_string());
            info!(
                "tick {tick}: viewer {position}, over {current}, {} pending jobs, {} workers",
                stats.scheduler.pending, stats.scheduler.workers
            );
        }
        std::thread::sleep(Duration::from_secs_f32(TICK_SECONDS));
    }

    let stats = world.stats();
    info!(
        "Seed {}: {} islands spawned ({} complete), {} chunks ready, {} discarded, {} triangles, {} decorations",
        world.seed(),
        tally.spawned,
        tally.completed,
        tally.ready,
        tally.discarded,
        tally.triangles,
        tally.decorations
    );
    info!("Ready chunks by surface: {:?}", tally.surfaces);
    info!(
        "{} world cells loaded, {} jobs dispatched, {} of {} chunks created",
        stats.loaded_cells, stats.scheduler.dispatched, stats.chunks_created, stats.chunks
    );
    world.shutdown();
}
