//! Top-level driver owning the scheduler, the grid, and every island.

use std::sync::Arc;
use std::time::{Duration, Instant};

use archipel_config::Config;
use archipel_pipeline::{ChunkGenerator, JobScheduler, SchedulerStats, Viewer};
use archipel_terrain::{
    DensitySampler, IslandParams, IslandPlacer, IslandSizing, Region, SamplerTunables,
    SurfaceKind, TerrainPreset, WorldRng,
};
use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::{
    ChunkDims, DecorationPlanner, Island, IslandId, OpenSky, PlacementOracle, WorldError,
    WorldGrid,
};

/// Something that happened during a [`World::tick`].
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    IslandSpawned {
        island: IslandId,
        label: String,
        chunks: usize,
    },
    /// A chunk mesh is ready for the renderer.
    ChunkReady {
        island: IslandId,
        origin: Vec3,
        /// Material the renderer should use for the mesh.
        surface: SurfaceKind,
        triangles: usize,
        decorations: usize,
    },
    ChunkDiscarded {
        island: IslandId,
        origin: Vec3,
    },
    IslandCompleted {
        island: IslandId,
        chunks: usize,
    },
}

/// Counters for progress display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub islands: usize,
    pub islands_done: usize,
    pub chunks: usize,
    pub chunks_created: usize,
    pub loaded_cells: usize,
    pub scheduler: SchedulerStats,
}

pub struct World {
    seed: i32,
    dims: ChunkDims,
    sizing: IslandSizing,
    rng: WorldRng,
    generator: Arc<ChunkGenerator>,
    viewer: Arc<Viewer>,
    scheduler: JobScheduler,
    grid: WorldGrid,
    islands: FxHashMap<IslandId, Island>,
    next_island_id: IslandId,
    planner: DecorationPlanner,
    oracle: Box<dyn PlacementOracle>,
    reprioritize_interval: Duration,
    /// `None` until the first tick, which always reorders the queue.
    last_reprioritize: Option<Instant>,
}

impl World {
    /// Build a world from configuration. A zero seed is replaced by a random one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Config`] when the normalized configuration still
    /// has a non-positive or non-finite size.
    pub fn new(config: &Config) -> Result<Self, WorldError> {
        let config = config.normalized();
        let world = &config.world;
        if !(world.cell_size.is_finite() && world.cell_size > 0.0) {
            return Err(WorldError::Config(format!("cell size {} is not positive", world.cell_size)));
        }
        if !(world.island_size_min.is_finite() && world.island_size_min > 0.0) {
            return Err(WorldError::Config(format!(
                "island size {} is not positive",
                world.island_size_min
            )));
        }
        if !world.iso_level.is_finite() {
            return Err(WorldError::Config("iso level is not finite".to_string()));
        }

        let seed = WorldRng::resolve_seed(world.seed);
        let rng = WorldRng::new(seed);
        let terrain = &config.terrain;
        let tunables = SamplerTunables {
            cave_threshold: terrain.cave_threshold,
            cave_strong_gain: terrain.cave_strong_gain,
            cave_weak_gain: terrain.cave_weak_gain,
            caldera_gain: terrain.caldera_gain,
            swamp_gain: terrain.swamp_gain,
            hill_threshold: terrain.hill_threshold,
            fill_ceiling: terrain.fill_ceiling,
        };
        let generator = Arc::new(ChunkGenerator::marching_cubes(
            DensitySampler::new(seed, tunables),
            world.iso_level,
        ));

        let dims = ChunkDims {
            width: config.chunk.width,
            height: config.chunk.height,
        };
        let sizing = IslandSizing::new(world.island_size_min, world.island_size_max, dims.height);
        let placer = IslandPlacer::new(
            rng,
            world.cell_size,
            world.island_presence_threshold,
            Vec3::new(world.island_size_max, sizing.vertical, world.island_size_max),
        );

        let scheduler = JobScheduler::new(config.scheduler.max_workers as usize);
        tracing::info!(
            "World seed {seed}, chunks {}x{}x{}, up to {} workers",
            dims.width,
            dims.height,
            dims.width,
            scheduler.max_workers()
        );

        Ok(Self {
            seed,
            dims,
            sizing,
            rng,
            generator,
            viewer: Arc::new(Viewer::default()),
            scheduler,
            grid: WorldGrid::new(placer),
            islands: FxHashMap::default(),
            next_island_id: 0,
            planner: DecorationPlanner::new(rng, &config.decoration),
            oracle: Box::new(OpenSky),
            reprioritize_interval: Duration::from_millis(config.scheduler.reprioritize_interval_ms),
            last_reprioritize: None,
        })
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn chunk_dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn viewer_position(&self) -> Vec3 {
        self.viewer.position()
    }

    /// Move the viewer. Job priorities follow immediately.
    pub fn set_viewer_position(&self, position: Vec3) {
        self.viewer.set_position(position);
    }

    /// Replace the scene query used when planning decorations.
    pub fn set_placement_oracle(&mut self, oracle: Box<dyn PlacementOracle>) {
        self.oracle = oracle;
    }

    /// Pull a position drifting above or below the generated layers back
    /// towards them, at up to ten units per second.
    pub fn altitude_correction(&self, position: Vec3, dt: f32) -> Vec3 {
        let size = self.grid.placer().cell_size().y;
        let ceiling = Region::MAX_LAYER as f32 * size + size;
        let floor = Region::MIN_LAYER as f32 * size - size;
        let step = (dt * 10.0).clamp(0.0, 1.0);
        if position.y > ceiling {
            position - Vec3::Y * step
        } else if position.y < floor {
            position + Vec3::Y * step
        } else {
            position
        }
    }

    /// Create an island at `pos` and queue its chunks.
    ///
    /// Passing a `preset` overrides the seeded choice, which is how custom
    /// islands are placed for debugging.
    pub fn spawn_island(
        &mut self,
        pos: Vec3,
        region: Region,
        preset: Option<TerrainPreset>,
    ) -> Result<IslandId, WorldError> {
        let mut events = Vec::new();
        self.spawn_island_inner(pos, region, preset, &mut events)
    }

    fn spawn_island_inner(
        &mut self,
        pos: Vec3,
        region: Region,
        preset: Option<TerrainPreset>,
        events: &mut Vec<WorldEvent>,
    ) -> Result<IslandId, WorldError> {
        let params = IslandParams::derive(&self.rng, pos, region, preset, self.sizing)?;
        let id = self.next_island_id;
        self.next_island_id += 1;

        let mut island = Island::new(id, params, self.dims, &self.generator, &self.viewer);
        let queued = island.submit(&mut self.scheduler);
        tracing::info!("Created island {} in {region} with {queued} chunks", island.label());
        events.push(WorldEvent::IslandSpawned {
            island: id,
            label: island.label(),
            chunks: queued,
        });
        self.islands.insert(id, island);
        Ok(id)
    }

    /// One update cycle. Never blocks on generation.
    pub fn tick(&mut self) -> Vec<WorldEvent> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        for site in self.grid.update(self.viewer.position()) {
            match self.spawn_island_inner(site.position, site.region, None, &mut events) {
                Ok(id) => self.grid.attach_island(site.cell, id),
                Err(e) => tracing::warn!("Skipping island at {}: {e}", site.position),
            }
        }

        let due = self
            .last_reprioritize
            .is_none_or(|last| now.saturating_duration_since(last) >= self.reprioritize_interval);
        if due {
            self.scheduler.reprioritize();
            self.last_reprioritize = Some(now);
        }
        self.scheduler.tick();

        for island in self.islands.values_mut() {
            island.update(&self.planner, self.oracle.as_ref(), &mut events);
        }
        events
    }

    pub fn island(&self, id: IslandId) -> Option<&Island> {
        self.islands.get(&id)
    }

    pub fn island_mut(&mut self, id: IslandId) -> Option<&mut Island> {
        self.islands.get_mut(&id)
    }

    pub fn islands(&self) -> impl Iterator<Item = &Island> {
        self.islands.values()
    }

    /// Island of the cell the viewer is in, if any.
    pub fn current_island(&self) -> Option<&Island> {
        self.grid
            .current()
            .and_then(|cell| cell.island)
            .and_then(|id| self.islands.get(&id))
    }

    /// Time of the last queue reorder by viewer distance.
    pub fn last_reprioritize(&self) -> Option<Instant> {
        self.last_reprioritize
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn stats(&self) -> WorldStats {
        let mut stats = WorldStats {
            islands: self.islands.len(),
            loaded_cells: self.grid.loaded_len(),
            scheduler: self.scheduler.stats(),
            ..WorldStats::default()
        };
        for island in self.islands.values() {
            let (finished, total) = island.progress();
            stats.chunks += total;
            stats.chunks_created += finished;
            if island.is_done() {
                stats.islands_done += 1;
            }
        }
        stats
    }

    /// Stop all workers. Jobs already running finish first.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }
}
