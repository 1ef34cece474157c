//! Island lifecycle: chunk layout, polling, and completion.

use std::sync::Arc;

use archipel_pipeline::{ChunkDescriptor, ChunkGenerator, JobScheduler, Viewer};
use archipel_terrain::IslandParams;
use glam::Vec3;

use crate::{ChunkEntity, ChunkState, Decoration, DecorationPlanner, PlacementOracle, WorldEvent};

pub type IslandId = u32;

/// Chunk edge lengths in voxels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDims {
    pub width: u32,
    pub height: u32,
}

/// Chunk origins covering an island, relative to its center.
///
/// Upper chunks (`true`) span `[0, height)` above the center, lower chunks
/// `[-height, 0)`. The horizontal range reaches one chunk past the island
/// radius on each side and is snapped to the chunk grid. Zero chunk dims or a
/// non-finite size yield an empty layout.
pub fn chunk_layout(size: Vec3, dims: ChunkDims) -> Vec<(Vec3, bool)> {
    if dims.width == 0 || dims.height == 0 || !size.is_finite() {
        return Vec::new();
    }
    let w = dims.width as f32;
    let h = dims.height as f32;
    let start = Vec3::new(-size.x / 2.0 - w, 0.0, -size.z / 2.0 - w);
    let end = Vec3::new(size.x / 2.0 + w, 0.0, size.z / 2.0 + w);

    let mut layout = Vec::new();
    for half in 0..2 {
        let upper = half == 0;
        let mut x = start.x;
        while x < end.x {
            let mut z = start.z;
            while z < end.z {
                let local = Vec3::new(x, -h * half as f32, z);
                let snapped = Vec3::new(
                    (local.x / w).floor() * w,
                    (local.y / h).floor() * h,
                    (local.z / w).floor() * w,
                );
                layout.push((snapped, upper));
                z += w;
            }
            x += w;
        }
    }
    layout
}

/// An island and the chunks generating it.
pub struct Island {
    id: IslandId,
    params: Arc<IslandParams>,
    chunks: Vec<ChunkEntity>,
    decorations: Vec<Decoration>,
    /// Chunks not discarded as empty.
    num_chunks: usize,
    num_finished: usize,
    done: bool,
}

impl Island {
    /// Lay out the island's chunks and create their jobs. Nothing is queued yet.
    pub fn new(
        id: IslandId,
        params: IslandParams,
        dims: ChunkDims,
        generator: &Arc<ChunkGenerator>,
        viewer: &Arc<Viewer>,
    ) -> Self {
        let params = Arc::new(params);
        let chunks: Vec<ChunkEntity> = chunk_layout(params.size, dims)
            .into_iter()
            .map(|(local, upper)| {
                let descriptor = ChunkDescriptor::new(
                    local + params.center,
                    dims.width,
                    dims.height,
                    upper,
                    params.clone(),
                );
                ChunkEntity::new(descriptor, generator.clone(), viewer.clone())
            })
            .collect();

        Self {
            id,
            num_chunks: chunks.len(),
            params,
            chunks,
            decorations: Vec::new(),
            num_finished: 0,
            done: false,
        }
    }

    /// Queue every chunk job. Returns how many were accepted.
    pub fn submit(&mut self, scheduler: &mut JobScheduler) -> usize {
        self.chunks
            .iter_mut()
            .filter_map(|chunk| chunk.submit(scheduler).ok())
            .count()
    }

    /// Poll chunks, drop empty ones, and detect completion.
    ///
    /// Newly created chunks get their decorations planned. Events are pushed
    /// onto `events`.
    pub fn update(
        &mut self,
        planner: &DecorationPlanner,
        oracle: &dyn PlacementOracle,
        events: &mut Vec<WorldEvent>,
    ) {
        if self.done {
            return;
        }

        let budget = self.params.preset.decoration_budget;
        let set = self.params.preset.decoration_set();
        for chunk in &mut self.chunks {
            match chunk.poll() {
                Some(ChunkState::Created) => {
                    let (triangles, planned) = match chunk.mesh() {
                        Some(mesh) => (
                            mesh.triangle_count(),
                            planner.plan(mesh, chunk.origin(), budget, set, oracle, &self.decorations),
                        ),
                        None => (0, Vec::new()),
                    };
                    events.push(WorldEvent::ChunkReady {
                        island: self.id,
                        origin: chunk.origin(),
                        surface: self.params.preset.surface(),
                        triangles,
                        decorations: planned.len(),
                    });
                    self.decorations.extend(planned);
                }
                Some(ChunkState::ToDelete) => {
                    tracing::trace!("Discarding empty chunk at {}", chunk.origin());
                    events.push(WorldEvent::ChunkDiscarded {
                        island: self.id,
                        origin: chunk.origin(),
                    });
                }
                Some(ChunkState::Pending) | None => {}
            }
        }

        // Dropping a discarded chunk drops its job, so a still-queued job goes stale.
        self.chunks.retain(|chunk| chunk.state() != ChunkState::ToDelete);
        self.num_chunks = self.chunks.len();
        self.num_finished = self.chunks.iter().filter(|c| c.is_created()).count();

        if self.num_chunks != 0 && self.num_chunks == self.num_finished {
            self.done = true;
            tracing::info!(
                "{} is done: {} chunks, {} decorations",
                self.params.label(),
                self.num_chunks,
                self.decorations.len()
            );
            events.push(WorldEvent::IslandCompleted {
                island: self.id,
                chunks: self.num_chunks,
            });
        }
    }

    pub fn id(&self) -> IslandId {
        self.id
    }

    pub fn params(&self) -> &Arc<IslandParams> {
        &self.params
    }

    pub fn label(&self) -> String {
        self.params.label()
    }

    pub fn chunks(&self) -> &[ChunkEntity] {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut [ChunkEntity] {
        &mut self.chunks
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// `(finished, remaining)` chunk counts, for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (self.num_finished, self.num_chunks)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Every chunk was discarded; the island has no geometry.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use archipel_config::DecorationConfig;
    use archipel_terrain::{
        DensitySampler, Region, SamplerTunables, SurfaceKind, TerrainPreset, WorldRng,
    };

    use crate::OpenSky;

    #[test]
    fn test_layout_covers_island_on_chunk_grid() {
        let dims = ChunkDims {
            width: 20,
            height: 20,
        };
        let layout = chunk_layout(Vec3::new(40.0, 40.0, 40.0), dims);
        assert_eq!(layout.len(), 4 * 4 * 2);

        let upper: Vec<_> = layout.iter().filter(|(_, up)| *up).collect();
        assert_eq!(upper.len(), 16);
        assert!(upper.iter().all(|(p, _)| p.y == 0.0));
        assert!(layout.iter().filter(|(_, up)| !*up).all(|(p, _)| p.y == -20.0));
        for (p, _) in &layout {
            assert_eq!(p.x % 20.0, 0.0);
            assert_eq!(p.z % 20.0, 0.0);
            assert!(p.x >= -40.0 && p.x < 40.0);
        }
    }

    #[test]
    fn test_layout_snaps_odd_sizes() {
        let dims = ChunkDims {
            width: 32,
            height: 40,
        };
        let layout = chunk_layout(Vec3::new(60.0, 80.0, 60.0), dims);
        let zs: Vec<f32> = layout.iter().take(4).map(|(p, _)| p.z).collect();
        assert_eq!(zs, vec![-64.0, -32.0, 0.0, 32.0]);
        assert_eq!(layout.len(), 32);
    }

    #[test]
    fn test_layout_of_degenerate_input_is_empty() {
        let size = Vec3::new(60.0, 80.0, 60.0);
        let flat = ChunkDims {
            width: 0,
            height: 40,
        };
        assert!(chunk_layout(size, flat).is_empty());
        let thin = ChunkDims {
            width: 32,
            height: 0,
        };
        assert!(chunk_layout(size, thin).is_empty());
        let dims = ChunkDims {
            width: 32,
            height: 40,
        };
        assert!(chunk_layout(Vec3::splat(f32::INFINITY), dims).is_empty());
    }

    #[test]
    fn test_island_completes_and_discards_empty_chunks() {
        let params = IslandParams::new(
            TerrainPreset::GREENLAND,
            Region::Green,
            Vec3::ZERO,
            Vec3::new(60.0, 80.0, 60.0),
            [
                Vec3::new(311.0, 4021.0, 77.0),
                Vec3::new(9120.0, 15.0, 530.0),
                Vec3::new(48.0, 650.0, 7001.0),
                Vec3::new(2500.0, 2500.0, 12.0),
            ],
        )
        .unwrap();
        let generator = Arc::new(ChunkGenerator::marching_cubes(
            DensitySampler::new(77, SamplerTunables::default()),
            5.0,
        ));
        let viewer = Arc::new(Viewer::default());
        let dims = ChunkDims {
            width: 32,
            height: 40,
        };
        let mut island = Island::new(7, params, dims, &generator, &viewer);
        let mut scheduler = JobScheduler::new(4);
        assert_eq!(island.submit(&mut scheduler), 32);
        assert_eq!(island.progress(), (0, 32));

        let planner = DecorationPlanner::new(WorldRng::new(77), &DecorationConfig::default());
        let mut events = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(120);
        while !island.is_done() && Instant::now() < deadline {
            scheduler.tick();
            island.update(&planner, &OpenSky, &mut events);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(island.is_done(), "island never completed");

        let ready = events
            .iter()
            .filter(|e| matches!(e, WorldEvent::ChunkReady { island: 7, .. }))
            .count();
        assert!(events.iter().all(|e| match e {
            WorldEvent::ChunkReady { surface, .. } => *surface == SurfaceKind::Grass,
            _ => true,
        }));
        let discarded = events
            .iter()
            .filter(|e| matches!(e, WorldEvent::ChunkDiscarded { island: 7, .. }))
            .count();
        assert_eq!(ready + discarded, 32);
        assert!(discarded > 0, "corner chunks lie outside the island");
        assert_eq!(island.progress(), (ready, ready));
        assert!(matches!(
            events.last(),
            Some(WorldEvent::IslandCompleted { island: 7, chunks }) if *chunks == ready
        ));
        assert!(island.decorations().len() <= 2 * ready);

        // Completed islands ignore further updates.
        let before = events.len();
        island.update(&planner, &OpenSky, &mut events);
        assert_eq!(events.len(), before);
    }
}
