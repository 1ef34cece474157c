//! Owner side of one chunk's generation job.

use std::sync::Arc;

use archipel_mesh::MeshBuffer;
use archipel_pipeline::{
    ChunkDescriptor, ChunkGenerator, ChunkOutput, ChunkResult, GenerationReport, Job, JobError,
    JobScheduler, Viewer,
};
use crossbeam_channel::{Receiver, TryRecvError};
use glam::Vec3;

/// Lifecycle of a chunk entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Waiting for its job.
    Pending,
    /// Mesh received.
    Created,
    /// The job found no geometry; the chunk should be removed.
    ToDelete,
}

/// A chunk of an island, holding the only strong reference to its job.
pub struct ChunkEntity {
    origin: Vec3,
    upper: bool,
    state: ChunkState,
    job: Option<Arc<Job>>,
    result_rx: Receiver<ChunkResult>,
    mesh: Option<MeshBuffer>,
    report: Option<GenerationReport>,
}

impl ChunkEntity {
    pub fn new(
        descriptor: ChunkDescriptor,
        generator: Arc<ChunkGenerator>,
        viewer: Arc<Viewer>,
    ) -> Self {
        let origin = descriptor.origin;
        let upper = descriptor.upper;
        let (job, result_rx) = Job::chunk(descriptor, generator, viewer);
        Self {
            origin,
            upper,
            state: ChunkState::Pending,
            job: Some(job),
            result_rx,
            mesh: None,
            report: None,
        }
    }

    /// Queue the chunk's job. A refused job flags the chunk for deletion.
    pub fn submit(&mut self, scheduler: &mut JobScheduler) -> Result<(), JobError> {
        let Some(job) = self.job.as_ref() else {
            return Ok(());
        };
        if let Err(e) = scheduler.submit(job) {
            self.state = ChunkState::ToDelete;
            self.job = None;
            return Err(e);
        }
        Ok(())
    }

    /// Check for the job's result.
    ///
    /// Returns the new state when this call moved the chunk out of
    /// [`ChunkState::Pending`], `None` otherwise.
    pub fn poll(&mut self) -> Option<ChunkState> {
        if self.state != ChunkState::Pending {
            return None;
        }
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.job = None;
                self.report = Some(result.report);
                self.state = match result.output {
                    ChunkOutput::Mesh(mesh) => {
                        self.mesh = Some(mesh);
                        ChunkState::Created
                    }
                    ChunkOutput::Empty => ChunkState::ToDelete,
                };
                Some(self.state)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.job = None;
                self.state = ChunkState::ToDelete;
                Some(self.state)
            }
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn is_upper(&self) -> bool {
        self.upper
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn is_created(&self) -> bool {
        self.state == ChunkState::Created
    }

    pub fn mesh(&self) -> Option<&MeshBuffer> {
        self.mesh.as_ref()
    }

    /// Hand the mesh to a renderer, leaving the chunk without one.
    pub fn take_mesh(&mut self) -> Option<MeshBuffer> {
        self.mesh.take()
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        self.report.as_ref()
    }

    pub fn job(&self) -> Option<&Arc<Job>> {
        self.job.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use archipel_terrain::{DensitySampler, IslandParams, Region, SamplerTunables, TerrainPreset};

    fn island() -> Arc<IslandParams> {
        Arc::new(
            IslandParams::new(
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
            .unwrap(),
        )
    }

    fn entity(origin: Vec3, width: u32, height: u32) -> ChunkEntity {
        let generator = Arc::new(ChunkGenerator::marching_cubes(
            DensitySampler::new(77, SamplerTunables::default()),
            5.0,
        ));
        ChunkEntity::new(
            ChunkDescriptor::new(origin, width, height, true, island()),
            generator,
            Arc::new(Viewer::default()),
        )
    }

    fn run_until_settled(chunk: &mut ChunkEntity, scheduler: &mut JobScheduler) -> Option<ChunkState> {
        let deadline = Instant::now() + Duration::from_secs(60);
        while Instant::now() < deadline {
            scheduler.tick();
            if let Some(state) = chunk.poll() {
                return Some(state);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_empty_chunk_is_flagged_for_deletion() {
        let mut scheduler = JobScheduler::new(1);
        let mut chunk = entity(Vec3::new(900.0, 0.0, 900.0), 8, 8);
        chunk.submit(&mut scheduler).unwrap();

        assert_eq!(run_until_settled(&mut chunk, &mut scheduler), Some(ChunkState::ToDelete));
        assert!(chunk.mesh().is_none());
        assert!(chunk.job().is_none());
        assert_eq!(chunk.report().map(|r| r.cells), Some(0));
        assert_eq!(chunk.poll(), None);
    }

    #[test]
    fn test_island_chunk_is_created_with_mesh() {
        let mut scheduler = JobScheduler::new(1);
        let mut chunk = entity(Vec3::new(-16.0, 0.0, -16.0), 32, 40);
        chunk.submit(&mut scheduler).unwrap();

        assert_eq!(run_until_settled(&mut chunk, &mut scheduler), Some(ChunkState::Created));
        assert!(chunk.is_created());
        assert!(chunk.mesh().is_some_and(|m| m.is_consistent() && !m.is_empty()));
        assert!(chunk.take_mesh().is_some());
        assert!(chunk.mesh().is_none());
    }

    #[test]
    fn test_refused_submission_marks_chunk_for_deletion() {
        let mut scheduler = JobScheduler::new(1);
        let mut chunk = entity(Vec3::ZERO, 0, 8);
        assert!(chunk.submit(&mut scheduler).is_err());
        assert_eq!(chunk.state(), ChunkState::ToDelete);
        assert_eq!(chunk.poll(), None);
    }
}
