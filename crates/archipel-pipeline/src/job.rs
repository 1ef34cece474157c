//! Schedulable jobs.
//!
//! A [`Job`] wraps one closed [`JobKind`] variant with the bookkeeping the
//! scheduler needs: a lock-free state machine and the dispatch sequence
//! number. The owner keeps the only long-lived `Arc<Job>`; the scheduler holds
//! weak references, so dropping the owner's handle makes a queued job stale.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::{ChunkDescriptor, ChunkGenerator, ChunkResult, JobError, Viewer};

/// Generates one chunk and publishes the result to its owner.
pub struct ChunkJob {
    descriptor: ChunkDescriptor,
    generator: Arc<ChunkGenerator>,
    viewer: Arc<Viewer>,
    result_tx: Sender<ChunkResult>,
}

impl ChunkJob {
    /// Create a job and the receiver its single result will arrive on.
    pub fn new(
        descriptor: ChunkDescriptor,
        generator: Arc<ChunkGenerator>,
        viewer: Arc<Viewer>,
    ) -> (Self, Receiver<ChunkResult>) {
        let (result_tx, result_rx) = bounded(1);
        let job = Self {
            descriptor,
            generator,
            viewer,
            result_tx,
        };
        (job, result_rx)
    }

    pub fn descriptor(&self) -> &ChunkDescriptor {
        &self.descriptor
    }

    /// Live distance from the viewer, capped.
    pub fn priority(&self) -> f32 {
        self.descriptor.priority_from(self.viewer.position())
    }

    fn run(&self) -> ChunkResult {
        match self.generator.generate(&self.descriptor) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Chunk at {} failed: {e}", self.descriptor.origin);
                ChunkResult::empty()
            }
        }
    }

    fn publish(&self, result: ChunkResult) {
        // The owner may already have discarded the chunk.
        let _ = self.result_tx.try_send(result);
    }
}

/// Closed set of job variants.
pub enum JobKind {
    Chunk(ChunkJob),
}

/// Output of one job run, matched back to its variant when published.
enum JobOutput {
    Chunk(ChunkResult),
}

impl JobKind {
    fn priority(&self) -> f32 {
        match self {
            Self::Chunk(job) => job.priority(),
        }
    }

    fn validate(&self) -> Result<(), JobError> {
        match self {
            Self::Chunk(job) => job.descriptor.validate(),
        }
    }

    fn run(&self) -> JobOutput {
        match self {
            Self::Chunk(job) => JobOutput::Chunk(job.run()),
        }
    }

    fn abandoned(&self) -> JobOutput {
        match self {
            Self::Chunk(_) => JobOutput::Chunk(ChunkResult::empty()),
        }
    }

    fn publish(&self, output: JobOutput) {
        match (self, output) {
            (Self::Chunk(job), JobOutput::Chunk(result)) => job.publish(result),
        }
    }
}

/// Lifecycle of a job. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    Pending = 0,
    Running = 1,
    Done = 2,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Running,
            _ => Self::Done,
        }
    }
}

/// A unit of scheduled work.
pub struct Job {
    kind: JobKind,
    state: AtomicU8,
    dispatch_seq: OnceLock<u64>,
}

impl Job {
    pub fn new(kind: JobKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            state: AtomicU8::new(JobState::Pending as u8),
            dispatch_seq: OnceLock::new(),
        })
    }

    /// Convenience for the common case: a chunk job plus its result receiver.
    pub fn chunk(
        descriptor: ChunkDescriptor,
        generator: Arc<ChunkGenerator>,
        viewer: Arc<Viewer>,
    ) -> (Arc<Self>, Receiver<ChunkResult>) {
        let (job, rx) = ChunkJob::new(descriptor, generator, viewer);
        (Self::new(JobKind::Chunk(job)), rx)
    }

    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    /// Current priority. Lower values are dispatched first.
    pub fn priority(&self) -> f32 {
        self.kind.priority()
    }

    pub fn validate(&self) -> Result<(), JobError> {
        self.kind.validate()
    }

    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.state() == JobState::Done
    }

    /// Position in the global dispatch order, once dispatched.
    pub fn dispatch_seq(&self) -> Option<u64> {
        self.dispatch_seq.get().copied()
    }

    /// Move `Pending -> Running`. Fails if another dispatch already claimed the job.
    pub(crate) fn claim(&self, seq: u64) -> bool {
        let claimed = self
            .state
            .compare_exchange(
                JobState::Pending as u8,
                JobState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if claimed {
            let _ = self.dispatch_seq.set(seq);
        }
        claimed
    }

    /// Run to completion and publish the output exactly once.
    ///
    /// A panicking job publishes the empty output so its owner discards it.
    pub(crate) fn execute(&self) {
        let output = panic::catch_unwind(AssertUnwindSafe(|| self.kind.run())).unwrap_or_else(|_| {
            tracing::error!("Job panicked, publishing empty result");
            self.kind.abandoned()
        });
        self.finish(output);
    }

    /// Publish the empty output for a claimed job that will never run.
    pub(crate) fn abandon(&self) {
        self.finish(self.kind.abandoned());
    }

    fn finish(&self, output: JobOutput) {
        self.state.store(JobState::Done as u8, Ordering::Release);
        self.kind.publish(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archipel_terrain::{DensitySampler, IslandParams, Region, SamplerTunables, TerrainPreset};
    use glam::Vec3;

    fn chunk_job(origin: Vec3) -> (Arc<Job>, Receiver<ChunkResult>) {
        let island = Arc::new(
            IslandParams::new(
                TerrainPreset::DESERT,
                Region::Sand,
                Vec3::ZERO,
                Vec3::new(50.0, 20.0, 50.0),
                [Vec3::ZERO; 4],
            )
            .unwrap(),
        );
        let generator = Arc::new(ChunkGenerator::marching_cubes(
            DensitySampler::new(1, SamplerTunables::default()),
            5.0,
        ));
        let viewer = Arc::new(Viewer::new(Vec3::ZERO));
        Job::chunk(ChunkDescriptor::new(origin, 4, 4, true, island), generator, viewer)
    }

    #[test]
    fn test_claim_is_exclusive() {
        let (job, _rx) = chunk_job(Vec3::new(300.0, 0.0, 0.0));
        assert_eq!(job.state(), JobState::Pending);
        assert!(job.claim(7));
        assert!(!job.claim(8));
        assert_eq!(job.state(), JobState::Running);
        assert_eq!(job.dispatch_seq(), Some(7));
    }

    #[test]
    fn test_execute_publishes_once() {
        let (job, rx) = chunk_job(Vec3::new(300.0, 0.0, 0.0));
        assert!(job.claim(0));
        job.execute();
        assert!(job.is_done());
        let result = rx.try_recv().unwrap();
        assert!(!result.output.contains_blocks());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_priority_tracks_viewer() {
        let (job, _rx) = chunk_job(Vec3::new(30.0, 40.0, 0.0));
        assert_eq!(job.priority(), 50.0);
        if let JobKind::Chunk(chunk) = job.kind() {
            chunk.viewer.set_position(Vec3::new(30.0, 40.0, 10.0));
        }
        assert_eq!(job.priority(), 10.0);
    }

    #[test]
    fn test_publish_after_owner_dropped_is_silent() {
        let (job, rx) = chunk_job(Vec3::new(300.0, 0.0, 0.0));
        drop(rx);
        assert!(job.claim(0));
        job.execute();
        assert!(job.is_done());
    }
}
