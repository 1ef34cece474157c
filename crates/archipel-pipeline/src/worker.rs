//! Long-lived worker threads.
//!
//! A worker blocks on two channels: its job inbox and its stop signal. After
//! each job it reports its id on the shared ready channel, which is how it
//! asks the scheduler for more work. Stop is only observed between jobs.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded, select};

use crate::{Job, JobError};

pub(crate) type WorkerId = usize;

/// Scheduler-side handle of one worker.
pub(crate) struct WorkerHandle {
    job_tx: Sender<Arc<Job>>,
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Hand a claimed job to the worker. Returns the job if the worker is gone.
    pub(crate) fn assign(&self, job: Arc<Job>) -> Result<(), Arc<Job>> {
        self.job_tx.send(job).map_err(|e| e.into_inner())
    }

    /// Signal the worker to exit after any assigned job and return its thread.
    pub(crate) fn stop(self) -> JoinHandle<()> {
        let _ = self.stop_tx.send(());
        self.thread
    }
}

/// The loop run on every worker thread.
pub(crate) struct WorkerExecutor {
    id: WorkerId,
    jobs: Receiver<Arc<Job>>,
    stop: Receiver<()>,
    ready: Sender<WorkerId>,
}

impl WorkerExecutor {
    /// Spawn a named worker thread.
    pub(crate) fn spawn(id: WorkerId, ready: Sender<WorkerId>) -> Result<WorkerHandle, JobError> {
        let (job_tx, jobs) = bounded(1);
        let (stop_tx, stop) = bounded(1);
        let executor = Self {
            id,
            jobs,
            stop,
            ready,
        };

        let thread = std::thread::Builder::new()
            .name(format!("terrain-worker-{id}"))
            .spawn(move || executor.run())
            .map_err(JobError::WorkerSpawn)?;

        tracing::debug!("Spawned terrain worker {id}");
        Ok(WorkerHandle {
            job_tx,
            stop_tx,
            thread,
        })
    }

    fn run(self) {
        loop {
            select! {
                recv(self.stop) -> _ => {
                    // A job assigned just before the stop still runs.
                    if let Ok(job) = self.jobs.try_recv() {
                        job.execute();
                    }
                    break;
                }
                recv(self.jobs) -> msg => match msg {
                    Ok(job) => {
                        job.execute();
                        drop(job);
                        if self.ready.send(self.id).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
            }
        }
        tracing::debug!("Terrain worker {} exiting", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use archipel_terrain::{DensitySampler, IslandParams, Region, SamplerTunables, TerrainPreset};
    use glam::Vec3;

    use crate::{ChunkDescriptor, ChunkGenerator, Viewer};

    fn far_job() -> (Arc<Job>, Receiver<crate::ChunkResult>) {
        let island = Arc::new(
            IslandParams::new(
                TerrainPreset::GREENLAND,
                Region::Green,
                Vec3::ZERO,
                Vec3::new(40.0, 20.0, 40.0),
                [Vec3::ZERO; 4],
            )
            .unwrap(),
        );
        let generator = Arc::new(ChunkGenerator::marching_cubes(
            DensitySampler::new(3, SamplerTunables::default()),
            5.0,
        ));
        Job::chunk(
            ChunkDescriptor::new(Vec3::new(900.0, 0.0, 0.0), 4, 4, true, island),
            generator,
            Arc::new(Viewer::default()),
        )
    }

    #[test]
    fn test_worker_runs_job_and_reports_ready() {
        let (ready_tx, ready_rx) = crossbeam_channel::unbounded();
        let handle = WorkerExecutor::spawn(3, ready_tx).unwrap();

        let (job, result_rx) = far_job();
        assert!(job.claim(0));
        assert!(handle.assign(job.clone()).is_ok());

        let result = result_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(!result.output.contains_blocks());
        assert_eq!(ready_rx.recv_timeout(Duration::from_secs(10)).unwrap(), 3);
        assert!(job.is_done());

        let thread = handle.stop();
        let deadline = Instant::now() + Duration::from_secs(10);
        while !thread.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(thread.is_finished());
        assert_eq!(thread.thread().name(), Some("terrain-worker-3"));
        thread.join().unwrap();
    }

    #[test]
    fn test_stop_drains_assigned_job() {
        let (ready_tx, _ready_rx) = crossbeam_channel::unbounded();
        let handle = WorkerExecutor::spawn(0, ready_tx).unwrap();

        let (job, result_rx) = far_job();
        assert!(job.claim(0));
        assert!(handle.assign(job.clone()).is_ok());
        handle.stop().join().unwrap();

        assert!(job.is_done());
        assert!(result_rx.try_recv().is_ok());
    }
}
