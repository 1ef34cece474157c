//! Off-thread chunk generation.
//!
//! A [`ChunkGenerator`] runs the synchronous chain for one chunk: density
//! sampling, smoothing with normal estimation, cell assembly and
//! polygonization. [`Job`]s wrap that work for the [`JobScheduler`], which
//! hands them to an elastic pool of worker threads in priority order. Results
//! travel back to the job's owner over a single-slot channel.

mod descriptor;
mod error;
mod generator;
mod job;
mod scheduler;
mod viewer;
mod worker;

pub use descriptor::{ChunkDescriptor, PRIORITY_CAP};
pub use error::JobError;
pub use generator::{ChunkGenerator, ChunkOutput, ChunkResult, GenerationReport};
pub use job::{ChunkJob, Job, JobKind, JobState};
pub use scheduler::{JobScheduler, SchedulerStats, default_worker_count};
pub use viewer::Viewer;
