use archipel_terrain::TerrainError;

/// Errors raised while submitting or running jobs.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid job descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("scheduler has been shut down")]
    SchedulerShutDown,

    #[error("field construction failed: {0}")]
    Field(#[from] TerrainError),

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(std::io::Error),
}
