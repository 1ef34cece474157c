use archipel_terrain::TerrainError;

/// Errors raised while building or driving a world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("invalid world configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Terrain(#[from] TerrainError),
}
