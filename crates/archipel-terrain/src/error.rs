use glam::Vec3;

/// Errors raised while building terrain inputs.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("unknown terrain preset: {0}")]
    UnknownPreset(String),

    #[error("invalid field dimensions {width}x{height}x{depth}")]
    InvalidFieldDimensions {
        width: usize,
        height: usize,
        depth: usize,
    },

    #[error("invalid island size {0}")]
    InvalidIslandSize(Vec3),
}
