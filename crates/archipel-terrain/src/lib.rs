//! Island terrain: presets, seeded randomness, density sampling and field smoothing.

mod error;
mod field;
mod island;
mod placement;
mod preset;
mod rng;
mod sampler;

pub use error::TerrainError;
pub use field::{
    FieldBlock, Grid3, NormalField, ScalarField, boundary_half, sample_block,
    smooth_and_estimate_normals,
};
pub use island::{IslandParams, IslandSizing};
pub use placement::IslandPlacer;
pub use preset::{DecorationSet, Region, SurfaceKind, TerrainKind, TerrainPreset};
pub use rng::WorldRng;
pub use sampler::{DensitySampler, SamplerTunables, terrain_noise};
