use std::sync::Arc;

use archipel_terrain::IslandParams;
use glam::Vec3;

use crate::JobError;

/// Priorities are capped so far-away chunks still sort deterministically.
pub const PRIORITY_CAP: f32 = 100_000.0;

/// Bounded volume handed to a chunk job.
#[derive(Clone, Debug)]
pub struct ChunkDescriptor {
    /// World position of the chunk's minimum corner.
    pub origin: Vec3,
    /// Edge length along x and z, in voxels.
    pub width: u32,
    pub height: u32,
    /// Whether the chunk lies above the island's vertical midline.
    pub upper: bool,
    pub island: Arc<IslandParams>,
}

impl ChunkDescriptor {
    pub fn new(origin: Vec3, width: u32, height: u32, upper: bool, island: Arc<IslandParams>) -> Self {
        Self {
            origin,
            width,
            height,
            upper,
            island,
        }
    }

    /// # Errors
    ///
    /// Returns [`JobError::InvalidDescriptor`] for zero-sized chunks or a
    /// non-finite origin.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.width == 0 || self.height == 0 {
            return Err(JobError::InvalidDescriptor(format!(
                "chunk {}x{} at {} has no volume",
                self.width, self.height, self.origin
            )));
        }
        if !self.origin.is_finite() {
            return Err(JobError::InvalidDescriptor(format!(
                "chunk origin {} is not finite",
                self.origin
            )));
        }
        Ok(())
    }

    /// Samples per axis: one more than the voxel count to close the boundary.
    pub fn sample_dims(&self) -> [usize; 3] {
        let w = self.width as usize + 1;
        [w, self.height as usize + 1, w]
    }

    /// Priority relative to a viewer position. Lower is more urgent.
    pub fn priority_from(&self, viewer: Vec3) -> f32 {
        viewer.distance(self.origin).min(PRIORITY_CAP)
    }
}
