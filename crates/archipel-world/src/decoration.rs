//! Decoration placement on finished chunk meshes.
//!
//! Candidate points are drawn from the mesh vertices with the world RNG, so
//! the same chunk always proposes the same points. Whether a point is usable
//! beyond the flatness and spacing rules is up to the host scene, which
//! answers through a [`PlacementOracle`].

use archipel_config::DecorationConfig;
use archipel_mesh::MeshBuffer;
use archipel_terrain::{DecorationSet, WorldRng};
use glam::Vec3;

/// Scene query deciding whether a surface point may hold a decoration.
///
/// Typical hosts reject points under an overhang or at the island rim.
pub trait PlacementOracle: Send + Sync {
    fn is_clear(&self, point: Vec3) -> bool;
}

impl<F> PlacementOracle for F
where
    F: Fn(Vec3) -> bool + Send + Sync,
{
    fn is_clear(&self, point: Vec3) -> bool {
        self(point)
    }
}

/// Oracle that accepts every point.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenSky;

impl PlacementOracle for OpenSky {
    fn is_clear(&self, _point: Vec3) -> bool {
        true
    }
}

/// One planned decoration in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoration {
    pub position: Vec3,
    pub set: DecorationSet,
    pub variant: u32,
    pub yaw_degrees: f32,
}

#[derive(Clone, Debug)]
pub struct DecorationPlanner {
    rng: WorldRng,
    upward_normal_min: f32,
    min_separation: f32,
    variant_count: u32,
}

impl DecorationPlanner {
    pub fn new(rng: WorldRng, config: &DecorationConfig) -> Self {
        Self {
            rng,
            upward_normal_min: config.upward_normal_min,
            min_separation: config.min_separation,
            variant_count: config.variant_count.max(1),
        }
    }

    /// Plan up to `budget` decorations on a chunk mesh.
    ///
    /// `origin` is the chunk origin; mesh positions are chunk-local. Points
    /// closer than the minimum separation to `existing` or to each other are
    /// rejected. At most ten draws are spent per requested decoration.
    pub fn plan(
        &self,
        mesh: &MeshBuffer,
        origin: Vec3,
        budget: u32,
        set: DecorationSet,
        oracle: &dyn PlacementOracle,
        existing: &[Decoration],
    ) -> Vec<Decoration> {
        let vertex_count = mesh.vertex_count();
        if budget == 0 || vertex_count == 0 || mesh.normals.len() != vertex_count {
            return Vec::new();
        }

        let mut remaining = (vertex_count / 10).min(budget as usize) as i32;
        let mut attempts = remaining * 10;
        let mut planned: Vec<Decoration> = Vec::with_capacity(remaining.max(0) as usize);

        while remaining > 0 {
            attempts -= 1;
            if attempts <= 0 {
                break;
            }

            let key = libm::roundf(
                origin.x - origin.z + attempts as f32 * 1234.0 - remaining as f32 * 912.0,
            ) as i32;
            let index = self.rng.random_int(key, 0, vertex_count as i32) as usize;

            if mesh.normals[index][1] <= self.upward_normal_min {
                continue;
            }
            let point = Vec3::from(mesh.positions[index]) + origin;
            if !oracle.is_clear(point) {
                continue;
            }
            let crowded = existing
                .iter()
                .chain(planned.iter())
                .any(|d| d.position.distance(point) < self.min_separation);
            if crowded {
                continue;
            }

            planned.push(self.decorate(point, set));
            remaining -= 1;
        }
        planned
    }

    /// Variant and rotation for a decoration at `point`.
    pub fn decorate(&self, point: Vec3, set: DecorationSet) -> Decoration {
        let r = point.x - point.z + point.y;
        let variant = self.rng.random_int(
            libm::roundf(r * 197.5902) as i32,
            0,
            self.variant_count as i32,
        );
        Decoration {
            position: point,
            set,
            variant: variant as u32,
            yaw_degrees: self.rng.random_float(r * 192.012, 0.0, 360.0),
        }
    }
}
