//! Coarse world-cell placement of islands.
//!
//! The world is an infinite grid of equally sized cells. Each cell holds at
//! most one island; whether it does, and where inside the cell the island
//! sits, is a pure function of the world seed and the cell position.

use glam::Vec3;
use noise::{NoiseFn, Simplex};

use crate::{Region, WorldRng, terrain_noise};

/// Decides island presence and position per world cell.
#[derive(Clone)]
pub struct IslandPlacer {
    rng: WorldRng,
    noise: Simplex,
    cell_size: Vec3,
    presence_threshold: f32,
    /// Largest island extent: `(max diameter, island height, max diameter)`.
    max_island_extent: Vec3,
}

impl IslandPlacer {
    pub fn new(
        rng: WorldRng,
        cell_size: f32,
        presence_threshold: f32,
        max_island_extent: Vec3,
    ) -> Self {
        Self {
            rng,
            noise: terrain_noise(rng.world_seed()),
            cell_size: Vec3::splat(cell_size),
            presence_threshold,
            max_island_extent,
        }
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// Grid position of the cell containing `pos`. Cells are centered on multiples of the size.
    pub fn cell_position(&self, pos: Vec3) -> Vec3 {
        ((pos + self.cell_size / 2.0) / self.cell_size).floor() * self.cell_size
    }

    /// Vertical layer index of a cell position.
    pub fn layer(&self, cell: Vec3) -> i32 {
        (cell.y / self.cell_size.y).floor() as i32
    }

    pub fn region(&self, cell: Vec3) -> Option<Region> {
        Region::from_layer(self.layer(cell))
    }

    /// Raw presence noise of a cell, in roughly `[-1, 1]`.
    pub fn presence(&self, cell: Vec3) -> f32 {
        let offset = self
            .rng
            .random_float((cell.x + cell.y - cell.z) * 192.183, 0.0, 10_000.0);
        let p = (cell + Vec3::splat(offset)).abs();
        self.noise.get([p.x as f64, p.y as f64, p.z as f64]) as f32
    }

    /// Island position inside `cell`, or `None` when the cell is empty.
    pub fn place(&self, cell: Vec3) -> Option<Vec3> {
        let n = self.presence(cell);
        if n <= self.presence_threshold {
            return None;
        }

        let max_offset = ((self.cell_size - self.max_island_extent) / 2.0).max(Vec3::ZERO);
        let offset = Vec3::new(
            self.rng.random_float(n * (n + cell.z) * 907.1234, 0.0, max_offset.x),
            self.rng.random_float(n * (n + cell.z) * 482.5764, 0.0, max_offset.y),
            self.rng.random_float(n * (n + cell.x) * 159.9824, 0.0, max_offset.z),
        );
        Some(cell + offset)
    }
}
