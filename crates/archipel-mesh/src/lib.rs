//! Isosurface meshing: cells, the polygonizer seam and flat mesh buffers.

mod buffer;
mod cell;
mod polygonizer;
mod tables;

pub use buffer::{Aabb, MeshBuffer};
pub use cell::{CORNER_OFFSETS, Cell, Triangle};
pub use polygonizer::{MarchingCubes, Polygonizer};
