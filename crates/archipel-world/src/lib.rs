//! World driver: islands, their chunks, and the grid that spawns them.
//!
//! [`World::tick`] is meant to be called once per frame. It loads world
//! cells around the viewer, spawns islands for cells that hold one, keeps the
//! job scheduler running, and reports chunk results as [`WorldEvent`]s.

mod chunk;
mod decoration;
mod error;
mod grid;
mod island;
mod world;

pub use chunk::{ChunkEntity, ChunkState};
pub use decoration::{Decoration, DecorationPlanner, OpenSky, PlacementOracle};
pub use error::WorldError;
pub use grid::{CellKey, IslandSite, WorldCell, WorldGrid};
pub use island::{ChunkDims, Island, IslandId, chunk_layout};
pub use world::{World, WorldEvent, WorldStats};
