//! The synchronous chunk chain: sample, smooth, assemble cells, polygonize.

use std::time::Instant;

use archipel_mesh::{Cell, MarchingCubes, MeshBuffer, Polygonizer, Triangle};
use archipel_terrain::{DensitySampler, sample_block, smooth_and_estimate_normals};

use crate::{ChunkDescriptor, JobError};

/// Counters describing one generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub samples: usize,
    /// Out-of-chunk samples recomputed for the smoothing kernel.
    pub boundary_resamples: usize,
    pub cells: usize,
    pub triangles: usize,
    pub elapsed_us: u64,
}

/// Output of a chunk job.
#[derive(Debug)]
pub enum ChunkOutput {
    Mesh(MeshBuffer),
    /// Nothing to render. The owner should delete the chunk.
    Empty,
}

impl ChunkOutput {
    pub fn contains_blocks(&self) -> bool {
        matches!(self, Self::Mesh(_))
    }

    pub fn mesh(&self) -> Option<&MeshBuffer> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            Self::Empty => None,
        }
    }
}

/// Output plus the report of the run that produced it.
#[derive(Debug)]
pub struct ChunkResult {
    pub output: ChunkOutput,
    pub report: GenerationReport,
}

impl ChunkResult {
    pub fn empty() -> Self {
        Self {
            output: ChunkOutput::Empty,
            report: GenerationReport::default(),
        }
    }
}

/// Runs the full generation chain for one chunk. Shared by all workers.
pub struct ChunkGenerator {
    sampler: DensitySampler,
    polygonizer: Box<dyn Polygonizer>,
    iso_level: f32,
}

impl ChunkGenerator {
    pub fn new(sampler: DensitySampler, polygonizer: Box<dyn Polygonizer>, iso_level: f32) -> Self {
        Self {
            sampler,
            polygonizer,
            iso_level,
        }
    }

    /// Generator using the built-in marching cubes polygonizer.
    pub fn marching_cubes(sampler: DensitySampler, iso_level: f32) -> Self {
        Self::new(sampler, Box::new(MarchingCubes), iso_level)
    }

    pub fn sampler(&self) -> &DensitySampler {
        &self.sampler
    }

    pub fn iso_level(&self) -> f32 {
        self.iso_level
    }

    /// Generate one chunk.
    ///
    /// An all-air field returns [`ChunkOutput::Empty`] without smoothing, as
    /// does a field whose polygonization yields no triangles.
    pub fn generate(&self, descriptor: &ChunkDescriptor) -> Result<ChunkResult, JobError> {
        descriptor.validate()?;
        let start = Instant::now();
        let island = descriptor.island.as_ref();
        let dims = descriptor.sample_dims();

        let mut block = sample_block(&self.sampler, island, descriptor.origin, dims, descriptor.upper)?;
        let mut report = GenerationReport {
            samples: block.values.len(),
            ..GenerationReport::default()
        };

        if !block.contains_solid {
            report.elapsed_us = start.elapsed().as_micros() as u64;
            return Ok(ChunkResult {
                output: ChunkOutput::Empty,
                report,
            });
        }

        let (normals, resampled) = smooth_and_estimate_normals(&self.sampler, island, &mut block)?;
        report.boundary_resamples = resampled;

        let mut triangles: Vec<Triangle> = Vec::new();
        for x in 0..dims[0] - 1 {
            for y in 0..dims[1] - 1 {
                for z in 0..dims[2] - 1 {
                    let cell = Cell::gather([x, y, z], |cx, cy, cz| {
                        (block.values.get(cx, cy, cz).max(0.0), normals.get(cx, cy, cz))
                    });
                    self.polygonizer.polygonize(&cell, self.iso_level, &mut triangles);
                    report.cells += 1;
                }
            }
        }
        report.triangles = triangles.len();
        report.elapsed_us = start.elapsed().as_micros() as u64;

        let output = if triangles.is_empty() {
            ChunkOutput::Empty
        } else {
            ChunkOutput::Mesh(MeshBuffer::from_triangles(&triangles))
        };
        Ok(ChunkResult { output, report })
    }
}
