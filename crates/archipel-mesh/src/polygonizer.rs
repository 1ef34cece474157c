//! Isosurface extraction from single cells.

use glam::Vec3;

use crate::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::{Cell, Triangle};

const EPSILON: f32 = 1e-5;

/// Turns one cell into zero or more triangles at an iso level.
pub trait Polygonizer: Send + Sync {
    /// Append the triangles of `cell` to `out` and return how many were added.
    fn polygonize(&self, cell: &Cell, iso_level: f32, out: &mut Vec<Triangle>) -> usize;
}

/// Classic table-driven marching cubes. Emits at most five triangles per cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarchingCubes;

impl MarchingCubes {
    /// Case index: bit `i` is set when corner `i` lies below the iso level.
    pub fn case_index(cell: &Cell, iso_level: f32) -> usize {
        cell.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v < iso_level)
            .fold(0, |acc, (i, _)| acc | (1 << i))
    }
}

/// Point on edge `a`-`b` where the density crosses `iso_level`, with its normal.
fn interpolate(iso_level: f32, cell: &Cell, a: usize, b: usize) -> (Vec3, Vec3) {
    let (pa, pb) = (cell.positions[a], cell.positions[b]);
    let (na, nb) = (cell.normals[a], cell.normals[b]);
    let (va, vb) = (cell.values[a], cell.values[b]);

    if (iso_level - va).abs() < EPSILON || (va - vb).abs() < EPSILON {
        return (pa, na);
    }
    if (iso_level - vb).abs() < EPSILON {
        return (pb, nb);
    }

    let t = (iso_level - va) / (vb - va);
    (pa + (pb - pa) * t, (na + (nb - na) * t).normalize_or_zero())
}

impl Polygonizer for MarchingCubes {
    fn polygonize(&self, cell: &Cell, iso_level: f32, out: &mut Vec<Triangle>) -> usize {
        let case = Self::case_index(cell, iso_level);
        let edges = EDGE_TABLE[case];
        if edges == 0 {
            return 0;
        }

        let mut points = [(Vec3::ZERO, Vec3::ZERO); 12];
        for (edge, [a, b]) in EDGE_CORNERS.iter().enumerate() {
            if edges & (1 << edge) != 0 {
                points[edge] = interpolate(iso_level, cell, *a, *b);
            }
        }

        let mut added = 0;
        for tri in TRI_TABLE[case].chunks_exact(3) {
            if tri[0] < 0 {
                break;
            }
            let [p0, p1, p2] = [
                points[tri[0] as usize],
                points[tri[1] as usize],
                points[tri[2] as usize],
            ];
            out.push(Triangle {
                positions: [p0.0, p1.0, p2.0],
                normals: [p0.1, p1.1, p2.1],
            });
            added += 1;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CORNER_OFFSETS;

    fn cell_with(values: [f32; 8]) -> Cell {
        Cell::gather([0, 0, 0], |x, y, z| {
            let i = CORNER_OFFSETS
                .iter()
                .position(|o| *o == [x, y, z])
                .unwrap();
            (values[i], Vec3::Y)
        })
    }

    #[test]
    fn test_uniform_cells_emit_nothing() {
        let mut out = Vec::new();
        assert_eq!(MarchingCubes.polygonize(&cell_with([0.0; 8]), 5.0, &mut out), 0);
        assert_eq!(MarchingCubes.polygonize(&cell_with([9.0; 8]), 5.0, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_solid_corner() {
        let mut values = [0.0; 8];
        values[0] = 10.0;
        let mut out = Vec::new();
        let added = MarchingCubes.polygonize(&cell_with(values), 5.0, &mut out);
        assert_eq!(added, 1);

        let mut verts = out[0].positions.to_vec();
        verts.sort_by(|a, b| a.to_array().partial_cmp(&b.to_array()).unwrap());
        assert_eq!(
            verts,
            vec![
                Vec3::new(0.0, 0.0, 0.5),
                Vec3::new(0.0, 0.5, 0.0),
                Vec3::new(0.5, 0.0, 0.0),
            ]
        );
        assert!(out[0].normals.iter().all(|&n| n == Vec3::Y));
    }

    #[test]
    fn test_every_case_bounded_and_on_cell() {
        for case in 0..256usize {
            let values: [f32; 8] = std::array::from_fn(|i| if case & (1 << i) != 0 { 0.0 } else { 10.0 });
            let cell = cell_with(values);
            assert_eq!(MarchingCubes::case_index(&cell, 5.0), case);

            let mut out = Vec::new();
            let added = MarchingCubes.polygonize(&cell, 5.0, &mut out);
            assert!(added <= 5);
            assert_eq!(added, out.len());
            for tri in &out {
                for p in tri.positions {
                    assert!(p.min_element() >= 0.0 && p.max_element() <= 1.0);
                }
            }
        }
    }

    #[test]
    fn test_interpolation_snaps_to_corners_at_iso() {
        let mut values = [0.0; 8];
        values[0] = 5.0;
        values[3] = 5.0;
        values[4] = 5.0;
        let cell = cell_with(values);
        let (p, _) = interpolate(5.0, &cell, 0, 1);
        assert_eq!(p, cell.positions[0]);
        let (p, _) = interpolate(5.0, &cell, 1, 0);
        assert_eq!(p, cell.positions[0]);
    }
}
