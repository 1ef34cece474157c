//! Polygonizer input and output shapes.

use glam::Vec3;

/// Local offset of each cell corner from the cell's minimum corner.
///
/// Corners 0..4 lie on the bottom face (`y = 0`), 4..8 on the top face,
/// with corner `i + 4` directly above corner `i`.
pub const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 0, 0],
    [0, 1, 0],
    [0, 1, 1],
    [1, 1, 1],
    [1, 1, 0],
];

/// Eight density samples at the corners of one unit cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub positions: [Vec3; 8],
    pub normals: [Vec3; 8],
    pub values: [f32; 8],
}

impl Cell {
    /// Build a cell at integer position `min` from a corner lookup.
    ///
    /// `corner` receives absolute grid coordinates and returns `(value, normal)`.
    pub fn gather(min: [usize; 3], mut corner: impl FnMut(usize, usize, usize) -> (f32, Vec3)) -> Self {
        let mut cell = Self {
            positions: [Vec3::ZERO; 8],
            normals: [Vec3::ZERO; 8],
            values: [0.0; 8],
        };
        for (i, offset) in CORNER_OFFSETS.iter().enumerate() {
            let (x, y, z) = (min[0] + offset[0], min[1] + offset[1], min[2] + offset[2]);
            let (value, normal) = corner(x, y, z);
            cell.positions[i] = Vec3::new(x as f32, y as f32, z as f32);
            cell.normals[i] = normal;
            cell.values[i] = value;
        }
        cell
    }
}

/// One output triangle with per-vertex normals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_positions_follow_corner_offsets() {
        let cell = Cell::gather([2, 3, 4], |x, y, z| ((x + y + z) as f32, Vec3::Y));
        assert_eq!(cell.positions[0], Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(cell.positions[1], Vec3::new(2.0, 3.0, 5.0));
        assert_eq!(cell.positions[6], Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(cell.values[0], 9.0);
        assert_eq!(cell.values[6], 12.0);
        assert!(cell.normals.iter().all(|&n| n == Vec3::Y));
    }

    #[test]
    fn test_top_corners_sit_above_bottom_corners() {
        for i in 0..4 {
            let bottom = CORNER_OFFSETS[i];
            let top = CORNER_OFFSETS[i + 4];
            assert_eq!((bottom[0], bottom[2]), (top[0], top[2]));
            assert_eq!((bottom[1], top[1]), (0, 1));
        }
    }
}
