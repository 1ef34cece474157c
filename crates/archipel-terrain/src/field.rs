//! Dense scalar fields, box smoothing and normal estimation.
//!
//! Fields are flat row-major arenas (`x` outermost, `z` innermost). Dimensions
//! are validated once in [`Grid3::new`]; accessors only debug-assert.

use glam::Vec3;

use crate::{DensitySampler, IslandParams, TerrainError};

/// Flat 3D arena of `T`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3<T> {
    dims: [usize; 3],
    data: Vec<T>,
}

impl<T: Copy + Default> Grid3<T> {
    /// Allocate a grid filled with `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidFieldDimensions`] if any axis is zero or
    /// the total element count overflows `usize`.
    pub fn new(dims: [usize; 3]) -> Result<Self, TerrainError> {
        let len = dims[0]
            .checked_mul(dims[1])
            .and_then(|n| n.checked_mul(dims[2]))
            .filter(|&n| n > 0)
            .ok_or(TerrainError::InvalidFieldDimensions {
                width: dims[0],
                height: dims[1],
                depth: dims[2],
            })?;
        Ok(Self {
            dims,
            data: vec![T::default(); len],
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.dims[0] && y < self.dims[1] && z < self.dims[2]);
        (x * self.dims[1] + y) * self.dims[2] + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> T {
        self.data[self.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let i = self.index(x, y, z);
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

pub type ScalarField = Grid3<f32>;
pub type NormalField = Grid3<Vec3>;

/// Raw density samples of one chunk volume.
#[derive(Clone, Debug)]
pub struct FieldBlock {
    /// World position of local sample `(0, 0, 0)`.
    pub origin: Vec3,
    pub upper: bool,
    pub values: ScalarField,
    /// Whether any sample is non-zero.
    pub contains_solid: bool,
}

/// Sample `dims` points starting at `origin`, one unit apart.
pub fn sample_block(
    sampler: &DensitySampler,
    island: &IslandParams,
    origin: Vec3,
    dims: [usize; 3],
    upper: bool,
) -> Result<FieldBlock, TerrainError> {
    let mut values = ScalarField::new(dims)?;
    let mut contains_solid = false;

    for x in 0..dims[0] {
        for y in 0..dims[1] {
            for z in 0..dims[2] {
                let pos = origin + Vec3::new(x as f32, y as f32, z as f32);
                let value = sampler.sample(pos, island, upper);
                contains_solid |= value != 0.0;
                values.set(x, y, z, value);
            }
        }
    }

    Ok(FieldBlock {
        origin,
        upper,
        values,
        contains_solid,
    })
}

/// Half flag for a resampled neighbour at local height `y`.
///
/// Below the block counts as lower half, above as upper; inside the vertical
/// range the block's own half applies.
pub fn boundary_half(y: isize, height: usize, block_upper: bool) -> bool {
    if y < 0 {
        false
    } else if y >= height as isize {
        true
    } else {
        block_upper
    }
}

/// Padding of the raw neighbourhood around a block: two samples per side.
const PAD: usize = 2;

/// Smooth `block` in place with a 27-point box filter and return its normals.
///
/// Neighbours outside the block are resampled from `sampler` instead of being
/// zero-padded, so adjacent blocks agree along their shared faces. Normals are
/// the inverted central differences of the smoothed field. Returns the normals
/// and the number of boundary samples that were resampled.
pub fn smooth_and_estimate_normals(
    sampler: &DensitySampler,
    island: &IslandParams,
    block: &mut FieldBlock,
) -> Result<(NormalField, usize), TerrainError> {
    let [w, h, l] = block.values.dims();

    // Raw samples over local [-2, n + 1] on every axis.
    let mut raw = ScalarField::new([w + 2 * PAD, h + 2 * PAD, l + 2 * PAD])?;
    let mut resampled = 0;
    for i in 0..w + 2 * PAD {
        for j in 0..h + 2 * PAD {
            for k in 0..l + 2 * PAD {
                let (x, y, z) = (
                    i as isize - PAD as isize,
                    j as isize - PAD as isize,
                    k as isize - PAD as isize,
                );
                let inside = (0..w as isize).contains(&x)
                    && (0..h as isize).contains(&y)
                    && (0..l as isize).contains(&z);
                let value = if inside {
                    block.values.get(x as usize, y as usize, z as usize)
                } else {
                    resampled += 1;
                    let pos = block.origin + Vec3::new(x as f32, y as f32, z as f32);
                    sampler.sample(pos, island, boundary_half(y, h, block.upper))
                };
                raw.set(i, j, k, value);
            }
        }
    }

    let smoothed = box_sum(&raw)?;

    // smoothed covers local [-1, n]; index a holds local a - 1.
    let mut normals = NormalField::new([w, h, l])?;
    for x in 0..w {
        for y in 0..h {
            for z in 0..l {
                let dx = smoothed.get(x + 2, y + 1, z + 1) - smoothed.get(x, y + 1, z + 1);
                let dy = smoothed.get(x + 1, y + 2, z + 1) - smoothed.get(x + 1, y, z + 1);
                let dz = smoothed.get(x + 1, y + 1, z + 2) - smoothed.get(x + 1, y + 1, z);
                normals.set(x, y, z, -Vec3::new(dx, dy, dz).normalize_or_zero());
                block.values.set(x, y, z, smoothed.get(x + 1, y + 1, z + 1));
            }
        }
    }

    Ok((normals, resampled))
}

/// 3x3x3 box average via three separable passes. Output shrinks by two per axis.
fn box_sum(raw: &ScalarField) -> Result<ScalarField, TerrainError> {
    let [a, b, c] = raw.dims();

    let mut sx = ScalarField::new([a - 2, b, c])?;
    for x in 0..a - 2 {
        for y in 0..b {
            for z in 0..c {
                let v = raw.get(x, y, z) + raw.get(x + 1, y, z) + raw.get(x + 2, y, z);
                sx.set(x, y, z, v);
            }
        }
    }

    let mut sy = ScalarField::new([a - 2, b - 2, c])?;
    for x in 0..a - 2 {
        for y in 0..b - 2 {
            for z in 0..c {
                let v = sx.get(x, y, z) + sx.get(x, y + 1, z) + sx.get(x, y + 2, z);
                sy.set(x, y, z, v);
            }
        }
    }

    let mut out = ScalarField::new([a - 2, b - 2, c - 2])?;
    for x in 0..a - 2 {
        for y in 0..b - 2 {
            for z in 0..c - 2 {
                let v = sy.get(x, y, z) + sy.get(x, y, z + 1) + sy.get(x, y, z + 2);
                out.set(x, y, z, v / 27.0);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Region, SamplerTunables, TerrainPreset};

    fn island() -> IslandParams {
        IslandParams::new(
            TerrainPreset::GREENLAND,
            Region::Green,
            Vec3::ZERO,
            Vec3::new(100.0, 40.0, 100.0),
            [Vec3::new(10.0, 20.0, 30.0); 4],
        )
        .unwrap()
    }

    #[test]
    fn test_grid_rejects_zero_dims() {
        assert!(matches!(
            ScalarField::new([4, 0, 4]),
            Err(TerrainError::InvalidFieldDimensions { height: 0, .. })
        ));
        assert!(ScalarField::new([usize::MAX, 2, 2]).is_err());
    }

    #[test]
    fn test_grid_row_major_layout() {
        let mut g = ScalarField::new([2, 3, 4]).unwrap();
        assert_eq!(g.len(), 24);
        assert_eq!(g.index(0, 0, 1), 1);
        assert_eq!(g.index(0, 1, 0), 4);
        assert_eq!(g.index(1, 0, 0), 12);
        g.set(1, 2, 3, 9.0);
        assert_eq!(g.as_slice()[23], 9.0);
        assert_eq!(g.get(1, 2, 3), 9.0);
    }

    #[test]
    fn test_box_sum_of_constant_field() {
        let mut raw = ScalarField::new([5, 5, 5]).unwrap();
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..5 {
                    raw.set(x, y, z, 2.0);
                }
            }
        }
        let out = box_sum(&raw).unwrap();
        assert_eq!(out.dims(), [3, 3, 3]);
        assert!(out.as_slice().iter().all(|v| (v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn test_box_sum_spreads_impulse() {
        let mut raw = ScalarField::new([5, 5, 5]).unwrap();
        raw.set(2, 2, 2, 27.0);
        let out = box_sum(&raw).unwrap();
        assert!(out.as_slice().iter().all(|v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_boundary_half() {
        assert!(!boundary_half(-1, 10, true));
        assert!(boundary_half(10, 10, false));
        assert!(boundary_half(5, 10, true));
        assert!(!boundary_half(5, 10, false));
    }

    #[test]
    fn test_empty_block_far_from_island() {
        let sampler = DensitySampler::new(5, SamplerTunables::default());
        let block = sample_block(&sampler, &island(), Vec3::new(500.0, 0.0, 500.0), [9, 9, 9], true)
            .unwrap();
        assert!(!block.contains_solid);
        assert!(block.values.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_smoothing_counts_boundary_resamples_and_orients_normals() {
        let sampler = DensitySampler::new(5, SamplerTunables::default());
        let island = island();
        let mut block =
            sample_block(&sampler, &island, Vec3::new(-4.0, 0.0, -4.0), [9, 21, 9], true).unwrap();
        assert!(block.contains_solid);

        let (normals, resampled) =
            smooth_and_estimate_normals(&sampler, &island, &mut block).unwrap();
        assert_eq!(resampled, 13 * 25 * 13 - 9 * 21 * 9);
        assert_eq!(normals.dims(), [9, 21, 9]);

        for n in normals.as_slice() {
            let len = n.length();
            assert!(len == 0.0 || (len - 1.0).abs() < 1e-4);
        }
        // Every column turns from solid to air below the ceiling, where the
        // inverted gradient points up.
        let upward = normals.as_slice().iter().filter(|n| n.y > 0.5).count();
        assert!(upward > 0);
    }
}
