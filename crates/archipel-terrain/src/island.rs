//! Per-island generation parameters.

use glam::Vec3;

use crate::{Region, TerrainError, TerrainPreset, WorldRng};

/// Size limits used when deriving a new island.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IslandSizing {
    /// Smallest horizontal diameter.
    pub horizontal_min: f32,
    /// Largest horizontal diameter.
    pub horizontal_max: f32,
    /// Full vertical extent, two chunk heights.
    pub vertical: f32,
}

impl IslandSizing {
    pub fn new(horizontal_min: f32, horizontal_max: f32, chunk_height: u32) -> Self {
        Self {
            horizontal_min,
            horizontal_max,
            vertical: chunk_height as f32 * 2.0,
        }
    }
}

/// Everything the density sampler needs to know about one island.
///
/// Shared read-only by every chunk job of the island.
#[derive(Clone, Debug, PartialEq)]
pub struct IslandParams {
    pub preset: TerrainPreset,
    pub region: Region,
    pub center: Vec3,
    /// Full extent. `x == z`, `y` is twice the chunk height.
    pub size: Vec3,
    /// Per-island offsets into the shared noise field.
    pub offsets: [Vec3; 4],
}

impl IslandParams {
    /// Build parameters from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidIslandSize`] when any size component is
    /// not a positive finite number.
    pub fn new(
        preset: TerrainPreset,
        region: Region,
        center: Vec3,
        size: Vec3,
        offsets: [Vec3; 4],
    ) -> Result<Self, TerrainError> {
        if !size.is_finite() || size.min_element() <= 0.0 {
            return Err(TerrainError::InvalidIslandSize(size));
        }
        Ok(Self {
            preset,
            region,
            center,
            size,
            offsets,
        })
    }

    /// Derive the island at `pos` from the world seed.
    ///
    /// Passing a `preset` overrides the seeded choice, which is how custom
    /// islands are spawned for debugging.
    pub fn derive(
        rng: &WorldRng,
        pos: Vec3,
        region: Region,
        preset: Option<TerrainPreset>,
        sizing: IslandSizing,
    ) -> Result<Self, TerrainError> {
        let preset = preset.unwrap_or_else(|| {
            let draw = rng.random_int(libm::roundf(pos.x + pos.y - pos.z) as i32, 0, 1000);
            TerrainPreset::choose(region, draw)
        });

        let offsets: [Vec3; 4] = std::array::from_fn(|i| {
            let i = i as f32;
            Vec3::new(
                rng.random_float(i * 20.193 + pos.z * 97.105_47, 0.0, 10_000.0),
                rng.random_float(i * 27.942 + pos.x * 124.018_46, 0.0, 10_000.0),
                rng.random_float(i * 13.581 + pos.x * 114.072_05, 0.0, 10_000.0),
            )
        });

        let horizontal = libm::roundf(rng.random_float(
            offsets[0].x - offsets[1].y + offsets[3].z,
            sizing.horizontal_min,
            sizing.horizontal_max,
        ));
        let size = Vec3::new(horizontal, sizing.vertical, horizontal);

        Self::new(preset, region, pos, size, offsets)
    }

    pub fn half_height(&self) -> f32 {
        self.size.y / 2.0
    }

    /// Display name, e.g. `FOREST: 120/-40/75`.
    pub fn label(&self) -> String {
        format!(
            "{}: {}/{}/{}",
            self.preset.label, self.center.x as i32, self.center.y as i32, self.center.z as i32
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing() -> IslandSizing {
        IslandSizing::new(80.0, 160.0, 40)
    }

    #[test]
    fn test_derive_is_deterministic() {
        let rng = WorldRng::new(99);
        let pos = Vec3::new(640.0, 12.0, -1210.0);
        let a = IslandParams::derive(&rng, pos, Region::Green, None, sizing()).unwrap();
        let b = IslandParams::derive(&rng, pos, Region::Green, None, sizing()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derived_size_and_offsets() {
        let rng = WorldRng::new(7);
        for i in 0..50 {
            let pos = Vec3::new(i as f32 * 611.0, -600.0, i as f32 * -377.0);
            let island = IslandParams::derive(&rng, pos, Region::Tropical, None, sizing()).unwrap();
            assert_eq!(island.size.x, island.size.z);
            assert_eq!(island.size.y, 80.0);
            assert!((80.0..=160.0).contains(&island.size.x));
            assert_eq!(island.size.x.fract(), 0.0);
            assert_eq!(island.center, pos);
            for offset in island.offsets {
                assert!(offset.min_element() >= 0.0 && offset.max_element() < 10_000.0);
            }
            assert!(matches!(
                island.preset,
                TerrainPreset::SWAMP | TerrainPreset::JUNGLE
            ));
        }
    }

    #[test]
    fn test_offsets_distinct_for_large_seed() {
        let rng = WorldRng::new(2_000_000_000);
        let island =
            IslandParams::derive(&rng, Vec3::ZERO, Region::Green, None, sizing()).unwrap();
        for (i, a) in island.offsets.iter().enumerate() {
            for b in &island.offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_preset_override() {
        let rng = WorldRng::new(3);
        let island = IslandParams::derive(
            &rng,
            Vec3::ZERO,
            Region::Sand,
            Some(TerrainPreset::SWAMP),
            sizing(),
        )
        .unwrap();
        assert_eq!(island.preset, TerrainPreset::SWAMP);
        assert_eq!(island.region, Region::Sand);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let result = IslandParams::new(
            TerrainPreset::DESERT,
            Region::Sand,
            Vec3::ZERO,
            Vec3::new(0.0, 80.0, 0.0),
            [Vec3::ZERO; 4],
        );
        assert!(matches!(result, Err(TerrainError::InvalidIslandSize(_))));
    }

    #[test]
    fn test_label() {
        let island = IslandParams::new(
            TerrainPreset::FOREST,
            Region::Green,
            Vec3::new(120.7, -40.0, 75.2),
            Vec3::new(100.0, 80.0, 100.0),
            [Vec3::ZERO; 4],
        )
        .unwrap();
        assert_eq!(island.label(), "FOREST: 120/-40/75");
        assert_eq!(island.half_height(), 40.0);
    }
}
