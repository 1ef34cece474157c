//! Scalar density sampler for island terrain.
//!
//! Density is a pure function of world position and island parameters.
//! Positive values are solid, zero is air. The terms are composed in a fixed
//! order: island envelope, volcano cone, mountains, hills, caldera, envelope
//! multiply, caves, swamp, ceiling clamp and the upper/lower half cutoff.

use glam::Vec3;
use noise::{NoiseFn, Simplex};

use crate::IslandParams;

/// Tunable constants of the density terms.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerTunables {
    /// Cave noise above this value is amplified by `cave_strong_gain`.
    pub cave_threshold: f32,
    pub cave_strong_gain: f32,
    /// Gain below the threshold, also applied to the second cave octave.
    pub cave_weak_gain: f32,
    pub caldera_gain: f32,
    pub swamp_gain: f32,
    /// Accumulated density required before hills are added.
    pub hill_threshold: f32,
    /// Fraction of the island half height the density may reach.
    pub fill_ceiling: f32,
}

impl Default for SamplerTunables {
    fn default() -> Self {
        Self {
            cave_threshold: 0.6,
            cave_strong_gain: 50.0,
            cave_weak_gain: 10.0,
            caldera_gain: 1.2,
            swamp_gain: 1.2,
            hill_threshold: 0.1,
            fill_ceiling: 0.95,
        }
    }
}

const MOUNTAIN_FREQ: [f32; 2] = [0.007, 0.0065];
const HILL_FREQ: f32 = 0.025;
const HILL_GAIN: f32 = 10.0;
const CAVE_FREQ: [f32; 2] = [0.02, 0.012];
const VOLCANO_FREQ: f32 = 0.035;
const CALDERA_FREQ: f32 = 0.07;
const SWAMP_FREQ: Vec3 = Vec3::new(0.05, 0.09, 0.05);

/// Create the coherent noise source for a world seed.
pub fn terrain_noise(world_seed: i32) -> Simplex {
    Simplex::new(world_seed as u32)
}

#[inline]
fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Deterministic density sampler. Cheap to share across worker threads.
#[derive(Clone)]
pub struct DensitySampler {
    noise: Simplex,
    tunables: SamplerTunables,
}

impl DensitySampler {
    pub fn new(world_seed: i32, tunables: SamplerTunables) -> Self {
        Self {
            noise: terrain_noise(world_seed),
            tunables,
        }
    }

    pub fn tunables(&self) -> &SamplerTunables {
        &self.tunables
    }

    /// Noise at `|(pos + offset) * freq|`, in roughly `[-1, 1]`.
    #[inline]
    fn noise_at(&self, pos: Vec3, offset: Vec3, freq: Vec3) -> f32 {
        let p = ((pos + offset) * freq).abs();
        self.noise.get([p.x as f64, p.y as f64, p.z as f64]) as f32
    }

    /// Island silhouette falloff in `[0, 0.5]`; zero at half the island width.
    pub fn envelope(pos: Vec3, center: Vec3, size: Vec3) -> f32 {
        let max_length = size.x;
        let length = (pos - center).length().min(max_length);
        clamp01((max_length / 2.0 - length) / max_length)
    }

    pub fn mountains(&self, pos: Vec3, offsets: &[Vec3; 4], height_scale: f32) -> f32 {
        let stretch = |f: f32| Vec3::new(f, f / height_scale, f);
        let v1 = (self.noise_at(pos, offsets[0], stretch(MOUNTAIN_FREQ[0])) + 1.0) / 2.0;
        let v2 = self.noise_at(pos, offsets[1], stretch(MOUNTAIN_FREQ[1]));
        clamp01(v1 * (v1 + v2) * 0.5 * height_scale)
    }

    pub fn hills(&self, pos: Vec3, offsets: &[Vec3; 4]) -> f32 {
        self.noise_at(pos, offsets[2], Vec3::splat(HILL_FREQ)).max(0.0) * HILL_GAIN
    }

    /// Non-negative cave carve amount.
    pub fn caves(&self, pos: Vec3, offsets: &[Vec3; 4]) -> f32 {
        let t = &self.tunables;
        let v1 = clamp01(self.noise_at(pos, offsets[3], Vec3::splat(CAVE_FREQ[0])));
        let v2 = clamp01(self.noise_at(pos, offsets[1], Vec3::splat(CAVE_FREQ[1])));
        let primary = if v1 > t.cave_threshold {
            v1 * t.cave_strong_gain
        } else {
            v1 * t.cave_weak_gain
        };
        (primary + v2 * t.cave_weak_gain).max(0.0)
    }

    /// Volcano cone in `[0, 1]`, shaped by squared distance in a stretched frame.
    pub fn volcano(&self, pos: Vec3, center: Vec3, size: Vec3) -> f32 {
        let max_length = size.y / 2.0;
        let mut local = (pos - center) * 1.5;
        local.y *= 0.5;
        let length = local.length_squared();

        let noise = clamp01(self.noise_at(pos, Vec3::ZERO, Vec3::splat(VOLCANO_FREQ)));
        let max_sq = max_length * max_length;
        let value = ((max_sq - length) / max_sq).max(0.0);
        clamp01(value + value * noise * 0.5)
    }

    /// Crater blob around the island's upper center.
    pub fn caldera(&self, pos: Vec3, center: Vec3, size: Vec3) -> f32 {
        let max_length = size.y / 2.0;
        let top = center + Vec3::Y * max_length;
        let mut local = pos - top;
        local.y *= 0.26;
        let length = local.length();

        let noise = clamp01(self.noise_at(pos, Vec3::ZERO, Vec3::splat(CALDERA_FREQ)));
        let value = (10.0 * (max_length / 3.0 - length) / max_length).max(0.0);
        self.tunables.caldera_gain * value + if value > 0.0 { noise } else { 0.0 }
    }

    /// Wetland lowering factor, growing with height above the island center.
    pub fn swamp(&self, pos: Vec3, offsets: &[Vec3; 4], center: Vec3, size: Vec3) -> f32 {
        let noise = clamp01(self.noise_at(pos, offsets[3], SWAMP_FREQ));
        let y = (pos.y - center.y).max(1.0) * 5.0;
        clamp01(y / size.y) * noise * self.tunables.swamp_gain
    }

    /// Density at `pos` for `island`. `upper` selects the half whose cutoff applies.
    pub fn sample(&self, pos: Vec3, island: &IslandParams, upper: bool) -> f32 {
        let t = &self.tunables;
        let preset = &island.preset;
        let center = island.center;
        let size = island.size;
        let half_height = size.y / 2.0;
        let local_y = pos.y - center.y;

        let envelope = Self::envelope(pos, center, size);
        if envelope <= 0.0 {
            return 0.0;
        }

        let scale = preset.height_scale;
        let mut value = 0.0;

        if preset.has_volcano() {
            value += self.volcano(pos, center, size);
        }

        let mountain = self.mountains(pos, &island.offsets, scale);
        value = clamp01(mountain + value + preset.ground_bias);

        let stretch = half_height * scale * 2.0;
        value = (value * stretch).clamp(0.0, stretch);

        if value > t.hill_threshold {
            value += value * self.hills(pos, &island.offsets) / (half_height * 0.2);
        }

        if preset.has_volcano() {
            value -= self.caldera(pos, center, size) * half_height * scale;
        }

        value *= envelope;

        if preset.has_caves {
            value -= self.caves(pos, &island.offsets);
        }

        if preset.is_swamp() {
            value -= self.swamp(pos, &island.offsets, center, size) * half_height;
        }

        value = value.clamp(0.0, half_height * t.fill_ceiling);

        let solid = if upper {
            value > local_y
        } else {
            -value < local_y
        };
        if solid { value } else { 0.0 }
    }
}
