//! Terrain presets and the vertical regions that select them.
//!
//! Every island carries one immutable [`TerrainPreset`] from a small fixed
//! catalog. The preset is chosen from the island's [`Region`] (its vertical
//! world-cell layer) and a seeded draw, so the same world seed always yields
//! the same archipelago.

use std::fmt;
use std::str::FromStr;

use crate::TerrainError;

/// Archetype of a terrain preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    IcyMountain,
    SnowPlanes,
    Forest,
    Greenland,
    Swamp,
    Jungle,
    Desert,
    Volcano,
}

/// Surface material a renderer should use for chunks of a preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Grass,
    Swamp,
    Sand,
    Snow,
    Lava,
}

/// Family of decorative objects placed on a preset's surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecorationSet {
    Green,
    Swamp,
    Jungle,
}

/// Immutable named parameter bundle describing how an island looks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainPreset {
    pub kind: TerrainKind,
    pub label: &'static str,
    /// Maximum number of decorative objects per chunk.
    pub decoration_budget: u32,
    /// Stretches mountains vertically. Always positive.
    pub height_scale: f32,
    /// Lifts the whole terrain before it is stretched to island height.
    pub ground_bias: f32,
    pub has_caves: bool,
}

impl TerrainPreset {
    pub const ICY_MOUNTAIN: Self = Self::new(TerrainKind::IcyMountain, "ICY_MOUNTAIN", 0, 1.8, 0.0, true);
    pub const SNOW_PLANES: Self = Self::new(TerrainKind::SnowPlanes, "SNOW_PLANES", 0, 0.8, 0.1, false);
    pub const FOREST: Self = Self::new(TerrainKind::Forest, "FOREST", 8, 1.0, 0.0, true);
    pub const GREENLAND: Self = Self::new(TerrainKind::Greenland, "GREENLAND", 2, 0.8, 0.1, false);
    pub const SWAMP: Self = Self::new(TerrainKind::Swamp, "SWAMP", 5, 0.5, 0.3, false);
    pub const JUNGLE: Self = Self::new(TerrainKind::Jungle, "JUNGLE", 6, 1.0, 0.0, false);
    pub const DESERT: Self = Self::new(TerrainKind::Desert, "DESERT", 0, 0.5, 0.3, false);
    pub const VOLCANO: Self = Self::new(TerrainKind::Volcano, "VOLCANO", 0, 1.8, 0.0, false);

    /// Every preset, in catalog order.
    pub const CATALOG: [Self; 8] = [
        Self::ICY_MOUNTAIN,
        Self::SNOW_PLANES,
        Self::FOREST,
        Self::GREENLAND,
        Self::SWAMP,
        Self::JUNGLE,
        Self::DESERT,
        Self::VOLCANO,
    ];

    const fn new(
        kind: TerrainKind,
        label: &'static str,
        decoration_budget: u32,
        height_scale: f32,
        ground_bias: f32,
        has_caves: bool,
    ) -> Self {
        Self {
            kind,
            label,
            decoration_budget,
            height_scale,
            ground_bias,
            has_caves,
        }
    }

    /// Whether the sampler adds a volcano cone and carves a caldera.
    pub fn has_volcano(&self) -> bool {
        self.kind == TerrainKind::Volcano
    }

    /// Whether the sampler flattens terrain into wetlands.
    pub fn is_swamp(&self) -> bool {
        self.kind == TerrainKind::Swamp
    }

    pub fn surface(&self) -> SurfaceKind {
        match self.kind {
            TerrainKind::IcyMountain | TerrainKind::SnowPlanes => SurfaceKind::Snow,
            TerrainKind::Desert => SurfaceKind::Sand,
            TerrainKind::Volcano => SurfaceKind::Lava,
            TerrainKind::Swamp => SurfaceKind::Swamp,
            TerrainKind::Forest | TerrainKind::Greenland | TerrainKind::Jungle => SurfaceKind::Grass,
        }
    }

    pub fn decoration_set(&self) -> DecorationSet {
        match self.kind {
            TerrainKind::Swamp => DecorationSet::Swamp,
            TerrainKind::Jungle => DecorationSet::Jungle,
            _ => DecorationSet::Green,
        }
    }

    /// Pick the preset for an island in `region` given a non-negative draw.
    pub fn choose(region: Region, draw: i32) -> Self {
        match region {
            Region::Icy => {
                if draw.rem_euclid(2) == 0 {
                    Self::SNOW_PLANES
                } else {
                    Self::ICY_MOUNTAIN
                }
            }
            Region::Green => match draw.rem_euclid(3) {
                0 => Self::SWAMP,
                1 => Self::GREENLAND,
                _ => Self::FOREST,
            },
            Region::Tropical => {
                if draw.rem_euclid(4) == 0 {
                    Self::SWAMP
                } else {
                    Self::JUNGLE
                }
            }
            Region::Sand => Self::DESERT,
            Region::Lava => Self::VOLCANO,
        }
    }
}

impl fmt::Display for TerrainPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

impl FromStr for TerrainPreset {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CATALOG
            .iter()
            .find(|preset| preset.label.eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| TerrainError::UnknownPreset(s.to_string()))
    }
}

/// Climate band of a world-cell layer. The discriminant is the layer index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Region {
    Lava = -3,
    Sand = -2,
    Tropical = -1,
    Green = 0,
    Icy = 1,
}

impl Region {
    /// Lowest layer that holds islands.
    pub const MIN_LAYER: i32 = Region::Lava as i32;
    /// Highest layer that holds islands.
    pub const MAX_LAYER: i32 = Region::Icy as i32;

    /// Region of a vertical world-cell layer, `None` outside the generated band.
    pub fn from_layer(layer: i32) -> Option<Self> {
        match layer {
            -3 => Some(Self::Lava),
            -2 => Some(Self::Sand),
            -1 => Some(Self::Tropical),
            0 => Some(Self::Green),
            1 => Some(Self::Icy),
            _ => None,
        }
    }

    pub fn layer(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lava => "LAVA",
            Self::Sand => "SAND",
            Self::Tropical => "TROPICAL",
            Self::Green => "GREEN",
            Self::Icy => "ICY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_values() {
        assert_eq!(TerrainPreset::CATALOG.len(), 8);
        assert_eq!(TerrainPreset::FOREST.decoration_budget, 8);
        assert!(TerrainPreset::FOREST.has_caves);
        assert!(!TerrainPreset::SWAMP.has_caves);
        assert_eq!(TerrainPreset::SWAMP.ground_bias, 0.3);
        assert_eq!(TerrainPreset::VOLCANO.height_scale, 1.8);
        assert!(TerrainPreset::CATALOG.iter().all(|p| p.height_scale > 0.0));
    }

    #[test]
    fn test_flags() {
        assert!(TerrainPreset::VOLCANO.has_volcano());
        assert!(!TerrainPreset::ICY_MOUNTAIN.has_volcano());
        assert!(TerrainPreset::SWAMP.is_swamp());
        assert!(!TerrainPreset::JUNGLE.is_swamp());
    }

    #[test]
    fn test_choose_per_region() {
        assert_eq!(TerrainPreset::choose(Region::Icy, 4), TerrainPreset::SNOW_PLANES);
        assert_eq!(TerrainPreset::choose(Region::Icy, 7), TerrainPreset::ICY_MOUNTAIN);
        assert_eq!(TerrainPreset::choose(Region::Green, 3), TerrainPreset::SWAMP);
        assert_eq!(TerrainPreset::choose(Region::Green, 4), TerrainPreset::GREENLAND);
        assert_eq!(TerrainPreset::choose(Region::Green, 5), TerrainPreset::FOREST);
        assert_eq!(TerrainPreset::choose(Region::Tropical, 8), TerrainPreset::SWAMP);
        assert_eq!(TerrainPreset::choose(Region::Tropical, 9), TerrainPreset::JUNGLE);
        assert_eq!(TerrainPreset::choose(Region::Sand, 1), TerrainPreset::DESERT);
        assert_eq!(TerrainPreset::choose(Region::Lava, 1), TerrainPreset::VOLCANO);
    }

    #[test]
    fn test_parse_labels() {
        for preset in TerrainPreset::CATALOG {
            assert_eq!(preset.label.parse::<TerrainPreset>().unwrap(), preset);
        }
        assert_eq!("forest".parse::<TerrainPreset>().unwrap(), TerrainPreset::FOREST);
        assert!(matches!(
            "TUNDRA".parse::<TerrainPreset>(),
            Err(TerrainError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_surface_and_decorations() {
        assert_eq!(TerrainPreset::SNOW_PLANES.surface(), SurfaceKind::Snow);
        assert_eq!(TerrainPreset::VOLCANO.surface(), SurfaceKind::Lava);
        assert_eq!(TerrainPreset::FOREST.surface(), SurfaceKind::Grass);
        assert_eq!(TerrainPreset::JUNGLE.decoration_set(), DecorationSet::Jungle);
        assert_eq!(TerrainPreset::GREENLAND.decoration_set(), DecorationSet::Green);
    }

    #[test]
    fn test_region_layers() {
        for layer in Region::MIN_LAYER..=Region::MAX_LAYER {
            let region = Region::from_layer(layer).unwrap();
            assert_eq!(region.layer(), layer);
        }
        assert_eq!(Region::from_layer(2), None);
        assert_eq!(Region::from_layer(-4), None);
        assert_eq!(Region::Tropical.to_string(), "TROPICAL");
    }
}
