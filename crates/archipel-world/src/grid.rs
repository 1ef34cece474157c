//! Coarse world grid tracking which cells around the viewer are loaded.

use archipel_terrain::{IslandPlacer, Region};
use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::IslandId;

/// Integer index of a world cell.
pub type CellKey = [i32; 3];

/// A loaded world cell.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldCell {
    pub position: Vec3,
    pub region: Region,
    /// Seeded island position, if the cell holds one.
    pub island_position: Option<Vec3>,
    /// Island spawned for this cell, once the world created it.
    pub island: Option<IslandId>,
}

/// A cell loaded by the latest [`WorldGrid::update`] that holds an island.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IslandSite {
    pub cell: CellKey,
    pub position: Vec3,
    pub region: Region,
}

pub struct WorldGrid {
    placer: IslandPlacer,
    cells: FxHashMap<CellKey, WorldCell>,
    current: Option<CellKey>,
}

impl WorldGrid {
    pub fn new(placer: IslandPlacer) -> Self {
        Self {
            placer,
            cells: FxHashMap::default(),
            current: None,
        }
    }

    pub fn placer(&self) -> &IslandPlacer {
        &self.placer
    }

    pub fn key_of(&self, pos: Vec3) -> CellKey {
        let cell = self.placer.cell_position(pos) / self.placer.cell_size();
        [
            cell.x.round() as i32,
            cell.y.round() as i32,
            cell.z.round() as i32,
        ]
    }

    pub fn cell_position(&self, key: CellKey) -> Vec3 {
        Vec3::new(key[0] as f32, key[1] as f32, key[2] as f32) * self.placer.cell_size()
    }

    /// Track the viewer and load the cells around it.
    ///
    /// Only does work when the viewer entered a different cell. The viewer's
    /// cell and its 26 neighbours are loaded if they lie in a generated
    /// layer; newly loaded cells with an island are returned.
    pub fn update(&mut self, viewer: Vec3) -> Vec<IslandSite> {
        let key = self.key_of(viewer);
        if self.current == Some(key) {
            return Vec::new();
        }

        let mut sites = Vec::new();
        if !self.cells.contains_key(&key) && !self.load(key, &mut sites) {
            self.current = None;
            return sites;
        }
        self.current = Some(key);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let neighbour = [key[0] + dx, key[1] + dy, key[2] + dz];
                    if !self.cells.contains_key(&neighbour) {
                        self.load(neighbour, &mut sites);
                    }
                }
            }
        }
        sites
    }

    /// Load one cell. Returns `false` for cells outside the generated layers.
    fn load(&mut self, key: CellKey, sites: &mut Vec<IslandSite>) -> bool {
        let position = self.cell_position(key);
        let Some(region) = self.placer.region(position) else {
            return false;
        };
        let island_position = self.placer.place(position);
        if let Some(island_position) = island_position {
            sites.push(IslandSite {
                cell: key,
                position: island_position,
                region,
            });
        }
        self.cells.insert(
            key,
            WorldCell {
                position,
                region,
                island_position,
                island: None,
            },
        );
        true
    }

    /// Record the island spawned for a cell.
    pub fn attach_island(&mut self, key: CellKey, island: IslandId) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.island = Some(island);
        }
    }

    pub fn current(&self) -> Option<&WorldCell> {
        self.current.and_then(|key| self.cells.get(&key))
    }

    pub fn cell(&self, key: CellKey) -> Option<&WorldCell> {
        self.cells.get(&key)
    }

    pub fn loaded_len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &WorldCell)> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archipel_terrain::WorldRng;

    fn grid(seed: i32) -> WorldGrid {
        WorldGrid::new(IslandPlacer::new(
            WorldRng::new(seed),
            600.0,
            0.45,
            Vec3::new(160.0, 80.0, 160.0),
        ))
    }

    #[test]
    fn test_key_of_snaps_to_nearest_cell() {
        let g = grid(1);
        assert_eq!(g.key_of(Vec3::ZERO), [0, 0, 0]);
        assert_eq!(g.key_of(Vec3::new(299.0, -301.0, 900.0)), [0, -1, 2]);
        assert_eq!(g.cell_position([1, -2, 3]), Vec3::new(600.0, -1200.0, 1800.0));
    }

    #[test]
    fn test_update_loads_neighbourhood_once() {
        let mut g = grid(5);
        g.update(Vec3::ZERO);
        assert_eq!(g.loaded_len(), 27);
        assert_eq!(g.current().map(|c| c.region), Some(Region::Green));

        // Moving inside the same cell does nothing.
        assert!(g.update(Vec3::new(100.0, 50.0, -100.0)).is_empty());
        assert_eq!(g.loaded_len(), 27);

        // One cell east adds the next slab of nine.
        g.update(Vec3::new(600.0, 0.0, 0.0));
        assert_eq!(g.loaded_len(), 36);
    }

    #[test]
    fn test_layers_outside_band_are_not_loaded() {
        let mut g = grid(5);
        // Icy layer: the layer above it is never generated.
        g.update(Vec3::new(0.0, 600.0, 0.0));
        assert_eq!(g.loaded_len(), 18);
        assert!(g.cells().all(|(key, _)| key[1] <= 1));

        // Above the band nothing loads at all.
        let mut g = grid(5);
        assert!(g.update(Vec3::new(0.0, 1800.0, 0.0)).is_empty());
        assert_eq!(g.loaded_len(), 0);
        assert!(g.current().is_none());
    }

    #[test]
    fn test_sites_match_cells_and_are_deterministic() {
        let mut a = grid(31);
        let mut b = grid(31);
        let sites = a.update(Vec3::ZERO);
        assert_eq!(sites, b.update(Vec3::ZERO));

        for site in &sites {
            let cell = a.cell(site.cell).unwrap();
            assert_eq!(cell.island_position, Some(site.position));
            assert_eq!(cell.region, site.region);
        }
        let with_island = a.cells().filter(|(_, c)| c.island_position.is_some()).count();
        assert_eq!(with_island, sites.len());

        let key = sites.first().map(|s| s.cell).unwrap_or([0, 0, 0]);
        a.attach_island(key, 3);
        if !sites.is_empty() {
            assert_eq!(a.cell(key).unwrap().island, Some(3));
        }
    }
}
