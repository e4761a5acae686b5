//! Tile atmosphere - the ambient gas each device sits in.
//!
//! Every tile either holds a mixture or is air-blocked (a wall, a closed
//! firelock). Tiles that were never registered resolve to nothing, the same
//! as blocked ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ventpump_logic::gas::{AtmosphereEngine, IdealGasMixture};

use crate::components::TilePosition;

/// One grid tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tile {
    Open(IdealGasMixture),
    Blocked,
}

/// Tile-keyed ambient gas.
#[derive(Debug, Clone, Default)]
pub struct TileAtmosphere {
    tiles: HashMap<TilePosition, Tile>,
}

impl TileAtmosphere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a tile's mixture.
    pub fn set_air(&mut self, pos: TilePosition, air: IdealGasMixture) {
        self.tiles.insert(pos, Tile::Open(air));
    }

    /// Seal a tile. Its gas is discarded.
    pub fn block(&mut self, pos: TilePosition) {
        self.tiles.insert(pos, Tile::Blocked);
    }

    pub fn air(&self, pos: TilePosition) -> Option<&IdealGasMixture> {
        match self.tiles.get(&pos) {
            Some(Tile::Open(air)) => Some(air),
            _ => None,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl AtmosphereEngine for TileAtmosphere {
    type Location = TilePosition;
    type Mixture = IdealGasMixture;

    fn containing_mixture(&mut self, location: &TilePosition) -> Option<&mut IdealGasMixture> {
        match self.tiles.get_mut(location) {
            Some(Tile::Open(air)) => Some(air),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_tile_resolves() {
        let mut atmo = TileAtmosphere::new();
        let pos = TilePosition::new(1, 2);
        atmo.set_air(pos, IdealGasMixture::at_pressure(101.325, 2500.0, 293.15));
        assert!(atmo.containing_mixture(&pos).is_some());
    }

    #[test]
    fn test_blocked_and_unknown_tiles_resolve_to_none() {
        let mut atmo = TileAtmosphere::new();
        let pos = TilePosition::new(0, 0);
        atmo.set_air(pos, IdealGasMixture::vacuum(2500.0, 293.15));
        atmo.block(pos);
        assert!(atmo.containing_mixture(&pos).is_none());
        assert!(atmo.containing_mixture(&TilePosition::new(9, 9)).is_none());
        assert_eq!(atmo.tile_count(), 1);
    }
}
