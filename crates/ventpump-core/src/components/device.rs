//! Device components: physical state, addressing, placement, appearance.

use serde::{Deserialize, Serialize};
use ventpump_logic::visuals::VisualUpdate;

/// Mechanical and electrical state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Sealed shut with a welder.
    pub welded: bool,
    pub powered: bool,
    /// Bolted to the floor.
    pub anchored: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            welded: false,
            powered: true,
            anchored: true,
        }
    }
}

/// Device-network address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress(pub String);

/// Grid tile the device sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Last presentation state sent out, so only changes are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub current: Option<VisualUpdate>,
}
