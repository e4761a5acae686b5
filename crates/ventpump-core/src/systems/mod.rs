//! Systems - logic that queries and updates components

mod commands;
mod presentation;
mod unlock;
mod vents;

pub use commands::*;
pub use presentation::*;
pub use unlock::*;
pub use vents::*;

use hecs::{Entity, World};
use serde_json::Value;
use ventpump_logic::lockout::UnlockOutcome;

use crate::components::{DeviceAddress, DeviceState};

/// Packet queued for the device network.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingPacket {
    pub from: String,
    pub to: String,
    pub payload: Value,
}

/// Reply to an unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockResult {
    pub entity: Entity,
    pub outcome: UnlockOutcome,
}

/// Everything a tick hands back to the host, drained by the engine's `take_*` calls.
#[derive(Debug, Default)]
pub struct HostOutputs {
    pub outbox: Vec<OutgoingPacket>,
    pub visuals: Vec<VisualEvent>,
    pub unlock_results: Vec<UnlockResult>,
}

/// Network address, or the entity id for unaddressed devices.
pub fn device_name(world: &World, entity: Entity) -> String {
    world
        .get::<&DeviceAddress>(entity)
        .map(|a| a.0.clone())
        .unwrap_or_else(|_| format!("{:?}", entity))
}

/// Device state, defaulting to powered + anchored when the component is missing.
pub fn device_state(world: &World, entity: Entity) -> DeviceState {
    world
        .get::<&DeviceState>(entity)
        .map(|s| *s)
        .unwrap_or_default()
}
