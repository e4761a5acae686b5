//! Presentation refresh - emits sprite/ambience changes for the renderer.

use hecs::{Entity, World};
use ventpump_logic::regulator::VentPumpRegulator;
use ventpump_logic::visuals::VisualUpdate;

use super::{device_state, HostOutputs};
use crate::components::Appearance;

/// A device's presentation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualEvent {
    pub entity: Entity,
    pub update: VisualUpdate,
}

/// Recompute a vent's presentation and emit it if it differs from the last one sent.
pub fn refresh_visual(world: &World, entity: Entity, outputs: &mut HostOutputs) {
    let state = device_state(world, entity);
    let update = match world.get::<&VentPumpRegulator>(entity) {
        Ok(regulator) => regulator.visual(state.welded, state.powered),
        Err(_) => return,
    };

    if let Ok(mut appearance) = world.get::<&mut Appearance>(entity) {
        if appearance.current == Some(update) {
            return;
        }
        appearance.current = Some(update);
    }
    outputs.visuals.push(VisualEvent { entity, update });
}
