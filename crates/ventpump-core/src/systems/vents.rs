//! Vent sweep - runs every vent's regulator once and applies its transfer.

use hecs::{Entity, World};
use ventpump_logic::config::PumpDirection;
use ventpump_logic::gas::AtmosphereEngine;
use ventpump_logic::regulator::{TickContext, TransferOutcome, VentPumpRegulator};

use super::{device_name, device_state, refresh_visual, HostOutputs};
use crate::atmosphere::TileAtmosphere;
use crate::components::{NodeContainer, PipeNetwork, TilePosition};

/// Totals from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepStats {
    pub vents: usize,
    pub transfers: usize,
    pub moles_released: f32,
    pub moles_siphoned: f32,
}

/// Tick every vent in the world.
pub fn vent_update_system(
    world: &World,
    atmosphere: &mut TileAtmosphere,
    dt: f32,
    now: f64,
    outputs: &mut HostOutputs,
) -> SweepStats {
    let vents: Vec<Entity> = world
        .query::<&VentPumpRegulator>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    let mut stats = SweepStats::default();
    for entity in vents {
        stats.vents += 1;
        let outcome = tick_vent(world, atmosphere, entity, dt, now, outputs);
        if let Some(TransferOutcome::Transfer(transfer)) = outcome {
            stats.transfers += 1;
            match transfer.direction {
                PumpDirection::Releasing => stats.moles_released += transfer.moles,
                PumpDirection::Siphoning => stats.moles_siphoned += transfer.moles,
            }
        }
    }
    stats
}

fn tick_vent(
    world: &World,
    atmosphere: &mut TileAtmosphere,
    entity: Entity,
    dt: f32,
    now: f64,
    outputs: &mut HostOutputs,
) -> Option<TransferOutcome> {
    let state = device_state(world, entity);
    let ctx = TickContext {
        dt,
        welded: state.welded,
        powered: state.powered,
    };
    let tile = world.get::<&TilePosition>(entity).map(|t| *t).ok();
    let node = match (
        world.get::<&VentPumpRegulator>(entity),
        world.get::<&NodeContainer>(entity),
    ) {
        (Ok(regulator), Ok(nodes)) => nodes.get(regulator.active_node()).cloned(),
        _ => None,
    };

    let report = {
        let mut network = node
            .as_ref()
            .and_then(|n| world.get::<&mut PipeNetwork>(n.network).ok());
        let environment = match tile {
            Some(t) => atmosphere.containing_mixture(&t),
            None => None,
        };

        let report = world.get::<&mut VentPumpRegulator>(entity).ok()?.tick(
            now,
            &ctx,
            network.as_deref().map(|n| &n.air),
            environment.as_deref(),
        );

        if let (Some(transfer), Some(network), Some(environment)) =
            (report.outcome.instruction(), network.as_deref_mut(), environment)
        {
            transfer.apply(&mut network.air, environment);
            log::debug!(
                "{} {:?} {:.4} mol{}",
                device_name(world, entity),
                transfer.direction,
                transfer.moles,
                if transfer.leak { " (lockout leak)" } else { "" }
            );
        }
        report
    };

    if report.override_expired {
        log::info!("{} manual lockout override expired", device_name(world, entity));
    }
    if report.lockout_changed {
        let engaged = world
            .get::<&VentPumpRegulator>(entity)
            .map(|r| r.under_pressure_lockout())
            .unwrap_or(false);
        log::info!(
            "{} under-pressure lockout {}",
            device_name(world, entity),
            if engaged { "engaged" } else { "released" }
        );
        refresh_visual(world, entity, outputs);
    }

    Some(report.outcome)
}
