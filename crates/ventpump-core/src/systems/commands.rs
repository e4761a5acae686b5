//! Device command queue - remote packets, signals, alarms and physical changes.
//!
//! Commands are queued from anywhere and drained on the tick thread before
//! the vent sweep, so a device's config is never touched by two writers at
//! once.

use std::collections::VecDeque;

use hecs::{Entity, World};
use serde_json::Value;
use ventpump_logic::audit::AuditSink;
use ventpump_logic::config::ModeSignal;
use ventpump_logic::lockout::UnlockOutcome;
use ventpump_logic::network::PacketResponse;
use ventpump_logic::regulator::{AlarmType, VentPumpRegulator};

use super::{
    device_name, device_state, interrupt_unlock, refresh_visual, HostOutputs, OutgoingPacket,
    UnlockQueue, UnlockResult,
};
use crate::components::DeviceState;
use crate::error::EngineError;

/// Something that happened to a device between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Device-network packet from `sender`.
    Packet { sender: String, payload: Value },
    /// Signal on a named input port.
    Signal(String),
    /// Air alarm state broadcast.
    Alarm(AlarmType),
    SetWelded(bool),
    SetPowered(bool),
    SetAnchored(bool),
    /// Someone started the manual unlock interaction.
    StartUnlock,
    /// The unlock interaction was broken off (damage, moved hands, ...).
    InterruptUnlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCommand {
    pub target: Entity,
    pub command: DeviceCommand,
}

/// FIFO of commands waiting for the next tick (singleton-like, stored in engine)
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: VecDeque<QueuedCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: Entity, command: DeviceCommand) {
        self.pending.push_back(QueuedCommand { target, command });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pop(&mut self) -> Option<QueuedCommand> {
        self.pending.pop_front()
    }
}

/// Apply one command to its target.
pub fn apply_command<A: AuditSink>(
    world: &World,
    unlocks: &mut UnlockQueue,
    audit: &mut A,
    outputs: &mut HostOutputs,
    queued: QueuedCommand,
    now: f64,
) -> Result<(), EngineError> {
    let QueuedCommand { target, command } = queued;
    if !world.contains(target) {
        return Err(EngineError::NoSuchDevice(target));
    }
    if world.get::<&VentPumpRegulator>(target).is_err() {
        return Err(EngineError::NotAVent(target));
    }
    let name = device_name(world, target);

    match command {
        DeviceCommand::Packet { sender, payload } => {
            let response = {
                let mut regulator = regulator_mut(world, target)?;
                regulator.handle_packet(&payload)
            };
            match response {
                Ok(PacketResponse::Reply(reply)) => outputs.outbox.push(OutgoingPacket {
                    from: name,
                    to: sender,
                    payload: reply,
                }),
                Ok(PacketResponse::Applied(changes)) => {
                    for change in &changes {
                        if let Err(e) = audit.record(&name, change) {
                            log::warn!("{}: {}", name, e);
                        }
                    }
                    refresh_visual(world, target, outputs);
                }
                Err(e) => log::warn!("{} ignored packet from {}: {}", name, sender, e),
            }
        }
        DeviceCommand::Signal(port) => {
            let Some(signal) = ModeSignal::from_port(&port) else {
                log::debug!("{} has no port '{}'", name, port);
                return Ok(());
            };
            let switched = regulator_mut(world, target)?.apply_mode_signal(signal);
            if switched {
                log::info!("{} switched to {:?}", name, signal);
                refresh_visual(world, target, outputs);
            }
        }
        DeviceCommand::Alarm(alarm) => {
            regulator_mut(world, target)?.on_alarm(alarm);
            if alarm != AlarmType::Warning {
                log::info!("{} alarm {:?}", name, alarm);
            }
            refresh_visual(world, target, outputs);
        }
        DeviceCommand::SetWelded(welded) => {
            update_state(world, target, |s| s.welded = welded);
            if welded {
                interrupt_unlock(world, unlocks, target, outputs);
            }
            refresh_visual(world, target, outputs);
        }
        DeviceCommand::SetPowered(powered) => {
            update_state(world, target, |s| s.powered = powered);
            refresh_visual(world, target, outputs);
        }
        DeviceCommand::SetAnchored(anchored) => {
            update_state(world, target, |s| s.anchored = anchored);
            if !anchored {
                interrupt_unlock(world, unlocks, target, outputs);
            }
        }
        DeviceCommand::StartUnlock => {
            let anchored = device_state(world, target).anchored;
            let started = regulator_mut(world, target)?.begin_unlock(now, anchored);
            match started {
                Ok(ready_at) => unlocks.start(target, ready_at),
                Err(e) => {
                    log::warn!("{} unlock refused: {}", name, e);
                    outputs.unlock_results.push(UnlockResult {
                        entity: target,
                        outcome: UnlockOutcome::Cancelled,
                    });
                }
            }
        }
        DeviceCommand::InterruptUnlock => interrupt_unlock(world, unlocks, target, outputs),
    }

    Ok(())
}

fn regulator_mut(
    world: &World,
    entity: Entity,
) -> Result<hecs::RefMut<'_, VentPumpRegulator>, EngineError> {
    world
        .get::<&mut VentPumpRegulator>(entity)
        .map_err(|_| EngineError::NotAVent(entity))
}

fn update_state(world: &World, entity: Entity, f: impl FnOnce(&mut DeviceState)) {
    if let Ok(mut state) = world.get::<&mut DeviceState>(entity) {
        f(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ventpump_logic::audit::AuditLog;
    use ventpump_logic::config::{PumpDirection, VentPumpConfig};
    use ventpump_logic::network::set_state_payload;

    use crate::components::{Appearance, DeviceAddress};

    fn spawn_vent(world: &mut World) -> Entity {
        world.spawn((
            VentPumpRegulator::new(VentPumpConfig::default()),
            DeviceState::default(),
            DeviceAddress("vent-1".into()),
            Appearance::default(),
        ))
    }

    fn run(
        world: &World,
        audit: &mut AuditLog,
        target: Entity,
        command: DeviceCommand,
    ) -> HostOutputs {
        let mut outputs = HostOutputs::default();
        let mut unlocks = UnlockQueue::new();
        apply_command(
            world,
            &mut unlocks,
            audit,
            &mut outputs,
            QueuedCommand { target, command },
            0.0,
        )
        .unwrap();
        outputs
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut world = World::new();
        let e = world.spawn(());
        let mut queue = CommandQueue::new();
        queue.push(e, DeviceCommand::SetPowered(false));
        queue.push(e, DeviceCommand::SetPowered(true));
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.pop().unwrap().command,
            DeviceCommand::SetPowered(false)
        );
    }

    #[test]
    fn test_sync_packet_replies_to_sender() {
        let mut world = World::new();
        let vent = spawn_vent(&mut world);
        let mut audit = AuditLog::new();
        let outputs = run(
            &world,
            &mut audit,
            vent,
            DeviceCommand::Packet {
                sender: "alarm-3".into(),
                payload: json!({ "command": "sync_data" }),
            },
        );
        assert_eq!(outputs.outbox.len(), 1);
        assert_eq!(outputs.outbox[0].from, "vent-1");
        assert_eq!(outputs.outbox[0].to, "alarm-3");
    }

    #[test]
    fn test_set_state_audits_and_refreshes() {
        let mut world = World::new();
        let vent = spawn_vent(&mut world);
        let mut audit = AuditLog::new();
        let target = VentPumpConfig {
            direction: PumpDirection::Siphoning,
            ..Default::default()
        };
        let outputs = run(
            &world,
            &mut audit,
            vent,
            DeviceCommand::Packet {
                sender: "alarm-3".into(),
                payload: set_state_payload(&target),
            },
        );
        assert_eq!(audit.entries.len(), 1);
        assert_eq!(audit.entries[0].message, "vent-1 direction changed to Siphoning");
        assert_eq!(outputs.visuals.len(), 1);
    }

    #[test]
    fn test_bad_packet_is_ignored() {
        let mut world = World::new();
        let vent = spawn_vent(&mut world);
        let mut audit = AuditLog::new();
        let outputs = run(
            &world,
            &mut audit,
            vent,
            DeviceCommand::Packet {
                sender: "alarm-3".into(),
                payload: json!({ "command": "set_state", "set_state": { "enabled": false } }),
            },
        );
        assert!(outputs.outbox.is_empty());
        assert!(audit.entries.is_empty());
        assert!(world.get::<&VentPumpRegulator>(vent).unwrap().config.enabled);
    }

    #[test]
    fn test_unknown_target() {
        let mut world = World::new();
        let stray = world.spawn(());
        let mut outputs = HostOutputs::default();
        let err = apply_command(
            &world,
            &mut UnlockQueue::new(),
            &mut AuditLog::new(),
            &mut outputs,
            QueuedCommand {
                target: stray,
                command: DeviceCommand::SetPowered(true),
            },
            0.0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::NotAVent(stray));
    }

    #[test]
    fn test_unlock_refused_when_not_locked_out() {
        let mut world = World::new();
        let vent = spawn_vent(&mut world);
        let outputs = run(&world, &mut AuditLog::new(), vent, DeviceCommand::StartUnlock);
        assert_eq!(
            outputs.unlock_results,
            vec![UnlockResult {
                entity: vent,
                outcome: UnlockOutcome::Cancelled
            }]
        );
    }
}
