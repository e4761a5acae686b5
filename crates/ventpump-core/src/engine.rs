//! Simulation engine - main entry point for running vent pumps

use hecs::{Entity, Ref, World};
use ventpump_logic::audit::{AuditLog, AuditSink};
use ventpump_logic::constants::ports;
use ventpump_logic::diagnostics::GasScan;
use ventpump_logic::gas::IdealGasMixture;
use ventpump_logic::regulator::VentPumpRegulator;

use crate::atmosphere::TileAtmosphere;
use crate::components::*;
use crate::error::EngineError;
use crate::systems::*;

/// Nominal volume of a vent's pipe segment, litres.
pub const VENT_NODE_VOLUME: f32 = 200.0;

/// Everything needed to place one vent pump.
#[derive(Debug, Clone)]
pub struct VentSpawn {
    pub address: String,
    pub tile: TilePosition,
    pub regulator: VentPumpRegulator,
    pub state: DeviceState,
    pub nodes: NodeContainer,
}

impl VentSpawn {
    /// Stock vent with a single "pipe" node on `network`.
    pub fn new(address: impl Into<String>, tile: TilePosition, network: Entity) -> Self {
        Self {
            address: address.into(),
            tile,
            regulator: VentPumpRegulator::new(Default::default()),
            state: DeviceState::default(),
            nodes: NodeContainer::new().with_node(ports::PIPE, network, VENT_NODE_VOLUME),
        }
    }

    pub fn with_regulator(mut self, regulator: VentPumpRegulator) -> Self {
        self.regulator = regulator;
        self
    }

    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }
}

/// Main simulation engine
pub struct VentSimulation<A: AuditSink = AuditLog> {
    /// ECS world containing vents and pipe networks
    pub world: World,
    /// Ambient gas per tile
    pub atmosphere: TileAtmosphere,
    /// Simulation time in seconds since start
    sim_time: f64,
    time_scale: f32,

    commands: CommandQueue,
    unlocks: UnlockQueue,
    outputs: HostOutputs,
    audit: A,
    last_sweep: SweepStats,
}

impl VentSimulation<AuditLog> {
    /// Create a new empty simulation with an in-memory audit log
    pub fn new() -> Self {
        Self::with_audit_sink(AuditLog::new())
    }
}

impl Default for VentSimulation<AuditLog> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AuditSink> VentSimulation<A> {
    /// Create a new empty simulation that audits config changes into `audit`
    pub fn with_audit_sink(audit: A) -> Self {
        Self {
            world: World::new(),
            atmosphere: TileAtmosphere::new(),
            sim_time: 0.0,
            time_scale: 1.0,
            commands: CommandQueue::new(),
            unlocks: UnlockQueue::new(),
            outputs: HostOutputs::default(),
            audit,
            last_sweep: SweepStats::default(),
        }
    }

    /// Add a pipe network holding `air`.
    pub fn add_pipe_network(&mut self, air: IdealGasMixture) -> Entity {
        self.world.spawn((PipeNetwork { air },))
    }

    /// Place a vent and emit its initial presentation state.
    pub fn spawn_vent(&mut self, spawn: VentSpawn) -> Entity {
        let VentSpawn {
            address,
            tile,
            regulator,
            state,
            nodes,
        } = spawn;
        log::info!("spawned vent {} at ({}, {})", address, tile.x, tile.y);
        let entity = self.world.spawn((
            regulator,
            state,
            DeviceAddress(address),
            tile,
            nodes,
            Appearance::default(),
        ));
        refresh_visual(&self.world, entity, &mut self.outputs);
        entity
    }

    /// Queue a command for the next update.
    pub fn submit(&mut self, target: Entity, command: DeviceCommand) {
        self.commands.push(target, command);
    }

    /// Update the simulation by delta_seconds
    pub fn update(&mut self, delta_seconds: f32) {
        let scaled_delta = delta_seconds * self.time_scale;
        self.sim_time += scaled_delta as f64;

        while let Some(queued) = self.commands.pop() {
            let target = queued.target;
            if let Err(e) = apply_command(
                &self.world,
                &mut self.unlocks,
                &mut self.audit,
                &mut self.outputs,
                queued,
                self.sim_time,
            ) {
                log::warn!("dropped command for {:?}: {}", target, e);
            }
        }

        resolve_unlocks(&self.world, &mut self.unlocks, self.sim_time, &mut self.outputs);

        self.last_sweep = vent_update_system(
            &self.world,
            &mut self.atmosphere,
            scaled_delta,
            self.sim_time,
            &mut self.outputs,
        );
    }

    /// Set time scale (1.0 = real time)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, 100.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Totals from the most recent vent sweep
    pub fn last_sweep(&self) -> SweepStats {
        self.last_sweep
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn vent_count(&self) -> usize {
        self.world.query::<&VentPumpRegulator>().iter().count()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    pub fn take_outbox(&mut self) -> Vec<OutgoingPacket> {
        std::mem::take(&mut self.outputs.outbox)
    }

    pub fn take_visual_updates(&mut self) -> Vec<VisualEvent> {
        std::mem::take(&mut self.outputs.visuals)
    }

    pub fn take_unlock_results(&mut self) -> Vec<UnlockResult> {
        std::mem::take(&mut self.outputs.unlock_results)
    }

    /// Borrow a vent's regulator.
    pub fn regulator(&self, entity: Entity) -> Result<Ref<'_, VentPumpRegulator>, EngineError> {
        if !self.world.contains(entity) {
            return Err(EngineError::NoSuchDevice(entity));
        }
        self.world
            .get::<&VentPumpRegulator>(entity)
            .map_err(|_| EngineError::NotAVent(entity))
    }

    /// Analyzer readout of the vent's active node. `Ok(None)` when the node
    /// is unattached or its network has no volume.
    pub fn scan(&self, entity: Entity) -> Result<Option<GasScan<IdealGasMixture>>, EngineError> {
        let regulator = self.regulator(entity)?;
        let Ok(nodes) = self.world.get::<&NodeContainer>(entity) else {
            return Ok(None);
        };
        let Some(node) = nodes.get(regulator.active_node()) else {
            return Ok(None);
        };
        let Ok(network) = self.world.get::<&PipeNetwork>(node.network) else {
            return Ok(None);
        };
        Ok(regulator.scan(node.volume, &network.air))
    }

    /// Close-range inspection text, if the vent has anything to say.
    pub fn examine(&self, entity: Entity) -> Result<Option<&'static str>, EngineError> {
        Ok(self.regulator(entity)?.examine_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ventpump_logic::gas::GasMixture;

    fn simple_sim() -> (VentSimulation, Entity) {
        let mut sim = VentSimulation::new();
        let tile = TilePosition::new(0, 0);
        sim.atmosphere
            .set_air(tile, IdealGasMixture::at_pressure(90.0, 2500.0, 293.15));
        let network = sim.add_pipe_network(IdealGasMixture::at_pressure(1000.0, 400.0, 293.15));
        let vent = sim.spawn_vent(VentSpawn::new("vent-1", tile, network));
        (sim, vent)
    }

    #[test]
    fn test_engine_creation() {
        let sim = VentSimulation::new();
        assert_eq!(sim.vent_count(), 0);
        assert_eq!(sim.sim_time(), 0.0);
    }

    #[test]
    fn test_spawn_emits_initial_visual() {
        let (mut sim, vent) = simple_sim();
        let visuals = sim.take_visual_updates();
        assert_eq!(visuals.len(), 1);
        assert_eq!(visuals[0].entity, vent);
        assert_eq!(sim.vent_count(), 1);
    }

    #[test]
    fn test_engine_update() {
        let (mut sim, _) = simple_sim();
        let tile = TilePosition::new(0, 0);
        let before = sim.atmosphere.air(tile).unwrap().pressure();

        for _ in 0..10 {
            sim.update(0.5);
        }

        assert!((sim.sim_time() - 5.0).abs() < 1e-9);
        assert!(sim.atmosphere.air(tile).unwrap().pressure() > before);
        assert_eq!(sim.last_sweep().vents, 1);
    }

    #[test]
    fn test_time_scale() {
        let (mut sim, _) = simple_sim();
        sim.set_time_scale(2.0);
        sim.update(1.0);
        assert!((sim.sim_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stale_entity_errors() {
        let (mut sim, vent) = simple_sim();
        sim.world.despawn(vent).unwrap();
        assert!(matches!(sim.regulator(vent), Err(EngineError::NoSuchDevice(e)) if e == vent));
        assert!(sim.scan(vent).is_err());
    }

    #[test]
    fn test_scan_normalizes_to_node_volume() {
        let (sim, vent) = simple_sim();
        let scan = sim.scan(vent).unwrap().expect("node attached");
        assert_eq!(scan.node, "pipe");
        assert_eq!(scan.mixture.volume(), VENT_NODE_VOLUME);
        // Same gas, half the volume: pressure is unchanged.
        assert!((scan.mixture.pressure() - 1000.0).abs() < 0.1);
    }
}
