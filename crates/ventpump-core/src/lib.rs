//! VentPump Core - vent pump devices in an ECS world
//!
//! Hosts any number of vent pumps on a tile grid, each attached to pipe
//! networks, and drives them with the pure regulation logic from
//! `ventpump_logic`.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Vent pumps and pipe networks
//! - **Components**: Device state, addresses, tiles, pipe nodes, the regulator itself
//! - **Systems**: Command drain, unlock timers, the vent sweep, presentation refresh
//!
//! Ambient gas lives outside the world in [`atmosphere::TileAtmosphere`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ventpump_core::prelude::*;
//!
//! let mut sim = VentSimulation::new();
//! let tile = TilePosition::new(0, 0);
//! sim.atmosphere.set_air(tile, IdealGasMixture::at_pressure(90.0, 2500.0, 293.15));
//! let network = sim.add_pipe_network(IdealGasMixture::at_pressure(300.0, 200.0, 293.15));
//! let vent = sim.spawn_vent(VentSpawn::new("vent-1", tile, network));
//!
//! loop {
//!     sim.update(0.5);
//!     for packet in sim.take_outbox() {
//!         println!("{} -> {}: {}", packet.from, packet.to, packet.payload);
//!     }
//! #   let _ = vent;
//! }
//! ```

pub mod atmosphere;
pub mod components;
pub mod engine;
pub mod error;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::atmosphere::TileAtmosphere;
    pub use crate::components::*;
    pub use crate::engine::{VentSimulation, VentSpawn};
    pub use crate::error::EngineError;
    pub use crate::systems::{DeviceCommand, OutgoingPacket, SweepStats, UnlockResult, VisualEvent};
    pub use ventpump_logic::audit::{AuditLog, AuditSink};
    pub use ventpump_logic::config::{DeviceSettings, PressureChecks, PumpDirection, VentPumpConfig};
    pub use ventpump_logic::gas::{GasMixture, IdealGasMixture};
    pub use ventpump_logic::regulator::{AlarmType, VentPumpRegulator};
}
