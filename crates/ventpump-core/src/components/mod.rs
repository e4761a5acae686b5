//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! The vent's behavior lives in `ventpump_logic`; systems wire it to the world.

mod device;
mod piping;

pub use device::*;
pub use piping::*;
