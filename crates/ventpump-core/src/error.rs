//! Engine-level errors.

use hecs::Entity;

/// Errors raised when addressing devices in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The entity was despawned or never existed.
    NoSuchDevice(Entity),
    /// The entity exists but has no vent regulator.
    NotAVent(Entity),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoSuchDevice(e) => write!(f, "No such device: {:?}", e),
            EngineError::NotAVent(e) => write!(f, "Device {:?} is not a vent pump", e),
        }
    }
}

impl std::error::Error for EngineError {}
