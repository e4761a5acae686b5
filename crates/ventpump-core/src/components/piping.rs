//! Pipe components: networks that own gas, and the named nodes devices attach through.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use ventpump_logic::gas::IdealGasMixture;

/// A connected run of pipe sharing one mixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeNetwork {
    pub air: IdealGasMixture,
}

/// A named connection point on a device.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeNode {
    pub name: String,
    /// Network entity this node belongs to.
    pub network: Entity,
    /// Nominal volume of this pipe segment.
    pub volume: f32,
}

/// All pipe nodes on a device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeContainer {
    pub nodes: Vec<PipeNode>,
}

impl NodeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, name: impl Into<String>, network: Entity, volume: f32) -> Self {
        self.nodes.push(PipeNode {
            name: name.into(),
            network,
            volume,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&PipeNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}
