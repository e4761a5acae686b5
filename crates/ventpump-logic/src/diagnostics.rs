//! Gas analyzer readout for a vent's active pipe node.
//!
//! A pipe node's mixture is the whole network's. The scan scales it down to
//! the node's own nominal volume so an analyzer sees one segment's worth.

use serde::{Deserialize, Serialize};

use crate::gas::GasMixture;
use crate::regulator::VentPumpRegulator;

/// One analyzed segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasScan<G> {
    pub node: String,
    pub mixture: G,
}

/// Volume-normalize `network_air` to `node_volume`. `None` for a zero-volume network.
pub fn scan_node<G: GasMixture>(
    node: &str,
    node_volume: f32,
    network_air: &G,
) -> Option<GasScan<G>> {
    let network_volume = network_air.volume();
    if network_volume == 0.0 {
        return None;
    }
    let mut local = network_air.clone();
    local.multiply(node_volume / network_volume);
    local.set_volume(node_volume);
    Some(GasScan {
        node: node.to_string(),
        mixture: local,
    })
}

impl VentPumpRegulator {
    /// Scan the node the current direction draws on.
    pub fn scan<G: GasMixture>(&self, node_volume: f32, network_air: &G) -> Option<GasScan<G>> {
        scan_node(self.active_node(), node_volume, network_air)
    }
}
