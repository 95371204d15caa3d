//! Circuit validation.

use crate::error::{Result, VoltaicError};

use super::{Circuit, NodeId};

/// Validate a circuit for simulation.
///
/// Checks:
/// - At least one component is registered
/// - Ground is among the registered nodes
/// - Every registered node reaches ground through some component
///
/// The solver detects singular systems on its own; this is a cheaper
/// pre-flight check that names the offending node.
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    if circuit.components().is_empty() {
        return Err(VoltaicError::InvalidTopology {
            message: "Circuit has no components".to_string(),
        });
    }

    if !circuit.is_registered(NodeId::GROUND) {
        return Err(VoltaicError::MissingGround);
    }

    // Flood fill from ground over component edges
    let num_nodes = circuit.num_nodes();
    let mut reached = vec![false; num_nodes];
    reached[0] = true;
    let mut changed = true;
    while changed {
        changed = false;
        for [a, b] in circuit.components().iter().filter_map(|c| c.nodes()) {
            if reached[a.0] != reached[b.0] {
                reached[a.0] = true;
                reached[b.0] = true;
                changed = true;
            }
        }
    }

    if let Some(node) = circuit.nodes().find(|n| !reached[n.id.0]) {
        return Err(VoltaicError::FloatingNode {
            node: node.id.to_string(),
        });
    }

    Ok(())
}
