//! Component models for circuit simulation.
//!
//! This module provides models for all supported circuit components:
//! - Linear: Resistor, Capacitor, Inductor
//! - Sources: Voltage Source with constant, sinusoidal or custom waveforms
//!
//! Each component implements stamping into the MNA matrix.

mod linear;
mod sources;

pub use linear::{Capacitor, Inductor, Resistor};
pub use sources::{VoltageSource, Waveform};

use crate::circuit::{Node, NodeId};
use crate::error::{Result, VoltaicError};
use crate::solver::{Analysis, SimulationState};

/// A circuit component.
#[derive(Debug, Clone)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
}

impl Component {
    /// Get the component kind as a lowercase name.
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Resistor(_) => "resistor",
            Component::Capacitor(_) => "capacitor",
            Component::Inductor(_) => "inductor",
            Component::VoltageSource(_) => "voltage source",
        }
    }

    /// The two nodes this component bridges, once connected.
    pub fn nodes(&self) -> Option<[NodeId; 2]> {
        match self {
            Component::Resistor(r) => r.nodes,
            Component::Capacitor(c) => c.nodes,
            Component::Inductor(l) => l.nodes,
            Component::VoltageSource(v) => v.nodes,
        }
    }

    pub(crate) fn connect(&mut self, n1: NodeId, n2: NodeId) {
        let nodes = Some([n1, n2]);
        match self {
            Component::Resistor(r) => r.nodes = nodes,
            Component::Capacitor(c) => c.nodes = nodes,
            Component::Inductor(l) => l.nodes = nodes,
            Component::VoltageSource(v) => v.nodes = nodes,
        }
    }

    /// Add this component's contribution to the MNA system.
    pub fn stamp(&self, state: &mut SimulationState<'_>) {
        match self {
            Component::Resistor(r) => r.stamp(state),
            Component::Capacitor(c) => c.stamp(state),
            Component::Inductor(l) => l.stamp(state),
            Component::VoltageSource(v) => v.stamp(state),
        }
    }

    /// Assembly pass this component is stamped in. Stamps are additive, so
    /// this only fixes floating-point summation order; sources go last.
    pub fn stamp_order(&self) -> u8 {
        match self {
            Component::Resistor(_) => 0,
            Component::Capacitor(_) => 1,
            Component::Inductor(_) => 2,
            Component::VoltageSource(_) => 3,
        }
    }

    /// Number of branch-current unknowns this component adds to the system.
    pub fn branch_count(&self, analysis: Analysis) -> usize {
        match (self, analysis) {
            (Component::VoltageSource(_), _) => 1,
            (Component::Inductor(_), Analysis::Dc) => 1,
            _ => 0,
        }
    }

    /// Current through the component from node 1 to node 2 (out of the
    /// positive terminal for sources). Unconnected components report 0.
    pub fn current(&self, nodes: &[Node]) -> f64 {
        if self.nodes().is_none() {
            return 0.0;
        }
        match self {
            Component::Resistor(r) => r.current(nodes),
            Component::Capacitor(c) => c.current(),
            Component::Inductor(l) => l.current(),
            Component::VoltageSource(v) => v.current(),
        }
    }

    /// Commit solved results into the component's own state.
    pub(crate) fn update_state(
        &mut self,
        nodes: &[Node],
        dt: f64,
        analysis: Analysis,
        branch_current: Option<f64>,
    ) {
        match self {
            Component::Resistor(_) => {}
            Component::Capacitor(c) => c.update_state(nodes, dt, analysis),
            Component::Inductor(l) => l.update_state(nodes, dt, analysis, branch_current),
            Component::VoltageSource(v) => {
                // The MNA unknown flows into the positive terminal.
                if let Some(i) = branch_current {
                    v.set_current(-i);
                }
            }
        }
    }

    pub fn as_resistor(&self) -> Option<&Resistor> {
        match self {
            Component::Resistor(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_capacitor(&self) -> Option<&Capacitor> {
        match self {
            Component::Capacitor(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_inductor(&self) -> Option<&Inductor> {
        match self {
            Component::Inductor(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_voltage_source(&self) -> Option<&VoltageSource> {
        match self {
            Component::VoltageSource(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Resistor> for Component {
    fn from(r: Resistor) -> Self {
        Component::Resistor(r)
    }
}

impl From<Capacitor> for Component {
    fn from(c: Capacitor) -> Self {
        Component::Capacitor(c)
    }
}

impl From<Inductor> for Component {
    fn from(l: Inductor) -> Self {
        Component::Inductor(l)
    }
}

impl From<VoltageSource> for Component {
    fn from(v: VoltageSource) -> Self {
        Component::VoltageSource(v)
    }
}

/// Solved voltage of a terminal; ground and unknown ids read as 0.
pub(crate) fn terminal_voltage(nodes: &[Node], id: NodeId) -> f64 {
    if id.is_ground() {
        return 0.0;
    }
    nodes.get(id.0).map_or(0.0, |n| n.voltage)
}

fn validate_value(kind: &'static str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VoltaicError::invalid_component(
            kind,
            format!("{what} must be finite and positive, got {value}"),
        ))
    }
}
