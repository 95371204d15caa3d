//! Linear passive components: Resistor, Capacitor, Inductor.

use crate::circuit::{Node, NodeId};
use crate::error::{Result, VoltaicError};
use crate::solver::{Analysis, SimulationState};

use super::{terminal_voltage, validate_value};

/// A resistor component.
#[derive(Debug, Clone)]
pub struct Resistor {
    /// [positive, negative], set when the resistor is added to a circuit
    pub nodes: Option<[NodeId; 2]>,
    resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    ///
    /// # Panics
    /// Panics if `resistance` is not finite and positive. Use
    /// [`Resistor::try_new`] for values that are not known up front.
    pub fn new(resistance: f64) -> Self {
        match Self::try_new(resistance) {
            Ok(r) => r,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a new resistor, rejecting non-positive or non-finite values.
    pub fn try_new(resistance: f64) -> Result<Self> {
        validate_value("resistor", "resistance", resistance)?;
        Ok(Self {
            nodes: None,
            resistance,
        })
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }

    /// Resistors are memoryless: the same conductance in every analysis.
    pub fn stamp(&self, state: &mut SimulationState<'_>) {
        let Some([n1, n2]) = self.nodes else {
            return;
        };
        state
            .matrix
            .stamp_conductance(n1.matrix_index(), n2.matrix_index(), self.conductance());
    }

    /// Current from node 1 to node 2 by Ohm's law, 0 when unconnected.
    pub fn current(&self, nodes: &[Node]) -> f64 {
        match self.nodes {
            Some([n1, n2]) => {
                (terminal_voltage(nodes, n1) - terminal_voltage(nodes, n2)) / self.resistance
            }
            None => 0.0,
        }
    }
}

/// A capacitor component.
///
/// In discrete-time simulation, a capacitor is modeled using a companion model.
/// Using backward Euler:
///   i(t) = (C/dt) * (v(t) - v(t-dt))
///
/// This gives an equivalent conductance G_eq = C/dt in parallel with a
/// current source I_eq = G_eq * v(t-dt) injected into the positive node.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub nodes: Option<[NodeId; 2]>,
    capacitance: f64,

    // State for discrete-time model
    /// Voltage across the capacitor at the end of the previous step
    v_prev: f64,
    /// Current through the capacitor during the previous step
    i_prev: f64,
}

impl Capacitor {
    /// Create a new, uncharged capacitor.
    ///
    /// # Panics
    /// Panics if `capacitance` is not finite and positive.
    pub fn new(capacitance: f64) -> Self {
        match Self::try_new(capacitance) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(capacitance: f64) -> Result<Self> {
        validate_value("capacitor", "capacitance", capacitance)?;
        Ok(Self {
            nodes: None,
            capacitance,
            v_prev: 0.0,
            i_prev: 0.0,
        })
    }

    /// Start from a pre-charged state instead of 0 V.
    pub fn with_initial_voltage(mut self, voltage: f64) -> Result<Self> {
        if !voltage.is_finite() {
            return Err(VoltaicError::invalid_component(
                "capacitor",
                format!("initial voltage must be finite, got {voltage}"),
            ));
        }
        self.v_prev = voltage;
        Ok(self)
    }

    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }

    /// Voltage across the capacitor as of the last solve.
    pub fn voltage(&self) -> f64 {
        self.v_prev
    }

    /// Current through the capacitor (node 1 to node 2) during the last step.
    pub fn current(&self) -> f64 {
        self.i_prev
    }

    /// Get the equivalent conductance for the backward-Euler companion model.
    /// `None` for a degenerate step (`dt <= 0`).
    pub fn conductance(&self, dt: f64) -> Option<f64> {
        (dt > 0.0).then(|| self.capacitance / dt)
    }

    /// Get the companion current source value, signed for
    /// [`MnaMatrix::stamp_current_source`](crate::solver::MnaMatrix::stamp_current_source).
    ///
    /// The history current is injected into node 1, so it is stamped as a
    /// negative source flowing from node 1 to node 2.
    pub fn current_source(&self, dt: f64) -> f64 {
        self.conductance(dt).map_or(0.0, |g| -(g * self.v_prev))
    }

    /// Open circuit in DC analysis; nothing at all for `dt <= 0`.
    pub fn stamp(&self, state: &mut SimulationState<'_>) {
        let Some([n1, n2]) = self.nodes else {
            return;
        };
        if state.analysis == Analysis::Dc {
            return;
        }
        let Some(g) = self.conductance(state.dt) else {
            return;
        };
        let (i, j) = (n1.matrix_index(), n2.matrix_index());
        state.matrix.stamp_conductance(i, j, g);
        state
            .matrix
            .stamp_current_source(i, j, self.current_source(state.dt));
    }

    /// Capture the solved voltage for the next step's companion model.
    pub(crate) fn update_state(&mut self, nodes: &[Node], dt: f64, analysis: Analysis) {
        let Some([n1, n2]) = self.nodes else {
            return;
        };
        let v_new = terminal_voltage(nodes, n1) - terminal_voltage(nodes, n2);
        match analysis {
            Analysis::Dc => {
                self.v_prev = v_new;
                self.i_prev = 0.0;
            }
            Analysis::Transient => {
                // The element did not take part in a degenerate step.
                let Some(g) = self.conductance(dt) else {
                    return;
                };
                self.i_prev = g * (v_new - self.v_prev);
                self.v_prev = v_new;
            }
        }
    }
}

/// An inductor component.
///
/// Using backward Euler:
///   v(t) = (L/dt) * (i(t) - i(t-dt))
///
/// which is a resistance R_eq = L/dt in series with a voltage source
/// R_eq * i(t-dt), stamped in its Norton form: conductance dt/L in parallel
/// with a current source i(t-dt) flowing from node 1 to node 2.
///
/// In DC analysis the inductor is a short circuit and takes its own branch
/// current unknown.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub nodes: Option<[NodeId; 2]>,
    inductance: f64,

    /// Current through the inductor at the end of the previous step
    i_prev: f64,
}

impl Inductor {
    /// Create a new inductor carrying no current.
    ///
    /// # Panics
    /// Panics if `inductance` is not finite and positive.
    pub fn new(inductance: f64) -> Self {
        match Self::try_new(inductance) {
            Ok(l) => l,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(inductance: f64) -> Result<Self> {
        validate_value("inductor", "inductance", inductance)?;
        Ok(Self {
            nodes: None,
            inductance,
            i_prev: 0.0,
        })
    }

    /// Start with a current already flowing from node 1 to node 2.
    pub fn with_initial_current(mut self, current: f64) -> Result<Self> {
        if !current.is_finite() {
            return Err(VoltaicError::invalid_component(
                "inductor",
                format!("initial current must be finite, got {current}"),
            ));
        }
        self.i_prev = current;
        Ok(self)
    }

    pub fn inductance(&self) -> f64 {
        self.inductance
    }

    /// Current through the inductor as of the last solve.
    pub fn current(&self) -> f64 {
        self.i_prev
    }

    /// Get the equivalent resistance L/dt, `None` for `dt <= 0`.
    pub fn resistance(&self, dt: f64) -> Option<f64> {
        (dt > 0.0).then(|| self.inductance / dt)
    }

    /// Get the equivalent conductance dt/L, `None` for `dt <= 0`.
    pub fn conductance(&self, dt: f64) -> Option<f64> {
        self.resistance(dt).map(|r| 1.0 / r)
    }

    /// Norton history current: the equivalent voltage source R_eq * i(t-dt)
    /// divided back by R_eq.
    pub fn current_source(&self) -> f64 {
        self.i_prev
    }

    pub fn stamp(&self, state: &mut SimulationState<'_>) {
        let Some([n1, n2]) = self.nodes else {
            return;
        };
        let (i, j) = (n1.matrix_index(), n2.matrix_index());
        match state.analysis {
            Analysis::Dc => {
                if let Some(br) = state.branch {
                    // Zero-volt source: V[n1] - V[n2] = 0
                    state.matrix.stamp_voltage_source(i, j, br, 0.0);
                }
            }
            Analysis::Transient => {
                let Some(g) = self.conductance(state.dt) else {
                    return;
                };
                state.matrix.stamp_conductance(i, j, g);
                state.matrix.stamp_current_source(i, j, self.current_source());
            }
        }
    }

    /// Integrate the solved terminal voltage over the step:
    ///   i(t) = i(t-dt) + (dt/L) * v(t)
    pub(crate) fn update_state(
        &mut self,
        nodes: &[Node],
        dt: f64,
        analysis: Analysis,
        branch_current: Option<f64>,
    ) {
        let Some([n1, n2]) = self.nodes else {
            return;
        };
        match analysis {
            Analysis::Dc => {
                if let Some(i) = branch_current {
                    self.i_prev = i;
                }
            }
            Analysis::Transient => {
                let Some(g) = self.conductance(dt) else {
                    return;
                };
                let v = terminal_voltage(nodes, n1) - terminal_voltage(nodes, n2);
                self.i_prev += g * v;
            }
        }
    }
}
