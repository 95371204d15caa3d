//! Main simulator interface.

use tracing::{debug, trace, warn};

use crate::circuit::{BranchId, Circuit, Node, NodeId, VarIndex};
use crate::error::{Result, VoltaicError};

use super::mna::MnaMatrix;
use super::{
    Analysis, SimulationState, DEFAULT_END_TIME_FRACTION, DEFAULT_PIVOT_TOLERANCE,
    DEFAULT_RESIDUAL_TOLERANCE,
};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Relative residual of the row-scaled system above which a solve is
    /// rejected as ill-conditioned.
    pub residual_tolerance: f64,
    /// Smallest LU pivot accepted once each row is scaled to unit maximum.
    pub pivot_tolerance: f64,
    /// Fraction of `dt` used as the end-time tolerance in `simulate`.
    pub end_time_fraction: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            residual_tolerance: DEFAULT_RESIDUAL_TOLERANCE,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            end_time_fraction: DEFAULT_END_TIME_FRACTION,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the residual tolerance for accepting a solve.
    pub fn with_residual_tolerance(mut self, tolerance: f64) -> Self {
        self.residual_tolerance = tolerance;
        self
    }

    /// Set the relative pivot tolerance for singularity detection.
    pub fn with_pivot_tolerance(mut self, tolerance: f64) -> Self {
        self.pivot_tolerance = tolerance;
        self
    }

    /// Set the end-time tolerance used by `simulate`, as a fraction of `dt`.
    pub fn with_end_time_fraction(mut self, fraction: f64) -> Self {
        self.end_time_fraction = fraction;
        self
    }
}

/// The main circuit simulator.
///
/// Owns the circuit and the simulation clock. Each solve assembles a fresh
/// MNA system sized from the circuit as it is at that moment.
#[derive(Debug, Clone)]
pub struct Simulator {
    /// The circuit being simulated
    circuit: Circuit,
    config: SimulatorConfig,
    /// Elapsed simulation time in seconds
    time: f64,
}

/// An assembled system plus the branch row each component was given.
struct Assembly {
    matrix: MnaMatrix,
    branches: Vec<Option<usize>>,
    node_rows: usize,
}

impl Simulator {
    /// Create a new simulator for the given circuit with default configuration.
    pub fn new(circuit: Circuit) -> Self {
        Self::with_config(circuit, SimulatorConfig::default())
    }

    /// Create a new simulator for the given circuit with custom configuration.
    pub fn with_config(circuit: Circuit, config: SimulatorConfig) -> Self {
        Self {
            circuit,
            config,
            time: 0.0,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Get a reference to the circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Mutable access for adding nodes and components between steps.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// Elapsed simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Rewind the clock to zero. Node voltages and reactive state are kept.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Registered nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.circuit.nodes()
    }

    pub fn node_voltage(&self, node: NodeId) -> f64 {
        self.circuit.node_voltage(node)
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Sources are evaluated at the new time. A `dt <= 0` step is allowed:
    /// reactive elements sit out of it and keep their state. If the system
    /// cannot be solved nothing is written back and the clock stays put.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() {
            return Err(VoltaicError::invalid_param(format!(
                "timestep must be finite, got {dt}"
            )));
        }
        let t_next = self.time + dt;
        let _span = tracing::debug_span!("step", time = t_next, dt).entered();
        self.solve_at(Analysis::Transient, dt, t_next)?;
        self.time = t_next;
        Ok(())
    }

    /// Step repeatedly until `duration` seconds have elapsed.
    ///
    /// The final step is shortened when `dt` does not divide `duration`, so
    /// the clock lands on the end time. Returns the number of steps taken.
    pub fn simulate(&mut self, duration: f64, dt: f64) -> Result<usize> {
        self.simulate_with(duration, dt, |_, _| Ok(()))
    }

    /// Like [`simulate`](Self::simulate), calling `on_step` with the circuit
    /// and the new time after every committed step.
    pub fn simulate_with<F>(&mut self, duration: f64, dt: f64, mut on_step: F) -> Result<usize>
    where
        F: FnMut(&Circuit, f64) -> Result<()>,
    {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(VoltaicError::invalid_param(format!(
                "simulate requires a positive timestep, got {dt}"
            )));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(VoltaicError::invalid_param(format!(
                "duration must be finite and non-negative, got {duration}"
            )));
        }

        let end = self.time + duration;
        let epsilon = dt * self.config.end_time_fraction;
        let mut steps = 0;
        while self.time < end - epsilon {
            let h = dt.min(end - self.time);
            self.step(h)?;
            steps += 1;
            on_step(&self.circuit, self.time)?;
        }
        debug!(steps, time = self.time, "simulation complete");
        Ok(steps)
    }

    /// Solve the DC operating point at the current time without advancing it.
    ///
    /// Capacitors are open and inductors are shorts. On success the solved
    /// capacitor voltages and inductor currents become the reactive state,
    /// so a following transient starts from the operating point.
    pub fn operating_point(&mut self) -> Result<()> {
        let _span = tracing::debug_span!("operating_point", time = self.time).entered();
        self.solve_at(Analysis::Dc, 0.0, self.time)
    }

    /// Assemble, solve and commit one system. Nothing is mutated on error.
    fn solve_at(&mut self, analysis: Analysis, dt: f64, time: f64) -> Result<()> {
        let assembly = self.assemble(analysis, dt, time);
        let solution = assembly
            .matrix
            .solve(self.config.pivot_tolerance, self.config.residual_tolerance)
            .inspect_err(|err| warn!(%err, time, "rejected MNA solve"))?;

        let (nodes, components) = self.circuit.parts_mut();
        for node in nodes.iter_mut() {
            match node.id.matrix_index() {
                None => node.voltage = 0.0,
                Some(i) if i < assembly.node_rows => node.voltage = solution[i],
                Some(_) => {}
            }
        }

        for (component, branch) in components.iter_mut().zip(&assembly.branches) {
            let branch_current = branch.map(|k| solution[k]);
            component.update_state(nodes, dt, analysis, branch_current);
        }
        Ok(())
    }

    fn assemble(&self, analysis: Analysis, dt: f64, time: f64) -> Assembly {
        let components = self.circuit.components();
        let num_nodes = self.circuit.num_nodes();
        let node_rows = num_nodes.saturating_sub(1);

        // Reserve branch rows in registration order
        let mut num_branches = 0usize;
        let branches: Vec<Option<usize>> = components
            .iter()
            .map(|c| match c.branch_count(analysis) {
                0 => None,
                count => {
                    let row = VarIndex::Current(BranchId(num_branches)).to_index(num_nodes);
                    num_branches += count;
                    Some(row)
                }
            })
            .collect();

        let size = node_rows + num_branches;
        debug!(size, num_nodes, num_branches, ?analysis, "assembling MNA system");
        let mut matrix = MnaMatrix::new(size);

        let mut order: Vec<usize> = (0..components.len()).collect();
        order.sort_by_key(|&i| components[i].stamp_order());
        for i in order {
            let component = &components[i];
            trace!(index = i, kind = component.kind(), branch = ?branches[i], "stamp");
            let mut state = SimulationState {
                matrix: &mut matrix,
                dt,
                branch: branches[i],
                time,
                analysis,
            };
            component.stamp(&mut state);
        }

        Assembly {
            matrix,
            branches,
            node_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Capacitor, Inductor, Resistor, VoltageSource};
    use approx::assert_abs_diff_eq;

    fn divider(v: f64, r1: f64, r2: f64) -> (Simulator, NodeId) {
        let mut circuit = Circuit::new();
        let gnd = circuit.create_node();
        let n1 = circuit.create_node();
        let n2 = circuit.create_node();
        circuit.add_component(VoltageSource::dc(v), n1, gnd).unwrap();
        circuit.add_component(Resistor::new(r1), n1, n2).unwrap();
        circuit.add_component(Resistor::new(r2), n2, gnd).unwrap();
        (Simulator::new(circuit), n2)
    }

    #[test]
    fn test_voltage_divider() {
        let (mut sim, mid) = divider(10.0, 1000.0, 1000.0);
        sim.step(1e-6).unwrap();
        assert_abs_diff_eq!(sim.node_voltage(mid), 5.0, epsilon = 1e-3);
        assert_eq!(sim.node_voltage(NodeId::GROUND), 0.0);
    }

    #[test]
    fn test_source_current_sign() {
        let (mut sim, _) = divider(10.0, 1000.0, 1000.0);
        sim.step(1e-6).unwrap();
        let vs = sim.circuit().components()[0].as_voltage_source().unwrap();
        // Delivering 5 mA out of its positive terminal
        assert_abs_diff_eq!(vs.current(), 0.005, epsilon = 1e-9);
    }

    #[test]
    fn test_time_accounting() {
        let (mut sim, _) = divider(5.0, 100.0, 100.0);
        assert_eq!(sim.time(), 0.0);
        sim.step(0.001).unwrap();
        sim.step(0.001).unwrap();
        assert_abs_diff_eq!(sim.time(), 0.002, epsilon = 1e-9);
        sim.reset_time();
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn test_simulate_lands_on_end_time() {
        let (mut sim, _) = divider(5.0, 100.0, 100.0);
        let steps = sim.simulate(0.1, 0.01).unwrap();
        assert_eq!(steps, 10);
        assert_abs_diff_eq!(sim.time(), 0.1, epsilon = 1e-9);

        sim.reset_time();
        let steps = sim.simulate(0.1, 0.03).unwrap();
        assert_eq!(steps, 4);
        assert_abs_diff_eq!(sim.time(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_simulate_rejects_bad_timestep() {
        let (mut sim, _) = divider(5.0, 100.0, 100.0);
        assert!(sim.simulate(1.0, 0.0).is_err());
        assert!(sim.simulate(1.0, -1.0).is_err());
        assert!(sim.simulate(f64::NAN, 0.1).is_err());
        assert!(sim.step(f64::INFINITY).is_err());
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn test_floating_node_reports_error_and_keeps_state() {
        let mut circuit = Circuit::new();
        let gnd = circuit.create_node();
        let n1 = circuit.create_node();
        let n2 = circuit.create_node();
        let n3 = circuit.create_node();
        circuit.add_component(VoltageSource::dc(5.0), n1, gnd).unwrap();
        circuit.add_component(Resistor::new(100.0), n1, gnd).unwrap();
        let mut sim = Simulator::new(circuit);
        sim.step(1e-3).unwrap();
        assert_abs_diff_eq!(sim.node_voltage(n1), 5.0, epsilon = 1e-9);

        // Isolated pair: no path to the rest of the circuit
        sim.circuit_mut()
            .add_component(Resistor::new(100.0), n2, n3)
            .unwrap();
        let err = sim.step(1e-3).unwrap_err();
        assert!(err.is_configuration_error());
        assert_abs_diff_eq!(sim.time(), 1e-3, epsilon = 1e-15);
        assert_abs_diff_eq!(sim.node_voltage(n1), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sources_evaluated_at_new_time() {
        let mut circuit = Circuit::new();
        let gnd = circuit.create_node();
        let n1 = circuit.create_node();
        circuit.add_component(VoltageSource::custom(|t| t * 1000.0), n1, gnd).unwrap();
        circuit.add_component(Resistor::new(1.0), n1, gnd).unwrap();
        let mut sim = Simulator::new(circuit);

        sim.step(0.001).unwrap();
        assert_abs_diff_eq!(sim.node_voltage(n1), 1.0, epsilon = 1e-9);
        sim.step(0.001).unwrap();
        assert_abs_diff_eq!(sim.node_voltage(n1), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_operating_point_seeds_reactive_state() {
        // 10 V -> 100 Ω -> node 2; L and C from node 2 to ground.
        // At DC the inductor shorts node 2, carrying 0.1 A.
        let mut circuit = Circuit::new();
        let gnd = circuit.create_node();
        let n1 = circuit.create_node();
        let n2 = circuit.create_node();
        circuit.add_component(VoltageSource::dc(10.0), n1, gnd).unwrap();
        circuit.add_component(Resistor::new(100.0), n1, n2).unwrap();
        let l = circuit.add_component(Inductor::new(0.1), n2, gnd).unwrap();
        let c = circuit.add_component(Capacitor::new(1e-5), n2, gnd).unwrap();
        let mut sim = Simulator::new(circuit);

        sim.operating_point().unwrap();
        assert_eq!(sim.time(), 0.0);
        assert_abs_diff_eq!(sim.node_voltage(n2), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sim.circuit().component_current(l), 0.1, epsilon = 1e-9);
        let cap = sim.circuit().component(c).and_then(|c| c.as_capacitor()).unwrap();
        assert_abs_diff_eq!(cap.voltage(), 0.0, epsilon = 1e-9);

        // Already at steady state: a transient step stays there.
        sim.step(1e-5).unwrap();
        assert_abs_diff_eq!(sim.node_voltage(n2), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sim.circuit().component_current(l), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_operating_point_with_capacitor_divider() {
        // Capacitor in series blocks DC: node 2 sits at ground through R.
        let mut circuit = Circuit::new();
        let gnd = circuit.create_node();
        let n1 = circuit.create_node();
        let n2 = circuit.create_node();
        circuit.add_component(VoltageSource::dc(5.0), n1, gnd).unwrap();
        let c = circuit.add_component(Capacitor::new(1e-6), n1, n2).unwrap();
        circuit.add_component(Resistor::new(1e3), n2, gnd).unwrap();
        let mut sim = Simulator::new(circuit);

        sim.operating_point().unwrap();
        assert_abs_diff_eq!(sim.node_voltage(n2), 0.0, epsilon = 1e-9);
        let cap = sim.circuit().component(c).and_then(|c| c.as_capacitor()).unwrap();
        assert_abs_diff_eq!(cap.voltage(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_circuit_steps() {
        let mut sim = Simulator::new(Circuit::new());
        sim.step(1e-3).unwrap();
        assert_abs_diff_eq!(sim.time(), 1e-3);
        assert_eq!(sim.nodes().count(), 0);
    }
}
