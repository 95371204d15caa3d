//! # Voltaic Core
//!
//! A time-domain simulator for linear lumped circuits.
//!
//! This library provides:
//! - An arena-owned circuit model built from nodes and two-terminal components
//! - Resistors, capacitors, inductors and voltage sources (constant,
//!   sinusoidal or arbitrary waveforms)
//! - Modified Nodal Analysis (MNA) assembly with a dense LU solve
//! - Backward-Euler transient stepping and a DC operating point
//! - Read-only probes with text and CSV output
//!
//! ## Architecture
//!
//! - [`circuit`] - Node/component arena and topology validation
//! - [`components`] - Component models and their MNA stamps
//! - [`solver`] - MNA matrix, simulation clock and stepping
//! - [`probe`] - Measurement and reporting
//!
//! ## Usage
//!
//! ```
//! use voltaic_core::{Circuit, Simulator};
//! use voltaic_core::components::{Capacitor, Resistor, VoltageSource};
//!
//! let mut circuit = Circuit::new();
//! let gnd = circuit.create_node();
//! let n1 = circuit.create_node();
//! let n2 = circuit.create_node();
//! circuit.add_component(VoltageSource::dc(5.0), n1, gnd)?;
//! circuit.add_component(Resistor::new(1e3), n1, n2)?;
//! circuit.add_component(Capacitor::new(1e-3), n2, gnd)?;
//!
//! let mut sim = Simulator::new(circuit);
//! sim.simulate(1.0, 0.01)?;
//! assert!(sim.node_voltage(n2) > 2.5);
//! # Ok::<(), voltaic_core::VoltaicError>(())
//! ```
//!
//! ## Circuit Simulation Method
//!
//! For each time step dt:
//!
//! 1. Advance the clock; sources are evaluated at the new time
//! 2. Assemble the system matrix A and source vector z from every stamp
//! 3. Solve Ax = z for node voltages and branch currents
//! 4. Write results back and update capacitor/inductor history
//!
//! Reactive elements (C, L) are discretized with backward Euler, which is
//! unconditionally stable at the cost of some numerical damping.

pub mod circuit;
pub mod components;
pub mod error;
pub mod probe;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{Circuit, ComponentId, NodeId};
pub use error::{Result, VoltaicError};
pub use solver::{Simulator, SimulatorConfig};
