//! MNA (Modified Nodal Analysis) solver.
//!
//! This module provides the numerical engine for circuit simulation.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Ax = z where:
//! - x contains node voltages and branch currents
//! - A is the conductance/coefficient matrix
//! - z is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   D ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G is the conductance matrix (node equations)
//! - B, C connect voltage sources to nodes
//! - D is 0 for ideal voltage sources
//! - v is the vector of node voltages
//! - j is the vector of voltage source currents
//! - i is the sum of current sources into each node
//! - e is the vector of voltage source values

mod mna;
mod simulator;

pub use mna::MnaMatrix;
pub use simulator::{Simulator, SimulatorConfig};

/// Relative residual above which a solve is rejected.
pub const DEFAULT_RESIDUAL_TOLERANCE: f64 = 1e-9;

/// Smallest LU pivot accepted after scaling each row to unit maximum.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-14;

/// Fraction of `dt` below which `simulate` treats the end time as reached.
pub const DEFAULT_END_TIME_FRACTION: f64 = 1e-2;

/// Kind of solve a stamp contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    /// One backward-Euler timestep
    Transient,
    /// Operating point: capacitors open, inductors shorted
    Dc,
}

/// Everything a component needs to stamp itself for one solve.
#[derive(Debug)]
pub struct SimulationState<'a> {
    /// The system being assembled
    pub matrix: &'a mut MnaMatrix,
    /// Timestep in seconds; `dt <= 0` makes reactive stamps no-ops
    pub dt: f64,
    /// Branch row reserved for this component, if it owns one
    pub branch: Option<usize>,
    /// Instant being solved for
    pub time: f64,
    pub analysis: Analysis,
}
