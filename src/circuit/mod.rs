//! Circuit representation and validation.
//!
//! The [`Circuit`] struct owns all nodes and components. Components refer to
//! nodes by [`NodeId`], and node 0 is always ground.

mod graph;
mod types;
mod validate;

pub use graph::Circuit;
pub use types::*;
pub use validate::validate_circuit;
