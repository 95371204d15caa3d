//! MNA matrix assembly and solving.

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, VoltaicError};

/// Smallest denominator used when normalising the residual.
const RESIDUAL_FLOOR: f64 = 1e-300;

/// MNA matrix system Ax = z.
#[derive(Debug, Clone)]
pub struct MnaMatrix {
    /// System matrix A (conductances and source couplings)
    pub a: DMatrix<f64>,
    /// Source vector z (injected currents and source voltages)
    pub z: DVector<f64>,
}

impl MnaMatrix {
    /// Create a zero-filled system with `size` unknowns.
    pub fn new(size: usize) -> Self {
        Self {
            a: DMatrix::zeros(size, size),
            z: DVector::zeros(size),
        }
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.z.len()
    }

    /// Clear the matrix and vectors to zero.
    pub fn clear(&mut self) {
        self.a.fill(0.0);
        self.z.fill(0.0);
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.a[(row, col)]
    }

    /// Get source vector element.
    pub fn source(&self, row: usize) -> f64 {
        self.z[row]
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.a[(row, col)] += value;
    }

    /// Add to source vector element.
    pub fn add_source(&mut self, row: usize, value: f64) {
        self.z[row] += value;
    }

    /// Stamp a conductance between two nodes.
    /// For a conductance G between nodes n1 and n2:
    ///   A[n1,n1] += G
    ///   A[n2,n2] += G
    ///   A[n1,n2] -= G
    ///   A[n2,n1] -= G
    pub fn stamp_conductance(&mut self, n1: Option<usize>, n2: Option<usize>, g: f64) {
        if let Some(i) = n1 {
            self.add(i, i, g);
        }
        if let Some(j) = n2 {
            self.add(j, j, g);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.add(i, j, -g);
            self.add(j, i, -g);
        }
    }

    /// Stamp a voltage source between two nodes with branch current at index br.
    /// V[n+] - V[n-] = E
    pub fn stamp_voltage_source(
        &mut self,
        n_pos: Option<usize>,
        n_neg: Option<usize>,
        br: usize,
        voltage: f64,
    ) {
        if let Some(i) = n_pos {
            self.add(br, i, 1.0);
            self.add(i, br, 1.0);
        }
        if let Some(j) = n_neg {
            self.add(br, j, -1.0);
            self.add(j, br, -1.0);
        }
        self.add_source(br, voltage);
    }

    /// Stamp a current source between two nodes.
    /// Current flows from n+ to n- through the source's branch.
    pub fn stamp_current_source(
        &mut self,
        n_pos: Option<usize>,
        n_neg: Option<usize>,
        current: f64,
    ) {
        // Current leaves n+ and enters n-
        if let Some(i) = n_pos {
            self.add_source(i, -current);
        }
        if let Some(j) = n_neg {
            self.add_source(j, current);
        }
    }

    /// Solve the system with a partially pivoted LU decomposition.
    ///
    /// Each row is first scaled by its largest entry, so a pivot is judged
    /// against its own equation rather than against the stiffest element in
    /// the circuit. The solve is rejected when a row is empty, when a scaled
    /// pivot falls below `pivot_tolerance`, when the solution is not finite,
    /// or when the relative residual of the scaled system
    /// |Ax - z| / (|x| + |z|) exceeds `residual_tolerance`.
    pub fn solve(&self, pivot_tolerance: f64, residual_tolerance: f64) -> Result<DVector<f64>> {
        let n = self.size();
        if n == 0 {
            return Ok(DVector::zeros(0));
        }

        let mut a = self.a.clone();
        let mut z = self.z.clone();
        for row in 0..n {
            let scale = a.row(row).amax();
            if scale == 0.0 || !scale.is_finite() {
                return Err(VoltaicError::SingularMatrix { pivot: row });
            }
            a.row_mut(row).scale_mut(1.0 / scale);
            z[row] /= scale;
        }

        let lu = a.clone().lu();
        let u = lu.u();
        if let Some(pivot) = (0..n).find(|&k| u[(k, k)].abs() <= pivot_tolerance) {
            return Err(VoltaicError::SingularMatrix { pivot });
        }

        let x = lu
            .solve(&z)
            .ok_or(VoltaicError::SingularMatrix { pivot: n - 1 })?;
        if x.iter().any(|v| !v.is_finite()) {
            return Err(VoltaicError::IllConditioned {
                residual: f64::INFINITY,
                tolerance: residual_tolerance,
            });
        }

        let residual = (&a * &x - &z).amax();
        let denominator = (x.amax() + z.amax()).max(RESIDUAL_FLOOR);
        let relative = residual / denominator;
        if relative > residual_tolerance {
            return Err(VoltaicError::IllConditioned {
                residual: relative,
                tolerance: residual_tolerance,
            });
        }

        Ok(x)
    }
}
