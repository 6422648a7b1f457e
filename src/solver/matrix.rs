//! Dense matrix storage and LU solve.
//!
//! Circuits built interactively have tens of nodes, so a dense row-major
//! matrix with partial-pivoting LU is both simple and fast enough.

use crate::error::{CircuitError, Result};

/// Square matrix in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DenseMatrix {
    /// Create a zero matrix.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    /// Set matrix element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] = value;
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] += value;
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// Stamp a conductance between two nodes.
    /// For a conductance G between nodes n1 and n2:
    ///   A[n1,n1] += G
    ///   A[n2,n2] += G
    ///   A[n1,n2] -= G
    ///   A[n2,n1] -= G
    ///
    /// `None` marks a reference node, which has no row.
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

    /// Stamp a voltage source with its current unknown at row/column `br`.
    ///
    /// Enforces V[n1] - V[n0] = E (RHS set by the caller). The current
    /// unknown flows from n0 to n1 through the source, so it leaves n0 and
    /// enters n1.
    pub fn stamp_voltage_source(&mut self, n0: Option<usize>, n1: Option<usize>, br: usize) {
        if let Some(i) = n0 {
            self.add(br, i, -1.0);
            self.add(i, br, 1.0);
        }
        if let Some(j) = n1 {
            self.add(br, j, 1.0);
            self.add(j, br, -1.0);
        }
    }
}

/// LU factorization with partial pivoting, PA = LU.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    /// L (unit diagonal, below) and U (on and above) packed together
    lu: Vec<f64>,
    /// Row permutation
    pivots: Vec<usize>,
    size: usize,
}

impl LuDecomposition {
    /// Factor a matrix.
    ///
    /// Fails with [`CircuitError::SingularMatrix`] when a pivot falls below
    /// `pivot_tolerance` relative to the largest matrix entry.
    pub fn factor(matrix: &DenseMatrix, pivot_tolerance: f64) -> Result<Self> {
        let n = matrix.size();
        let mut lu = matrix.data.clone();
        let mut pivots: Vec<usize> = (0..n).collect();
        let threshold = pivot_tolerance * matrix.max_abs();

        for k in 0..n {
            // Find pivot
            let mut max_val = lu[k * n + k].abs();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = lu[i * n + k].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val <= threshold || max_val == 0.0 {
                return Err(CircuitError::SingularMatrix);
            }

            // Swap rows if needed
            if max_row != k {
                pivots.swap(k, max_row);
                for j in 0..n {
                    lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = lu[k * n + k];
            for i in (k + 1)..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    lu[i * n + j] -= factor * lu[k * n + j];
                }
            }
        }

        Ok(Self { lu, pivots, size: n })
    }

    /// Solve Ax = b using the factorization.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.size;

        // Apply pivot permutation to b
        let mut x: Vec<f64> = self.pivots.iter().map(|&p| b[p]).collect();

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                x[i] -= self.lu[i * n + j] * x[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                x[i] -= self.lu[i * n + j] * x[j];
            }
            x[i] /= self.lu[i * n + i];
        }

        x
    }
}

/// Solve Ax = b in one step.
pub fn solve_linear_system(matrix: &DenseMatrix, b: &[f64], pivot_tolerance: f64) -> Result<Vec<f64>> {
    Ok(LuDecomposition::factor(matrix, pivot_tolerance)?.solve(b))
}
