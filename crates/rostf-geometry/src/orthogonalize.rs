//! Iterative correction of near-orthogonal 3×3 matrices.
//!
//! Rotation matrices that went through a file, a wire format or a chain of
//! floating-point products drift away from orthogonality.  [`orthogonalize`]
//! pulls such a matrix `M` back towards the closest orthogonal matrix with
//! the fixed-point iteration
//!
//! ```text
//! Xₙ₊₁ = Xₙ − 0.5 · (Xₙ · Mᵗ · Xₙ − M)
//! ```
//!
//! starting from `X₀ = M`.  Convergence is detected on the squared Frobenius
//! norm of the correction `Xₙ₊₁ − M`: once it changes by no more than the
//! caller's threshold between two iterations the current estimate is
//! returned.

use tracing::debug;

/// A 3×3 matrix stored row-major.
pub type Matrix3 = [[f64; 3]; 3];

/// Iteration budget used by [`crate::Rotation::from_matrix`].
pub const ORTHOGONALIZATION_MAX_ITERATIONS: usize = 10;

/// Correct `m` into an orthogonal matrix.
///
/// Returns `None` when the correction has not settled after
/// `max_iterations` iterations.  A matrix that diverges produces non-finite
/// norms, which never satisfy the convergence test, so it is reported as
/// not convergent as well.
pub fn orthogonalize(m: &Matrix3, threshold: f64, max_iterations: usize) -> Option<Matrix3> {
    let mut x = *m;
    let mut previous_norm: f64 = 0.0;

    for _ in 0..max_iterations {
        // Mᵗ · Xₙ
        let mut mx = [[0.0; 3]; 3];
        for (i, row) in mx.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = m[0][i] * x[0][j] + m[1][i] * x[1][j] + m[2][i] * x[2][j];
            }
        }

        let mut next = [[0.0; 3]; 3];
        let mut norm: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                let xmx = x[i][0] * mx[0][j] + x[i][1] * mx[1][j] + x[i][2] * mx[2][j];
                next[i][j] = x[i][j] - 0.5 * (xmx - m[i][j]);
                let correction = next[i][j] - m[i][j];
                norm += correction * correction;
            }
        }

        if (norm - previous_norm).abs() <= threshold {
            return Some(next);
        }

        x = next;
        previous_norm = norm;
    }

    debug!(max_iterations, "matrix orthogonalization did not converge");
    None
}

/// Determinant of a 3×3 matrix.
pub fn determinant(m: &Matrix3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
        - m[1][0] * (m[0][1] * m[2][2] - m[2][1] * m[0][2])
        + m[2][0] * (m[0][1] * m[1][2] - m[1][1] * m[0][2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    fn orthogonality_error(m: &Matrix3) -> f64 {
        // ‖M·Mᵗ − I‖∞
        let mut worst: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                let dot = m[i][0] * m[j][0] + m[i][1] * m[j][1] + m[i][2] * m[j][2];
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((dot - expected).abs());
            }
        }
        worst
    }

    #[test]
    fn orthogonal_input_is_returned_unchanged() {
        let out = orthogonalize(&IDENTITY, 1e-10, ORTHOGONALIZATION_MAX_ITERATIONS).unwrap();
        assert_eq!(out, IDENTITY);
    }

    #[test]
    fn perturbed_matrix_is_corrected() {
        let m = [[1.0, 0.01, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(orthogonality_error(&m) > 1e-3);
        let out = orthogonalize(&m, 1e-10, ORTHOGONALIZATION_MAX_ITERATIONS).unwrap();
        assert!(orthogonality_error(&out) < 1e-6, "{out:?}");
    }

    #[test]
    fn badly_scaled_matrix_does_not_converge() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]];
        assert!(orthogonalize(&m, 1e-10, ORTHOGONALIZATION_MAX_ITERATIONS).is_none());
    }

    #[test]
    fn iteration_budget_is_respected() {
        let m = [[1.0, 0.3, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(orthogonalize(&m, 1e-10, ORTHOGONALIZATION_MAX_ITERATIONS).is_none());
        assert!(orthogonalize(&m, 1e-10, 100).is_some());
    }

    #[test]
    fn determinant_of_reflection_is_negative() {
        let reflection = [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!((determinant(&reflection) + 1.0).abs() < 1e-12);
        assert!((determinant(&IDENTITY) - 1.0).abs() < 1e-12);
    }
}
