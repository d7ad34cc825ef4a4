//! Determinant by cofactor expansion along the first row.
//!
//! Runs in O(n!) time and is only meant for small matrices.

use crate::error::{KMeansError, Result};
use ndarray::{s, ArrayView2, Axis};

/// Determinant of a square, non-empty matrix.
pub fn determinant(matrix: ArrayView2<f64>) -> Result<f64> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(KMeansError::invalid(format!(
            "the determinant only exists for square matrices, got {}x{}",
            rows, cols
        )));
    }
    if rows == 0 {
        return Err(KMeansError::invalid("matrix cannot be empty"));
    }
    Ok(expand(matrix))
}

fn expand(matrix: ArrayView2<f64>) -> f64 {
    let n = matrix.nrows();
    if n == 1 {
        return matrix[[0, 0]];
    }

    let below = matrix.slice(s![1.., ..]);
    let mut sign = 1.0;
    let mut det = 0.0;
    for i in 0..n {
        let keep: Vec<usize> = (0..n).filter(|&j| j != i).collect();
        let minor = below.select(Axis(1), &keep);
        det += sign * matrix[[0, i]] * expand(minor.view());
        sign = -sign;
    }
    det
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_one_by_one() {
        assert_eq!(determinant(array![[5.0]].view()).unwrap(), 5.0);
    }

    #[test]
    fn test_two_by_two() {
        assert_eq!(determinant(array![[1.0, 2.0], [3.0, 4.0]].view()).unwrap(), -2.0);
    }

    #[test]
    fn test_three_by_three() {
        let m = array![[6.0, 1.0, 1.0], [4.0, -2.0, 5.0], [2.0, 8.0, 7.0]];
        assert_relative_eq!(determinant(m.view()).unwrap(), -306.0);
    }

    #[test]
    fn test_identity() {
        let m = Array2::<f64>::eye(5);
        assert_relative_eq!(determinant(m.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_row() {
        let first = array![[0.0, 0.0, 0.0], [4.0, -2.0, 5.0], [2.0, 8.0, 7.0]];
        let middle = array![[6.0, 1.0, 1.0], [0.0, 0.0, 0.0], [2.0, 8.0, 7.0]];
        let last = array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.5],
            [9.0, 1.5, 2.0, 3.0],
            [0.0, 0.0, 0.0, 0.0]
        ];
        assert_eq!(determinant(first.view()).unwrap(), 0.0);
        assert_eq!(determinant(middle.view()).unwrap(), 0.0);
        assert_eq!(determinant(last.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_non_square_fails() {
        let m = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert!(matches!(
            determinant(m.view()),
            Err(KMeansError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_fails() {
        let m = Array2::<f64>::zeros((0, 0));
        assert!(determinant(m.view()).is_err());
    }
}
