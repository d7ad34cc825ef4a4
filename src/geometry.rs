use crate::error::{KMeansError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Euclidean distance between two points of the same dimension.
#[inline]
pub fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "points differ in dimension");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Coordinate-wise mean of the rows of `points`.
///
/// Computed as a running mean, so averaging n copies of the same point
/// returns that point bit-for-bit.
pub fn centroid(points: ArrayView2<f64>) -> Result<Array1<f64>> {
    let mut rows = points.axis_iter(Axis(0));
    let mut mean = match rows.next() {
        Some(first) => first.to_owned(),
        None => return Err(KMeansError::invalid("cannot average an empty set of points")),
    };
    for (i, row) in rows.enumerate() {
        let n = (i + 2) as f64;
        mean.zip_mut_with(&row, |m, &x| *m += (x - *m) / n);
    }
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_distance() {
        let a = array![0.0, 0.0, 0.0];
        let b = array![0.0, 3.0, 4.0];
        assert_eq!(distance(a.view(), b.view()), 5.0);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = array![1.5, -2.0, 7.25, 0.0];
        assert_eq!(distance(p.view(), p.view()), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = array![1.0, 2.0];
        let b = array![-4.0, 9.5];
        assert_eq!(distance(a.view(), b.view()), distance(b.view(), a.view()));
    }

    #[test]
    fn test_centroid_mean() {
        let pts = array![[0.0, 0.0], [2.0, 4.0], [4.0, 2.0]];
        let c = centroid(pts.view()).unwrap();
        assert_abs_diff_eq!(c[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_centroid_of_repeated_point_is_exact() {
        let p = [0.1, 1.0 / 3.0, -7.7];
        for n in [1, 2, 3, 7, 10] {
            let pts = Array2::from_shape_fn((n, 3), |(_, j)| p[j]);
            let c = centroid(pts.view()).unwrap();
            assert_eq!(c.to_vec(), p.to_vec());
        }
    }

    #[test]
    fn test_centroid_empty_fails() {
        let pts = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            centroid(pts.view()),
            Err(KMeansError::InvalidArgument(_))
        ));
    }
}
