//! Ordinary least-squares trend fitting.

const MIN_POINTS: usize = 3;

/// Fits `y = intercept + slope * x` and evaluates it at `future_x`.
///
/// With fewer than three points no trend is attempted and the last observed `y` is returned
/// (zero when there is none). When every `x` is identical the fit is horizontal and the mean
/// of `y` is returned. Only the first `min(xs.len(), ys.len())` pairs are used.
pub fn predict_linear(xs: &[f64], ys: &[f64], future_x: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n < MIN_POINTS {
        return ys.last().copied().unwrap_or(0.0);
    }

    let (xs, ys) = (&xs[..n], &ys[..n]);
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    // Compared directly: a rounded mean of identical xs can leave a tiny non-zero variance.
    if xs.iter().all(|x| *x == xs[0]) {
        return y_mean;
    }

    let (covariance, variance) =
        xs.iter().zip(ys).fold((0.0, 0.0), |(covariance, variance), (x, y)| {
            let dx = x - x_mean;
            (covariance + dx * (y - y_mean), variance + dx * dx)
        });

    if variance == 0.0 {
        return y_mean;
    }

    let slope = covariance / variance;
    let intercept = y_mean - slope * x_mean;
    intercept + slope * future_x
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::forecast::regression::predict_linear;

    #[test]
    fn perfect_line_extrapolates_exactly() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];

        assert!((predict_linear(&xs, &ys, 4.0) - 9.0).abs() < 1e-9);
        assert!((predict_linear(&xs, &ys, -1.0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_points_follow_least_squares_slope() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 2.0, 1.0];

        // slope 0.5, intercept 0.5
        assert!((predict_linear(&xs, &ys, 3.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_returns_zero() {
        assert_eq!(predict_linear(&[], &[], 10.0), 0.0);
    }

    #[test]
    fn sparse_input_returns_last_y_regardless_of_x() {
        proptest!(|(
            xs in proptest::collection::vec(-1e6f64..1e6, 0..3),
            ys in proptest::collection::vec(-1e6f64..1e6, 1..3),
            future_x in -1e6f64..1e6,
        )| {
            let n = xs.len().min(ys.len());
            prop_assume!(n < 3);
            let expected = *ys.last().expect("non-empty ys");
            prop_assert_eq!(predict_linear(&xs, &ys, future_x), expected);
        });
    }

    #[test]
    fn zero_variance_returns_mean_of_y() {
        proptest!(|(
            x in -1e6f64..1e6,
            ys in proptest::collection::vec(-1e3f64..1e3, 3..50),
            future_x in -1e6f64..1e6,
        )| {
            let xs = vec![x; ys.len()];
            let mean = ys.iter().sum::<f64>() / ys.len() as f64;
            prop_assert_eq!(predict_linear(&xs, &ys, future_x), mean);
        });
    }
}
