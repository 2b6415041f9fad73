use nalgebra::{DMatrix, DVector};

use crate::config::BaselineConfig;

// ---------------------------------------------------------------------------
// Iterative polynomial baseline
// ---------------------------------------------------------------------------

/// Estimate the slowly varying background of `y`.
///
/// A polynomial is fitted by least squares, the signal is clipped to
/// `min(signal, fit)` and the fit repeated until the coefficients settle.
/// Peaks rise above the polynomial and get clipped away, so the baseline
/// follows the floor of the signal.
pub fn estimate_baseline(y: &[f64], cfg: &BaselineConfig) -> Result<Vec<f64>, String> {
    let n = y.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err("intensity contains NaN or infinite values".into());
    }

    let order = (cfg.degree + 1).min(n);
    // Abscissa normalized to [0, 1] keeps the Vandermonde matrix well conditioned.
    let step = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };
    let vander = DMatrix::from_fn(n, order, |i, j| (i as f64 * step).powi(j as i32));
    let pinv = vander.clone().pseudo_inverse(1e-12)?;

    let mut work = DVector::from_column_slice(y);
    let mut coeffs = &pinv * &work;
    let mut base = &vander * &coeffs;

    for _ in 0..cfg.max_iterations {
        for (w, b) in work.iter_mut().zip(base.iter()) {
            *w = w.min(*b);
        }
        let next = &pinv * &work;
        let change = (&next - &coeffs).norm() / coeffs.norm().max(f64::EPSILON);
        coeffs = next;
        base = &vander * &coeffs;
        if change < cfg.tolerance {
            break;
        }
    }

    Ok(base.iter().copied().collect())
}

/// Subtract the estimated baseline from `y`.
pub fn remove_baseline(y: &[f64], cfg: &BaselineConfig) -> Result<Vec<f64>, String> {
    let base = estimate_baseline(y, cfg)?;
    Ok(y.iter().zip(&base).map(|(v, b)| v - b).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(x: f64, amplitude: f64, center: f64, sigma: f64) -> f64 {
        amplitude * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
    }

    fn axis() -> Vec<f64> {
        (0..=400).map(|i| i as f64 * 0.25).collect()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let out = remove_baseline(&[], &BaselineConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn flat_series_is_idempotent() {
        let cfg = BaselineConfig::default();
        let y = vec![0.0; 200];
        let once = remove_baseline(&y, &cfg).unwrap();
        let twice = remove_baseline(&once, &cfg).unwrap();
        for (a, b) in once.iter().zip(&twice) {
            assert!(a.abs() < 1e-9);
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn removes_polynomial_drift_without_peaks() {
        let x = axis();
        let y: Vec<f64> = x.iter().map(|&v| 0.3 + 0.01 * v - 5e-5 * v * v).collect();
        let out = remove_baseline(&y, &BaselineConfig::default()).unwrap();
        let worst = out.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(worst < 1e-6, "residual drift {worst}");
    }

    #[test]
    fn strong_peak_survives_drift_removal() {
        let x = axis();
        let y: Vec<f64> = x
            .iter()
            .map(|&v| 0.2 + 0.003 * v + gaussian(v, 1.0, 50.0, 3.0))
            .collect();
        let out = remove_baseline(&y, &BaselineConfig::default()).unwrap();

        let peak = out[200];
        assert!((0.95..1.05).contains(&peak), "peak height {peak}");
        // Drift of 0.2..0.5 is reduced to a small positive residue.
        assert!(out[10].abs() < 0.15, "left tail {}", out[10]);
        assert!(out[390].abs() < 0.15, "right tail {}", out[390]);
        let lowest = out.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(lowest > -0.02, "baseline overshoots the signal: {lowest}");
    }

    #[test]
    fn deterministic() {
        let x = axis();
        let y: Vec<f64> = x.iter().map(|&v| 1.0 + gaussian(v, 2.0, 30.0, 4.0)).collect();
        let cfg = BaselineConfig::default();
        assert_eq!(
            remove_baseline(&y, &cfg).unwrap(),
            remove_baseline(&y, &cfg).unwrap()
        );
    }

    #[test]
    fn rejects_non_finite_input() {
        assert!(remove_baseline(&[1.0, f64::NAN, 2.0], &BaselineConfig::default()).is_err());
    }
}
