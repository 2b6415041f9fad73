use std::f64::consts::{LN_2, PI};

use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::config::FitConfig;
use crate::error::FitError;

const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
/// A fitted width beyond this many region spans is a constant, not a peak.
const MAX_SPAN_RATIO: f64 = 10.0;

// ---------------------------------------------------------------------------
// Gaussian model
// ---------------------------------------------------------------------------

/// `f(x) = amplitude * exp(-(x - center)^2 / (2 sigma^2))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
}

impl Gaussian {
    pub fn new(amplitude: f64, center: f64, sigma: f64) -> Self {
        Self {
            amplitude,
            center,
            sigma,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        let d = x - self.center;
        self.amplitude * (-d * d / (2.0 * self.sigma * self.sigma)).exp()
    }

    /// Full width at half maximum, `2 sqrt(2 ln 2) |sigma|`.
    pub fn fwhm(&self) -> f64 {
        2.0 * (2.0 * LN_2).sqrt() * self.sigma.abs()
    }

    /// Closed-form integral over the real line.
    pub fn area(&self) -> f64 {
        self.amplitude * self.sigma.abs() * (2.0 * PI).sqrt()
    }

    fn sse(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter()
            .zip(y)
            .map(|(&xi, &yi)| (yi - self.eval(xi)).powi(2))
            .sum()
    }

    fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.amplitude, self.center, self.sigma)
    }

    fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    fn is_usable(&self) -> bool {
        self.amplitude.is_finite()
            && self.center.is_finite()
            && self.sigma.is_finite()
            && self.sigma.abs() > f64::MIN_POSITIVE
    }
}

/// Refined Gaussian plus the number of iterations the refinement took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFit {
    pub gaussian: Gaussian,
    pub iterations: usize,
}

// ---------------------------------------------------------------------------
// Initial estimate
// ---------------------------------------------------------------------------

/// Moment-based starting point: the tallest sample sets the amplitude, the
/// positive part of `y` weights the centroid and the second moment.
pub fn initial_guess(x: &[f64], y: &[f64]) -> Result<Gaussian, FitError> {
    let amplitude = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(amplitude.is_finite() && amplitude > 0.0) {
        return Err(FitError::NoPeak);
    }

    let (mut w_sum, mut wx_sum) = (0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let w = yi.max(0.0);
        w_sum += w;
        wx_sum += w * xi;
    }
    let center = wx_sum / w_sum;
    let variance = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| yi.max(0.0) * (xi - center).powi(2))
        .sum::<f64>()
        / w_sum;

    let mut sigma = variance.sqrt();
    if !sigma.is_finite() || sigma <= 0.0 {
        sigma = fallback_width(x);
    }
    Ok(Gaussian::new(amplitude, center, sigma))
}

fn fallback_width(x: &[f64]) -> f64 {
    let span = x.last().copied().unwrap_or(0.0) - x.first().copied().unwrap_or(0.0);
    let spacing = span / x.len().saturating_sub(1).max(1) as f64;
    if spacing > 0.0 {
        5.0 * spacing
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Levenberg–Marquardt refinement
// ---------------------------------------------------------------------------

/// Fit a Gaussian to `(x, y)`, `x` sorted ascending.
///
/// Fails instead of returning a meaningless fit when the data is degenerate
/// (too few points, constant, no positive signal) or when the refinement does
/// not settle on a finite peak.
pub fn fit_gaussian(x: &[f64], y: &[f64], cfg: &FitConfig) -> Result<GaussianFit, FitError> {
    let required = cfg.min_points.max(3);
    let n = x.len().min(y.len());
    if n < required {
        return Err(FitError::TooFewPoints { found: n, required });
    }
    let (x, y) = (&x[..n], &y[..n]);

    if total_sum_of_squares(y) == 0.0 {
        return Err(FitError::ZeroVariance);
    }

    let initial = initial_guess(x, y)?;
    let fit = refine(x, y, initial, cfg)?;

    let span = x[n - 1] - x[0];
    if fit.gaussian.sigma.abs() > MAX_SPAN_RATIO * span {
        return Err(FitError::Unresolved {
            sigma: fit.gaussian.sigma.abs(),
            span,
        });
    }
    Ok(fit)
}

fn normal_equations(x: &[f64], y: &[f64], g: &Gaussian) -> (Matrix3<f64>, Vector3<f64>) {
    let mut jtj = Matrix3::zeros();
    let mut jtr = Vector3::zeros();
    let s2 = g.sigma * g.sigma;

    for (&xi, &yi) in x.iter().zip(y) {
        let d = xi - g.center;
        let e = (-d * d / (2.0 * s2)).exp();
        // df/dA, df/dc, df/dsigma
        let j = Vector3::new(
            e,
            g.amplitude * e * d / s2,
            g.amplitude * e * d * d / (s2 * g.sigma),
        );
        let r = yi - g.amplitude * e;
        jtj += j * j.transpose();
        jtr += j * r;
    }
    (jtj, jtr)
}

fn refine(
    x: &[f64],
    y: &[f64],
    initial: Gaussian,
    cfg: &FitConfig,
) -> Result<GaussianFit, FitError> {
    let tol = cfg.tolerance;
    let mut current = initial;
    let mut sse = current.sse(x, y);
    let mut lambda = LAMBDA_START;

    if sse == 0.0 {
        return finish(current, 0);
    }

    for iteration in 1..=cfg.max_iterations {
        let (jtj, jtr) = normal_equations(x, y, &current);
        let mut damped = jtj;
        for k in 0..3 {
            damped[(k, k)] += lambda * jtj[(k, k)].max(1e-12);
        }

        let Some(step) = damped.lu().solve(&jtr) else {
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(FitError::Singular);
            }
            continue;
        };

        let params = current.as_vector();
        let small_step = step.norm() <= tol * (params.norm() + tol);
        let candidate = Gaussian::from_vector(&(params + step));
        let candidate_sse = if candidate.is_usable() {
            candidate.sse(x, y)
        } else {
            f64::INFINITY
        };

        if candidate_sse <= sse {
            let reduction = (sse - candidate_sse) / sse.max(f64::MIN_POSITIVE);
            current = candidate;
            sse = candidate_sse;
            lambda = (lambda / 10.0).max(LAMBDA_MIN);
            if reduction <= tol || small_step || sse == 0.0 {
                return finish(current, iteration);
            }
        } else {
            lambda *= 10.0;
            // No downhill step left at any damping: sitting in the minimum.
            if small_step || lambda > LAMBDA_MAX {
                return finish(current, iteration);
            }
        }
    }

    Err(FitError::NoConvergence {
        iterations: cfg.max_iterations,
    })
}

fn finish(gaussian: Gaussian, iterations: usize) -> Result<GaussianFit, FitError> {
    if !gaussian.is_usable() {
        return Err(FitError::NonFinite);
    }
    debug!(
        "gaussian converged after {iterations} iterations: A={:.6} c={:.6} sigma={:.6}",
        gaussian.amplitude, gaussian.center, gaussian.sigma
    );
    Ok(GaussianFit {
        gaussian,
        iterations,
    })
}

// ---------------------------------------------------------------------------
// Goodness of fit
// ---------------------------------------------------------------------------

fn total_sum_of_squares(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    y.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Coefficient of determination `1 - SSres / SStot`.
///
/// NaN when `observed` is constant (or empty), where R² is undefined.
pub fn r_squared(observed: &[f64], fitted: &[f64]) -> f64 {
    let ss_tot = total_sum_of_squares(observed);
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    let ss_res: f64 = observed
        .iter()
        .zip(fitted)
        .map(|(o, f)| (o - f).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic noise in [-0.5, 0.5).
    fn noise(i: usize) -> f64 {
        let h = (i as u64 + 1)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let h = h ^ (h >> 29);
        (h >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }

    fn sample(
        g: &Gaussian,
        x0: f64,
        dx: f64,
        n: usize,
        noise_level: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| x0 + i as f64 * dx).collect();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, &v)| g.eval(v) + noise_level * noise(i))
            .collect();
        (x, y)
    }

    fn close(actual: f64, expected: f64, rel: f64) -> bool {
        ((actual - expected) / expected).abs() <= rel
    }

    #[test]
    fn derived_quantities() {
        let g = Gaussian::new(2.0, 0.0, -1.5);
        assert!((g.fwhm() - 2.354_820_045 * 1.5).abs() < 1e-8);
        assert!((g.area() - 2.0 * 1.5 * (2.0 * PI).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn recovers_known_parameters_from_noisy_data() {
        let truth = Gaussian::new(2.5, 10.3, 1.2);
        let (x, y) = sample(&truth, 5.0, 0.05, 220, 0.02);
        let fit = fit_gaussian(&x, &y, &FitConfig::default()).unwrap().gaussian;

        assert!(close(fit.amplitude, 2.5, 0.01), "amplitude {}", fit.amplitude);
        assert!(close(fit.center, 10.3, 0.01), "center {}", fit.center);
        assert!(close(fit.sigma.abs(), 1.2, 0.01), "sigma {}", fit.sigma);
    }

    #[test]
    fn recovers_peak_from_off_center_window() {
        let truth = Gaussian::new(0.8, 42.0, 3.0);
        let (x, y) = sample(&truth, 34.0, 0.25, 65, 0.0);
        let fit = fit_gaussian(&x, &y, &FitConfig::default()).unwrap().gaussian;

        assert!(close(fit.amplitude, 0.8, 1e-4));
        assert!(close(fit.center, 42.0, 1e-4));
        assert!(close(fit.sigma.abs(), 3.0, 1e-4));
    }

    #[test]
    fn exact_data_gives_unit_r_squared() {
        let truth = Gaussian::new(1.0, 0.0, 1.0);
        let (x, y) = sample(&truth, -5.0, 0.1, 101, 0.0);
        let fit = fit_gaussian(&x, &y, &FitConfig::default()).unwrap().gaussian;
        let fitted: Vec<f64> = x.iter().map(|&v| fit.eval(v)).collect();

        assert!((r_squared(&y, &fitted) - 1.0).abs() < 1e-9);
        assert_eq!(r_squared(&y, &y), 1.0);
    }

    #[test]
    fn uncorrelated_model_scores_at_or_below_zero() {
        let (x, y) = sample(&Gaussian::new(1.0, 20.0, 2.0), 0.0, 0.5, 201, 0.0);
        let other = Gaussian::new(1.0, 80.0, 2.0);
        let fitted: Vec<f64> = x.iter().map(|&v| other.eval(v)).collect();
        let r2 = r_squared(&y, &fitted);
        assert!(r2.is_finite());
        assert!(r2 < 0.0, "r2 = {r2}");
    }

    #[test]
    fn constant_region_has_undefined_r_squared() {
        assert!(r_squared(&[0.3, 0.3, 0.3], &[0.1, 0.2, 0.3]).is_nan());
        assert!(r_squared(&[], &[]).is_nan());
    }

    #[test]
    fn degenerate_regions_fail_explicitly() {
        let cfg = FitConfig::default();
        assert_eq!(
            fit_gaussian(&[1.0, 2.0], &[0.5, 1.0], &cfg),
            Err(FitError::TooFewPoints {
                found: 2,
                required: 3
            })
        );
        assert_eq!(
            fit_gaussian(&[1.0, 2.0, 3.0, 4.0], &[0.4; 4], &cfg),
            Err(FitError::ZeroVariance)
        );
        assert_eq!(
            fit_gaussian(&[1.0, 2.0, 3.0, 4.0], &[-0.1, -0.3, -0.2, -0.4], &cfg),
            Err(FitError::NoPeak)
        );
    }

    #[test]
    fn min_points_is_configurable() {
        let cfg = FitConfig {
            min_points: 10,
            ..FitConfig::default()
        };
        let (x, y) = sample(&Gaussian::new(1.0, 0.0, 1.0), -2.0, 0.5, 9, 0.0);
        assert!(matches!(
            fit_gaussian(&x, &y, &cfg),
            Err(FitError::TooFewPoints { found: 9, .. })
        ));
    }

    #[test]
    fn initial_guess_uses_moments() {
        let (x, y) = sample(&Gaussian::new(3.0, 5.0, 0.5), 0.0, 0.01, 1001, 0.0);
        let g = initial_guess(&x, &y).unwrap();
        assert!((g.amplitude - 3.0).abs() < 1e-9);
        assert!((g.center - 5.0).abs() < 1e-6);
        assert!((g.sigma - 0.5).abs() < 1e-3);
    }
}
