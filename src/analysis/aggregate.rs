use log::{debug, info, warn};
use rayon::prelude::*;

use super::gaussian::{fit_gaussian, r_squared};
use crate::config::FitConfig;
use crate::data::model::{
    FitResult, Region, RegionKind, Scan, ScanFailure, ScanSet, SeriesEntry, SeriesResult,
};
use crate::data::selection::ActiveSelection;
use crate::error::FitError;

// ---------------------------------------------------------------------------
// Single region fit
// ---------------------------------------------------------------------------

/// Fit one scan inside one region and derive FWHM, area, R² and peak height.
///
/// `with_curve` also keeps the fitted curve sampled at the region's x values.
pub fn fit_region(
    scan: &Scan,
    region: Region,
    cfg: &FitConfig,
    with_curve: bool,
) -> Result<FitResult, FitError> {
    let range = region.slice_indices(&scan.x);
    let x = &scan.x[range.clone()];
    let y = &scan.y[range];

    let fit = fit_gaussian(x, y, cfg)?;
    let g = fit.gaussian;
    let fitted: Vec<f64> = x.iter().map(|&v| g.eval(v)).collect();
    let peak_height = fitted.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(FitResult {
        gaussian: g,
        sigma: g.sigma.abs(),
        fwhm: g.fwhm(),
        area: g.area(),
        r_squared: r_squared(y, &fitted),
        peak_height,
        points: x.len(),
        iterations: fit.iterations,
        curve: with_curve.then(|| x.iter().zip(&fitted).map(|(&a, &b)| [a, b]).collect()),
    })
}

fn fit_scan(
    index: usize,
    scan: &Scan,
    regions: [Region; 2],
    cfg: &FitConfig,
    with_curve: bool,
) -> Result<SeriesEntry, ScanFailure> {
    let failure = |region, error| ScanFailure {
        scan_index: index,
        name: scan.name.clone(),
        series_key: scan.series_key,
        region,
        error,
    };

    let primary = fit_region(scan, regions[0], cfg, with_curve)
        .map_err(|e| failure(RegionKind::Primary, e))?;
    let secondary = fit_region(scan, regions[1], cfg, with_curve)
        .map_err(|e| failure(RegionKind::Secondary, e))?;

    let ratio = if secondary.peak_height == 0.0 {
        f64::NAN
    } else {
        primary.peak_height / secondary.peak_height
    };

    debug!(
        "{}: sigma {:.5} / {:.5}, R² {:.5} / {:.5}, ratio {:.5}",
        scan.name, primary.sigma, secondary.sigma, primary.r_squared, secondary.r_squared, ratio
    );

    Ok(SeriesEntry {
        scan_index: index,
        name: scan.name.clone(),
        series_key: scan.series_key,
        primary,
        secondary,
        ratio,
    })
}

// ---------------------------------------------------------------------------
// Whole-series recompute
// ---------------------------------------------------------------------------

/// Fit both regions of every active scan.
///
/// Scans are fitted in parallel; the result keeps `ScanSet` order. A scan
/// whose fit fails in either region is reported in `failures` and left out of
/// `entries`; the recompute itself never fails.
pub fn aggregate(
    scans: &ScanSet,
    selection: &ActiveSelection,
    primary: Region,
    secondary: Region,
    cfg: &FitConfig,
    show_fits: bool,
) -> SeriesResult {
    let active: Vec<usize> = selection
        .iter()
        .filter(|&i| {
            let known = i < scans.len();
            if !known {
                warn!("ignoring active index {i}: only {} scans loaded", scans.len());
            }
            known
        })
        .collect();

    let outcomes: Vec<Result<SeriesEntry, ScanFailure>> = active
        .par_iter()
        .map(|&i| fit_scan(i, &scans.scans()[i], [primary, secondary], cfg, show_fits))
        .collect();

    let mut entries = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(entry) => entries.push(entry),
            Err(failure) => {
                warn!(
                    "skipping {} (key {}): {} region fit failed: {}",
                    failure.name, failure.series_key, failure.region, failure.error
                );
                failures.push(failure);
            }
        }
    }

    info!(
        "fitted {}/{} active scans (primary {primary}, secondary {secondary})",
        entries.len(),
        active.len()
    );

    SeriesResult {
        primary_region: primary,
        secondary_region: secondary,
        entries,
        failures,
    }
}
