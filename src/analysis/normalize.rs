use crate::data::model::ScanSet;
use crate::error::ImportError;

/// Divide every scan's intensity by the single largest intensity of the set.
///
/// Returns the scale factor. Afterwards the largest value across all scans is
/// exactly 1.0 and every cross-scan ratio is unchanged.
pub fn normalize_series(scans: &mut ScanSet) -> Result<f64, ImportError> {
    let global_max = scans
        .iter()
        .map(|s| s.y_max())
        .fold(f64::NEG_INFINITY, f64::max);

    if !global_max.is_finite() || global_max <= 0.0 {
        return Err(ImportError::FlatIntensity(global_max));
    }

    for scan in scans.scans_mut() {
        for v in &mut scan.y {
            *v /= global_max;
        }
    }
    Ok(global_max)
}
