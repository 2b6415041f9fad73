use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::gaussian::Gaussian;
use crate::error::FitError;

// ---------------------------------------------------------------------------
// Scan – one imported data file
// ---------------------------------------------------------------------------

/// A single scan (one source file).
#[derive(Debug, Clone)]
pub struct Scan {
    /// File name the scan was read from.
    pub name: String,
    pub path: PathBuf,
    /// Numeric label parsed from the file name (e.g. temperature).
    pub series_key: f64,
    /// Abscissa (wavelength, angle, …), non-decreasing.
    pub x: Vec<f64>,
    /// Intensity – same length as `x`. Raw, then baseline corrected, then normalized.
    pub y: Vec<f64>,
}

impl Scan {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Largest intensity of the scan, `NEG_INFINITY` when empty.
    pub fn y_max(&self) -> f64 {
        self.y.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

// ---------------------------------------------------------------------------
// ScanSet – the complete imported series
// ---------------------------------------------------------------------------

/// All scans of one import, ordered by ascending series key.
///
/// The order is fixed at construction; indices into a `ScanSet` stay valid
/// until the next import replaces it.
#[derive(Debug, Clone, Default)]
pub struct ScanSet {
    scans: Vec<Scan>,
}

impl ScanSet {
    /// Sort by series key. Equal keys keep their incoming order.
    pub fn new(mut scans: Vec<Scan>) -> Self {
        scans.sort_by(|a, b| a.series_key.total_cmp(&b.series_key));
        Self { scans }
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scan> {
        self.scans.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scan> {
        self.scans.iter()
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Mutable access for the in-place processing stages run during import.
    pub(crate) fn scans_mut(&mut self) -> &mut [Scan] {
        &mut self.scans
    }

    pub fn series_keys(&self) -> Vec<f64> {
        self.scans.iter().map(|s| s.series_key).collect()
    }

    /// Smallest and largest x over every scan, `None` if there are no points.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let (lo, hi) = self
            .scans
            .iter()
            .filter_map(|s| Some((*s.x.first()?, *s.x.last()?)))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
                (lo.min(a), hi.max(b))
            });
        (lo <= hi).then_some((lo, hi))
    }
}

impl<'a> IntoIterator for &'a ScanSet {
    type Item = &'a Scan;
    type IntoIter = std::slice::Iter<'a, Scan>;

    fn into_iter(self) -> Self::IntoIter {
        self.scans.iter()
    }
}

// ---------------------------------------------------------------------------
// Region – an x interval holding one peak
// ---------------------------------------------------------------------------

/// Inclusive x interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub lower: f64,
    pub upper: f64,
}

impl Region {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Index range of the points of sorted `x` with `lower <= x <= upper`.
    ///
    /// A reversed region yields an empty range.
    pub fn slice_indices(&self, x: &[f64]) -> Range<usize> {
        let start = x.partition_point(|&v| v < self.lower);
        let end = x.partition_point(|&v| v <= self.upper);
        start..end.max(start)
    }

    /// Default primary/secondary pair: 25–45 % and 55–75 % of the x extent.
    pub fn default_pair(extent: (f64, f64)) -> (Region, Region) {
        let (lo, hi) = extent;
        let at = |f: f64| lo + f * (hi - lo);
        (
            Region::new(at(0.25), at(0.45)),
            Region::new(at(0.55), at(0.75)),
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Primary,
    Secondary,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Primary => write!(f, "primary"),
            RegionKind::Secondary => write!(f, "secondary"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fit results
// ---------------------------------------------------------------------------

/// Gaussian fit of one scan inside one region, with derived statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Refined parameters as returned by the fitter (sigma may be negative).
    pub gaussian: Gaussian,
    /// `|sigma|`.
    pub sigma: f64,
    pub fwhm: f64,
    pub area: f64,
    /// Coefficient of determination; NaN when the region is constant.
    pub r_squared: f64,
    /// Maximum of the fitted curve over the region's x values.
    pub peak_height: f64,
    pub points: usize,
    pub iterations: usize,
    /// `(x, fitted y)` samples, only when a fit overlay was requested.
    pub curve: Option<Vec<[f64; 2]>>,
}

/// Both region fits of one active scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    /// Index into the `ScanSet`.
    pub scan_index: usize,
    pub name: String,
    pub series_key: f64,
    pub primary: FitResult,
    pub secondary: FitResult,
    /// `primary.peak_height / secondary.peak_height`.
    pub ratio: f64,
}

impl SeriesEntry {
    pub fn fit(&self, region: RegionKind) -> &FitResult {
        match region {
            RegionKind::Primary => &self.primary,
            RegionKind::Secondary => &self.secondary,
        }
    }
}

/// An active scan left out of the results because a region fit failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    pub scan_index: usize,
    pub name: String,
    pub series_key: f64,
    pub region: RegionKind,
    pub error: FitError,
}

/// Per-region statistic that can be traced across the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sigma,
    Fwhm,
    Area,
    RSquared,
    Center,
    Amplitude,
}

impl Metric {
    fn of(self, fit: &FitResult) -> f64 {
        match self {
            Metric::Sigma => fit.sigma,
            Metric::Fwhm => fit.fwhm,
            Metric::Area => fit.area,
            Metric::RSquared => fit.r_squared,
            Metric::Center => fit.gaussian.center,
            Metric::Amplitude => fit.gaussian.amplitude,
        }
    }
}

/// Output of one recompute: every successfully fitted active scan, in
/// ascending series-key order, plus the scans that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesResult {
    pub primary_region: Region,
    pub secondary_region: Region,
    pub entries: Vec<SeriesEntry>,
    pub failures: Vec<ScanFailure>,
}

impl SeriesResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn series_keys(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.series_key).collect()
    }

    /// `[series_key, value]` points of one metric for plotting against the key.
    pub fn trend(&self, region: RegionKind, metric: Metric) -> Vec<[f64; 2]> {
        self.entries
            .iter()
            .map(|e| [e.series_key, metric.of(e.fit(region))])
            .collect()
    }

    /// `[series_key, ratio]` points.
    pub fn ratios(&self) -> Vec<[f64; 2]> {
        self.entries.iter().map(|e| [e.series_key, e.ratio]).collect()
    }

    /// Whether the scan at `scan_index` was skipped in this recompute.
    pub fn is_skipped(&self, scan_index: usize) -> bool {
        self.failures.iter().any(|f| f.scan_index == scan_index)
    }
}
